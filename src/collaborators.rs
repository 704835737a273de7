//! Interfaces to the systems around the core.
//!
//! The core never reads a board or calls a language model itself. Drivers
//! hand it task lists obtained through a [`Board`], and may plug in an
//! [`Advisor`] to polish free text before generation.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::Task;
use crate::error::{Error, Result};
use crate::mlog_debug;

/// Source of the current task list.
pub trait Board {
    fn tasks(&self) -> Result<Vec<Task>>;
}

/// Best-effort text enrichment. Its output is never trusted: generation
/// validates it like any other input and falls back to the original.
pub trait Advisor: Send + Sync {
    fn enrich_description(&self, text: &str) -> Result<String>;
}

/// Board held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryBoard {
    tasks: Vec<Task>,
}

impl MemoryBoard {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }
}

impl Board for MemoryBoard {
    fn tasks(&self) -> Result<Vec<Task>> {
        Ok(self.tasks.clone())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BoardFile {
    List(Vec<Task>),
    Wrapped { tasks: Vec<Task> },
}

/// Board read from a JSON file: either a task array or `{"tasks": [...]}`.
/// A missing file is `Error::NotFound`; an empty file is an empty board.
#[derive(Debug, Clone)]
pub struct JsonFileBoard {
    path: PathBuf,
}

impl JsonFileBoard {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Board for JsonFileBoard {
    fn tasks(&self) -> Result<Vec<Task>> {
        if !self.path.exists() {
            return Err(Error::NotFound(format!(
                "board file {} does not exist",
                self.path.display()
            )));
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        let tasks = match serde_json::from_str::<BoardFile>(&content)? {
            BoardFile::List(tasks) => tasks,
            BoardFile::Wrapped { tasks } => tasks,
        };
        mlog_debug!(
            "Loaded {} tasks from {}",
            tasks.len(),
            self.path.display()
        );
        Ok(tasks)
    }
}
