//! Hard eligibility rules: which Todo tasks may be handed out at all.
//!
//! Explicit dependencies must exist and be Done. On top of that a
//! content-based safety net keeps testing work behind related unfinished
//! implementation work, and keeps deployment work behind every unfinished
//! implementation or testing task anywhere on the board, related or not.
//!
//! A task is held back by its single [`WorkRole`], but holds others back
//! through every family it matches. When content rules hold tasks back in
//! a cycle, the task earlier on the board goes first.

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::core::{Task, TaskId, TaskStatus};
use crate::error::Result;
use crate::keywords::{is_stopword, words, KeywordMatcher, KeywordTable, SCHEDULING};

const IMPLEMENTATION: &str = "implementation";
const TESTING: &str = "testing";
const DEPLOYMENT: &str = "deployment";

/// The scheduling family a task is held back as.
///
/// A task matching several families takes the latest one: deployment,
/// then testing, then implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkRole {
    Implementation,
    Testing,
    Deployment,
    Other,
}

/// Families a task holds other work back as.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Families {
    pub implementation: bool,
    pub testing: bool,
}

/// Why a task is held back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockReason {
    /// An explicit dependency exists but is not Done.
    DependencyNotDone,
    /// An explicit dependency id is not on the board.
    DependencyNotFound,
    /// A related implementation task is unfinished.
    RelatedImplementation,
    /// An implementation or testing task is unfinished.
    UnfinishedBeforeDeployment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blocker {
    pub task_id: TaskId,
    /// None when the id is not on the board.
    pub name: Option<String>,
    pub reason: BlockReason,
}

/// Per-call index over the board.
pub struct BoardView<'a> {
    tasks: &'a [Task],
    by_id: HashMap<&'a TaskId, &'a Task>,
    roles: Vec<WorkRole>,
    /// Content-rule blockers per task, in board order.
    held_back_by: Vec<Vec<(usize, BlockReason)>>,
}

impl<'a> BoardView<'a> {
    pub fn tasks(&self) -> &'a [Task] {
        self.tasks
    }

    pub fn get(&self, id: &TaskId) -> Option<&'a Task> {
        self.by_id.get(id).copied()
    }

    pub fn role(&self, index: usize) -> WorkRole {
        self.roles.get(index).copied().unwrap_or(WorkRole::Other)
    }

    /// Unfinished tasks other than the one at `index`.
    pub fn unfinished_others(&self, index: usize) -> impl Iterator<Item = &'a Task> + '_ {
        self.tasks
            .iter()
            .enumerate()
            .filter(move |(i, t)| *i != index && !t.is_done())
            .map(|(_, t)| t)
    }
}

#[derive(Debug, Clone)]
pub struct EligibilityRules {
    families: KeywordMatcher,
    related_overlap: f64,
}

impl EligibilityRules {
    pub fn new(related_overlap: f64) -> Self {
        Self {
            families: SCHEDULING.clone(),
            related_overlap,
        }
    }

    /// Rules over a substitute scheduling table.
    ///
    /// The table should name `implementation`, `testing` and `deployment`
    /// families; missing ones never match.
    pub fn with_table(related_overlap: f64, table: &KeywordTable) -> Result<Self> {
        Ok(Self {
            families: KeywordMatcher::new(table)?,
            related_overlap,
        })
    }

    pub fn role_of(&self, task: &Task) -> WorkRole {
        let text = task.searchable_text();
        if self.families.is_match(DEPLOYMENT, &text) {
            WorkRole::Deployment
        } else if self.families.is_match(TESTING, &text) {
            WorkRole::Testing
        } else if self.families.is_match(IMPLEMENTATION, &text) {
            WorkRole::Implementation
        } else {
            WorkRole::Other
        }
    }

    /// Content words of name and description, without stopwords or
    /// scheduling keywords.
    fn tokens(&self, task: &Task) -> HashSet<String> {
        let mut text = words(&task.name);
        text.extend(words(&task.description));
        text.into_iter()
            .filter(|w| !is_stopword(w) && self.families.matches(w).is_empty())
            .collect()
    }

    pub fn families_of(&self, task: &Task) -> Families {
        let text = task.searchable_text();
        Families {
            implementation: self.families.is_match(IMPLEMENTATION, &text),
            testing: self.families.is_match(TESTING, &text),
        }
    }

    pub fn view<'a>(&self, tasks: &'a [Task]) -> BoardView<'a> {
        let roles: Vec<WorkRole> = tasks.iter().map(|t| self.role_of(t)).collect();
        let families: Vec<Families> = tasks.iter().map(|t| self.families_of(t)).collect();
        let tokens: Vec<HashSet<String>> = tasks.iter().map(|t| self.tokens(t)).collect();

        let mut graph: DiGraph<usize, BlockReason> = DiGraph::with_capacity(tasks.len(), 0);
        let nodes: Vec<NodeIndex> = (0..tasks.len()).map(|i| graph.add_node(i)).collect();
        for (index, task) in tasks.iter().enumerate() {
            if !task.is_todo() {
                continue;
            }
            for (i, other) in tasks.iter().enumerate() {
                if i == index || other.is_done() {
                    continue;
                }
                let reason = match roles[index] {
                    WorkRole::Testing
                        if families[i].implementation
                            && self.related(&tokens[index], &tokens[i]) =>
                    {
                        Some(BlockReason::RelatedImplementation)
                    }
                    WorkRole::Deployment if families[i].implementation || families[i].testing => {
                        Some(BlockReason::UnfinishedBeforeDeployment)
                    }
                    _ => None,
                };
                if let Some(reason) = reason {
                    graph.add_edge(nodes[i], nodes[index], reason);
                }
            }
        }

        let mut component = vec![0usize; tasks.len()];
        for (c, members) in tarjan_scc(&graph).into_iter().enumerate() {
            for node in members {
                component[graph[node]] = c;
            }
        }

        let mut held_back_by = vec![Vec::new(); tasks.len()];
        for edge in graph.edge_references() {
            let (blocker, blocked) = (graph[edge.source()], graph[edge.target()]);
            // Inside a cycle only earlier tasks hold later ones back.
            if component[blocker] == component[blocked] && blocker > blocked {
                continue;
            }
            held_back_by[blocked].push((blocker, *edge.weight()));
        }

        BoardView {
            tasks,
            by_id: tasks.iter().map(|t| (&t.id, t)).collect(),
            roles,
            held_back_by,
        }
    }

    /// Two tasks are related when they share at least one content word and
    /// the shared words cover the configured share of the smaller set.
    fn related(&self, a: &HashSet<String>, b: &HashSet<String>) -> bool {
        let smaller = a.len().min(b.len());
        if smaller == 0 {
            return false;
        }
        let shared = a.intersection(b).count();
        shared >= 1 && shared as f64 >= self.related_overlap * smaller as f64
    }

    /// Everything holding back the task at `index`; empty when eligible.
    pub fn blockers(&self, view: &BoardView<'_>, index: usize) -> Vec<Blocker> {
        let Some(task) = view.tasks.get(index) else {
            return Vec::new();
        };
        let mut blockers = Vec::new();

        for dep in &task.dependencies {
            match view.get(dep) {
                None => blockers.push(Blocker {
                    task_id: dep.clone(),
                    name: None,
                    reason: BlockReason::DependencyNotFound,
                }),
                Some(prerequisite) if prerequisite.status != TaskStatus::Done => {
                    blockers.push(Blocker {
                        task_id: dep.clone(),
                        name: Some(prerequisite.name.clone()),
                        reason: BlockReason::DependencyNotDone,
                    })
                }
                Some(_) => {}
            }
        }

        if let Some(held) = view.held_back_by.get(index) {
            blockers.extend(held.iter().map(|&(i, reason)| Blocker {
                task_id: view.tasks[i].id.clone(),
                name: Some(view.tasks[i].name.clone()),
                reason,
            }));
        }

        blockers
    }

    pub fn is_eligible(&self, view: &BoardView<'_>, index: usize) -> bool {
        self.blockers(view, index).is_empty()
    }
}

impl Default for EligibilityRules {
    fn default() -> Self {
        Self::new(0.3)
    }
}
