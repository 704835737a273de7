//! Maestro: the orchestration core of a multi-agent project coordinator.
//!
//! The core inspects task boards, recommends and switches orchestration
//! modes, generates project plans from templates and hands ready tasks to
//! agents. It owns no I/O of its own: boards and advisors are supplied by
//! the driver through [`collaborators`].

pub mod adaptive;
pub mod board;
pub mod clock;
pub mod collaborators;
pub mod config;
pub mod context;
pub mod coordinator;
pub mod core;
pub mod creator;
pub mod error;
pub mod keywords;
pub mod log;
pub mod modes;

pub use board::{BoardAnalyzer, BoardState};
pub use config::Config;
pub use context::{ContextDetector, ModeRecommendation};
pub use coordinator::{Coordinator, Failure, Response, SessionSnapshot};
pub use self::core::{Priority, Task, TaskId, TaskStatus};
pub use error::{Error, ErrorKind, Result};
pub use modes::{ModeRegistry, OrchestrationMode};
