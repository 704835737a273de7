use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;

use maestro::adaptive::Outcome;
use maestro::clock::SystemClock;
use maestro::collaborators::{Board, JsonFileBoard};
use maestro::config::Config;
use maestro::coordinator::{Coordinator, Failure, SessionSnapshot};
use maestro::core::{Task, TaskId};
use maestro::log::LogLevel;
use maestro::modes::OrchestrationMode;
use maestro::{mlog, mlog_warn, Error, Result};

/// Maestro - orchestration core for multi-agent project boards
#[derive(Parser, Debug)]
#[command(name = "maestro")]
#[command(version, about, long_about = None)]
#[command(after_help = "ENVIRONMENT:\n    MAESTRO_DEBUG=1     Enable debug logging (alternative to --debug)\n    MAESTRO_LOG=level   error, warn, info, debug or trace")]
pub struct Cli {
    /// Enable debug logging (writes to ~/.maestro/maestro.log)
    #[arg(short = 'd', long, global = true)]
    pub debug: bool,

    /// Config file (default: ~/.maestro/maestro.toml)
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Registry state file (default: ~/.maestro/state.json)
    #[arg(long, global = true)]
    pub state: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Summarize the structure of a board
    Analyze {
        /// Board file: a JSON task array or {"tasks": [...]}
        board: PathBuf,
    },

    /// Recommend an orchestration mode for a user
    Recommend {
        board: PathBuf,

        #[arg(long, default_value = "default")]
        user: String,

        /// The user's most recent message
        #[arg(long, short = 'm')]
        message: Option<String>,
    },

    /// Switch the active orchestration mode
    Switch {
        /// creator, enricher or adaptive
        mode: OrchestrationMode,

        #[arg(long)]
        reason: Option<String>,

        /// Who asked for the switch
        #[arg(long)]
        actor: Option<String>,
    },

    /// Show the active mode and its status
    Mode,

    /// Suggest a mode switch for a board, if one is warranted
    Suggest { board: PathBuf },

    /// Generate a project from a template name or a description
    Generate {
        /// Template name ("web", "api", "mobile") or free text
        input: String,

        #[arg(long, short = 'n')]
        name: String,

        /// mvp, small, medium, large or enterprise
        #[arg(long, short = 's')]
        size: Option<String>,

        /// Phases to leave out
        #[arg(long = "exclude", value_delimiter = ',')]
        excluded: Vec<String>,

        /// Labels added to every task
        #[arg(long = "label", value_delimiter = ',')]
        labels: Vec<String>,
    },

    /// Pick the next task for an agent
    Next {
        board: PathBuf,

        #[arg(long)]
        agent: String,

        #[arg(long = "skill", value_delimiter = ',')]
        skills: Vec<String>,

        /// Task ids already claimed by other agents
        #[arg(long = "claimed", value_delimiter = ',')]
        claimed: Vec<String>,
    },

    /// Explain which todo tasks are blocked and which are ready
    Blocking { board: PathBuf },

    /// Record how an agent fared with a task
    Outcome {
        board: PathBuf,

        #[arg(long)]
        agent: String,

        #[arg(long)]
        task: String,

        /// completed, blocked or abandoned
        outcome: Outcome,
    },

    /// List the built-in project templates
    Templates,
}

fn main() {
    let cli = Cli::parse();
    maestro::log::init(LogLevel::from_env(cli.debug));

    if let Err(e) = run(cli) {
        let failure = Failure::from(&e);
        match serde_json::to_string_pretty(&failure) {
            Ok(json) => println!("{}", json),
            Err(_) => eprintln!("{}", e),
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let state_path = match &cli.state {
        Some(path) => path.clone(),
        None => Config::state_path()?,
    };
    let coordinator = load_session(&state_path, &config)?;

    mlog!("maestro {:?}", cli.command);

    match cli.command {
        Command::Analyze { board } => print(&coordinator.analyze_board(&read_board(&board)?)),
        Command::Recommend {
            board,
            user,
            message,
        } => print(&coordinator.recommend_mode(&user, &read_board(&board)?, message.as_deref())),
        Command::Switch {
            mode,
            reason,
            actor,
        } => {
            let response = coordinator.switch_mode(mode, reason.as_deref(), actor.as_deref());
            save_session(&state_path, &coordinator)?;
            print(&response)
        }
        Command::Mode => print(&coordinator.current_mode()),
        Command::Suggest { board } => print(&coordinator.suggest_switch(&read_board(&board)?)),
        Command::Generate {
            input,
            name,
            size,
            excluded,
            labels,
        } => {
            let response =
                coordinator.generate_project(&input, &name, size.as_deref(), &excluded, &labels);
            save_session(&state_path, &coordinator)?;
            print(&response)
        }
        Command::Next {
            board,
            agent,
            skills,
            claimed,
        } => {
            let claimed: Vec<TaskId> = claimed.into_iter().map(TaskId::from).collect();
            let task = coordinator.next_task(&agent, &skills, &read_board(&board)?, &claimed);
            save_session(&state_path, &coordinator)?;
            print(&task)
        }
        Command::Blocking { board } => {
            print(&coordinator.blocking_analysis(&read_board(&board)?))
        }
        Command::Outcome {
            board,
            agent,
            task,
            outcome,
        } => {
            let tasks = read_board(&board)?;
            let id = TaskId::from(task.as_str());
            let task = tasks
                .iter()
                .find(|t| t.id == id)
                .ok_or_else(|| Error::NotFound(format!("task '{}' is not on the board", id)))?;
            coordinator.record_outcome(&agent, task, outcome);
            save_session(&state_path, &coordinator)?;
            print(&coordinator.registry().preferences())
        }
        Command::Templates => print(&coordinator.templates()),
    }
}

fn read_board(path: &Path) -> Result<Vec<Task>> {
    JsonFileBoard::new(path).tasks()
}

fn load_session(path: &Path, config: &Config) -> Result<Coordinator> {
    if !path.exists() {
        return Coordinator::new(config);
    }
    let content = std::fs::read_to_string(path)?;
    match serde_json::from_str::<SessionSnapshot>(&content) {
        Ok(snapshot) => Coordinator::from_snapshot(config, snapshot, Arc::new(SystemClock)),
        Err(e) => {
            mlog_warn!("Ignoring unreadable state file {}: {}", path.display(), e);
            Coordinator::new(config)
        }
    }
}

fn save_session(path: &Path, coordinator: &Coordinator) -> Result<()> {
    let snapshot = coordinator.snapshot()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(&snapshot)?)?;
    Ok(())
}

fn print<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
