// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::types::{ControlAction, ExecutionId};

/// Command-line arguments for `livesync`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "livesync",
    version,
    about = "Follow and control automation executions live.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Livesync.toml` in the current working directory, if present.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Base URL of the REST API; overrides `[server].api_url`.
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `LIVESYNC_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Follow an execution until it finishes (or Ctrl-C).
    Watch {
        #[arg(value_name = "ID")]
        execution_id: ExecutionId,
    },
    /// Print the current snapshot of an execution once.
    Show {
        #[arg(value_name = "ID")]
        execution_id: ExecutionId,
    },
    /// Pause a running execution.
    Pause {
        #[arg(value_name = "ID")]
        execution_id: ExecutionId,
    },
    /// Resume a paused execution.
    Resume {
        #[arg(value_name = "ID")]
        execution_id: ExecutionId,
    },
    /// Stop a running or paused execution.
    Stop {
        #[arg(value_name = "ID")]
        execution_id: ExecutionId,
    },
}

impl Command {
    pub fn execution_id(&self) -> &ExecutionId {
        match self {
            Command::Watch { execution_id }
            | Command::Show { execution_id }
            | Command::Pause { execution_id }
            | Command::Resume { execution_id }
            | Command::Stop { execution_id } => execution_id,
        }
    }

    /// The control action this command dispatches, if any.
    pub fn control_action(&self) -> Option<ControlAction> {
        match self {
            Command::Pause { .. } => Some(ControlAction::Pause),
            Command::Resume { .. } => Some(ControlAction::Resume),
            Command::Stop { .. } => Some(ControlAction::Stop),
            Command::Watch { .. } | Command::Show { .. } => None,
        }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
