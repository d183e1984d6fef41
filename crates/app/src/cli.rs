//! Command-line interface

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use tm_core::task::{PriorityFilter, StatusFilter, TaskId, TaskPriority, TaskStatus};

use crate::config::DEFAULT_API_URL;

#[derive(Debug, Parser)]
#[command(name = "taskmaster", version, about = "Manage your tasks from the terminal")]
pub struct Cli {
    /// Base URL of the TaskMaster API
    #[arg(long, global = true, env = "TASKMASTER_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Where the session token is kept between runs
    #[arg(long, global = true, env = "TASKMASTER_TOKEN_FILE")]
    pub token_file: Option<PathBuf>,

    /// Print tasks as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Sign in and keep the session token
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(short, long, env = "TASKMASTER_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account. Sign in afterwards with `login`.
    Register {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
        /// Password confirmation
        #[arg(long = "confirm")]
        password2: String,
    },
    /// Forget the session token
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Resolve a route such as `/tasks` and render it
    Open { path: String },
    /// Task commands
    #[command(subcommand)]
    Tasks(TaskCommand),
}

#[derive(Debug, Clone, Subcommand)]
pub enum TaskCommand {
    /// List tasks, optionally filtered
    List {
        /// Case-insensitive text to look for in title or description
        #[arg(short, long, default_value = "")]
        search: String,
        /// all, low, medium or high
        #[arg(short, long, default_value = "all")]
        priority: PriorityFilter,
        /// all, none, pending, in_progress or completed
        #[arg(long, default_value = "all")]
        status: StatusFilter,
    },
    /// Show one task
    Show { id: TaskId },
    /// Create a task
    Create {
        #[arg(short, long)]
        title: String,
        #[arg(short, long)]
        description: String,
        #[arg(short, long, default_value = "medium")]
        priority: TaskPriority,
        #[arg(long)]
        status: Option<TaskStatus>,
    },
    /// Change some fields of a task
    Update {
        id: TaskId,
        #[arg(short, long)]
        title: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long)]
        priority: Option<TaskPriority>,
        #[arg(long)]
        status: Option<TaskStatus>,
    },
    /// Delete a task
    Delete { id: TaskId },
    /// Move a task to another status
    Status { id: TaskId, status: TaskStatus },
}

impl Command {
    /// Route the command runs under, if any
    pub fn route(&self) -> Option<&'static str> {
        match self {
            Self::Login { .. } => Some("/login"),
            Self::Register { .. } => Some("/register"),
            Self::Tasks(_) => Some("/tasks"),
            Self::Logout | Self::Whoami | Self::Open { .. } => None,
        }
    }
}
