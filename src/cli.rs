//! CLI argument parsing via clap.

use clap::{Parser, Subcommand};

/// A human-in-the-loop feedback bridge for AI coding agents.
#[derive(Debug, Parser)]
#[command(name = "holdup", version)]
pub struct Args {
    /// Path to the settings file (default: platform config directory).
    #[arg(short = 'c', long = "config")]
    pub config: Option<String>,

    /// Override the auto-continue timeout in seconds.
    #[arg(long = "timeout-seconds")]
    pub timeout_seconds: Option<u64>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the stdio tool server (the default when no command is given).
    Serve,
    /// Run a single feedback session on the terminal and print the response.
    Ask {
        /// Project directory the feedback concerns.
        #[arg(long = "project-directory")]
        project_directory: String,

        /// One-line summary or question to show the human.
        #[arg(long = "summary")]
        summary: String,

        /// Task identifier shown alongside the prompt.
        #[arg(long = "task-id", default_value = "")]
        task_id: String,

        /// Console command override for this session.
        #[arg(long = "command")]
        command: Option<String>,

        /// Write the response JSON to a file instead of stdout.
        #[arg(long = "output-file")]
        output_file: Option<String>,
    },
}
