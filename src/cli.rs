use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "corral",
    about = "Orchestrate coding-agent sessions inside tmux",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start (or restart) a named agent session with an initial prompt
    Spawn {
        /// Session name (up to 50 characters)
        name: String,

        /// Initial instruction for the agent
        prompt: String,

        /// Working directory for the session (defaults to the current one)
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Launch the agent with confirmation prompts disabled
        #[arg(long)]
        skip_permissions: bool,
    },

    /// Wait for one or more sessions to go idle and print their output
    Read {
        /// Session names (several names wait concurrently)
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Deliver a follow-up instruction to a running session
    Send {
        /// Session name
        name: String,

        /// Instruction text (sent literally, then submitted)
        text: String,
    },

    /// Terminate a session
    Kill {
        /// Session name
        name: String,
    },

    /// List live sessions
    List,

    /// Show the effective configuration
    Config {
        /// Render as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    Completions {
        /// Target shell
        shell: CompletionShell,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}
