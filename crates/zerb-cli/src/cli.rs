use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "zerb", version, about = "Declarative dev-environment manager")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Managed root directory (defaults to the XDG data dir for "zerb")
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print a drift report; exits 0 iff every tool is in sync
    Status,

    /// Classify drift and report the same way `status` does
    ///
    /// The interactive adopt/revert/skip loop is an external collaborator
    /// (spec §1); this runs the read-only report in its place.
    Sync,

    /// Manage tracked dotfiles
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Track one or more paths as dotfiles
    Add {
        paths: Vec<String>,

        /// Required to track a directory
        #[arg(long)]
        recursive: bool,

        #[arg(long)]
        template: bool,

        #[arg(long)]
        secrets: bool,

        #[arg(long)]
        private: bool,

        /// Print what would happen without mutating any state
        #[arg(long)]
        dry_run: bool,
    },

    /// Stop tracking one or more paths
    Remove {
        paths: Vec<String>,

        /// Also delete the live file once it's confirmed to sit under $HOME
        #[arg(long)]
        purge: bool,

        #[arg(long)]
        dry_run: bool,
    },

    /// List currently tracked paths
    List,
}
