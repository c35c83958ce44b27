// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dockyard")]
#[command(about = "Run and manage groups of containers on Docker and Podman")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print results
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Print JSON lines
    #[arg(long, global = true)]
    pub json: bool,

    /// Path to the config file (discovered in the current directory otherwise)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new dockyard.yml configuration file
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Pull, create and start every configured container
    Up,

    /// Remove every configured container
    Down {
        /// Also remove anonymous volumes
        #[arg(long)]
        volumes: bool,
    },

    /// List containers on the engine
    Ps {
        /// Include stopped containers
        #[arg(short, long)]
        all: bool,
    },

    /// Run a command in a container and print its output
    Exec {
        /// Container name
        name: String,

        /// Run the command through /bin/sh -c
        #[arg(long)]
        sh: bool,

        /// Command and arguments
        #[arg(last = true, required = true)]
        command: Vec<String>,
    },

    /// Print a container's logs
    Logs {
        /// Container name
        name: String,

        /// Number of lines from the end
        #[arg(short, long)]
        tail: Option<u64>,

        /// Keep streaming new output
        #[arg(short, long)]
        follow: bool,
    },

    /// Show engine information
    Info,
}
