// src/cli.rs
//! CLI definitions for the quarry package manager
//!
//! This module contains all command-line interface definitions using
//! clap. The actual command implementations are in the `commands`
//! module.

use clap::{Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser)]
#[command(name = "quarry")]
#[command(author = "Quarry Project")]
#[command(version)]
#[command(about = "Source package manager with a restartable dependency resolver", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new quarry database
    Init {
        /// Path to the database file
        #[arg(short, long, default_value = "/var/lib/quarry/quarry.db")]
        db_path: String,
    },

    /// Resolve targets into an execution plan
    Resolve {
        /// Target specs (e.g. 'app/foo', '>=app/bar-2:1')
        targets: Vec<String>,

        /// Path to the database file
        #[arg(short, long, default_value = "/var/lib/quarry/quarry.db")]
        db_path: String,

        /// Path to a resolver configuration file
        #[arg(short, long)]
        config: Option<String>,

        /// Write the resolved plan to this file
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Resolve removal of installed packages
    Remove {
        /// Package names to remove
        packages: Vec<String>,

        /// Path to the database file
        #[arg(short, long, default_value = "/var/lib/quarry/quarry.db")]
        db_path: String,

        /// Path to a resolver configuration file
        #[arg(short, long)]
        config: Option<String>,

        /// Write the resolved plan to this file
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Display a previously resolved plan
    ShowPlan {
        /// Path to a plan written by 'resolve --output'
        plan_path: String,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
