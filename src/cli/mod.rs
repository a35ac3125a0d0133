//! Command-line interface

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use commands::{AgentsCommand, ResolveCommand, TriggerCommand, ValidateCommand};
use std::ffi::OsString;

/// Pipeline configuration validator and resolver
#[derive(Debug, Parser, Clone)]
#[command(name = "pipeconf")]
#[command(version = "0.1.0")]
#[command(about = "Validate and resolve CI pipeline configuration", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to engine settings file
    #[arg(short, long, global = true)]
    pub config: Option<String>,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Validate a project definition
    Validate(ValidateCommand),

    /// Resolve a pipeline into its final form
    Resolve(ResolveCommand),

    /// List pipelines triggered by a change on a ref
    Trigger(TriggerCommand),

    /// Show which agents may run a pipeline
    Agents(AgentsCommand),
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }
}
