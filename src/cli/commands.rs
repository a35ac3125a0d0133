//! CLI command definitions

use clap::Args;

/// Validate a project definition
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Path to project YAML file
    #[arg(short, long)]
    pub file: String,

    /// Predefined parameters (key=value)
    #[arg(long, value_parser = parse_key_value)]
    pub param: Vec<(String, String)>,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Resolve a pipeline
#[derive(Debug, Args, Clone)]
pub struct ResolveCommand {
    /// Path to project YAML file
    #[arg(short, long)]
    pub file: String,

    /// Pipeline id
    #[arg(short, long)]
    pub pipeline: String,

    /// Predefined parameters (key=value)
    #[arg(long, value_parser = parse_key_value)]
    pub param: Vec<(String, String)>,

    /// Keep environment names and credential ids instead of looking them up
    #[arg(long = "static")]
    pub r#static: bool,
}

/// List triggered pipelines
#[derive(Debug, Args, Clone)]
pub struct TriggerCommand {
    /// Path to project YAML file
    #[arg(short, long)]
    pub file: String,

    /// Changed ref, e.g. refs/heads/main
    #[arg(long = "ref")]
    pub ref_name: String,

    /// Restrict to one pipeline
    #[arg(short, long)]
    pub pipeline: Option<String>,

    /// Predefined parameters (key=value)
    #[arg(long, value_parser = parse_key_value)]
    pub param: Vec<(String, String)>,
}

/// Match agents against a pipeline's requirements
#[derive(Debug, Args, Clone)]
pub struct AgentsCommand {
    /// Path to project YAML file
    #[arg(short, long)]
    pub file: String,

    /// Pipeline id
    #[arg(short, long)]
    pub pipeline: String,

    /// Path to agent inventory YAML file
    #[arg(short, long)]
    pub agents: String,

    /// Predefined parameters (key=value)
    #[arg(long, value_parser = parse_key_value)]
    pub param: Vec<(String, String)>,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Parse key=value pairs
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("Invalid key=value pair: {}", s)),
    }
}
