use anyhow::{Context, Result};
use pipeconf::agent::{AgentInventory, AgentProvider};
use pipeconf::cli::commands::{AgentsCommand, ResolveCommand, TriggerCommand, ValidateCommand};
use pipeconf::cli::output::*;
use pipeconf::cli::{Cli, Command};
use pipeconf::core::config::load_project;
use pipeconf::core::ParameterStore;
use pipeconf::engine::{Catalog, CatalogError, Validator};
use pipeconf::resolve::{EnvCredentialStore, ProcessEnvironment, Resolver};
use pipeconf::settings::EngineSettings;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    let settings = EngineSettings::load(cli.config.as_deref())?;

    match &cli.command {
        Command::Validate(cmd) => validate_project(cmd, &settings).await?,
        Command::Resolve(cmd) => resolve_pipeline(cmd, &settings).await?,
        Command::Trigger(cmd) => show_triggers(cmd, &settings).await?,
        Command::Agents(cmd) => show_agents(cmd, &settings).await?,
    }

    Ok(())
}

fn live_resolver(settings: &EngineSettings) -> Resolver {
    Resolver::new(
        Arc::new(ProcessEnvironment),
        Arc::new(EnvCredentialStore::new(settings.credential_env_prefix.clone())),
        settings.resolver_config(),
    )
}

/// Load and install a project; an invalid project prints its report and exits
async fn load_catalog(file: &str, resolver: Resolver, predefined: ParameterStore) -> Result<(Catalog, String)> {
    let project = load_project(file).context("Failed to load project")?;
    let project_id = project.id.clone();

    let mut catalog = Catalog::new(resolver).with_predefined(predefined);
    match catalog.install(project).await {
        Ok(()) => Ok((catalog, project_id)),
        Err(CatalogError::Invalid(report)) => {
            println!("{}", format_report(&report));
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}

async fn validate_project(cmd: &ValidateCommand, settings: &EngineSettings) -> Result<()> {
    println!("{} Validating project...", INFO);

    let project = load_project(&cmd.file).context("Failed to load project")?;
    let report = Validator::default()
        .with_predefined(settings.predefined_with(&cmd.param))
        .validate(&project)
        .await;

    if cmd.json {
        let issues: Vec<_> = report
            .issues()
            .iter()
            .map(|issue| {
                serde_json::json!({
                    "location": issue.location,
                    "error": issue.error.to_string(),
                })
            })
            .collect();
        let data = serde_json::json!({
            "project": report.project(),
            "valid": report.is_valid(),
            "issues": issues,
        });
        println!("{}", serde_json::to_string_pretty(&data)?);
    } else {
        println!("{}", format_report(&report));
        if report.is_valid() {
            println!("  VCS roots: {}", style(project.vcs_roots.len()).cyan());
            println!("  Pipelines: {}", style(project.pipelines.len()).cyan());
        }
    }

    if !report.is_valid() {
        std::process::exit(1);
    }
    Ok(())
}

async fn resolve_pipeline(cmd: &ResolveCommand, settings: &EngineSettings) -> Result<()> {
    let resolver = if cmd.r#static {
        Resolver::static_mode()
    } else {
        live_resolver(settings)
    };
    let (catalog, project_id) =
        load_catalog(&cmd.file, resolver, settings.predefined_with(&cmd.param)).await?;

    match catalog.resolve_pipeline(&project_id, &cmd.pipeline).await {
        Ok(resolved) => {
            println!("{}", resolved.to_masked_json()?);
            Ok(())
        }
        Err(CatalogError::Resolution { pipeline, issues }) => {
            println!("{} Failed to resolve {}:", CROSS, style(&pipeline).bold());
            for issue in &issues {
                println!("  {} {}", style(&issue.location).cyan(), style(&issue.error).dim());
            }
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}

async fn show_triggers(cmd: &TriggerCommand, settings: &EngineSettings) -> Result<()> {
    let (catalog, project_id) =
        load_catalog(&cmd.file, live_resolver(settings), settings.predefined_with(&cmd.param)).await?;

    let pipeline_ids: Vec<String> = match &cmd.pipeline {
        Some(id) => vec![id.clone()],
        None => catalog
            .project(&project_id)
            .map(|p| p.pipelines.iter().map(|pl| pl.id.clone()).collect())
            .unwrap_or_default(),
    };

    println!("{} Pipelines for {}:", INFO, style(&cmd.ref_name).bold());
    let mut any = false;
    for pipeline_id in &pipeline_ids {
        let triggered = catalog.is_trigger_applicable(pipeline_id, &cmd.ref_name)?;
        any |= triggered;
        println!("  {}", format_trigger(pipeline_id, triggered));
    }
    if !any {
        println!("{} No pipeline is triggered", WARN);
    }

    Ok(())
}

async fn show_agents(cmd: &AgentsCommand, settings: &EngineSettings) -> Result<()> {
    let inventory = AgentInventory::from_file(&cmd.agents)?;
    let agents = inventory.agents().await?;
    let (catalog, _) =
        load_catalog(&cmd.file, live_resolver(settings), settings.predefined_with(&cmd.param)).await?;

    let evaluations = catalog.explain_agents(&cmd.pipeline, &agents)?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&evaluations)?);
        return Ok(());
    }

    println!("{} Agents for {}:", INFO, style(&cmd.pipeline).bold());
    for evaluation in &evaluations {
        println!("  {}", format_agent(evaluation));
    }
    if !evaluations.iter().any(|e| e.outcome.eligible) {
        println!("{} No compatible agent", WARN);
    }

    Ok(())
}
