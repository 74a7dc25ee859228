use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::{CommandFactory, Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use stepflow_core::config::AppConfig;
use stepflow_engine::{load_workflow_file, validate, Workflow, WorkflowEngine};

#[derive(Parser)]
#[command(name = "stepflow", version, about = "Workflow graph interpreter backed by a code sandbox")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "stepflow.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a workflow and print the result as JSON
    Run {
        /// Workflow definition (JSON with `nodes` and `edges`)
        workflow: PathBuf,
        /// Initial context as a JSON object
        #[arg(long, conflicts_with = "context_file")]
        context: Option<String>,
        /// File holding the initial context as a JSON object
        #[arg(long)]
        context_file: Option<PathBuf>,
        /// Override the configured sandbox endpoint
        #[arg(long, env = "STEPFLOW_SANDBOX_URL")]
        sandbox_url: Option<String>,
    },
    /// Parse and validate a workflow without running it
    Validate {
        /// Workflow definition (JSON with `nodes` and `edges`)
        workflow: PathBuf,
    },
    /// Show current configuration
    Config,
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Handle completions before config loading
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(*shell, &mut cmd, "stepflow", &mut std::io::stdout());
        return Ok(ExitCode::SUCCESS);
    }

    let config = load_config(&cli.config)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log.filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run {
            workflow,
            context,
            context_file,
            sandbox_url,
        } => run(config, &workflow, context, context_file, sandbox_url).await,
        Commands::Validate { workflow } => {
            let raw = load_workflow_file(&workflow)?;
            let parsed = Workflow::parse(&raw)?;
            validate(&parsed)?;
            println!(
                "{}: valid ({} nodes, {} edges)",
                workflow.display(),
                parsed.node_count(),
                parsed.edges().len()
            );
            Ok(ExitCode::SUCCESS)
        }
        Commands::Config => {
            println!("{}", toml::to_string_pretty(&config)?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Completions { .. } => unreachable!("handled above"),
    }
}

/// Missing default config falls back to built-in defaults; an explicit path must exist.
fn load_config(path: &Path) -> anyhow::Result<AppConfig> {
    if path.exists() {
        return AppConfig::load(path).with_context(|| format!("loading {}", path.display()));
    }
    if path == Path::new("stepflow.toml") {
        return Ok(AppConfig::default());
    }
    bail!("config file not found: {}", path.display())
}

async fn run(
    mut config: AppConfig,
    workflow_path: &Path,
    context: Option<String>,
    context_file: Option<PathBuf>,
    sandbox_url: Option<String>,
) -> anyhow::Result<ExitCode> {
    if let Some(url) = sandbox_url {
        config.sandbox.endpoint = url;
    }

    let raw = load_workflow_file(workflow_path)?;
    let initial_context = match (context, context_file) {
        (Some(inline), _) => parse_context(&inline)?,
        (None, Some(path)) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            parse_context(&text)?
        }
        (None, None) => HashMap::new(),
    };

    info!(
        workflow = %workflow_path.display(),
        sandbox = %config.sandbox.endpoint,
        "Running workflow"
    );

    let engine = WorkflowEngine::from_config(&config)?;
    let result = engine.execute_workflow(&raw, initial_context).await?;

    println!("{}", serde_json::to_string_pretty(&result)?);

    if result.succeeded() {
        Ok(ExitCode::SUCCESS)
    } else {
        error!(
            failed_at_node = result.failed_at_node.as_deref().unwrap_or(""),
            error = result.error.as_deref().unwrap_or(""),
            "Workflow failed"
        );
        Ok(ExitCode::FAILURE)
    }
}

fn parse_context(text: &str) -> anyhow::Result<HashMap<String, serde_json::Value>> {
    match serde_json::from_str::<serde_json::Value>(text).context("parsing initial context")? {
        serde_json::Value::Object(map) => Ok(map.into_iter().collect()),
        _ => bail!("initial context must be a JSON object"),
    }
}
