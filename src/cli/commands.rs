//! CLI command definitions for appforge.
//!
//! The CLI is the non-interactive caller of the pipeline: it triggers a run,
//! then lists and prints workspace contents. It also enforces the upstream
//! contract that a blank prompt never reaches the planner.

use clap::Parser;
use std::sync::Arc;
use tracing::info;

use crate::agents::PipelineOrchestrator;
use crate::llm::OpenAiCompatClient;
use crate::pipeline::{PipelineConfig, PipelineRunner};
use crate::workspace::Workspace;

/// Default directory the generated project lands in.
const DEFAULT_PROJECT_ROOT: &str = "./generated_project";

/// Prompt-to-project code generator.
#[derive(Parser)]
#[command(name = "appforge")]
#[command(about = "Generate a project of real code files from a natural-language description")]
#[command(version)]
#[command(
    long_about = "appforge runs a planner, an architect and a coder agent over your prompt and \
writes the resulting files into a sandboxed project directory.\n\nExample usage:\n  \
appforge generate \"a calculator web app in HTML, CSS and JavaScript\""
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Generate a project from a natural-language description.
    #[command(alias = "gen")]
    Generate(GenerateArgs),

    /// List the files of a generated project.
    List(ListArgs),

    /// Print the content of one generated file.
    Show(ShowArgs),
}

/// Arguments for `appforge generate`.
#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// What to build, in plain language.
    pub prompt: String,

    /// Directory the generated files are written into.
    #[arg(short = 'o', long, default_value = DEFAULT_PROJECT_ROOT)]
    pub project_root: String,

    /// Maximum stage transitions before the run is aborted.
    #[arg(long, default_value = "100")]
    pub step_budget: u32,

    /// LLM model for all three stages (defaults to the provider default).
    #[arg(short = 'm', long)]
    pub model: Option<String>,

    /// API key (can also be set via LITELLM_API_KEY env var).
    #[arg(long, env = "LITELLM_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Print the run report as JSON instead of a summary.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `appforge list`.
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Directory of the generated project.
    #[arg(short = 'o', long, default_value = DEFAULT_PROJECT_ROOT)]
    pub project_root: String,
}

/// Arguments for `appforge show`.
#[derive(Parser, Debug)]
pub struct ShowArgs {
    /// Relative path of the file to print.
    pub path: String,

    /// Directory of the generated project.
    #[arg(short = 'o', long, default_value = DEFAULT_PROJECT_ROOT)]
    pub project_root: String,
}

/// Parses CLI arguments.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Runs the parsed CLI command.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Generate(args) => generate(args).await,
        Commands::List(args) => list(args),
        Commands::Show(args) => show(args),
    }
}

async fn generate(args: GenerateArgs) -> anyhow::Result<()> {
    if args.prompt.trim().is_empty() {
        anyhow::bail!("prompt is empty; describe the application to build");
    }

    let mut client = OpenAiCompatClient::from_env()?;
    if let Some(api_key) = args.api_key {
        client = OpenAiCompatClient::new(
            client.api_base().to_string(),
            Some(api_key),
            client.default_model().to_string(),
        );
    }

    let mut config = PipelineConfig::default().with_step_budget(args.step_budget);
    if let Some(model) = args.model {
        config = config.with_model(model);
    }

    let workspace = Workspace::new(&args.project_root);
    let orchestrator = PipelineOrchestrator::new(Arc::new(client), workspace, config);
    let runner = PipelineRunner::new(orchestrator);

    info!(project_root = %args.project_root, "starting generation");
    let report = runner.run(&args.prompt).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if report.success {
        println!(
            "Generated {} file(s) in {} ({} steps, {} ms)",
            report.file_count(),
            args.project_root,
            report.steps_used,
            report.duration_ms
        );
    } else {
        let reason = report
            .error
            .as_ref()
            .map(|e| e.to_string())
            .unwrap_or_else(|| "unknown failure".to_string());
        println!(
            "Run failed ({}); {} file(s) were written before the failure",
            reason,
            report.file_count()
        );
    }

    for path in &report.files_written {
        println!("  + {}", path);
    }
    for (path, reason) in &report.failed_files {
        println!("  ! {} ({})", path, reason);
    }

    Ok(())
}

fn list(args: ListArgs) -> anyhow::Result<()> {
    let workspace = Workspace::new(&args.project_root);
    println!("{}", workspace.listing()?);
    Ok(())
}

fn show(args: ShowArgs) -> anyhow::Result<()> {
    let workspace = Workspace::new(&args.project_root);
    print!("{}", workspace.read_file(&args.path)?);
    Ok(())
}
