//! Thin debug CLI over the engine's own components — no host, no chat
//! session, just enough to invoke a hook by hand, validate a candidate hook
//! file against the configured test script, or dump persisted runtime state.

use clap::{Parser, Subcommand};
use opencode_evolve_hook::HookIpc;
use opencode_evolve_sandbox::Sandbox;
use opencode_evolve_session::{runtime_state::runtime_state_path, RuntimeStateStore};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "opencode-evolve")]
#[command(about = "Debug tooling for the opencode-evolve plugin engine")]
struct Cli {
    /// Workspace root (defaults to the current directory).
    #[arg(long, global = true, default_value = ".")]
    workspace: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Invoke a single hook directly and print its raw JSON output")]
    Invoke {
        #[arg(value_name = "HOOK")]
        hook: String,
        #[arg(long, default_value = "{}")]
        input: String,
    },
    #[command(about = "Run the configured test script against a candidate hook file")]
    Validate {
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },
    #[command(subcommand)]
    Runtime(RuntimeCommands),
}

#[derive(Subcommand)]
enum RuntimeCommands {
    #[command(about = "Print the persisted runtime state")]
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let workspace = cli.workspace.canonicalize().unwrap_or(cli.workspace);
    let config = opencode_evolve_config::load(&workspace)?;

    match cli.command {
        Commands::Invoke { hook, input } => invoke(&workspace, &config, &hook, &input).await?,
        Commands::Validate { path } => validate(&workspace, &config, &path).await?,
        Commands::Runtime(RuntimeCommands::Show) => show_runtime(&workspace).await?,
    }

    Ok(())
}

async fn invoke(
    workspace: &PathBuf,
    config: &opencode_evolve_core::WorkspaceConfig,
    hook: &str,
    input: &str,
) -> anyhow::Result<()> {
    let context: serde_json::Value = serde_json::from_str(input)?;
    let ipc = HookIpc::new(workspace, &config.hook, config.hook_timeout());
    match ipc.invoke(hook, context).await {
        Ok(output) => println!("{}", serde_json::to_string_pretty(&output)?),
        Err(error) => {
            eprintln!("hook invocation failed: {error}");
            std::process::exit(1);
        }
    }
    Ok(())
}

async fn validate(
    workspace: &PathBuf,
    config: &opencode_evolve_core::WorkspaceConfig,
    path: &PathBuf,
) -> anyhow::Result<()> {
    let content = std::fs::read(path)?;
    let resolved_test_script = config
        .test_script
        .as_ref()
        .map(|relative| workspace.join(relative).to_string_lossy().into_owned());
    let sandbox = Sandbox::new(workspace, &config.hook, resolved_test_script, config.hook_timeout());
    let outcome = sandbox.validate(&content).await;
    println!("{}", outcome.output);
    if !outcome.ok {
        std::process::exit(1);
    }
    Ok(())
}

async fn show_runtime(workspace: &PathBuf) -> anyhow::Result<()> {
    let store = RuntimeStateStore::load(workspace);
    match store.last_model().await {
        Some(model) => println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "path": runtime_state_path(workspace),
                "model": model,
            }))?
        ),
        None => println!(
            "{}",
            serde_json::json!({ "path": runtime_state_path(workspace), "model": null })
        ),
    }
    Ok(())
}
