//! Automation client binary
//!
//! Starts an automation server, invokes one tool, prints the result as JSON,
//! and stops the server.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use kodegen_automation_client::{AutomationClient, ClientOptions, ToolInvoker};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file path (JSON)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Server executable, overrides the configuration file
    #[arg(long)]
    command: Option<String>,

    /// Server argument (can be specified multiple times)
    #[arg(long = "arg", allow_hyphen_values = true)]
    args: Vec<String>,

    /// Working directory for the server
    #[arg(long)]
    cwd: Option<PathBuf>,

    /// Readiness sentinel
    #[arg(long)]
    sentinel: Option<String>,

    /// Readiness timeout in milliseconds
    #[arg(long)]
    ready_timeout_ms: Option<u64>,

    /// Request timeout in milliseconds
    #[arg(long)]
    request_timeout_ms: Option<u64>,

    /// Tool to invoke
    tool: String,

    /// Tool arguments as a JSON object
    #[arg(default_value = "{}")]
    arguments: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let options = build_options(&cli)?;
    let arguments: serde_json::Value =
        serde_json::from_str(&cli.arguments).context("Tool arguments must be valid JSON")?;

    let client = AutomationClient::new(options);
    client.start().await.context("Failed to start automation server")?;

    let outcome = client.call_tool(&cli.tool, arguments).await;
    client.stop().await;

    let result = outcome.with_context(|| format!("Tool {} failed", cli.tool))?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// Load the configuration file, then apply command-line overrides
fn build_options(cli: &Cli) -> Result<ClientOptions> {
    let mut options = match &cli.config {
        // Validated below, once the overrides are in.
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("Invalid configuration in {}", path.display()))?
        }
        None => ClientOptions::default(),
    };

    if let Some(command) = &cli.command {
        options.command.clone_from(command);
    }
    if !cli.args.is_empty() {
        options.args.clone_from(&cli.args);
    }
    if let Some(cwd) = &cli.cwd {
        options.cwd = Some(cwd.clone());
    }
    if let Some(sentinel) = &cli.sentinel {
        options.ready_sentinel.clone_from(sentinel);
    }
    if let Some(ms) = cli.ready_timeout_ms {
        options.ready_timeout = Duration::from_millis(ms);
    }
    if let Some(ms) = cli.request_timeout_ms {
        options.request_timeout = Duration::from_millis(ms);
    }

    options.validate()?;
    Ok(options)
}
