//! Risp CLI entry point: resolve configuration, start the engine, and serve
//! it over stdio (§11).
//!
//! Data directory override precedence:
//!   1. --data-dir flag
//!   2. RISP_DATA_DIR env var
//!   3. XDG / platform data dir via dirs crate
//!   4. Fallback: ./.risp-data

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use risp::config::Config;
use risp::engine::Engine;
use risp::RispServer;
use rmcp::{transport::stdio, ServiceExt};
use tracing_subscriber::EnvFilter;

/// Command line interface for the risp MCP server.
#[derive(Debug, Parser)]
#[command(name = "risp", version, about = "Risp: a personal knowledge-indexing engine")]
struct Cli {
    /// Explicit data directory (overrides env + platform default)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Address the RPC facade reports itself as listening on (informational;
    /// transport is stdio regardless).
    #[arg(long, default_value = "stdio://risp")]
    rpc_endpoint: String,

    /// Suppress info logs (only warnings+)
    #[arg(long)]
    quiet: bool,

    /// Force ANSI color output in logs
    #[arg(long)]
    color: bool,

    /// Disable ANSI color output
    #[arg(long)]
    no_color: bool,

    /// Print the resolved data directory and exit
    #[arg(long)]
    print_data_dir: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logging / tracing setup
    let mut fmt = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(if cli.quiet { "info" } else { "risp=debug" }.parse()?),
        )
        .with_writer(std::io::stderr)
        .with_target(false);

    // Color handling precedence: --no-color > inherited tty auto > --color
    if cli.no_color {
        fmt = fmt.with_ansi(false);
    } else if cli.color {
        fmt = fmt.with_ansi(true);
    } else {
        // auto: leave default (enabled if stderr is a TTY)
    }
    fmt.init();

    let data_dir = Config::resolve_data_dir(cli.data_dir);
    if cli.print_data_dir {
        println!("{}", data_dir.display());
        return Ok(());
    }

    let config = Config { data_dir: data_dir.clone(), rpc_endpoint: cli.rpc_endpoint };
    tracing::info!(data_dir = %config.data_dir.display(), "starting risp");

    let engine = Arc::new(Engine::start(config.data_dir).await?);
    tracing::info!("engine initialized; awaiting stdio transport messages");

    let server = RispServer::new(engine);
    let service = server.serve(stdio()).await?;
    service.waiting().await?;
    Ok(())
}
