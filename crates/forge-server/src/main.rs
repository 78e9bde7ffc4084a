use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use forge_core::Repository;
use forge_server::{http, telemetry};

/// meshforge repository engine
///
/// A narrow HTTP surface over an on-disk mesh/branch/commit version
/// control tree. This binary starts the engine; it does not expose
/// mesh/branch/commit verbs as its own CLI vocabulary — drive the running
/// server over HTTP instead.
#[derive(Parser)]
#[command(name = "forgectl")]
#[command(version, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve(ServeArgs),

    /// Rebuild and persist the forest index from the filesystem, then exit
    ///
    /// Useful for recovering from a suspected index drift without starting
    /// the server, or as a startup step in a deployment script.
    Rescan {
        /// Repository root directory
        #[arg(long, default_value = ".")]
        root: PathBuf,
    },
}

#[derive(clap::Args)]
struct ServeArgs {
    /// Repository root directory
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Bind host, overriding engine.toml and the built-in default
    #[arg(long)]
    host: Option<IpAddr>,

    /// Bind port, overriding engine.toml and the built-in default
    #[arg(long)]
    port: Option<u16>,
}

fn main() -> Result<()> {
    telemetry::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Serve(args) => serve(args),
        Commands::Rescan { root } => rescan(&root),
    }
}

fn rescan(root: &PathBuf) -> Result<()> {
    let repo = Repository::open(root)
        .with_context(|| format!("failed to open repository at '{}'", root.display()))?;
    let forest = repo.rescan().context("failed to rescan repository")?;
    tracing::info!(meshes = forest.meshes.len(), "rescan complete");
    println!("{}", serde_json::to_string_pretty(&forest)?);
    Ok(())
}

fn serve(args: ServeArgs) -> Result<()> {
    let repo = Repository::open(&args.root)
        .with_context(|| format!("failed to open repository at '{}'", args.root.display()))?;

    let host = args
        .host
        .unwrap_or_else(|| repo.config().server.host.parse().unwrap_or([127, 0, 0, 1].into()));
    let port = args.port.unwrap_or(repo.config().server.port);
    let addr = SocketAddr::new(host, port);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    runtime.block_on(async move {
        let router = http::router(Arc::new(repo));
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {addr}"))?;

        tracing::info!(%addr, "meshforge engine listening");
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("server error")
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    tracing::info!("shutdown signal received");
}
