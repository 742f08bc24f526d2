use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use jotter::config::Config;
use jotter::server;

#[derive(Parser)]
#[command(name = "jotter", version, about = "Self-hosted notes service with token auth")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a config file with a freshly generated token signing secret
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
    /// Run the HTTP server
    Serve {
        /// Address to bind, overrides the config file
        #[arg(long)]
        host: Option<String>,
        /// Port to bind, overrides the config file
        #[arg(long)]
        port: Option<u16>,
        /// SQLite database path, overrides the config file
        #[arg(long)]
        database: Option<PathBuf>,
        /// Config file to load instead of the default location
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("jotter=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { force } => handle_init(force),
        Commands::Serve {
            host,
            port,
            database,
            config,
        } => handle_serve(host, port, database, config).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn handle_init(force: bool) -> Result<()> {
    let path = Config::default_path()?;
    if path.exists() && !force {
        anyhow::bail!(
            "Config already exists at {}. Pass --force to overwrite.",
            path.display()
        );
    }
    let config = Config::generate();
    config.save(&path)?;
    println!("✅ Config written to {}", path.display());
    println!("   A token signing secret was generated for you.");
    println!("   Start the server with: jotter serve");
    Ok(())
}

async fn handle_serve(
    host: Option<String>,
    port: Option<u16>,
    database: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let mut config = Config::load(config_path.as_deref())?;
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    if let Some(database) = database {
        config.database.path = Some(database);
    }
    server::run(&config).await
}
