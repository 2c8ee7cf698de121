//! User service entry point.

use std::net::SocketAddr;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use user_service::api::create_router;
use user_service::app::{build_state, connect};
use user_service::config::Config;
use user_service::health::{HealthChecker, SqlHealthChecker};
use user_service::metrics;
use user_service::user::SqlUserAdapter;
use user_service::utils::shutdown_signal;

/// User CRUD REST service.
#[derive(Parser, Debug)]
#[command(name = "user-service")]
#[command(about = "REST service exposing CRUD operations over users")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,

    /// HTTP server port (overrides PORT).
    #[arg(short, long)]
    port: Option<u16>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API (default).
    Serve {
        /// HTTP server port (overrides PORT).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check configuration validity.
    CheckConfig,

    /// Connect to the database and run the health probe.
    CheckDb,

    /// Create the users table if it does not exist.
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize logging
    let filter = if args.verbose {
        EnvFilter::new("user_service=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match args.command {
        Some(Command::Serve { port }) => cmd_serve(port.or(args.port)).await,
        Some(Command::CheckConfig) => cmd_check_config(),
        Some(Command::CheckDb) => cmd_check_db().await,
        Some(Command::Migrate) => cmd_migrate().await,
        None => cmd_serve(args.port).await,
    }
}

/// Load and validate configuration, logging failures.
fn load_config() -> anyhow::Result<Config> {
    let config = Config::load().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(anyhow::anyhow!("Configuration validation failed: {}", e));
    }

    Ok(config)
}

/// Serve the HTTP API until a shutdown signal arrives.
async fn cmd_serve(port_override: Option<u16>) -> anyhow::Result<()> {
    info!("Loading configuration...");
    let mut config = load_config()?;
    if let Some(port) = port_override {
        config.port = port;
    }

    let handle = match metrics::install_prometheus() {
        Ok(handle) => {
            metrics::init_metrics();
            Some(handle)
        }
        Err(e) => {
            warn!(error = %e, "Metrics disabled");
            None
        }
    };

    let pool = connect(&config).await?;
    let state = build_state(&config, pool.clone(), handle).await?;
    let router = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Check configuration validity.
fn cmd_check_config() -> anyhow::Result<()> {
    let config = load_config()?;

    println!("Configuration OK");
    println!("  Database:        {}", config.redacted_database_url());
    println!("  Pool size:       {}", config.db_max_connections);
    println!("  Port:            {}", config.port);
    println!("  Auto migrate:    {}", config.auto_migrate);
    println!("  Log bodies:      {}", config.log_request_body);
    println!("  Masked fields:   phone, {}", config.log_mask_fields.join(", "));
    Ok(())
}

/// Connect to the database and run the health probe once.
async fn cmd_check_db() -> anyhow::Result<()> {
    let config = load_config()?;
    let pool = connect(&config).await?;
    let checker = SqlHealthChecker::new(pool.clone(), config.health_timeout());

    let result = checker.check().await;
    pool.close().await;

    match result {
        Ok(()) => {
            println!("Database OK");
            Ok(())
        }
        Err(e) => Err(anyhow::anyhow!("Database check failed: {}", e)),
    }
}

/// Create the users table.
async fn cmd_migrate() -> anyhow::Result<()> {
    let config = load_config()?;
    let pool = connect(&config).await?;

    SqlUserAdapter::new(pool.clone()).ensure_schema().await?;
    pool.close().await;

    println!("Migration complete");
    Ok(())
}
