//! athena-pricing - Project pricing over the resource API
//!
//! `serve` runs the JSON API for the display layer. `report`, `inspect` and
//! `flatten` run a single query from the terminal.

use std::fs::OpenOptions;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Context, Result};
use athena_common::aggregate::GroupBy;
use athena_common::config::{config_path, ApiOverrides, ApiSettings, TomlConfig};
use athena_common::{Flattener, TableView};
use athena_pricing::api::inspect::{requested_resources, ResourceInspectionView};
use athena_pricing::api::pricing::ProjectReportView;
use athena_pricing::client::{ApiEndpoints, HttpFetcher, OAuthTokenProvider};
use athena_pricing::query::{PricingService, QueryOptions};
use athena_pricing::session::SessionState;
use athena_pricing::{build_router, AppState};
use clap::{Parser, Subcommand, ValueEnum};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Command-line arguments for athena-pricing
#[derive(Parser, Debug)]
#[command(name = "athena-pricing")]
#[command(about = "Project pricing reports from the Athena resource API")]
#[command(version)]
struct Args {
    /// Config file (default: ~/.config/athena/athena-pricing.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Resource API base URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// OAuth2 token URL (default: derived from the base URL)
    #[arg(long, global = true)]
    token_url: Option<String>,

    #[arg(long, global = true)]
    client_id: Option<String>,

    #[arg(long, global = true)]
    client_secret: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API
    Serve {
        /// Port to listen on (default: from config, 5740)
        #[arg(short, long, env = "ATHENA_PORT")]
        port: Option<u16>,
    },
    /// Price every well of a project
    Report {
        project_number: String,
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
        /// line_type or source_attribute
        #[arg(long)]
        group_by: Option<GroupBy>,
    },
    /// Show the raw resources of one well as flat tables
    Inspect {
        well_id: String,
        /// Single resource, e.g. cartageCharges (default: all)
        #[arg(long)]
        resource: Option<String>,
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Flatten a JSON file
    Flatten {
        file: PathBuf,
        #[arg(long)]
        separator: Option<String>,
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_file = config_path(args.config.as_deref());
    let (config, origin) = TomlConfig::read(&config_file)?;
    init_tracing(&config)?;
    origin.log();

    info!(
        "Starting athena-pricing v{} (config: {})",
        env!("CARGO_PKG_VERSION"),
        config_file.display()
    );

    let overrides = ApiOverrides {
        base_url: args.base_url.as_deref(),
        token_url: args.token_url.as_deref(),
        client_id: args.client_id.as_deref(),
        client_secret: args.client_secret.as_deref(),
    };

    match args.command {
        Command::Flatten {
            file,
            separator,
            format,
        } => run_flatten(&config.flatten, &file, separator, format),
        Command::Serve { port } => {
            let settings = ApiSettings::resolve(&overrides, &config)?;
            serve(&config, &settings, port.unwrap_or(config.port)).await
        }
        Command::Report {
            project_number,
            format,
            group_by,
        } => {
            let settings = ApiSettings::resolve(&overrides, &config)?;
            let service = build_service(&config, &settings)?;
            let session = ready_session(&settings)?;
            let group_by = group_by.unwrap_or(config.query.group_by);

            let cancel = CancellationToken::new();
            cancel_on_ctrl_c(cancel.clone());

            let report = service
                .project_report(&session, &project_number, group_by, &cancel)
                .await?;
            let view = ProjectReportView::from(&report);
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&view)?),
                OutputFormat::Text => print!("{}", view.to_text()),
            }
            Ok(())
        }
        Command::Inspect {
            well_id,
            resource,
            format,
        } => {
            let settings = ApiSettings::resolve(&overrides, &config)?;
            let service = build_service(&config, &settings)?;
            let session = ready_session(&settings)?;
            let resources = requested_resources(resource.as_deref())?;

            let inspections = service.inspect_well(&session, &well_id, &resources).await?;
            let views: Vec<ResourceInspectionView> =
                inspections.iter().map(ResourceInspectionView::from).collect();
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&views)?),
                OutputFormat::Text => {
                    for view in &views {
                        println!("{}", view.to_text());
                    }
                }
            }
            Ok(())
        }
    }
}

/// RUST_LOG wins over `logging.level`; `logging.file` redirects output
///
/// Logs go to stderr so stdout carries only command results.
fn init_tracing(config: &TomlConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match &config.logging.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}

fn build_service(config: &TomlConfig, settings: &ApiSettings) -> Result<PricingService> {
    let endpoints = ApiEndpoints::new(&settings.base_url)?;
    let options = QueryOptions {
        max_concurrent_fetches: config.query.max_concurrent_fetches,
        group_by: config.query.group_by,
        flattener: config.flatten.clone(),
    };
    info!(
        base_url = %endpoints.base_url(),
        token_url = %settings.token_url,
        max_concurrent_fetches = options.max_concurrent_fetches,
        "Resource API configured"
    );

    Ok(PricingService::new(
        endpoints,
        Arc::new(OAuthTokenProvider::new(&settings.token_url)?),
        Arc::new(HttpFetcher::new()?),
        options,
    ))
}

/// One-shot commands have no login step and need credentials up front
fn ready_session(settings: &ApiSettings) -> Result<SessionState> {
    let (Some(client_id), Some(client_secret)) = (&settings.client_id, &settings.client_secret)
    else {
        bail!(
            "Both Client ID and Client Secret are required. Use --client-id/--client-secret, \
             ATHENA_CLIENT_ID/ATHENA_CLIENT_SECRET, or client_id/client_secret in the config file."
        );
    };
    Ok(SessionState::new(false).submit_credentials(client_id, client_secret)?)
}

async fn serve(config: &TomlConfig, settings: &ApiSettings, port: u16) -> Result<()> {
    let service = build_service(config, settings)?;

    let mut session = SessionState::new(config.login.is_some());
    match (&settings.client_id, &settings.client_secret) {
        (Some(id), Some(secret)) if config.login.is_none() => {
            session = session.submit_credentials(id, secret)?;
        }
        (Some(_), Some(_)) => {
            warn!("Login is configured; preconfigured API credentials are ignored until submitted after login");
        }
        _ => info!("API credentials not configured, waiting for submission"),
    }

    let state = AppState::new(service, session, config.login.clone());
    let shutdown = state.shutdown.clone();
    let app = build_router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("athena-pricing listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            shutdown.cancel();
        })
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

fn run_flatten(
    flattener: &Flattener,
    file: &Path,
    separator: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let raw: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("{} is not valid JSON", file.display()))?;

    let flattener = match separator {
        Some(separator) => Flattener {
            separator,
            ..flattener.clone()
        },
        None => flattener.clone(),
    };
    let view = TableView::of(&flattener.flatten(&raw)?);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&view)?),
        OutputFormat::Text => print!("{}", view.to_text()),
    }
    Ok(())
}

fn cancel_on_ctrl_c(cancel: CancellationToken) {
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            warn!("Received Ctrl+C, cancelling query");
            cancel.cancel();
        }
    });
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install terminate handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
