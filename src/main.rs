use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use docgate::config::AppConfig;
use docgate::error::DocgateError;
use docgate::ratelimit::{AdmissionLimiter, AdmissionPolicy, TimeUnit};
use docgate::transport::{DocumentClient, HttpTransport};

/// Submit documents to the registration API without exceeding a request limit.
#[derive(Parser, Debug)]
#[command(name = "docgate", version, about)]
struct Cli {
    /// Window length: NANOSECONDS, MICROSECONDS, MILLISECONDS, SECONDS, MINUTES, HOURS or DAYS.
    /// Falls back to `limiter.time_unit` from the configuration when omitted
    time_unit: Option<TimeUnit>,

    /// Requests allowed per window.
    /// Falls back to `limiter.request_limit` from the configuration when omitted
    #[arg(value_parser = clap::value_parser!(u64).range(1..))]
    request_limit: Option<u64>,

    /// YAML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of sequential calls to perform
    #[arg(long)]
    calls: Option<usize>,

    /// Override the document endpoint
    #[arg(long)]
    endpoint: Option<String>,

    /// JSON document to submit
    #[arg(long)]
    document: Option<PathBuf>,

    /// Wait for the next window (block) or fail fast (reject)
    #[arg(long, value_enum)]
    policy: Option<AdmissionPolicy>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            process::exit(if err.use_stderr() { 1 } else { 0 });
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_thread_ids(true)
        .init();

    info!("Starting docgate");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let mut config = AppConfig::load(cli.config.as_deref())?;
    apply_overrides(&mut config, &cli);
    config.validate()?;

    let body = match &cli.document {
        Some(path) => load_document(path)?,
        None => "{}".to_string(),
    };

    info!(
        time_unit = %config.limiter.time_unit,
        request_limit = config.limiter.request_limit,
        policy = ?config.limiter.policy,
        endpoint = %config.transport.endpoint,
        calls = config.run.calls,
        "Configuration loaded"
    );

    let limiter = Arc::new(AdmissionLimiter::from_config(&config.limiter)?);
    let client = DocumentClient::new(limiter.clone(), HttpTransport::new(&config.transport)?);

    // Stop the limiter on Ctrl+C so a call waiting for a permit returns
    let watcher = {
        let limiter = limiter.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            limiter.stop();
        })
    };

    for call in 1..=config.run.calls {
        info!("API call #{}", call);
        match client.submit(&body).await {
            Ok(response) => {
                info!(status = response.status, body = %response.body, "Response received");
            }
            Err(DocgateError::Cancelled) => {
                warn!(call = call, "Limiter stopped, abandoning remaining calls");
                break;
            }
            Err(e) => {
                error!(call = call, error = %e, "API call failed");
            }
        }
    }

    watcher.abort();
    limiter.stop();

    info!("docgate finished");
    Ok(())
}

/// Apply command line values on top of the loaded configuration.
fn apply_overrides(config: &mut AppConfig, cli: &Cli) {
    if let Some(time_unit) = cli.time_unit {
        config.limiter.time_unit = time_unit;
    }
    if let Some(request_limit) = cli.request_limit {
        config.limiter.request_limit = request_limit;
    }
    if let Some(policy) = cli.policy {
        config.limiter.policy = policy;
    }
    if let Some(calls) = cli.calls {
        config.run.calls = calls;
    }
    if let Some(endpoint) = &cli.endpoint {
        config.transport.endpoint = endpoint.clone();
    }
}

/// Read a document file and check that it is valid JSON.
fn load_document(path: &Path) -> anyhow::Result<String> {
    let body = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read document {}", path.display()))?;
    serde_json::from_str::<serde_json::Value>(&body)
        .map_err(DocgateError::from)
        .with_context(|| format!("Document {} is not valid JSON", path.display()))?;
    Ok(body)
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, stopping limiter");
        }
        _ = terminate => {
            info!("Received SIGTERM, stopping limiter");
        }
    }
}
