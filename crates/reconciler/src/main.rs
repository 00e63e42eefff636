use std::time::Duration;

use tracing_subscriber::EnvFilter;

use redeliver_common::config::AppConfig;
use redeliver_reconciler::app;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(
            "webhook_redeliver=info,redeliver_reconciler=info,redeliver_engine=info,redeliver_github=info",
        )
    });
    if std::env::var("LOG_FORMAT").is_ok_and(|f| f == "json") {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!("Webhook redeliver starting...");

    let in_actions = std::env::var("GITHUB_ACTIONS").is_ok_and(|v| v == "true");

    if let Err(e) = run().await {
        tracing::error!(error = %e, "Webhook redeliver failed");
        if in_actions {
            println!("{}", app::actions_error_command(&e.to_string()));
        }
        return Err(e);
    }

    tracing::info!("Webhook redeliver stopped.");
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // Load configuration
    let config = AppConfig::from_env()?;
    tracing::debug!(config = ?config, "Configuration loaded");

    let reconciler = app::build_reconciler(&config).await?;

    match config.reconcile_interval_secs {
        None => {
            app::run_once(&reconciler).await?;
        }
        Some(secs) => {
            tracing::info!(
                repository = %config.repository,
                interval_secs = secs,
                "Starting continuous reconciliation"
            );

            // Run with graceful shutdown on Ctrl+C
            tokio::select! {
                _ = app::run_every(&reconciler, Duration::from_secs(secs)) => {}
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Received shutdown signal, stopping gracefully...");
                }
            }
        }
    }

    Ok(())
}
