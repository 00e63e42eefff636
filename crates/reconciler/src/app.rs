//! Wiring from configuration to a running reconciler.

use std::time::Duration;

use redeliver_common::config::{AppConfig, CheckpointBackendKind};
use redeliver_common::error::{AppError, AppResult};
use redeliver_common::redis_pool::create_redis_pool;
use redeliver_engine::{
    CheckpointBackend, Reconciler, ReconcilerOptions, RedisCheckpointStore, RunReport,
    VariableCheckpointStore,
};
use redeliver_github::GitHubClient;

pub type GitHubReconciler = Reconciler<GitHubClient, CheckpointBackend>;

/// Build the GitHub client, checkpoint backend and reconciler from `config`.
pub async fn build_reconciler(config: &AppConfig) -> AppResult<GitHubReconciler> {
    let client = GitHubClient::new(
        &config.github_api_url,
        &config.token,
        config.repository.clone(),
        Duration::from_secs(config.http_timeout_secs),
    )?;

    let store = match config.checkpoint_backend {
        CheckpointBackendKind::GitHub => {
            CheckpointBackend::Variables(VariableCheckpointStore::new(client.clone()))
        }
        CheckpointBackendKind::Redis => {
            let redis = create_redis_pool(&config.redis_url).await?;
            CheckpointBackend::Redis(RedisCheckpointStore::new(redis))
        }
    };

    Ok(Reconciler::new(client, store, options(config)?))
}

pub fn options(config: &AppConfig) -> AppResult<ReconcilerOptions> {
    let mut options = ReconcilerOptions::new(config.checkpoint_variable.clone());
    options.webhook_id = config.webhook_id;
    options.lookback = i64::try_from(config.lookback_hours)
        .ok()
        .and_then(chrono::Duration::try_hours)
        .ok_or_else(|| {
            AppError::Config(format!(
                "LOOKBACK_HOURS {} is out of range",
                config.lookback_hours
            ))
        })?;
    options.dry_run = config.dry_run;
    Ok(options)
}

/// Run passes every `interval` until the task is cancelled.
///
/// A failed pass does not stop the loop; its checkpoint was not advanced, so
/// the next pass covers the same window again.
pub async fn run_every(reconciler: &GitHubReconciler, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if let Err(e) = reconciler.run().await {
            tracing::error!(error = %e, "Reconciliation pass failed, retrying next interval");
        }
    }
}

/// Run a single pass.
pub async fn run_once(reconciler: &GitHubReconciler) -> AppResult<RunReport> {
    reconciler.run().await
}

/// Workflow command GitHub Actions turns into a failed-step annotation.
pub fn actions_error_command(message: &str) -> String {
    let escaped = message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A");
    format!("::error::{}", escaped)
}
