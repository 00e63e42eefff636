use crate::error::{AppError, AppResult};
use crate::types::Repository;

/// Upper bound for `LOOKBACK_HOURS`. GitHub keeps delivery history for days,
/// not years.
pub const MAX_LOOKBACK_HOURS: u64 = 24 * 365;

/// Where the reconciliation checkpoint is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointBackendKind {
    /// GitHub Actions repository variable.
    GitHub,
    Redis,
}

impl std::str::FromStr for CheckpointBackendKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "github" => Ok(CheckpointBackendKind::GitHub),
            "redis" => Ok(CheckpointBackendKind::Redis),
            other => Err(AppError::Config(format!(
                "CHECKPOINT_BACKEND must be 'github' or 'redis', got '{}'",
                other
            ))),
        }
    }
}

/// Global application configuration loaded from environment variables.
///
/// Action inputs (`INPUT_*`) take precedence over the plain variables so the
/// same binary works as a GitHub Action step and as a scheduled job.
#[derive(Clone)]
pub struct AppConfig {
    /// Token used for every GitHub API call
    pub token: String,

    /// Target repository (`owner/repo`)
    pub repository: Repository,

    /// Single webhook to reconcile; all webhooks of the repository when unset
    pub webhook_id: Option<u64>,

    /// Name of the variable holding the last reconciliation time
    pub checkpoint_variable: String,

    /// GitHub REST API base URL (default: https://api.github.com)
    pub github_api_url: String,

    /// Checkpoint store backend (default: github)
    pub checkpoint_backend: CheckpointBackendKind,

    /// Redis connection string, used by the redis backend
    pub redis_url: String,

    /// Log decisions without requesting redeliveries or advancing the checkpoint
    pub dry_run: bool,

    /// Lookback window when no checkpoint exists yet (default: 24)
    pub lookback_hours: u64,

    /// Run continuously with this interval between passes; single pass when unset
    pub reconcile_interval_secs: Option<u64>,

    /// Per-request HTTP timeout in seconds (default: 30)
    pub http_timeout_secs: u64,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// Empty values count as unset; GitHub exports every declared action input
    /// even when the workflow leaves it blank.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let input = |name: &str, fallback: &str| {
            get(&format!("INPUT_{}", name.to_ascii_uppercase())).or_else(|| get(fallback))
        };

        let token = input("token", "TOKEN")
            .ok_or_else(|| AppError::Config("No token provided".to_string()))?;

        let repository = input("repository", "GITHUB_REPOSITORY")
            .ok_or_else(|| AppError::Config("No repository provided".to_string()))?
            .parse::<Repository>()?;

        let webhook_id = input("webhook_id", "WEBHOOK_ID")
            .map(|raw| {
                raw.trim().parse::<u64>().map_err(|_| {
                    AppError::Config(format!("WEBHOOK_ID must be a numeric hook id, got '{}'", raw))
                })
            })
            .transpose()?;

        let checkpoint_variable = input(
            "last_redelivery_variable_name",
            "LAST_REDELIVERY_VARIABLE_NAME",
        )
        .ok_or_else(|| AppError::Config("No last redelivery variable name provided".to_string()))?;

        Ok(Self {
            token,
            repository,
            webhook_id,
            checkpoint_variable,
            github_api_url: get("GITHUB_API_URL")
                .unwrap_or_else(|| "https://api.github.com".to_string())
                .trim_end_matches('/')
                .to_string(),
            checkpoint_backend: get("CHECKPOINT_BACKEND")
                .map(|v| v.parse::<CheckpointBackendKind>())
                .transpose()?
                .unwrap_or(CheckpointBackendKind::GitHub),
            redis_url: get("REDIS_URL").unwrap_or_else(|| "redis://localhost:6379".to_string()),
            dry_run: get("DRY_RUN")
                .map(|v| parse_bool("DRY_RUN", &v))
                .transpose()?
                .unwrap_or(false),
            lookback_hours: get("LOOKBACK_HOURS")
                .unwrap_or_else(|| "24".to_string())
                .parse::<u64>()
                .ok()
                .filter(|hours| (1..=MAX_LOOKBACK_HOURS).contains(hours))
                .ok_or_else(|| {
                    AppError::Config(format!(
                        "LOOKBACK_HOURS must be between 1 and {}",
                        MAX_LOOKBACK_HOURS
                    ))
                })?,
            reconcile_interval_secs: get("RECONCILE_INTERVAL_SECS")
                .map(|v| match v.trim().parse::<u64>() {
                    Ok(0) => Err(AppError::Config(
                        "RECONCILE_INTERVAL_SECS must be greater than zero".to_string(),
                    )),
                    Ok(secs) => Ok(secs),
                    Err(_) => Err(AppError::Config(
                        "RECONCILE_INTERVAL_SECS must be a valid u64".to_string(),
                    )),
                })
                .transpose()?,
            http_timeout_secs: get("HTTP_TIMEOUT_SECS")
                .unwrap_or_else(|| "30".to_string())
                .parse()
                .map_err(|_| AppError::Config("HTTP_TIMEOUT_SECS must be a valid u64".to_string()))?,
        })
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("token", &"<redacted>")
            .field("repository", &self.repository.to_string())
            .field("webhook_id", &self.webhook_id)
            .field("checkpoint_variable", &self.checkpoint_variable)
            .field("github_api_url", &self.github_api_url)
            .field("checkpoint_backend", &self.checkpoint_backend)
            .field("dry_run", &self.dry_run)
            .field("lookback_hours", &self.lookback_hours)
            .field("reconcile_interval_secs", &self.reconcile_interval_secs)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .finish()
    }
}

fn parse_bool(key: &str, value: &str) -> AppResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(AppError::Config(format!("{} must be a boolean, got '{}'", key, value))),
    }
}
