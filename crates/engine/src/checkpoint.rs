//! Checkpoint store backends.
//!
//! The checkpoint is one decimal millisecond timestamp kept under a name. Both
//! backends distinguish create from update: creating fails when the name
//! already exists, updating fails when it does not. The read outcome decides
//! which one a later write uses.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use redeliver_common::error::{AppError, AppResult};
use redeliver_common::types::Checkpoint;
use redeliver_github::GitHubClient;

/// Result of reading the checkpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredCheckpoint {
    /// The name exists; the raw value may or may not parse.
    Found(String),
    /// No prior run.
    Absent,
}

impl StoredCheckpoint {
    pub fn checkpoint(&self) -> Option<Checkpoint> {
        match self {
            StoredCheckpoint::Found(value) => Checkpoint::parse(value),
            StoredCheckpoint::Absent => None,
        }
    }
}

/// Start of the reconciliation window.
///
/// A missing or unreadable checkpoint falls back to `now - lookback`, with
/// `now` being the pass start time. A lookback that is not positive or that
/// reaches before the representable range is a configuration error.
pub fn effective_threshold(
    stored: &StoredCheckpoint,
    now: DateTime<Utc>,
    lookback: Duration,
) -> AppResult<DateTime<Utc>> {
    if let Some(at) = stored.checkpoint().and_then(|c| c.as_datetime()) {
        return Ok(at);
    }
    if let StoredCheckpoint::Found(value) = stored {
        tracing::warn!(value = %value, "Stored checkpoint is not a millisecond timestamp, using default window");
    }
    if lookback <= Duration::zero() {
        return Err(AppError::Config(format!(
            "lookback must be positive, got {}",
            lookback
        )));
    }
    now.checked_sub_signed(lookback).ok_or_else(|| {
        AppError::Config(format!("lookback {} reaches before the supported time range", lookback))
    })
}

#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Read the checkpoint. A missing name is `Absent`, never an error.
    async fn read(&self, name: &str) -> AppResult<StoredCheckpoint>;

    /// Update when `previous` is `Found`, create when it is `Absent`.
    async fn write(&self, name: &str, value: &str, previous: &StoredCheckpoint) -> AppResult<()>;
}

/// Checkpoint kept in a GitHub Actions repository variable.
pub struct VariableCheckpointStore {
    client: GitHubClient,
}

impl VariableCheckpointStore {
    pub fn new(client: GitHubClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CheckpointStore for VariableCheckpointStore {
    async fn read(&self, name: &str) -> AppResult<StoredCheckpoint> {
        Ok(match self.client.get_variable(name).await? {
            Some(variable) => StoredCheckpoint::Found(variable.value),
            None => StoredCheckpoint::Absent,
        })
    }

    async fn write(&self, name: &str, value: &str, previous: &StoredCheckpoint) -> AppResult<()> {
        match previous {
            StoredCheckpoint::Found(_) => self.client.update_variable(name, value).await,
            StoredCheckpoint::Absent => self.client.create_variable(name, value).await,
        }
    }
}

/// Checkpoint kept in Redis under `checkpoint:{name}`.
///
/// Create is `SET NX`, update is `SET XX`; a refused conditional set is an
/// error, matching the variables API.
pub struct RedisCheckpointStore {
    redis: ConnectionManager,
}

impl RedisCheckpointStore {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }

    pub fn key(name: &str) -> String {
        format!("checkpoint:{}", name)
    }
}

#[async_trait]
impl CheckpointStore for RedisCheckpointStore {
    async fn read(&self, name: &str) -> AppResult<StoredCheckpoint> {
        let mut redis = self.redis.clone();
        let value: Option<String> = redis.get(Self::key(name)).await?;
        Ok(match value {
            Some(value) => StoredCheckpoint::Found(value),
            None => StoredCheckpoint::Absent,
        })
    }

    async fn write(&self, name: &str, value: &str, previous: &StoredCheckpoint) -> AppResult<()> {
        let mut redis = self.redis.clone();
        let key = Self::key(name);
        let condition = match previous {
            StoredCheckpoint::Found(_) => "XX",
            StoredCheckpoint::Absent => "NX",
        };

        // Returns Some("OK") when the value was written, None when the
        // condition refused it
        let result: Option<String> = redis::cmd("SET")
            .arg(&key)
            .arg(value)
            .arg(condition)
            .query_async(&mut redis)
            .await?;

        match (result, previous) {
            (Some(_), _) => Ok(()),
            (None, StoredCheckpoint::Absent) => Err(AppError::Checkpoint(format!(
                "cannot create {}: it already exists",
                key
            ))),
            (None, StoredCheckpoint::Found(_)) => Err(AppError::Checkpoint(format!(
                "cannot update {}: it does not exist",
                key
            ))),
        }
    }
}

/// Checkpoint backend selected at startup.
pub enum CheckpointBackend {
    Variables(VariableCheckpointStore),
    Redis(RedisCheckpointStore),
}

#[async_trait]
impl CheckpointStore for CheckpointBackend {
    async fn read(&self, name: &str) -> AppResult<StoredCheckpoint> {
        match self {
            CheckpointBackend::Variables(store) => store.read(name).await,
            CheckpointBackend::Redis(store) => store.read(name).await,
        }
    }

    async fn write(&self, name: &str, value: &str, previous: &StoredCheckpoint) -> AppResult<()> {
        match self {
            CheckpointBackend::Variables(store) => store.write(name, value, previous).await,
            CheckpointBackend::Redis(store) => store.write(name, value, previous).await,
        }
    }
}
