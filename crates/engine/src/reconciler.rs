//! Reconciliation pass.
//!
//! One pass:
//! 1. Read the checkpoint and derive the window start
//! 2. For each webhook: fetch deliveries in the window, group by `guid`,
//!    decide and redeliver
//! 3. Write the pass start time as the new checkpoint
//!
//! The first error ends the pass. The checkpoint is written last, so a failed
//! pass leaves the previous checkpoint in place and the next pass re-examines
//! the same window.

use chrono::{DateTime, Duration, Utc};

use redeliver_common::error::AppResult;
use redeliver_common::types::{Checkpoint, Webhook};

use crate::checkpoint::{CheckpointStore, StoredCheckpoint, effective_threshold};
use crate::decision::decide_all;
use crate::executor::{Execution, Redeliverer};
use crate::fetcher::fetch_since;
use crate::grouper::group_by_guid;
use crate::source::HookApi;

/// Default lookback when no checkpoint exists yet.
pub const DEFAULT_LOOKBACK_HOURS: i64 = 24;

/// Settings for a reconciliation pass.
#[derive(Debug, Clone)]
pub struct ReconcilerOptions {
    /// Name the checkpoint is stored under.
    pub checkpoint_name: String,
    /// Restrict the pass to one webhook; all webhooks when `None`.
    pub webhook_id: Option<u64>,
    pub lookback: Duration,
    pub dry_run: bool,
}

impl ReconcilerOptions {
    pub fn new(checkpoint_name: impl Into<String>) -> Self {
        Self {
            checkpoint_name: checkpoint_name.into(),
            webhook_id: None,
            lookback: Duration::hours(DEFAULT_LOOKBACK_HOURS),
            dry_run: false,
        }
    }
}

/// Counters for one webhook.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WebhookReport {
    pub deliveries: usize,
    pub groups: usize,
    pub redelivered: usize,
    pub skipped: usize,
    pub would_redeliver: usize,
}

/// Summary of a completed pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub webhooks: usize,
    pub totals: WebhookReport,
    pub threshold: DateTime<Utc>,
    /// Checkpoint written at the end of the pass; `None` in dry-run mode.
    pub checkpoint: Option<Checkpoint>,
}

/// Drives reconciliation passes against one repository.
pub struct Reconciler<A, S> {
    api: A,
    store: S,
    options: ReconcilerOptions,
    redeliverer: Redeliverer,
}

impl<A, S> Reconciler<A, S>
where
    A: HookApi,
    S: CheckpointStore,
{
    pub fn new(api: A, store: S, options: ReconcilerOptions) -> Self {
        let redeliverer = Redeliverer::new(options.dry_run);
        Self {
            api,
            store,
            options,
            redeliverer,
        }
    }

    /// Run one pass starting now.
    pub async fn run(&self) -> AppResult<RunReport> {
        self.run_at(Utc::now()).await
    }

    /// Run one pass with `now` as the pass start time.
    pub async fn run_at(&self, now: DateTime<Utc>) -> AppResult<RunReport> {
        let name = &self.options.checkpoint_name;

        let stored = self.store.read(name).await?;
        let threshold = effective_threshold(&stored, now, self.options.lookback)?;

        tracing::debug!(
            checkpoint = name.as_str(),
            stored = ?stored,
            threshold = %threshold,
            "Loaded checkpoint"
        );

        let webhooks = self.webhooks().await?;
        let mut totals = WebhookReport::default();

        for webhook in &webhooks {
            let report = self.reconcile_webhook(webhook.id, threshold).await?;
            totals.deliveries += report.deliveries;
            totals.groups += report.groups;
            totals.redelivered += report.redelivered;
            totals.skipped += report.skipped;
            totals.would_redeliver += report.would_redeliver;
        }

        let checkpoint = if self.options.dry_run {
            tracing::info!(checkpoint = name.as_str(), "Dry run: checkpoint not advanced");
            None
        } else {
            let next = next_checkpoint(&stored, now);
            self.store.write(name, &next.to_value(), &stored).await?;
            tracing::debug!(checkpoint = name.as_str(), value = %next, "Checkpoint written");
            Some(next)
        };

        tracing::info!(
            webhooks = webhooks.len(),
            deliveries = totals.deliveries,
            groups = totals.groups,
            redelivered = totals.redelivered,
            skipped = totals.skipped,
            would_redeliver = totals.would_redeliver,
            threshold = %threshold,
            "Reconciliation pass complete"
        );

        Ok(RunReport {
            webhooks: webhooks.len(),
            totals,
            threshold,
            checkpoint,
        })
    }

    /// Fetch, group, decide and redeliver for one webhook.
    pub async fn reconcile_webhook(
        &self,
        hook_id: u64,
        threshold: DateTime<Utc>,
    ) -> AppResult<WebhookReport> {
        let deliveries = fetch_since(&self.api, hook_id, threshold).await?;
        let mut report = WebhookReport {
            deliveries: deliveries.len(),
            ..WebhookReport::default()
        };

        let groups = group_by_guid(deliveries);
        report.groups = groups.len();

        for decision in decide_all(&groups) {
            match self.redeliverer.execute(&self.api, hook_id, &decision).await? {
                Execution::Skipped => report.skipped += 1,
                Execution::Redelivered => report.redelivered += 1,
                Execution::WouldRedeliver => report.would_redeliver += 1,
            }
        }

        Ok(report)
    }

    async fn webhooks(&self) -> AppResult<Vec<Webhook>> {
        match self.options.webhook_id {
            Some(hook_id) => Ok(vec![self.api.get_webhook(hook_id).await?]),
            None => self.api.list_webhooks().await,
        }
    }
}

/// The pass start time, never earlier than the stored checkpoint.
fn next_checkpoint(stored: &StoredCheckpoint, now: DateTime<Utc>) -> Checkpoint {
    let candidate = Checkpoint::from_datetime(now);
    match stored.checkpoint() {
        Some(previous) if previous > candidate => {
            tracing::warn!(
                previous = %previous,
                now = %candidate,
                "Stored checkpoint is ahead of the clock, keeping it"
            );
            previous
        }
        _ => candidate,
    }
}
