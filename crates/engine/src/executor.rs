//! Issues redelivery requests for decided groups.

use redeliver_common::error::AppResult;

use crate::decision::Decision;
use crate::source::HookApi;

/// What the executor did with one decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Execution {
    Skipped,
    Redelivered,
    /// Redelivery was due but suppressed by dry-run mode.
    WouldRedeliver,
}

/// Redelivery executor.
pub struct Redeliverer {
    dry_run: bool,
}

impl Redeliverer {
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    /// Carry out `decision` for `hook_id`. A failed redelivery call is returned
    /// as-is; nothing is retried.
    pub async fn execute<A>(&self, api: &A, hook_id: u64, decision: &Decision) -> AppResult<Execution>
    where
        A: HookApi + ?Sized,
    {
        let guid = decision.guid();
        match decision {
            Decision::Skip { .. } => {
                tracing::debug!(hook_id, guid, "Delivery already succeeded, skipping");
                Ok(Execution::Skipped)
            }
            Decision::Redeliver { delivery_id, .. } if self.dry_run => {
                tracing::info!(
                    hook_id,
                    delivery_id,
                    guid,
                    "Dry run: would redeliver webhook delivery {} for webhook {}",
                    delivery_id,
                    hook_id
                );
                Ok(Execution::WouldRedeliver)
            }
            Decision::Redeliver { delivery_id, .. } => {
                tracing::info!(
                    hook_id,
                    delivery_id,
                    guid,
                    "Redelivering webhook delivery {} for webhook {}",
                    delivery_id,
                    hook_id
                );
                api.redeliver(hook_id, *delivery_id).await?;
                Ok(Execution::Redelivered)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeHookApi;

    fn redeliver(delivery_id: u64) -> Decision {
        Decision::Redeliver {
            guid: "g".to_string(),
            delivery_id,
        }
    }

    #[tokio::test]
    async fn test_skip_issues_no_call() {
        let api = FakeHookApi::new();
        let outcome = Redeliverer::new(false)
            .execute(&api, 7, &Decision::Skip { guid: "g".to_string() })
            .await
            .unwrap();
        assert_eq!(outcome, Execution::Skipped);
        assert!(api.redeliveries().is_empty());
    }

    #[tokio::test]
    async fn test_redeliver_calls_api_once() {
        let api = FakeHookApi::new();
        let outcome = Redeliverer::new(false)
            .execute(&api, 7, &redeliver(42))
            .await
            .unwrap();
        assert_eq!(outcome, Execution::Redelivered);
        assert_eq!(api.redeliveries(), vec![(7, 42)]);
    }

    #[tokio::test]
    async fn test_dry_run_issues_no_call() {
        let api = FakeHookApi::new();
        let outcome = Redeliverer::new(true)
            .execute(&api, 7, &redeliver(42))
            .await
            .unwrap();
        assert_eq!(outcome, Execution::WouldRedeliver);
        assert!(api.redeliveries().is_empty());
    }

    #[tokio::test]
    async fn test_redeliver_failure_propagates() {
        let api = FakeHookApi::new().failing_redelivery(42);
        let result = Redeliverer::new(false).execute(&api, 7, &redeliver(42)).await;
        assert!(result.is_err());
    }
}
