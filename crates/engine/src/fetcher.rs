//! Incremental retrieval of a webhook's delivery history.

use chrono::{DateTime, Utc};

use redeliver_common::error::AppResult;
use redeliver_common::types::DeliveryAttempt;

use crate::source::HookApi;
use crate::window::{PageCut, cut_page};

/// Fetch every delivery of `hook_id` strictly newer than `threshold`.
///
/// Pages are requested one at a time and the walk ends at the first page that
/// reaches back to the threshold, so the number of requests depends on the
/// size of the window, not on the depth of the history.
pub async fn fetch_since<A>(
    api: &A,
    hook_id: u64,
    threshold: DateTime<Utc>,
) -> AppResult<Vec<DeliveryAttempt>>
where
    A: HookApi + ?Sized,
{
    let mut deliveries = Vec::new();
    let mut cursor: Option<String> = None;
    let mut pages = 0u32;

    loop {
        let page = api.deliveries_page(hook_id, cursor.as_deref()).await?;
        pages += 1;

        let cut = cut_page(&page.items, threshold);
        match cut {
            PageCut::KeepWhole => deliveries.extend(page.items),
            PageCut::KeepPrefix(n) => deliveries.extend(page.items.into_iter().take(n)),
        }

        match page.next {
            Some(next) if cut.continues() => cursor = Some(next),
            _ => break,
        }
    }

    tracing::debug!(
        hook_id,
        pages,
        deliveries = deliveries.len(),
        threshold = %threshold,
        "Fetched deliveries since threshold"
    );

    Ok(deliveries)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::testing::{FakeHookApi, attempt_at};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_714_557_600 + secs, 0).unwrap()
    }

    /// Build `count` deliveries newest first, one second apart, ending at `oldest`.
    fn feed(count: u64, oldest: i64) -> Vec<DeliveryAttempt> {
        (0..count)
            .rev()
            .map(|i| attempt_at(i + 1, &format!("g{}", i), at(oldest + i as i64), "OK"))
            .collect()
    }

    #[tokio::test]
    async fn test_empty_feed_yields_nothing() {
        let api = FakeHookApi::new().with_feed(7, vec![], 100);
        let deliveries = fetch_since(&api, 7, at(0)).await.unwrap();
        assert!(deliveries.is_empty());
        assert_eq!(api.page_requests(7), 1);
    }

    #[tokio::test]
    async fn test_returns_exactly_records_after_threshold() {
        // 250 deliveries at seconds 0..250, three pages of 100/100/50
        let api = FakeHookApi::new().with_feed(7, feed(250, 0), 100);

        for threshold in [-1, 0, 49, 100, 149, 150, 151, 249, 300] {
            let deliveries = fetch_since(&api, 7, at(threshold)).await.unwrap();
            let expected: Vec<u64> = feed(250, 0)
                .into_iter()
                .filter(|d| d.delivered_at > at(threshold))
                .map(|d| d.id)
                .collect();
            let got: Vec<u64> = deliveries.iter().map(|d| d.id).collect();
            assert_eq!(got, expected, "threshold {}", threshold);
        }
    }

    #[tokio::test]
    async fn test_stops_paginating_at_threshold() {
        let api = FakeHookApi::new().with_feed(7, feed(1000, 0), 100);

        // Window covers only the newest 30 deliveries (seconds 970..999)
        let deliveries = fetch_since(&api, 7, at(969)).await.unwrap();
        assert_eq!(deliveries.len(), 30);
        assert_eq!(api.page_requests(7), 1);
    }

    #[tokio::test]
    async fn test_walks_all_pages_when_window_is_wider_than_history() {
        let api = FakeHookApi::new().with_feed(7, feed(230, 0), 100);
        let deliveries = fetch_since(&api, 7, at(0) - Duration::hours(1)).await.unwrap();
        assert_eq!(deliveries.len(), 230);
        assert_eq!(api.page_requests(7), 3);
    }

    #[tokio::test]
    async fn test_page_boundary_exactly_at_threshold() {
        // Oldest record of the first page sits exactly on the threshold
        let api = FakeHookApi::new().with_feed(7, feed(200, 0), 100);
        let deliveries = fetch_since(&api, 7, at(100)).await.unwrap();
        assert_eq!(deliveries.len(), 99);
        assert!(deliveries.iter().all(|d| d.delivered_at > at(100)));
        assert_eq!(api.page_requests(7), 1);
    }

    #[tokio::test]
    async fn test_preserves_newest_first_order() {
        let api = FakeHookApi::new().with_feed(7, feed(5, 0), 2);
        let deliveries = fetch_since(&api, 7, at(-1)).await.unwrap();
        let ids: Vec<u64> = deliveries.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![5, 4, 3, 2, 1]);
    }
}
