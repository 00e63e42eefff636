//! Page boundary rule for the newest-first delivery feed.
//!
//! Each page is ordered newest first and every page is older than the one
//! before it, so the first record at or before the threshold ends the walk.

use chrono::{DateTime, Utc};

use redeliver_common::types::DeliveryAttempt;

/// What to take from one page of the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageCut {
    /// Every record is newer than the threshold; keep them all and continue.
    KeepWhole,
    /// Keep the first `n` records and stop paginating. `0` means nothing on
    /// this page is relevant.
    KeepPrefix(usize),
}

impl PageCut {
    pub fn continues(&self) -> bool {
        matches!(self, PageCut::KeepWhole)
    }
}

/// Decide how much of `page` lies strictly after `threshold`.
pub fn cut_page(page: &[DeliveryAttempt], threshold: DateTime<Utc>) -> PageCut {
    match page.last() {
        None => PageCut::KeepPrefix(0),
        Some(oldest) if oldest.delivered_at > threshold => PageCut::KeepWhole,
        Some(_) => PageCut::KeepPrefix(
            page.iter()
                .take_while(|attempt| attempt.delivered_at > threshold)
                .count(),
        ),
    }
}
