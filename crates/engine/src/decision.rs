//! Redelivery decision rule.
//!
//! A notification with any successful attempt is resolved. Otherwise its
//! newest attempt is redelivered, so the payload sent again is the latest one
//! GitHub holds for that notification.

use crate::grouper::NotificationGroup;

/// Outcome for one notification group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Some attempt already succeeded.
    Skip { guid: String },
    /// No attempt succeeded; redeliver `delivery_id` (the newest attempt).
    Redeliver { guid: String, delivery_id: u64 },
}

impl Decision {
    pub fn guid(&self) -> &str {
        match self {
            Decision::Skip { guid } | Decision::Redeliver { guid, .. } => guid,
        }
    }
}

pub fn decide(group: &NotificationGroup) -> Decision {
    if group.has_success() {
        Decision::Skip {
            guid: group.guid.clone(),
        }
    } else {
        Decision::Redeliver {
            guid: group.guid.clone(),
            delivery_id: group.newest().id,
        }
    }
}

/// One decision per group. A resolved group does not affect the others.
pub fn decide_all(groups: &[NotificationGroup]) -> Vec<Decision> {
    groups.iter().map(decide).collect()
}
