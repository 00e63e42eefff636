//! Grouping of delivery attempts by logical notification (`guid`).

use std::collections::HashMap;

use redeliver_common::types::DeliveryAttempt;

/// All fetched attempts for one logical notification, in fetch order
/// (newest first). Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationGroup {
    pub guid: String,
    pub attempts: Vec<DeliveryAttempt>,
}

impl NotificationGroup {
    /// Most recent attempt of the notification.
    pub fn newest(&self) -> &DeliveryAttempt {
        &self.attempts[0]
    }

    pub fn has_success(&self) -> bool {
        self.attempts.iter().any(|a| a.status.is_success())
    }
}

/// Partition `attempts` by `guid`.
///
/// Groups come out in order of first appearance and each keeps the relative
/// order of its members; nothing is re-sorted by time.
pub fn group_by_guid(attempts: Vec<DeliveryAttempt>) -> Vec<NotificationGroup> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<NotificationGroup> = Vec::new();

    for attempt in attempts {
        match index.get(&attempt.guid) {
            Some(&i) => groups[i].attempts.push(attempt),
            None => {
                index.insert(attempt.guid.clone(), groups.len());
                groups.push(NotificationGroup {
                    guid: attempt.guid.clone(),
                    attempts: vec![attempt],
                });
            }
        }
    }

    groups
}
