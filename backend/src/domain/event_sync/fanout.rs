//! Notification fan-out for newly catalogued events.

use std::collections::BTreeSet;
use std::sync::Arc;

use mockable::Clock;

use crate::domain::{CampusMember, EventId, NotificationRecord};

/// Builds one unread notification per recipient.
pub struct NotificationFanout {
    clock: Arc<dyn Clock>,
}

impl NotificationFanout {
    /// Build a fan-out stamping notifications with `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Build the notification batch announcing `event_id` to `recipients`.
    ///
    /// Recipients are de-duplicated by user ID, keeping first-seen order, so
    /// the batch never holds two records for one `(user, event)` pair. Every
    /// record shares one creation instant.
    pub fn notifications_for(
        &self,
        event_id: EventId,
        recipients: &[CampusMember],
    ) -> Vec<NotificationRecord> {
        let created_at = self.clock.utc();
        let mut seen = BTreeSet::new();
        recipients
            .iter()
            .filter(|member| seen.insert(member.id))
            .map(|member| NotificationRecord {
                user_id: member.id,
                event_id,
                read: false,
                created_at,
                deleted_at: None,
            })
            .collect()
    }
}
