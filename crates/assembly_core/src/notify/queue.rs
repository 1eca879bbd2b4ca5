//! Bounded FIFO notification buffer with evict-oldest overflow.

use crate::notify::{PublishError, PublishedNotification, ResultPublisher};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;

/// In-memory buffer drained by external viewers.
///
/// Inserts never fail for lack of room: when full, the oldest entry is
/// evicted first.
#[derive(Debug)]
pub struct NotificationQueue {
    capacity: usize,
    entries: Mutex<VecDeque<PublishedNotification>>,
}

impl Default for NotificationQueue {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}

impl NotificationQueue {
    /// Creates a buffer holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Copy of current contents, oldest first.
    pub fn snapshot(&self) -> Vec<PublishedNotification> {
        self.guard().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.guard().len()
    }

    pub fn is_empty(&self) -> bool {
        self.guard().is_empty()
    }

    pub fn clear(&self) {
        self.guard().clear();
    }

    // Viewers keep working after a panicked writer; contents stay consistent
    // because every mutation is a single push/pop.
    fn guard(&self) -> MutexGuard<'_, VecDeque<PublishedNotification>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ResultPublisher for NotificationQueue {
    fn publish(&self, notification: PublishedNotification) -> Result<(), PublishError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| PublishError::Unavailable("notification queue lock poisoned".into()))?;
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(notification);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::NotificationQueue;
    use crate::model::session::SessionStatus;
    use crate::model::tally::tally_votes;
    use crate::notify::{PublishedNotification, ResultPublisher};
    use uuid::Uuid;

    fn notification(published_at: i64) -> PublishedNotification {
        PublishedNotification {
            result: tally_votes(Uuid::new_v4(), SessionStatus::Closed, &[]),
            published_at,
        }
    }

    #[test]
    fn full_queue_evicts_oldest_and_keeps_order() {
        let queue = NotificationQueue::new(3);
        for at in 1..=5 {
            queue.publish(notification(at)).expect("publish never rejects");
        }
        let stamps: Vec<i64> = queue.snapshot().iter().map(|n| n.published_at).collect();
        assert_eq!(stamps, vec![3, 4, 5]);
        assert_eq!(queue.len(), 3);
    }

    #[test]
    fn snapshot_is_a_copy_and_clear_empties() {
        let queue = NotificationQueue::default();
        assert_eq!(queue.capacity(), 1000);
        queue.publish(notification(1)).expect("publish");
        let snapshot = queue.snapshot();
        queue.clear();
        assert_eq!(snapshot.len(), 1);
        assert!(queue.is_empty());
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let queue = NotificationQueue::new(0);
        queue.publish(notification(1)).expect("publish");
        queue.publish(notification(2)).expect("publish");
        assert_eq!(queue.capacity(), 1);
        assert_eq!(queue.snapshot()[0].published_at, 2);
    }

    #[test]
    fn buffered_notification_serializes_for_viewers() {
        let queue = NotificationQueue::new(2);
        queue.publish(notification(42)).expect("publish");

        let json = serde_json::to_value(queue.snapshot()).expect("snapshot serializes");

        assert_eq!(json[0]["published_at"], 42);
        assert_eq!(json[0]["result"]["session_status"], "closed");
        assert_eq!(json[0]["result"]["outcome"], "rejected");
    }
}
