//! Append-only notification log.
//!
//! The ledger appends after a mutation commits; observers poll with a
//! cursor. Nothing runs inside the mutation path.

use coffer_core::Notification;

/// Position in the log: the sequence number of the next unread entry.
pub type Cursor = u64;

#[derive(Debug, Clone, Default)]
pub struct NotificationLog {
    entries: Vec<Notification>,
}

impl NotificationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn append(&mut self, notification: Notification) -> Cursor {
        self.entries.push(notification);
        self.entries.len() as Cursor
    }

    /// Entries at or after `cursor`. Empty once the reader is caught up.
    pub fn since(&self, cursor: Cursor) -> &[Notification] {
        let start = usize::try_from(cursor)
            .unwrap_or(usize::MAX)
            .min(self.entries.len());
        &self.entries[start..]
    }

    /// Cursor just past the newest entry.
    pub fn head(&self) -> Cursor {
        self.entries.len() as Cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn withdraw(id: u64) -> Notification {
        Notification::Withdraw {
            withdraw_id: id,
            timestamp: 0,
        }
    }

    #[test]
    fn cursor_polling() {
        let mut log = NotificationLog::new();
        assert!(log.since(0).is_empty());

        log.append(withdraw(0));
        let head = log.append(withdraw(1));
        assert_eq!(head, 2);
        assert_eq!(log.since(0).len(), 2);
        assert_eq!(log.since(1), &[withdraw(1)]);
        assert!(log.since(head).is_empty());
        assert!(log.since(99).is_empty());
    }
}
