//! Notification sinks for external observers (UI feeds, audit logs).
//!
//! A sink receives notifications after they are committed to the log, each
//! tagged with its sequence number so a reader can resume where it stopped.
//!
//! Backend:
//! - **NDJSON stream** — newline-delimited JSON rows to any `Write` impl

pub mod json_stream;

use coffer_core::Notification;
use serde::Serialize;
use std::io;

/// One row per notification: the sequence number plus the flattened event.
///
/// ```text
/// {"seq":1,"event":"Deposit","user":"0x…","account_id":0,"value":"0x64","timestamp":1700000000}
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct NotificationRow<'a> {
    pub seq: u64,
    #[serde(flatten)]
    pub notification: &'a Notification,
}

/// Destination for committed notifications.
pub trait NotificationSink {
    fn write_notification(&mut self, seq: u64, notification: &Notification) -> io::Result<()>;

    /// Write a contiguous batch starting at sequence `first_seq`.
    fn write_batch(&mut self, first_seq: u64, notifications: &[Notification]) -> io::Result<()> {
        for (seq, notification) in (first_seq..).zip(notifications) {
            self.write_notification(seq, notification)?;
        }
        Ok(())
    }
}

/// Buffers notifications in memory. Handy for observers that post-process
/// the feed themselves.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub rows: Vec<(u64, Notification)>,
}

impl NotificationSink for MemorySink {
    fn write_notification(&mut self, seq: u64, notification: &Notification) -> io::Result<()> {
        self.rows.push((seq, notification.clone()));
        Ok(())
    }
}
