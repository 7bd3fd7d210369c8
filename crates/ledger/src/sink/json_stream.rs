//! NDJSON (newline-delimited JSON) stream sink.
//!
//! Each row is serialized directly to the writer without an intermediate
//! `String` allocation.
//!
//! ```ignore
//! let mut sink = JsonStreamSink::stdout();
//! let cursor = ledger.drain_into(0, &mut sink)?;
//! sink.finish()?;
//! ```

use super::{NotificationRow, NotificationSink};
use coffer_core::Notification;
use std::io::{self, BufWriter, Write};

/// Buffered NDJSON writer over any `Write`.
pub struct JsonStreamSink<W: Write> {
    writer: BufWriter<W>,
    rows_written: usize,
}

impl JsonStreamSink<io::Stdout> {
    /// Write NDJSON to stdout.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> JsonStreamSink<W> {
    /// Create a sink wrapping any writer (file, Vec<u8>, etc.).
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::with_capacity(64 * 1024, writer),
            rows_written: 0,
        }
    }

    pub fn write_row(&mut self, row: &NotificationRow<'_>) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, row).map_err(io::Error::other)?;
        self.writer.write_all(b"\n")?;
        self.rows_written += 1;
        Ok(())
    }

    /// Flush and return how many rows were written.
    pub fn finish(mut self) -> io::Result<usize> {
        self.writer.flush()?;
        Ok(self.rows_written)
    }

    /// Number of rows written so far.
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }
}

impl<W: Write> NotificationSink for JsonStreamSink<W> {
    fn write_notification(&mut self, seq: u64, notification: &Notification) -> io::Result<()> {
        self.write_row(&NotificationRow { seq, notification })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, U256};

    #[test]
    fn ndjson_rows() {
        let mut buf = Vec::new();
        let mut sink = JsonStreamSink::new(&mut buf);

        let batch = vec![
            Notification::AccountCreated {
                owners: vec![Address::repeat_byte(1), Address::repeat_byte(2)],
                id: 0,
                timestamp: 1_772_236_800,
            },
            Notification::WithdrawRequested {
                user: Address::repeat_byte(1),
                account_id: 0,
                withdraw_id: 0,
                amount: U256::from(100),
                timestamp: 1_772_236_860,
            },
        ];

        sink.write_batch(0, &batch).unwrap();
        assert_eq!(sink.rows_written(), 2);
        let n = sink.finish().unwrap();
        assert_eq!(n, 2);

        let output = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = output.trim().split('\n').collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["event"], "AccountCreated");
        assert_eq!(first["owners"].as_array().unwrap().len(), 2);

        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["seq"], 1);
        assert_eq!(second["event"], "WithdrawRequested");
    }
}
