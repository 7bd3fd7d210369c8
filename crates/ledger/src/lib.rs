//! Multi-owner account registry, quorum-gated withdrawal engine,
//! notification log and sinks, and statement reporter.

pub mod access;
pub mod accounts;
pub mod clock;
pub mod ledger;
pub mod notify;
pub mod owners;
pub mod reporter;
pub mod shared;
pub mod sink;
pub mod withdrawals;

pub use clock::{Clock, ManualClock, SystemClock};
pub use ledger::{Ledger, LedgerSnapshot, Payout};
pub use notify::{Cursor, NotificationLog};
pub use shared::SharedLedger;
