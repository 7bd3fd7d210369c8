//! Domain models, policy configuration, and error definitions.
//!
//! Foundation crate -- no I/O and no locking.

pub mod error;
pub mod policy;
pub mod types;

pub use error::{LedgerError, LedgerResult, Resource};
pub use policy::{ExecutionTrigger, LedgerPolicy};
pub use types::{
    Account, AccountId, Amount, Notification, Principal, PrincipalSet, Timestamp, Withdrawal,
    WithdrawalId, WithdrawalStatus, MAX_OWNERS,
};
