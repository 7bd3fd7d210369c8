//! Domain types for the Coffer shared-custody ledger.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Authenticated identity supplied by the hosting environment.
pub type Principal = Address;

/// Smallest indivisible currency unit.
pub type Amount = U256;

/// Sequential account id, assigned from 0.
pub type AccountId = u64;

/// Sequential per-account withdrawal id, assigned from 0.
pub type WithdrawalId = u64;

/// Unix seconds.
pub type Timestamp = u64;

/// Upper bound on owners per account, creator included. Fixed for every
/// ledger.
pub const MAX_OWNERS: usize = 4;

/// Owners and approvers never exceed [`MAX_OWNERS`] entries, so both stay
/// inline.
pub type PrincipalSet = SmallVec<[Principal; MAX_OWNERS]>;

// ---------------------------------------------------------------------------
// Account
// ---------------------------------------------------------------------------

/// A multi-owner account.
///
/// `owners` keeps the creator first, followed by the co-owners in the order
/// they were declared. It never changes after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub owners: PrincipalSet,
    pub balance: Amount,
}

impl Account {
    pub fn has_owner(&self, principal: &Principal) -> bool {
        self.owners.contains(principal)
    }

    pub fn owner_count(&self) -> usize {
        self.owners.len()
    }
}

// ---------------------------------------------------------------------------
// Withdrawal
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WithdrawalStatus {
    Requested,
    Executed,
}

/// A request to release funds from an account.
///
/// Kept after execution as audit history. `approvals` never contains the
/// requester.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdrawal {
    pub account_id: AccountId,
    pub withdrawal_id: WithdrawalId,
    pub requester: Principal,
    pub amount: Amount,
    pub approvals: PrincipalSet,
    pub executed: bool,
    pub requested_at: Timestamp,
}

impl Withdrawal {
    pub fn approval_count(&self) -> usize {
        self.approvals.len()
    }

    pub fn status(&self) -> WithdrawalStatus {
        if self.executed {
            WithdrawalStatus::Executed
        } else {
            WithdrawalStatus::Requested
        }
    }
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

/// Fire-and-forget notifications for external observers (UI, audit log).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum Notification {
    AccountCreated {
        owners: Vec<Principal>,
        id: AccountId,
        timestamp: Timestamp,
    },
    Deposit {
        user: Principal,
        account_id: AccountId,
        value: Amount,
        timestamp: Timestamp,
    },
    WithdrawRequested {
        user: Principal,
        account_id: AccountId,
        withdraw_id: WithdrawalId,
        amount: Amount,
        timestamp: Timestamp,
    },
    Withdraw {
        withdraw_id: WithdrawalId,
        timestamp: Timestamp,
    },
}

impl Notification {
    pub fn name(&self) -> &'static str {
        match self {
            Notification::AccountCreated { .. } => "AccountCreated",
            Notification::Deposit { .. } => "Deposit",
            Notification::WithdrawRequested { .. } => "WithdrawRequested",
            Notification::Withdraw { .. } => "Withdraw",
        }
    }

    pub fn timestamp(&self) -> Timestamp {
        match self {
            Notification::AccountCreated { timestamp, .. }
            | Notification::Deposit { timestamp, .. }
            | Notification::WithdrawRequested { timestamp, .. }
            | Notification::Withdraw { timestamp, .. } => *timestamp,
        }
    }
}
