//! Centralized error types for the Coffer workspace.

use crate::types::{AccountId, Amount, Principal, WithdrawalId};
use std::fmt;
use thiserror::Error;

/// The entity a lookup failed to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Account(AccountId),
    Withdrawal {
        account_id: AccountId,
        withdrawal_id: WithdrawalId,
    },
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Account(id) => write!(f, "account {id}"),
            Resource::Withdrawal {
                account_id,
                withdrawal_id,
            } => write!(f, "withdrawal {withdrawal_id} on account {account_id}"),
        }
    }
}

/// Business-rule rejections. None of them are retryable: the caller has to
/// correct the request. A rejected call never leaves partial state behind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum LedgerError {
    #[error("{0} not found")]
    NotFound(Resource),

    #[error("{principal} is not permitted to act on account {account_id}")]
    NotOwner {
        principal: Principal,
        account_id: AccountId,
    },

    #[error("invalid owners: {0}")]
    InvalidOwners(String),

    #[error("{principal} already owns the maximum of {limit} accounts")]
    OwnerAccountLimitExceeded { principal: Principal, limit: usize },

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("requester cannot approve withdrawal {withdrawal_id} on account {account_id}")]
    SelfApproval {
        account_id: AccountId,
        withdrawal_id: WithdrawalId,
    },

    #[error("{principal} already approved withdrawal {withdrawal_id} on account {account_id}")]
    DuplicateApproval {
        principal: Principal,
        account_id: AccountId,
        withdrawal_id: WithdrawalId,
    },

    #[error("withdrawal {withdrawal_id} on account {account_id} was already executed")]
    AlreadyExecuted {
        account_id: AccountId,
        withdrawal_id: WithdrawalId,
    },

    #[error("quorum not met: {approvals} of {required} required approvals")]
    QuorumNotMet { approvals: usize, required: usize },

    #[error("insufficient balance: {balance} available, {requested} requested")]
    InsufficientBalance { balance: Amount, requested: Amount },
}

impl LedgerError {
    pub fn account_not_found(account_id: AccountId) -> Self {
        LedgerError::NotFound(Resource::Account(account_id))
    }

    pub fn withdrawal_not_found(account_id: AccountId, withdrawal_id: WithdrawalId) -> Self {
        LedgerError::NotFound(Resource::Withdrawal {
            account_id,
            withdrawal_id,
        })
    }

    /// Short stable name of the rejection, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerError::NotFound(_) => "not_found",
            LedgerError::NotOwner { .. } => "not_owner",
            LedgerError::InvalidOwners(_) => "invalid_owners",
            LedgerError::OwnerAccountLimitExceeded { .. } => "owner_account_limit_exceeded",
            LedgerError::InvalidAmount(_) => "invalid_amount",
            LedgerError::SelfApproval { .. } => "self_approval",
            LedgerError::DuplicateApproval { .. } => "duplicate_approval",
            LedgerError::AlreadyExecuted { .. } => "already_executed",
            LedgerError::QuorumNotMet { .. } => "quorum_not_met",
            LedgerError::InsufficientBalance { .. } => "insufficient_balance",
        }
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, U256};

    #[test]
    fn not_found_names_the_entity() {
        assert_eq!(
            LedgerError::account_not_found(7).to_string(),
            "account 7 not found"
        );
        assert_eq!(
            LedgerError::withdrawal_not_found(1, 3).to_string(),
            "withdrawal 3 on account 1 not found"
        );
    }

    #[test]
    fn insufficient_balance_message() {
        let err = LedgerError::InsufficientBalance {
            balance: U256::from(5),
            requested: U256::from(9),
        };
        assert_eq!(err.to_string(), "insufficient balance: 5 available, 9 requested");
        assert_eq!(err.kind(), "insufficient_balance");
    }

    #[test]
    fn kinds_are_distinct() {
        let a = LedgerError::NotOwner {
            principal: Address::ZERO,
            account_id: 0,
        };
        let b = LedgerError::QuorumNotMet {
            approvals: 0,
            required: 1,
        };
        assert_ne!(a.kind(), b.kind());
    }
}
