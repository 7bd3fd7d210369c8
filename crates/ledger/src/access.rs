//! Authorization policy shared by every mutating operation.
//!
//! Stateless: each predicate looks only at the records it is handed. The
//! `ensure_*` guards turn a failed predicate into the matching
//! [`LedgerError`] so the registries reject calls identically.

use coffer_core::{Account, ExecutionTrigger, LedgerError, LedgerResult, Principal, Withdrawal};

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

pub fn is_owner(account: &Account, principal: &Principal) -> bool {
    account.has_owner(principal)
}

pub fn is_requester(withdrawal: &Withdrawal, principal: &Principal) -> bool {
    withdrawal.requester == *principal
}

pub fn has_approved(withdrawal: &Withdrawal, principal: &Principal) -> bool {
    withdrawal.approvals.contains(principal)
}

/// Majority of co-owners excluding the requester: `floor(n / 2)`.
///
/// A single-owner account needs no approvals.
#[inline]
pub fn required_approvals(owner_count: usize) -> usize {
    owner_count / 2
}

pub fn quorum_met(withdrawal: &Withdrawal, account: &Account) -> bool {
    withdrawal.approval_count() >= required_approvals(account.owner_count())
}

// ---------------------------------------------------------------------------
// Guards
// ---------------------------------------------------------------------------

pub fn ensure_owner(account: &Account, principal: &Principal) -> LedgerResult<()> {
    if is_owner(account, principal) {
        Ok(())
    } else {
        Err(LedgerError::NotOwner {
            principal: *principal,
            account_id: account.id,
        })
    }
}

fn ensure_pending(withdrawal: &Withdrawal) -> LedgerResult<()> {
    if withdrawal.executed {
        return Err(LedgerError::AlreadyExecuted {
            account_id: withdrawal.account_id,
            withdrawal_id: withdrawal.withdrawal_id,
        });
    }
    Ok(())
}

/// Owner, still pending, not the requester, not approved before.
pub fn ensure_can_approve(
    account: &Account,
    withdrawal: &Withdrawal,
    approver: &Principal,
) -> LedgerResult<()> {
    ensure_owner(account, approver)?;
    ensure_pending(withdrawal)?;
    if is_requester(withdrawal, approver) {
        return Err(LedgerError::SelfApproval {
            account_id: withdrawal.account_id,
            withdrawal_id: withdrawal.withdrawal_id,
        });
    }
    if has_approved(withdrawal, approver) {
        return Err(LedgerError::DuplicateApproval {
            principal: *approver,
            account_id: withdrawal.account_id,
            withdrawal_id: withdrawal.withdrawal_id,
        });
    }
    Ok(())
}

/// Owner (or the requester under [`ExecutionTrigger::RequesterOnly`]),
/// still pending, quorum met, balance still covers the amount.
pub fn ensure_can_execute(
    account: &Account,
    withdrawal: &Withdrawal,
    caller: &Principal,
    trigger: ExecutionTrigger,
) -> LedgerResult<()> {
    ensure_owner(account, caller)?;
    if trigger == ExecutionTrigger::RequesterOnly && !is_requester(withdrawal, caller) {
        return Err(LedgerError::NotOwner {
            principal: *caller,
            account_id: account.id,
        });
    }
    ensure_pending(withdrawal)?;
    if !quorum_met(withdrawal, account) {
        return Err(LedgerError::QuorumNotMet {
            approvals: withdrawal.approval_count(),
            required: required_approvals(account.owner_count()),
        });
    }
    if account.balance < withdrawal.amount {
        return Err(LedgerError::InsufficientBalance {
            balance: account.balance,
            requested: withdrawal.amount,
        });
    }
    Ok(())
}
