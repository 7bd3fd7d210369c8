//! The ledger engine: an explicit owned store wiring the registries, the
//! access gate, the payout book and the notification log together.
//!
//! Every mutation runs all of its checks before the first write, so a
//! rejected call leaves accounts, withdrawals, the owner index and the log
//! exactly as they were.

use crate::accounts::AccountRegistry;
use crate::clock::{Clock, SystemClock};
use crate::notify::{Cursor, NotificationLog};
use crate::withdrawals::WithdrawalRegistry;
use coffer_core::{
    Account, AccountId, Amount, LedgerError, LedgerPolicy, LedgerResult, Notification, Principal,
    Withdrawal, WithdrawalId,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

pub struct Ledger {
    policy: LedgerPolicy,
    clock: Arc<dyn Clock>,
    accounts: AccountRegistry,
    withdrawals: WithdrawalRegistry,
    /// Funds released to requesters by executed withdrawals.
    payouts: HashMap<Principal, Amount>,
    log: NotificationLog,
}

impl Ledger {
    pub fn new(policy: LedgerPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            policy,
            clock,
            accounts: AccountRegistry::new(),
            withdrawals: WithdrawalRegistry::new(),
            payouts: HashMap::new(),
            log: NotificationLog::new(),
        }
    }

    /// Ledger stamped by the wall clock.
    pub fn with_policy(policy: LedgerPolicy) -> Self {
        Self::new(policy, Arc::new(SystemClock))
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    pub fn create_account(
        &mut self,
        creator: Principal,
        other_owners: &[Principal],
    ) -> LedgerResult<AccountId> {
        let id = self
            .accounts
            .create(creator, other_owners, &self.policy)
            .inspect_err(|e| rejected("create_account", &creator, e))?;
        let owners = self.accounts.owners(id)?.to_vec();

        tracing::info!(account_id = id, creator = %creator, owners = owners.len(), "account created");
        self.log.append(Notification::AccountCreated {
            owners,
            id,
            timestamp: self.clock.now(),
        });
        Ok(id)
    }

    /// `amount` is the value attached to the call.
    pub fn deposit(
        &mut self,
        caller: Principal,
        account_id: AccountId,
        amount: Amount,
    ) -> LedgerResult<()> {
        let balance = self
            .accounts
            .deposit(&caller, account_id, amount)
            .inspect_err(|e| rejected("deposit", &caller, e))?;

        tracing::info!(account_id, user = %caller, %amount, %balance, "deposit");
        self.log.append(Notification::Deposit {
            user: caller,
            account_id,
            value: amount,
            timestamp: self.clock.now(),
        });
        Ok(())
    }

    pub fn request_withdrawal(
        &mut self,
        requester: Principal,
        account_id: AccountId,
        amount: Amount,
    ) -> LedgerResult<WithdrawalId> {
        let now = self.clock.now();
        let withdraw_id = self
            .withdrawals
            .request(&self.accounts, requester, account_id, amount, now)
            .inspect_err(|e| rejected("request_withdrawal", &requester, e))?;

        tracing::info!(account_id, withdraw_id, user = %requester, %amount, "withdrawal requested");
        self.log.append(Notification::WithdrawRequested {
            user: requester,
            account_id,
            withdraw_id,
            amount,
            timestamp: now,
        });
        Ok(withdraw_id)
    }

    pub fn approve_withdrawal(
        &mut self,
        approver: Principal,
        account_id: AccountId,
        withdrawal_id: WithdrawalId,
    ) -> LedgerResult<()> {
        let approvals = self
            .withdrawals
            .approve(&self.accounts, approver, account_id, withdrawal_id)
            .inspect_err(|e| rejected("approve_withdrawal", &approver, e))?;

        tracing::info!(account_id, withdrawal_id, approver = %approver, approvals, "withdrawal approved");
        Ok(())
    }

    /// Execute an approved withdrawal and release the funds to its requester.
    pub fn withdraw(
        &mut self,
        caller: Principal,
        account_id: AccountId,
        withdrawal_id: WithdrawalId,
    ) -> LedgerResult<()> {
        let (requester, amount) = self
            .withdrawals
            .execute(
                &mut self.accounts,
                caller,
                account_id,
                withdrawal_id,
                self.policy.execution_trigger,
            )
            .inspect_err(|e| rejected("withdraw", &caller, e))?;

        let released = self.payouts.entry(requester).or_insert(Amount::ZERO);
        *released = released.saturating_add(amount);

        tracing::info!(account_id, withdrawal_id, caller = %caller, to = %requester, %amount, "withdrawal executed");
        self.log.append(Notification::Withdraw {
            withdraw_id: withdrawal_id,
            timestamp: self.clock.now(),
        });
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub fn balance(&self, account_id: AccountId) -> LedgerResult<Amount> {
        self.accounts.balance(account_id)
    }

    pub fn owners(&self, account_id: AccountId) -> LedgerResult<&[Principal]> {
        self.accounts.owners(account_id)
    }

    /// Ids of every account `owner` belongs to, in creation order.
    pub fn accounts_of(&self, owner: &Principal) -> &[AccountId] {
        self.accounts.accounts_of(owner)
    }

    pub fn approvals(
        &self,
        account_id: AccountId,
        withdrawal_id: WithdrawalId,
    ) -> LedgerResult<usize> {
        self.withdrawals
            .approvals(&self.accounts, account_id, withdrawal_id)
    }

    pub fn account(&self, account_id: AccountId) -> LedgerResult<&Account> {
        self.accounts.get(account_id)
    }

    pub fn withdrawal(
        &self,
        account_id: AccountId,
        withdrawal_id: WithdrawalId,
    ) -> LedgerResult<&Withdrawal> {
        self.accounts.get(account_id)?;
        self.withdrawals.get(account_id, withdrawal_id)
    }

    pub fn withdrawals(&self, account_id: AccountId) -> LedgerResult<&[Withdrawal]> {
        self.accounts.get(account_id)?;
        Ok(self.withdrawals.list(account_id))
    }

    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    /// Total released to `principal` by executed withdrawals.
    pub fn released_to(&self, principal: &Principal) -> Amount {
        self.payouts.get(principal).copied().unwrap_or(Amount::ZERO)
    }

    pub fn notifications_since(&self, cursor: Cursor) -> &[Notification] {
        self.log.since(cursor)
    }

    pub fn notification_head(&self) -> Cursor {
        self.log.head()
    }

    pub fn policy(&self) -> &LedgerPolicy {
        &self.policy
    }

    /// Owned copy of the full ledger state.
    pub fn snapshot(&self) -> LedgerSnapshot {
        let mut payouts: Vec<Payout> = self
            .payouts
            .iter()
            .map(|(principal, amount)| Payout {
                principal: *principal,
                amount: *amount,
            })
            .collect();
        payouts.sort_by(|a, b| a.principal.cmp(&b.principal));

        LedgerSnapshot {
            accounts: self.accounts.iter().cloned().collect(),
            withdrawals: self
                .accounts
                .iter()
                .flat_map(|a| self.withdrawals.list(a.id).iter().cloned())
                .collect(),
            payouts,
            notifications: self.log.head(),
        }
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::with_policy(LedgerPolicy::default())
    }
}

fn rejected(op: &'static str, principal: &Principal, err: &LedgerError) {
    tracing::debug!(op, principal = %principal, kind = err.kind(), error = %err, "rejected");
}

/// Serializable point-in-time view of the ledger.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerSnapshot {
    pub accounts: Vec<Account>,
    pub withdrawals: Vec<Withdrawal>,
    pub payouts: Vec<Payout>,
    pub notifications: Cursor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Payout {
    pub principal: Principal,
    pub amount: Amount,
}
