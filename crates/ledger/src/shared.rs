//! Thread-safe handle to a [`Ledger`].
//!
//! Mutations take the exclusive lock, so every balance and approval check is
//! evaluated against the latest committed state and no two mutations
//! interleave. Reads share the lock and always see a fully applied state.

use crate::ledger::{Ledger, LedgerSnapshot};
use crate::notify::Cursor;
use crate::sink::NotificationSink;
use coffer_core::{
    Account, AccountId, Amount, LedgerResult, Notification, Principal, Withdrawal, WithdrawalId,
};
use std::io;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Clone)]
pub struct SharedLedger {
    inner: Arc<RwLock<Ledger>>,
}

impl SharedLedger {
    pub fn new(ledger: Ledger) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ledger)),
        }
    }

    // A panic while holding the write lock cannot leave a half-applied
    // mutation behind (checks precede writes), so poisoning is ignored.
    fn read_guard(&self) -> RwLockReadGuard<'_, Ledger> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_guard(&self) -> RwLockWriteGuard<'_, Ledger> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` against one consistent view of the ledger.
    pub fn read<R>(&self, f: impl FnOnce(&Ledger) -> R) -> R {
        f(&self.read_guard())
    }

    pub fn create_account(
        &self,
        creator: Principal,
        other_owners: &[Principal],
    ) -> LedgerResult<AccountId> {
        self.write_guard().create_account(creator, other_owners)
    }

    pub fn deposit(
        &self,
        caller: Principal,
        account_id: AccountId,
        amount: Amount,
    ) -> LedgerResult<()> {
        self.write_guard().deposit(caller, account_id, amount)
    }

    pub fn request_withdrawal(
        &self,
        requester: Principal,
        account_id: AccountId,
        amount: Amount,
    ) -> LedgerResult<WithdrawalId> {
        self.write_guard()
            .request_withdrawal(requester, account_id, amount)
    }

    pub fn approve_withdrawal(
        &self,
        approver: Principal,
        account_id: AccountId,
        withdrawal_id: WithdrawalId,
    ) -> LedgerResult<()> {
        self.write_guard()
            .approve_withdrawal(approver, account_id, withdrawal_id)
    }

    pub fn withdraw(
        &self,
        caller: Principal,
        account_id: AccountId,
        withdrawal_id: WithdrawalId,
    ) -> LedgerResult<()> {
        self.write_guard().withdraw(caller, account_id, withdrawal_id)
    }

    pub fn balance(&self, account_id: AccountId) -> LedgerResult<Amount> {
        self.read_guard().balance(account_id)
    }

    pub fn owners(&self, account_id: AccountId) -> LedgerResult<Vec<Principal>> {
        self.read_guard().owners(account_id).map(<[Principal]>::to_vec)
    }

    pub fn accounts_of(&self, owner: &Principal) -> Vec<AccountId> {
        self.read_guard().accounts_of(owner).to_vec()
    }

    pub fn approvals(
        &self,
        account_id: AccountId,
        withdrawal_id: WithdrawalId,
    ) -> LedgerResult<usize> {
        self.read_guard().approvals(account_id, withdrawal_id)
    }

    pub fn account(&self, account_id: AccountId) -> LedgerResult<Account> {
        self.read_guard().account(account_id).cloned()
    }

    pub fn withdrawal(
        &self,
        account_id: AccountId,
        withdrawal_id: WithdrawalId,
    ) -> LedgerResult<Withdrawal> {
        self.read_guard()
            .withdrawal(account_id, withdrawal_id)
            .cloned()
    }

    pub fn released_to(&self, principal: &Principal) -> Amount {
        self.read_guard().released_to(principal)
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        self.read_guard().snapshot()
    }

    /// Copy of every notification at or after `cursor`, plus the cursor to
    /// resume from.
    pub fn poll(&self, cursor: Cursor) -> (Vec<Notification>, Cursor) {
        let guard = self.read_guard();
        (guard.notifications_since(cursor).to_vec(), guard.notification_head())
    }

    /// Forward new notifications to `sink`. The lock is released before the
    /// sink runs.
    pub fn drain_into<S: NotificationSink + ?Sized>(
        &self,
        cursor: Cursor,
        sink: &mut S,
    ) -> io::Result<Cursor> {
        let (pending, head) = self.poll(cursor);
        sink.write_batch(cursor, &pending)?;
        Ok(head)
    }
}

impl Default for SharedLedger {
    fn default() -> Self {
        Self::new(Ledger::default())
    }
}
