//! Withdrawal requests and their approval workflow.
//!
//! `Requested -> (approvals accumulate) -> Executed`. Requests never expire
//! and are kept after execution as audit history.

use crate::access;
use crate::accounts::AccountRegistry;
use coffer_core::{
    AccountId, Amount, ExecutionTrigger, LedgerError, LedgerResult, Principal, PrincipalSet,
    Timestamp, Withdrawal, WithdrawalId,
};
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct WithdrawalRegistry {
    /// Per account, indexed by withdrawal id.
    by_account: HashMap<AccountId, Vec<Withdrawal>>,
}

impl WithdrawalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new pending withdrawal. The balance is checked but not
    /// reserved; execution checks it again.
    pub fn request(
        &mut self,
        accounts: &AccountRegistry,
        requester: Principal,
        account_id: AccountId,
        amount: Amount,
        requested_at: Timestamp,
    ) -> LedgerResult<WithdrawalId> {
        let account = accounts.get(account_id)?;
        access::ensure_owner(account, &requester)?;
        if amount.is_zero() {
            return Err(LedgerError::InvalidAmount(
                "withdrawal must be greater than zero".into(),
            ));
        }
        if amount > account.balance {
            return Err(LedgerError::InvalidAmount(format!(
                "withdrawal of {amount} exceeds balance {}",
                account.balance
            )));
        }

        let list = self.by_account.entry(account_id).or_default();
        let withdrawal_id = list.len() as WithdrawalId;
        list.push(Withdrawal {
            account_id,
            withdrawal_id,
            requester,
            amount,
            approvals: PrincipalSet::new(),
            executed: false,
            requested_at,
        });
        Ok(withdrawal_id)
    }

    /// Add `approver` to the approvals. Returns the new approval count.
    pub fn approve(
        &mut self,
        accounts: &AccountRegistry,
        approver: Principal,
        account_id: AccountId,
        withdrawal_id: WithdrawalId,
    ) -> LedgerResult<usize> {
        let account = accounts.get(account_id)?;
        let withdrawal = self.get(account_id, withdrawal_id)?;
        access::ensure_can_approve(account, withdrawal, &approver)?;

        let withdrawal = self.get_mut(account_id, withdrawal_id)?;
        withdrawal.approvals.push(approver);
        Ok(withdrawal.approval_count())
    }

    /// Execute a pending withdrawal once its quorum is met: debit the
    /// account and mark it executed. Returns `(requester, amount)` so the
    /// caller can release the funds.
    pub fn execute(
        &mut self,
        accounts: &mut AccountRegistry,
        caller: Principal,
        account_id: AccountId,
        withdrawal_id: WithdrawalId,
        trigger: ExecutionTrigger,
    ) -> LedgerResult<(Principal, Amount)> {
        let account = accounts.get(account_id)?;
        let withdrawal = self.get(account_id, withdrawal_id)?;
        access::ensure_can_execute(account, withdrawal, &caller, trigger)?;
        let (requester, amount) = (withdrawal.requester, withdrawal.amount);

        // Debit first: if it fails, nothing has been touched.
        accounts.debit(account_id, amount)?;
        self.get_mut(account_id, withdrawal_id)?.executed = true;
        Ok((requester, amount))
    }

    /// Distinct approvals recorded so far.
    pub fn approvals(
        &self,
        accounts: &AccountRegistry,
        account_id: AccountId,
        withdrawal_id: WithdrawalId,
    ) -> LedgerResult<usize> {
        accounts.get(account_id)?;
        Ok(self.get(account_id, withdrawal_id)?.approval_count())
    }

    pub fn get(
        &self,
        account_id: AccountId,
        withdrawal_id: WithdrawalId,
    ) -> LedgerResult<&Withdrawal> {
        usize::try_from(withdrawal_id)
            .ok()
            .and_then(|i| self.by_account.get(&account_id)?.get(i))
            .ok_or_else(|| LedgerError::withdrawal_not_found(account_id, withdrawal_id))
    }

    fn get_mut(
        &mut self,
        account_id: AccountId,
        withdrawal_id: WithdrawalId,
    ) -> LedgerResult<&mut Withdrawal> {
        usize::try_from(withdrawal_id)
            .ok()
            .and_then(|i| self.by_account.get_mut(&account_id)?.get_mut(i))
            .ok_or_else(|| LedgerError::withdrawal_not_found(account_id, withdrawal_id))
    }

    /// All withdrawals of an account in request order.
    pub fn list(&self, account_id: AccountId) -> &[Withdrawal] {
        self.by_account.get(&account_id).map_or(&[], Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.by_account.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, U256};
    use coffer_core::{LedgerPolicy, Resource};

    fn p(b: u8) -> Principal {
        Address::repeat_byte(b)
    }

    /// Account 0 owned by 1,2,3 holding 100.
    fn funded() -> AccountRegistry {
        let mut accounts = AccountRegistry::new();
        accounts
            .create(p(1), &[p(2), p(3)], &LedgerPolicy::default())
            .unwrap();
        accounts.deposit(&p(1), 0, U256::from(100)).unwrap();
        accounts
    }

    #[test]
    fn request_ids_are_per_account() {
        let mut accounts = funded();
        accounts.create(p(4), &[], &LedgerPolicy::default()).unwrap();
        accounts.deposit(&p(4), 1, U256::from(5)).unwrap();

        let mut reg = WithdrawalRegistry::new();
        assert_eq!(reg.request(&accounts, p(1), 0, U256::from(10), 0).unwrap(), 0);
        assert_eq!(reg.request(&accounts, p(2), 0, U256::from(10), 0).unwrap(), 1);
        assert_eq!(reg.request(&accounts, p(4), 1, U256::from(5), 0).unwrap(), 0);
        assert_eq!(reg.list(0).len(), 2);
        assert_eq!(reg.len(), 3);
    }

    #[test]
    fn request_rejections() {
        let accounts = funded();
        let mut reg = WithdrawalRegistry::new();

        assert!(matches!(
            reg.request(&accounts, p(1), 9, U256::from(1), 0),
            Err(LedgerError::NotFound(Resource::Account(9)))
        ));
        assert!(matches!(
            reg.request(&accounts, p(9), 0, U256::from(1), 0),
            Err(LedgerError::NotOwner { .. })
        ));
        assert!(matches!(
            reg.request(&accounts, p(1), 0, U256::ZERO, 0),
            Err(LedgerError::InvalidAmount(_))
        ));
        assert!(matches!(
            reg.request(&accounts, p(1), 0, U256::from(101), 0),
            Err(LedgerError::InvalidAmount(_))
        ));
        assert!(reg.is_empty());
    }

    #[test]
    fn approvals_accumulate_and_unlock_execution() {
        let mut accounts = funded();
        let mut reg = WithdrawalRegistry::new();
        let id = reg.request(&accounts, p(1), 0, U256::from(60), 0).unwrap();

        assert!(matches!(
            reg.execute(&mut accounts, p(1), 0, id, ExecutionTrigger::AnyOwner),
            Err(LedgerError::QuorumNotMet {
                approvals: 0,
                required: 1
            })
        ));
        assert_eq!(reg.approve(&accounts, p(3), 0, id).unwrap(), 1);
        assert_eq!(reg.approvals(&accounts, 0, id).unwrap(), 1);

        let (to, amount) = reg
            .execute(&mut accounts, p(2), 0, id, ExecutionTrigger::AnyOwner)
            .unwrap();
        assert_eq!((to, amount), (p(1), U256::from(60)));
        assert_eq!(accounts.balance(0).unwrap(), U256::from(40));
        assert!(reg.get(0, id).unwrap().executed);

        assert!(matches!(
            reg.execute(&mut accounts, p(2), 0, id, ExecutionTrigger::AnyOwner),
            Err(LedgerError::AlreadyExecuted { .. })
        ));
        assert!(matches!(
            reg.approve(&accounts, p(2), 0, id),
            Err(LedgerError::AlreadyExecuted { .. })
        ));
        assert_eq!(accounts.balance(0).unwrap(), U256::from(40));
    }

    #[test]
    fn balance_is_rechecked_at_execution() {
        let mut accounts = funded();
        let mut reg = WithdrawalRegistry::new();
        let first = reg.request(&accounts, p(1), 0, U256::from(80), 0).unwrap();
        let second = reg.request(&accounts, p(2), 0, U256::from(80), 0).unwrap();
        reg.approve(&accounts, p(2), 0, first).unwrap();
        reg.approve(&accounts, p(3), 0, second).unwrap();

        reg.execute(&mut accounts, p(1), 0, first, ExecutionTrigger::AnyOwner)
            .unwrap();
        assert!(matches!(
            reg.execute(&mut accounts, p(2), 0, second, ExecutionTrigger::AnyOwner),
            Err(LedgerError::InsufficientBalance { .. })
        ));
        assert!(!reg.get(0, second).unwrap().executed);
        assert_eq!(accounts.balance(0).unwrap(), U256::from(20));
    }

    #[test]
    fn unknown_withdrawal_is_not_found() {
        let accounts = funded();
        let reg = WithdrawalRegistry::new();
        assert!(matches!(
            reg.approvals(&accounts, 0, 0),
            Err(LedgerError::NotFound(Resource::Withdrawal { .. }))
        ));
        assert!(matches!(
            reg.approvals(&accounts, 4, 0),
            Err(LedgerError::NotFound(Resource::Account(4)))
        ));
    }
}
