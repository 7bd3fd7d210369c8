//! Authoritative store of multi-owner accounts.

use crate::owners::OwnerIndex;
use coffer_core::{
    Account, AccountId, Amount, LedgerError, LedgerPolicy, LedgerResult, Principal, PrincipalSet,
    MAX_OWNERS,
};

/// Accounts keyed by their sequential id, plus the owner index derived from
/// them. Accounts are never removed, so the id is the position in `accounts`.
#[derive(Debug, Clone, Default)]
pub struct AccountRegistry {
    accounts: Vec<Account>,
    index: OwnerIndex,
}

impl AccountRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate owners and the creator's account cap, then store the account
    /// and index it under every owner.
    pub fn create(
        &mut self,
        creator: Principal,
        other_owners: &[Principal],
        policy: &LedgerPolicy,
    ) -> LedgerResult<AccountId> {
        let owners = validate_owners(creator, other_owners)?;

        if self.index.owned_count(&creator) >= policy.max_accounts_per_owner {
            return Err(LedgerError::OwnerAccountLimitExceeded {
                principal: creator,
                limit: policy.max_accounts_per_owner,
            });
        }

        let id = self.accounts.len() as AccountId;
        for owner in &owners {
            self.index.register(*owner, id);
        }
        self.accounts.push(Account {
            id,
            owners,
            balance: Amount::ZERO,
        });
        Ok(id)
    }

    /// Credit `amount` to an account the caller co-owns. Returns the new
    /// balance.
    pub fn deposit(
        &mut self,
        caller: &Principal,
        account_id: AccountId,
        amount: Amount,
    ) -> LedgerResult<Amount> {
        let account = self.get(account_id)?;
        crate::access::ensure_owner(account, caller)?;
        if amount.is_zero() {
            return Err(LedgerError::InvalidAmount(
                "deposit must be greater than zero".into(),
            ));
        }
        let balance = account
            .balance
            .checked_add(amount)
            .ok_or_else(|| LedgerError::InvalidAmount("deposit overflows balance".into()))?;

        self.get_mut(account_id)?.balance = balance;
        Ok(balance)
    }

    /// Debit without authorization checks; callers run the access guards
    /// first. Fails only if the balance does not cover `amount`.
    pub(crate) fn debit(&mut self, account_id: AccountId, amount: Amount) -> LedgerResult<Amount> {
        let account = self.get_mut(account_id)?;
        let balance =
            account
                .balance
                .checked_sub(amount)
                .ok_or(LedgerError::InsufficientBalance {
                    balance: account.balance,
                    requested: amount,
                })?;
        account.balance = balance;
        Ok(balance)
    }

    pub fn get(&self, account_id: AccountId) -> LedgerResult<&Account> {
        usize::try_from(account_id)
            .ok()
            .and_then(|i| self.accounts.get(i))
            .ok_or_else(|| LedgerError::account_not_found(account_id))
    }

    fn get_mut(&mut self, account_id: AccountId) -> LedgerResult<&mut Account> {
        usize::try_from(account_id)
            .ok()
            .and_then(|i| self.accounts.get_mut(i))
            .ok_or_else(|| LedgerError::account_not_found(account_id))
    }

    pub fn balance(&self, account_id: AccountId) -> LedgerResult<Amount> {
        Ok(self.get(account_id)?.balance)
    }

    pub fn owners(&self, account_id: AccountId) -> LedgerResult<&[Principal]> {
        Ok(self.get(account_id)?.owners.as_slice())
    }

    pub fn accounts_of(&self, owner: &Principal) -> &[AccountId] {
        self.index.accounts_of(owner)
    }

    pub fn index(&self) -> &OwnerIndex {
        &self.index
    }

    pub fn iter(&self) -> impl Iterator<Item = &Account> {
        self.accounts.iter()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

/// Creator first, then co-owners in declared order. Rejects self-inclusion,
/// duplicates, and more than [`MAX_OWNERS`] owners.
fn validate_owners(creator: Principal, other_owners: &[Principal]) -> LedgerResult<PrincipalSet> {
    let total = other_owners.len() + 1;
    if total > MAX_OWNERS {
        return Err(LedgerError::InvalidOwners(format!(
            "{total} owners exceeds the limit of {MAX_OWNERS}"
        )));
    }

    let mut owners = PrincipalSet::new();
    owners.push(creator);
    for owner in other_owners {
        if *owner == creator {
            return Err(LedgerError::InvalidOwners(format!(
                "creator {creator} cannot be listed as a co-owner"
            )));
        }
        if owners.contains(owner) {
            return Err(LedgerError::InvalidOwners(format!(
                "duplicate owner {owner}"
            )));
        }
        owners.push(*owner);
    }
    Ok(owners)
}
