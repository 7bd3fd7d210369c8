//! Derived index: principal -> ids of the accounts it co-owns.
//!
//! Never authoritative. Only [`AccountRegistry`](crate::accounts::AccountRegistry)
//! writes to it, in the same step that stores a new account.

use coffer_core::{AccountId, Principal};
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct OwnerIndex {
    by_owner: HashMap<Principal, Vec<AccountId>>,
}

impl OwnerIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn register(&mut self, owner: Principal, account_id: AccountId) {
        self.by_owner.entry(owner).or_default().push(account_id);
    }

    /// Account ids in creation order. Empty for an unknown owner.
    pub fn accounts_of(&self, owner: &Principal) -> &[AccountId] {
        self.by_owner.get(owner).map_or(&[], Vec::as_slice)
    }

    pub fn owned_count(&self, owner: &Principal) -> usize {
        self.accounts_of(owner).len()
    }

    /// Number of distinct principals that own at least one account.
    pub fn len(&self) -> usize {
        self.by_owner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_owner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::Address;

    #[test]
    fn unknown_owner_has_no_accounts() {
        let index = OwnerIndex::new();
        assert!(index.accounts_of(&Address::ZERO).is_empty());
        assert_eq!(index.owned_count(&Address::ZERO), 0);
        assert!(index.is_empty());
    }

    #[test]
    fn preserves_registration_order() {
        let mut index = OwnerIndex::new();
        let owner = Address::repeat_byte(0xaa);
        index.register(owner, 4);
        index.register(owner, 1);
        index.register(Address::repeat_byte(0xbb), 2);
        assert_eq!(index.accounts_of(&owner), &[4, 1]);
        assert_eq!(index.len(), 2);
    }
}
