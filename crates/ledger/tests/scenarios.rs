//! End-to-end ledger scenarios.

use alloy_primitives::{Address, U256};
use coffer_core::{ExecutionTrigger, LedgerError, LedgerPolicy, Notification, Principal};
use coffer_ledger::{Ledger, ManualClock, SharedLedger};
use rayon::prelude::*;
use std::sync::Arc;

fn p(b: u8) -> Principal {
    Address::repeat_byte(b)
}

fn ledger() -> Ledger {
    Ledger::new(LedgerPolicy::default(), Arc::new(ManualClock::new(1_700_000_000)))
}

#[test]
fn two_owner_withdrawal_round_trip() {
    let (a, b) = (p(0xa), p(0xb));
    let mut ledger = ledger();

    let id = ledger.create_account(a, &[b]).unwrap();
    assert_eq!(id, 0);
    ledger.deposit(a, id, U256::from(100)).unwrap();

    let wid = ledger.request_withdrawal(a, id, U256::from(100)).unwrap();
    assert_eq!(wid, 0);
    ledger.approve_withdrawal(b, id, wid).unwrap();
    assert_eq!(ledger.approvals(0, 0).unwrap(), 1);

    ledger.withdraw(b, 0, 0).unwrap();
    assert_eq!(ledger.balance(0).unwrap(), U256::ZERO);
    assert_eq!(ledger.released_to(&a), U256::from(100));
    assert_eq!(ledger.released_to(&b), U256::ZERO);

    assert!(matches!(
        ledger.withdraw(a, 0, 0),
        Err(LedgerError::AlreadyExecuted { .. })
    ));
    assert_eq!(ledger.balance(0).unwrap(), U256::ZERO);
    assert_eq!(ledger.released_to(&a), U256::from(100));

    let events: Vec<&str> = ledger
        .notifications_since(0)
        .iter()
        .map(Notification::name)
        .collect();
    assert_eq!(
        events,
        vec!["AccountCreated", "Deposit", "WithdrawRequested", "Withdraw"]
    );
}

#[test]
fn fourth_account_hits_the_owner_cap() {
    let mut ledger = ledger();
    for expected in 0..3 {
        assert_eq!(ledger.create_account(p(1), &[]).unwrap(), expected);
    }
    assert!(matches!(
        ledger.create_account(p(1), &[]),
        Err(LedgerError::OwnerAccountLimitExceeded { limit: 3, .. })
    ));
    assert_eq!(ledger.account_count(), 3);
}

#[test]
fn five_owners_are_rejected() {
    let mut ledger = ledger();
    assert!(matches!(
        ledger.create_account(p(1), &[p(2), p(3), p(4), p(5)]),
        Err(LedgerError::InvalidOwners(_))
    ));
    assert_eq!(ledger.account_count(), 0);
    assert!(ledger.notifications_since(0).is_empty());
}

#[test]
fn accounts_of_lists_ids_in_creation_order() {
    let mut ledger = ledger();
    let shared = p(9);
    let mut expected = Vec::new();
    for creator in 1..=4u8 {
        ledger.create_account(p(creator), &[]).unwrap();
        expected.push(ledger.create_account(p(creator), &[shared]).unwrap());
    }
    assert_eq!(ledger.accounts_of(&shared), expected.as_slice());
    assert!(ledger.accounts_of(&p(0x42)).is_empty());
}

#[test]
fn co_owner_appears_in_owner_order() {
    let mut ledger = ledger();
    let id = ledger.create_account(p(3), &[p(1), p(2)]).unwrap();
    assert_eq!(ledger.owners(id).unwrap(), &[p(3), p(1), p(2)]);
}

#[test]
fn deposits_are_exact_and_owner_only() {
    let mut ledger = ledger();
    let id = ledger.create_account(p(1), &[p(2)]).unwrap();
    let mut expected = U256::ZERO;
    for (who, amount) in [(1u8, 5u64), (2, 11), (1, 1)] {
        ledger.deposit(p(who), id, U256::from(amount)).unwrap();
        expected += U256::from(amount);
        assert_eq!(ledger.balance(id).unwrap(), expected);
    }
    assert!(matches!(
        ledger.deposit(p(3), id, U256::from(1)),
        Err(LedgerError::NotOwner { .. })
    ));
    assert!(matches!(
        ledger.deposit(p(1), id, U256::ZERO),
        Err(LedgerError::InvalidAmount(_))
    ));
    assert_eq!(ledger.balance(id).unwrap(), expected);
}

#[test]
fn quorum_threshold_by_owner_count() {
    for owner_count in 1..=4u8 {
        let mut ledger = ledger();
        let others: Vec<Principal> = (2..=owner_count).map(p).collect();
        let id = ledger.create_account(p(1), &others).unwrap();
        ledger.deposit(p(1), id, U256::from(10)).unwrap();
        let wid = ledger.request_withdrawal(p(1), id, U256::from(10)).unwrap();

        let required = usize::from(owner_count) / 2;
        for (given, approver) in others.iter().enumerate() {
            if given >= required {
                break;
            }
            assert!(matches!(
                ledger.withdraw(p(1), id, wid),
                Err(LedgerError::QuorumNotMet { .. })
            ));
            ledger.approve_withdrawal(*approver, id, wid).unwrap();
        }
        ledger.withdraw(p(1), id, wid).unwrap();
        assert_eq!(ledger.balance(id).unwrap(), U256::ZERO, "owners = {owner_count}");
    }
}

#[test]
fn self_and_duplicate_approvals_always_fail() {
    let mut ledger = ledger();
    let id = ledger.create_account(p(1), &[p(2), p(3), p(4)]).unwrap();
    ledger.deposit(p(2), id, U256::from(50)).unwrap();
    let wid = ledger.request_withdrawal(p(2), id, U256::from(20)).unwrap();

    assert!(matches!(
        ledger.approve_withdrawal(p(2), id, wid),
        Err(LedgerError::SelfApproval { .. })
    ));
    ledger.approve_withdrawal(p(3), id, wid).unwrap();
    assert!(matches!(
        ledger.approve_withdrawal(p(3), id, wid),
        Err(LedgerError::DuplicateApproval { .. })
    ));
    assert!(matches!(
        ledger.approve_withdrawal(p(2), id, wid),
        Err(LedgerError::SelfApproval { .. })
    ));
    assert!(matches!(
        ledger.approve_withdrawal(p(7), id, wid),
        Err(LedgerError::NotOwner { .. })
    ));
    assert_eq!(ledger.approvals(id, wid).unwrap(), 1);
}

#[test]
fn outsider_cannot_execute_an_approved_withdrawal() {
    let mut ledger = ledger();
    let id = ledger.create_account(p(1), &[p(2)]).unwrap();
    ledger.deposit(p(1), id, U256::from(40)).unwrap();
    let wid = ledger.request_withdrawal(p(1), id, U256::from(25)).unwrap();
    ledger.approve_withdrawal(p(2), id, wid).unwrap();
    let head = ledger.notification_head();

    assert_eq!(
        ledger.withdraw(p(9), id, wid),
        Err(LedgerError::NotOwner {
            principal: p(9),
            account_id: id
        })
    );
    assert_eq!(ledger.balance(id).unwrap(), U256::from(40));
    assert!(!ledger.withdrawal(id, wid).unwrap().executed);
    assert_eq!(ledger.released_to(&p(1)), U256::ZERO);
    assert_eq!(ledger.released_to(&p(9)), U256::ZERO);
    assert_eq!(ledger.notification_head(), head);

    ledger.withdraw(p(2), id, wid).unwrap();
    assert_eq!(ledger.balance(id).unwrap(), U256::from(15));
}

#[test]
fn requester_only_trigger() {
    let policy = LedgerPolicy::default().with_execution_trigger(ExecutionTrigger::RequesterOnly);
    let mut ledger = Ledger::new(policy, Arc::new(ManualClock::new(0)));
    let id = ledger.create_account(p(1), &[p(2)]).unwrap();
    ledger.deposit(p(1), id, U256::from(8)).unwrap();
    let wid = ledger.request_withdrawal(p(1), id, U256::from(8)).unwrap();
    ledger.approve_withdrawal(p(2), id, wid).unwrap();

    assert!(matches!(
        ledger.withdraw(p(2), id, wid),
        Err(LedgerError::NotOwner { .. })
    ));
    ledger.withdraw(p(1), id, wid).unwrap();
    assert_eq!(ledger.released_to(&p(1)), U256::from(8));
}

#[test]
fn executed_withdrawals_stay_in_history() {
    let mut ledger = ledger();
    let id = ledger.create_account(p(1), &[]).unwrap();
    ledger.deposit(p(1), id, U256::from(3)).unwrap();
    for _ in 0..3 {
        let wid = ledger.request_withdrawal(p(1), id, U256::from(1)).unwrap();
        ledger.withdraw(p(1), id, wid).unwrap();
    }
    let history = ledger.withdrawals(id).unwrap();
    assert_eq!(history.len(), 3);
    assert!(history.iter().all(|w| w.executed));
    assert!(matches!(
        ledger.request_withdrawal(p(1), id, U256::from(1)),
        Err(LedgerError::InvalidAmount(_))
    ));
}

#[test]
fn concurrent_deposits_are_never_lost() {
    let ledger = SharedLedger::new(ledger());
    let owners: Vec<Principal> = (1..=4).map(p).collect();
    let id = ledger.create_account(owners[0], &owners[1..]).unwrap();

    (0..1_000u64).into_par_iter().for_each(|i| {
        let who = owners[(i % 4) as usize];
        ledger.deposit(who, id, U256::from(1)).unwrap();
    });

    assert_eq!(ledger.balance(id).unwrap(), U256::from(1_000));
    assert_eq!(ledger.poll(0).0.len(), 1_001);
}

#[test]
fn concurrent_executions_run_once() {
    let ledger = SharedLedger::new(ledger());
    let id = ledger.create_account(p(1), &[p(2), p(3)]).unwrap();
    ledger.deposit(p(1), id, U256::from(100)).unwrap();
    let wid = ledger.request_withdrawal(p(1), id, U256::from(100)).unwrap();
    ledger.approve_withdrawal(p(3), id, wid).unwrap();

    let successes = (0..64u8)
        .into_par_iter()
        .filter(|i| ledger.withdraw(p(1 + i % 3), id, wid).is_ok())
        .count();

    assert_eq!(successes, 1);
    assert_eq!(ledger.balance(id).unwrap(), U256::ZERO);
    assert_eq!(ledger.released_to(&p(1)), U256::from(100));
    assert!(ledger.withdrawal(id, wid).unwrap().executed);
}
