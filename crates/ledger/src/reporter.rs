//! Account statement generator.
//!
//! Takes one account out of a [`Ledger`] and produces a human-readable
//! statement: owners, balance, quorum, and the withdrawal history.

use crate::access::required_approvals;
use crate::ledger::Ledger;
use coffer_core::{Account, AccountId, Amount, LedgerResult, Withdrawal, WithdrawalStatus};

/// Snapshot of one account and its withdrawals.
#[derive(Debug, Clone)]
pub struct Statement {
    pub account: Account,
    pub withdrawals: Vec<Withdrawal>,
    pub required_approvals: usize,
}

impl Statement {
    pub fn build(ledger: &Ledger, account_id: AccountId) -> LedgerResult<Self> {
        let account = ledger.account(account_id)?.clone();
        let withdrawals = ledger.withdrawals(account_id)?.to_vec();
        Ok(Self {
            required_approvals: required_approvals(account.owner_count()),
            account,
            withdrawals,
        })
    }

    pub fn pending(&self) -> impl Iterator<Item = &Withdrawal> {
        self.withdrawals.iter().filter(|w| !w.executed)
    }

    /// Sum of all executed withdrawals.
    pub fn withdrawn_total(&self) -> Amount {
        self.withdrawals
            .iter()
            .filter(|w| w.executed)
            .fold(Amount::ZERO, |acc, w| acc.saturating_add(w.amount))
    }

    /// Render the statement as a formatted string.
    pub fn render(&self) -> String {
        let mut out = String::new();

        out.push('\n');
        out.push_str("╔══════════════════════════════════════════════════════════════╗\n");
        row(&mut out, format!("  ACCOUNT STATEMENT #{}", self.account.id));
        out.push_str("╠══════════════════════════════════════════════════════════════╣\n");
        row(&mut out, format!("  Balance:            {:>39}", self.account.balance));
        row(&mut out, format!("  Withdrawn:          {:>39}", self.withdrawn_total()));
        row(
            &mut out,
            format!(
                "  Quorum:             {:>39}",
                format!(
                    "{} of {} co-owners",
                    self.required_approvals,
                    self.account.owner_count().saturating_sub(1)
                )
            ),
        );
        row(&mut out, format!("  Pending requests:   {:>39}", self.pending().count()));
        out.push_str("╠══════════════════════════════════════════════════════════════╣\n");
        row(&mut out, "  OWNERS".into());
        for owner in &self.account.owners {
            row(&mut out, format!("    {owner}"));
        }
        out.push_str("╠══════════════════════════════════════════════════════════════╣\n");

        if self.withdrawals.is_empty() {
            row(&mut out, "  No withdrawal requests.".into());
        } else {
            row(&mut out, "  WITHDRAWALS".into());
            for w in &self.withdrawals {
                let status = match w.status() {
                    WithdrawalStatus::Requested => "PENDING",
                    WithdrawalStatus::Executed => "EXECUTED",
                };
                row(
                    &mut out,
                    format!("  {}. [{}] {}", w.withdrawal_id, status, w.amount),
                );
                row(&mut out, format!("     Requested by {}", w.requester));
                row(
                    &mut out,
                    format!(
                        "     Approvals: {}/{}",
                        w.approval_count(),
                        self.required_approvals
                    ),
                );
            }
        }

        out.push_str("╚══════════════════════════════════════════════════════════════╝\n");
        out
    }
}

/// Inner width of the statement box.
const BOX_WIDTH: usize = 62;

/// One bordered row, padded to the box width. Longer text widens the row.
fn row(out: &mut String, text: String) {
    out.push_str(&format!("║{text:<width$}║\n", width = BOX_WIDTH));
}
