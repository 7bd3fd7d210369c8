//! Ledger policy knobs.
//!
//! The per-owner account cap and the execution trigger are configurable.
//! The owner ceiling is not: see [`MAX_OWNERS`](crate::types::MAX_OWNERS).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How many accounts a creator may already own before creation is refused.
pub const DEFAULT_MAX_ACCOUNTS_PER_OWNER: usize = 3;

/// Who may execute a withdrawal once its quorum is met.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutionTrigger {
    /// Any owner of the account.
    #[default]
    AnyOwner,
    /// Only the principal that requested the withdrawal.
    RequesterOnly,
}

impl fmt::Display for ExecutionTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionTrigger::AnyOwner => f.write_str("any-owner"),
            ExecutionTrigger::RequesterOnly => f.write_str("requester-only"),
        }
    }
}

impl FromStr for ExecutionTrigger {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "any-owner" => Ok(ExecutionTrigger::AnyOwner),
            "requester-only" => Ok(ExecutionTrigger::RequesterOnly),
            other => Err(format!(
                "unknown execution trigger `{other}` (expected any-owner or requester-only)"
            )),
        }
    }
}

/// Policy applied by the ledger to every mutating call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerPolicy {
    pub max_accounts_per_owner: usize,
    pub execution_trigger: ExecutionTrigger,
}

impl Default for LedgerPolicy {
    fn default() -> Self {
        Self {
            max_accounts_per_owner: DEFAULT_MAX_ACCOUNTS_PER_OWNER,
            execution_trigger: ExecutionTrigger::AnyOwner,
        }
    }
}

impl LedgerPolicy {
    pub fn with_max_accounts_per_owner(mut self, n: usize) -> Self {
        self.max_accounts_per_owner = n;
        self
    }

    pub fn with_execution_trigger(mut self, trigger: ExecutionTrigger) -> Self {
        self.execution_trigger = trigger;
        self
    }
}
