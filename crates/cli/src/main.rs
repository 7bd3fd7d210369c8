//! CLI for the Coffer shared-custody ledger.
//!
//! Pipeline: load script -> replay operations -> drain notifications to sink
//! -> render account statements.

use clap::{Parser, Subcommand};
use coffer_core::{
    AccountId, Amount, ExecutionTrigger, LedgerPolicy, LedgerResult, Principal, WithdrawalId,
};
use coffer_ledger::reporter::Statement;
use coffer_ledger::sink::json_stream::JsonStreamSink;
use coffer_ledger::sink::NotificationSink;
use coffer_ledger::{Clock, Ledger, ManualClock, SystemClock};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "coffer", version, about = "Shared-custody multi-owner ledger")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a JSON operation script against a fresh ledger.
    Run {
        /// JSON array of operations, each tagged with `op` and a `caller`.
        #[arg(short, long)]
        script: std::path::PathBuf,

        /// Accounts a creator may already own before creation is refused.
        #[arg(long, env = "COFFER_MAX_ACCOUNTS_PER_OWNER", default_value_t = coffer_core::policy::DEFAULT_MAX_ACCOUNTS_PER_OWNER)]
        max_accounts_per_owner: usize,

        /// Who may execute an approved withdrawal: any-owner or requester-only.
        #[arg(long, env = "COFFER_EXECUTION_TRIGGER", default_value_t = ExecutionTrigger::AnyOwner)]
        execution_trigger: ExecutionTrigger,

        /// Stamp notifications from this unix time, one second per operation,
        /// instead of the wall clock.
        #[arg(long)]
        start_time: Option<u64>,

        /// Print the final ledger snapshot as JSON instead of statements.
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Sink output: "ndjson" writes notifications as NDJSON to stdout,
        /// "ndjson:/path/to/file" writes to file.
        #[arg(long)]
        sink: Option<String>,
    },
}

/// One scripted call. Amounts are strings, decimal or `0x` hex.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Operation {
    CreateAccount {
        caller: Principal,
        #[serde(default)]
        other_owners: Vec<Principal>,
    },
    Deposit {
        caller: Principal,
        account_id: AccountId,
        amount: Amount,
    },
    RequestWithdrawal {
        caller: Principal,
        account_id: AccountId,
        amount: Amount,
    },
    ApproveWithdrawal {
        caller: Principal,
        account_id: AccountId,
        withdrawal_id: WithdrawalId,
    },
    Withdraw {
        caller: Principal,
        account_id: AccountId,
        withdrawal_id: WithdrawalId,
    },
}

impl Operation {
    fn name(&self) -> &'static str {
        match self {
            Operation::CreateAccount { .. } => "create_account",
            Operation::Deposit { .. } => "deposit",
            Operation::RequestWithdrawal { .. } => "request_withdrawal",
            Operation::ApproveWithdrawal { .. } => "approve_withdrawal",
            Operation::Withdraw { .. } => "withdraw",
        }
    }

    fn apply(&self, ledger: &mut Ledger) -> LedgerResult<()> {
        match self {
            Operation::CreateAccount {
                caller,
                other_owners,
            } => ledger.create_account(*caller, other_owners).map(drop),
            Operation::Deposit {
                caller,
                account_id,
                amount,
            } => ledger.deposit(*caller, *account_id, *amount),
            Operation::RequestWithdrawal {
                caller,
                account_id,
                amount,
            } => ledger
                .request_withdrawal(*caller, *account_id, *amount)
                .map(drop),
            Operation::ApproveWithdrawal {
                caller,
                account_id,
                withdrawal_id,
            } => ledger.approve_withdrawal(*caller, *account_id, *withdrawal_id),
            Operation::Withdraw {
                caller,
                account_id,
                withdrawal_id,
            } => ledger.withdraw(*caller, *account_id, *withdrawal_id),
        }
    }
}

/// Replay every operation. Rejections are logged and skipped; a rejected
/// call never affects the ones after it. Returns `(accepted, rejected)`.
fn replay(ledger: &mut Ledger, ops: &[Operation], clock: Option<&ManualClock>) -> (usize, usize) {
    let mut accepted = 0;
    let mut rejected = 0;
    for (step, op) in ops.iter().enumerate() {
        match op.apply(ledger) {
            Ok(()) => accepted += 1,
            Err(err) => {
                rejected += 1;
                tracing::warn!(step, op = op.name(), kind = err.kind(), error = %err, "operation rejected");
            }
        }
        if let Some(clock) = clock {
            clock.advance(1);
        }
    }
    (accepted, rejected)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            script,
            max_accounts_per_owner,
            execution_trigger,
            start_time,
            json,
            sink,
        } => {
            let t0 = Instant::now();

            // 1. Load script.
            let raw = std::fs::read_to_string(&script)?;
            let ops: Vec<Operation> = serde_json::from_str(&raw)?;
            tracing::info!(script = %script.display(), ops = ops.len(), "loaded script");

            // 2. Build ledger.
            let policy = LedgerPolicy::default()
                .with_max_accounts_per_owner(max_accounts_per_owner)
                .with_execution_trigger(execution_trigger);
            let manual = start_time.map(|ts| Arc::new(ManualClock::new(ts)));
            let clock: Arc<dyn Clock> = match &manual {
                Some(clock) => clock.clone() as Arc<dyn Clock>,
                None => Arc::new(SystemClock),
            };
            let mut ledger = Ledger::new(policy, clock);
            tracing::info!(?policy, "ledger ready");

            // 3. Replay.
            let (accepted, rejected) = replay(&mut ledger, &ops, manual.as_deref());
            tracing::info!(
                accepted,
                rejected,
                accounts = ledger.account_count(),
                elapsed_ms = t0.elapsed().as_millis(),
                "replay complete"
            );

            // 4. Sink output.
            let notifications = ledger.notifications_since(0);
            if let Some(ref sink_spec) = sink {
                if sink_spec == "ndjson" {
                    let mut s = JsonStreamSink::stdout();
                    s.write_batch(0, notifications)?;
                    let n = s.finish()?;
                    tracing::info!(rows = n, "ndjson sink: wrote to stdout");
                } else if let Some(path) = sink_spec.strip_prefix("ndjson:") {
                    let file = std::fs::File::create(path)?;
                    let mut s = JsonStreamSink::new(file);
                    s.write_batch(0, notifications)?;
                    let n = s.finish()?;
                    tracing::info!(rows = n, path, "ndjson sink: wrote to file");
                } else {
                    eprintln!(
                        "Unknown sink: {}. Use 'ndjson' or 'ndjson:/path'",
                        sink_spec
                    );
                }
            }

            // 5. Final state. Keep stdout clean when it carries the NDJSON feed.
            let to_stderr = sink.as_deref() == Some("ndjson");
            let rendered = if json {
                serde_json::to_string_pretty(&ledger.snapshot())? + "\n"
            } else {
                let mut out = String::new();
                for id in 0..ledger.account_count() as AccountId {
                    out.push_str(&Statement::build(&ledger, id)?.render());
                }
                out
            };
            if to_stderr {
                eprint!("{rendered}");
            } else {
                print!("{rendered}");
            }
        }
    }

    Ok(())
}
