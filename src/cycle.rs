//! One processing cycle: fetch a prediction, split the return, record it, persist.
//!
//! State is staged on a copy of the account and only committed once the snapshot
//! has been saved, so a failed cycle leaves the caller's account as it was.

use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{info, warn};

use crate::account::AccountState;
use crate::allocation::{Allocation, allocate};
use crate::error::CycleError;
use crate::ledger::{CycleInputs, HistoryEntry, record};
use crate::prediction::{Advisor, PredictionOutcome, PredictionSource};
use crate::store::SnapshotStore;
use crate::types::AccountId;

#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub outcome: PredictionOutcome,
    pub allocation: Allocation,
    pub entry: HistoryEntry,
}

/// An account reachable from several tasks. At most one cycle may hold it at a time.
#[derive(Debug, Clone)]
pub struct SharedAccount {
    id: AccountId,
    state: Arc<Mutex<AccountState>>,
}

impl SharedAccount {
    pub fn new(account: AccountState) -> Self {
        SharedAccount { id: account.id, state: Arc::new(Mutex::new(account)) }
    }

    pub fn id(&self) -> AccountId {
        self.id
    }

    pub async fn snapshot(&self) -> AccountState {
        self.state.lock().await.clone()
    }

    /// Claim the account for a cycle without waiting.
    pub fn try_begin(&self) -> Result<OwnedMutexGuard<AccountState>, CycleError> {
        Arc::clone(&self.state).try_lock_owned().map_err(|_| CycleError::CycleInFlight(self.id))
    }
}

pub struct CycleRunner<S, P> {
    advisor: Advisor<S>,
    store: P,
}

impl<S: PredictionSource, P: SnapshotStore> CycleRunner<S, P> {
    pub fn new(advisor: Advisor<S>, store: P) -> Self {
        CycleRunner { advisor, store }
    }

    pub fn store(&self) -> &P {
        &self.store
    }

    pub fn into_store(self) -> P {
        self.store
    }

    /// Fetch a prediction for display only. Nothing but `last_prediction` changes.
    pub async fn refresh_prediction(
        &mut self,
        account: &mut AccountState,
    ) -> Result<PredictionOutcome, CycleError> {
        let outcome = self.advisor.fetch().await?;
        let mut staged = account.clone();
        staged.last_prediction = Some(outcome.result.clone());
        self.store.save(&staged)?;
        *account = staged;
        Ok(outcome)
    }

    pub async fn run_cycle(
        &mut self,
        account: &mut AccountState,
        date: NaiveDate,
    ) -> Result<CycleReport, CycleError> {
        let outcome = self.advisor.fetch().await?;
        if outcome.is_fallback() {
            warn!(account = %account.id, %date, "cycle running on fallback rate");
        }

        let inputs = CycleInputs {
            date,
            principal: account.limits.investment_principal,
            rate: outcome.result.monthly_rate,
            invoice_at_start: account.invoice.current_invoice,
        };
        let allocation = allocate(inputs.principal, inputs.rate, inputs.invoice_at_start)?;
        let entry = record(&inputs, &allocation, outcome.source.clone());

        let mut staged = account.clone();
        staged.apply(&allocation);
        staged.ledger.append(entry.clone());
        staged.last_prediction = Some(outcome.result.clone());
        self.store.save(&staged)?;
        *account = staged;

        info!(
            account = %account.id,
            %date,
            rate = allocation.effective_rate,
            case = ?allocation.case,
            monthly_return = %allocation.monthly_return,
            applied = %allocation.applied_return,
            extra_credit = %allocation.extra_credit,
            invoice = %allocation.new_invoice_amount,
            "cycle complete"
        );

        Ok(CycleReport { outcome, allocation, entry })
    }

    /// Run a cycle against a shared account, refusing if another cycle holds it.
    pub async fn run_shared(
        &mut self,
        account: &SharedAccount,
        date: NaiveDate,
    ) -> Result<CycleReport, CycleError> {
        let mut guard = account.try_begin()?;
        self.run_cycle(&mut guard, date).await
    }
}
