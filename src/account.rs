use chrono::NaiveDate;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::allocation::Allocation;
use crate::config::EngineConfig;
use crate::error::ValidationError;
use crate::generator::generate_history;
use crate::ledger::{HistoryEntry, Ledger};
use crate::prediction::PredictionResult;
use crate::types::{AccountId, Money};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceState {
    pub current_invoice: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditLimitState {
    /// Working capital for the managed strategy. Only ever grows here.
    pub investment_principal: Money,
    pub spending_limit: Money,
}

/// Everything a cycle reads and writes for one account. Persisted as a single snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountState {
    pub id: AccountId,
    pub invoice: InvoiceState,
    pub limits: CreditLimitState,
    pub ledger: Ledger,
    pub last_message: Option<String>,
    pub last_prediction: Option<PredictionResult>,
}

impl AccountState {
    pub fn new(id: AccountId, principal: Money, spending_limit: Money, invoice: Money) -> Self {
        AccountState {
            id,
            invoice: InvoiceState { current_invoice: invoice },
            limits: CreditLimitState { investment_principal: principal, spending_limit },
            ledger: Ledger::new(),
            last_message: None,
            last_prediction: None,
        }
    }

    /// Demo account: synthetic history for the months before `today`, then the
    /// configured opening invoice. Principal and spending limit carry the history's growth.
    pub fn opening(
        config: &EngineConfig,
        today: NaiveDate,
        rng: &mut impl Rng,
    ) -> Result<Self, ValidationError> {
        let (ledger, principal) =
            generate_history(today, config.history_months, config.initial_principal, config, rng)?;
        let grown = ledger.totals().total_added_to_limit;

        let mut account = AccountState::new(
            config.account_id,
            principal,
            config.spending_limit + grown,
            config.opening_invoice,
        );
        account.last_message = ledger.latest().map(summarise_entry);
        account.ledger = ledger;
        Ok(account)
    }

    /// Card spend between cycles.
    pub fn charge(&mut self, amount: Money) {
        self.invoice.current_invoice += amount;
    }

    /// Apply a computed split. Extra credit grows the principal and the spending limit alike.
    pub fn apply(&mut self, allocation: &Allocation) {
        self.invoice.current_invoice = allocation.new_invoice_amount;
        self.limits.investment_principal += allocation.extra_credit;
        self.limits.spending_limit += allocation.extra_credit;
        self.last_message = Some(allocation.message.clone());
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn last_message(&self) -> Option<&str> {
        self.last_message.as_deref()
    }
}

fn summarise_entry(entry: &HistoryEntry) -> String {
    format!(
        "Last return: +R$ {} ({:.1}%), R$ {} applied to the invoice.",
        entry.return_amount,
        entry.return_rate * 100.0,
        entry.applied_to_invoice
    )
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    use super::*;
    use crate::allocation::allocate;

    fn account() -> AccountState {
        AccountState::new(
            AccountId(1),
            Money::from_units(10_000),
            Money::from_units(10_000),
            Money(50_996),
        )
    }

    #[test]
    fn apply_pays_invoice_and_grows_both_limits() {
        let mut acct = account();
        let a = allocate(acct.limits.investment_principal, 0.062, acct.invoice.current_invoice)
            .unwrap();
        acct.apply(&a);
        assert_eq!(acct.invoice.current_invoice, Money::ZERO);
        assert_eq!(acct.limits.investment_principal, Money(1_011_004));
        assert_eq!(acct.limits.spending_limit, Money(1_011_004));
        assert_eq!(acct.last_message(), Some(a.message.as_str()));
    }

    #[test]
    fn partial_cover_leaves_limits_alone() {
        let mut acct = account();
        acct.charge(Money::from_units(1_000));
        let a = allocate(acct.limits.investment_principal, 0.03, acct.invoice.current_invoice)
            .unwrap();
        acct.apply(&a);
        assert_eq!(acct.invoice.current_invoice, Money(50_996 + 100_000 - 30_000));
        assert_eq!(acct.limits.investment_principal, Money::from_units(10_000));
    }

    #[test]
    fn charge_accumulates() {
        let mut acct = account();
        acct.charge(Money(4));
        acct.charge(Money(6));
        assert_eq!(acct.invoice.current_invoice, Money(51_006));
    }

    #[test]
    fn opening_account_is_consistent_with_history() {
        let config = EngineConfig::canonical();
        let today = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
        let acct =
            AccountState::opening(&config, today, &mut ChaCha20Rng::seed_from_u64(1)).unwrap();

        assert_eq!(acct.ledger().len(), config.history_months as usize);
        assert_eq!(acct.invoice.current_invoice, config.opening_invoice);
        let latest = acct.ledger().latest().unwrap();
        assert_eq!(acct.limits.investment_principal, latest.end_amount);
        let grown = acct.ledger().totals().total_added_to_limit;
        assert_eq!(acct.limits.spending_limit, config.spending_limit + grown);
        assert!(acct.last_message().unwrap().starts_with("Last return"));
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let config = EngineConfig::canonical();
        let today = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
        let acct =
            AccountState::opening(&config, today, &mut ChaCha20Rng::seed_from_u64(2)).unwrap();
        let json = serde_json::to_string(&acct).unwrap();
        let back: AccountState = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, acct.id);
        assert_eq!(back.invoice, acct.invoice);
        assert_eq!(back.limits, acct.limits);
        assert_eq!(back.ledger.totals(), acct.ledger.totals());
        assert_eq!(back.last_message, acct.last_message);
    }
}
