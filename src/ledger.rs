use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::allocation::Allocation;
use crate::prediction::RateSource;
use crate::types::Money;

/// What a cycle started from.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleInputs {
    pub date: NaiveDate,
    pub principal: Money,
    /// Rate as predicted, before any clamping. `record` stores the rate the
    /// allocation applied instead.
    pub rate: f64,
    pub invoice_at_start: Money,
}

/// One processed cycle. Never mutated once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub date: NaiveDate,
    pub start_amount: Money,
    pub end_amount: Money,
    pub return_rate: f64,
    pub return_amount: Money,
    pub applied_to_invoice: Money,
    pub added_to_limit: Money,
    pub invoice_at_start: Money,
    pub rate_source: RateSource,
}

/// Build the ledger entry for a cycle.
///
/// The rate stored is the one the allocation actually applied, so the entry can be
/// replayed without consulting the prediction again.
pub fn record(inputs: &CycleInputs, allocation: &Allocation, rate_source: RateSource) -> HistoryEntry {
    HistoryEntry {
        date: inputs.date,
        start_amount: inputs.principal,
        end_amount: inputs.principal + allocation.extra_credit,
        return_rate: allocation.effective_rate,
        return_amount: allocation.monthly_return,
        applied_to_invoice: allocation.applied_return,
        added_to_limit: allocation.extra_credit,
        invoice_at_start: inputs.invoice_at_start,
        rate_source,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerTotals {
    pub total_returns: Money,
    pub total_applied_to_invoices: Money,
    pub total_added_to_limit: Money,
}

/// Sum the monetary columns over `entries`. Integer cents make this order-independent.
pub fn aggregate(entries: &[HistoryEntry]) -> LedgerTotals {
    entries.iter().fold(LedgerTotals::default(), |mut acc, e| {
        acc.total_returns += e.return_amount;
        acc.total_applied_to_invoices += e.applied_to_invoice;
        acc.total_added_to_limit += e.added_to_limit;
        acc
    })
}

/// Append-only, chronologically stored sequence of cycle entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ledger {
    entries: Vec<HistoryEntry>,
}

impl Ledger {
    pub fn new() -> Self {
        Ledger { entries: Vec::new() }
    }

    pub fn append(&mut self, entry: HistoryEntry) {
        self.entries.push(entry);
    }

    /// Entries in the order they were recorded.
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Display order: newest first. Storage order is untouched.
    pub fn most_recent_first(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter().rev()
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn totals(&self) -> LedgerTotals {
        aggregate(&self.entries)
    }
}
