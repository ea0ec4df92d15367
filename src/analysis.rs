use std::fmt;

use chrono::NaiveDate;

use crate::ledger::{HistoryEntry, LedgerTotals, aggregate};
use crate::prediction::RateSource;
use crate::types::Money;

/// Ledger-wide statistics derived from the entry stream.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerSummary {
    pub cycles: usize,
    pub totals: LedgerTotals,
    pub mean_rate: f64,
    pub min_rate: f64,
    pub max_rate: f64,
    /// Cycles that ran on the baseline fallback rate.
    pub fallback_cycles: usize,
    /// Cycles that started with something owed.
    pub invoice_cycles: usize,
    /// Of those, cycles whose return paid the invoice off.
    pub fully_covered_cycles: usize,
}

pub fn summarise(entries: &[HistoryEntry]) -> Option<LedgerSummary> {
    if entries.is_empty() {
        return None;
    }
    let n = entries.len();
    let rates = entries.iter().map(|e| e.return_rate);
    let mean_rate = rates.clone().sum::<f64>() / n as f64;
    let min_rate = rates.clone().fold(f64::INFINITY, f64::min);
    let max_rate = rates.fold(f64::NEG_INFINITY, f64::max);

    let invoiced: Vec<&HistoryEntry> =
        entries.iter().filter(|e| !e.invoice_at_start.is_zero()).collect();
    let fully_covered_cycles =
        invoiced.iter().filter(|e| e.applied_to_invoice == e.invoice_at_start).count();

    Some(LedgerSummary {
        cycles: n,
        totals: aggregate(entries),
        mean_rate,
        min_rate,
        max_rate,
        fallback_cycles: entries
            .iter()
            .filter(|e| matches!(e.rate_source, RateSource::Fallback { .. }))
            .count(),
        invoice_cycles: invoiced.len(),
        fully_covered_cycles,
    })
}

/// A broken invariant in a recorded ledger.
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerViolation {
    /// applied + added != return.
    SplitMismatch { date: NaiveDate, return_amount: Money, split: Money },
    /// More applied than was owed.
    OverApplied { date: NaiveDate, applied: Money, invoice: Money },
    /// end != start + added.
    PrincipalDrift { date: NaiveDate, expected_end: Money, end: Money },
    /// A cycle did not start where the previous one ended.
    BrokenChain { date: NaiveDate, previous_end: Money, start: Money },
    /// Dates went backwards.
    OutOfOrder { date: NaiveDate, previous: NaiveDate },
    NegativeRate { date: NaiveDate, rate: f64 },
}

impl fmt::Display for LedgerViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerViolation::SplitMismatch { date, return_amount, split } => {
                write!(f, "{date}: applied + added = {split}, return = {return_amount}")
            }
            LedgerViolation::OverApplied { date, applied, invoice } => {
                write!(f, "{date}: applied {applied} exceeds invoice {invoice}")
            }
            LedgerViolation::PrincipalDrift { date, expected_end, end } => {
                write!(f, "{date}: end amount {end}, expected {expected_end}")
            }
            LedgerViolation::BrokenChain { date, previous_end, start } => {
                write!(f, "{date}: starts at {start}, previous cycle ended at {previous_end}")
            }
            LedgerViolation::OutOfOrder { date, previous } => {
                write!(f, "{date}: recorded after {previous}")
            }
            LedgerViolation::NegativeRate { date, rate } => {
                write!(f, "{date}: negative rate {rate}")
            }
        }
    }
}

/// Check every per-entry and between-entry invariant of a chronological ledger.
pub fn verify_ledger(entries: &[HistoryEntry]) -> Vec<LedgerViolation> {
    let mut out = Vec::new();

    for e in entries {
        let split = e.applied_to_invoice + e.added_to_limit;
        if split != e.return_amount {
            out.push(LedgerViolation::SplitMismatch {
                date: e.date,
                return_amount: e.return_amount,
                split,
            });
        }
        if e.applied_to_invoice > e.invoice_at_start {
            out.push(LedgerViolation::OverApplied {
                date: e.date,
                applied: e.applied_to_invoice,
                invoice: e.invoice_at_start,
            });
        }
        let expected_end = e.start_amount + e.added_to_limit;
        if e.end_amount != expected_end {
            out.push(LedgerViolation::PrincipalDrift { date: e.date, expected_end, end: e.end_amount });
        }
        if e.return_rate < 0.0 {
            out.push(LedgerViolation::NegativeRate { date: e.date, rate: e.return_rate });
        }
    }

    for pair in entries.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        if next.date < prev.date {
            out.push(LedgerViolation::OutOfOrder { date: next.date, previous: prev.date });
        }
        if next.start_amount != prev.end_amount {
            out.push(LedgerViolation::BrokenChain {
                date: next.date,
                previous_end: prev.end_amount,
                start: next.start_amount,
            });
        }
    }

    out
}

/// Distribution statistics for a continuous metric across N runs.
#[derive(Debug, Clone)]
pub struct DistStats {
    pub n: usize,
    pub min: f64,
    pub p5: f64,
    pub p50: f64,
    pub p95: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

/// Cross-run distribution of ledger totals, in major units.
#[derive(Debug, Clone)]
pub struct RunDist {
    pub total_returns: DistStats,
    pub total_applied: DistStats,
    pub total_added: DistStats,
}

impl DistStats {
    /// Spread of one money column across runs, reported in major units.
    /// Quantiles interpolate linearly between the neighbouring sorted runs.
    fn of_money(mut column: Vec<Money>) -> Option<DistStats> {
        if column.is_empty() {
            return None;
        }
        column.sort_unstable();
        let sorted: Vec<f64> = column.into_iter().map(Money::as_major).collect();
        let n = sorted.len();
        let last = n - 1;

        let quantile = |q: f64| {
            let rank = q * last as f64;
            let below = rank.floor() as usize;
            let above = (below + 1).min(last);
            let w = rank - below as f64;
            sorted[below] + (sorted[above] - sorted[below]) * w
        };

        let mean = sorted.iter().sum::<f64>() / n as f64;
        let sum_sq: f64 = sorted.iter().map(|x| (x - mean) * (x - mean)).sum();
        let std_dev = if n > 1 { (sum_sq / last as f64).sqrt() } else { 0.0 };

        Some(DistStats {
            n,
            min: sorted[0],
            p5: quantile(0.05),
            p50: quantile(0.50),
            p95: quantile(0.95),
            max: sorted[last],
            mean,
            std_dev,
        })
    }
}

/// Distributions of each total across runs. `None` with fewer than two runs.
pub fn run_distribution(runs: &[LedgerTotals]) -> Option<RunDist> {
    if runs.len() < 2 {
        return None;
    }
    let column =
        |pick: fn(&LedgerTotals) -> Money| DistStats::of_money(runs.iter().map(pick).collect());
    Some(RunDist {
        total_returns: column(|t| t.total_returns)?,
        total_applied: column(|t| t.total_applied_to_invoices)?,
        total_added: column(|t| t.total_added_to_limit)?,
    })
}
