//! Ledger analyser for yieldcard output.
//!
//! Reads `history.ndjson` (or the first positional argument), deserializes it with
//! the same `HistoryEntry` type the simulation writes, then prints invariant status
//! and totals.

use std::fs;

use anyhow::{Context, Result, bail};
use yieldcard::{
    analysis::{summarise, verify_ledger},
    ledger::HistoryEntry,
};

fn read_ledger(path: &str) -> Result<Vec<HistoryEntry>> {
    let raw = fs::read_to_string(path).with_context(|| {
        format!("cannot open {path}; run `cargo run --release` first to write the ledger")
    })?;
    raw.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str::<HistoryEntry>(line)
                .with_context(|| format!("line {} is not a ledger entry: {line}", i + 1))
        })
        .collect()
}

fn main() -> Result<()> {
    let path = std::env::args().nth(1).unwrap_or_else(|| "history.ndjson".to_string());
    let entries = read_ledger(&path)?;
    if entries.is_empty() {
        bail!("{path} holds no ledger entries");
    }

    let violations = verify_ledger(&entries);
    println!("=== Ledger invariants ({} entries) ===", entries.len());
    if violations.is_empty() {
        println!("  All invariants: PASS");
    } else {
        println!("  {} violation(s):", violations.len());
        for v in &violations {
            println!("    {v}");
        }
    }

    let Some(summary) = summarise(&entries) else {
        return Ok(());
    };

    println!("\n=== Totals ===");
    println!("  Returns:             {:>12}", summary.totals.total_returns);
    println!("  Applied to invoices: {:>12}", summary.totals.total_applied_to_invoices);
    println!("  Added to limit:      {:>12}", summary.totals.total_added_to_limit);
    println!(
        "\n  Rate mean {:.2}% (min {:.2}%, max {:.2}%)",
        summary.mean_rate * 100.0,
        summary.min_rate * 100.0,
        summary.max_rate * 100.0
    );
    println!(
        "  {} of {} cycles invoiced, {} paid off; {} on fallback rate",
        summary.invoice_cycles, summary.cycles, summary.fully_covered_cycles, summary.fallback_cycles
    );

    println!("\n=== Most recent first ===");
    for e in entries.iter().rev().take(12) {
        println!(
            "  {}  {:>6.2}%  return {:>10}  applied {:>10}  added {:>10}",
            e.date,
            e.return_rate * 100.0,
            e.return_amount,
            e.applied_to_invoice,
            e.added_to_limit
        );
    }
    Ok(())
}
