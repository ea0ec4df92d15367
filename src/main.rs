use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::Parser;

use yieldcard::analysis::{self, DistStats, LedgerSummary};
use yieldcard::config::EngineConfig;
use yieldcard::ledger::{LedgerTotals, aggregate};
use yieldcard::simulation::Simulation;
use yieldcard::store::{JsonFileStore, MemoryStore, SnapshotStore};
use yieldcard::types::AccountId;

#[derive(Parser, Debug)]
#[command(name = "yieldcard", about = "Simulate monthly investment returns applied to a card invoice")]
struct Args {
    /// RNG seed (defaults to YIELDCARD_SEED or 42)
    #[arg(long)]
    seed: Option<u64>,

    /// Monthly cycles to run
    #[arg(long, default_value_t = 12)]
    months: u32,

    /// First cycle month, YYYY-MM-DD (defaults to today)
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Ledger output, one JSON entry per line
    #[arg(long, default_value = "history.ndjson")]
    output: PathBuf,

    /// Persist account snapshots as JSON files in this directory
    #[arg(long)]
    state_dir: Option<PathBuf>,

    #[arg(long)]
    account: Option<u64>,

    /// Run N seeds in parallel and report distributions of the totals
    #[arg(long)]
    runs: Option<u64>,

    /// Override the simulated advisor latency
    #[arg(long)]
    latency_ms: Option<u64>,

    #[arg(long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    yieldcard::init_tracing(if args.quiet { "yieldcard=warn" } else { "yieldcard=info" });

    let mut config = EngineConfig::from_env()?;
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(id) = args.account {
        config.account_id = AccountId(id);
    }
    if let Some(ms) = args.latency_ms {
        config.latency = Duration::from_millis(ms);
    }
    let start = args.start.unwrap_or_else(|| Utc::now().date_naive());

    if let Some(n) = args.runs {
        return run_many(config, start, args.months, n, args.quiet);
    }

    match &args.state_dir {
        Some(dir) => {
            let store = JsonFileStore::new(dir)
                .with_context(|| format!("cannot open state directory {}", dir.display()))?;
            run_single(config, start, store, &args)
        }
        None => run_single(config, start, MemoryStore::new(), &args),
    }
}

fn run_single<P: SnapshotStore>(
    config: EngineConfig,
    start: NaiveDate,
    store: P,
    args: &Args,
) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    let mut sim = Simulation::from_config(config, start, store)?;
    runtime.block_on(sim.run(args.months))?;

    write_ndjson(&args.output, sim.account.ledger().entries())?;

    if !args.quiet {
        let account = &sim.account;
        println!("Cycles run: {} ({} on fallback rate)", sim.reports.len(), sim.fallback_cycles());
        println!("Ledger → {}", args.output.display());
        println!("\n=== Account {} ===", account.id);
        println!("  Investment principal: {:>12}", account.limits.investment_principal);
        println!("  Spending limit:       {:>12}", account.limits.spending_limit);
        println!("  Current invoice:      {:>12}", account.invoice.current_invoice);
        if let Some(msg) = account.last_message() {
            println!("  Last message: {msg}");
        }

        print_cycles(&sim);

        let entries: Vec<_> = sim.reports.iter().map(|r| r.entry.clone()).collect();
        if let Some(summary) = analysis::summarise(&entries) {
            print_summary("This run", &summary);
        }
        if let Some(summary) = analysis::summarise(account.ledger().entries()) {
            print_summary("Whole ledger", &summary);
        }

        let violations = analysis::verify_ledger(account.ledger().entries());
        if violations.is_empty() {
            println!("\nLedger invariants: PASS");
        } else {
            println!("\nLedger invariants: FAIL ({} violation(s))", violations.len());
            for v in &violations {
                println!("    {v}");
            }
        }
    }
    Ok(())
}

fn run_many(config: EngineConfig, start: NaiveDate, months: u32, n: u64, quiet: bool) -> Result<()> {
    use rayon::prelude::*;

    let start_seed = config.seed;
    let all_totals: Vec<LedgerTotals> = (0..n)
        .into_par_iter()
        .map(|i| -> Result<LedgerTotals> {
            let mut config = config.clone();
            config.seed = run_seed(start_seed, i);
            config.latency = Duration::ZERO;

            let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
            let mut sim = Simulation::from_config(config, start, MemoryStore::new())?;
            runtime.block_on(sim.run(months))?;

            let entries: Vec<_> = sim.reports.iter().map(|r| r.entry.clone()).collect();
            Ok(aggregate(&entries))
        })
        .collect::<Result<_>>()?;

    if quiet {
        return Ok(());
    }

    println!("{:>6} | {:>12} | {:>12} | {:>12}", "Seed", "Returns", "Applied", "Added");
    println!("{}", "-".repeat(51));
    for (i, t) in all_totals.iter().enumerate() {
        println!(
            "{:>6} | {:>12} | {:>12} | {:>12}",
            run_seed(start_seed, i as u64),
            t.total_returns,
            t.total_applied_to_invoices,
            t.total_added_to_limit
        );
    }

    match analysis::run_distribution(&all_totals) {
        None => eprintln!("Warning: Distribution requires >= 2 runs"),
        Some(dist) => {
            println!("\n=== Multi-Run Distribution (N={n} runs, {months} months) ===");
            println!(
                "{:>8} | {:>10} | {:>10} | {:>10} | {:>10} | {:>10} | {:>10} | {:>10}",
                "", "min", "p5", "p50", "p95", "max", "mean", "stddev"
            );
            print_dist_row("Returns", &dist.total_returns);
            print_dist_row("Applied", &dist.total_applied);
            print_dist_row("Added", &dist.total_added);
        }
    }
    Ok(())
}

/// Seed of the `run`-th parallel run. Wraps so a seed near `u64::MAX` still works.
fn run_seed(start_seed: u64, run: u64) -> u64 {
    start_seed.wrapping_add(run)
}

fn write_ndjson<T: serde::Serialize>(path: &Path, items: &[T]) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    for item in items {
        serde_json::to_writer(&mut writer, item)?;
        writeln!(writer)?;
    }
    writer.flush()?;
    Ok(())
}

fn print_cycles<P>(sim: &Simulation<P>) {
    println!("\n=== Cycles ===");
    println!(
        "{:>10} | {:>6} | {:>10} | {:>10} | {:>10} | {:>10} | {:>8}",
        "Date", "Rate%", "Invoice", "Return", "Applied", "Added", "Source"
    );
    println!("{}", "-".repeat(84));
    for r in &sim.reports {
        let e = &r.entry;
        println!(
            "{:>10} | {:>6.2} | {:>10} | {:>10} | {:>10} | {:>10} | {:>8}",
            e.date,
            e.return_rate * 100.0,
            e.invoice_at_start,
            e.return_amount,
            e.applied_to_invoice,
            e.added_to_limit,
            if r.outcome.is_fallback() { "fallback" } else { "live" },
        );
    }
}

fn print_summary(title: &str, s: &LedgerSummary) {
    println!("\n=== {title} ({} cycles) ===", s.cycles);
    println!("  Total returns:             {:>12}", s.totals.total_returns);
    println!("  Total applied to invoices: {:>12}", s.totals.total_applied_to_invoices);
    println!("  Total added to limit:      {:>12}", s.totals.total_added_to_limit);
    println!(
        "  Rate: mean {:.2}%  min {:.2}%  max {:.2}%",
        s.mean_rate * 100.0,
        s.min_rate * 100.0,
        s.max_rate * 100.0
    );
    println!(
        "  Invoiced cycles: {} ({} paid off)  Fallback cycles: {}",
        s.invoice_cycles, s.fully_covered_cycles, s.fallback_cycles
    );
}

fn print_dist_row(label: &str, ds: &DistStats) {
    println!(
        "{:>8} | {:>10.2} | {:>10.2} | {:>10.2} | {:>10.2} | {:>10.2} | {:>10.2} | {:>10.2}",
        label, ds.min, ds.p5, ds.p50, ds.p95, ds.max, ds.mean, ds.std_dev
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_seeds_wrap_at_the_top_of_the_range() {
        assert_eq!(run_seed(42, 3), 45);
        assert_eq!(run_seed(u64::MAX, 0), u64::MAX);
        assert_eq!(run_seed(u64::MAX, 2), 1);
    }
}
