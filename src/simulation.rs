use chrono::{Datelike, Months, NaiveDate};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use tracing::info;

use crate::account::AccountState;
use crate::config::EngineConfig;
use crate::cycle::{CycleReport, CycleRunner};
use crate::error::CycleError;
use crate::generator::draw_invoice;
use crate::prediction::{Advisor, SimulatedAdvisor};
use crate::store::SnapshotStore;

/// Offset between the advisor's RNG stream and the card-spend stream.
const SPEND_STREAM: u64 = 0x5eed_0001;

/// Month-by-month demo: card spend accrues, then a cycle runs on the 1st.
pub struct Simulation<P> {
    runner: CycleRunner<SimulatedAdvisor, P>,
    pub account: AccountState,
    /// Completed cycles in run order.
    pub reports: Vec<CycleReport>,
    rng: ChaCha20Rng,
    config: EngineConfig,
    next_date: NaiveDate,
}

impl<P: SnapshotStore> Simulation<P> {
    /// Resume the configured account from `store`, or open a fresh demo account
    /// with synthetic history before `start`.
    pub fn from_config(config: EngineConfig, start: NaiveDate, store: P) -> Result<Self, CycleError> {
        config.validate()?;
        let mut rng = ChaCha20Rng::seed_from_u64(config.seed.wrapping_add(SPEND_STREAM));

        let account = match store.load(config.account_id)? {
            Some(account) => {
                info!(account = %account.id, cycles = account.ledger().len(), "resuming account");
                account
            }
            None => AccountState::opening(&config, start, &mut rng)?,
        };

        let advisor = Advisor::new(
            SimulatedAdvisor::from_config(&config),
            config.retry.clone(),
            config.baseline_rate,
        );
        let next_date = start.with_day(1).unwrap_or(start);

        Ok(Simulation {
            runner: CycleRunner::new(advisor, store),
            account,
            reports: Vec::new(),
            rng,
            config,
            next_date,
        })
    }

    /// Run `months` cycles. The first cycle settles whatever is already invoiced;
    /// each later month draws fresh card spend first.
    pub async fn run(&mut self, months: u32) -> Result<(), CycleError> {
        for _ in 0..months {
            if !self.reports.is_empty() {
                let spend = draw_invoice(&self.config.spend, &mut self.rng);
                self.account.charge(spend);
            }
            let report = self.runner.run_cycle(&mut self.account, self.next_date).await?;
            self.reports.push(report);
            self.next_date = self
                .next_date
                .checked_add_months(Months::new(1))
                .unwrap_or(self.next_date);
        }
        Ok(())
    }

    pub fn store(&self) -> &P {
        self.runner.store()
    }

    pub fn fallback_cycles(&self) -> usize {
        self.reports.iter().filter(|r| r.outcome.is_fallback()).count()
    }
}
