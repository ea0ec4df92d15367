//! Synthetic demo data: the projected return curve shown next to the card, and a
//! few months of past cycles so a fresh account does not start with an empty ledger.

use chrono::{Datelike, Months, NaiveDate};
use rand::Rng;
use rand_distr::{Distribution, Uniform};
use serde::{Deserialize, Serialize};

use crate::allocation::allocate;
use crate::config::{EngineConfig, SpendConfig};
use crate::error::ValidationError;
use crate::ledger::{CycleInputs, Ledger, record};
use crate::prediction::RateSource;
use crate::types::{Money, Period};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub period: Period,
    /// Expected value with per-period noise applied.
    pub actual: Money,
    /// Exact compound growth.
    pub expected: Money,
}

/// Compound-growth curve over `periods` with independent uniform noise per period.
///
/// `expected_i = initial × (1 + rate)^i`, `actual_i = expected_i × (1 + U[-variance, variance])`,
/// both rounded to the cent here so consumers never re-round.
pub fn generate_series(
    initial: Money,
    monthly_rate: f64,
    periods: u32,
    variance: f64,
    rng: &mut impl Rng,
) -> Result<Vec<SeriesPoint>, ValidationError> {
    if !monthly_rate.is_finite() {
        return Err(ValidationError::NonFiniteRate(monthly_rate));
    }
    if !variance.is_finite() || variance < 0.0 {
        return Err(ValidationError::InvalidVariance(variance));
    }
    let noise = Uniform::new_inclusive(-variance, variance)
        .map_err(|_| ValidationError::InvalidVariance(variance))?;

    let points = (1..=periods)
        .map(|i| {
            let growth = (1.0 + monthly_rate).powi(i as i32);
            let v = noise.sample(&mut *rng);
            SeriesPoint {
                period: Period(i),
                actual: initial.scale(growth * (1.0 + v)),
                expected: initial.scale(growth),
            }
        })
        .collect();
    Ok(points)
}

/// One month of card spend: nothing with probability `1 - invoice_probability`,
/// otherwise a whole-unit amount drawn uniformly from the configured bounds.
///
/// Bounds must satisfy `min_units <= max_units`; `EngineConfig::validate` checks this.
pub fn draw_invoice(spend: &SpendConfig, rng: &mut impl Rng) -> Money {
    if !rng.random_bool(spend.invoice_probability.clamp(0.0, 1.0)) {
        return Money::ZERO;
    }
    Money::from_units(rng.random_range(spend.min_units..=spend.max_units))
}

/// Past cycles for the `months` months before `anchor`'s month, oldest first.
///
/// Each month draws a rate around the baseline and an invoice, runs the normal
/// allocation, and compounds the principal. Returns the ledger and the principal
/// it ends on.
pub fn generate_history(
    anchor: NaiveDate,
    months: u32,
    principal: Money,
    config: &EngineConfig,
    rng: &mut impl Rng,
) -> Result<(Ledger, Money), ValidationError> {
    let v = config.rate_variance;
    if !v.is_finite() || v < 0.0 {
        return Err(ValidationError::InvalidVariance(v));
    }
    let spend = &config.spend;
    if spend.min_units > spend.max_units {
        return Err(ValidationError::InvertedSpendBounds {
            min: spend.min_units,
            max: spend.max_units,
        });
    }

    let first_of_month = anchor.with_day(1).unwrap_or(anchor);
    let mut ledger = Ledger::new();
    let mut principal = principal;

    for back in (1..=months).rev() {
        let date = first_of_month.checked_sub_months(Months::new(back)).unwrap_or(NaiveDate::MIN);
        let rate = config.baseline_rate + rng.random_range(-v..=v);
        let invoice = draw_invoice(spend, rng);

        let allocation = allocate(principal, rate, invoice)?;
        let inputs = CycleInputs { date, principal, rate, invoice_at_start: invoice };
        let entry = record(&inputs, &allocation, RateSource::Live);
        principal = entry.end_amount;
        ledger.append(entry);
    }

    Ok((ledger, principal))
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    use super::*;

    fn rng(seed: u64) -> ChaCha20Rng {
        ChaCha20Rng::seed_from_u64(seed)
    }

    #[test]
    fn expected_curve_is_exact_compound_growth() {
        let series =
            generate_series(Money::from_units(10_000), 0.062, 12, 0.01, &mut rng(3)).unwrap();
        assert_eq!(series.len(), 12);
        let want = (1_000_000.0 * 1.062_f64.powi(12)).round() as u64;
        assert_eq!(series[11].expected, Money(want));
        assert_eq!(series[0].expected, Money(1_062_000));
        assert_eq!(series[0].period, Period(1));
    }

    #[test]
    fn expected_curve_ignores_seed() {
        let a = generate_series(Money::from_units(10_000), 0.062, 12, 0.01, &mut rng(1)).unwrap();
        let b = generate_series(Money::from_units(10_000), 0.062, 12, 0.01, &mut rng(2)).unwrap();
        let ea: Vec<Money> = a.iter().map(|p| p.expected).collect();
        let eb: Vec<Money> = b.iter().map(|p| p.expected).collect();
        assert_eq!(ea, eb);
    }

    #[test]
    fn actual_stays_within_one_percent() {
        let series =
            generate_series(Money::from_units(10_000), 0.062, 24, 0.01, &mut rng(11)).unwrap();
        for p in &series {
            let ratio = p.actual.cents() as f64 / p.expected.cents() as f64;
            assert!((0.99 - 1e-5..=1.01 + 1e-5).contains(&ratio), "period {:?}: {ratio}", p.period);
        }
    }

    #[test]
    fn zero_variance_actual_equals_expected() {
        let series = generate_series(Money::from_units(500), 0.05, 6, 0.0, &mut rng(0)).unwrap();
        assert!(series.iter().all(|p| p.actual == p.expected));
    }

    #[test]
    fn bad_inputs_rejected() {
        let mut r = rng(0);
        assert!(generate_series(Money(1), f64::NAN, 3, 0.01, &mut r).is_err());
        assert_eq!(
            generate_series(Money(1), 0.05, 3, -0.1, &mut r),
            Err(ValidationError::InvalidVariance(-0.1))
        );
    }

    #[test]
    fn zero_periods_is_empty() {
        assert!(generate_series(Money(1), 0.05, 0, 0.01, &mut rng(0)).unwrap().is_empty());
    }

    #[test]
    fn invoice_draws_respect_bounds() {
        let spend = SpendConfig { invoice_probability: 0.7, min_units: 200, max_units: 1_000 };
        let mut r = rng(5);
        let mut zeros = 0;
        for _ in 0..1_000 {
            let inv = draw_invoice(&spend, &mut r);
            if inv.is_zero() {
                zeros += 1;
            } else {
                assert!(inv >= Money::from_units(200) && inv <= Money::from_units(1_000));
                assert_eq!(inv.cents() % 100, 0);
            }
        }
        assert!((200..=400).contains(&zeros), "zero-invoice months: {zeros}");
    }

    #[test]
    fn history_is_chronological_and_compounds() {
        let config = EngineConfig::canonical();
        let anchor = NaiveDate::from_ymd_opt(2025, 3, 17).unwrap();
        let (ledger, end) =
            generate_history(anchor, 6, config.initial_principal, &config, &mut rng(42)).unwrap();

        assert_eq!(ledger.len(), 6);
        let dates: Vec<NaiveDate> = ledger.entries().iter().map(|e| e.date).collect();
        assert_eq!(dates[0], NaiveDate::from_ymd_opt(2024, 9, 1).unwrap());
        assert_eq!(dates[5], NaiveDate::from_ymd_opt(2025, 2, 1).unwrap());

        for pair in ledger.entries().windows(2) {
            assert_eq!(pair[1].start_amount, pair[0].end_amount);
        }
        assert_eq!(ledger.latest().map(|e| e.end_amount), Some(end));
        for e in ledger.entries() {
            assert_eq!(e.applied_to_invoice + e.added_to_limit, e.return_amount);
            assert!(e.applied_to_invoice <= e.invoice_at_start);
        }
    }

    #[test]
    fn history_rejects_negative_variance() {
        let mut config = EngineConfig::canonical();
        config.rate_variance = -0.01;
        let anchor = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        assert_eq!(
            generate_history(anchor, 6, config.initial_principal, &config, &mut rng(1)),
            Err(ValidationError::InvalidVariance(-0.01))
        );
    }

    #[test]
    fn history_rejects_inverted_spend_bounds() {
        let mut config = EngineConfig::canonical();
        config.spend.min_units = 2_000;
        let anchor = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let err = generate_history(anchor, 6, config.initial_principal, &config, &mut rng(1))
            .unwrap_err();
        assert_eq!(err, ValidationError::InvertedSpendBounds { min: 2_000, max: 1_000 });
    }
}
