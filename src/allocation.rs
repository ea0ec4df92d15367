use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ValidationError;
use crate::types::Money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AllocationCase {
    /// Nothing owed: the whole return becomes extra credit.
    NoInvoice,
    /// The return pays the invoice off; the surplus becomes extra credit.
    FullyCovered,
    /// The return only reduces the invoice.
    PartiallyCovered,
}

/// How one period's return is split between the invoice and the credit limit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub case: AllocationCase,
    pub monthly_return: Money,
    pub new_invoice_amount: Money,
    pub applied_return: Money,
    pub extra_credit: Money,
    /// Rate actually applied; differs from the input only when a negative rate was clamped.
    pub effective_rate: f64,
    pub rate_clamped: bool,
    pub message: String,
}

/// Split `principal × monthly_rate` between paying `current_invoice` and growing the limit.
///
/// A negative rate is treated as a zero return: this subsystem never shrinks the
/// principal, and a loss has nothing to apply to the invoice.
pub fn allocate(
    principal: Money,
    monthly_rate: f64,
    current_invoice: Money,
) -> Result<Allocation, ValidationError> {
    if !monthly_rate.is_finite() {
        return Err(ValidationError::NonFiniteRate(monthly_rate));
    }

    let rate_clamped = monthly_rate < 0.0;
    let effective_rate = if rate_clamped {
        warn!(rate = monthly_rate, "negative monthly rate clamped to zero");
        0.0
    } else {
        monthly_rate
    };

    let monthly_return = principal.scale(effective_rate);

    let (case, applied_return, extra_credit, new_invoice_amount) = if current_invoice.is_zero() {
        (AllocationCase::NoInvoice, Money::ZERO, monthly_return, Money::ZERO)
    } else if monthly_return >= current_invoice {
        (
            AllocationCase::FullyCovered,
            current_invoice,
            monthly_return.saturating_sub(current_invoice),
            Money::ZERO,
        )
    } else {
        (
            AllocationCase::PartiallyCovered,
            monthly_return,
            Money::ZERO,
            current_invoice.saturating_sub(monthly_return),
        )
    };

    let message = match case {
        AllocationCase::NoInvoice => format!(
            "No card spending this month. The return of R$ {monthly_return} was converted into \
             R$ {extra_credit} of additional credit limit."
        ),
        AllocationCase::FullyCovered | AllocationCase::PartiallyCovered => format!(
            "Return of R$ {monthly_return} was applied automatically to this month's invoice \
             (R$ {current_invoice}). New amount due: R$ {new_invoice_amount}."
        ),
    };

    Ok(Allocation {
        case,
        monthly_return,
        new_invoice_amount,
        applied_return,
        extra_credit,
        effective_rate,
        rate_clamped,
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRINCIPAL: Money = Money::from_units(10_000);

    #[test]
    fn invoice_paid_off_with_surplus() {
        let a = allocate(PRINCIPAL, 0.062, Money(50_996)).unwrap();
        assert_eq!(a.case, AllocationCase::FullyCovered);
        assert_eq!(a.monthly_return, Money(62_000));
        assert_eq!(a.applied_return, Money(50_996));
        assert_eq!(a.extra_credit, Money(11_004));
        assert_eq!(a.new_invoice_amount, Money::ZERO);
    }

    #[test]
    fn no_invoice_converts_everything_to_credit() {
        let a = allocate(PRINCIPAL, 0.062, Money::ZERO).unwrap();
        assert_eq!(a.case, AllocationCase::NoInvoice);
        assert_eq!(a.extra_credit, Money(62_000));
        assert_eq!(a.applied_return, Money::ZERO);
        assert_eq!(a.new_invoice_amount, Money::ZERO);
        assert!(a.message.contains("R$ 620.00 of additional credit limit"), "{}", a.message);
    }

    #[test]
    fn partial_cover_reduces_invoice() {
        let a = allocate(PRINCIPAL, 0.03, Money::from_units(800)).unwrap();
        assert_eq!(a.case, AllocationCase::PartiallyCovered);
        assert_eq!(a.monthly_return, Money::from_units(300));
        assert_eq!(a.applied_return, Money::from_units(300));
        assert_eq!(a.extra_credit, Money::ZERO);
        assert_eq!(a.new_invoice_amount, Money::from_units(500));
    }

    #[test]
    fn exact_cover_leaves_no_surplus() {
        let a = allocate(PRINCIPAL, 0.062, Money(62_000)).unwrap();
        assert_eq!(a.case, AllocationCase::FullyCovered);
        assert_eq!(a.extra_credit, Money::ZERO);
        assert_eq!(a.new_invoice_amount, Money::ZERO);
    }

    #[test]
    fn message_reports_return_prior_and_new_invoice() {
        let a = allocate(PRINCIPAL, 0.03, Money::from_units(800)).unwrap();
        assert_eq!(
            a.message,
            "Return of R$ 300.00 was applied automatically to this month's invoice \
             (R$ 800.00). New amount due: R$ 500.00."
        );
    }

    #[test]
    fn non_finite_rate_rejected() {
        assert_eq!(
            allocate(PRINCIPAL, f64::INFINITY, Money::ZERO),
            Err(ValidationError::NonFiniteRate(f64::INFINITY))
        );
        assert!(allocate(PRINCIPAL, f64::NAN, Money::ZERO).is_err());
    }

    #[test]
    fn negative_rate_clamped_to_zero_return() {
        let a = allocate(PRINCIPAL, -0.02, Money::from_units(400)).unwrap();
        assert!(a.rate_clamped);
        assert_eq!(a.effective_rate, 0.0);
        assert_eq!(a.monthly_return, Money::ZERO);
        assert_eq!(a.applied_return, Money::ZERO);
        assert_eq!(a.extra_credit, Money::ZERO);
        assert_eq!(a.new_invoice_amount, Money::from_units(400));
    }

    #[test]
    fn zero_principal_leaves_invoice_untouched() {
        let a = allocate(Money::ZERO, 0.062, Money::from_units(100)).unwrap();
        assert_eq!(a.case, AllocationCase::PartiallyCovered);
        assert_eq!(a.new_invoice_amount, Money::from_units(100));
    }
}
