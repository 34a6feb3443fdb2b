//! Single-period mortgage: one loan at one rate for one term.
//!
//! The monthly repayment is level and interest is applied before each
//! payment, so `repayment = L * r^n / sum(r^k, k = 0..n-1)` with `r` the
//! monthly growth factor. Fees are either added to the loan or paid up front
//! out of the cash balance.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::MortgageError;
use crate::mortgage::model::{ensure_within_term, MortgageModel, ScheduleRow};
use crate::time_value::{level_repayment, monthly_factor, roll_forward, MONTHS_PER_YEAR};
use crate::types::{Factor, Money, Percent};
use crate::MortgageResult;

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// Terms of a single mortgage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MortgageInput {
    /// Value of the property borrowed against.
    pub house_value: Money,
    /// Amount borrowed, before fees.
    pub loan: Money,
    /// Nominal annual rate in percent (e.g. 1.69).
    #[serde(alias = "rate")]
    pub annual_rate_pct: Percent,
    /// Term in years.
    #[serde(alias = "term")]
    pub term_years: u32,
    /// Arrangement, valuation and other fees.
    #[serde(default)]
    pub fee: Money,
    /// Cashback paid by the lender.
    #[serde(default)]
    pub cashback: Money,
    /// Add the fees to the loan (true) or pay them up front (false).
    #[serde(default = "default_borrow_fee")]
    pub borrow_fee: bool,
}

pub(crate) fn default_borrow_fee() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mortgage {
    house_value: Money,
    initial_loan: Money,
    loan: Money,
    annual_rate_pct: Percent,
    monthly_factor: Factor,
    term_months: u32,
    cash_balance: Money,
    repayment: Money,
}

impl Mortgage {
    pub fn new(input: &MortgageInput) -> MortgageResult<Self> {
        if input.term_years == 0 {
            return Err(MortgageError::invalid("term_years", "Term must be positive"));
        }
        let term_months = input
            .term_years
            .checked_mul(MONTHS_PER_YEAR)
            .ok_or_else(|| MortgageError::invalid("term_years", "Term is too long"))?;

        Self::with_term_months(
            input.house_value,
            input.loan,
            input.annual_rate_pct,
            term_months,
            input.fee,
            input.cashback,
            input.borrow_fee,
        )
    }

    /// Build a mortgage over an explicit number of monthly payments.
    pub fn with_term_months(
        house_value: Money,
        loan: Money,
        annual_rate_pct: Percent,
        term_months: u32,
        fee: Money,
        cashback: Money,
        borrow_fee: bool,
    ) -> MortgageResult<Self> {
        validate(house_value, loan, term_months, fee, cashback)?;

        let monthly_factor = monthly_factor(annual_rate_pct)?;

        let (loan_with_fees, cash_balance) = if borrow_fee {
            (loan + fee, cashback)
        } else {
            (loan, cashback - fee)
        };

        let repayment = level_repayment(loan_with_fees, monthly_factor, term_months)?;

        Ok(Self {
            house_value,
            initial_loan: loan,
            loan: loan_with_fees,
            annual_rate_pct,
            monthly_factor,
            term_months,
            cash_balance,
            repayment,
        })
    }

    pub fn monthly_factor(&self) -> Factor {
        self.monthly_factor
    }
}

fn validate(
    house_value: Money,
    loan: Money,
    term_months: u32,
    fee: Money,
    cashback: Money,
) -> MortgageResult<()> {
    if house_value <= Decimal::ZERO {
        return Err(MortgageError::invalid(
            "house_value",
            "House value must be positive",
        ));
    }
    if loan <= Decimal::ZERO {
        return Err(MortgageError::invalid("loan", "Loan must be positive"));
    }
    if term_months == 0 {
        return Err(MortgageError::invalid(
            "term_months",
            "Term must cover at least one payment",
        ));
    }
    if fee < Decimal::ZERO {
        return Err(MortgageError::invalid("fee", "Fee cannot be negative"));
    }
    if cashback < Decimal::ZERO {
        return Err(MortgageError::invalid(
            "cashback",
            "Cashback cannot be negative",
        ));
    }
    Ok(())
}

impl MortgageModel for Mortgage {
    fn house_value(&self) -> Money {
        self.house_value
    }

    fn initial_loan(&self) -> Money {
        self.initial_loan
    }

    fn loan(&self) -> Money {
        self.loan
    }

    fn annual_rate_pct(&self) -> Percent {
        self.annual_rate_pct
    }

    fn term_months(&self) -> u32 {
        self.term_months
    }

    fn cash_balance(&self) -> Money {
        self.cash_balance
    }

    fn repayment(&self) -> Money {
        self.repayment
    }

    fn remaining_loan(&self, payments: u32) -> MortgageResult<Money> {
        ensure_within_term(payments, self.term_months)?;
        roll_forward(self.loan, self.monthly_factor, self.repayment, payments)
    }

    fn schedule_rows(&self, payments: u32) -> MortgageResult<Vec<ScheduleRow>> {
        ensure_within_term(payments, self.term_months)?;

        let mut rows = Vec::with_capacity(payments as usize);
        let mut balance = self.loan;
        for month in 1..=payments {
            let accrued = balance * self.monthly_factor;
            let interest = accrued - balance;
            let closing = accrued - self.repayment;
            rows.push(ScheduleRow {
                month,
                period: 0,
                opening_balance: balance,
                interest,
                repayment: self.repayment,
                principal: self.repayment - interest,
                closing_balance: closing,
            });
            balance = closing;
        }
        Ok(rows)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time_value::iterative_pow;
    use rust_decimal_macros::dec;

    fn assert_close(actual: Decimal, expected: Decimal, tol: Decimal, msg: &str) {
        let diff = (actual - expected).abs();
        assert!(
            diff <= tol,
            "{}: expected ~{}, got {} (diff = {})",
            msg,
            expected,
            actual,
            diff
        );
    }

    fn two_year_fix() -> MortgageInput {
        MortgageInput {
            house_value: dec!(150000),
            loan: dec!(125000),
            annual_rate_pct: dec!(1.69),
            term_years: 25,
            fee: dec!(995),
            cashback: Decimal::ZERO,
            borrow_fee: true,
        }
    }

    #[test]
    fn test_borrowed_fee_is_added_to_loan() {
        let m = Mortgage::new(&two_year_fix()).unwrap();
        assert_eq!(m.initial_loan(), dec!(125000));
        assert_eq!(m.loan(), dec!(125995));
        assert_eq!(m.cash_balance(), Decimal::ZERO);
        assert_eq!(m.term_months(), 300);
    }

    #[test]
    fn test_upfront_fee_reduces_cash_balance() {
        let mut input = two_year_fix();
        input.borrow_fee = false;
        input.cashback = dec!(250);
        let m = Mortgage::new(&input).unwrap();
        assert_eq!(m.loan(), dec!(125000));
        assert_eq!(m.cash_balance(), dec!(-745));
    }

    #[test]
    fn test_monthly_factor_matches_annual_rate() {
        let m = Mortgage::new(&two_year_fix()).unwrap();
        assert_close(
            iterative_pow(m.monthly_factor(), 12),
            dec!(1.0169),
            dec!(0.0000000001),
            "annual growth",
        );
    }

    #[test]
    fn test_repayment_closed_form() {
        let m = Mortgage::new(&two_year_fix()).unwrap();
        let r = m.monthly_factor();
        let sum: Decimal = (0..300).map(|k| iterative_pow(r, k)).sum();
        let expected = dec!(125995) * iterative_pow(r, 300) / sum;
        assert_close(m.repayment(), expected, dec!(0.0000001), "repayment");
        // Roughly £510/month for this deal.
        assert!(m.repayment() > dec!(500) && m.repayment() < dec!(520));
    }

    #[test]
    fn test_remaining_loan_at_term_end_is_zero() {
        let m = Mortgage::new(&two_year_fix()).unwrap();
        let left = m.remaining_loan(300).unwrap();
        assert!(left.abs() / m.loan() < dec!(0.000001), "left = {left}");
    }

    #[test]
    fn test_remaining_loan_zero_payments_is_loan() {
        let m = Mortgage::new(&two_year_fix()).unwrap();
        assert_eq!(m.remaining_loan(0).unwrap(), m.loan());
    }

    #[test]
    fn test_remaining_loan_is_non_increasing() {
        let m = Mortgage::new(&two_year_fix()).unwrap();
        let mut previous = m.remaining_loan(0).unwrap();
        for n in 1..=300 {
            let current = m.remaining_loan(n).unwrap();
            assert!(current <= previous, "balance rose at payment {n}");
            previous = current;
        }
    }

    #[test]
    fn test_remaining_loan_beyond_term_is_rejected() {
        let m = Mortgage::new(&two_year_fix()).unwrap();
        let err = m.remaining_loan(301).unwrap_err();
        assert!(matches!(
            err,
            MortgageError::PaymentOutOfRange {
                requested: 301,
                term_months: 300
            }
        ));
    }

    #[test]
    fn test_loan_to_value_includes_borrowed_fee() {
        let m = Mortgage::new(&two_year_fix()).unwrap();
        assert_eq!(m.loan_to_value(), dec!(125995) / dec!(150000));
    }

    #[test]
    fn test_effective_rate_without_fees_matches_nominal() {
        let mut input = two_year_fix();
        input.fee = Decimal::ZERO;
        let m = Mortgage::new(&input).unwrap();
        let rate = m.effective_rate_after(24).unwrap();
        assert_close(rate, dec!(1.69), dec!(0.001), "effective rate");
    }

    #[test]
    fn test_effective_rate_at_zero_payments_is_nominal() {
        let mut input = two_year_fix();
        input.fee = Decimal::ZERO;
        let m = Mortgage::new(&input).unwrap();
        assert_eq!(m.effective_rate_after(0).unwrap(), dec!(1.69));
    }

    #[test]
    fn test_effective_rate_at_zero_payments_with_fee_is_undefined() {
        let m = Mortgage::new(&two_year_fix()).unwrap();
        match m.effective_rate_after(0) {
            Err(MortgageError::InvalidInput { field, .. }) => assert_eq!(field, "payments"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }

        let mut input = two_year_fix();
        input.fee = Decimal::ZERO;
        input.cashback = dec!(250);
        let m = Mortgage::new(&input).unwrap();
        assert!(m.effective_rate_after(0).is_err());
    }

    #[test]
    fn test_borrowed_fee_raises_effective_rate() {
        let m = Mortgage::new(&two_year_fix()).unwrap();
        let rate = m.effective_rate_after(24).unwrap();
        // £995 on a two-year deal adds roughly 0.4pp.
        assert!(rate > dec!(1.9) && rate < dec!(2.4), "rate = {rate}");
    }

    #[test]
    fn test_cashback_lowers_effective_rate() {
        let mut input = two_year_fix();
        input.fee = Decimal::ZERO;
        input.cashback = dec!(500);
        let m = Mortgage::new(&input).unwrap();
        let rate = m.effective_rate_after(24).unwrap();
        assert!(rate < dec!(1.69), "rate = {rate}");
    }

    #[test]
    fn test_schedule_matches_remaining_loan() {
        let m = Mortgage::new(&two_year_fix()).unwrap();
        let rows = m.schedule(Some(36)).unwrap();
        assert_eq!(rows.len(), 36);
        assert_eq!(rows[0].month, 1);
        assert_eq!(rows[0].opening_balance, m.loan());
        assert_eq!(rows[35].closing_balance, m.remaining_loan(36).unwrap());
        for row in &rows {
            assert_close(
                row.interest + row.principal,
                row.repayment,
                dec!(0.0000000001),
                "interest + principal",
            );
        }
    }

    #[test]
    fn test_summary_full_term() {
        let m = Mortgage::new(&two_year_fix()).unwrap();
        let s = m.summary(None).unwrap();
        assert_eq!(s.progress.payments, 300);
        assert_eq!(s.overview.term_years, dec!(25));
        assert_eq!(s.progress.remaining_loan.abs(), Decimal::ZERO);
        assert!(s.periods.is_empty());
    }

    #[test]
    fn test_runaway_rate_and_term_are_rejected_not_panics() {
        let mut input = two_year_fix();
        input.fee = Decimal::ZERO;
        input.annual_rate_pct = dec!(500);
        input.term_years = 40;
        match Mortgage::new(&input) {
            Err(MortgageError::InvalidInput { field, .. }) => assert_eq!(field, "term_months"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }

        let mut input = two_year_fix();
        input.fee = Decimal::ZERO;
        input.annual_rate_pct = dec!(5);
        input.term_years = 2000;
        assert!(matches!(
            Mortgage::new(&input),
            Err(MortgageError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_rejects_non_positive_inputs() {
        let mut input = two_year_fix();
        input.house_value = Decimal::ZERO;
        assert!(Mortgage::new(&input).is_err());

        let mut input = two_year_fix();
        input.loan = dec!(-1);
        assert!(Mortgage::new(&input).is_err());

        let mut input = two_year_fix();
        input.term_years = 0;
        assert!(Mortgage::new(&input).is_err());

        let mut input = two_year_fix();
        input.fee = dec!(-10);
        assert!(Mortgage::new(&input).is_err());
    }
}
