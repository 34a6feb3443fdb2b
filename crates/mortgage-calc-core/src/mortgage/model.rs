//! Query surface shared by single-period mortgages and mortgage sequences.
//!
//! Both models expose the same figures (loan, repayment, cash balance,
//! term) and the same questions (balance after N payments, effective rate
//! after N payments, a structured report and an amortization schedule).
//! The trait supplies the shared derivations on top of a handful of
//! accessors and the model-specific balance roll-forward.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::MortgageError;
use crate::mortgage::effective_rate::solve_effective_rate;
use crate::time_value::MONTHS_PER_YEAR;
use crate::types::{Money, Percent, Ratio};
use crate::MortgageResult;

/// Decimal places kept for money in reports.
const MONEY_DP: u32 = 2;

/// Decimal places kept for percentages in reports (the solver's resolution).
const PERCENT_DP: u32 = 5;

/// Decimal places kept for plain ratios in reports.
const RATIO_DP: u32 = 6;

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

/// Headline terms of a mortgage at drawdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MortgageOverview {
    pub house_value: Money,
    /// Loan including any borrowed fees.
    pub loan: Money,
    pub loan_to_value_pct: Percent,
    /// Nominal rate for a single mortgage; blended effective rate for a sequence.
    pub annual_rate_pct: Percent,
    pub term_years: Decimal,
    /// Cashback less fees paid up front.
    pub cash_balance: Money,
    /// Monthly repayment (term-weighted average for a sequence).
    pub repayment: Money,
}

/// Position after a number of payments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentProgress {
    pub payments: u32,
    pub remaining_loan: Money,
    /// Remaining loan over the loan before fees.
    pub remaining_loan_ratio: Ratio,
    pub total_paid: Money,
    /// Total paid over the loan before fees.
    pub total_paid_ratio: Ratio,
    pub effective_rate_pct: Percent,
}

/// One leg of a mortgage sequence as it appears in a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodSummary {
    pub index: usize,
    /// Years this leg is actually used for (the final leg runs to term end).
    pub term_used_years: Decimal,
    #[serde(flatten)]
    pub overview: MortgageOverview,
}

/// Structured report for a mortgage after `payments` payments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MortgageSummary {
    #[serde(flatten)]
    pub overview: MortgageOverview,
    #[serde(flatten)]
    pub progress: PaymentProgress,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub periods: Vec<PeriodSummary>,
}

/// One month of an amortization schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRow {
    /// 1-based payment number across the whole mortgage.
    pub month: u32,
    /// Index of the sequence leg this payment belongs to (0 for a single mortgage).
    pub period: usize,
    pub opening_balance: Money,
    pub interest: Money,
    pub repayment: Money,
    pub principal: Money,
    pub closing_balance: Money,
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

pub trait MortgageModel {
    fn house_value(&self) -> Money;

    /// Amount borrowed before any fees are added.
    fn initial_loan(&self) -> Money;

    /// Amount the repayment is computed on, including borrowed fees.
    fn loan(&self) -> Money;

    fn annual_rate_pct(&self) -> Percent;

    fn term_months(&self) -> u32;

    fn cash_balance(&self) -> Money;

    fn repayment(&self) -> Money;

    /// Balance after `payments` monthly payments, interest applied first.
    fn remaining_loan(&self, payments: u32) -> MortgageResult<Money>;

    /// Month-by-month rows for the first `payments` payments.
    fn schedule_rows(&self, payments: u32) -> MortgageResult<Vec<ScheduleRow>>;

    /// Per-leg breakdown; empty for a single mortgage.
    fn periods(&self) -> MortgageResult<Vec<PeriodSummary>> {
        Ok(Vec::new())
    }

    /// Whether fees were borrowed or cash changed hands at drawdown.
    fn has_fees_or_cashback(&self) -> bool {
        self.loan() != self.initial_loan() || !self.cash_balance().is_zero()
    }

    fn loan_to_value(&self) -> Ratio {
        self.loan() / self.house_value()
    }

    /// Constant annual rate (percent) that reproduces this mortgage's
    /// fee- and cashback-adjusted balance after `payments` payments, on the
    /// fee-free principal with the same monthly repayment.
    ///
    /// With no payments made the balance says nothing about the rate. The
    /// model's own annual rate is returned when no fees or cashback apply;
    /// otherwise the figure is undefined and an error is returned.
    fn effective_rate_after(&self, payments: u32) -> MortgageResult<Percent> {
        ensure_within_term(payments, self.term_months())?;
        if payments == 0 {
            if self.has_fees_or_cashback() {
                return Err(MortgageError::invalid(
                    "payments",
                    "Effective rate after zero payments is undefined once fees or cashback apply",
                ));
            }
            return Ok(self.annual_rate_pct());
        }
        let target = self.remaining_loan(payments)? - self.cash_balance();
        solve_effective_rate(self.initial_loan(), self.repayment(), payments, target)
    }

    fn overview(&self) -> MortgageOverview {
        MortgageOverview {
            house_value: self.house_value(),
            loan: self.loan().round_dp(MONEY_DP),
            loan_to_value_pct: (self.loan_to_value() * dec!(100)).round_dp(PERCENT_DP),
            annual_rate_pct: self.annual_rate_pct().round_dp(PERCENT_DP),
            term_years: Decimal::from(self.term_months()) / Decimal::from(MONTHS_PER_YEAR),
            cash_balance: self.cash_balance().round_dp(MONEY_DP),
            repayment: self.repayment().round_dp(MONEY_DP),
        }
    }

    /// Report after `payments` payments (the full term when `None`).
    fn summary(&self, payments: Option<u32>) -> MortgageResult<MortgageSummary> {
        let payments = payments.unwrap_or_else(|| self.term_months());
        ensure_within_term(payments, self.term_months())?;

        let initial_loan = self.initial_loan();
        let remaining_loan = self.remaining_loan(payments)?;
        let total_paid = self.repayment() * Decimal::from(payments);
        let effective_rate_pct = self.effective_rate_after(payments)?;

        Ok(MortgageSummary {
            overview: self.overview(),
            progress: PaymentProgress {
                payments,
                remaining_loan: remaining_loan.round_dp(MONEY_DP),
                remaining_loan_ratio: (remaining_loan / initial_loan).round_dp(RATIO_DP),
                total_paid: total_paid.round_dp(MONEY_DP),
                total_paid_ratio: (total_paid / initial_loan).round_dp(RATIO_DP),
                effective_rate_pct: effective_rate_pct.round_dp(PERCENT_DP),
            },
            periods: self.periods()?,
        })
    }

    /// Amortization schedule for the first `payments` payments (the full
    /// term when `None`).
    fn schedule(&self, payments: Option<u32>) -> MortgageResult<Vec<ScheduleRow>> {
        let payments = payments.unwrap_or_else(|| self.term_months());
        ensure_within_term(payments, self.term_months())?;
        self.schedule_rows(payments)
    }
}

/// Reject payment counts beyond the end of the term.
pub(crate) fn ensure_within_term(payments: u32, term_months: u32) -> MortgageResult<()> {
    if payments > term_months {
        return Err(MortgageError::PaymentOutOfRange {
            requested: payments,
            term_months,
        });
    }
    Ok(())
}
