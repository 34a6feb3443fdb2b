//! Mortgage sequences: a chain of deals over one overall term.
//!
//! Typical use is a fixed-rate period followed by the lender's standard
//! variable rate, or repeated remortgaging onto a new fixed deal. Each leg
//! is priced as a fresh mortgage over the balance and term left when it
//! starts. The final leg always runs to the end of the overall term,
//! whatever length was stated for it.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::MortgageError;
use crate::mortgage::model::{ensure_within_term, MortgageModel, PeriodSummary, ScheduleRow};
use crate::mortgage::single::{default_borrow_fee, Mortgage};
use crate::time_value::MONTHS_PER_YEAR;
use crate::types::{Money, Percent};
use crate::MortgageResult;

/// Minimum number of legs in a sequence.
const MIN_PERIODS: usize = 2;

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// One leg of a mortgage sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodSpec {
    /// Nominal annual rate in percent for this leg.
    #[serde(alias = "rate")]
    pub annual_rate_pct: Percent,
    #[serde(default)]
    pub fee: Money,
    /// Years this leg is used for. Ignored for the final leg, which runs to
    /// the end of the overall term.
    #[serde(alias = "term")]
    pub term_years: u32,
    #[serde(default)]
    pub cashback: Money,
    #[serde(default = "default_borrow_fee")]
    pub borrow_fee: bool,
}

/// A mortgage made of consecutive legs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceInput {
    pub house_value: Money,
    /// Amount borrowed at the start of the first leg, before fees.
    pub loan: Money,
    /// Overall term in years.
    #[serde(alias = "term")]
    pub term_years: u32,
    pub periods: Vec<PeriodSpec>,
}

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

/// A leg of a built sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SequencePeriod {
    /// Payments actually made on this leg.
    pub months: u32,
    /// Payments the caller asked for on this leg.
    pub stated_months: u32,
    /// The leg priced over the balance and term remaining when it starts.
    pub mortgage: Mortgage,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MortgageSequence {
    house_value: Money,
    initial_loan: Money,
    loan: Money,
    term_months: u32,
    cash_balance: Money,
    repayment: Money,
    blended_rate_pct: Percent,
    periods: Vec<SequencePeriod>,
}

impl MortgageSequence {
    pub fn new(input: &SequenceInput) -> MortgageResult<Self> {
        validate(input)?;
        let term_months = to_months(input.term_years, "term_years")?;

        let last = input.periods.len() - 1;
        let mut periods = Vec::with_capacity(input.periods.len());
        let mut remaining_term = term_months;
        let mut remaining_loan = input.loan;
        let mut cash_balance = Decimal::ZERO;

        for (i, spec) in input.periods.iter().enumerate() {
            let field = format!("periods[{i}].term_years");
            let stated_months = to_months(spec.term_years, &field)?;

            if i < last {
                if stated_months == 0 {
                    return Err(MortgageError::invalid(
                        &field,
                        "Only the final period may have a zero term",
                    ));
                }
                if stated_months >= remaining_term {
                    return Err(MortgageError::invalid(
                        &field,
                        "Periods before the last must end before the overall term does",
                    ));
                }
            }

            let mortgage = Mortgage::with_term_months(
                input.house_value,
                remaining_loan,
                spec.annual_rate_pct,
                remaining_term,
                spec.fee,
                spec.cashback,
                spec.borrow_fee,
            )?;
            cash_balance += mortgage.cash_balance();

            let months = if i < last {
                remaining_loan = mortgage.remaining_loan(stated_months)?;
                remaining_term -= stated_months;
                stated_months
            } else {
                remaining_term
            };

            log::debug!(
                "period {i}: {months} payments at {}%, opening loan {}",
                spec.annual_rate_pct,
                mortgage.loan()
            );

            periods.push(SequencePeriod {
                months,
                stated_months,
                mortgage,
            });
        }

        let term = Decimal::from(term_months);
        let repayment: Money = periods
            .iter()
            .map(|p| p.mortgage.repayment() * Decimal::from(p.months) / term)
            .sum();

        let mut sequence = Self {
            house_value: input.house_value,
            initial_loan: input.loan,
            loan: periods[0].mortgage.loan(),
            term_months,
            cash_balance,
            repayment,
            blended_rate_pct: Decimal::ZERO,
            periods,
        };
        sequence.blended_rate_pct = sequence.effective_rate_after(term_months)?;

        Ok(sequence)
    }

    pub fn legs(&self) -> &[SequencePeriod] {
        &self.periods
    }

    /// Whether the final leg's stated length differs from the length it
    /// actually runs for.
    pub fn final_period_adjusted(&self) -> bool {
        self.periods
            .last()
            .is_some_and(|p| p.months != p.stated_months)
    }
}

fn validate(input: &SequenceInput) -> MortgageResult<()> {
    if input.house_value <= Decimal::ZERO {
        return Err(MortgageError::invalid(
            "house_value",
            "House value must be positive",
        ));
    }
    if input.loan <= Decimal::ZERO {
        return Err(MortgageError::invalid("loan", "Loan must be positive"));
    }
    if input.term_years == 0 {
        return Err(MortgageError::invalid("term_years", "Term must be positive"));
    }
    if input.periods.len() < MIN_PERIODS {
        return Err(MortgageError::invalid(
            "periods",
            format!("A sequence needs at least {MIN_PERIODS} periods"),
        ));
    }
    Ok(())
}

fn to_months(years: u32, field: &str) -> MortgageResult<u32> {
    years
        .checked_mul(MONTHS_PER_YEAR)
        .ok_or_else(|| MortgageError::invalid(field, "Term is too long"))
}

impl MortgageModel for MortgageSequence {
    fn house_value(&self) -> Money {
        self.house_value
    }

    fn initial_loan(&self) -> Money {
        self.initial_loan
    }

    fn loan(&self) -> Money {
        self.loan
    }

    /// Blended effective rate over the whole term.
    fn annual_rate_pct(&self) -> Percent {
        self.blended_rate_pct
    }

    fn term_months(&self) -> u32 {
        self.term_months
    }

    fn cash_balance(&self) -> Money {
        self.cash_balance
    }

    /// Term-weighted average of the legs' repayments.
    fn repayment(&self) -> Money {
        self.repayment
    }

    /// Any leg's fees or cashback count, not just the first leg's.
    fn has_fees_or_cashback(&self) -> bool {
        self.periods
            .iter()
            .any(|p| p.mortgage.has_fees_or_cashback())
    }

    fn remaining_loan(&self, payments: u32) -> MortgageResult<Money> {
        ensure_within_term(payments, self.term_months)?;

        let mut left = payments;
        for period in &self.periods {
            if left <= period.months {
                return period.mortgage.remaining_loan(left);
            }
            left -= period.months;
        }

        Err(MortgageError::PaymentOutOfRange {
            requested: payments,
            term_months: self.term_months,
        })
    }

    fn schedule_rows(&self, payments: u32) -> MortgageResult<Vec<ScheduleRow>> {
        ensure_within_term(payments, self.term_months)?;

        let mut rows = Vec::with_capacity(payments as usize);
        let mut left = payments;
        let mut offset = 0;
        for (index, period) in self.periods.iter().enumerate() {
            if left == 0 {
                break;
            }
            let take = left.min(period.months);
            rows.extend(
                period
                    .mortgage
                    .schedule_rows(take)?
                    .into_iter()
                    .map(|row| ScheduleRow {
                        month: offset + row.month,
                        period: index,
                        ..row
                    }),
            );
            offset += take;
            left -= take;
        }
        Ok(rows)
    }

    fn periods(&self) -> MortgageResult<Vec<PeriodSummary>> {
        Ok(self
            .periods
            .iter()
            .enumerate()
            .map(|(index, period)| PeriodSummary {
                index,
                term_used_years: Decimal::from(period.months) / Decimal::from(MONTHS_PER_YEAR),
                overview: period.mortgage.overview(),
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn leg(rate: Decimal, fee: Decimal, years: u32) -> PeriodSpec {
        PeriodSpec {
            annual_rate_pct: rate,
            fee,
            term_years: years,
            cashback: Decimal::ZERO,
            borrow_fee: true,
        }
    }

    fn fix_then_svr() -> SequenceInput {
        SequenceInput {
            house_value: dec!(150000),
            loan: dec!(125000),
            term_years: 25,
            periods: vec![leg(dec!(1.69), dec!(995), 2), leg(dec!(3.99), dec!(0), 16)],
        }
    }

    fn repeated_remortgage() -> SequenceInput {
        SequenceInput {
            house_value: dec!(150000),
            loan: dec!(125000),
            term_years: 25,
            periods: vec![
                leg(dec!(1.69), dec!(995), 2),
                leg(dec!(1.69), dec!(995), 2),
                leg(dec!(1.69), dec!(995), 2),
            ],
        }
    }

    #[test]
    fn test_final_period_absorbs_remaining_term() {
        let seq = MortgageSequence::new(&fix_then_svr()).unwrap();
        let legs = seq.legs();
        assert_eq!(legs[0].months, 24);
        assert_eq!(legs[1].months, 276);
        assert_eq!(legs[1].stated_months, 192);
        assert!(seq.final_period_adjusted());
    }

    #[test]
    fn test_balance_threads_between_periods() {
        let seq = MortgageSequence::new(&fix_then_svr()).unwrap();
        let legs = seq.legs();
        let carried = legs[0].mortgage.remaining_loan(24).unwrap();
        assert_eq!(legs[1].mortgage.initial_loan(), carried);
        assert_eq!(legs[1].mortgage.term_months(), 276);
    }

    #[test]
    fn test_continuity_at_boundary() {
        let seq = MortgageSequence::new(&fix_then_svr()).unwrap();
        let legs = seq.legs();
        let at_boundary = seq.remaining_loan(24).unwrap();
        assert_eq!(at_boundary, legs[0].mortgage.remaining_loan(24).unwrap());
        assert_eq!(at_boundary, legs[1].mortgage.remaining_loan(0).unwrap());
        assert_eq!(
            seq.remaining_loan(25).unwrap(),
            legs[1].mortgage.remaining_loan(1).unwrap()
        );
    }

    #[test]
    fn test_loan_is_first_period_loan() {
        let seq = MortgageSequence::new(&fix_then_svr()).unwrap();
        assert_eq!(seq.loan(), dec!(125995));
        assert_eq!(seq.initial_loan(), dec!(125000));
        assert_eq!(seq.remaining_loan(0).unwrap(), dec!(125995));
    }

    #[test]
    fn test_repayment_is_term_weighted_average() {
        let seq = MortgageSequence::new(&fix_then_svr()).unwrap();
        let legs = seq.legs();
        let expected = legs[0].mortgage.repayment() * dec!(24) / dec!(300)
            + legs[1].mortgage.repayment() * dec!(276) / dec!(300);
        assert!((seq.repayment() - expected).abs() < dec!(0.0000001));
    }

    #[test]
    fn test_repays_by_end_of_term() {
        let seq = MortgageSequence::new(&repeated_remortgage()).unwrap();
        let left = seq.remaining_loan(300).unwrap();
        assert!(left.abs() < dec!(0.001), "left = {left}");
    }

    #[test]
    fn test_later_leg_fee_blocks_zero_payment_rate() {
        let mut input = fix_then_svr();
        input.periods[0].fee = Decimal::ZERO;
        let seq = MortgageSequence::new(&input).unwrap();
        assert_eq!(seq.effective_rate_after(0).unwrap(), seq.annual_rate_pct());

        input.periods[1].fee = dec!(500);
        let seq = MortgageSequence::new(&input).unwrap();
        assert!(seq.effective_rate_after(0).is_err());
    }

    #[test]
    fn test_blended_rate_sits_between_legs() {
        let seq = MortgageSequence::new(&fix_then_svr()).unwrap();
        let rate = seq.annual_rate_pct();
        assert!(rate > dec!(1.69) && rate < dec!(4.5), "rate = {rate}");
    }

    #[test]
    fn test_repeated_remortgage_at_five_years() {
        let seq = MortgageSequence::new(&repeated_remortgage()).unwrap();
        let left = seq.remaining_loan(60).unwrap();
        assert!(left < seq.loan());
        let rate = seq.effective_rate_after(60).unwrap();
        assert!(rate > Decimal::ZERO && rate < dec!(10), "rate = {rate}");
    }

    #[test]
    fn test_fees_accumulate_in_cash_balance_when_paid_upfront() {
        let mut input = repeated_remortgage();
        for period in &mut input.periods {
            period.borrow_fee = false;
        }
        let seq = MortgageSequence::new(&input).unwrap();
        assert_eq!(seq.cash_balance(), dec!(-2985));
        assert_eq!(seq.loan(), dec!(125000));
    }

    #[test]
    fn test_schedule_spans_periods() {
        let seq = MortgageSequence::new(&fix_then_svr()).unwrap();
        let rows = seq.schedule(Some(30)).unwrap();
        assert_eq!(rows.len(), 30);
        assert_eq!(rows[23].period, 0);
        assert_eq!(rows[24].period, 1);
        assert_eq!(rows[24].month, 25);
        assert_eq!(rows[29].closing_balance, seq.remaining_loan(30).unwrap());
    }

    #[test]
    fn test_summary_lists_periods() {
        let seq = MortgageSequence::new(&fix_then_svr()).unwrap();
        let summary = seq.summary(Some(60)).unwrap();
        assert_eq!(summary.periods.len(), 2);
        assert_eq!(summary.periods[0].term_used_years, dec!(2));
        assert_eq!(summary.periods[1].term_used_years, dec!(23));
    }

    #[test]
    fn test_rejects_single_period() {
        let mut input = fix_then_svr();
        input.periods.truncate(1);
        let err = MortgageSequence::new(&input).unwrap_err();
        assert!(matches!(err, MortgageError::InvalidInput { .. }));
    }

    #[test]
    fn test_rejects_periods_overrunning_term() {
        let mut input = fix_then_svr();
        input.periods[0].term_years = 25;
        assert!(MortgageSequence::new(&input).is_err());
    }

    #[test]
    fn test_rejects_query_beyond_term() {
        let seq = MortgageSequence::new(&fix_then_svr()).unwrap();
        assert!(matches!(
            seq.remaining_loan(301),
            Err(MortgageError::PaymentOutOfRange { .. })
        ));
        assert!(seq.effective_rate_after(301).is_err());
    }
}
