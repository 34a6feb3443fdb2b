//! Serializable entry points: build a mortgage (single or sequence) from a
//! JSON-friendly description and report on it inside the standard
//! `ComputationOutput` envelope.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::mortgage::model::{MortgageModel, MortgageSummary, ScheduleRow};
#[cfg(feature = "sequence")]
use crate::mortgage::sequence::{MortgageSequence, SequenceInput};
use crate::mortgage::single::{Mortgage, MortgageInput};
#[cfg(feature = "sequence")]
use crate::time_value::MONTHS_PER_YEAR;
use crate::types::{with_metadata, ComputationOutput, Money};
use crate::MortgageResult;

/// Effective rate this far above the headline rate is flagged.
const EFFECTIVE_RATE_MARGIN_WARNING: Decimal = dec!(1);

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// Either a single mortgage or a sequence of deals.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MortgageSpec {
    Single(MortgageInput),
    #[cfg(feature = "sequence")]
    Sequence(SequenceInput),
}

/// Report request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryInput {
    pub mortgage: MortgageSpec,
    /// Payments made so far; the full term when omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payments: Option<u32>,
}

/// Amortization schedule request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleInput {
    pub mortgage: MortgageSpec,
    /// Number of rows; the full term when omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payments: Option<u32>,
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleOutput {
    pub rows: Vec<ScheduleRow>,
    pub total_repaid: Money,
    pub total_interest: Money,
    pub total_principal: Money,
    pub closing_balance: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Summarize a mortgage after the requested number of payments.
pub fn analyze_mortgage(
    input: &SummaryInput,
) -> MortgageResult<ComputationOutput<MortgageSummary>> {
    let start = Instant::now();

    let (model, mut warnings) = build_model(&input.mortgage)?;
    let summary = model.summary(input.payments)?;
    warnings.extend(summary_warnings(&summary));

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        methodology(&input.mortgage),
        input,
        warnings,
        elapsed,
        summary,
    ))
}

/// Month-by-month amortization schedule.
pub fn build_schedule(input: &ScheduleInput) -> MortgageResult<ComputationOutput<ScheduleOutput>> {
    let start = Instant::now();

    let (model, warnings) = build_model(&input.mortgage)?;
    let rows = model.schedule(input.payments)?;

    let total_repaid: Money = rows.iter().map(|r| r.repayment).sum();
    let total_interest: Money = rows.iter().map(|r| r.interest).sum();
    let total_principal: Money = rows.iter().map(|r| r.principal).sum();
    let closing_balance = rows
        .last()
        .map(|r| r.closing_balance)
        .unwrap_or_else(|| model.loan());

    let output = ScheduleOutput {
        rows,
        total_repaid,
        total_interest,
        total_principal,
        closing_balance,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Amortization schedule (interest applied before each payment)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// Build the model a `MortgageSpec` describes, with any construction warnings.
pub fn build_model(spec: &MortgageSpec) -> MortgageResult<(Box<dyn MortgageModel>, Vec<String>)> {
    let mut warnings = Vec::new();

    let model: Box<dyn MortgageModel> = match spec {
        MortgageSpec::Single(input) => Box::new(Mortgage::new(input)?),
        #[cfg(feature = "sequence")]
        MortgageSpec::Sequence(input) => {
            let sequence = MortgageSequence::new(input)?;
            if let Some(last) = sequence.legs().last() {
                if sequence.final_period_adjusted() {
                    warnings.push(format!(
                        "Final period stated as {} years runs for {} years to reach the end of the term",
                        Decimal::from(last.stated_months) / Decimal::from(MONTHS_PER_YEAR),
                        Decimal::from(last.months) / Decimal::from(MONTHS_PER_YEAR),
                    ));
                }
            }
            Box::new(sequence)
        }
    };

    if model.loan_to_value() > Decimal::ONE {
        warnings.push(format!(
            "Loan-to-value of {}% exceeds 100%",
            (model.loan_to_value() * dec!(100)).round_dp(2)
        ));
    }

    Ok((model, warnings))
}

pub(crate) fn summary_warnings(summary: &MortgageSummary) -> Vec<String> {
    let mut warnings = Vec::new();
    let headline = summary.overview.annual_rate_pct;
    let effective = summary.progress.effective_rate_pct;

    if summary.progress.payments == 0 {
        warnings.push("No payments made; effective rate reported as the headline rate".into());
    } else if effective - headline > EFFECTIVE_RATE_MARGIN_WARNING {
        warnings.push(format!(
            "Effective rate {effective}% is more than {EFFECTIVE_RATE_MARGIN_WARNING}pp above the headline rate {headline}%"
        ));
    }
    warnings
}

fn methodology(spec: &MortgageSpec) -> &'static str {
    match spec {
        MortgageSpec::Single(_) => "Level-payment amortization with effective-rate scan",
        #[cfg(feature = "sequence")]
        MortgageSpec::Sequence(_) => {
            "Mortgage sequence amortization with blended effective-rate scan"
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
