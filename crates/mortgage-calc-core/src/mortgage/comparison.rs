//! Side-by-side comparison of mortgage deals.
//!
//! Each scenario is summarized after its own number of payments (usually the
//! length of its initial deal) and the scenarios are ranked by effective
//! rate, cheapest first.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::MortgageError;
use crate::mortgage::analysis::{build_model, summary_warnings, MortgageSpec};
use crate::mortgage::model::MortgageSummary;
use crate::mortgage::sequence::{PeriodSpec, SequenceInput};
use crate::mortgage::single::MortgageInput;
use crate::types::{with_metadata, ComputationOutput, Money};
use crate::MortgageResult;

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub mortgage: MortgageSpec,
    /// Payments to evaluate the scenario at; the full term when omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payments: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonInput {
    pub scenarios: Vec<Scenario>,
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedScenario {
    /// 1 = lowest effective rate.
    pub rank: usize,
    pub name: String,
    pub summary: MortgageSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonOutput {
    pub rankings: Vec<RankedScenario>,
    pub cheapest: String,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Summarize every scenario and rank them by effective rate.
pub fn compare_mortgages(
    input: &ComparisonInput,
) -> MortgageResult<ComputationOutput<ComparisonOutput>> {
    let start = Instant::now();

    if input.scenarios.is_empty() {
        return Err(MortgageError::invalid(
            "scenarios",
            "At least one scenario is required",
        ));
    }

    let mut warnings = Vec::new();
    let mut evaluated = Vec::with_capacity(input.scenarios.len());

    for scenario in &input.scenarios {
        let (model, built_warnings) = build_model(&scenario.mortgage)?;
        let summary = model.summary(scenario.payments)?;
        warnings.extend(
            built_warnings
                .into_iter()
                .chain(summary_warnings(&summary))
                .map(|w| format!("{}: {}", scenario.name, w)),
        );
        evaluated.push((scenario.name.clone(), summary));
    }

    evaluated.sort_by(|a, b| {
        a.1.progress
            .effective_rate_pct
            .cmp(&b.1.progress.effective_rate_pct)
    });

    let rankings: Vec<RankedScenario> = evaluated
        .into_iter()
        .enumerate()
        .map(|(i, (name, summary))| RankedScenario {
            rank: i + 1,
            name,
            summary,
        })
        .collect();
    let cheapest = rankings[0].name.clone();

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Scenario comparison ranked by effective rate",
        input,
        warnings,
        elapsed,
        ComparisonOutput { rankings, cheapest },
    ))
}

/// Fixed-rate deals and remortgage strategies on a £125,000 loan against a
/// £150,000 house over 25 years.
pub fn demo_scenarios() -> ComparisonInput {
    let house_value: Money = dec!(150000);
    let loan: Money = dec!(125000);
    let term_years = 25;

    let fixed = |rate: Decimal| {
        MortgageSpec::Single(MortgageInput {
            house_value,
            loan,
            annual_rate_pct: rate,
            term_years,
            fee: dec!(995),
            cashback: Decimal::ZERO,
            borrow_fee: true,
        })
    };
    let leg = |rate: Decimal, fee: Decimal, years: u32| PeriodSpec {
        annual_rate_pct: rate,
        fee,
        term_years: years,
        cashback: Decimal::ZERO,
        borrow_fee: true,
    };
    let remortgage = SequenceInput {
        house_value,
        loan,
        term_years,
        periods: vec![
            leg(dec!(1.69), dec!(995), 2),
            leg(dec!(1.69), dec!(995), 2),
            leg(dec!(1.69), dec!(995), 2),
        ],
    };

    ComparisonInput {
        scenarios: vec![
            Scenario {
                name: "2-year fix".into(),
                mortgage: fixed(dec!(1.69)),
                payments: Some(24),
            },
            Scenario {
                name: "5-year fix".into(),
                mortgage: fixed(dec!(2.29)),
                payments: Some(60),
            },
            Scenario {
                name: "10-year fix".into(),
                mortgage: fixed(dec!(3.24)),
                payments: Some(60),
            },
            Scenario {
                name: "2-year fix then standard rate".into(),
                mortgage: MortgageSpec::Sequence(SequenceInput {
                    house_value,
                    loan,
                    term_years,
                    periods: vec![leg(dec!(1.69), dec!(995), 2), leg(dec!(3.99), dec!(0), 16)],
                }),
                payments: Some(60),
            },
            Scenario {
                name: "Repeated 2-year remortgage".into(),
                mortgage: MortgageSpec::Sequence(remortgage.clone()),
                payments: Some(60),
            },
            Scenario {
                name: "Repeated 2-year remortgage (full term)".into(),
                mortgage: MortgageSpec::Sequence(remortgage),
                payments: None,
            },
        ],
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
