use clap::Args;
use serde_json::Value;

use mortgage_calc_core::mortgage::analysis::{self, MortgageSpec, SummaryInput};
use mortgage_calc_core::mortgage::SequenceInput;

use crate::input;

/// Arguments for a mortgage sequence summary
#[derive(Args)]
pub struct SequenceArgs {
    /// Path to JSON/YAML file describing the sequence
    #[arg(long)]
    pub input: Option<String>,

    /// Payments made so far (overrides the file; defaults to the full term)
    #[arg(long)]
    pub payments: Option<u32>,
}

pub fn run_sequence(args: SequenceArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let sequence: SequenceInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin::<SequenceInput>()? {
        data
    } else {
        return Err("--input <file.json> or stdin required for a mortgage sequence".into());
    };
    let summary_input = SummaryInput {
        mortgage: MortgageSpec::Sequence(sequence),
        payments: args.payments,
    };
    let result = analysis::analyze_mortgage(&summary_input)?;
    Ok(serde_json::to_value(result)?)
}
