use clap::Args;
use serde_json::Value;

use mortgage_calc_core::mortgage::comparison::{self, ComparisonInput};

use crate::input;

/// Arguments for comparing mortgage scenarios
#[derive(Args)]
pub struct CompareArgs {
    /// Path to JSON/YAML file with named scenarios
    #[arg(long)]
    pub input: Option<String>,

    /// Compare the built-in fixed-rate and remortgage scenarios
    #[arg(long, conflicts_with = "input")]
    pub demo: bool,
}

pub fn run_compare(args: CompareArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let comparison_input: ComparisonInput = if args.demo {
        comparison::demo_scenarios()
    } else if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin::<ComparisonInput>()? {
        data
    } else {
        return Err("--input <file.json>, --demo or stdin required for comparison".into());
    };
    let result = comparison::compare_mortgages(&comparison_input)?;
    Ok(serde_json::to_value(result)?)
}
