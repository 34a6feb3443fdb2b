use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use mortgage_calc_core::mortgage::analysis::{
    self, MortgageSpec, ScheduleInput, SummaryInput,
};
use mortgage_calc_core::mortgage::MortgageInput;

use crate::input;

/// Terms of a single mortgage given as flags
#[derive(Args)]
pub struct MortgageArgs {
    /// Value of the house borrowed against
    #[arg(long)]
    pub house_value: Option<Decimal>,

    /// Amount borrowed, before fees
    #[arg(long)]
    pub loan: Option<Decimal>,

    /// Nominal annual rate in percent (e.g. 1.69, or -0.5)
    #[arg(long, allow_hyphen_values = true)]
    pub rate: Option<Decimal>,

    /// Term in years
    #[arg(long)]
    pub term: Option<u32>,

    /// Arrangement and other fees
    #[arg(long, default_value = "0")]
    pub fee: Decimal,

    /// Cashback from the lender
    #[arg(long, default_value = "0")]
    pub cashback: Decimal,

    /// Pay the fees up front instead of adding them to the loan
    #[arg(long)]
    pub pay_fee_upfront: bool,
}

/// Arguments for a mortgage summary
#[derive(Args)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub mortgage: MortgageArgs,

    /// Payments made so far (defaults to the full term)
    #[arg(long)]
    pub payments: Option<u32>,

    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for an amortization schedule
#[derive(Args)]
pub struct ScheduleArgs {
    #[command(flatten)]
    pub mortgage: MortgageArgs,

    /// Number of monthly rows (defaults to the full term)
    #[arg(long)]
    pub payments: Option<u32>,

    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

impl MortgageArgs {
    fn is_given(&self) -> bool {
        self.house_value.is_some() || self.loan.is_some() || self.rate.is_some()
    }

    fn into_spec(self) -> Result<MortgageSpec, Box<dyn std::error::Error>> {
        Ok(MortgageSpec::Single(MortgageInput {
            house_value: self
                .house_value
                .ok_or("--house-value is required (or provide --input)")?,
            loan: self.loan.ok_or("--loan is required (or provide --input)")?,
            annual_rate_pct: self.rate.ok_or("--rate is required (or provide --input)")?,
            term_years: self.term.ok_or("--term is required (or provide --input)")?,
            fee: self.fee,
            cashback: self.cashback,
            borrow_fee: !self.pay_fee_upfront,
        }))
    }
}

pub fn run_summary(args: SummaryArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let summary_input: SummaryInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if args.mortgage.is_given() {
        SummaryInput {
            mortgage: args.mortgage.into_spec()?,
            payments: args.payments,
        }
    } else if let Some(data) = input::stdin::read_stdin::<SummaryInput>()? {
        data
    } else {
        return Err("mortgage flags, --input <file.json> or stdin required".into());
    };
    let result = analysis::analyze_mortgage(&summary_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_schedule(args: ScheduleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let schedule_input: ScheduleInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if args.mortgage.is_given() {
        ScheduleInput {
            mortgage: args.mortgage.into_spec()?,
            payments: args.payments,
        }
    } else if let Some(data) = input::stdin::read_stdin::<ScheduleInput>()? {
        data
    } else {
        return Err("mortgage flags, --input <file.json> or stdin required".into());
    };
    let result = analysis::build_schedule(&schedule_input)?;
    Ok(serde_json::to_value(result)?)
}
