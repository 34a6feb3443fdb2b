mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::compare::CompareArgs;
use commands::mortgage::{ScheduleArgs, SummaryArgs};
use commands::sequence::SequenceArgs;

/// Mortgage repayment, remortgage and effective-rate calculations
#[derive(Parser)]
#[command(
    name = "mortgage-calc",
    version,
    about = "Mortgage repayment, remortgage and effective-rate calculations",
    long_about = "A CLI for comparing mortgages with decimal precision. Computes level \
                  monthly repayments, balances after any number of payments, \
                  amortization schedules, and the effective annual rate once fees \
                  and cashback are taken into account, for single deals and for \
                  sequences of deals such as a fixed rate followed by a standard rate."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize a single mortgage after a number of payments
    Summary(SummaryArgs),
    /// Summarize a sequence of mortgage deals over one term
    Sequence(SequenceArgs),
    /// Month-by-month amortization schedule
    Schedule(ScheduleArgs),
    /// Rank mortgage scenarios by effective rate
    Compare(CompareArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Summary(args) => commands::mortgage::run_summary(args),
        Commands::Sequence(args) => commands::sequence::run_sequence(args),
        Commands::Schedule(args) => commands::mortgage::run_schedule(args),
        Commands::Compare(args) => commands::compare::run_compare(args),
        Commands::Version => {
            println!("mortgage-calc {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            log::debug!("command failed: {e:?}");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
