//! Effective annual rate solver.
//!
//! Finds the single constant annual rate that, applied to the fee-free
//! principal with a fixed monthly repayment, leaves the same balance as the
//! actual mortgage after a given number of payments. Balance grows with the
//! rate for a fixed repayment, so a monotone coordinate scan converges.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::MortgageError;
use crate::time_value::{monthly_factor, roll_forward};
use crate::types::{Money, Percent};
use crate::MortgageResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// First rate probed, in percent.
const SCAN_START: Percent = dec!(0.1);

/// Initial scan step, in percent. Shrinks tenfold on every overshoot.
const SCAN_INITIAL_STEP: Percent = dec!(0.1);

/// Finest step applied before the scan stops.
const SCAN_MIN_STEP: Percent = dec!(0.00001);

/// Hard cap on probes.
const SCAN_MAX_ITERATIONS: u32 = 20_000;

/// Admissible rate range (exclusive), in percent.
const RATE_FLOOR: Percent = dec!(-100);
const RATE_CEILING: Percent = dec!(1000);

// ---------------------------------------------------------------------------
// Solver
// ---------------------------------------------------------------------------

/// Solve for the annual rate (percent) at which `principal`, repaid by
/// `repayment` each month for `payments` months, leaves `target` outstanding.
///
/// The result lies at most [`SCAN_MIN_STEP`] below the exact root: the
/// finest step is applied before the scan stops, one decimal place beyond a
/// scan that stops as soon as its step reaches that size.
pub fn solve_effective_rate(
    principal: Money,
    repayment: Money,
    payments: u32,
    target: Money,
) -> MortgageResult<Percent> {
    let mut iterations = 0u32;
    let mut rate = SCAN_START;
    let mut balance = probe_balance(principal, repayment, payments, rate)?;

    // The upward scan only steps back one increment per level, so start it
    // below the root.
    while balance >= target {
        rate -= SCAN_INITIAL_STEP;
        iterations += 1;
        guard_scan(rate, iterations, balance.saturating_sub(target))?;
        balance = probe_balance(principal, repayment, payments, rate)?;
    }

    let mut step = SCAN_INITIAL_STEP;
    loop {
        if balance < target {
            rate += step;
        } else {
            rate -= step;
            if step <= SCAN_MIN_STEP {
                log::debug!("effective rate converged at {rate}% after {iterations} probes");
                return Ok(rate);
            }
            step /= dec!(10);
        }
        iterations += 1;
        guard_scan(rate, iterations, balance.saturating_sub(target))?;
        balance = probe_balance(principal, repayment, payments, rate)?;
    }
}

fn probe_balance(
    principal: Money,
    repayment: Money,
    payments: u32,
    rate: Percent,
) -> MortgageResult<Money> {
    let factor = monthly_factor(rate)?;
    // A balance past the decimal range is above any target.
    Ok(roll_forward(principal, factor, repayment, payments).unwrap_or(Decimal::MAX))
}

fn guard_scan(rate: Percent, iterations: u32, last_delta: Money) -> MortgageResult<()> {
    if rate <= RATE_FLOOR || rate >= RATE_CEILING {
        return Err(MortgageError::ConvergenceFailure {
            function: format!("effective rate scan (rate left range at {rate}%)"),
            iterations,
            last_delta,
        });
    }
    if iterations >= SCAN_MAX_ITERATIONS {
        return Err(MortgageError::ConvergenceFailure {
            function: "effective rate scan".into(),
            iterations,
            last_delta,
        });
    }
    Ok(())
}
