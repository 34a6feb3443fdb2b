use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::MortgageError;
use crate::types::{Factor, Money, Percent};
use crate::MortgageResult;

/// Payments per year. Rates compound monthly.
pub const MONTHS_PER_YEAR: u32 = 12;

const ROOT_CONVERGENCE_THRESHOLD: Decimal = dec!(0.0000000000001);
const MAX_ROOT_ITERATIONS: u32 = 100;

/// Monthly growth factor for a nominal annual rate in percent:
/// `(1 + rate / 100)^(1/12)`.
pub fn monthly_factor(annual_rate_pct: Percent) -> MortgageResult<Factor> {
    if annual_rate_pct <= dec!(-100) {
        return Err(MortgageError::invalid(
            "annual_rate_pct",
            "Annual rate must be greater than -100%",
        ));
    }
    let annual_factor = Decimal::ONE + annual_rate_pct / dec!(100);
    Ok(nth_root(annual_factor, MONTHS_PER_YEAR))
}

/// Inverse of [`monthly_factor`]: `(factor^12 - 1) * 100`.
pub fn annual_rate_pct(factor: Factor) -> Percent {
    (iterative_pow(factor, MONTHS_PER_YEAR) - Decimal::ONE) * dec!(100)
}

/// Level monthly repayment that clears `loan` in exactly `n` payments when
/// interest is applied before each payment:
///
/// `repayment = L * r^n / sum(r^k for k in 0..n)`
pub fn level_repayment(loan: Money, factor: Factor, n: u32) -> MortgageResult<Money> {
    if n == 0 {
        return Err(MortgageError::invalid(
            "term_months",
            "Number of payments must be > 0",
        ));
    }

    let overflow = || {
        MortgageError::invalid(
            "term_months",
            "Repayment overflows the decimal range for this rate and term",
        )
    };

    let mut growth = Decimal::ONE;
    let mut annuity_sum = Decimal::ZERO;
    for _ in 0..n {
        annuity_sum = annuity_sum.checked_add(growth).ok_or_else(overflow)?;
        growth = growth.checked_mul(factor).ok_or_else(overflow)?;
    }

    if annuity_sum.is_zero() {
        return Err(MortgageError::invalid(
            "monthly_factor",
            "Annuity sum vanished; rate is degenerate",
        ));
    }

    // growth / annuity_sum stays below the factor, so divide first.
    let ratio = growth.checked_div(annuity_sum).ok_or_else(overflow)?;
    loan.checked_mul(ratio).ok_or_else(overflow)
}

/// Balance left after `n` payments: interest first, then the repayment.
///
/// Fails when the balance leaves the decimal range, which only a runaway
/// rate over a long term can cause.
pub fn roll_forward(
    loan: Money,
    factor: Factor,
    repayment: Money,
    n: u32,
) -> MortgageResult<Money> {
    let mut balance = loan;
    for _ in 0..n {
        balance = balance
            .checked_mul(factor)
            .and_then(|accrued| accrued.checked_sub(repayment))
            .ok_or_else(|| {
                MortgageError::invalid(
                    "term_months",
                    "Balance overflows the decimal range for this rate and term",
                )
            })?;
    }
    Ok(balance)
}

/// Compute base^n for a positive integer exponent via iterative multiplication.
pub fn iterative_pow(base: Decimal, n: u32) -> Decimal {
    let mut result = Decimal::ONE;
    for _ in 0..n {
        result *= base;
    }
    result
}

/// Compute the nth root of x using Newton's method.
pub fn nth_root(x: Decimal, n: u32) -> Decimal {
    if x == Decimal::ONE {
        return Decimal::ONE;
    }
    if x <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    if n == 0 {
        return Decimal::ONE;
    }
    if n == 1 {
        return x;
    }

    let n_dec = Decimal::from(n);
    let mut guess = Decimal::ONE;

    for _ in 0..MAX_ROOT_ITERATIONS {
        let g_n_minus_1 = iterative_pow(guess, n - 1);
        if g_n_minus_1.is_zero() {
            break;
        }
        let g_n = g_n_minus_1 * guess;

        let delta = (g_n - x) / (n_dec * g_n_minus_1);
        guess -= delta;

        if delta.abs() < ROOT_CONVERGENCE_THRESHOLD {
            break;
        }
    }

    guess
}
