//! Numeric primitives shared by the targeting engine and the price index.
//!
//! Amounts are integers in the on-chain denomination. Ratios (ltv, rates,
//! discounts) are `f64` and get truncated before they gate anything the
//! lending contract re-checks, so a proposal is never more generous than
//! what the contract accepts.

pub const YEAR_IN_SECONDS: f64 = 31_536_000.0;

/// Truncates toward zero at `decimals` digits after the point.
pub fn floor(x: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (x * scale).trunc() / scale
}

/// `floor(amount * (1 - discount))` as an integer amount.
pub fn calc_discounted_amount(amount: u128, discount: f64) -> u128 {
    let discounted = floor(amount as f64 * (1.0 - discount), 0);
    if discounted <= 0.0 {
        0
    } else {
        discounted as u128
    }
}

pub fn calc_mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Linear interest projection: `loan * (1 + apr * elapsed / year)`.
pub fn accrue_interest(loan: f64, borrow_apr: f64, block_time: u64, creation_date: u64) -> f64 {
    let borrow_duration = block_time as f64 - creation_date as f64;
    loan * (1.0 + (borrow_apr * borrow_duration) / YEAR_IN_SECONDS)
}

/// Float comparison for sort keys; NaN sorts after everything.
pub fn cmp_f64(a: f64, b: f64) -> std::cmp::Ordering {
    a.total_cmp(&b)
}

/// `true` when `a` and `b` differ by at most `tolerance`.
pub fn approx_eq(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() <= tolerance
}
