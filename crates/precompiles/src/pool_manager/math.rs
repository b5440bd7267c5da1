//! Price grid and liquidity valuation for the pool manager.
//!
//! The pool tick is an exact point on a linear price grid: `price(t) = PRICE_SCALE + t`, quoted
//! as asset1 per asset0 scaled by [`PRICE_SCALE`]. Liquidity is tracked per unit range
//! `[lower, lower + spacing)`. A unit range holding `L` is worth `L` of asset0 while the tick is at
//! or below `lower`, and `L * price(lower) / PRICE_SCALE` of asset1 once the tick reaches the
//! upper edge. In between, value moves linearly from one asset to the other.

use alloy_primitives::U256;

use crate::error::{Result, TickOrderPrecompileError};

/// Scale of [`price`]: a tick of zero is a 1:1 price.
pub const PRICE_SCALE: u128 = 1_000_000;
pub const MIN_TICK: i32 = -500_000;
pub const MAX_TICK: i32 = 500_000;
pub const MAX_TICK_SPACING: i32 = 16_384;

/// Rounding applied to a valuation. Amounts paid into a pool round up, amounts paid out round
/// down, so the pool always holds at least the exact value of its liquidity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    Down,
    Up,
}

/// Price at `tick`, scaled by [`PRICE_SCALE`].
#[inline]
pub fn price(tick: i32) -> u128 {
    (PRICE_SCALE as i128 + tick as i128) as u128
}

/// Floors `tick` to a multiple of `spacing`.
#[inline]
pub fn align_down(tick: i32, spacing: i32) -> i32 {
    tick.div_euclid(spacing) * spacing
}

fn mul_div(a: U256, b: U256, denominator: U256, rounding: Rounding) -> Result<u128> {
    if denominator.is_zero() {
        return Err(TickOrderPrecompileError::division_by_zero());
    }
    let product = a
        .checked_mul(b)
        .ok_or_else(TickOrderPrecompileError::under_overflow)?;
    let (quotient, remainder) = product.div_rem(denominator);
    let quotient = match rounding {
        Rounding::Up if !remainder.is_zero() => quotient + U256::ONE,
        _ => quotient,
    };
    quotient
        .try_into()
        .map_err(|_| TickOrderPrecompileError::under_overflow())
}

/// Value of `liquidity` in the unit range starting at `tick_lower` while the pool sits at `tick`.
pub fn unit_range_amounts(
    liquidity: u128,
    tick_lower: i32,
    spacing: i32,
    tick: i32,
    rounding: Rounding,
) -> Result<(u128, u128)> {
    let tick_upper = tick_lower + spacing;
    let tick = tick.clamp(tick_lower, tick_upper);
    let liquidity = U256::from(liquidity);
    let width = U256::from(spacing as u32);

    let amount0 = mul_div(
        liquidity,
        U256::from((tick_upper - tick) as u32),
        width,
        rounding,
    )?;
    let amount1 = mul_div(
        liquidity * U256::from((tick - tick_lower) as u32),
        U256::from(price(tick_lower)),
        width * U256::from(PRICE_SCALE),
        rounding,
    )?;
    Ok((amount0, amount1))
}

/// Value of `liquidity` spread evenly over every unit range in `[tick_lower, tick_upper)`.
pub fn range_amounts(
    liquidity: u128,
    tick_lower: i32,
    tick_upper: i32,
    spacing: i32,
    tick: i32,
    rounding: Rounding,
) -> Result<(u128, u128)> {
    let (mut total0, mut total1) = (0u128, 0u128);
    for lower in (tick_lower..tick_upper).step_by(spacing as usize) {
        let (amount0, amount1) = unit_range_amounts(liquidity, lower, spacing, tick, rounding)?;
        total0 = total0
            .checked_add(amount0)
            .ok_or_else(TickOrderPrecompileError::under_overflow)?;
        total1 = total1
            .checked_add(amount1)
            .ok_or_else(TickOrderPrecompileError::under_overflow)?;
    }
    Ok((total0, total1))
}
