//! Storage layout of the limit order hook.

use alloy_primitives::{U256, uint};

/// Next order id to allocate. Zero in storage reads as 1, since 0 means "no order".
pub const NEXT_ORDER_ID: U256 = uint!(0_U256);

/// Mapping of pool id (bytes32) to the last tick observed for the pool
pub const OBSERVED_TICKS: U256 = uint!(1_U256);

/// Mapping of pool id => tick lower => direction => active order id (u128)
pub const ORDER_SLOTS: U256 = uint!(2_U256);

/// Mapping of order id (u128) to Order data
pub const ORDERS: U256 = uint!(3_U256);

/// Mapping of order id => depositor address => contributed liquidity (u128)
pub const CONTRIBUTIONS: U256 = uint!(4_U256);

/// Re-entry lock, non-zero while a hook entry point is executing
pub const LOCKED: U256 = uint!(5_U256);

// Observed tick field offsets (relative to the pool's base slot)
pub const OBSERVED_TICK_OFFSET: U256 = uint!(0_U256);
pub const OBSERVED_INITIALIZED_OFFSET: U256 = uint!(1_U256);

// Order struct field offsets (relative to order base slot)
/// Filled flag field offset
pub const ORDER_FILLED_OFFSET: U256 = uint!(0_U256);
/// Asset0 address field offset
pub const ORDER_ASSET0_OFFSET: U256 = uint!(1_U256);
/// Asset1 address field offset
pub const ORDER_ASSET1_OFFSET: U256 = uint!(2_U256);
/// Unwithdrawn asset0 proceeds field offset
pub const ORDER_SETTLED0_OFFSET: U256 = uint!(3_U256);
/// Unwithdrawn asset1 proceeds field offset
pub const ORDER_SETTLED1_OFFSET: U256 = uint!(4_U256);
/// Total contributed liquidity field offset
pub const ORDER_LIQUIDITY_OFFSET: U256 = uint!(5_U256);
/// Asset0 received at fill field offset
pub const ORDER_PROCEEDS0_OFFSET: U256 = uint!(6_U256);
/// Asset1 received at fill field offset
pub const ORDER_PROCEEDS1_OFFSET: U256 = uint!(7_U256);
