//! Storage layout of the pool manager.

use alloy_primitives::{U256, uint};

/// Mapping of pool id (bytes32) to Pool data
pub const POOLS: U256 = uint!(0_U256);

/// Mapping of pool id => unit range lower tick => aggregate liquidity (u128)
pub const RANGE_LIQUIDITY: U256 = uint!(1_U256);

/// Mapping of position key (bytes32) to liquidity (u128)
pub const POSITIONS: U256 = uint!(2_U256);

/// Mapping of owner address => asset address => claim balance (u128)
pub const BALANCES: U256 = uint!(3_U256);

// Pool struct field offsets (relative to pool base slot)
/// Asset0 address field offset. Non-zero once the pool is initialized.
pub const POOL_ASSET0_OFFSET: U256 = uint!(0_U256);
/// Asset1 address field offset
pub const POOL_ASSET1_OFFSET: U256 = uint!(1_U256);
/// Tick spacing field offset
pub const POOL_TICK_SPACING_OFFSET: U256 = uint!(2_U256);
/// Hooks address field offset
pub const POOL_HOOKS_OFFSET: U256 = uint!(3_U256);
/// Current tick field offset
pub const POOL_TICK_OFFSET: U256 = uint!(4_U256);
/// Asset0 reserve field offset
pub const POOL_RESERVE0_OFFSET: U256 = uint!(5_U256);
/// Asset1 reserve field offset
pub const POOL_RESERVE1_OFFSET: U256 = uint!(6_U256);
