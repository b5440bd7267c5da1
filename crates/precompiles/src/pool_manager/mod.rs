//! Reference price-discovery engine.
//!
//! A discretized-price pool manager: pools trade two assets on a tick grid, liquidity is held
//! over aligned tick ranges and swaps move the pool tick to a caller-chosen limit. Balances are
//! internal claims, so every transfer stays inside this contract.

pub mod dispatch;
pub mod math;
pub mod slots;

pub use math::{MAX_TICK, MAX_TICK_SPACING, MIN_TICK, PRICE_SCALE, Rounding};
pub use tickorder_contracts::precompiles::{IPoolManager, PoolManagerError, PoolManagerEvent};

use alloy_primitives::{Address, B256, IntoLogData, U256, keccak256};
use alloy_sol_types::SolValue;
use tracing::{debug, trace};

use crate::{
    LIMIT_ORDER_HOOK_ADDRESS, POOL_MANAGER_ADDRESS,
    error::{Result, TickOrderPrecompileError},
    limit_order_hook::LimitOrderHook,
    pool_manager::math::{align_down, range_amounts, unit_range_amounts},
    storage::{
        PrecompileStorageProvider, StorageOps, settle,
        slots::{double_mapping_slot, mapping_slot, tick_key, tick_to_word, word_to_tick},
        word_to_u128,
    },
};

/// Computes the pool id for `key`.
pub fn pool_id(key: &IPoolManager::PoolKey) -> B256 {
    keccak256(key.abi_encode())
}

/// Snapshot of a pool's configuration and price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pool {
    pub asset0: Address,
    pub asset1: Address,
    pub tick_spacing: i32,
    pub hooks: Address,
    pub tick: i32,
    pub reserve0: u128,
    pub reserve1: u128,
}

impl From<Pool> for IPoolManager::Pool {
    fn from(pool: Pool) -> Self {
        Self {
            asset0: pool.asset0,
            asset1: pool.asset1,
            tickSpacing: pool.tick_spacing,
            hooks: pool.hooks,
            tick: pool.tick,
            reserve0: pool.reserve0,
            reserve1: pool.reserve1,
        }
    }
}

/// Identifies one liquidity position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionKey {
    pub pool_id: B256,
    pub owner: Address,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub salt: B256,
}

impl PositionKey {
    pub fn storage_key(&self) -> B256 {
        keccak256(
            (
                self.pool_id,
                self.owner,
                self.tick_lower,
                self.tick_upper,
                self.salt,
            )
                .abi_encode(),
        )
    }
}

/// The operations a limit order hook needs from the engine it sits on.
pub trait PriceDiscovery {
    /// Current configuration and tick of `pool_id`.
    fn pool_state(&mut self, pool_id: B256) -> Result<Pool>;

    /// Adds `liquidity` to `position`, paid for by `payer`. Returns the amounts consumed.
    fn provision_liquidity(
        &mut self,
        payer: Address,
        position: &PositionKey,
        liquidity: u128,
    ) -> Result<(u128, u128)>;

    /// Removes `liquidity` from `position` and credits the value to `recipient`.
    fn withdraw_liquidity(
        &mut self,
        position: &PositionKey,
        recipient: Address,
        liquidity: u128,
    ) -> Result<(u128, u128)>;

    fn transfer(&mut self, from: Address, to: Address, asset: Address, amount: u128)
    -> Result<()>;
}

pub struct PoolManager<'a, S: PrecompileStorageProvider> {
    address: Address,
    storage: &'a mut S,
}

impl<'a, S: PrecompileStorageProvider> PoolManager<'a, S> {
    pub fn new(storage: &'a mut S) -> Self {
        Self {
            address: POOL_MANAGER_ADDRESS,
            storage,
        }
    }

    /// Runs `f` under its own checkpoint, so a failed call leaves no partial writes behind.
    fn atomic<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let checkpoint = self.storage.checkpoint();
        let result = f(self);
        settle(self.storage, checkpoint, result)
    }

    fn check_tick(tick: i32) -> Result<()> {
        if !(MIN_TICK..=MAX_TICK).contains(&tick) {
            return Err(PoolManagerError::tick_out_of_bounds(tick).into());
        }
        Ok(())
    }

    fn check_range(tick_lower: i32, tick_upper: i32, spacing: i32) -> Result<()> {
        Self::check_tick(tick_lower)?;
        Self::check_tick(tick_upper)?;
        if tick_lower >= tick_upper
            || tick_lower.rem_euclid(spacing) != 0
            || tick_upper.rem_euclid(spacing) != 0
        {
            return Err(PoolManagerError::misaligned_range().into());
        }
        Ok(())
    }

    fn pool_slot(pool_id: B256) -> U256 {
        mapping_slot(pool_id, slots::POOLS)
    }

    /// Loads a pool, failing with `PoolNotInitialized` if it does not exist.
    pub fn get_pool(&mut self, pool_id: B256) -> Result<Pool> {
        let base = Self::pool_slot(pool_id);
        let asset0 = Address::from_word(self.sload(base + slots::POOL_ASSET0_OFFSET)?.into());
        if asset0.is_zero() {
            return Err(PoolManagerError::pool_not_initialized().into());
        }

        Ok(Pool {
            asset0,
            asset1: Address::from_word(self.sload(base + slots::POOL_ASSET1_OFFSET)?.into()),
            tick_spacing: word_to_tick(self.sload(base + slots::POOL_TICK_SPACING_OFFSET)?),
            hooks: Address::from_word(self.sload(base + slots::POOL_HOOKS_OFFSET)?.into()),
            tick: word_to_tick(self.sload(base + slots::POOL_TICK_OFFSET)?),
            reserve0: word_to_u128(self.sload(base + slots::POOL_RESERVE0_OFFSET)?)?,
            reserve1: word_to_u128(self.sload(base + slots::POOL_RESERVE1_OFFSET)?)?,
        })
    }

    fn write_pool(&mut self, pool_id: B256, pool: &Pool) -> Result<()> {
        let base = Self::pool_slot(pool_id);
        self.sstore(
            base + slots::POOL_ASSET0_OFFSET,
            pool.asset0.into_word().into(),
        )?;
        self.sstore(
            base + slots::POOL_ASSET1_OFFSET,
            pool.asset1.into_word().into(),
        )?;
        self.sstore(
            base + slots::POOL_TICK_SPACING_OFFSET,
            tick_to_word(pool.tick_spacing),
        )?;
        self.sstore(
            base + slots::POOL_HOOKS_OFFSET,
            pool.hooks.into_word().into(),
        )?;
        self.sstore(base + slots::POOL_TICK_OFFSET, tick_to_word(pool.tick))?;
        self.sstore(
            base + slots::POOL_RESERVE0_OFFSET,
            U256::from(pool.reserve0),
        )?;
        self.sstore(
            base + slots::POOL_RESERVE1_OFFSET,
            U256::from(pool.reserve1),
        )
    }

    /// Creates the pool described by `key` at `tick` and notifies its hook.
    pub fn initialize(
        &mut self,
        sender: Address,
        key: IPoolManager::PoolKey,
        tick: i32,
    ) -> Result<B256> {
        self.atomic(|manager| {
            trace!(%sender, ?key, tick, "Initializing pool");

            if key.asset0.is_zero() || key.asset0 >= key.asset1 {
                return Err(PoolManagerError::invalid_assets().into());
            }
            if !(1..=MAX_TICK_SPACING).contains(&key.tickSpacing) {
                return Err(PoolManagerError::invalid_tick_spacing().into());
            }
            Self::check_tick(tick)?;

            let pool_id = pool_id(&key);
            if manager.get_pool(pool_id).is_ok() {
                return Err(PoolManagerError::pool_already_initialized().into());
            }

            let pool = Pool {
                asset0: key.asset0,
                asset1: key.asset1,
                tick_spacing: key.tickSpacing,
                hooks: key.hooks,
                tick,
                reserve0: 0,
                reserve1: 0,
            };
            manager.write_pool(pool_id, &pool)?;

            manager.storage.emit_event(
                manager.address,
                PoolManagerEvent::Initialize(IPoolManager::Initialize {
                    poolId: pool_id,
                    asset0: key.asset0,
                    asset1: key.asset1,
                    tickSpacing: key.tickSpacing,
                    hooks: key.hooks,
                    tick,
                })
                .into_log_data(),
            )?;

            if pool.hooks == LIMIT_ORDER_HOOK_ADDRESS {
                LimitOrderHook::new(manager.storage).after_initialize(
                    manager.address,
                    pool_id,
                    tick,
                )?;
            }

            Ok(pool_id)
        })
    }

    fn range_slot(pool_id: B256, tick_lower: i32) -> U256 {
        double_mapping_slot(pool_id, tick_key(tick_lower), slots::RANGE_LIQUIDITY)
    }

    /// Aggregate liquidity in the unit range starting at `tick_lower`.
    pub fn range_liquidity(&mut self, pool_id: B256, tick_lower: i32) -> Result<u128> {
        word_to_u128(self.sload(Self::range_slot(pool_id, tick_lower))?)
    }

    fn position_slot(position: &PositionKey) -> U256 {
        mapping_slot(position.storage_key(), slots::POSITIONS)
    }

    pub fn position_liquidity(&mut self, position: &PositionKey) -> Result<u128> {
        word_to_u128(self.sload(Self::position_slot(position))?)
    }

    /// Adds `liquidity` to every unit range of `position`, debiting `payer` for its value at the
    /// current tick.
    pub fn add_liquidity(
        &mut self,
        payer: Address,
        position: &PositionKey,
        liquidity: u128,
    ) -> Result<(u128, u128)> {
        self.atomic(|manager| {
            if liquidity == 0 {
                return Err(PoolManagerError::zero_liquidity().into());
            }
            let mut pool = manager.get_pool(position.pool_id)?;
            let spacing = pool.tick_spacing;
            Self::check_range(position.tick_lower, position.tick_upper, spacing)?;

            let (amount0, amount1) = range_amounts(
                liquidity,
                position.tick_lower,
                position.tick_upper,
                spacing,
                pool.tick,
                Rounding::Up,
            )?;
            manager.sub_balance(payer, pool.asset0, amount0)?;
            manager.sub_balance(payer, pool.asset1, amount1)?;

            for lower in (position.tick_lower..position.tick_upper).step_by(spacing as usize) {
                let current = manager.range_liquidity(position.pool_id, lower)?;
                let updated = current
                    .checked_add(liquidity)
                    .ok_or_else(TickOrderPrecompileError::under_overflow)?;
                manager.sstore(Self::range_slot(position.pool_id, lower), U256::from(updated))?;
            }

            let current = manager.position_liquidity(position)?;
            let updated = current
                .checked_add(liquidity)
                .ok_or_else(TickOrderPrecompileError::under_overflow)?;
            manager.sstore(Self::position_slot(position), U256::from(updated))?;

            pool.reserve0 = pool
                .reserve0
                .checked_add(amount0)
                .ok_or_else(TickOrderPrecompileError::under_overflow)?;
            pool.reserve1 = pool
                .reserve1
                .checked_add(amount1)
                .ok_or_else(TickOrderPrecompileError::under_overflow)?;
            manager.write_pool(position.pool_id, &pool)?;

            manager.emit_modify_liquidity(position, liquidity, true)?;
            debug!(
                pool_id = %position.pool_id,
                owner = %position.owner,
                %payer,
                tick_lower = position.tick_lower,
                tick_upper = position.tick_upper,
                liquidity,
                amount0,
                amount1,
                "Added liquidity"
            );

            Ok((amount0, amount1))
        })
    }

    /// Removes `liquidity` from `position` and credits its value at the current tick to
    /// `recipient`.
    pub fn remove_liquidity(
        &mut self,
        position: &PositionKey,
        recipient: Address,
        liquidity: u128,
    ) -> Result<(u128, u128)> {
        self.atomic(|manager| {
            if liquidity == 0 {
                return Err(PoolManagerError::zero_liquidity().into());
            }
            let mut pool = manager.get_pool(position.pool_id)?;
            let spacing = pool.tick_spacing;
            Self::check_range(position.tick_lower, position.tick_upper, spacing)?;

            let current = manager.position_liquidity(position)?;
            let remaining = current
                .checked_sub(liquidity)
                .ok_or_else(PoolManagerError::insufficient_liquidity)?;
            manager.sstore(Self::position_slot(position), U256::from(remaining))?;

            for lower in (position.tick_lower..position.tick_upper).step_by(spacing as usize) {
                let current = manager.range_liquidity(position.pool_id, lower)?;
                let updated = current
                    .checked_sub(liquidity)
                    .ok_or_else(PoolManagerError::insufficient_liquidity)?;
                manager.sstore(Self::range_slot(position.pool_id, lower), U256::from(updated))?;
            }

            let (amount0, amount1) = range_amounts(
                liquidity,
                position.tick_lower,
                position.tick_upper,
                spacing,
                pool.tick,
                Rounding::Down,
            )?;
            pool.reserve0 = pool
                .reserve0
                .checked_sub(amount0)
                .ok_or_else(PoolManagerError::insufficient_reserves)?;
            pool.reserve1 = pool
                .reserve1
                .checked_sub(amount1)
                .ok_or_else(PoolManagerError::insufficient_reserves)?;
            manager.write_pool(position.pool_id, &pool)?;

            manager.add_balance(recipient, pool.asset0, amount0)?;
            manager.add_balance(recipient, pool.asset1, amount1)?;

            manager.emit_modify_liquidity(position, liquidity, false)?;
            debug!(
                pool_id = %position.pool_id,
                owner = %position.owner,
                %recipient,
                tick_lower = position.tick_lower,
                tick_upper = position.tick_upper,
                liquidity,
                amount0,
                amount1,
                "Removed liquidity"
            );

            Ok((amount0, amount1))
        })
    }

    fn emit_modify_liquidity(
        &mut self,
        position: &PositionKey,
        liquidity: u128,
        added: bool,
    ) -> Result<()> {
        self.storage.emit_event(
            self.address,
            PoolManagerEvent::ModifyLiquidity(IPoolManager::ModifyLiquidity {
                poolId: position.pool_id,
                owner: position.owner,
                tickLower: position.tick_lower,
                tickUpper: position.tick_upper,
                salt: position.salt,
                liquidity,
                added,
            })
            .into_log_data(),
        )
    }

    /// Value converted by moving `pool` from its current tick to `tick_after`, as
    /// `(amount_in, amount_out)` from the swapper's side.
    fn swap_amounts(&mut self, pool_id: B256, pool: &Pool, tick_after: i32) -> Result<(u128, u128)> {
        let spacing = pool.tick_spacing;
        let tick_before = pool.tick;
        let rising = tick_after > tick_before;
        let (low, high) = (tick_before.min(tick_after), tick_before.max(tick_after));

        let (mut amount_in, mut amount_out) = (0u128, 0u128);
        for lower in (align_down(low, spacing)..high).step_by(spacing as usize) {
            let liquidity = self.range_liquidity(pool_id, lower)?;
            if liquidity == 0 {
                continue;
            }

            let before = unit_range_amounts(liquidity, lower, spacing, tick_before, Rounding::Down)?;
            let after = unit_range_amounts(liquidity, lower, spacing, tick_after, Rounding::Up)?;
            // rising prices take asset1 in and pay asset0 out
            let (in_before, in_after, out_before, out_after) = if rising {
                (before.1, after.1, before.0, after.0)
            } else {
                (before.0, after.0, before.1, after.1)
            };

            amount_in = amount_in
                .checked_add(in_after.saturating_sub(in_before))
                .ok_or_else(TickOrderPrecompileError::under_overflow)?;
            amount_out = amount_out
                .checked_add(out_before.saturating_sub(out_after))
                .ok_or_else(TickOrderPrecompileError::under_overflow)?;
        }
        Ok((amount_in, amount_out))
    }

    /// Moves the pool price to `tick_limit`, notifies the hook and settles the swapper's balances.
    ///
    /// The pool is updated before the hook runs, and the swapper pays only afterwards. If the
    /// swapper cannot pay, every write of the call is reverted, fills included.
    pub fn swap(
        &mut self,
        sender: Address,
        pool_id: B256,
        tick_limit: i32,
    ) -> Result<(u128, u128)> {
        self.atomic(|manager| {
            Self::check_tick(tick_limit)?;
            let mut pool = manager.get_pool(pool_id)?;
            let tick_before = pool.tick;
            let rising = tick_limit > tick_before;

            let (amount_in, amount_out) = manager.swap_amounts(pool_id, &pool, tick_limit)?;
            let (asset_in, asset_out) = if rising {
                pool.reserve1 = pool
                    .reserve1
                    .checked_add(amount_in)
                    .ok_or_else(TickOrderPrecompileError::under_overflow)?;
                pool.reserve0 = pool
                    .reserve0
                    .checked_sub(amount_out)
                    .ok_or_else(PoolManagerError::insufficient_reserves)?;
                (pool.asset1, pool.asset0)
            } else {
                pool.reserve0 = pool
                    .reserve0
                    .checked_add(amount_in)
                    .ok_or_else(TickOrderPrecompileError::under_overflow)?;
                pool.reserve1 = pool
                    .reserve1
                    .checked_sub(amount_out)
                    .ok_or_else(PoolManagerError::insufficient_reserves)?;
                (pool.asset0, pool.asset1)
            };
            pool.tick = tick_limit;
            manager.write_pool(pool_id, &pool)?;

            if pool.hooks == LIMIT_ORDER_HOOK_ADDRESS {
                LimitOrderHook::new(manager.storage).after_swap(
                    manager.address,
                    pool_id,
                    tick_limit,
                )?;
            }

            manager.sub_balance(sender, asset_in, amount_in)?;
            manager.add_balance(sender, asset_out, amount_out)?;

            manager.storage.emit_event(
                manager.address,
                PoolManagerEvent::Swap(IPoolManager::Swap {
                    poolId: pool_id,
                    sender,
                    tickBefore: tick_before,
                    tickAfter: tick_limit,
                    amountIn: amount_in,
                    amountOut: amount_out,
                })
                .into_log_data(),
            )?;
            debug!(
                %pool_id,
                %sender,
                tick_before,
                tick_after = tick_limit,
                amount_in,
                amount_out,
                "Swap"
            );

            Ok((amount_in, amount_out))
        })
    }

    fn balance_slot(owner: Address, asset: Address) -> U256 {
        double_mapping_slot(owner, asset, slots::BALANCES)
    }

    pub fn balance_of(&mut self, owner: Address, asset: Address) -> Result<u128> {
        word_to_u128(self.sload(Self::balance_slot(owner, asset))?)
    }

    fn add_balance(&mut self, owner: Address, asset: Address, amount: u128) -> Result<()> {
        if amount == 0 {
            return Ok(());
        }
        let balance = self
            .balance_of(owner, asset)?
            .checked_add(amount)
            .ok_or_else(TickOrderPrecompileError::under_overflow)?;
        self.sstore(Self::balance_slot(owner, asset), U256::from(balance))
    }

    fn sub_balance(&mut self, owner: Address, asset: Address, amount: u128) -> Result<()> {
        if amount == 0 {
            return Ok(());
        }
        let available = self.balance_of(owner, asset)?;
        let balance = available
            .checked_sub(amount)
            .ok_or(PoolManagerError::insufficient_balance(available, amount))?;
        self.sstore(Self::balance_slot(owner, asset), U256::from(balance))
    }

    /// Moves `amount` of `asset` claims from `from` to `to`.
    pub fn transfer(
        &mut self,
        from: Address,
        to: Address,
        asset: Address,
        amount: u128,
    ) -> Result<()> {
        self.atomic(|manager| {
            trace!(%from, %to, %asset, amount, "Transferring claims");
            manager.sub_balance(from, asset, amount)?;
            manager.add_balance(to, asset, amount)?;

            manager.storage.emit_event(
                manager.address,
                PoolManagerEvent::Transfer(IPoolManager::Transfer {
                    from,
                    to,
                    asset,
                    amount,
                })
                .into_log_data(),
            )
        })
    }

    /// Credits `amount` of `asset` claims to `to`. Called by the host when assets are deposited
    /// into the manager.
    pub fn mint(&mut self, to: Address, asset: Address, amount: u128) -> Result<()> {
        self.atomic(|manager| {
            manager.add_balance(to, asset, amount)?;

            manager.storage.emit_event(
                manager.address,
                PoolManagerEvent::Transfer(IPoolManager::Transfer {
                    from: Address::ZERO,
                    to,
                    asset,
                    amount,
                })
                .into_log_data(),
            )
        })
    }
}

impl<'a, S: PrecompileStorageProvider> PriceDiscovery for PoolManager<'a, S> {
    fn pool_state(&mut self, pool_id: B256) -> Result<Pool> {
        self.get_pool(pool_id)
    }

    fn provision_liquidity(
        &mut self,
        payer: Address,
        position: &PositionKey,
        liquidity: u128,
    ) -> Result<(u128, u128)> {
        self.add_liquidity(payer, position, liquidity)
    }

    fn withdraw_liquidity(
        &mut self,
        position: &PositionKey,
        recipient: Address,
        liquidity: u128,
    ) -> Result<(u128, u128)> {
        self.remove_liquidity(position, recipient, liquidity)
    }

    fn transfer(
        &mut self,
        from: Address,
        to: Address,
        asset: Address,
        amount: u128,
    ) -> Result<()> {
        Self::transfer(self, from, to, asset, amount)
    }
}

impl<'a, S: PrecompileStorageProvider> StorageOps for PoolManager<'a, S> {
    fn sstore(&mut self, slot: U256, value: U256) -> Result<()> {
        self.storage.sstore(self.address, slot, value)
    }

    fn sload(&mut self, slot: U256) -> Result<U256> {
        self.storage.sload(self.address, slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::hashmap::HashMapStorageProvider;

    const ASSET0: Address = Address::repeat_byte(0x0a);
    const ASSET1: Address = Address::repeat_byte(0x0b);
    const LP: Address = Address::repeat_byte(0x11);
    const TRADER: Address = Address::repeat_byte(0x22);

    fn key(spacing: i32) -> IPoolManager::PoolKey {
        IPoolManager::PoolKey {
            asset0: ASSET0,
            asset1: ASSET1,
            tickSpacing: spacing,
            hooks: Address::ZERO,
        }
    }

    fn position(pool_id: B256, tick_lower: i32, tick_upper: i32) -> PositionKey {
        PositionKey {
            pool_id,
            owner: LP,
            tick_lower,
            tick_upper,
            salt: B256::ZERO,
        }
    }

    #[test]
    fn test_initialize() -> eyre::Result<()> {
        let mut storage = HashMapStorageProvider::new(1);
        let mut manager = PoolManager::new(&mut storage);

        let pool_id = manager.initialize(LP, key(60), 30)?;
        assert_eq!(pool_id, super::pool_id(&key(60)));

        let pool = manager.get_pool(pool_id)?;
        assert_eq!(pool.tick, 30);
        assert_eq!(pool.tick_spacing, 60);
        assert_eq!((pool.asset0, pool.asset1), (ASSET0, ASSET1));

        let result = manager.initialize(LP, key(60), 0);
        assert_eq!(
            result,
            Err(PoolManagerError::pool_already_initialized().into())
        );

        // a different spacing is a different pool
        manager.initialize(LP, key(10), 0)?;
        Ok(())
    }

    #[test]
    fn test_initialize_validation() -> eyre::Result<()> {
        let mut storage = HashMapStorageProvider::new(1);
        let mut manager = PoolManager::new(&mut storage);

        let mut unsorted = key(60);
        unsorted.asset0 = ASSET1;
        unsorted.asset1 = ASSET0;
        assert_eq!(
            manager.initialize(LP, unsorted, 0),
            Err(PoolManagerError::invalid_assets().into())
        );

        let mut same = key(60);
        same.asset1 = ASSET0;
        assert_eq!(
            manager.initialize(LP, same, 0),
            Err(PoolManagerError::invalid_assets().into())
        );

        assert_eq!(
            manager.initialize(LP, key(0), 0),
            Err(PoolManagerError::invalid_tick_spacing().into())
        );
        assert_eq!(
            manager.initialize(LP, key(MAX_TICK_SPACING + 1), 0),
            Err(PoolManagerError::invalid_tick_spacing().into())
        );
        assert_eq!(
            manager.initialize(LP, key(60), MAX_TICK + 1),
            Err(PoolManagerError::tick_out_of_bounds(MAX_TICK + 1).into())
        );
        Ok(())
    }

    #[test]
    fn test_add_and_remove_liquidity() -> eyre::Result<()> {
        let mut storage = HashMapStorageProvider::new(1);
        let mut manager = PoolManager::new(&mut storage);
        let pool_id = manager.initialize(LP, key(60), 0)?;
        manager.mint(LP, ASSET0, 1_000)?;
        manager.mint(LP, ASSET1, 1_000)?;

        // [-60, 60) straddles the tick: one unit range below holds asset1, one above holds asset0
        let position = position(pool_id, -60, 60);
        let (amount0, amount1) = manager.add_liquidity(LP, &position, 100)?;
        assert_eq!(amount0, 100);
        assert_eq!(amount1, 100); // 100 * 999_940 / 1e6 rounds up

        assert_eq!(manager.range_liquidity(pool_id, -60)?, 100);
        assert_eq!(manager.range_liquidity(pool_id, 0)?, 100);
        assert_eq!(manager.position_liquidity(&position)?, 100);
        assert_eq!(manager.balance_of(LP, ASSET0)?, 900);
        assert_eq!(manager.balance_of(LP, ASSET1)?, 900);

        let (out0, out1) = manager.remove_liquidity(&position, LP, 100)?;
        assert_eq!((out0, out1), (100, 99));
        assert_eq!(manager.position_liquidity(&position)?, 0);
        assert_eq!(manager.range_liquidity(pool_id, 0)?, 0);

        let pool = manager.get_pool(pool_id)?;
        assert_eq!((pool.reserve0, pool.reserve1), (0, 1));
        Ok(())
    }

    #[test]
    fn test_liquidity_errors() -> eyre::Result<()> {
        let mut storage = HashMapStorageProvider::new(1);
        let mut manager = PoolManager::new(&mut storage);
        let pool_id = manager.initialize(LP, key(60), 0)?;

        assert_eq!(
            manager.add_liquidity(LP, &position(pool_id, 0, 60), 0),
            Err(PoolManagerError::zero_liquidity().into())
        );
        assert_eq!(
            manager.add_liquidity(LP, &position(pool_id, 10, 70), 1),
            Err(PoolManagerError::misaligned_range().into())
        );
        assert_eq!(
            manager.add_liquidity(LP, &position(pool_id, 60, 60), 1),
            Err(PoolManagerError::misaligned_range().into())
        );
        assert_eq!(
            manager.add_liquidity(LP, &position(pool_id, 0, 60), 1),
            Err(PoolManagerError::insufficient_balance(0, 1).into())
        );
        assert_eq!(
            manager.remove_liquidity(&position(pool_id, 0, 60), LP, 1),
            Err(PoolManagerError::insufficient_liquidity().into())
        );
        assert_eq!(
            manager.add_liquidity(LP, &position(B256::ZERO, 0, 60), 1),
            Err(PoolManagerError::pool_not_initialized().into())
        );
        Ok(())
    }

    #[test]
    fn test_swap_converts_crossed_ranges() -> eyre::Result<()> {
        let mut storage = HashMapStorageProvider::new(1);
        let mut manager = PoolManager::new(&mut storage);
        let pool_id = manager.initialize(LP, key(60), 0)?;
        manager.mint(LP, ASSET0, 2_000_000)?;
        manager.add_liquidity(LP, &position(pool_id, 0, 120), 1_000_000)?;
        manager.mint(TRADER, ASSET1, 3_000_000)?;

        let (amount_in, amount_out) = manager.swap(TRADER, pool_id, 60)?;
        assert_eq!(amount_out, 1_000_000);
        assert_eq!(amount_in, 1_000_000);
        assert_eq!(manager.balance_of(TRADER, ASSET0)?, 1_000_000);
        assert_eq!(manager.balance_of(TRADER, ASSET1)?, 2_000_000);

        // halfway through the next range
        let (amount_in, amount_out) = manager.swap(TRADER, pool_id, 90)?;
        assert_eq!(amount_out, 500_000);
        assert_eq!(amount_in, 500_030);

        // and back down again
        let (amount_in, amount_out) = manager.swap(TRADER, pool_id, 0)?;
        assert_eq!(amount_in, 1_500_000);
        assert_eq!(amount_out, 1_500_030);
        assert_eq!(manager.get_pool(pool_id)?.tick, 0);
        Ok(())
    }

    #[test]
    fn test_swap_requires_balance() -> eyre::Result<()> {
        let mut storage = HashMapStorageProvider::new(1);
        let mut manager = PoolManager::new(&mut storage);
        let pool_id = manager.initialize(LP, key(60), 0)?;
        manager.mint(LP, ASSET0, 1_000)?;
        manager.add_liquidity(LP, &position(pool_id, 0, 60), 1_000)?;

        assert_eq!(
            manager.swap(TRADER, pool_id, 60),
            Err(PoolManagerError::insufficient_balance(0, 1_000).into())
        );

        // the price move is undone along with the failed payment
        let pool = manager.get_pool(pool_id)?;
        assert_eq!(pool.tick, 0);
        assert_eq!((pool.reserve0, pool.reserve1), (1_000, 0));
        assert_eq!(manager.balance_of(TRADER, ASSET0)?, 0);
        Ok(())
    }

    #[test]
    fn test_failed_add_liquidity_leaves_no_state() -> eyre::Result<()> {
        let mut storage = HashMapStorageProvider::new(1);
        let mut manager = PoolManager::new(&mut storage);
        let pool_id = manager.initialize(LP, key(60), 0)?;
        manager.mint(LP, ASSET0, 1_000)?;

        // asset0 can be paid, asset1 cannot
        let straddling = position(pool_id, -60, 60);
        assert_eq!(
            manager.add_liquidity(LP, &straddling, 100),
            Err(PoolManagerError::insufficient_balance(0, 100).into())
        );

        assert_eq!(manager.balance_of(LP, ASSET0)?, 1_000);
        assert_eq!(manager.range_liquidity(pool_id, -60)?, 0);
        assert_eq!(manager.range_liquidity(pool_id, 0)?, 0);
        assert_eq!(manager.position_liquidity(&straddling)?, 0);
        let pool = manager.get_pool(pool_id)?;
        assert_eq!((pool.reserve0, pool.reserve1), (0, 0));

        // initialize and mint are the only events
        assert_eq!(storage.events_of(POOL_MANAGER_ADDRESS).len(), 2);
        Ok(())
    }

    #[test]
    fn test_transfer() -> eyre::Result<()> {
        let mut storage = HashMapStorageProvider::new(1);
        let mut manager = PoolManager::new(&mut storage);
        manager.mint(LP, ASSET0, 10)?;

        manager.transfer(LP, TRADER, ASSET0, 4)?;
        assert_eq!(manager.balance_of(LP, ASSET0)?, 6);
        assert_eq!(manager.balance_of(TRADER, ASSET0)?, 4);

        assert_eq!(
            manager.transfer(LP, TRADER, ASSET0, 7),
            Err(PoolManagerError::insufficient_balance(6, 7).into())
        );

        let events = storage.events_of(POOL_MANAGER_ADDRESS);
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[1],
            PoolManagerEvent::Transfer(IPoolManager::Transfer {
                from: LP,
                to: TRADER,
                asset: ASSET0,
                amount: 4,
            })
            .into_log_data()
        );
        Ok(())
    }
}
