//! Limit orders resting on a single tick range of a pool.
//!
//! Depositors at the same `(pool, tick_lower, direction)` share one order. The hook owns the
//! order's liquidity position in the pool manager. When a swap moves the price across the whole
//! range, the position is withdrawn into the hook's custody and depositors withdraw their share
//! of the proceeds.

pub mod dispatch;
pub mod order;
pub mod registry;
pub mod scanner;
pub mod slots;

pub use order::Order;
pub use registry::OrderSlotKey;
pub use scanner::{CrossedSlots, crossed_slots};
pub use tickorder_contracts::precompiles::{
    ILimitOrderHook, LimitOrderHookError, LimitOrderHookEvent,
};

use alloy_primitives::{Address, B256, IntoLogData, U256};
use tracing::{debug, trace};

use crate::{
    LIMIT_ORDER_HOOK_ADDRESS, POOL_MANAGER_ADDRESS,
    error::Result,
    pool_manager::{PoolManager, PositionKey, PriceDiscovery},
    storage::{
        PrecompileStorageProvider, StorageOps, settle, slots::double_mapping_slot, word_to_u128,
    },
};

pub struct LimitOrderHook<'a, S: PrecompileStorageProvider> {
    address: Address,
    storage: &'a mut S,
}

impl<'a, S: PrecompileStorageProvider> LimitOrderHook<'a, S> {
    pub fn new(storage: &'a mut S) -> Self {
        Self {
            address: LIMIT_ORDER_HOOK_ADDRESS,
            storage,
        }
    }

    /// The price-discovery engine the hook's pools live in.
    fn engine(&mut self) -> impl PriceDiscovery + '_ {
        PoolManager::new(&mut *self.storage)
    }

    /// Position holding the liquidity of `order_id`. The hook owns it and the order id is the salt,
    /// so every order has its own position even when slots are reused.
    fn position(&self, key: &OrderSlotKey, order_id: u128, spacing: i32) -> PositionKey {
        PositionKey {
            pool_id: key.pool_id,
            owner: self.address,
            tick_lower: key.tick_lower,
            tick_upper: key.tick_lower + spacing,
            salt: U256::from(order_id).into(),
        }
    }

    fn only_pool_manager(&self, sender: Address) -> Result<()> {
        if sender != POOL_MANAGER_ADDRESS {
            return Err(LimitOrderHookError::only_pool_manager().into());
        }
        Ok(())
    }

    /// Runs `f` holding the re-entry lock, under its own checkpoint. If `f` fails, every write it
    /// made is reverted, and so is the lock.
    fn with_lock<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if !self.sload(slots::LOCKED)?.is_zero() {
            return Err(LimitOrderHookError::locked().into());
        }
        let checkpoint = self.storage.checkpoint();
        let result = self.sstore(slots::LOCKED, U256::ONE).and_then(|()| {
            let value = f(self)?;
            self.sstore(slots::LOCKED, U256::ZERO)?;
            Ok(value)
        });
        settle(self.storage, checkpoint, result)
    }

    fn contribution_slot(order_id: u128, depositor: Address) -> U256 {
        double_mapping_slot(
            U256::from(order_id).to_be_bytes::<32>(),
            depositor,
            slots::CONTRIBUTIONS,
        )
    }

    pub fn contribution_of(&mut self, order_id: u128, depositor: Address) -> Result<u128> {
        word_to_u128(self.sload(Self::contribution_slot(order_id, depositor))?)
    }

    fn set_contribution(&mut self, order_id: u128, depositor: Address, amount: u128) -> Result<()> {
        self.sstore(
            Self::contribution_slot(order_id, depositor),
            U256::from(amount),
        )
    }

    /// Id of the active order at a slot, or 0 if the slot is free.
    pub fn order_at(&mut self, pool_id: B256, tick_lower: i32, zero_for_one: bool) -> Result<u128> {
        self.order_id_at(&OrderSlotKey::new(pool_id, tick_lower, zero_for_one))
    }

    /// Snapshot of an order. Unknown ids read as an empty, unfilled order.
    pub fn get_order(&mut self, order_id: u128) -> Result<Order> {
        Order::from_storage(order_id, self.storage, self.address)
    }

    /// Last tick the hook observed for `pool_id`.
    pub fn observed_tick(&mut self, pool_id: B256) -> Result<i32> {
        self.last_observed_tick(pool_id)?
            .ok_or_else(|| LimitOrderHookError::pool_not_observed().into())
    }

    /// Adds `liquidity` from `sender` to the order resting on `[tick_lower, tick_lower + spacing)`.
    ///
    /// `zero_for_one` orders sell asset0 as the price rises and must sit at or above the current
    /// tick. The others sell asset1 as the price falls and must sit at or below it. A tick on a
    /// range edge is outside the range.
    ///
    /// Returns the order id.
    pub fn place(
        &mut self,
        sender: Address,
        pool_id: B256,
        tick_lower: i32,
        zero_for_one: bool,
        liquidity: u128,
    ) -> Result<u128> {
        trace!(%sender, %pool_id, tick_lower, zero_for_one, liquidity, "Placing order");

        self.with_lock(|hook| {
            if liquidity == 0 {
                return Err(LimitOrderHookError::zero_size().into());
            }

            let pool = hook.engine().pool_state(pool_id)?;
            if pool.hooks != hook.address {
                return Err(LimitOrderHookError::hook_not_attached().into());
            }
            let spacing = pool.tick_spacing;
            if tick_lower.rem_euclid(spacing) != 0 {
                return Err(LimitOrderHookError::crossed_range().into());
            }
            let tick_upper = tick_lower
                .checked_add(spacing)
                .ok_or_else(LimitOrderHookError::crossed_range)?;

            if tick_lower < pool.tick && pool.tick < tick_upper {
                return Err(LimitOrderHookError::in_range().into());
            }
            let wrong_side = if zero_for_one {
                tick_upper <= pool.tick
            } else {
                tick_lower >= pool.tick
            };
            if wrong_side {
                return Err(LimitOrderHookError::crossed_range().into());
            }

            let key = OrderSlotKey::new(pool_id, tick_lower, zero_for_one);
            let order_id = hook.resolve_or_create(&key, &pool)?;
            let position = hook.position(&key, order_id, spacing);
            hook.engine()
                .provision_liquidity(sender, &position, liquidity)?;

            let mut order = hook.get_order(order_id)?;
            let contribution = hook.contribution_of(order_id, sender)?;
            let contribution = order.credit(contribution, liquidity)?;
            order.store(order_id, hook.storage, hook.address)?;
            hook.set_contribution(order_id, sender, contribution)?;

            hook.storage.emit_event(
                hook.address,
                LimitOrderHookEvent::Place(ILimitOrderHook::Place {
                    owner: sender,
                    orderId: order_id,
                    poolId: pool_id,
                    tickLower: tick_lower,
                    zeroForOne: zero_for_one,
                    liquidity,
                })
                .into_log_data(),
            )?;
            debug!(order_id, %sender, liquidity, contribution, "Placed order");

            Ok(order_id)
        })
    }

    /// Cancels `sender`'s whole contribution to the unfilled order at a slot and pays its current
    /// value to `to`. Draining the order frees the slot.
    pub fn kill(
        &mut self,
        sender: Address,
        pool_id: B256,
        tick_lower: i32,
        zero_for_one: bool,
        to: Address,
    ) -> Result<(u128, u128)> {
        trace!(%sender, %pool_id, tick_lower, zero_for_one, %to, "Killing order");

        self.with_lock(|hook| {
            let key = OrderSlotKey::new(pool_id, tick_lower, zero_for_one);
            let order_id = hook.order_id_at(&key)?;
            if order_id == 0 {
                return Err(LimitOrderHookError::no_active_order().into());
            }
            let mut order = hook.get_order(order_id)?;
            if order.is_filled() {
                return Err(LimitOrderHookError::no_active_order().into());
            }

            let contribution = hook.contribution_of(order_id, sender)?;
            if contribution == 0 {
                return Err(LimitOrderHookError::insufficient_contribution().into());
            }

            let spacing = hook.engine().pool_state(pool_id)?.tick_spacing;
            let position = hook.position(&key, order_id, spacing);
            let (amount0, amount1) =
                hook.engine()
                    .withdraw_liquidity(&position, to, contribution)?;

            let remaining = order.debit(contribution, contribution)?;
            order.store(order_id, hook.storage, hook.address)?;
            hook.set_contribution(order_id, sender, remaining)?;
            if order.liquidity_total() == 0 {
                hook.clear(&key)?;
            }

            hook.storage.emit_event(
                hook.address,
                LimitOrderHookEvent::Kill(ILimitOrderHook::Kill {
                    owner: sender,
                    orderId: order_id,
                    poolId: pool_id,
                    tickLower: tick_lower,
                    zeroForOne: zero_for_one,
                    liquidity: contribution,
                })
                .into_log_data(),
            )?;
            debug!(order_id, %sender, contribution, amount0, amount1, "Killed order");

            Ok((amount0, amount1))
        })
    }

    /// Pays `sender`'s share of a filled order's proceeds to `to`. Once paid, further calls by the
    /// same depositor return zero.
    pub fn withdraw(
        &mut self,
        sender: Address,
        order_id: u128,
        to: Address,
    ) -> Result<(u128, u128)> {
        trace!(%sender, order_id, %to, "Withdrawing proceeds");

        self.with_lock(|hook| {
            let mut order = hook.get_order(order_id)?;
            let contribution = hook.contribution_of(order_id, sender)?;
            let (amount0, amount1) = order.release(contribution)?;
            if contribution == 0 {
                return Ok((0, 0));
            }

            order.store(order_id, hook.storage, hook.address)?;
            hook.set_contribution(order_id, sender, 0)?;

            let custodian = hook.address;
            for (asset, amount) in [(order.asset0(), amount0), (order.asset1(), amount1)] {
                if amount > 0 {
                    hook.engine().transfer(custodian, to, asset, amount)?;
                }
            }

            hook.storage.emit_event(
                hook.address,
                LimitOrderHookEvent::Withdraw(ILimitOrderHook::Withdraw {
                    owner: sender,
                    orderId: order_id,
                    liquidity: contribution,
                    amount0,
                    amount1,
                })
                .into_log_data(),
            )?;
            debug!(order_id, %sender, %to, amount0, amount1, "Withdrew proceeds");

            Ok((amount0, amount1))
        })
    }
}

impl<'a, S: PrecompileStorageProvider> StorageOps for LimitOrderHook<'a, S> {
    fn sstore(&mut self, slot: U256, value: U256) -> Result<()> {
        self.storage.sstore(self.address, slot, value)
    }

    fn sload(&mut self, slot: U256) -> Result<U256> {
        self.storage.sload(self.address, slot)
    }
}
