//! Price-level registry: which order, if any, is active at each slot.
//!
//! A slot is bound on the first placement at it and unbound when its order fills or is drained
//! by cancellations. These are the only two ways a binding changes.

use alloy_primitives::{B256, U256};
use tracing::trace;

use crate::{
    error::{Result, TickOrderPrecompileError},
    limit_order_hook::{LimitOrderHook, order::Order, slots},
    pool_manager::Pool,
    storage::{
        PrecompileStorageProvider, StorageOps,
        slots::{double_mapping_slot, mapping_slot, tick_key},
        word_to_u128,
    },
};

/// One `(pool, range, direction)` position in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OrderSlotKey {
    pub pool_id: B256,
    /// Lower tick of the one-spacing-wide range
    pub tick_lower: i32,
    /// `true` for orders filled by a rising price
    pub zero_for_one: bool,
}

impl OrderSlotKey {
    pub fn new(pool_id: B256, tick_lower: i32, zero_for_one: bool) -> Self {
        Self {
            pool_id,
            tick_lower,
            zero_for_one,
        }
    }

    pub(crate) fn storage_slot(&self) -> U256 {
        let by_range = double_mapping_slot(
            self.pool_id,
            tick_key(self.tick_lower),
            slots::ORDER_SLOTS,
        );
        mapping_slot(U256::from(self.zero_for_one as u8).to_be_bytes::<32>(), by_range)
    }
}

impl<'a, S: PrecompileStorageProvider> LimitOrderHook<'a, S> {
    /// Id of the active order at `key`, or 0.
    pub fn order_id_at(&mut self, key: &OrderSlotKey) -> Result<u128> {
        word_to_u128(self.sload(key.storage_slot())?)
    }

    /// Id the next created order will get. Ids start at 1.
    pub fn next_order_id(&mut self) -> Result<u128> {
        Ok(word_to_u128(self.sload(slots::NEXT_ORDER_ID)?)?.max(1))
    }

    /// Returns the order active at `key`, creating one for `pool` if the slot is free.
    pub(crate) fn resolve_or_create(&mut self, key: &OrderSlotKey, pool: &Pool) -> Result<u128> {
        let order_id = self.order_id_at(key)?;
        if order_id != 0 {
            return Ok(order_id);
        }

        let order_id = self.next_order_id()?;
        let next = order_id
            .checked_add(1)
            .ok_or_else(TickOrderPrecompileError::under_overflow)?;
        self.sstore(slots::NEXT_ORDER_ID, U256::from(next))?;
        self.sstore(key.storage_slot(), U256::from(order_id))?;
        Order::new(pool.asset0, pool.asset1).store(order_id, self.storage, self.address)?;

        trace!(order_id, pool_id = %key.pool_id, tick_lower = key.tick_lower, zero_for_one = key.zero_for_one, "Bound new order");
        Ok(order_id)
    }

    /// Unbinds `key` so the next placement there starts a fresh order.
    pub(crate) fn clear(&mut self, key: &OrderSlotKey) -> Result<()> {
        self.sstore(key.storage_slot(), U256::ZERO)
    }
}
