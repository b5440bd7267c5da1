//! Fill detection.
//!
//! Every price change reported by the pool manager is compared with the last tick the hook saw
//! for that pool. Each range the price moved all the way across is now single-asset in the
//! order's proceeds asset, so the order resting there is filled.

use alloy_primitives::{Address, B256, IntoLogData, U256};
use tracing::{debug, error};

use crate::{
    error::Result,
    limit_order_hook::{
        ILimitOrderHook, LimitOrderHook, LimitOrderHookError, LimitOrderHookEvent,
        order::Order, registry::OrderSlotKey, slots,
    },
    pool_manager::PriceDiscovery,
    storage::{
        PrecompileStorageProvider, StorageOps,
        slots::{mapping_slot, tick_to_word, word_to_tick},
    },
};

/// Slots filled by a price move, in the direction of the move. Yields `(tick_lower, zero_for_one)`.
///
/// A rising move from `prev` to `new` crosses every boundary `b` aligned to the spacing with
/// `prev < b <= new`, completing the rising range `[b - spacing, b)`. A falling move crosses every
/// aligned `b` with `new <= b < prev`, completing the falling range `[b, b + spacing)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrossedSlots {
    next_boundary: i64,
    spacing: i64,
    remaining: u64,
    rising: bool,
}

/// Walks the boundaries crossed between `prev` and `new`. `spacing` must be positive.
pub fn crossed_slots(prev: i32, new: i32, spacing: i32) -> CrossedSlots {
    let (prev, new, spacing) = (prev as i64, new as i64, spacing.max(1) as i64);
    let rising = new > prev;

    let (first, last) = if rising {
        ((prev.div_euclid(spacing) + 1) * spacing, new.div_euclid(spacing) * spacing)
    } else {
        let lowest = new.div_euclid(spacing) * spacing;
        let lowest = if lowest == new { lowest } else { lowest + spacing };
        ((prev - 1).div_euclid(spacing) * spacing, lowest)
    };

    let remaining = match (rising, new == prev) {
        (_, true) => 0,
        (true, false) if first <= last => ((last - first) / spacing + 1) as u64,
        (false, false) if first >= last => ((first - last) / spacing + 1) as u64,
        _ => 0,
    };

    CrossedSlots {
        next_boundary: first,
        spacing,
        remaining,
        rising,
    }
}

impl Iterator for CrossedSlots {
    type Item = (i32, bool);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let boundary = self.next_boundary;
        if self.rising {
            self.next_boundary += self.spacing;
            Some(((boundary - self.spacing) as i32, true))
        } else {
            self.next_boundary -= self.spacing;
            Some((boundary as i32, false))
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for CrossedSlots {}

impl<'a, S: PrecompileStorageProvider> LimitOrderHook<'a, S> {
    /// Called by the pool manager once a pool using this hook is created.
    pub fn after_initialize(&mut self, sender: Address, pool_id: B256, tick: i32) -> Result<()> {
        self.only_pool_manager(sender)?;
        self.with_lock(|hook| hook.scan(pool_id, tick))
    }

    /// Called by the pool manager after every swap on a pool using this hook.
    pub fn after_swap(&mut self, sender: Address, pool_id: B256, tick: i32) -> Result<()> {
        self.only_pool_manager(sender)?;
        self.with_lock(|hook| hook.scan(pool_id, tick))
    }

    fn observed_slot(pool_id: B256) -> U256 {
        mapping_slot(pool_id, slots::OBSERVED_TICKS)
    }

    /// Last tick the hook saw for `pool_id`, if any.
    pub fn last_observed_tick(&mut self, pool_id: B256) -> Result<Option<i32>> {
        let base = Self::observed_slot(pool_id);
        if self.sload(base + slots::OBSERVED_INITIALIZED_OFFSET)?.is_zero() {
            return Ok(None);
        }
        Ok(Some(word_to_tick(
            self.sload(base + slots::OBSERVED_TICK_OFFSET)?,
        )))
    }

    fn set_observed_tick(&mut self, pool_id: B256, tick: i32) -> Result<()> {
        let base = Self::observed_slot(pool_id);
        self.sstore(base + slots::OBSERVED_TICK_OFFSET, tick_to_word(tick))?;
        self.sstore(base + slots::OBSERVED_INITIALIZED_OFFSET, U256::ONE)
    }

    /// Fills every order crossed since the last observed tick, then records `tick`.
    fn scan(&mut self, pool_id: B256, tick: i32) -> Result<()> {
        let spacing = self.engine().pool_state(pool_id)?.tick_spacing;
        let prev = self.last_observed_tick(pool_id)?.unwrap_or(tick);

        let crossed = crossed_slots(prev, tick, spacing);
        debug!(%pool_id, prev, new = tick, crossed = crossed.len(), "Scanning crossed ranges");

        for (tick_lower, zero_for_one) in crossed {
            self.fill(&OrderSlotKey::new(pool_id, tick_lower, zero_for_one), spacing)?;
        }

        self.set_observed_tick(pool_id, tick)
    }

    /// Converts the whole order at `key` into proceeds held by the hook. Free and empty slots
    /// are skipped.
    fn fill(&mut self, key: &OrderSlotKey, spacing: i32) -> Result<()> {
        let order_id = self.order_id_at(key)?;
        if order_id == 0 {
            return Ok(());
        }

        let mut order = Order::from_storage(order_id, self.storage, self.address)?;
        if order.is_filled() {
            // slots are unbound on fill, so a bound filled order means corrupted state
            error!(order_id, pool_id = %key.pool_id, tick_lower = key.tick_lower, "Bound order already filled");
            return Err(LimitOrderHookError::already_filled().into());
        }
        if order.liquidity_total() == 0 {
            return Ok(());
        }

        let position = self.position(key, order_id, spacing);
        let hook = self.address;
        let (amount0, amount1) =
            self.engine()
                .withdraw_liquidity(&position, hook, order.liquidity_total())?;

        order.mark_filled(amount0, amount1)?;
        order.store(order_id, self.storage, self.address)?;
        self.clear(key)?;

        self.storage.emit_event(
            self.address,
            LimitOrderHookEvent::Fill(ILimitOrderHook::Fill {
                orderId: order_id,
                poolId: key.pool_id,
                tickLower: key.tick_lower,
                zeroForOne: key.zero_for_one,
                amount0,
                amount1,
            })
            .into_log_data(),
        )?;
        debug!(order_id, pool_id = %key.pool_id, tick_lower = key.tick_lower, zero_for_one = key.zero_for_one, amount0, amount1, "Filled order");

        Ok(())
    }
}
