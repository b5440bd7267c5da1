//! Order records kept by the limit order hook.
//!
//! An order is the pooled liquidity of every depositor at one slot. Before the fill it only
//! tracks how much liquidity each depositor contributed. The fill converts all of it in one step
//! and records the proceeds, which each depositor then withdraws pro rata to their contribution.

use alloy_primitives::{Address, U256};

use crate::{
    error::{Result, TickOrderPrecompileError},
    limit_order_hook::{ILimitOrderHook, LimitOrderHookError, slots},
    storage::{PrecompileStorageProvider, slots::mapping_slot, word_to_u128},
};

/// Ledger entry for one order id.
///
/// # Lifecycle
/// 1. Created empty on the first placement at a free slot
/// 2. Credited and debited by placements and cancellations while unfilled
/// 3. Marked filled exactly once, when the pool price crosses the whole range
/// 4. Released to depositors, one full withdrawal each
///
/// Records are never deleted; a filled order stays addressable by its id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Order {
    filled: bool,
    asset0: Address,
    asset1: Address,
    /// Proceeds not yet withdrawn
    settled0_total: u128,
    settled1_total: u128,
    /// Sum of all contributions
    liquidity_total: u128,
    /// Proceeds received at fill, fixed afterwards
    proceeds0: u128,
    proceeds1: u128,
}

impl Order {
    /// Creates an empty, unfilled order for a pool's asset pair.
    pub fn new(asset0: Address, asset1: Address) -> Self {
        Self {
            asset0,
            asset1,
            ..Default::default()
        }
    }

    pub fn is_filled(&self) -> bool {
        self.filled
    }

    pub fn asset0(&self) -> Address {
        self.asset0
    }

    pub fn asset1(&self) -> Address {
        self.asset1
    }

    pub fn settled0_total(&self) -> u128 {
        self.settled0_total
    }

    pub fn settled1_total(&self) -> u128 {
        self.settled1_total
    }

    pub fn liquidity_total(&self) -> u128 {
        self.liquidity_total
    }

    pub fn proceeds(&self) -> (u128, u128) {
        (self.proceeds0, self.proceeds1)
    }

    fn base_slot(order_id: u128) -> U256 {
        mapping_slot(U256::from(order_id).to_be_bytes::<32>(), slots::ORDERS)
    }

    pub fn from_storage<S: PrecompileStorageProvider>(
        order_id: u128,
        storage: &mut S,
        address: Address,
    ) -> Result<Self> {
        let base = Self::base_slot(order_id);
        let mut load = |offset: U256| storage.sload(address, base + offset);

        Ok(Self {
            filled: !load(slots::ORDER_FILLED_OFFSET)?.is_zero(),
            asset0: Address::from_word(load(slots::ORDER_ASSET0_OFFSET)?.into()),
            asset1: Address::from_word(load(slots::ORDER_ASSET1_OFFSET)?.into()),
            settled0_total: word_to_u128(load(slots::ORDER_SETTLED0_OFFSET)?)?,
            settled1_total: word_to_u128(load(slots::ORDER_SETTLED1_OFFSET)?)?,
            liquidity_total: word_to_u128(load(slots::ORDER_LIQUIDITY_OFFSET)?)?,
            proceeds0: word_to_u128(load(slots::ORDER_PROCEEDS0_OFFSET)?)?,
            proceeds1: word_to_u128(load(slots::ORDER_PROCEEDS1_OFFSET)?)?,
        })
    }

    pub fn store<S: PrecompileStorageProvider>(
        &self,
        order_id: u128,
        storage: &mut S,
        address: Address,
    ) -> Result<()> {
        let base = Self::base_slot(order_id);
        let fields = [
            (slots::ORDER_FILLED_OFFSET, U256::from(self.filled as u8)),
            (slots::ORDER_ASSET0_OFFSET, self.asset0.into_word().into()),
            (slots::ORDER_ASSET1_OFFSET, self.asset1.into_word().into()),
            (slots::ORDER_SETTLED0_OFFSET, U256::from(self.settled0_total)),
            (slots::ORDER_SETTLED1_OFFSET, U256::from(self.settled1_total)),
            (slots::ORDER_LIQUIDITY_OFFSET, U256::from(self.liquidity_total)),
            (slots::ORDER_PROCEEDS0_OFFSET, U256::from(self.proceeds0)),
            (slots::ORDER_PROCEEDS1_OFFSET, U256::from(self.proceeds1)),
        ];
        for (offset, value) in fields {
            storage.sstore(address, base + offset, value)?;
        }
        Ok(())
    }

    /// Adds `amount` to a depositor's `contribution`. Returns the new contribution.
    ///
    /// # Errors
    /// `ClosedOrder` if the order is already filled.
    pub fn credit(&mut self, contribution: u128, amount: u128) -> Result<u128> {
        if self.filled {
            return Err(LimitOrderHookError::closed_order().into());
        }
        self.liquidity_total = self
            .liquidity_total
            .checked_add(amount)
            .ok_or_else(TickOrderPrecompileError::under_overflow)?;
        contribution
            .checked_add(amount)
            .ok_or_else(TickOrderPrecompileError::under_overflow)
    }

    /// Removes `amount` from a depositor's `contribution`. Returns the new contribution.
    ///
    /// # Errors
    /// `ClosedOrder` if the order is filled, `InsufficientContribution` if `amount` exceeds the
    /// contribution.
    pub fn debit(&mut self, contribution: u128, amount: u128) -> Result<u128> {
        if self.filled {
            return Err(LimitOrderHookError::closed_order().into());
        }
        let remaining = contribution
            .checked_sub(amount)
            .ok_or_else(LimitOrderHookError::insufficient_contribution)?;
        self.liquidity_total = self
            .liquidity_total
            .checked_sub(amount)
            .ok_or_else(LimitOrderHookError::insufficient_contribution)?;
        Ok(remaining)
    }

    /// Records the amounts obtained by converting the whole order.
    ///
    /// # Errors
    /// `AlreadyFilled` on any call after the first.
    pub fn mark_filled(&mut self, amount0: u128, amount1: u128) -> Result<()> {
        if self.filled {
            return Err(LimitOrderHookError::already_filled().into());
        }
        self.filled = true;
        self.settled0_total = amount0;
        self.settled1_total = amount1;
        self.proceeds0 = amount0;
        self.proceeds1 = amount1;
        Ok(())
    }

    /// Proceeds owed for `contribution`, truncated toward zero.
    ///
    /// Shares are taken from the fill-time proceeds, so the order in which depositors withdraw
    /// does not change what any of them receives.
    pub fn share_of(&self, contribution: u128) -> Result<(u128, u128)> {
        if contribution == 0 || self.liquidity_total == 0 {
            return Ok((0, 0));
        }
        let share = |proceeds: u128| -> Result<u128> {
            (U256::from(contribution) * U256::from(proceeds) / U256::from(self.liquidity_total))
                .try_into()
                .map_err(|_| TickOrderPrecompileError::under_overflow())
        };
        Ok((share(self.proceeds0)?, share(self.proceeds1)?))
    }

    /// Pays out the share owed for `contribution`, reducing the unwithdrawn proceeds. The caller
    /// is responsible for zeroing the contribution.
    ///
    /// # Errors
    /// `NotFilled` before the fill.
    pub fn release(&mut self, contribution: u128) -> Result<(u128, u128)> {
        if !self.filled {
            return Err(LimitOrderHookError::not_filled().into());
        }
        let (amount0, amount1) = self.share_of(contribution)?;
        self.settled0_total = self
            .settled0_total
            .checked_sub(amount0)
            .ok_or_else(TickOrderPrecompileError::under_overflow)?;
        self.settled1_total = self
            .settled1_total
            .checked_sub(amount1)
            .ok_or_else(TickOrderPrecompileError::under_overflow)?;
        Ok((amount0, amount1))
    }
}

impl From<Order> for ILimitOrderHook::Order {
    fn from(order: Order) -> Self {
        Self {
            filled: order.filled,
            asset0: order.asset0,
            asset1: order.asset1,
            settled0Total: order.settled0_total,
            settled1Total: order.settled1_total,
            liquidityTotal: order.liquidity_total,
            proceeds0: order.proceeds0,
            proceeds1: order.proceeds1,
        }
    }
}
