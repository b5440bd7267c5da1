//! Test utilities for precompile dispatch and pool scenarios.

use alloy_primitives::{Address, B256, Bytes, hex};
use alloy_sol_types::{SolError, SolInterface};
use revm::precompile::{PrecompileError, PrecompileResult};
use tickorder_contracts::precompiles::{IPoolManager, UnknownFunctionSelector};

use crate::{
    LIMIT_ORDER_HOOK_ADDRESS, Precompile,
    error::Result,
    limit_order_hook::LimitOrderHook,
    pool_manager::PoolManager,
    storage::{hashmap::HashMapStorageProvider, transact},
};

pub const ASSET0: Address = Address::repeat_byte(0x0a);
pub const ASSET1: Address = Address::repeat_byte(0x0b);

pub const ALICE: Address = Address::repeat_byte(0xa1);
pub const BOB: Address = Address::repeat_byte(0xb0);
pub const CAROL: Address = Address::repeat_byte(0xc4);
pub const TRADER: Address = Address::repeat_byte(0x7d);

/// Checks that all selectors in an interface have dispatch handlers.
///
/// Calls each selector with dummy parameters and checks for "Unknown function selector" reverts.
/// Returns unsupported selectors as `(selector_bytes, function_name)` tuples.
pub fn check_selector_coverage<P: Precompile>(
    precompile: &mut P,
    selectors: &[[u8; 4]],
    interface_name: &str,
    name_lookup: impl Fn([u8; 4]) -> Option<&'static str>,
) -> Vec<([u8; 4], &'static str)> {
    let mut unsupported_selectors = Vec::new();

    for selector in selectors.iter() {
        let mut calldata = selector.to_vec();
        // Add some dummy data for functions that require parameters
        calldata.extend_from_slice(&[0u8; 32]);

        let result = precompile.call(&Bytes::from(calldata), Address::ZERO);

        let is_unsupported = matches!(&result,
            Err(PrecompileError::Other(msg)) if hex::decode(msg)
                .is_ok_and(|data| UnknownFunctionSelector::abi_decode(&data).is_ok())
        );

        if is_unsupported && let Some(name) = name_lookup(*selector) {
            unsupported_selectors.push((*selector, name));
        }
    }

    if !unsupported_selectors.is_empty() {
        eprintln!("Unsupported {interface_name} selectors:");
        for (selector, name) in &unsupported_selectors {
            eprintln!("  - {name} ({selector:?})");
        }
    }

    unsupported_selectors
}

/// Asserts that multiple selector coverage checks all pass (no unsupported selectors).
pub fn assert_full_coverage(results: impl IntoIterator<Item = Vec<([u8; 4], &'static str)>>) {
    let all_unsupported: Vec<_> = results
        .into_iter()
        .flat_map(|r| r.into_iter())
        .map(|(_, name)| name)
        .collect();

    assert!(
        all_unsupported.is_empty(),
        "Found {} unsupported selectors: {:?}",
        all_unsupported.len(),
        all_unsupported
    );
}

/// Asserts that `result` is a revert carrying the ABI encoding of `expected`.
pub fn expect_precompile_revert<E>(result: &PrecompileResult, expected: E)
where
    E: SolInterface + std::fmt::Debug + PartialEq,
{
    match result {
        Err(PrecompileError::Other(msg)) => {
            let data = hex::decode(msg).expect("revert payload is hex encoded");
            let actual = E::abi_decode(&data).expect("revert payload decodes as expected error");
            assert_eq!(actual, expected);
        }
        other => panic!("expected revert with {expected:?}, got {other:?}"),
    }
}

/// A pool on the reference engine with the limit order hook attached.
pub struct PoolSetup {
    pub storage: HashMapStorageProvider,
    pub key: IPoolManager::PoolKey,
    pub pool_id: B256,
}

impl PoolSetup {
    /// Initializes an `ASSET0`/`ASSET1` pool at `tick` with the given spacing.
    pub fn new(tick: i32, tick_spacing: i32) -> Result<Self> {
        let mut storage = HashMapStorageProvider::new(1);
        let key = IPoolManager::PoolKey {
            asset0: ASSET0,
            asset1: ASSET1,
            tickSpacing: tick_spacing,
            hooks: LIMIT_ORDER_HOOK_ADDRESS,
        };
        let pool_id = PoolManager::new(&mut storage).initialize(ALICE, key.clone(), tick)?;

        Ok(Self {
            storage,
            key,
            pool_id,
        })
    }

    pub fn hook(&mut self) -> LimitOrderHook<'_, HashMapStorageProvider> {
        LimitOrderHook::new(&mut self.storage)
    }

    pub fn manager(&mut self) -> PoolManager<'_, HashMapStorageProvider> {
        PoolManager::new(&mut self.storage)
    }

    /// Credits `owner` with claims on both pool assets.
    pub fn fund(&mut self, owner: Address, amount0: u128, amount1: u128) -> Result<()> {
        let mut manager = self.manager();
        manager.mint(owner, ASSET0, amount0)?;
        manager.mint(owner, ASSET1, amount1)
    }

    /// `owner`'s claims on `(asset0, asset1)`.
    pub fn balances(&mut self, owner: Address) -> Result<(u128, u128)> {
        let mut manager = self.manager();
        Ok((
            manager.balance_of(owner, ASSET0)?,
            manager.balance_of(owner, ASSET1)?,
        ))
    }

    /// Places an order as a single transaction.
    pub fn place(
        &mut self,
        owner: Address,
        tick_lower: i32,
        zero_for_one: bool,
        liquidity: u128,
    ) -> Result<u128> {
        let pool_id = self.pool_id;
        transact(&mut self.storage, |storage| {
            LimitOrderHook::new(storage).place(owner, pool_id, tick_lower, zero_for_one, liquidity)
        })
    }

    /// Swaps to `tick_limit` as a single transaction, discarding every write if it fails.
    pub fn swap(&mut self, sender: Address, tick_limit: i32) -> Result<(u128, u128)> {
        let pool_id = self.pool_id;
        transact(&mut self.storage, |storage| {
            PoolManager::new(storage).swap(sender, pool_id, tick_limit)
        })
    }
}
