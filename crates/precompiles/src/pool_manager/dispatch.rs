use alloy_primitives::Address;
use alloy_sol_types::SolInterface;
use revm::precompile::PrecompileResult;

use crate::{
    Precompile, dispatch_call, metadata, mutate, mutate_void,
    pool_manager::{
        IPoolManager::{self, IPoolManagerCalls},
        PoolManager, PositionKey, pool_id,
    },
    settle_call,
    storage::PrecompileStorageProvider,
    view,
};

impl<'a, S: PrecompileStorageProvider> Precompile for PoolManager<'a, S> {
    fn call(&mut self, calldata: &[u8], msg_sender: Address) -> PrecompileResult {
        let checkpoint = self.storage.checkpoint();

        let result = dispatch_call(calldata, IPoolManagerCalls::abi_decode, |call| match call {
            IPoolManagerCalls::initialize(call) => {
                mutate(call, msg_sender, |s, c| self.initialize(s, c.key, c.tick))
            }
            IPoolManagerCalls::getPoolId(call) => {
                metadata::<IPoolManager::getPoolIdCall>(|| Ok(pool_id(&call.key)))
            }
            IPoolManagerCalls::getPool(call) => {
                view(call, |c| self.get_pool(c.poolId).map(Into::into))
            }
            IPoolManagerCalls::addLiquidity(call) => mutate(call, msg_sender, |s, c| {
                let position = PositionKey {
                    pool_id: c.poolId,
                    owner: s,
                    tick_lower: c.tickLower,
                    tick_upper: c.tickUpper,
                    salt: c.salt,
                };
                let (amount0, amount1) = self.add_liquidity(s, &position, c.liquidity)?;
                Ok((amount0, amount1).into())
            }),
            IPoolManagerCalls::removeLiquidity(call) => mutate(call, msg_sender, |s, c| {
                let position = PositionKey {
                    pool_id: c.poolId,
                    owner: s,
                    tick_lower: c.tickLower,
                    tick_upper: c.tickUpper,
                    salt: c.salt,
                };
                let (amount0, amount1) = self.remove_liquidity(&position, c.to, c.liquidity)?;
                Ok((amount0, amount1).into())
            }),
            IPoolManagerCalls::positionLiquidity(call) => view(call, |c| {
                self.position_liquidity(&PositionKey {
                    pool_id: c.poolId,
                    owner: c.owner,
                    tick_lower: c.tickLower,
                    tick_upper: c.tickUpper,
                    salt: c.salt,
                })
            }),
            IPoolManagerCalls::rangeLiquidity(call) => {
                view(call, |c| self.range_liquidity(c.poolId, c.tickLower))
            }
            IPoolManagerCalls::swap(call) => mutate(call, msg_sender, |s, c| {
                let (amount_in, amount_out) = self.swap(s, c.poolId, c.tickLimit)?;
                Ok((amount_in, amount_out).into())
            }),
            IPoolManagerCalls::balanceOf(call) => {
                view(call, |c| self.balance_of(c.owner, c.asset))
            }
            IPoolManagerCalls::transfer(call) => mutate_void(call, msg_sender, |s, c| {
                self.transfer(s, c.to, c.asset, c.amount)
            }),
        });

        settle_call(self.storage, checkpoint, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        LIMIT_ORDER_HOOK_ADDRESS, METADATA_GAS, input_cost,
        limit_order_hook::LimitOrderHook,
        pool_manager::PoolManagerError,
        storage::hashmap::HashMapStorageProvider,
        test_util::{
            ALICE, ASSET0, ASSET1, BOB, PoolSetup, TRADER, assert_full_coverage,
            check_selector_coverage, expect_precompile_revert,
        },
    };
    use alloy_primitives::B256;
    use alloy_sol_types::SolCall;

    #[test]
    fn test_pool_manager_selector_coverage() {
        let mut storage = HashMapStorageProvider::new(1);
        let mut manager = PoolManager::new(&mut storage);

        let unsupported = check_selector_coverage(
            &mut manager,
            IPoolManagerCalls::SELECTORS,
            "IPoolManager",
            IPoolManagerCalls::name_by_selector,
        );

        assert_full_coverage([unsupported]);
    }

    #[test]
    fn test_initialize_through_abi_notifies_hook() -> eyre::Result<()> {
        let mut storage = HashMapStorageProvider::new(1);
        let key = IPoolManager::PoolKey {
            asset0: ASSET0,
            asset1: ASSET1,
            tickSpacing: 60,
            hooks: LIMIT_ORDER_HOOK_ADDRESS,
        };

        let calldata = IPoolManager::initializeCall {
            key: key.clone(),
            tick: -120,
        }
        .abi_encode();
        let output = PoolManager::new(&mut storage).call(&calldata, ALICE)?;
        let pool_id = IPoolManager::initializeCall::abi_decode_returns(&output.bytes)?;
        assert_eq!(pool_id, super::pool_id(&key));

        let calldata = IPoolManager::getPoolIdCall { key }.abi_encode();
        let output = PoolManager::new(&mut storage).call(&calldata, BOB)?;
        assert_eq!(IPoolManager::getPoolIdCall::abi_decode_returns(&output.bytes)?, pool_id);
        assert_eq!(output.gas_used, METADATA_GAS + input_cost(calldata.len()));

        let calldata = IPoolManager::getPoolCall { poolId: pool_id }.abi_encode();
        let output = PoolManager::new(&mut storage).call(&calldata, BOB)?;
        let pool = IPoolManager::getPoolCall::abi_decode_returns(&output.bytes)?;
        assert_eq!(pool.tick, -120);
        assert_eq!(pool.hooks, LIMIT_ORDER_HOOK_ADDRESS);

        assert_eq!(LimitOrderHook::new(&mut storage).observed_tick(pool_id)?, -120);
        Ok(())
    }

    #[test]
    fn test_liquidity_and_swap_through_abi() -> eyre::Result<()> {
        let mut setup = PoolSetup::new(0, 60)?;
        setup.fund(ALICE, 1_000_000, 0)?;
        setup.fund(TRADER, 0, 2_000_000)?;
        let pool_id = setup.pool_id;
        let mut manager = setup.manager();

        let calldata = IPoolManager::addLiquidityCall {
            poolId: pool_id,
            tickLower: 0,
            tickUpper: 60,
            salt: B256::ZERO,
            liquidity: 1_000_000,
        }
        .abi_encode();
        let output = manager.call(&calldata, ALICE)?;
        let ret = IPoolManager::addLiquidityCall::abi_decode_returns(&output.bytes)?;
        assert_eq!((ret.amount0, ret.amount1), (1_000_000, 0));

        let calldata = IPoolManager::positionLiquidityCall {
            poolId: pool_id,
            owner: ALICE,
            tickLower: 0,
            tickUpper: 60,
            salt: B256::ZERO,
        }
        .abi_encode();
        let output = manager.call(&calldata, BOB)?;
        assert_eq!(
            IPoolManager::positionLiquidityCall::abi_decode_returns(&output.bytes)?,
            1_000_000
        );

        let calldata = IPoolManager::rangeLiquidityCall {
            poolId: pool_id,
            tickLower: 0,
        }
        .abi_encode();
        let output = manager.call(&calldata, BOB)?;
        assert_eq!(
            IPoolManager::rangeLiquidityCall::abi_decode_returns(&output.bytes)?,
            1_000_000
        );

        let calldata = IPoolManager::swapCall {
            poolId: pool_id,
            tickLimit: 60,
        }
        .abi_encode();
        let output = manager.call(&calldata, TRADER)?;
        let ret = IPoolManager::swapCall::abi_decode_returns(&output.bytes)?;
        assert_eq!((ret.amountIn, ret.amountOut), (1_000_000, 1_000_000));

        let calldata = IPoolManager::balanceOfCall {
            owner: TRADER,
            asset: ASSET0,
        }
        .abi_encode();
        let output = manager.call(&calldata, BOB)?;
        assert_eq!(
            IPoolManager::balanceOfCall::abi_decode_returns(&output.bytes)?,
            1_000_000
        );

        let calldata = IPoolManager::removeLiquidityCall {
            poolId: pool_id,
            tickLower: 0,
            tickUpper: 60,
            salt: B256::ZERO,
            liquidity: 1_000_000,
            to: BOB,
        }
        .abi_encode();
        let output = manager.call(&calldata, ALICE)?;
        let ret = IPoolManager::removeLiquidityCall::abi_decode_returns(&output.bytes)?;
        assert_eq!((ret.amount0, ret.amount1), (0, 1_000_000));
        assert_eq!(setup.balances(BOB)?, (0, 1_000_000));
        Ok(())
    }

    #[test]
    fn test_transfer_through_abi() -> eyre::Result<()> {
        let mut setup = PoolSetup::new(0, 60)?;
        setup.fund(ALICE, 50, 0)?;
        let mut manager = setup.manager();

        let calldata = IPoolManager::transferCall {
            to: BOB,
            asset: ASSET0,
            amount: 20,
        }
        .abi_encode();
        let output = manager.call(&calldata, ALICE)?;
        assert!(output.bytes.is_empty());

        let calldata = IPoolManager::transferCall {
            to: BOB,
            asset: ASSET0,
            amount: 31,
        }
        .abi_encode();
        expect_precompile_revert(
            &manager.call(&calldata, ALICE),
            PoolManagerError::insufficient_balance(30, 31),
        );

        assert_eq!(setup.balances(ALICE)?, (30, 0));
        assert_eq!(setup.balances(BOB)?, (20, 0));
        Ok(())
    }

    #[test]
    fn test_failed_swap_discards_pool_update() -> eyre::Result<()> {
        let mut setup = PoolSetup::new(0, 60)?;
        setup.fund(ALICE, 1_000_000, 0)?;
        let pool_id = setup.pool_id;
        setup.manager().add_liquidity(
            ALICE,
            &PositionKey {
                pool_id,
                owner: ALICE,
                tick_lower: 0,
                tick_upper: 60,
                salt: B256::ZERO,
            },
            1_000_000,
        )?;

        // TRADER holds nothing, so settlement fails after the pool has moved
        let calldata = IPoolManager::swapCall {
            poolId: pool_id,
            tickLimit: 60,
        }
        .abi_encode();
        expect_precompile_revert(
            &setup.manager().call(&calldata, TRADER),
            PoolManagerError::insufficient_balance(0, 1_000_000),
        );

        let pool = setup.manager().get_pool(pool_id)?;
        assert_eq!(pool.tick, 0);
        assert_eq!((pool.reserve0, pool.reserve1), (1_000_000, 0));
        assert_eq!(setup.hook().observed_tick(pool_id)?, 0);
        Ok(())
    }
}
