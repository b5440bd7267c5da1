use alloy_primitives::Address;
use alloy_sol_types::SolInterface;
use revm::precompile::PrecompileResult;

use crate::{
    Precompile, dispatch_call,
    limit_order_hook::{ILimitOrderHook::ILimitOrderHookCalls, LimitOrderHook},
    mutate, mutate_void, settle_call,
    storage::PrecompileStorageProvider,
    view,
};

impl<'a, S: PrecompileStorageProvider> Precompile for LimitOrderHook<'a, S> {
    fn call(&mut self, calldata: &[u8], msg_sender: Address) -> PrecompileResult {
        let checkpoint = self.storage.checkpoint();

        let result = dispatch_call(calldata, ILimitOrderHookCalls::abi_decode, |call| match call {
            ILimitOrderHookCalls::place(call) => mutate(call, msg_sender, |s, c| {
                self.place(s, c.poolId, c.tickLower, c.zeroForOne, c.liquidity)
            }),
            ILimitOrderHookCalls::kill(call) => mutate(call, msg_sender, |s, c| {
                let (amount0, amount1) = self.kill(s, c.poolId, c.tickLower, c.zeroForOne, c.to)?;
                Ok((amount0, amount1).into())
            }),
            ILimitOrderHookCalls::withdraw(call) => mutate(call, msg_sender, |s, c| {
                let (amount0, amount1) = self.withdraw(s, c.orderId, c.to)?;
                Ok((amount0, amount1).into())
            }),
            ILimitOrderHookCalls::afterInitialize(call) => mutate_void(call, msg_sender, |s, c| {
                self.after_initialize(s, c.poolId, c.tick)
            }),
            ILimitOrderHookCalls::afterSwap(call) => {
                mutate_void(call, msg_sender, |s, c| self.after_swap(s, c.poolId, c.tick))
            }
            ILimitOrderHookCalls::orderAt(call) => {
                view(call, |c| self.order_at(c.poolId, c.tickLower, c.zeroForOne))
            }
            ILimitOrderHookCalls::getOrder(call) => {
                view(call, |c| self.get_order(c.orderId).map(Into::into))
            }
            ILimitOrderHookCalls::contributionOf(call) => {
                view(call, |c| self.contribution_of(c.orderId, c.depositor))
            }
            ILimitOrderHookCalls::nextOrderId(call) => view(call, |_| self.next_order_id()),
            ILimitOrderHookCalls::observedTick(call) => {
                view(call, |c| self.observed_tick(c.poolId))
            }
        });

        settle_call(self.storage, checkpoint, result)
    }
}
