//! Limit-order hook and pool manager precompile implementations.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod error;
pub use error::{IntoPrecompileResult, Result, TickOrderPrecompileError};

pub mod storage;

pub mod limit_order_hook;
pub mod pool_manager;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_util;

use alloy_primitives::{Address, Bytes};
use alloy_sol_types::SolCall;
use revm::precompile::{PrecompileError, PrecompileResult};

pub use tickorder_contracts::precompiles::{LIMIT_ORDER_HOOK_ADDRESS, POOL_MANAGER_ADDRESS};

use crate::storage::{PrecompileStorageProvider, StorageCheckpoint};

pub const METADATA_GAS: u64 = 50;
pub const VIEW_FUNC_GAS: u64 = 100;
pub const MUTATE_FUNC_GAS: u64 = 1000;

/// Input per word cost. It covers abi decoding and cloning of input into call data.
pub const INPUT_PER_WORD_COST: u64 = 6;

#[inline]
pub fn input_cost(calldata_len: usize) -> u64 {
    calldata_len
        .div_ceil(32)
        .saturating_mul(INPUT_PER_WORD_COST as usize) as u64
}

pub trait Precompile {
    fn call(&mut self, calldata: &[u8], msg_sender: Address) -> PrecompileResult;
}

/// Closes the checkpoint opened for a dispatched call: storage written by a call that fails is
/// discarded.
#[inline]
fn settle_call<S: PrecompileStorageProvider>(
    storage: &mut S,
    checkpoint: StorageCheckpoint,
    result: PrecompileResult,
) -> PrecompileResult {
    match result {
        Ok(_) => storage.checkpoint_commit(),
        Err(_) => storage.checkpoint_revert(checkpoint),
    }
    result
}

#[inline]
fn metadata<T: SolCall>(f: impl FnOnce() -> Result<T::Return>) -> PrecompileResult {
    f().into_precompile_result(METADATA_GAS, |ret| T::abi_encode_returns(&ret).into())
}

#[inline]
fn view<T: SolCall>(call: T, f: impl FnOnce(T) -> Result<T::Return>) -> PrecompileResult {
    f(call).into_precompile_result(VIEW_FUNC_GAS, |ret| T::abi_encode_returns(&ret).into())
}

#[inline]
fn mutate<T: SolCall>(
    call: T,
    sender: Address,
    f: impl FnOnce(Address, T) -> Result<T::Return>,
) -> PrecompileResult {
    f(sender, call).into_precompile_result(MUTATE_FUNC_GAS, |ret| T::abi_encode_returns(&ret).into())
}

#[inline]
fn mutate_void<T: SolCall>(
    call: T,
    sender: Address,
    f: impl FnOnce(Address, T) -> Result<()>,
) -> PrecompileResult {
    f(sender, call).into_precompile_result(MUTATE_FUNC_GAS, |()| Bytes::new())
}

/// Helper function to return an unknown function selector error.
#[inline]
pub fn unknown_selector(selector: [u8; 4]) -> PrecompileResult {
    Err::<(), _>(TickOrderPrecompileError::UnknownFunctionSelector(selector))
        .into_precompile_result(0, |()| Bytes::new())
}

/// Decodes `calldata` into the interface's call enum and hands it to `f`, charging for the input.
#[inline]
fn dispatch_call<T>(
    calldata: &[u8],
    decode: impl FnOnce(&[u8]) -> core::result::Result<T, alloy_sol_types::Error>,
    f: impl FnOnce(T) -> PrecompileResult,
) -> PrecompileResult {
    if calldata.len() < 4 {
        return Err(PrecompileError::Other(
            "Invalid input: missing function selector".into(),
        ));
    }

    match decode(calldata) {
        Ok(call) => f(call).map(|mut output| {
            output.gas_used = output.gas_used.saturating_add(input_cost(calldata.len()));
            output
        }),
        Err(alloy_sol_types::Error::UnknownSelector { selector, .. }) => {
            unknown_selector(selector.0)
        }
        Err(e) => Err(PrecompileError::Other(format!("Failed to decode input: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{limit_order_hook::LimitOrderHook, storage::hashmap::HashMapStorageProvider};
    use alloy_primitives::{U256, hex};
    use alloy_sol_types::SolError;
    use revm::precompile::PrecompileOutput;
    use tickorder_contracts::precompiles::UnknownFunctionSelector;

    #[test]
    fn test_input_cost() {
        assert_eq!(input_cost(0), 0);
        assert_eq!(input_cost(4), INPUT_PER_WORD_COST);
        assert_eq!(input_cost(36), 2 * INPUT_PER_WORD_COST);
    }

    #[test]
    fn test_missing_selector() {
        let mut storage = HashMapStorageProvider::new(1);
        let result = LimitOrderHook::new(&mut storage).call(&[0x01, 0x02], Address::ZERO);
        assert!(matches!(result, Err(PrecompileError::Other(msg)) if msg.contains("missing function selector")));
    }

    #[test]
    fn test_unknown_selector() {
        let mut storage = HashMapStorageProvider::new(1);
        let result = LimitOrderHook::new(&mut storage).call(&[0xde, 0xad, 0xbe, 0xef], Address::ZERO);
        let expected = hex::encode(UnknownFunctionSelector::new([0xde, 0xad, 0xbe, 0xef]).abi_encode());
        assert_eq!(result, Err(PrecompileError::Other(expected)));
    }

    #[test]
    fn test_failed_call_discards_writes() -> eyre::Result<()> {
        let mut storage = HashMapStorageProvider::new(1);

        let checkpoint = storage.checkpoint();
        storage.sstore(LIMIT_ORDER_HOOK_ADDRESS, U256::ZERO, U256::ONE)?;
        let result = settle_call(
            &mut storage,
            checkpoint,
            Err(PrecompileError::Other("revert".to_string())),
        );
        assert!(result.is_err());
        assert_eq!(storage.sload(LIMIT_ORDER_HOOK_ADDRESS, U256::ZERO)?, U256::ZERO);

        let checkpoint = storage.checkpoint();
        storage.sstore(LIMIT_ORDER_HOOK_ADDRESS, U256::ZERO, U256::ONE)?;
        let result = settle_call(
            &mut storage,
            checkpoint,
            Ok(PrecompileOutput::new(0, Bytes::new())),
        );
        assert!(result.is_ok());
        assert_eq!(storage.sload(LIMIT_ORDER_HOOK_ADDRESS, U256::ZERO)?, U256::ONE);
        Ok(())
    }
}
