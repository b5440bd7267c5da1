pub mod hashmap;
pub mod slots;

use alloy_primitives::{Address, LogData, U256};

use crate::error::{Result, TickOrderPrecompileError};

/// Marker for a point in the storage journal that writes can be rolled back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageCheckpoint {
    pub(crate) journal_len: usize,
}

pub trait PrecompileStorageProvider {
    fn chain_id(&self) -> u64;
    fn sstore(&mut self, address: Address, key: U256, value: U256) -> Result<()>;
    fn sload(&mut self, address: Address, key: U256) -> Result<U256>;
    fn emit_event(&mut self, address: Address, event: LogData) -> Result<()>;

    /// Opens a checkpoint. Every write and event after it belongs to the checkpoint until it is
    /// committed or reverted.
    fn checkpoint(&mut self) -> StorageCheckpoint;
    /// Keeps everything written since the innermost open checkpoint.
    fn checkpoint_commit(&mut self);
    /// Drops every write and event recorded after `checkpoint`.
    fn checkpoint_revert(&mut self, checkpoint: StorageCheckpoint);
}

pub trait StorageOps {
    fn sstore(&mut self, slot: U256, value: U256) -> Result<()>;
    fn sload(&mut self, slot: U256) -> Result<U256>;
}

/// Runs `f` as a single atomic unit: either every write it makes is kept, or none is.
pub fn transact<S, T>(storage: &mut S, f: impl FnOnce(&mut S) -> Result<T>) -> Result<T>
where
    S: PrecompileStorageProvider,
{
    let checkpoint = storage.checkpoint();
    let result = f(storage);
    settle(storage, checkpoint, result)
}

/// Closes `checkpoint`: committed if `result` is `Ok`, reverted otherwise.
pub fn settle<S, T>(storage: &mut S, checkpoint: StorageCheckpoint, result: Result<T>) -> Result<T>
where
    S: PrecompileStorageProvider,
{
    match result {
        Ok(value) => {
            storage.checkpoint_commit();
            Ok(value)
        }
        Err(err) => {
            storage.checkpoint_revert(checkpoint);
            Err(err)
        }
    }
}

/// Reads a `uint128` field, failing if the slot holds a wider value.
pub(crate) fn word_to_u128(word: U256) -> Result<u128> {
    word.try_into()
        .map_err(|_| TickOrderPrecompileError::Fatal(format!("slot value {word} exceeds u128")))
}
