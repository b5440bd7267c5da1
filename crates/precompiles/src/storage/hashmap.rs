use std::collections::HashMap;

use alloy_primitives::{Address, LogData, U256};

use crate::{
    error::Result,
    storage::{PrecompileStorageProvider, StorageCheckpoint},
};

#[derive(Debug)]
enum JournalEntry {
    /// A slot was written; `previous` is `None` if it had never been written before.
    StorageChanged {
        address: Address,
        key: U256,
        previous: Option<U256>,
    },
    Log {
        address: Address,
    },
}

/// In-memory storage backend with revertible writes.
#[derive(Debug, Default)]
pub struct HashMapStorageProvider {
    internals: HashMap<(Address, U256), U256>,
    pub events: HashMap<Address, Vec<LogData>>,
    journal: Vec<JournalEntry>,
    depth: usize,
    chain_id: u64,
}

impl HashMapStorageProvider {
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            ..Default::default()
        }
    }

    /// Returns the events emitted by `address`, oldest first.
    pub fn events_of(&self, address: Address) -> &[LogData] {
        self.events.get(&address).map(Vec::as_slice).unwrap_or_default()
    }
}

impl PrecompileStorageProvider for HashMapStorageProvider {
    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    fn sstore(&mut self, address: Address, key: U256, value: U256) -> Result<()> {
        let previous = self.internals.insert((address, key), value);
        if self.depth > 0 {
            self.journal.push(JournalEntry::StorageChanged {
                address,
                key,
                previous,
            });
        }
        Ok(())
    }

    fn sload(&mut self, address: Address, key: U256) -> Result<U256> {
        Ok(self
            .internals
            .get(&(address, key))
            .copied()
            .unwrap_or(U256::ZERO))
    }

    fn emit_event(&mut self, address: Address, event: LogData) -> Result<()> {
        self.events.entry(address).or_default().push(event);
        if self.depth > 0 {
            self.journal.push(JournalEntry::Log { address });
        }
        Ok(())
    }

    fn checkpoint(&mut self) -> StorageCheckpoint {
        self.depth += 1;
        StorageCheckpoint {
            journal_len: self.journal.len(),
        }
    }

    fn checkpoint_commit(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        if self.depth == 0 {
            self.journal.clear();
        }
    }

    fn checkpoint_revert(&mut self, checkpoint: StorageCheckpoint) {
        while self.journal.len() > checkpoint.journal_len {
            match self.journal.pop() {
                Some(JournalEntry::StorageChanged {
                    address,
                    key,
                    previous,
                }) => match previous {
                    Some(value) => {
                        self.internals.insert((address, key), value);
                    }
                    None => {
                        self.internals.remove(&(address, key));
                    }
                },
                Some(JournalEntry::Log { address }) => {
                    if let Some(logs) = self.events.get_mut(&address) {
                        logs.pop();
                    }
                }
                None => break,
            }
        }
        self.depth = self.depth.saturating_sub(1);
    }
}
