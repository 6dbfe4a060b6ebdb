/*
 * Copyright 2019-2021 Wren Powell
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::data_store::{BlockId, BlockKey, DataStore};

/// A `DataStore` which stores data in memory.
///
/// Unlike other `DataStore` implementations, data in a `MemoryStore` is not stored persistently
/// and is only accessible to the current process. Clones of a `MemoryStore` share their blocks,
/// which makes it possible to mount the same store again after the file system which owned it is
/// gone. This data store is useful for testing.
///
/// None of the methods in this data store will ever return `Err`.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    blocks: Arc<Mutex<HashMap<BlockKey, Vec<u8>>>>,
}

impl MemoryStore {
    /// Create a new empty `MemoryStore`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the number of blocks in the store.
    pub fn len(&self) -> usize {
        self.blocks().len()
    }

    /// Return whether the store contains no blocks.
    pub fn is_empty(&self) -> bool {
        self.blocks().is_empty()
    }

    fn blocks(&self) -> MutexGuard<'_, HashMap<BlockKey, Vec<u8>>> {
        self.blocks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DataStore for MemoryStore {
    fn write_block(&mut self, key: BlockKey, data: &[u8]) -> anyhow::Result<()> {
        self.blocks().insert(key, data.to_owned());
        Ok(())
    }

    fn read_block(&mut self, key: BlockKey) -> anyhow::Result<Option<Vec<u8>>> {
        Ok(self.blocks().get(&key).cloned())
    }

    fn remove_block(&mut self, key: BlockKey) -> anyhow::Result<()> {
        self.blocks().remove(&key);
        Ok(())
    }

    fn list_blocks(&mut self) -> anyhow::Result<Vec<BlockId>> {
        Ok(self
            .blocks()
            .keys()
            .filter_map(|key| match key {
                BlockKey::Data(id) => Some(*id),
                _ => None,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_blocks() -> anyhow::Result<()> {
        let mut store = MemoryStore::new();
        let mut other = store.clone();
        let id = BlockId::random();

        store.write_block(BlockKey::Data(id), b"block")?;

        assert_eq!(other.read_block(BlockKey::Data(id))?, Some(b"block".to_vec()));
        assert_eq!(other.list_blocks()?, vec![id]);
        Ok(())
    }

    #[test]
    fn list_skips_metadata_blocks() -> anyhow::Result<()> {
        let mut store = MemoryStore::new();
        store.write_block(BlockKey::Super, b"tree")?;
        store.write_block(BlockKey::Version, b"version")?;

        assert!(store.list_blocks()?.is_empty());
        assert_eq!(store.len(), 2);
        Ok(())
    }
}
