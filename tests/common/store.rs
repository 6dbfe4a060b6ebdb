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

use std::ops::{Deref, DerefMut};

use anyhow::anyhow;
use rstest::*;
use tempfile::TempDir;

use asset_stage::store::{BlockId, BlockKey, DataStore, MemoryStore};
#[cfg(feature = "store-directory")]
use asset_stage::store::DirectoryStore;

/// A value which is tied to the lifetime of a temporary directory.
pub struct WithTempDir<T> {
    pub directory: TempDir,
    pub value: T,
}

impl<T> Deref for WithTempDir<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

impl<T> DerefMut for WithTempDir<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.value
    }
}

#[fixture]
pub fn memory_store() -> MemoryStore {
    MemoryStore::new()
}

#[cfg(feature = "store-directory")]
#[fixture]
pub fn directory_store() -> WithTempDir<DirectoryStore> {
    let directory = tempfile::tempdir().unwrap();
    let store = DirectoryStore::open(directory.as_ref().join("store")).unwrap();
    WithTempDir {
        directory,
        value: store,
    }
}

/// A `DataStore` which fails every write but reads from an inner `MemoryStore`.
#[derive(Debug, Clone, Default)]
pub struct ReadOnlyStore {
    pub inner: MemoryStore,
}

impl DataStore for ReadOnlyStore {
    fn write_block(&mut self, _key: BlockKey, _data: &[u8]) -> anyhow::Result<()> {
        Err(anyhow!("The store is read-only."))
    }

    fn read_block(&mut self, key: BlockKey) -> anyhow::Result<Option<Vec<u8>>> {
        self.inner.read_block(key)
    }

    fn remove_block(&mut self, _key: BlockKey) -> anyhow::Result<()> {
        Err(anyhow!("The store is read-only."))
    }

    fn list_blocks(&mut self) -> anyhow::Result<Vec<BlockId>> {
        self.inner.list_blocks()
    }
}
