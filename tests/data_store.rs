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

use rstest::*;

#[cfg(feature = "store-directory")]
use asset_stage::store::DirectoryStore;
use asset_stage::store::{BlockId, BlockKey, DataStore, MemoryStore};
#[cfg(feature = "store-directory")]
use common::{directory_store, WithTempDir};
use common::{assert_contains_all, memory_store};

mod common;

fn read_block(mut store: impl DataStore) -> anyhow::Result<()> {
    let key = BlockKey::Data(BlockId::random());

    assert_eq!(store.read_block(key)?, None);

    store.write_block(key, b"block")?;

    assert_eq!(store.read_block(key)?, Some(b"block".to_vec()));

    Ok(())
}

fn overwrite_block(mut store: impl DataStore) -> anyhow::Result<()> {
    store.write_block(BlockKey::Super, b"first tree")?;
    store.write_block(BlockKey::Super, b"second tree")?;

    assert_eq!(
        store.read_block(BlockKey::Super)?,
        Some(b"second tree".to_vec())
    );

    Ok(())
}

fn remove_block(mut store: impl DataStore) -> anyhow::Result<()> {
    let key = BlockKey::Data(BlockId::random());
    store.write_block(key, b"block")?;
    store.remove_block(key)?;
    assert_eq!(store.read_block(key)?, None);

    // Removing a nonexistent block should return `Ok`.
    store.remove_block(BlockKey::Data(BlockId::random()))?;

    Ok(())
}

fn list_blocks(mut store: impl DataStore) -> anyhow::Result<()> {
    let id1 = BlockId::random();
    let id2 = BlockId::random();
    let id3 = BlockId::random();

    assert_eq!(store.list_blocks()?, Vec::new());

    store.write_block(BlockKey::Data(id1), b"one")?;
    store.write_block(BlockKey::Data(id2), b"two")?;
    store.write_block(BlockKey::Data(id3), b"three")?;
    store.write_block(BlockKey::Version, b"version")?;

    assert_contains_all(store.list_blocks()?, vec![id1, id2, id3]);

    Ok(())
}

#[rstest]
fn memory_read_block(memory_store: MemoryStore) -> anyhow::Result<()> {
    read_block(memory_store)
}

#[rstest]
fn memory_overwrite_block(memory_store: MemoryStore) -> anyhow::Result<()> {
    overwrite_block(memory_store)
}

#[rstest]
fn memory_remove_block(memory_store: MemoryStore) -> anyhow::Result<()> {
    remove_block(memory_store)
}

#[rstest]
fn memory_list_blocks(memory_store: MemoryStore) -> anyhow::Result<()> {
    list_blocks(memory_store)
}

#[rstest]
#[cfg(feature = "store-directory")]
fn directory_read_block(directory_store: WithTempDir<DirectoryStore>) -> anyhow::Result<()> {
    read_block(directory_store.value)
}

#[rstest]
#[cfg(feature = "store-directory")]
fn directory_overwrite_block(directory_store: WithTempDir<DirectoryStore>) -> anyhow::Result<()> {
    overwrite_block(directory_store.value)
}

#[rstest]
#[cfg(feature = "store-directory")]
fn directory_remove_block(directory_store: WithTempDir<DirectoryStore>) -> anyhow::Result<()> {
    remove_block(directory_store.value)
}

#[rstest]
#[cfg(feature = "store-directory")]
fn directory_list_blocks(directory_store: WithTempDir<DirectoryStore>) -> anyhow::Result<()> {
    list_blocks(directory_store.value)
}

#[test]
#[cfg(feature = "store-directory")]
fn directory_store_can_be_reopened() -> anyhow::Result<()> {
    let directory = tempfile::tempdir()?;
    let path = directory.path().join("store");
    let key = BlockKey::Data(BlockId::random());

    let mut store = DirectoryStore::open(&path)?;
    store.write_block(key, b"block")?;
    drop(store);

    let mut store = DirectoryStore::open(&path)?;
    assert_eq!(store.read_block(key)?, Some(b"block".to_vec()));
    Ok(())
}

#[test]
#[cfg(feature = "store-directory")]
fn directory_store_with_other_version_is_unsupported() -> anyhow::Result<()> {
    let directory = tempfile::tempdir()?;
    let path = directory.path().join("store");
    std::fs::create_dir_all(&path)?;
    std::fs::write(path.join("version"), "not a version")?;

    let result = DirectoryStore::open(path);

    assert!(matches!(result, Err(asset_stage::Error::UnsupportedStore)));
    Ok(())
}
