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

#![cfg(feature = "store-directory")]

use std::fs::{create_dir_all, read_dir, remove_file, rename, File};
use std::io::{Read, Write};
use std::path::PathBuf;

use anyhow::anyhow;
use uuid::Uuid;

use super::data_store::{BlockId, BlockKey, DataStore};

/// A UUID which acts as the version ID of the directory store format.
const CURRENT_VERSION: &str = "5b0e0f4c-6f1d-4c8e-9d3a-2f6f1c8a7e41";

// The names of top-level files in the data store.
const STORE_DIRECTORY: &str = "store";
const STAGING_DIRECTORY: &str = "stage";
const VERSION_FILE: &str = "version";

fn data_path() -> PathBuf {
    [STORE_DIRECTORY, "data"].iter().collect()
}

fn block_path(key: BlockKey) -> PathBuf {
    match key {
        BlockKey::Data(id) => {
            let uuid_str = id.as_ref().as_hyphenated().to_string();
            data_path().join(&uuid_str[..2]).join(&uuid_str)
        }
        BlockKey::Super => [STORE_DIRECTORY, "super"].iter().collect(),
        BlockKey::Version => [STORE_DIRECTORY, "version"].iter().collect(),
    }
}

/// A `DataStore` which stores data in a directory in the local file system.
///
/// Blocks are written to a staging file first and then renamed into place, so a block is never
/// left half written.
#[derive(Debug)]
#[cfg_attr(docsrs, doc(cfg(feature = "store-directory")))]
pub struct DirectoryStore {
    /// The path of the store's root directory.
    path: PathBuf,
}

impl DirectoryStore {
    /// Open the store in the directory at `path`, creating it if it does not exist.
    ///
    /// # Errors
    /// - `Error::UnsupportedStore`: The directory holds a store in another format.
    /// - `Error::Io`: An I/O error occurred.
    pub fn open(path: impl Into<PathBuf>) -> crate::Result<Self> {
        let path = path.into();
        create_dir_all(path.join(STAGING_DIRECTORY))?;
        create_dir_all(path.join(data_path()))?;

        let version_path = path.join(VERSION_FILE);
        if version_path.exists() {
            let mut version_id = String::new();
            File::open(&version_path)?.read_to_string(&mut version_id)?;
            if version_id != CURRENT_VERSION {
                return Err(crate::Error::UnsupportedStore);
            }
        } else {
            File::create(&version_path)?.write_all(CURRENT_VERSION.as_bytes())?;
        }

        Ok(DirectoryStore { path })
    }

    /// Return the path where a block with the given `key` will be stored.
    fn block_path(&self, key: BlockKey) -> PathBuf {
        self.path.join(block_path(key))
    }

    /// Return a new staging path.
    fn staging_path(&self) -> PathBuf {
        let uuid_str = Uuid::new_v4().as_hyphenated().to_string();
        self.path.join(STAGING_DIRECTORY).join(uuid_str)
    }
}

impl DataStore for DirectoryStore {
    fn write_block(&mut self, key: BlockKey, data: &[u8]) -> anyhow::Result<()> {
        let staging_path = self.staging_path();
        let block_path = self.block_path(key);

        // If this is the first block its sub-directory, the directory needs to be created.
        if let Some(parent) = block_path.parent() {
            create_dir_all(parent)?;
        }

        // Write to a staging file and then atomically move it to its final destination.
        let mut staging_file = File::create(&staging_path)?;
        staging_file.write_all(data)?;
        staging_file.sync_all()?;
        rename(&staging_path, &block_path)?;

        Ok(())
    }

    fn read_block(&mut self, key: BlockKey) -> anyhow::Result<Option<Vec<u8>>> {
        let block_path = self.block_path(key);

        if block_path.exists() {
            let mut file = File::open(block_path)?;
            let mut buffer = Vec::with_capacity(file.metadata()?.len() as usize);
            file.read_to_end(&mut buffer)?;
            Ok(Some(buffer))
        } else {
            Ok(None)
        }
    }

    fn remove_block(&mut self, key: BlockKey) -> anyhow::Result<()> {
        let block_path = self.block_path(key);

        if block_path.exists() {
            remove_file(block_path)?;
        }

        Ok(())
    }

    fn list_blocks(&mut self) -> anyhow::Result<Vec<BlockId>> {
        let mut block_ids = Vec::new();

        for directory_entry in read_dir(self.path.join(data_path()))? {
            for block_entry in read_dir(directory_entry?.path())? {
                let file_name = block_entry?.file_name();
                let id = Uuid::parse_str(
                    file_name
                        .to_str()
                        .ok_or_else(|| anyhow!("Block file name is invalid."))?,
                )
                .map_err(|_| anyhow!("Block file name is invalid."))?;
                block_ids.push(BlockId::new(id));
            }
        }

        Ok(block_ids)
    }
}
