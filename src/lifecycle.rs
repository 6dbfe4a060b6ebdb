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

//! Mounting, persisting and clearing the data root.

use std::sync::Arc;

use relative_path::{RelativePath, RelativePathBuf};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::warn;

use crate::fs::{SyncDirection, VirtualFs};
use crate::message::MessageLog;
use crate::runtime::{RunDependencies, RunDependency};
use crate::store::DataStore;

/// Whether game data is available in the data root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataState {
    /// The data root is empty.
    Absent,

    /// A selection is being staged.
    Staging,

    /// The data root contains staged data.
    Present,

    /// The data root is being cleared.
    Clearing,
}

/// Manages the mount point holding the data root.
///
/// Clones share the same file system.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    fs: Arc<Mutex<VirtualFs>>,
    home: RelativePathBuf,
    data_root: RelativePathBuf,
    dependencies: RunDependencies,
    messages: MessageLog,
}

impl Lifecycle {
    /// Create a lifecycle which mounts a store at `home` and looks for data in `data_root`.
    pub fn new(
        fs: Arc<Mutex<VirtualFs>>,
        home: RelativePathBuf,
        data_root: RelativePathBuf,
        dependencies: RunDependencies,
        messages: MessageLog,
    ) -> Self {
        Lifecycle {
            fs,
            home,
            data_root,
            dependencies,
            messages,
        }
    }

    /// The directory the data store is mounted at.
    pub fn home(&self) -> &RelativePath {
        &self.home
    }

    /// The directory game data is staged into.
    pub fn data_root(&self) -> &RelativePath {
        &self.data_root
    }

    /// Mount `store` at the home directory and load what it holds.
    ///
    /// The [`RunDependency::FsSync`] gate is pending until loading has succeeded. If no data is
    /// found, the [`RunDependency::Data`] gate is added.
    ///
    /// # Errors
    /// - `Error::Sync`: The store could not be loaded.
    /// - `Error::AlreadyExists`: A store is already mounted at the home directory.
    pub async fn mount(&self, store: impl DataStore + 'static) -> crate::Result<DataState> {
        self.dependencies.add(RunDependency::FsSync);
        let state = self.mount_and_load(store).await?;
        self.dependencies.remove(RunDependency::FsSync);

        self.update_data_gate(state);
        Ok(state)
    }

    async fn mount_and_load(&self, store: impl DataStore + 'static) -> crate::Result<DataState> {
        {
            let mut fs = self.fs.lock().await;
            fs.ensure_directory(&self.home)?;
            fs.mount(&self.home, store)?;
        }
        self.reload().await?;
        self.check_presence().await
    }

    /// Add or remove the [`RunDependency::Data`] gate to match `state`.
    pub fn update_data_gate(&self, state: DataState) {
        match state {
            DataState::Present => self.dependencies.remove(RunDependency::Data),
            _ => self.dependencies.add(RunDependency::Data),
        }
    }

    /// Return whether the data root contains anything.
    ///
    /// A missing data root is created empty.
    pub async fn check_presence(&self) -> crate::Result<DataState> {
        let mut fs = self.fs.lock().await;
        self.messages.info(format!("Looking up data in [/{}]", self.data_root));

        match fs.list(&self.data_root) {
            Ok(children) if !children.is_empty() => {
                self.messages.info("Local data found we are ready to start...");
                Ok(DataState::Present)
            }
            Ok(_) => {
                self.messages.info("No local data found...");
                Ok(DataState::Absent)
            }
            Err(crate::Error::NotFound) => {
                fs.ensure_directory(&self.data_root)?;
                self.messages.info("No local data found...");
                Ok(DataState::Absent)
            }
            Err(error) => Err(error),
        }
    }

    async fn sync(&self, direction: SyncDirection) -> crate::Result<()> {
        let mut fs = self.fs.lock().await;
        fs.sync(direction).map_err(|error| {
            self.messages.warn("Failed to sync FS");
            warn!(error = %error, direction = ?direction, "Sync failed");
            crate::Error::Sync(Box::new(error))
        })
    }

    /// Write the mounted file system to its store.
    ///
    /// # Errors
    /// - `Error::Sync`: The store could not be written.
    pub async fn persist(&self) -> crate::Result<()> {
        self.sync(SyncDirection::Persist).await
    }

    /// Replace the mounted file system with what its store holds.
    ///
    /// # Errors
    /// - `Error::Sync`: The store could not be read.
    pub async fn reload(&self) -> crate::Result<()> {
        self.sync(SyncDirection::Load).await
    }

    /// Remove everything under `base`, including `base` itself.
    ///
    /// This keeps going when something cannot be removed. Each failure is logged, and the number
    /// of failures is returned.
    pub async fn clear(&self, base: impl AsRef<RelativePath>) -> usize {
        let mut fs = self.fs.lock().await;
        clear_tree(&mut fs, base.as_ref(), &self.messages)
    }

    /// Clear the data root and persist it as an empty directory.
    ///
    /// Nothing is persisted unless everything under the data root could be removed.
    ///
    /// # Errors
    /// - `Error::Clear`: Some entries could not be removed.
    /// - `Error::Sync`: The store could not be written.
    pub async fn remove_data(&self) -> crate::Result<()> {
        {
            let mut fs = self.fs.lock().await;
            let failures = clear_tree(&mut fs, &self.data_root, &self.messages);
            if failures > 0 {
                self.messages.warn("Failed to remove stored data");
                return Err(crate::Error::Clear { failures });
            }
            fs.ensure_directory(&self.data_root)?;
        }
        self.persist().await?;
        self.dependencies.add(RunDependency::Data);
        Ok(())
    }
}

/// Recursively remove `base` from `fs`, returning the number of failures.
fn clear_tree(fs: &mut VirtualFs, base: &RelativePath, messages: &MessageLog) -> usize {
    let children = match fs.list(base) {
        Ok(children) => children,
        Err(crate::Error::NotDirectory) => {
            return remove_logged(fs.unlink(base), base, messages);
        }
        Err(error) => {
            messages.warn(format!("Failed to clear /{}: {}", base, error));
            return 1;
        }
    };

    let mut failures = 0;
    for child in children {
        messages.info(format!("Clearing /{}", child));
        failures += clear_tree(fs, &child, messages);
    }

    if failures == 0 {
        failures += remove_logged(fs.rmdir(base), base, messages);
    }
    failures
}

fn remove_logged(result: crate::Result<()>, path: &RelativePath, messages: &MessageLog) -> usize {
    match result {
        Ok(()) => 0,
        Err(error) => {
            messages.warn(format!("Failed to remove /{}: {}", path, error));
            1
        }
    }
}
