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

//! Durable backing stores for the virtual file system.
//!
//! A data store provides only the most basic storage operations: reading, writing, removing and
//! listing blocks of bytes. The [`VirtualFs`] decides what goes into those blocks when a mount
//! point is synced. Data stores are meant to be easy to implement so that providing support for
//! new storage backends is relatively painless.
//!
//! All data stores implement the [`DataStore`] trait.
//!
//! [`VirtualFs`]: crate::fs::VirtualFs
//! [`DataStore`]: crate::store::DataStore

pub use self::data_store::{BlockId, BlockKey, DataStore};
#[cfg(feature = "store-directory")]
pub use self::directory_store::DirectoryStore;
pub use self::memory_store::MemoryStore;

mod data_store;
mod directory_store;
mod memory_store;
