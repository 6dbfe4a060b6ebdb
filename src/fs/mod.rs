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

//! An in-memory file system with durable mount points.
//!
//! A [`VirtualFs`] holds the tree of files and directories the game binary reads from. Directories
//! are created with [`VirtualFs::mkdir`] or, when some ancestors may be missing,
//! [`VirtualFs::ensure_directory`]. A [`DataStore`] mounted at a directory makes that subtree
//! durable: syncing with [`SyncDirection::Persist`] writes it to the store and
//! [`SyncDirection::Load`] reads it back, typically when the launcher starts again.
//!
//! [`DataStore`]: crate::store::DataStore

pub use self::entry::{Entry, FileType, Times};
pub use self::filesystem::{virtual_path, SyncDirection, VirtualFs};

mod entry;
mod filesystem;
mod path_tree;
mod sync;
