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

use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::store::BlockId;

/// A type of file in a `VirtualFs`.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum FileType {
    /// A regular file.
    File,

    /// A directory.
    Directory,
}

/// The timestamps of an entry.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize, Deserialize)]
pub struct Times {
    /// The time the file was last accessed.
    pub accessed: SystemTime,

    /// The time the file's entry was last changed.
    pub changed: SystemTime,

    /// The time the file's contents were last modified.
    pub modified: SystemTime,
}

impl Times {
    /// Return timestamps which are all set to the current time.
    pub fn now() -> Self {
        let now = SystemTime::now();
        Times {
            accessed: now,
            changed: now,
            modified: now,
        }
    }
}

/// An entry in a `VirtualFs` which represents a file or directory.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Serialize, Deserialize)]
pub struct Entry {
    /// The type of file this entry represents.
    pub file_type: FileType,

    /// The timestamps of the file.
    pub times: Times,
}

impl Entry {
    /// Create an `Entry` for a new regular file.
    pub fn file() -> Self {
        Entry {
            file_type: FileType::File,
            times: Times::now(),
        }
    }

    /// Create an `Entry` for a new directory.
    pub fn directory() -> Self {
        Entry {
            file_type: FileType::Directory,
            times: Times::now(),
        }
    }

    /// Return whether this entry is a regular file.
    pub fn is_file(&self) -> bool {
        self.file_type == FileType::File
    }

    /// Return whether this entry is a directory.
    pub fn is_directory(&self) -> bool {
        self.file_type == FileType::Directory
    }
}

/// The contents of a regular file held in memory.
#[derive(Debug, Clone)]
pub(super) struct Contents {
    /// The block the contents are persisted to when the file system is synced.
    ///
    /// Every write gets a new block, so an unchanged file is never written to the store twice.
    pub block: BlockId,

    /// The bytes of the file.
    pub data: Vec<u8>,
}

/// A node of the in-memory tree.
#[derive(Debug, Clone)]
pub(super) struct Node {
    pub entry: Entry,
    pub contents: Option<Contents>,
}

/// A node of the tree persisted in a data store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(super) struct StoredNode {
    pub entry: Entry,
    pub block: Option<BlockId>,
}
