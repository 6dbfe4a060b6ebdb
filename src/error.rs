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

use std::io;
use std::result;

use relative_path::RelativePathBuf;
use thiserror::Error as DeriveError;

use crate::runtime::RunDependency;

/// A reason a user selection was refused before anything was written.
///
/// Rejections are recoverable: the user can simply make another selection.
#[derive(Debug, Clone, PartialEq, Eq, DeriveError)]
pub enum Rejection {
    /// The selection contained no files.
    #[error("No files selected")]
    NoFiles,

    /// A single file was selected where a directory was expected.
    #[error("A single file was selected; zip archives must be staged as archives")]
    SingleFile,

    /// The selection contained more files than a data directory plausibly would.
    #[error("Wrong directory, or your maps collection is really awesome ({count} files, limit is {limit})")]
    TooManyFiles { count: usize, limit: usize },

    /// No file in the selection belongs to a whitelisted folder.
    #[error("No game data found in the selection")]
    NoMatchingFiles,

    /// The selection is missing one of the mandatory data files.
    #[error("Required data not found in directory")]
    MissingRequiredFiles,

    /// Game data is already staged and has to be removed before staging another selection.
    #[error("Game data is already present; remove it before staging new data")]
    DataPresent,
}

/// A file which could not be staged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingFailure {
    /// The path the file would have been written to.
    pub path: RelativePathBuf,

    /// A description of the last error encountered.
    pub reason: String,
}

/// The error type for operations in this crate.
#[derive(Debug, DeriveError)]
pub enum Error {
    /// A resource already exists.
    #[error("A resource already exists.")]
    AlreadyExists,

    /// A resource was not found.
    #[error("A resource was not found.")]
    NotFound,

    /// The provided file path is invalid.
    #[error("The provided file path is invalid.")]
    InvalidPath,

    /// The directory is not empty.
    #[error("The directory is not empty.")]
    NotEmpty,

    /// The file is not a directory.
    #[error("The file is not a directory.")]
    NotDirectory,

    /// The file is not a regular file.
    #[error("The file is not a regular file.")]
    NotFile,

    /// No data store is mounted at the given path.
    #[error("No data store is mounted at the given path.")]
    NotMounted,

    /// The data store is in a format this version of the library does not support.
    #[error("The data store is in an unsupported format.")]
    UnsupportedStore,

    /// The data in the data store is corrupt.
    #[error("The data store is corrupt.")]
    Corrupt,

    /// A value could not be serialized.
    #[error("A value could not be serialized.")]
    Serialize,

    /// An error occurred with the data store.
    #[error("{0}")]
    Store(anyhow::Error),

    /// Synchronizing the file system with its data store failed.
    #[error("Failed to sync FS: {0}")]
    Sync(#[source] Box<Error>),

    /// A selection was refused before staging started.
    #[error("{0}")]
    Rejected(#[from] Rejection),

    /// The archive could not be read.
    #[error("Could not read the zip archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Some files of a staging pass could not be written.
    #[error("{} of {total} files could not be staged.", .failed.len())]
    Incomplete {
        failed: Vec<StagingFailure>,
        total: usize,
    },

    /// Some entries could not be removed while clearing a directory.
    #[error("{failures} entries could not be removed.")]
    Clear { failures: usize },

    /// Another staging or clearing operation is already in progress.
    #[error("Another operation is already in progress.")]
    Busy,

    /// A downloaded archive did not have the expected digest.
    #[error("Bad hash: expected {expected}, got {actual}")]
    HashMismatch { expected: String, actual: String },

    /// A download failed.
    #[error("Download failed: {0}")]
    Fetch(anyhow::Error),

    /// The binary requested a file the launcher does not know how to locate.
    #[error("Unknown file [{0}] requested by the module")]
    UnknownFile(String),

    /// The entry point was requested while run dependencies are outstanding.
    #[error("Run dependencies are still pending: {0:?}")]
    DependenciesPending(Vec<RunDependency>),

    /// The binary's entry point returned an error.
    #[error("{0}")]
    Runtime(anyhow::Error),

    /// An I/O error occurred.
    #[error("{0}")]
    Io(#[from] io::Error),
}

/// The result type for operations in this crate.
pub type Result<T> = result::Result<T, Error>;
