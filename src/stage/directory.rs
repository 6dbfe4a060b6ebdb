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
use std::path::{Path, PathBuf};
use std::sync::Arc;

use walkdir::WalkDir;

use crate::error::Rejection;

use super::target::StagingTarget;
use super::tracker::StagingReport;
use super::{ReadAsset, ReadFuture, Stager, StagingJob};

/// The most files a directory selection may contain by default.
pub const DEFAULT_MAX_SELECTION: usize = 3000;

/// A file from a directory selection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SelectedFile {
    /// The slash-delimited path of the file, starting with the name of the selected folder.
    pub relative_path: String,

    /// Where the bytes of the file can be read from.
    pub location: PathBuf,
}

impl ReadAsset for SelectedFile {
    fn read(&self) -> ReadFuture {
        let location = self.location.clone();
        Box::pin(async move { Ok(tokio::fs::read(location).await?) })
    }
}

/// Return the regular files under the directory at `root` as a selection.
///
/// Like a browser folder picker, every relative path starts with the name of `root` itself.
///
/// # Errors
/// - `Error::InvalidPath`: `root` has no file name or a path is not valid UTF-8.
/// - `Error::Io`: The directory could not be read.
pub fn select_directory(root: impl AsRef<Path>) -> crate::Result<Vec<SelectedFile>> {
    let root = root.as_ref();
    let folder = root
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or(crate::Error::InvalidPath)?;

    let mut files = Vec::new();
    for entry in WalkDir::new(root).min_depth(1) {
        let entry = entry.map_err(io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }

        let mut relative_path = folder.to_owned();
        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(|_| crate::Error::InvalidPath)?;
        for component in relative.components() {
            let name = component
                .as_os_str()
                .to_str()
                .ok_or(crate::Error::InvalidPath)?;
            relative_path.push('/');
            relative_path.push_str(name);
        }

        files.push(SelectedFile {
            relative_path,
            location: entry.into_path(),
        });
    }

    Ok(files)
}

/// Stages the files of a directory selection.
#[derive(Debug, Clone)]
pub struct DirectoryIngester {
    stager: Stager,
    max_files: usize,
}

impl DirectoryIngester {
    /// Create an ingester which stages at most `max_files` files with `stager`.
    pub fn new(stager: Stager, max_files: usize) -> Self {
        DirectoryIngester { stager, max_files }
    }

    /// Reject selections which cannot be a game folder.
    fn check_selection(&self, files: &[SelectedFile]) -> Result<(), Rejection> {
        match files.len() {
            0 => Err(Rejection::NoFiles),
            1 => Err(Rejection::SingleFile),
            count if count > self.max_files => Err(Rejection::TooManyFiles {
                count,
                limit: self.max_files,
            }),
            _ => Ok(()),
        }
    }

    /// Stage the accepted files of a directory selection.
    ///
    /// The selected folder itself is dropped from the staged paths, so
    /// `MyFolder/DATA/HEROES2.AGG` is written to `DATA/HEROES2.AGG` under the data root.
    ///
    /// # Errors
    /// - `Error::Rejected`: The selection is empty, a single file, too large, missing required
    /// files or contains no accepted files. Nothing was written.
    /// - `Error::Incomplete`: Some files could not be written.
    pub async fn ingest(&self, files: Vec<SelectedFile>) -> crate::Result<StagingReport> {
        let messages = self.stager.messages();

        if let Err(rejection) = self.check_selection(&files) {
            messages.warn(rejection.to_string());
            return Err(rejection.into());
        }

        let accepted = files
            .into_iter()
            .filter(|file| self.stager.filter().accept(&file.relative_path))
            .collect::<Vec<_>>();

        if !self
            .stager
            .required()
            .validate(accepted.iter().map(|file| file.relative_path.as_str()))
        {
            messages.warn(Rejection::MissingRequiredFiles.to_string());
            return Err(Rejection::MissingRequiredFiles.into());
        }

        if accepted.is_empty() {
            messages.warn(Rejection::NoMatchingFiles.to_string());
            return Err(Rejection::NoMatchingFiles.into());
        }

        let mut jobs = Vec::with_capacity(accepted.len());
        let mut skipped = Vec::new();
        for file in accepted {
            match StagingTarget::from_asset_path(self.stager.data_root(), &file.relative_path, true)
            {
                Some(target) => jobs.push(StagingJob {
                    target,
                    origin: file.relative_path.clone(),
                    source: Arc::new(file),
                }),
                None => skipped.push(self.stager.invalid_target(&file.relative_path)),
            }
        }

        let report = self.stager.stage_all(jobs, skipped).await;
        if report.is_complete() {
            messages.info("Data bundle looks ok. Ready to run...");
            Ok(report)
        } else {
            Err(crate::Error::Incomplete {
                total: report.total(),
                failed: report.failed,
            })
        }
    }
}
