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

use std::io::{Cursor, Read};
use std::sync::Arc;

use tokio::task::spawn_blocking;
use zip::ZipArchive;

use crate::error::Rejection;

use super::target::StagingTarget;
use super::tracker::StagingReport;
use super::{ReadAsset, ReadFuture, Stager, StagingJob};

type Archive = ZipArchive<Cursor<Arc<[u8]>>>;

/// The most bytes reserved up front for an entry, whatever size its header declares.
const MAX_PREALLOCATION: u64 = 16 * 1024 * 1024;

/// Return how many bytes to reserve for an entry which declares `size` uncompressed bytes.
fn preallocation(size: u64) -> usize {
    size.min(MAX_PREALLOCATION) as usize
}

/// One entry of an archive which is decompressed on the blocking thread pool.
struct ArchiveEntry {
    archive: Archive,
    index: usize,
}

impl ReadAsset for ArchiveEntry {
    fn read(&self) -> ReadFuture {
        let mut archive = self.archive.clone();
        let index = self.index;
        Box::pin(async move {
            spawn_blocking(move || -> anyhow::Result<Vec<u8>> {
                let mut file = archive.by_index(index)?;
                let mut data = Vec::with_capacity(preallocation(file.size()));
                file.read_to_end(&mut data)?;
                Ok(data)
            })
            .await?
        })
    }
}

/// Return whether all accepted `names` are inside the same top-level folder.
fn has_common_root(names: &[String]) -> bool {
    let mut roots = names.iter().map(|name| name.split_once('/').map(|(root, _)| root));
    let first = match roots.next() {
        Some(Some(root)) => root,
        _ => return false,
    };

    roots.all(|root| root == Some(first))
}

/// Stages the contents of a zip archive.
#[derive(Debug, Clone)]
pub struct ArchiveIngester {
    stager: Stager,
}

impl ArchiveIngester {
    /// Create an ingester which stages files with `stager`.
    pub fn new(stager: Stager) -> Self {
        ArchiveIngester { stager }
    }

    /// Stage the accepted entries of the zip `archive`.
    ///
    /// If every accepted entry is inside the same top-level folder, that folder is dropped from
    /// the staged paths. Directory entries are never staged; the directories a file needs are
    /// created when it is written.
    ///
    /// # Errors
    /// - `Error::Archive`: The archive could not be read. Nothing was written.
    /// - `Error::Rejected`: The archive contains no accepted entries or is missing required
    /// files. Nothing was written.
    /// - `Error::Incomplete`: Some entries could not be written.
    pub async fn ingest(&self, archive: impl Into<Arc<[u8]>>) -> crate::Result<StagingReport> {
        let messages = self.stager.messages();
        let mut archive = match ZipArchive::new(Cursor::new(archive.into())) {
            Ok(archive) => archive,
            Err(error) => {
                messages.warn(format!("Failed to read zip archive: {}", error));
                return Err(error.into());
            }
        };

        let mut accepted = Vec::new();
        for index in 0..archive.len() {
            let name = archive.by_index_raw(index)?.name().to_owned();
            if self.stager.filter().accept(&name) {
                accepted.push((index, name));
            }
        }

        if accepted.is_empty() {
            messages.warn(Rejection::NoMatchingFiles.to_string());
            return Err(Rejection::NoMatchingFiles.into());
        }

        if !self
            .stager
            .required()
            .validate(accepted.iter().map(|(_, name)| name.as_str()))
        {
            messages.warn(Rejection::MissingRequiredFiles.to_string());
            return Err(Rejection::MissingRequiredFiles.into());
        }

        let names = accepted
            .iter()
            .map(|(_, name)| name.clone())
            .collect::<Vec<_>>();
        let strip_root = has_common_root(&names);

        let mut jobs = Vec::with_capacity(accepted.len());
        let mut skipped = Vec::new();
        for (index, name) in accepted {
            match StagingTarget::from_asset_path(self.stager.data_root(), &name, strip_root) {
                Some(target) => jobs.push(StagingJob {
                    target,
                    origin: String::from("provided zip archive"),
                    source: Arc::new(ArchiveEntry {
                        archive: archive.clone(),
                        index,
                    }),
                }),
                None => skipped.push(self.stager.invalid_target(&name)),
            }
        }

        let report = self.stager.stage_all(jobs, skipped).await;
        if report.is_complete() {
            messages.info("Data bundle looks ok. Continue initialization...");
            Ok(report)
        } else {
            Err(crate::Error::Incomplete {
                total: report.total(),
                failed: report.failed,
            })
        }
    }
}
