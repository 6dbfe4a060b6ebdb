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

//! Staging of user selections into the virtual file system.
//!
//! A selection is a directory tree picked by the user ([`DirectoryIngester`]) or a zip archive
//! ([`ArchiveIngester`]). Both go through the same steps: every path is run through the
//! [`PathFilter`], the accepted paths are checked against the [`RequiredFiles`], and each accepted
//! file is then written to its [`StagingTarget`] under the data root by its own task. A
//! [`CompletionTracker`] decides when every task has reported back.
//!
//! Staging only changes the in-memory file system. Making the result durable is up to the caller.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use relative_path::RelativePathBuf;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::warn;

pub use self::archive::ArchiveIngester;
pub use self::directory::{
    select_directory, DirectoryIngester, SelectedFile, DEFAULT_MAX_SELECTION,
};
pub use self::filter::{PathFilter, DEFAULT_WHITELIST};
pub use self::required::{RequiredFiles, DEFAULT_REQUIRED_FILES};
pub use self::target::StagingTarget;
pub use self::tracker::{CompletionTracker, Outcome, StagePolicy, StagingReport};

use crate::error::StagingFailure;
use crate::fs::VirtualFs;
use crate::message::MessageLog;

mod archive;
mod directory;
mod filter;
mod required;
mod target;
mod tracker;

/// A future which resolves to the bytes of a selected file.
pub type ReadFuture = Pin<Box<dyn Future<Output = anyhow::Result<Vec<u8>>> + Send>>;

/// A source of the bytes of a file which is being staged.
///
/// `read` may be called more than once if an attempt to stage the file fails.
pub trait ReadAsset: Send + Sync {
    /// Read the whole file.
    fn read(&self) -> ReadFuture;
}

/// One file of a staging pass.
struct StagingJob {
    target: StagingTarget,
    origin: String,
    source: Arc<dyn ReadAsset>,
}

/// The state shared by the ingesters.
///
/// Clones share the same file system and message log.
#[derive(Debug, Clone)]
pub struct Stager {
    fs: Arc<Mutex<VirtualFs>>,
    data_root: RelativePathBuf,
    filter: PathFilter,
    required: RequiredFiles,
    policy: StagePolicy,
    messages: MessageLog,
}

impl Stager {
    /// Create a stager which writes accepted files under `data_root` in `fs`.
    pub fn new(
        fs: Arc<Mutex<VirtualFs>>,
        data_root: RelativePathBuf,
        filter: PathFilter,
        required: RequiredFiles,
        policy: StagePolicy,
        messages: MessageLog,
    ) -> Self {
        Stager {
            fs,
            data_root,
            filter,
            required,
            policy,
            messages,
        }
    }

    /// The directory staged files are written under.
    pub fn data_root(&self) -> &RelativePathBuf {
        &self.data_root
    }

    /// The filter applied to every selected path.
    pub fn filter(&self) -> &PathFilter {
        &self.filter
    }

    /// The files every selection must contain.
    pub fn required(&self) -> &RequiredFiles {
        &self.required
    }

    /// The log user-visible messages are written to.
    pub fn messages(&self) -> &MessageLog {
        &self.messages
    }

    /// Log that the accepted file at `path` has no valid target and return it as a failure.
    fn invalid_target(&self, path: &str) -> StagingFailure {
        let reason = String::from("The path contains `.` or `..` components.");
        self.messages.warn(format!("Skipping file with invalid path {}: {}", path, reason));
        StagingFailure {
            path: self.data_root.join(path),
            reason,
        }
    }

    /// Write every job to the file system concurrently and wait until all of them are done.
    ///
    /// The `skipped` files are accepted files which could not be given a target. They are part of
    /// the report as failures.
    async fn stage_all(
        &self,
        jobs: Vec<StagingJob>,
        skipped: Vec<StagingFailure>,
    ) -> StagingReport {
        let mut tracker = CompletionTracker::new(jobs.len() + skipped.len());
        let mut report = None;
        for failure in skipped {
            report = report.or(tracker.record(Outcome::Failed(failure)));
        }

        let mut pending = jobs
            .iter()
            .map(|job| job.target.path())
            .collect::<Vec<_>>();
        let mut tasks = JoinSet::new();

        for job in jobs {
            let fs = Arc::clone(&self.fs);
            let messages = self.messages.clone();
            let policy = self.policy;
            tasks.spawn(async move { stage_file(&fs, &job, policy, &messages).await });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => {
                    let path = match &outcome {
                        Outcome::Written(path) => path,
                        Outcome::Failed(failure) => &failure.path,
                    };
                    if let Some(index) = pending.iter().position(|pending| pending == path) {
                        pending.swap_remove(index);
                    }
                    report = report.or(tracker.record(outcome));
                }
                Err(error) => warn!(error = %error, "A staging task did not finish"),
            }
        }

        // Tasks which panicked never reported an outcome.
        for path in pending {
            report = report.or(tracker.record(Outcome::Failed(StagingFailure {
                path,
                reason: String::from("The staging task did not finish."),
            })));
        }

        report.unwrap_or_default()
    }
}

/// Write one file, retrying according to `policy`.
async fn stage_file(
    fs: &Mutex<VirtualFs>,
    job: &StagingJob,
    policy: StagePolicy,
    messages: &MessageLog,
) -> Outcome {
    let path = job.target.path();
    let mut reason = String::new();

    for attempt in 1..=policy.attempts.max(1) {
        match timeout(policy.timeout, write_file(fs, job, messages)).await {
            Ok(Ok(())) => return Outcome::Written(path),
            Ok(Err(error)) => reason = error.to_string(),
            Err(_) => reason = format!("Timed out after {:?}.", policy.timeout),
        }
        warn!(path = %path, attempt, reason = %reason, "Failed to stage file");
    }

    messages.warn(format!("Failed to write file /{}: {}", path, reason));
    Outcome::Failed(StagingFailure { path, reason })
}

async fn write_file(
    fs: &Mutex<VirtualFs>,
    job: &StagingJob,
    messages: &MessageLog,
) -> anyhow::Result<()> {
    let data = job.source.read().await?;
    let path = job.target.path();

    let mut fs = fs.lock().await;
    fs.ensure_directory(job.target.directory_path())?;
    messages.info(format!(
        "Writing file /{} to virtual fs from {}",
        path, job.origin
    ));
    fs.write_file(&path, data)?;

    Ok(())
}
