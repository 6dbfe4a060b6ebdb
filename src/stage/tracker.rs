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

use std::mem;
use std::time::Duration;

use relative_path::RelativePathBuf;
use serde::{Deserialize, Serialize};

use crate::error::StagingFailure;

/// How hard a staging pass tries to write each file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StagePolicy {
    /// The number of times reading and writing a file is attempted before it is given up on.
    pub attempts: u32,

    /// How long a single attempt may take.
    pub timeout: Duration,
}

impl Default for StagePolicy {
    fn default() -> Self {
        StagePolicy {
            attempts: 3,
            timeout: Duration::from_secs(30),
        }
    }
}

/// The result of staging one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The file was written to this path.
    Written(RelativePathBuf),

    /// The file could not be written.
    Failed(StagingFailure),
}

/// A summary of a finished staging pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagingReport {
    /// The paths of the files which were written.
    pub written: Vec<RelativePathBuf>,

    /// The files which could not be written.
    pub failed: Vec<StagingFailure>,
}

impl StagingReport {
    /// The number of files the pass accounted for.
    pub fn total(&self) -> usize {
        self.written.len() + self.failed.len()
    }

    /// Return whether every file was written.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Detects when every file of a staging pass has been accounted for.
///
/// Outcomes may arrive in any order. The report is handed out exactly once, by the call to
/// [`record`] which brings the number of outcomes up to the expected count.
///
/// [`record`]: crate::stage::CompletionTracker::record
#[derive(Debug)]
pub struct CompletionTracker {
    expected: usize,
    report: StagingReport,
    finished: bool,
}

impl CompletionTracker {
    /// Create a tracker for a pass which stages `expected` files.
    pub fn new(expected: usize) -> Self {
        CompletionTracker {
            expected,
            report: StagingReport::default(),
            finished: false,
        }
    }

    /// Return whether the report has been handed out.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Record the `outcome` of one file.
    ///
    /// This returns the report once all files have been accounted for and `None` otherwise,
    /// including for any outcome recorded after that.
    pub fn record(&mut self, outcome: Outcome) -> Option<StagingReport> {
        if self.finished {
            return None;
        }

        match outcome {
            Outcome::Written(path) => self.report.written.push(path),
            Outcome::Failed(failure) => self.report.failed.push(failure),
        }

        if self.report.total() >= self.expected {
            self.finished = true;
            Some(mem::take(&mut self.report))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn written(path: &str) -> Outcome {
        Outcome::Written(RelativePathBuf::from(path))
    }

    #[test]
    fn fires_once_after_all_outcomes() {
        let mut tracker = CompletionTracker::new(3);

        assert!(tracker.record(written("c")).is_none());
        assert!(tracker.record(written("a")).is_none());
        assert!(!tracker.is_finished());

        let report = tracker.record(written("b")).unwrap();
        assert_eq!(report.total(), 3);
        assert!(report.is_complete());
        assert!(tracker.is_finished());

        assert!(tracker.record(written("d")).is_none());
    }

    #[test]
    fn failures_count_towards_completion() {
        let mut tracker = CompletionTracker::new(2);
        tracker.record(Outcome::Failed(StagingFailure {
            path: RelativePathBuf::from("a"),
            reason: String::from("timed out"),
        }));

        let report = tracker.record(written("b")).unwrap();
        assert!(!report.is_complete());
        assert_eq!(report.failed.len(), 1);
    }
}
