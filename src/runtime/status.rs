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

use crate::message::MessageLog;

/// Return the length of the run of ASCII digits at the start of `bytes`.
fn digits(bytes: impl Iterator<Item = u8>) -> usize {
    bytes.take_while(u8::is_ascii_digit).count()
}

/// Return the download progress in percent from a status line like `Downloading data... (3/4)`.
///
/// The first `<progress>/<total>` pair in the line is used. This returns `None` if there is no
/// such pair or the total is zero. Progress past the total is reported as 100.
pub fn parse_progress(status: &str) -> Option<u8> {
    let bytes = status.as_bytes();

    for (slash, _) in status.match_indices('/') {
        let before = digits(bytes[..slash].iter().rev().copied());
        let after = digits(bytes[slash + 1..].iter().copied());
        if before == 0 || after == 0 {
            continue;
        }

        let progress = status[slash - before..slash].parse::<u64>().ok()?;
        let total = status[slash + 1..slash + 1 + after].parse::<u64>().ok()?;
        if total == 0 {
            return None;
        }

        let percent = (progress as f64 / total as f64 * 100.0).round();
        return Some(percent.min(100.0) as u8);
    }

    None
}

/// Receives status lines from the game binary while it loads.
///
/// Every line is written to the message log. Lines carrying download progress are also passed to
/// the progress callback as a percentage.
pub struct StatusReporter<F> {
    messages: MessageLog,
    on_progress: F,
}

impl<F: FnMut(u8)> StatusReporter<F> {
    /// Create a reporter which logs to `messages` and reports progress to `on_progress`.
    pub fn new(messages: MessageLog, on_progress: F) -> Self {
        StatusReporter {
            messages,
            on_progress,
        }
    }

    /// Handle a new `status` line. Empty lines are ignored.
    pub fn set_status(&mut self, status: &str) {
        if status.is_empty() {
            return;
        }

        self.messages.info(status);
        if let Some(percent) = parse_progress(status) {
            (self.on_progress)(percent);
        }
    }
}
