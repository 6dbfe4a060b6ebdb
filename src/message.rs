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

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{info, warn};

/// The number of messages kept by default.
pub const DEFAULT_CAPACITY: usize = 200;

/// A bounded log of the messages shown to the user in the launcher console.
///
/// Every message is also emitted as a `tracing` event. Once the log is full, the oldest message
/// is dropped for each new one. Clones share the same messages.
#[derive(Debug, Clone)]
pub struct MessageLog {
    lines: Arc<Mutex<VecDeque<String>>>,
    capacity: usize,
}

impl Default for MessageLog {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl MessageLog {
    /// Create an empty log which holds at most `capacity` messages.
    pub fn new(capacity: usize) -> Self {
        MessageLog {
            lines: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    fn lines(&self) -> MutexGuard<'_, VecDeque<String>> {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, message: String) {
        if self.capacity == 0 {
            return;
        }
        let mut lines = self.lines();
        while lines.len() >= self.capacity {
            lines.pop_front();
        }
        lines.push_back(message);
    }

    /// Add an informational `message`.
    pub fn info(&self, message: impl Into<String>) {
        let message = message.into();
        info!("{}", message);
        self.push(message);
    }

    /// Add a `message` about something which went wrong.
    pub fn warn(&self, message: impl Into<String>) {
        let message = message.into();
        warn!("{}", message);
        self.push(message);
    }

    /// Return the messages in the order they were added.
    pub fn messages(&self) -> Vec<String> {
        self.lines().iter().cloned().collect()
    }

    /// Return whether any message contains `text`.
    pub fn contains(&self, text: &str) -> bool {
        self.lines().iter().any(|line| line.contains(text))
    }

    /// Return the number of messages in the log.
    pub fn len(&self) -> usize {
        self.lines().len()
    }

    /// Return whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.lines().is_empty()
    }
}
