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

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::debug;

/// A named condition which must be cleared before the game's entry point may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunDependency {
    /// The user has not yet asked to start the game.
    ManualStart,

    /// The file system is being loaded from durable storage.
    FsSync,

    /// No game data has been staged.
    Data,
}

impl RunDependency {
    /// The name the dependency is registered under.
    pub fn name(self) -> &'static str {
        match self {
            RunDependency::ManualStart => "manual-start",
            RunDependency::FsSync => "fs-sync",
            RunDependency::Data => "data",
        }
    }
}

impl fmt::Display for RunDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The registry of outstanding run dependencies.
///
/// Clones share the same registry. Observers can [`subscribe`] to be notified whenever the set of
/// pending dependencies changes.
///
/// [`subscribe`]: crate::runtime::RunDependencies::subscribe
#[derive(Debug, Clone)]
pub struct RunDependencies {
    pending: Arc<watch::Sender<HashSet<RunDependency>>>,
}

impl Default for RunDependencies {
    fn default() -> Self {
        let (sender, _) = watch::channel(HashSet::new());
        RunDependencies {
            pending: Arc::new(sender),
        }
    }
}

impl RunDependencies {
    /// Create a registry with no pending dependencies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `dependency` as pending.
    pub fn add(&self, dependency: RunDependency) {
        self.pending.send_if_modified(|pending| {
            let added = pending.insert(dependency);
            if added {
                debug!(dependency = %dependency, "Added run dependency");
            }
            added
        });
    }

    /// Mark `dependency` as cleared.
    pub fn remove(&self, dependency: RunDependency) {
        self.pending.send_if_modified(|pending| {
            let removed = pending.remove(&dependency);
            if removed {
                debug!(dependency = %dependency, "Removed run dependency");
            }
            removed
        });
    }

    /// Return whether `dependency` is pending.
    pub fn is_pending(&self, dependency: RunDependency) -> bool {
        self.pending.borrow().contains(&dependency)
    }

    /// Return whether no dependency is pending.
    pub fn is_satisfied(&self) -> bool {
        self.pending.borrow().is_empty()
    }

    /// Return the pending dependencies.
    pub fn pending(&self) -> Vec<RunDependency> {
        let mut pending = self.pending.borrow().iter().copied().collect::<Vec<_>>();
        pending.sort_by_key(|dependency| dependency.name());
        pending
    }

    /// Return a receiver which observes the set of pending dependencies.
    pub fn subscribe(&self) -> watch::Receiver<HashSet<RunDependency>> {
        self.pending.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use maplit::hashset;

    use super::*;

    #[test]
    fn satisfied_once_all_removed() {
        let dependencies = RunDependencies::new();
        dependencies.add(RunDependency::ManualStart);
        dependencies.add(RunDependency::Data);

        assert!(!dependencies.is_satisfied());
        assert!(dependencies.is_pending(RunDependency::Data));

        dependencies.remove(RunDependency::Data);
        dependencies.remove(RunDependency::ManualStart);
        assert!(dependencies.is_satisfied());
    }

    #[test]
    fn clones_share_registry() {
        let dependencies = RunDependencies::new();
        dependencies.clone().add(RunDependency::FsSync);

        assert_eq!(dependencies.pending(), vec![RunDependency::FsSync]);
    }

    #[tokio::test]
    async fn subscribers_see_changes() {
        let dependencies = RunDependencies::new();
        let mut receiver = dependencies.subscribe();

        dependencies.add(RunDependency::Data);
        receiver.changed().await.unwrap();

        assert_eq!(*receiver.borrow(), hashset![RunDependency::Data]);
    }
}
