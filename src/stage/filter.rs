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

/// The folder names whose contents are staged by default.
pub const DEFAULT_WHITELIST: [&str; 4] = ["data", "heroes2", "maps", "music"];

/// A predicate which decides whether a path from a user selection is staged.
///
/// A path is accepted when it names a regular file which is not hidden and at least one of its
/// ancestors is a whitelisted folder. Folder names are compared case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathFilter {
    whitelist: HashSet<String>,
}

impl Default for PathFilter {
    fn default() -> Self {
        Self::new(DEFAULT_WHITELIST)
    }
}

impl PathFilter {
    /// Create a filter which accepts files under any of the given `folders`.
    pub fn new<I, S>(folders: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        PathFilter {
            whitelist: folders
                .into_iter()
                .map(|folder| folder.as_ref().to_lowercase())
                .collect(),
        }
    }

    /// Return whether the slash-delimited `path` should be staged.
    ///
    /// Paths ending in a slash are directory entries and are always rejected, as are files whose
    /// name starts with a dot.
    pub fn accept(&self, path: &str) -> bool {
        if path.ends_with('/') {
            return false;
        }

        let mut segments = path.rsplit('/');
        match segments.next() {
            Some(file_name) if !file_name.starts_with('.') => {}
            _ => return false,
        }

        segments.any(|folder| self.whitelist.contains(&folder.to_lowercase()))
    }
}
