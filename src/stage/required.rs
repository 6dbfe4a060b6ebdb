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

/// The suffixes of the files the game cannot start without.
pub const DEFAULT_REQUIRED_FILES: [&str; 1] = ["data/heroes2.agg"];

/// The set of files which must be part of a selection for it to be staged.
///
/// Each required file is a path suffix. Suffixes and paths are compared case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredFiles {
    suffixes: Vec<String>,
}

impl Default for RequiredFiles {
    fn default() -> Self {
        Self::new(DEFAULT_REQUIRED_FILES)
    }
}

impl RequiredFiles {
    /// Create a set of required files from path `suffixes`.
    pub fn new<I, S>(suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut unique = Vec::new();
        for suffix in suffixes {
            let suffix = suffix.as_ref().to_lowercase();
            if !unique.contains(&suffix) {
                unique.push(suffix);
            }
        }
        RequiredFiles { suffixes: unique }
    }

    /// Return the lower-cased required suffixes.
    pub fn suffixes(&self) -> &[String] {
        &self.suffixes
    }

    /// Return whether `paths` contain every required file.
    ///
    /// The number of distinct suffixes matched must equal the number of required suffixes, so two
    /// copies of one required file never stand in for another one.
    pub fn validate<'a>(&self, paths: impl IntoIterator<Item = &'a str>) -> bool {
        let mut satisfied = HashSet::new();

        for path in paths {
            let path = path.to_lowercase();
            for (index, suffix) in self.suffixes.iter().enumerate() {
                if path.ends_with(suffix.as_str()) {
                    satisfied.insert(index);
                }
            }
        }

        satisfied.len() == self.suffixes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::RequiredFiles;

    fn required() -> RequiredFiles {
        RequiredFiles::new(["DATA/HEROES2.AGG", "data/heroes2x.agg"])
    }

    #[test]
    fn all_required_files_present() {
        let paths = ["Game/data/HEROES2.AGG", "Game/DATA/heroes2x.agg", "Game/maps/m1.map"];
        assert!(required().validate(paths));
    }

    #[test]
    fn missing_required_file() {
        let paths = ["Game/data/HEROES2.AGG", "Game/maps/m1.map"];
        assert!(!required().validate(paths));
    }

    #[test]
    fn duplicate_does_not_replace_missing_file() {
        let paths = ["Game/data/heroes2.agg", "Other/DATA/HEROES2.AGG"];
        assert!(!required().validate(paths));
    }

    #[test]
    fn empty_set_accepts_anything() {
        assert!(RequiredFiles::new(Vec::<String>::new()).validate(std::iter::empty()));
    }
}
