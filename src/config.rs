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

use relative_path::RelativePathBuf;
use serde::{Deserialize, Serialize};

use crate::fetch::{DEMO_DOWNLOAD_URL, DEMO_SHA256, DEMO_URL};
use crate::fs::virtual_path;
use crate::message;
use crate::runtime::{DEFAULT_DATA_ROOT, DEFAULT_HOME};
use crate::stage::{
    PathFilter, RequiredFiles, StagePolicy, DEFAULT_MAX_SELECTION, DEFAULT_REQUIRED_FILES,
    DEFAULT_WHITELIST,
};

/// Where the demo archive comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// The canonical URL of the archive, shown to the user.
    pub url: String,

    /// The URL the archive is downloaded from.
    pub download_url: String,

    /// The hex-encoded SHA-256 digest the archive must have.
    pub sha256: String,
}

impl Default for DemoConfig {
    fn default() -> Self {
        DemoConfig {
            url: DEMO_URL.to_owned(),
            download_url: DEMO_DOWNLOAD_URL.to_owned(),
            sha256: DEMO_SHA256.to_owned(),
        }
    }
}

/// The configuration for a [`Launcher`].
///
/// [`Launcher`]: crate::Launcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherConfig {
    /// The directory the durable store is mounted at.
    pub home: String,

    /// The directory game data is staged into. This must be inside `home`.
    pub data_root: String,

    /// The folder names whose contents are staged.
    pub whitelist: Vec<String>,

    /// The path suffixes every selection must contain.
    pub required_files: Vec<String>,

    /// The most files a directory selection may contain.
    pub max_selection: usize,

    /// How hard staging tries to write each file.
    pub policy: StagePolicy,

    /// Where the demo archive comes from.
    pub demo: DemoConfig,

    /// The number of messages kept in the message log.
    pub message_capacity: usize,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        LauncherConfig {
            home: DEFAULT_HOME.to_owned(),
            data_root: DEFAULT_DATA_ROOT.to_owned(),
            whitelist: DEFAULT_WHITELIST.iter().map(|name| name.to_string()).collect(),
            required_files: DEFAULT_REQUIRED_FILES
                .iter()
                .map(|suffix| suffix.to_string())
                .collect(),
            max_selection: DEFAULT_MAX_SELECTION,
            policy: StagePolicy::default(),
            demo: DemoConfig::default(),
            message_capacity: message::DEFAULT_CAPACITY,
        }
    }
}

impl LauncherConfig {
    /// The virtual path of the home directory.
    pub fn home_path(&self) -> RelativePathBuf {
        virtual_path(&self.home)
    }

    /// The virtual path of the data root.
    pub fn data_root_path(&self) -> RelativePathBuf {
        virtual_path(&self.data_root)
    }

    /// The filter built from the whitelist.
    pub fn filter(&self) -> PathFilter {
        PathFilter::new(&self.whitelist)
    }

    /// The required files.
    pub fn required(&self) -> RequiredFiles {
        RequiredFiles::new(&self.required_files)
    }
}
