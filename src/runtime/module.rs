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

use std::collections::BTreeMap;

use tracing::{debug, error};

/// The home directory of the game binary.
pub const DEFAULT_HOME: &str = "/fheroes2";

/// The directory the game binary reads its data from.
pub const DEFAULT_DATA_ROOT: &str = "/fheroes2/data";

/// The environment variable holding the home directory.
pub const HOME_VAR: &str = "HOME";

/// The environment variable holding the data directory.
pub const DATA_VAR: &str = "FHEROES2_DATA";

/// The precompiled game binary.
pub trait Runtime: Send {
    /// Set the environment variable `key` to `value` before the binary starts.
    fn set_env(&mut self, key: &str, value: &str);

    /// Run the binary's entry point with `arguments`.
    fn call_main(&mut self, arguments: &[String]) -> anyhow::Result<()>;
}

/// How the game binary is configured before it runs.
///
/// A `ModuleConfig` is built once with [`ModuleConfig::builder`] and does not change afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleConfig {
    env: BTreeMap<String, String>,
    locations: Vec<(String, String)>,
    arguments: Vec<String>,
    no_initial_run: bool,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ModuleConfig {
    /// Return a builder seeded with the default environment and file locations.
    pub fn builder() -> ModuleConfigBuilder {
        ModuleConfigBuilder::default()
    }

    /// The environment variables injected before the binary starts.
    pub fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    /// The arguments passed to the entry point.
    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    /// Whether the entry point waits to be called explicitly.
    pub fn no_initial_run(&self) -> bool {
        self.no_initial_run
    }

    /// Return the URL of a file the binary asks for by `name`.
    ///
    /// The first location whose suffix `name` ends with is used.
    ///
    /// # Errors
    /// - `Error::UnknownFile`: No location matches `name`.
    pub fn locate_file(&self, name: &str) -> crate::Result<&str> {
        for (suffix, url) in &self.locations {
            if name.ends_with(suffix.as_str()) {
                debug!(name, url = url.as_str(), "Located file");
                return Ok(url.as_str());
            }
        }

        let known = self
            .locations
            .iter()
            .map(|(_, url)| url.as_str())
            .collect::<Vec<_>>()
            .join(",");
        error!(
            "Unknown file[{}] is requested by fheroes2.js module; known urls are: {}",
            name, known
        );
        Err(crate::Error::UnknownFile(name.to_owned()))
    }

    /// Inject the environment into `runtime`.
    pub fn pre_init(&self, runtime: &mut dyn Runtime) {
        for (key, value) in &self.env {
            runtime.set_env(key, value);
        }
    }
}

/// A builder for a [`ModuleConfig`].
#[derive(Debug, Clone)]
pub struct ModuleConfigBuilder {
    config: ModuleConfig,
}

impl Default for ModuleConfigBuilder {
    fn default() -> Self {
        let mut env = BTreeMap::new();
        env.insert(HOME_VAR.to_owned(), DEFAULT_HOME.to_owned());
        env.insert(DATA_VAR.to_owned(), DEFAULT_DATA_ROOT.to_owned());

        ModuleConfigBuilder {
            config: ModuleConfig {
                env,
                locations: vec![
                    (String::from("data"), String::from("fheroes2.data")),
                    (String::from("wasm"), String::from("fheroes2.wasm")),
                ],
                arguments: Vec::new(),
                no_initial_run: true,
            },
        }
    }
}

impl ModuleConfigBuilder {
    /// Set the environment variable `key` to `value`.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.env.insert(key.into(), value.into());
        self
    }

    /// Set the home directory.
    pub fn home(self, path: impl Into<String>) -> Self {
        self.env(HOME_VAR, path)
    }

    /// Set the data directory.
    pub fn data_root(self, path: impl Into<String>) -> Self {
        self.env(DATA_VAR, path)
    }

    /// Resolve files whose name ends with `suffix` to `url`.
    ///
    /// A location added for a suffix which is already known replaces it.
    pub fn locate(mut self, suffix: impl Into<String>, url: impl Into<String>) -> Self {
        let suffix = suffix.into();
        let url = url.into();
        match self
            .config
            .locations
            .iter_mut()
            .find(|(existing, _)| *existing == suffix)
        {
            Some(location) => location.1 = url,
            None => self.config.locations.push((suffix, url)),
        }
        self
    }

    /// Pass `argument` to the entry point.
    pub fn argument(mut self, argument: impl Into<String>) -> Self {
        self.config.arguments.push(argument.into());
        self
    }

    /// Set whether the entry point waits to be called explicitly.
    pub fn no_initial_run(mut self, no_initial_run: bool) -> Self {
        self.config.no_initial_run = no_initial_run;
        self
    }

    /// Build the config.
    pub fn build(self) -> ModuleConfig {
        self.config
    }
}
