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

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{watch, Mutex, MutexGuard};

use crate::config::LauncherConfig;
use crate::error::Rejection;
use crate::fetch::{fetch_verified, Fetcher};
use crate::fs::VirtualFs;
use crate::lifecycle::{DataState, Lifecycle};
use crate::message::MessageLog;
use crate::runtime::{ModuleConfig, RunDependencies, RunDependency, Runtime};
use crate::stage::{ArchiveIngester, DirectoryIngester, SelectedFile, Stager, StagingReport};
use crate::store::DataStore;

/// The launcher of the game binary.
///
/// A `Launcher` owns everything the binary needs before it can run: the virtual file system, the
/// run dependencies, the message log and the state of the data root. Only one operation which
/// changes the data root may run at a time; starting another one while it is in progress fails
/// with `Error::Busy`.
///
/// A new launcher has every [`RunDependency`] pending. Call [`start`] to mount a durable store,
/// then stage game data if there is none, then call [`run`]. Staging is refused while game data is
/// present; remove it first.
///
/// [`start`]: crate::Launcher::start
/// [`run`]: crate::Launcher::run
#[derive(Debug)]
pub struct Launcher {
    config: LauncherConfig,
    module: ModuleConfig,
    fs: Arc<Mutex<VirtualFs>>,
    dependencies: RunDependencies,
    messages: MessageLog,
    lifecycle: Lifecycle,
    stager: Stager,
    state: watch::Sender<DataState>,
    operation: Mutex<()>,
}

impl Launcher {
    /// Create a launcher from `config`.
    pub fn new(config: LauncherConfig) -> Self {
        let fs = Arc::new(Mutex::new(VirtualFs::new()));
        let messages = MessageLog::new(config.message_capacity);
        let dependencies = RunDependencies::new();
        dependencies.add(RunDependency::ManualStart);
        dependencies.add(RunDependency::FsSync);
        dependencies.add(RunDependency::Data);

        let module = ModuleConfig::builder()
            .home(config.home.clone())
            .data_root(config.data_root.clone())
            .build();
        let lifecycle = Lifecycle::new(
            Arc::clone(&fs),
            config.home_path(),
            config.data_root_path(),
            dependencies.clone(),
            messages.clone(),
        );
        let stager = Stager::new(
            Arc::clone(&fs),
            config.data_root_path(),
            config.filter(),
            config.required(),
            config.policy,
            messages.clone(),
        );
        let (state, _) = watch::channel(DataState::Absent);

        Launcher {
            config,
            module,
            fs,
            dependencies,
            messages,
            lifecycle,
            stager,
            state,
            operation: Mutex::new(()),
        }
    }

    /// Replace the configuration of the game binary.
    pub fn with_module(mut self, module: ModuleConfig) -> Self {
        self.module = module;
        self
    }

    /// The configuration of this launcher.
    pub fn config(&self) -> &LauncherConfig {
        &self.config
    }

    /// The configuration of the game binary.
    pub fn module(&self) -> &ModuleConfig {
        &self.module
    }

    /// The virtual file system the game binary reads from.
    pub fn fs(&self) -> Arc<Mutex<VirtualFs>> {
        Arc::clone(&self.fs)
    }

    /// The run dependencies which must be cleared before the game binary may run.
    pub fn dependencies(&self) -> &RunDependencies {
        &self.dependencies
    }

    /// The messages shown to the user.
    pub fn messages(&self) -> &MessageLog {
        &self.messages
    }

    /// The current state of the data root.
    pub fn state(&self) -> DataState {
        *self.state.borrow()
    }

    /// Return a receiver which observes the state of the data root.
    pub fn subscribe_state(&self) -> watch::Receiver<DataState> {
        self.state.subscribe()
    }

    /// Return whether game data is available.
    pub fn has_data(&self) -> bool {
        self.state() == DataState::Present
    }

    fn begin(&self) -> crate::Result<MutexGuard<'_, ()>> {
        self.operation.try_lock().map_err(|_| crate::Error::Busy)
    }

    /// Take the operation lock for a staging pass, which needs an empty data root.
    fn begin_staging(&self) -> crate::Result<MutexGuard<'_, ()>> {
        let guard = self.begin()?;
        if self.state() != DataState::Absent {
            self.messages.warn(Rejection::DataPresent.to_string());
            return Err(Rejection::DataPresent.into());
        }
        Ok(guard)
    }

    /// The `Data` gate is only cleared while the state is `Present`.
    fn set_state(&self, state: DataState) {
        self.state.send_replace(state);
        self.lifecycle.update_data_gate(state);
    }

    /// Mount `store` at the home directory and check it for game data.
    ///
    /// # Errors
    /// - `Error::Busy`: Another operation is in progress.
    /// - `Error::Sync`: The store could not be loaded.
    pub async fn start(&self, store: impl DataStore + 'static) -> crate::Result<DataState> {
        let _guard = self.begin()?;
        let state = self.lifecycle.mount(store).await?;
        self.set_state(state);
        Ok(state)
    }

    /// Stage a directory selection and persist it.
    ///
    /// # Errors
    /// - `Error::Busy`: Another operation is in progress.
    /// - `Error::Rejected`: Game data is already present or the selection was refused. Nothing
    /// changed.
    /// - `Error::Incomplete`: Some files could not be written. Nothing was persisted.
    /// - `Error::Sync`: The staged files could not be persisted.
    pub async fn stage_directory(&self, files: Vec<SelectedFile>) -> crate::Result<StagingReport> {
        let _guard = self.begin_staging()?;
        let ingester = DirectoryIngester::new(self.stager.clone(), self.config.max_selection);
        self.stage(ingester.ingest(files)).await
    }

    /// Stage the contents of a zip archive and persist them.
    ///
    /// # Errors
    /// - `Error::Busy`: Another operation is in progress.
    /// - `Error::Archive`: The archive could not be read. Nothing changed.
    /// - `Error::Rejected`: Game data is already present or the archive was refused. Nothing
    /// changed.
    /// - `Error::Incomplete`: Some files could not be written. Nothing was persisted.
    /// - `Error::Sync`: The staged files could not be persisted.
    pub async fn stage_archive(
        &self,
        archive: impl Into<Arc<[u8]>>,
    ) -> crate::Result<StagingReport> {
        let _guard = self.begin_staging()?;
        let ingester = ArchiveIngester::new(self.stager.clone());
        self.stage(ingester.ingest(archive)).await
    }

    /// Download the demo archive, verify it and stage its contents.
    ///
    /// The archive is only staged if its digest matches the configured one.
    ///
    /// # Errors
    /// - `Error::Busy`: Another operation is in progress.
    /// - `Error::Fetch`: The download failed. Nothing changed.
    /// - `Error::HashMismatch`: The archive has the wrong digest. Nothing changed.
    /// - Any error of [`stage_archive`].
    ///
    /// [`stage_archive`]: crate::Launcher::stage_archive
    pub async fn stage_demo(&self, fetcher: &dyn Fetcher) -> crate::Result<StagingReport> {
        let _guard = self.begin_staging()?;
        let demo = &self.config.demo;
        self.messages.info(format!("Fetching demo data from [{}]", demo.url));
        let archive =
            fetch_verified(fetcher, &demo.download_url, &demo.sha256, &self.messages).await?;

        let ingester = ArchiveIngester::new(self.stager.clone());
        self.stage(ingester.ingest(archive)).await
    }

    /// Run a staging pass and settle the state of the data root afterwards.
    async fn stage(
        &self,
        staging: impl Future<Output = crate::Result<StagingReport>>,
    ) -> crate::Result<StagingReport> {
        let previous = self.state();
        self.set_state(DataState::Staging);

        match staging.await {
            Ok(report) => match self.lifecycle.persist().await {
                Ok(()) => {
                    self.set_state(DataState::Present);
                    Ok(report)
                }
                Err(error) => {
                    self.recover().await;
                    Err(error)
                }
            },
            Err(error @ crate::Error::Rejected(_)) | Err(error @ crate::Error::Archive(_)) => {
                self.set_state(previous);
                Err(error)
            }
            Err(error) => {
                self.recover().await;
                Err(error)
            }
        }
    }

    /// Bring memory back in line with durable storage after a failed staging pass.
    async fn recover(&self) {
        let state = match self.lifecycle.reload().await {
            Ok(()) => self
                .lifecycle
                .check_presence()
                .await
                .unwrap_or(DataState::Absent),
            Err(_) => DataState::Absent,
        };
        self.set_state(state);
    }

    /// Remove all staged game data, in memory and in durable storage.
    ///
    /// If the data cannot be removed, the file system is reloaded from durable storage and the
    /// state reflects what is stored there.
    ///
    /// # Errors
    /// - `Error::Busy`: Another operation is in progress.
    /// - `Error::Clear`: Some entries could not be removed. Nothing was persisted.
    /// - `Error::Sync`: The empty data root could not be persisted.
    pub async fn remove_data(&self) -> crate::Result<()> {
        let _guard = self.begin()?;
        self.set_state(DataState::Clearing);
        match self.lifecycle.remove_data().await {
            Ok(()) => {
                self.set_state(DataState::Absent);
                Ok(())
            }
            Err(error) => {
                self.recover().await;
                Err(error)
            }
        }
    }

    /// Start the game binary.
    ///
    /// This clears the [`RunDependency::ManualStart`] gate, injects the environment into
    /// `runtime` and calls its entry point.
    ///
    /// # Errors
    /// - `Error::DependenciesPending`: Some other run dependency is still pending.
    /// - `Error::Runtime`: The entry point returned an error.
    pub fn run(&self, runtime: &mut dyn Runtime) -> crate::Result<()> {
        self.dependencies.remove(RunDependency::ManualStart);

        let pending = self.dependencies.pending();
        if !pending.is_empty() {
            let names = pending
                .iter()
                .map(|dependency| dependency.name())
                .collect::<Vec<_>>()
                .join(", ");
            self.messages.warn(format!("Cannot start yet, waiting for: {}", names));
            return Err(crate::Error::DependenciesPending(pending));
        }

        self.module.pre_init(runtime);
        self.messages.info("Starting...");
        runtime
            .call_main(self.module.arguments())
            .map_err(crate::Error::Runtime)
    }
}
