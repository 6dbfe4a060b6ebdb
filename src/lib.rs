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

//! `asset-stage` stages game data for a precompiled game binary which reads its files from a
//! virtual file system.
//!
//! The user selects a directory, picks a zip archive or downloads the demo version of the game.
//! This crate filters that selection down to the folders the game reads from, checks that the
//! files the game cannot start without are there, writes everything into a [`VirtualFs`] under the
//! data root and persists the result to a durable [`DataStore`]. The next time the launcher starts,
//! the data is loaded from the store again and no selection is needed.
//!
//! The game binary may only start once every [`RunDependency`] has been cleared:
//! - `ManualStart` until the user asks to start the game.
//! - `FsSync` while the file system is loaded from the store.
//! - `Data` while there is no game data.
//!
//! A [`Launcher`] ties all of this together. The following data stores are provided out of the box:
//! - `DirectoryStore` stores data in a directory in the local file system.
//! - `MemoryStore` stores data in memory.
//!
//! # Examples
//! ```
//! use asset_stage::lifecycle::DataState;
//! use asset_stage::runtime::RunDependency;
//! use asset_stage::store::MemoryStore;
//! use asset_stage::{Launcher, LauncherConfig};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> asset_stage::Result<()> {
//!     // Create a launcher with the default data root and whitelist.
//!     let launcher = Launcher::new(LauncherConfig::default());
//!
//!     // Mount a store which has never been written to.
//!     let state = launcher.start(MemoryStore::new()).await?;
//!
//!     // There is no data yet, so the game cannot start.
//!     assert_eq!(state, DataState::Absent);
//!     assert!(launcher.dependencies().is_pending(RunDependency::Data));
//!
//!     Ok(())
//! }
//! ```
//!
//! # Features
//! Some functionality is gated behind cargo features:
//!
//! Type | Cargo Feature
//! --- | ---
//! `DirectoryStore` | `store-directory`
//! `HttpFetcher` | `fetch`
//!
//! To use one of these types, you must enable the corresponding feature in your `Cargo.toml`.
//!
//! [`VirtualFs`]: crate::fs::VirtualFs
//! [`DataStore`]: crate::store::DataStore
//! [`RunDependency`]: crate::runtime::RunDependency
//! [`Launcher`]: crate::Launcher

#![cfg_attr(docsrs, feature(doc_cfg))]

pub use relative_path;

pub use config::{DemoConfig, LauncherConfig};
pub use context::Launcher;
pub use error::{Error, Rejection, Result, StagingFailure};

mod id;

mod config;
mod context;
mod error;
pub mod fetch;
pub mod fs;
pub mod lifecycle;
pub mod message;
pub mod runtime;
pub mod stage;
pub mod store;
