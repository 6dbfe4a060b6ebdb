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

use std::fs::{create_dir_all, write};
use std::io::{Cursor, Write};
use std::path::PathBuf;
use std::sync::Arc;

use rstest::*;
use tokio::sync::Notify;
use tracing_subscriber::EnvFilter;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use asset_stage::fetch::{FetchFuture, Fetcher};
use asset_stage::runtime::Runtime;
use asset_stage::LauncherConfig;

use super::store::WithTempDir;

/// The contents of the main game data file used in tests.
pub const AGG_DATA: &[u8] = b"AGG data for testing";

/// The contents of a map file used in tests.
pub const MAP_DATA: &[u8] = b"map data for testing";

/// Install a `tracing` subscriber which respects `RUST_LOG`.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Return a zip archive containing the given `entries`.
///
/// Entry names ending in a slash are added as directories.
pub fn zip_archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();

    for (name, data) in entries {
        if name.ends_with('/') {
            writer.add_directory(*name, options).unwrap();
        } else {
            writer.start_file(*name, options).unwrap();
            writer.write_all(data).unwrap();
        }
    }

    writer.finish().unwrap().into_inner()
}

/// Return a zip archive of a game folder.
#[fixture]
pub fn game_archive() -> Vec<u8> {
    zip_archive(&[
        ("Game/", b""),
        ("Game/DATA/", b""),
        ("Game/DATA/HEROES2.AGG", AGG_DATA),
        ("Game/MAPS/BROKEN.MP2", MAP_DATA),
        ("Game/SAVES/SLOT1.SAV", b"save"),
        ("Game/.DS_Store", b"junk"),
    ])
}

/// Return a temporary directory containing the game folder `Game` with the given `files`.
pub fn game_directory(files: &[(&str, &[u8])]) -> WithTempDir<PathBuf> {
    let directory = tempfile::tempdir().unwrap();
    let root = directory.path().join("Game");
    create_dir_all(&root).unwrap();

    for (path, data) in files {
        let path = root.join(path);
        create_dir_all(path.parent().unwrap()).unwrap();
        write(&path, data).unwrap();
    }

    WithTempDir {
        directory,
        value: root,
    }
}

/// Return a temporary game folder with the data every selection must contain.
#[fixture]
pub fn game_folder() -> WithTempDir<PathBuf> {
    game_directory(&[
        ("DATA/HEROES2.AGG", AGG_DATA),
        ("MAPS/BROKEN.MP2", MAP_DATA),
        ("SAVES/SLOT1.SAV", b"save"),
        (".DS_Store", b"junk"),
    ])
}

/// Return a launcher config with the default whitelist and required files.
#[fixture]
pub fn config() -> LauncherConfig {
    LauncherConfig::default()
}

/// A `Fetcher` which returns a fixed blob once it is released.
pub struct GatedFetcher {
    pub data: Vec<u8>,
    pub gate: Arc<Notify>,
}

impl GatedFetcher {
    pub fn new(data: Vec<u8>) -> Self {
        GatedFetcher {
            data,
            gate: Arc::new(Notify::new()),
        }
    }
}

impl Fetcher for GatedFetcher {
    fn fetch<'a>(&'a self, _url: &'a str) -> FetchFuture<'a> {
        Box::pin(async move {
            self.gate.notified().await;
            Ok(self.data.clone())
        })
    }
}

/// A `Fetcher` which returns a fixed blob immediately.
pub struct StaticFetcher(pub Vec<u8>);

impl Fetcher for StaticFetcher {
    fn fetch<'a>(&'a self, _url: &'a str) -> FetchFuture<'a> {
        let data = self.0.clone();
        Box::pin(async move { Ok(data) })
    }
}

/// A `Runtime` which records how it was called.
#[derive(Debug, Default)]
pub struct RecordingRuntime {
    pub env: Vec<(String, String)>,
    pub calls: Vec<Vec<String>>,
}

impl Runtime for RecordingRuntime {
    fn set_env(&mut self, key: &str, value: &str) {
        self.env.push((key.to_owned(), value.to_owned()));
    }

    fn call_main(&mut self, arguments: &[String]) -> anyhow::Result<()> {
        self.calls.push(arguments.to_vec());
        Ok(())
    }
}
