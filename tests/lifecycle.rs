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

use std::path::PathBuf;
use std::sync::Arc;

use maplit::hashset;
use rstest::*;
use tokio::sync::Mutex;

use asset_stage::fs::{virtual_path, VirtualFs};
use asset_stage::lifecycle::{DataState, Lifecycle};
use asset_stage::message::MessageLog;
use asset_stage::runtime::{RunDependencies, RunDependency};
use asset_stage::stage::select_directory;
use asset_stage::store::MemoryStore;
use asset_stage::{Error, Launcher, LauncherConfig};
use common::{
    config, game_archive, game_folder, init_logging, memory_store, ReadOnlyStore, WithTempDir,
    AGG_DATA,
};

mod common;

fn lifecycle(fs: Arc<Mutex<VirtualFs>>) -> Lifecycle {
    Lifecycle::new(
        fs,
        virtual_path("/fheroes2"),
        virtual_path("/fheroes2/data"),
        RunDependencies::new(),
        MessageLog::default(),
    )
}

#[rstest]
#[tokio::test]
async fn empty_store_has_no_data(memory_store: MemoryStore) -> anyhow::Result<()> {
    init_logging();
    let fs = Arc::new(Mutex::new(VirtualFs::new()));
    let lifecycle = lifecycle(Arc::clone(&fs));

    let state = lifecycle.mount(memory_store).await?;

    assert_eq!(state, DataState::Absent);
    assert!(fs.lock().await.entry("fheroes2/data")?.is_directory());
    Ok(())
}

#[rstest]
#[tokio::test]
async fn mounting_clears_sync_gate(memory_store: MemoryStore) -> anyhow::Result<()> {
    let dependencies = RunDependencies::new();
    let lifecycle = Lifecycle::new(
        Arc::new(Mutex::new(VirtualFs::new())),
        virtual_path("fheroes2"),
        virtual_path("fheroes2/data"),
        dependencies.clone(),
        MessageLog::default(),
    );

    lifecycle.mount(memory_store).await?;

    assert!(!dependencies.is_pending(RunDependency::FsSync));
    assert!(dependencies.is_pending(RunDependency::Data));
    Ok(())
}

#[rstest]
#[tokio::test]
async fn staged_data_is_found_after_restart(
    config: LauncherConfig,
    game_archive: Vec<u8>,
    memory_store: MemoryStore,
) -> anyhow::Result<()> {
    let launcher = Launcher::new(config.clone());
    launcher.start(memory_store.clone()).await?;
    launcher.stage_archive(game_archive).await?;
    drop(launcher);

    let restarted = Launcher::new(config);
    let state = restarted.start(memory_store).await?;

    assert_eq!(state, DataState::Present);
    assert!(restarted.has_data());
    assert!(restarted
        .messages()
        .contains("Local data found we are ready to start..."));
    assert_eq!(
        restarted
            .fs()
            .lock()
            .await
            .read_file("fheroes2/data/DATA/HEROES2.AGG")?,
        AGG_DATA
    );
    Ok(())
}

#[rstest]
#[tokio::test]
async fn removing_data_leaves_empty_data_root(
    config: LauncherConfig,
    game_folder: WithTempDir<PathBuf>,
    memory_store: MemoryStore,
) -> anyhow::Result<()> {
    let launcher = Launcher::new(config.clone());
    launcher.start(memory_store.clone()).await?;
    launcher
        .stage_directory(select_directory(&*game_folder)?)
        .await?;

    launcher.remove_data().await?;

    assert_eq!(launcher.state(), DataState::Absent);
    assert!(launcher.dependencies().is_pending(RunDependency::Data));
    assert!(launcher.messages().contains("Clearing /fheroes2/data/DATA"));
    {
        let fs = launcher.fs();
        let fs = fs.lock().await;
        assert!(fs.entry("fheroes2/data")?.is_directory());
        assert!(fs.list("fheroes2/data")?.is_empty());
    }

    let restarted = Launcher::new(config);
    assert_eq!(restarted.start(memory_store).await?, DataState::Absent);
    assert!(restarted.messages().contains("No local data found..."));
    Ok(())
}

#[rstest]
#[tokio::test]
async fn clear_removes_whole_subtree() -> anyhow::Result<()> {
    let fs = Arc::new(Mutex::new(VirtualFs::new()));
    {
        let mut fs = fs.lock().await;
        fs.ensure_directory("fheroes2/data/maps/campaign")?;
        fs.write_file("fheroes2/data/maps/campaign/m1.map", b"m1".to_vec())?;
        fs.write_file("fheroes2/data/maps/m2.map", b"m2".to_vec())?;
        fs.write_file("fheroes2/keep", b"keep".to_vec())?;
    }

    let failures = lifecycle(Arc::clone(&fs)).clear("fheroes2/data").await;

    assert_eq!(failures, 0);
    let fs = fs.lock().await;
    assert!(!fs.exists("fheroes2/data"));
    assert_eq!(
        fs.list("fheroes2")?.into_iter().collect::<std::collections::HashSet<_>>(),
        hashset![virtual_path("fheroes2/keep")]
    );
    Ok(())
}

#[rstest]
#[tokio::test]
async fn failed_sync_is_reported(config: LauncherConfig, game_archive: Vec<u8>) {
    let launcher = Launcher::new(config);
    launcher.start(ReadOnlyStore::default()).await.unwrap();

    let result = launcher.stage_archive(game_archive).await;

    assert!(matches!(result, Err(Error::Sync(_))));
    assert!(launcher.messages().contains("Failed to sync FS"));
    assert_eq!(launcher.state(), DataState::Absent);
    assert!(launcher
        .fs()
        .lock()
        .await
        .list("fheroes2/data")
        .unwrap()
        .is_empty());
}

#[rstest]
#[tokio::test]
async fn failed_removal_keeps_stored_data(
    config: LauncherConfig,
    game_folder: WithTempDir<PathBuf>,
    memory_store: MemoryStore,
) -> anyhow::Result<()> {
    let launcher = Launcher::new(config.clone());
    launcher.start(memory_store.clone()).await?;
    launcher
        .stage_directory(select_directory(&*game_folder)?)
        .await?;
    drop(launcher);

    let read_only = Launcher::new(config.clone());
    let store = ReadOnlyStore {
        inner: memory_store.clone(),
    };
    assert_eq!(read_only.start(store).await?, DataState::Present);

    let result = read_only.remove_data().await;

    assert!(matches!(result, Err(Error::Sync(_))));
    assert_eq!(read_only.state(), DataState::Present);
    assert!(!read_only.dependencies().is_pending(RunDependency::Data));
    assert_eq!(
        read_only
            .fs()
            .lock()
            .await
            .read_file("fheroes2/data/DATA/HEROES2.AGG")?,
        AGG_DATA
    );

    let restarted = Launcher::new(config);
    assert_eq!(restarted.start(memory_store).await?, DataState::Present);
    Ok(())
}
