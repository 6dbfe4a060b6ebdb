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

use std::time::SystemTime;

use relative_path::{Component, RelativePath, RelativePathBuf};
use tracing::debug;

use crate::store::{BlockId, DataStore};

use super::entry::{Contents, Entry, Node};
use super::path_tree::PathTree;
use super::sync::{load, persist};

/// The direction in which a mount point is synchronized with its data store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncDirection {
    /// Replace the contents of the mount point with what is in the data store.
    Load,

    /// Write the contents of the mount point to the data store.
    Persist,
}

/// Return the virtual path for a slash-delimited `path`.
///
/// Leading, trailing and repeated slashes are ignored, so `"/fheroes2/data/"` and
/// `"fheroes2/data"` are the same path.
pub fn virtual_path(path: &str) -> RelativePathBuf {
    let mut virtual_path = RelativePathBuf::new();
    for segment in path.split('/').filter(|segment| !segment.is_empty()) {
        virtual_path.push(segment);
    }
    virtual_path
}

/// Return `path` without `.` components, failing if it tries to escape the root.
fn normalize(path: &RelativePath) -> crate::Result<RelativePathBuf> {
    let mut normalized = RelativePathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(name) => normalized.push(name),
            Component::CurDir => {}
            Component::ParentDir => return Err(crate::Error::InvalidPath),
        }
    }
    Ok(normalized)
}

fn is_root(path: &RelativePath) -> bool {
    path.as_str().is_empty()
}

/// A data store mounted at a directory of the file system.
#[derive(Debug)]
struct Mount {
    point: RelativePathBuf,
    store: Box<dyn DataStore>,
}

/// An in-memory file system whose subtrees can be persisted to data stores.
///
/// A `VirtualFs` is a tree of regular files and directories rooted at the empty path. Every
/// operation happens in memory. A subtree only becomes durable once a [`DataStore`] has been
/// mounted at its root with [`mount`] and the file system has been synced with
/// [`SyncDirection::Persist`]. Syncing with [`SyncDirection::Load`] replaces the subtree with
/// whatever was last persisted.
///
/// Paths are relative to the root; `.` components are ignored and `..` components are rejected
/// with [`Error::InvalidPath`].
///
/// [`DataStore`]: crate::store::DataStore
/// [`mount`]: crate::fs::VirtualFs::mount
/// [`Error::InvalidPath`]: crate::Error::InvalidPath
#[derive(Debug)]
pub struct VirtualFs {
    root: Entry,
    tree: PathTree<Node>,
    mounts: Vec<Mount>,
}

impl Default for VirtualFs {
    fn default() -> Self {
        VirtualFs {
            root: Entry::directory(),
            tree: PathTree::new(),
            mounts: Vec::new(),
        }
    }
}

impl VirtualFs {
    /// Return a new file system containing only the root directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return whether the given `path` exists.
    pub fn exists(&self, path: impl AsRef<RelativePath>) -> bool {
        self.entry(path).is_ok()
    }

    /// Return the entry at `path`.
    ///
    /// # Errors
    /// - `Error::NotFound`: There is no file at `path`.
    /// - `Error::InvalidPath`: The path contains a `..` component.
    pub fn entry(&self, path: impl AsRef<RelativePath>) -> crate::Result<&Entry> {
        let path = normalize(path.as_ref())?;
        if is_root(&path) {
            return Ok(&self.root);
        }
        self.tree
            .get(&path)
            .map(|node| &node.entry)
            .ok_or(crate::Error::NotFound)
    }

    /// Return an `Error::InvalidPath` if the parent of `path` is missing or not a directory.
    fn check_parent(&self, path: &RelativePath) -> crate::Result<()> {
        if let Some(parent) = path.parent() {
            match self.entry(parent) {
                Ok(entry) if entry.is_directory() => Ok(()),
                _ => Err(crate::Error::InvalidPath),
            }
        } else {
            Ok(())
        }
    }

    /// Return the paths of the children of the directory at `path`.
    ///
    /// # Errors
    /// - `Error::NotFound`: There is no file at `path`.
    /// - `Error::NotDirectory`: The file at `path` is not a directory.
    /// - `Error::InvalidPath`: The path contains a `..` component.
    pub fn list(&self, path: impl AsRef<RelativePath>) -> crate::Result<Vec<RelativePathBuf>> {
        let path = normalize(path.as_ref())?;
        if !self.entry(&path)?.is_directory() {
            return Err(crate::Error::NotDirectory);
        }

        Ok(self
            .tree
            .list(&path)
            .map(|children| children.map(|(child, _)| child).collect())
            .unwrap_or_default())
    }

    /// Create a new empty directory at `path`.
    ///
    /// # Errors
    /// - `Error::AlreadyExists`: There is already a file at `path`.
    /// - `Error::InvalidPath`: The parent of `path` does not exist or is not a directory.
    pub fn mkdir(&mut self, path: impl AsRef<RelativePath>) -> crate::Result<()> {
        let path = normalize(path.as_ref())?;
        if self.exists(&path) {
            return Err(crate::Error::AlreadyExists);
        }
        self.check_parent(&path)?;

        self.tree.insert(
            path,
            Node {
                entry: Entry::directory(),
                contents: None,
            },
        );

        Ok(())
    }

    /// Create the directory at `path` and all of its missing ancestors.
    ///
    /// If the directory already exists, this does nothing. Directories created concurrently by
    /// someone else are not an error, so calling this repeatedly with the same `path` always
    /// leaves exactly one directory at each prefix of `path`.
    ///
    /// # Errors
    /// - `Error::NotDirectory`: `path` or one of its ancestors is a regular file.
    /// - `Error::InvalidPath`: The path contains a `..` component.
    pub fn ensure_directory(&mut self, path: impl AsRef<RelativePath>) -> crate::Result<()> {
        let path = normalize(path.as_ref())?;
        match self.entry(&path) {
            Ok(entry) if entry.is_directory() => return Ok(()),
            Ok(_) => return Err(crate::Error::NotDirectory),
            Err(crate::Error::NotFound) => {}
            Err(error) => return Err(error),
        }

        debug!(path = %format!("/{}", path), "Creating new directory");

        let mut ancestor = RelativePathBuf::new();
        for segment in path.iter() {
            ancestor.push(segment);
            match self.mkdir(&ancestor) {
                Ok(()) => {}
                Err(crate::Error::AlreadyExists) => {
                    if !self.entry(&ancestor)?.is_directory() {
                        return Err(crate::Error::NotDirectory);
                    }
                }
                Err(error) => return Err(error),
            }
        }

        Ok(())
    }

    /// Write `data` to the regular file at `path`, creating it if it does not exist.
    ///
    /// # Errors
    /// - `Error::NotFile`: The file at `path` is a directory.
    /// - `Error::InvalidPath`: The parent of `path` does not exist or is not a directory, or
    /// `path` is the root.
    pub fn write_file(
        &mut self,
        path: impl AsRef<RelativePath>,
        data: impl Into<Vec<u8>>,
    ) -> crate::Result<()> {
        let path = normalize(path.as_ref())?;
        if is_root(&path) {
            return Err(crate::Error::InvalidPath);
        }
        self.check_parent(&path)?;

        let contents = Contents {
            block: BlockId::random(),
            data: data.into(),
        };

        match self.tree.get_mut(&path) {
            Some(node) if node.entry.is_directory() => return Err(crate::Error::NotFile),
            Some(node) => {
                let now = SystemTime::now();
                node.entry.times.modified = now;
                node.entry.times.changed = now;
                node.contents = Some(contents);
            }
            None => {
                self.tree.insert(
                    path,
                    Node {
                        entry: Entry::file(),
                        contents: Some(contents),
                    },
                );
            }
        }

        Ok(())
    }

    /// Return the contents of the regular file at `path`.
    ///
    /// # Errors
    /// - `Error::NotFound`: There is no file at `path`.
    /// - `Error::NotFile`: The file at `path` is a directory.
    /// - `Error::InvalidPath`: The path contains a `..` component.
    pub fn read_file(&self, path: impl AsRef<RelativePath>) -> crate::Result<&[u8]> {
        let path = normalize(path.as_ref())?;
        if is_root(&path) {
            return Err(crate::Error::NotFile);
        }
        let node = self.tree.get(&path).ok_or(crate::Error::NotFound)?;
        node.contents
            .as_ref()
            .map(|contents| contents.data.as_slice())
            .ok_or(crate::Error::NotFile)
    }

    /// Remove the regular file at `path`.
    ///
    /// # Errors
    /// - `Error::NotFound`: There is no file at `path`.
    /// - `Error::NotFile`: The file at `path` is a directory.
    /// - `Error::InvalidPath`: The path contains a `..` component.
    pub fn unlink(&mut self, path: impl AsRef<RelativePath>) -> crate::Result<()> {
        let path = normalize(path.as_ref())?;
        if !self.entry(&path)?.is_file() {
            return Err(crate::Error::NotFile);
        }
        self.tree.remove(&path);
        Ok(())
    }

    /// Remove the empty directory at `path`.
    ///
    /// # Errors
    /// - `Error::NotFound`: There is no file at `path`.
    /// - `Error::NotDirectory`: The file at `path` is a regular file.
    /// - `Error::NotEmpty`: The directory has children.
    /// - `Error::InvalidPath`: `path` is the root or a mount point.
    pub fn rmdir(&mut self, path: impl AsRef<RelativePath>) -> crate::Result<()> {
        let path = normalize(path.as_ref())?;
        if is_root(&path) || self.mount_index(&path).is_some() {
            return Err(crate::Error::InvalidPath);
        }
        if !self.entry(&path)?.is_directory() {
            return Err(crate::Error::NotDirectory);
        }
        if self.tree.child_count(&path).unwrap_or(0) > 0 {
            return Err(crate::Error::NotEmpty);
        }
        self.tree.remove(&path);
        Ok(())
    }

    fn mount_index(&self, point: &RelativePath) -> Option<usize> {
        self.mounts
            .iter()
            .position(|mount| mount.point.as_relative_path() == point)
    }

    /// Return whether a data store is mounted at `point`.
    pub fn is_mounted(&self, point: impl AsRef<RelativePath>) -> bool {
        match normalize(point.as_ref()) {
            Ok(point) => self.mount_index(&point).is_some(),
            Err(_) => false,
        }
    }

    /// Mount `store` at the directory `point`.
    ///
    /// This does not load anything from the store; sync the file system with
    /// [`SyncDirection::Load`] to do that.
    ///
    /// # Errors
    /// - `Error::NotFound`: There is no file at `point`.
    /// - `Error::NotDirectory`: The file at `point` is not a directory.
    /// - `Error::AlreadyExists`: A store is already mounted at `point`.
    pub fn mount(
        &mut self,
        point: impl AsRef<RelativePath>,
        store: impl DataStore + 'static,
    ) -> crate::Result<()> {
        let point = normalize(point.as_ref())?;
        if !self.entry(&point)?.is_directory() {
            return Err(crate::Error::NotDirectory);
        }
        if self.mount_index(&point).is_some() {
            return Err(crate::Error::AlreadyExists);
        }

        debug!(point = %format!("/{}", point), "Mounting data store");
        self.mounts.push(Mount {
            point,
            store: Box::new(store),
        });
        Ok(())
    }

    /// Unmount and return the store mounted at `point`.
    ///
    /// The contents of the mount point are left in memory.
    ///
    /// # Errors
    /// - `Error::NotMounted`: No store is mounted at `point`.
    pub fn unmount(
        &mut self,
        point: impl AsRef<RelativePath>,
    ) -> crate::Result<Box<dyn DataStore>> {
        let point = normalize(point.as_ref())?;
        let index = self.mount_index(&point).ok_or(crate::Error::NotMounted)?;
        Ok(self.mounts.remove(index).store)
    }

    /// Synchronize every mount point with its data store in the given `direction`.
    ///
    /// # Errors
    /// - `Error::NotMounted`: Nothing is mounted.
    /// - `Error::NotFound`: A mount point has been removed from the tree.
    /// - `Error::UnsupportedStore`: A store was written by an incompatible format version.
    /// - `Error::Corrupt`: A store is missing blocks or its tree could not be deserialized.
    /// - `Error::Store`: A store returned an error.
    pub fn sync(&mut self, direction: SyncDirection) -> crate::Result<()> {
        if self.mounts.is_empty() {
            return Err(crate::Error::NotMounted);
        }

        for mount in self.mounts.iter_mut() {
            match direction {
                SyncDirection::Persist => persist(&self.tree, &mount.point, mount.store.as_mut())?,
                SyncDirection::Load => load(&mut self.tree, &mount.point, mount.store.as_mut())?,
            }
        }

        Ok(())
    }
}
