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

use relative_path::RelativePath;
use rmp_serde::{from_read, to_vec};
use tracing::debug;

use crate::store::{BlockId, BlockKey, DataStore};

use super::entry::{Contents, Node, StoredNode};
use super::path_tree::PathTree;

/// The current format version of the tree persisted in a data store.
const FORMAT_VERSION: &[u8] = b"e0c5d6a2-3f7b-4b19-8a51-0d9c2b7e6f13";

/// Write the subtree at `point` to `store`.
///
/// Contents blocks which are already in the store are not written again, and blocks which are no
/// longer referenced by the tree are removed once the new tree has been written.
pub(super) fn persist(
    tree: &PathTree<Node>,
    point: &RelativePath,
    store: &mut dyn DataStore,
) -> crate::Result<()> {
    let existing = store
        .list_blocks()
        .map_err(crate::Error::Store)?
        .into_iter()
        .collect::<HashSet<BlockId>>();
    let mut referenced = HashSet::new();
    let mut snapshot = PathTree::new();

    for (path, node) in tree.walk(point).ok_or(crate::Error::NotFound)? {
        let relative_path = path
            .strip_prefix(point)
            .map_err(|_| crate::Error::InvalidPath)?;

        let block = match &node.contents {
            Some(contents) => {
                if !existing.contains(&contents.block) {
                    store
                        .write_block(BlockKey::Data(contents.block), &contents.data)
                        .map_err(crate::Error::Store)?;
                }
                referenced.insert(contents.block);
                Some(contents.block)
            }
            None => None,
        };

        snapshot.insert(
            relative_path,
            StoredNode {
                entry: node.entry.clone(),
                block,
            },
        );
    }

    let serialized = to_vec(&snapshot).map_err(|_| crate::Error::Serialize)?;
    store
        .write_block(BlockKey::Version, FORMAT_VERSION)
        .map_err(crate::Error::Store)?;
    store
        .write_block(BlockKey::Super, &serialized)
        .map_err(crate::Error::Store)?;

    for id in existing.difference(&referenced) {
        store
            .remove_block(BlockKey::Data(*id))
            .map_err(crate::Error::Store)?;
    }

    debug!(
        point = %point,
        written = referenced.difference(&existing).count(),
        removed = existing.difference(&referenced).count(),
        "Persisted mount point"
    );

    Ok(())
}

/// Replace the subtree at `point` with the tree stored in `store`.
///
/// A store which has never been written to loads as an empty directory. Nothing in memory is
/// changed unless the whole stored tree could be read.
pub(super) fn load(
    tree: &mut PathTree<Node>,
    point: &RelativePath,
    store: &mut dyn DataStore,
) -> crate::Result<()> {
    let snapshot: PathTree<StoredNode> = match store
        .read_block(BlockKey::Version)
        .map_err(crate::Error::Store)?
    {
        None => PathTree::new(),
        Some(version) if version != FORMAT_VERSION => return Err(crate::Error::UnsupportedStore),
        Some(_) => {
            let serialized = store
                .read_block(BlockKey::Super)
                .map_err(crate::Error::Store)?
                .ok_or(crate::Error::Corrupt)?;
            from_read(serialized.as_slice()).map_err(|_| crate::Error::Corrupt)?
        }
    };

    let mut loaded = Vec::new();
    for (path, stored) in snapshot.walk("").ok_or(crate::Error::Corrupt)? {
        let contents = match stored.block {
            Some(block) => {
                let data = store
                    .read_block(BlockKey::Data(block))
                    .map_err(crate::Error::Store)?
                    .ok_or(crate::Error::Corrupt)?;
                Some(Contents { block, data })
            }
            None => None,
        };

        if stored.entry.is_file() != contents.is_some() {
            return Err(crate::Error::Corrupt);
        }

        loaded.push((
            point.join(path),
            Node {
                entry: stored.entry.clone(),
                contents,
            },
        ));
    }

    let children = tree
        .list(point)
        .ok_or(crate::Error::NotFound)?
        .map(|(path, _)| path)
        .collect::<Vec<_>>();
    for child in children {
        tree.remove(child);
    }

    debug!(point = %point, entries = loaded.len(), "Loaded mount point");

    // Parents always come before their children.
    for (path, node) in loaded {
        tree.insert(path, node);
    }

    Ok(())
}
