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

use std::collections::{hash_map, HashMap};
use std::fmt::{Debug, Formatter};
use std::iter::{self, ExactSizeIterator, FusedIterator};

use relative_path::{RelativePath, RelativePathBuf};
use serde::{Deserialize, Serialize};

/// Recursively iterate through the tree of nodes.
fn walk_nodes<'a, V>(
    parent: impl AsRef<RelativePath> + 'a,
    children: &'a HashMap<String, PathNode<V>>,
) -> Box<dyn Iterator<Item = (RelativePathBuf, &'a V)> + 'a> {
    Box::new(children.iter().flat_map(move |(name, node)| {
        iter::once((parent.as_ref().join(name), &node.value))
            .chain(walk_nodes(parent.as_ref().join(name), &node.children))
    }))
}

/// An iterator over the children of a path in a `PathTree`.
#[derive(Debug, Clone)]
pub struct List<'a, V> {
    parent: RelativePathBuf,
    children: hash_map::Iter<'a, String, PathNode<V>>,
}

impl<'a, V> Iterator for List<'a, V> {
    type Item = (RelativePathBuf, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.children
            .next()
            .map(|(name, node)| (self.parent.join(name), &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.children.size_hint()
    }
}

impl<'a, V> FusedIterator for List<'a, V> {}

impl<'a, V> ExactSizeIterator for List<'a, V> {}

/// An iterator over the descendants of a path in a `PathTree`.
pub struct Walk<'a, V> {
    parent: RelativePathBuf,
    inner: Box<dyn Iterator<Item = (RelativePathBuf, &'a V)> + 'a>,
}

impl<'a, V> Iterator for Walk<'a, V> {
    type Item = (RelativePathBuf, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

impl<'a, V> Debug for Walk<'a, V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Walk")
            .field("parent", &self.parent)
            .finish()
    }
}

/// A node in a `PathTree`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PathNode<V> {
    /// The node's children, keyed by file name.
    children: HashMap<String, PathNode<V>>,

    /// The associated value.
    value: V,
}

impl<V> PathNode<V> {
    fn new(value: V) -> Self {
        PathNode {
            children: HashMap::new(),
            value,
        }
    }
}

/// A tree that associates file paths with values of type `V`.
///
/// The empty path is the implicit root of the tree and never has a value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathTree<V> {
    nodes: HashMap<String, PathNode<V>>,
}

impl<V> Default for PathTree<V> {
    fn default() -> Self {
        Self {
            nodes: HashMap::new(),
        }
    }
}

impl<V> PathTree<V> {
    /// Return a new empty `PathTree`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the children of the node at `path`, or the top-level nodes for the empty path.
    fn children(&self, path: &RelativePath) -> Option<&HashMap<String, PathNode<V>>> {
        let mut current_nodes = &self.nodes;

        for segment in path.iter() {
            current_nodes = &current_nodes.get(segment)?.children;
        }

        Some(current_nodes)
    }

    /// Return the value associated with `path`.
    ///
    /// This returns `None` if `path` is not in the tree or is the empty path.
    pub fn get(&self, path: impl AsRef<RelativePath>) -> Option<&V> {
        let mut current_nodes = &self.nodes;
        let mut current_value = None;

        for segment in path.as_ref().iter() {
            let node = current_nodes.get(segment)?;
            current_nodes = &node.children;
            current_value = Some(&node.value);
        }

        current_value
    }

    /// Return the value associated with `path`.
    ///
    /// This returns `None` if `path` is not in the tree or is the empty path.
    pub fn get_mut(&mut self, path: impl AsRef<RelativePath>) -> Option<&mut V> {
        let mut current_nodes = &mut self.nodes;
        let mut current_value = None;

        for segment in path.as_ref().iter() {
            let node = current_nodes.get_mut(segment)?;
            current_nodes = &mut node.children;
            current_value = Some(&mut node.value);
        }

        current_value
    }

    /// Insert the given `path` and `value` into the tree.
    ///
    /// This returns the value of the existing path if it already existed or `None` if it did not.
    /// Replacing an existing path keeps its children.
    ///
    /// # Panics
    /// - The parent path does not exist.
    pub fn insert(&mut self, path: impl AsRef<RelativePath>, value: V) -> Option<V> {
        let mut current_nodes = &mut self.nodes;
        let mut segments = path.as_ref().iter();
        let mut segment = segments.next()?;

        for next_segment in segments {
            let node = match current_nodes.get_mut(segment) {
                Some(node) => node,
                None => panic!("The parent path does not exist."),
            };

            current_nodes = &mut node.children;

            segment = next_segment;
        }

        match current_nodes.get_mut(segment) {
            Some(node) => Some(std::mem::replace(&mut node.value, value)),
            None => {
                current_nodes.insert(segment.to_string(), PathNode::new(value));
                None
            }
        }
    }

    /// Remove the given `path` and its descendants from the tree.
    ///
    /// If the path is in the tree, this returns its value. Otherwise, this returns `None`.
    pub fn remove(&mut self, path: impl AsRef<RelativePath>) -> Option<V> {
        let mut current_nodes = &mut self.nodes;
        let mut segments = path.as_ref().iter();
        let mut segment = segments.next()?;

        for next_segment in segments {
            let node = current_nodes.get_mut(segment)?;
            current_nodes = &mut node.children;
            segment = next_segment;
        }

        Some(current_nodes.remove(segment)?.value)
    }

    /// Return the number of children of `path`.
    ///
    /// If the path is not in the tree, this returns `None`.
    pub fn child_count(&self, path: impl AsRef<RelativePath>) -> Option<usize> {
        Some(self.children(path.as_ref())?.len())
    }

    /// Return an iterator of the children of `path` and their values.
    ///
    /// If the path is not in the tree, this returns `None`.
    ///
    /// The returned iterator does not include the parent `path`.
    pub fn list<'a>(&'a self, path: impl AsRef<RelativePath> + 'a) -> Option<List<'a, V>> {
        let children = self.children(path.as_ref())?;

        Some(List {
            parent: path.as_ref().to_owned(),
            children: children.iter(),
        })
    }

    /// Return an iterator of the descendants of `path` and their values.
    ///
    /// If the path is not in the tree, this returns `None`.
    ///
    /// The returned iterator does not include the parent `path`. Descendants are returned in
    /// depth-first order, so a path always comes before its children.
    pub fn walk<'a>(&'a self, path: impl AsRef<RelativePath> + 'a) -> Option<Walk<'a, V>> {
        let children = self.children(path.as_ref())?;

        Some(Walk {
            parent: path.as_ref().to_owned(),
            inner: walk_nodes(path, children),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use maplit::hashset;
    use relative_path::RelativePathBuf;

    use super::PathTree;

    #[test]
    fn nested_paths_are_found() {
        let mut tree = PathTree::new();
        tree.insert("fheroes2", 1);
        tree.insert("fheroes2/data", 2);

        assert_eq!(tree.get("fheroes2"), Some(&1));
        assert_eq!(tree.get("fheroes2/data"), Some(&2));
        assert_eq!(tree.get("fheroes2/maps"), None);
    }

    #[test]
    fn root_has_no_value() {
        let mut tree = PathTree::new();
        tree.insert("a", 1);

        assert_eq!(tree.get(""), None);
        assert_eq!(tree.child_count(""), Some(1));
    }

    #[test]
    #[should_panic]
    fn inserting_with_missing_parent_panics() {
        let mut tree = PathTree::new();
        tree.insert("a", 1);
        tree.insert("a/b/c", 2);
    }

    #[test]
    fn replacing_value_keeps_children() {
        let mut tree = PathTree::new();
        tree.insert("a", 1);
        tree.insert("a/b", 2);

        assert_eq!(tree.insert("a", 3), Some(1));
        assert_eq!(tree.get("a"), Some(&3));
        assert_eq!(tree.get("a/b"), Some(&2));
    }

    #[test]
    fn removing_parent_removes_children() {
        let mut tree = PathTree::new();
        tree.insert("a", 1);
        tree.insert("a/b", 2);
        tree.insert("c", 3);

        assert_eq!(tree.remove("a"), Some(1));
        assert_eq!(tree.get("a/b"), None);
        assert_eq!(tree.get("c"), Some(&3));
    }

    #[test]
    fn list_children() {
        let mut tree = PathTree::new();
        tree.insert("a", 1);
        tree.insert("a/b", 2);
        tree.insert("a/c", 3);
        tree.insert("a/b/d", 4);

        let expected = hashset![
            (RelativePathBuf::from("a/b"), &2),
            (RelativePathBuf::from("a/c"), &3),
        ];
        let actual = tree.list("a").unwrap().collect::<HashSet<_>>();

        assert_eq!(actual, expected);
        assert!(tree.list("a/x").is_none());
    }

    #[test]
    fn walk_visits_parents_first() {
        let mut tree = PathTree::new();
        tree.insert("a", 1);
        tree.insert("a/b", 2);
        tree.insert("a/b/c", 3);
        tree.insert("d", 4);

        let walked = tree.walk("").unwrap().collect::<Vec<_>>();
        let position = |path: &str| {
            walked
                .iter()
                .position(|(walked_path, _)| walked_path == &RelativePathBuf::from(path))
                .unwrap()
        };

        assert_eq!(walked.len(), 4);
        assert!(position("a") < position("a/b"));
        assert!(position("a/b") < position("a/b/c"));
    }
}
