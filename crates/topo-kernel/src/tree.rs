//! Insertion-ordered, path-addressable trees.
//!
//! A model keeps its sheets, projections, patterns and attributes in trees
//! keyed by tuples of strings. Iteration follows first-insertion order;
//! overwriting a path keeps its original position.

use crate::error::TopoError;
use indexmap::IndexMap;
use indexmap::map::Entry;
use std::fmt;

/// A tuple-of-strings key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TreePath(Vec<String>);

impl TreePath {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Split a dotted string (`"a.b.c"`) into segments.
    pub fn dotted(path: &str) -> Self {
        Self::new(path.split('.'))
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn starts_with(&self, prefix: &[&str]) -> bool {
        prefix.len() <= self.0.len() && self.0.iter().zip(prefix).all(|(a, b)| a == b)
    }
}

impl fmt::Display for TreePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

impl From<&str> for TreePath {
    fn from(segment: &str) -> Self {
        Self(vec![segment.to_string()])
    }
}

impl From<String> for TreePath {
    fn from(segment: String) -> Self {
        Self(vec![segment])
    }
}

impl<const N: usize> From<[&str; N]> for TreePath {
    fn from(segments: [&str; N]) -> Self {
        Self::new(segments)
    }
}

impl From<Vec<String>> for TreePath {
    fn from(segments: Vec<String>) -> Self {
        Self(segments)
    }
}

/// Ordered map from [`TreePath`] to values.
#[derive(Debug, Clone, PartialEq)]
pub struct PathTree<V> {
    label: &'static str,
    entries: IndexMap<TreePath, V>,
}

impl<V> PathTree<V> {
    /// `label` names the tree in collision errors.
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            entries: IndexMap::new(),
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Insert or overwrite. Returns the previous value if the path existed.
    pub fn set_path(&mut self, path: impl Into<TreePath>, value: V) -> Option<V> {
        self.entries.insert(path.into(), value)
    }

    /// Insert, failing if the path is already occupied.
    pub fn insert_new(&mut self, path: impl Into<TreePath>, value: V) -> Result<(), TopoError> {
        match self.entries.entry(path.into()) {
            Entry::Occupied(occupied) => Err(TopoError::DuplicatePath {
                tree: self.label,
                path: occupied.key().to_string(),
            }),
            Entry::Vacant(vacant) => {
                vacant.insert(value);
                Ok(())
            }
        }
    }

    pub fn get_path(&self, path: &TreePath) -> Option<&V> {
        self.entries.get(path)
    }

    pub fn get_path_mut(&mut self, path: &TreePath) -> Option<&mut V> {
        self.entries.get_mut(path)
    }

    pub fn items(&self) -> impl Iterator<Item = (&TreePath, &V)> {
        self.entries.iter()
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.values()
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> {
        self.entries.values_mut()
    }

    /// Entries whose path begins with `prefix`, in tree order.
    pub fn subtree<'a>(
        &'a self,
        prefix: &'a [&'a str],
    ) -> impl Iterator<Item = (&'a TreePath, &'a V)> {
        self.entries
            .iter()
            .filter(move |(path, _)| path.starts_with(prefix))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iteration_keeps_first_seen_order_on_overwrite() {
        let mut tree = PathTree::new("sheets");
        tree.set_path("V1", 1);
        tree.set_path("LGN", 2);
        assert_eq!(tree.set_path("V1", 3), Some(1));

        let items: Vec<(String, i32)> = tree
            .items()
            .map(|(path, value)| (path.to_string(), *value))
            .collect();
        assert_eq!(items, vec![("V1".to_string(), 3), ("LGN".to_string(), 2)]);
    }

    #[test]
    fn insert_new_rejects_occupied_path() {
        let mut tree = PathTree::new("projections");
        tree.insert_new(["V1", "LGNOn", "Afferent"], ())
            .expect("first insert");
        let err = tree
            .insert_new(["V1", "LGNOn", "Afferent"], ())
            .expect_err("second insert must fail");
        assert_eq!(
            err,
            TopoError::DuplicatePath {
                tree: "projections",
                path: "V1.LGNOn.Afferent".into(),
            }
        );
    }

    #[test]
    fn subtree_filters_by_prefix() {
        let mut tree = PathTree::new("projections");
        tree.set_path(["V1", "LGNOn", "AfferentOn"], 1);
        tree.set_path(["V2", "V1", "Afferent"], 2);
        tree.set_path(["V1", "V1", "LateralExcitatory"], 3);
        let into_v1: Vec<i32> = tree.subtree(&["V1"]).map(|(_, v)| *v).collect();
        assert_eq!(into_v1, vec![1, 3]);
        assert_eq!(TreePath::dotted("a.b").segments(), ["a", "b"]);
    }
}
