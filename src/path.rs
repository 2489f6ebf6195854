//! Node addresses inside a game tree.
//!
//! A path is a list of indices: every element but the last selects a
//! variation at successive branching levels, the last one selects a node in
//! the sequence reached. `[0]` is the root node. Paths are immutable values;
//! derived paths are new allocations, so a stored path never changes under
//! its holder.

use std::cmp::Ordering;
use std::fmt;
use std::num::ParseIntError;
use std::ops::Deref;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Path(Arc<[usize]>);

impl Path {
    /// Path of the root node, `[0]`.
    pub fn root() -> Path {
        Path::from([0])
    }

    /// An empty path. Only used to tag errors that belong to a whole tree.
    pub fn empty() -> Path {
        Path::from(Vec::new())
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    /// Index of the node inside its sequence.
    pub fn node_index(&self) -> usize {
        self.0.last().copied().unwrap_or(0)
    }

    /// The variation selectors leading to the node's sequence.
    pub fn branches(&self) -> &[usize] {
        match self.0.split_last() {
            Some((_, prefix)) => prefix,
            None => &[],
        }
    }

    pub fn is_root(&self) -> bool {
        self.as_slice() == [0]
    }

    /// Whether the node is the first one of a variation (and not the root).
    pub fn is_branch_start(&self) -> bool {
        self.len() > 1 && self.node_index() == 0
    }

    /// Same sequence, another node index.
    pub fn with_node(&self, index: usize) -> Path {
        let mut v = self.branches().to_vec();
        v.push(index);
        Path::from(v)
    }

    /// First node of variation `variation` branching after this node's sequence.
    pub fn child(&self, variation: usize) -> Path {
        let mut v = self.branches().to_vec();
        v.extend([variation, 0]);
        Path::from(v)
    }

    /// Same branch level, sibling variation `variation`. Only meaningful on a
    /// branch-initial node.
    pub fn sibling(&self, variation: usize) -> Path {
        let mut v = self.0.to_vec();
        let len = v.len();
        if len >= 2 {
            v[len - 2] = variation;
        }
        Path::from(v)
    }

    /// Compare two paths along the tree structure.
    ///
    /// `Less` means `self` is an ancestor of `other`, `Greater` a descendant,
    /// `Equal` the same node. `None` when the paths lead into different
    /// variations and are unrelated.
    pub fn relation(&self, other: &Path) -> Option<Ordering> {
        let (a, b) = (self.as_slice(), other.as_slice());
        if a.len() < b.len() {
            return other.relation(self).map(Ordering::reverse);
        }
        let last = b.len().checked_sub(1)?;
        if a[..last] != b[..last] {
            return None;
        }
        if a.len() == b.len() && a[last] == b[last] {
            return Some(Ordering::Equal);
        }
        // Every node of a sequence precedes all of its variations.
        if a.len() > b.len() || a[last] > b[last] {
            Some(Ordering::Greater)
        } else {
            Some(Ordering::Less)
        }
    }

    pub fn is_ancestor_of(&self, other: &Path) -> bool {
        self.relation(other) == Some(Ordering::Less)
    }

    pub fn is_descendant_of(&self, other: &Path) -> bool {
        self.relation(other) == Some(Ordering::Greater)
    }
}

impl Deref for Path {
    type Target = [usize];

    fn deref(&self) -> &[usize] {
        &self.0
    }
}

impl From<Vec<usize>> for Path {
    fn from(v: Vec<usize>) -> Self {
        Path(Arc::from(v))
    }
}

impl From<&[usize]> for Path {
    fn from(v: &[usize]) -> Self {
        Path(Arc::from(v))
    }
}

impl<const N: usize> From<[usize; N]> for Path {
    fn from(v: [usize; N]) -> Self {
        Path(Arc::from(v.as_slice()))
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

/// `0:1:3` form, also accepted by the CLI.
impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(usize::to_string).collect();
        f.write_str(&parts.join(":"))
    }
}

/// Parses `0:1:3` or `0,1,3`.
impl FromStr for Path {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split([':', ','])
            .map(|part| part.trim().parse())
            .collect::<Result<Vec<usize>, _>>()
            .map(Path::from)
    }
}

impl Serialize for Path {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.as_slice().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Path {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<usize>::deserialize(deserializer).map(Path::from)
    }
}
