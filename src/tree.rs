//! Game tree model.
//!
//! A [`GameTree`] is a sequence of [`Node`]s followed by alternative
//! continuations (variations), each of which is again a game tree. Nodes hold
//! decoded property values plus, optionally, the undecoded raw values of
//! properties that were unknown or failed validation.

use std::cell::Cell;
use std::fmt;
use std::ops::ControlFlow;

use indexmap::IndexMap;
use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::codec;
use crate::error::ErrorRecord;
use crate::path::Path;
use crate::property::Property;
use crate::value::{Color, Point, Value};

/// Classification of a node by the properties it carries.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Carries root-only properties (`FF`, `GM`, `SZ`, ...).
    Root,
    Setup,
    Move,
    Undefined,
}

/// A node: insertion-ordered decoded properties plus a raw side channel.
#[derive(Clone, Debug, Default)]
pub struct Node {
    props: IndexMap<Property, Value>,
    raw: IndexMap<String, Vec<Vec<u8>>>,
    kind: Cell<Option<NodeKind>>,
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.props == other.props && self.raw == other.raw
    }
}

impl Node {
    pub fn new() -> Self {
        Node::default()
    }

    pub fn get(&self, prop: Property) -> Option<&Value> {
        self.props.get(&prop)
    }

    pub fn contains(&self, prop: Property) -> bool {
        self.props.contains_key(&prop)
    }

    /// Set a decoded value, returning the previous one.
    pub fn set(&mut self, prop: Property, value: impl Into<Value>) -> Option<Value> {
        self.invalidate_kind();
        self.props.insert(prop, value.into())
    }

    /// Remove a decoded value, keeping the order of the others.
    pub fn remove(&mut self, prop: Property) -> Option<Value> {
        self.invalidate_kind();
        self.props.shift_remove(&prop)
    }

    /// Decoded properties in insertion order.
    pub fn props(&self) -> impl Iterator<Item = (Property, &Value)> {
        self.props.iter().map(|(p, v)| (*p, v))
    }

    /// Points held by a point-list property, empty when absent.
    pub fn points(&self, prop: Property) -> Vec<Point> {
        self.get(prop).map(|v| v.points().collect()).unwrap_or_default()
    }

    /// Store a point list, removing the property when the list is empty.
    pub fn set_points(&mut self, prop: Property, points: Vec<Point>) {
        if points.is_empty() {
            self.remove(prop);
        } else {
            self.set(prop, points);
        }
    }

    /// Number of decoded properties.
    pub fn len(&self) -> usize {
        self.props.len()
    }

    pub fn is_empty(&self) -> bool {
        self.props.is_empty() && self.raw.is_empty()
    }

    /// Undecoded values by property identifier.
    pub fn raw(&self) -> &IndexMap<String, Vec<Vec<u8>>> {
        &self.raw
    }

    /// Append a raw value for `code`.
    pub fn push_raw(&mut self, code: &str, value: &[u8]) {
        self.raw.entry(code.to_string()).or_default().push(value.to_vec());
    }

    pub fn set_raw(&mut self, code: &str, values: Vec<Vec<u8>>) {
        self.raw.insert(code.to_string(), values);
    }

    /// Remove and return the raw values of `code`.
    pub fn take_raw(&mut self, code: &str) -> Option<Vec<Vec<u8>>> {
        self.invalidate_kind();
        self.raw.shift_remove(code)
    }

    pub fn clear_raw(&mut self) {
        self.raw.clear();
    }

    /// The move recorded on this node. `B` wins when both colors are set.
    pub fn move_played(&self) -> Option<(Color, Point)> {
        [Color::Black, Color::White].into_iter().find_map(|color| {
            self.get(Property::move_of(color))
                .and_then(Value::as_point)
                .map(|p| (color, p))
        })
    }

    /// Cached classification of the node.
    pub fn kind(&self) -> NodeKind {
        if let Some(kind) = self.kind.get() {
            return kind;
        }
        let kind = if self.props.keys().any(|p| p.is_root_only()) {
            NodeKind::Root
        } else if self.props.keys().any(|p| p.is_move()) {
            NodeKind::Move
        } else if self.props.keys().any(|p| p.is_setup()) {
            NodeKind::Setup
        } else {
            NodeKind::Undefined
        };
        self.kind.set(Some(kind));
        kind
    }

    /// Drop the cached classification. Mutators call this already.
    pub fn invalidate_kind(&self) {
        self.kind.set(None);
    }

    /// SGF form of the node, starting with `;`.
    pub fn to_sgf(&self) -> String {
        codec::node_to_sgf(self)
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let extra = usize::from(!self.raw.is_empty());
        let mut map = serializer.serialize_map(Some(self.props.len() + extra))?;
        for (prop, value) in &self.props {
            map.serialize_entry(prop.code(), value)?;
        }
        if !self.raw.is_empty() {
            let raw: IndexMap<&str, Vec<String>> = self
                .raw
                .iter()
                .map(|(k, values)| {
                    let values = values
                        .iter()
                        .map(|v| String::from_utf8_lossy(v).into_owned())
                        .collect();
                    (k.as_str(), values)
                })
                .collect();
            map.serialize_entry("_raw", &raw)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(NodeVisitor)
    }
}

struct NodeVisitor;

impl<'de> Visitor<'de> for NodeVisitor {
    type Value = Node;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of SGF properties")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Node, A::Error> {
        let mut node = Node::new();
        while let Some(key) = map.next_key::<String>()? {
            if key == "_raw" {
                let raw: IndexMap<String, Vec<String>> = map.next_value()?;
                for (code, values) in raw {
                    node.set_raw(&code, values.into_iter().map(String::into_bytes).collect());
                }
                continue;
            }
            let value: Value = map.next_value()?;
            match Property::from_code(&key) {
                Some(prop) => {
                    let value = prop
                        .coerce(value)
                        .ok_or_else(|| de::Error::custom(format!("invalid value for property '{key}'")))?;
                    node.set(prop, value);
                }
                None => {
                    let values = value
                        .items()
                        .iter()
                        .map(|v| v.as_text().map(|s| s.as_bytes().to_vec()))
                        .collect::<Option<Vec<_>>>()
                        .ok_or_else(|| de::Error::custom(format!("unknown property '{key}' must hold text")))?;
                    node.set_raw(&key, values);
                }
            }
        }
        Ok(node)
    }
}

/// A sequence of nodes with its variations.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GameTree {
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub variations: Vec<GameTree>,
    /// Validation errors, tagged with node paths.
    #[serde(default, skip_deserializing, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ErrorRecord>,
}

impl GameTree {
    pub fn new(nodes: Vec<Node>, variations: Vec<GameTree>) -> Self {
        GameTree {
            nodes,
            variations,
            errors: Vec::new(),
        }
    }

    /// Error-only stand-in for a game that failed validation.
    pub fn placeholder(errors: Vec<ErrorRecord>) -> Self {
        GameTree {
            errors,
            ..GameTree::default()
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn add_node(&mut self, node: Node) {
        self.nodes.push(node);
    }

    /// Append a variation. Trees without nodes are ignored.
    pub fn add_variation(&mut self, variation: GameTree) {
        if !variation.nodes.is_empty() {
            self.variations.push(variation);
        }
    }

    /// The sequence reached by following `branches`.
    pub fn sequence(&self, branches: &[usize]) -> Option<&GameTree> {
        branches.iter().try_fold(self, |t, &i| t.variations.get(i))
    }

    pub fn sequence_mut(&mut self, branches: &[usize]) -> Option<&mut GameTree> {
        branches
            .iter()
            .try_fold(self, |t, &i| t.variations.get_mut(i))
    }

    /// Node at `path`, if the path exists.
    pub fn get(&self, path: &[usize]) -> Option<&Node> {
        let (index, branches) = path.split_last()?;
        self.sequence(branches)?.nodes.get(*index)
    }

    pub fn get_mut(&mut self, path: &[usize]) -> Option<&mut Node> {
        let (index, branches) = path.split_last()?;
        self.sequence_mut(branches)?.nodes.get_mut(*index)
    }

    /// The nodes from the root down to `to`, with their paths.
    ///
    /// With `from`, only the nodes strictly after `from` are returned; that
    /// list is empty unless `to` descends from `from`. `None` when `to` does
    /// not exist.
    pub fn nodes_along(&self, to: &Path, from: Option<&Path>) -> Option<Vec<(Path, &Node)>> {
        self.get(to)?;
        let (skip_depth, skip) = match from {
            Some(from) if self.get(from).is_some() && to.is_descendant_of(from) => {
                (from.len() - 1, from.node_index() + 1)
            }
            Some(_) => return Some(Vec::new()),
            None => (0, 0),
        };

        let branches = to.branches();
        let mut out = Vec::new();
        let mut tree = self;
        let mut prefix = Vec::with_capacity(to.len());
        for depth in 0..=branches.len() {
            let end = if depth == branches.len() {
                to.node_index() + 1
            } else {
                tree.nodes.len()
            };
            let begin = match depth.cmp(&skip_depth) {
                std::cmp::Ordering::Less => end,
                std::cmp::Ordering::Equal => skip,
                std::cmp::Ordering::Greater => 0,
            };
            for (i, node) in tree.nodes.iter().enumerate().take(end).skip(begin) {
                let mut path = prefix.clone();
                path.push(i);
                out.push((Path::from(path), node));
            }
            if let Some(&b) = branches.get(depth) {
                tree = tree.variations.get(b)?;
                prefix.push(b);
            }
        }
        Some(out)
    }

    /// Pre-order traversal: a sequence's nodes, then each variation in turn.
    pub fn iter(&self) -> Walk<'_> {
        Walk {
            stack: vec![(Vec::new(), self)],
            current: None,
            index: 0,
        }
    }

    /// Visit every node in walk order until `f` breaks.
    ///
    /// Returns `true` when every node was visited.
    pub fn walk<F>(&self, mut f: F) -> bool
    where
        F: FnMut(&Node, &Path) -> ControlFlow<()>,
    {
        self.iter().all(|(path, node)| f(node, &path).is_continue())
    }

    /// Mutable walk in the same order, stopping at the first error.
    pub fn try_walk_mut<E, F>(&mut self, mut f: F) -> Result<(), E>
    where
        F: FnMut(&mut Node, &Path) -> Result<(), E>,
    {
        let mut stack: Vec<(Vec<usize>, &mut GameTree)> = vec![(Vec::new(), self)];
        while let Some((prefix, tree)) = stack.pop() {
            let GameTree {
                nodes, variations, ..
            } = tree;
            for (i, node) in nodes.iter_mut().enumerate() {
                let mut path = prefix.clone();
                path.push(i);
                f(node, &Path::from(path))?;
            }
            for (i, variation) in variations.iter_mut().enumerate().rev() {
                let mut path = prefix.clone();
                path.push(i);
                stack.push((path, variation));
            }
        }
        Ok(())
    }

    /// Total number of nodes.
    pub fn node_count(&self) -> usize {
        self.iter().count()
    }

    /// SGF form, `(` nodes variations `)`, encoded as UTF-8 (see
    /// [`codec::tree_to_sgf`]).
    pub fn to_sgf(&self) -> String {
        codec::tree_to_sgf(self)
    }
}

/// Iterator over `(path, node)` pairs, see [`GameTree::iter`].
pub struct Walk<'a> {
    stack: Vec<(Vec<usize>, &'a GameTree)>,
    current: Option<(Vec<usize>, &'a GameTree)>,
    index: usize,
}

impl<'a> Iterator for Walk<'a> {
    type Item = (Path, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((prefix, tree)) = &self.current {
                let tree: &'a GameTree = *tree;
                if let Some(node) = tree.nodes.get(self.index) {
                    let mut path = prefix.clone();
                    path.push(self.index);
                    self.index += 1;
                    return Some((Path::from(path), node));
                }
                for (i, variation) in tree.variations.iter().enumerate().rev() {
                    let mut path = prefix.clone();
                    path.push(i);
                    self.stack.push((path, variation));
                }
            }
            self.current = None;
            let next = self.stack.pop()?;
            self.current = Some(next);
            self.index = 0;
        }
    }
}

impl<'a> IntoIterator for &'a GameTree {
    type Item = (Path, &'a Node);
    type IntoIter = Walk<'a>;

    fn into_iter(self) -> Walk<'a> {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str) -> Node {
        let mut node = Node::new();
        node.set(Property::Name, name);
        node
    }

    /// `(;A;B(;C)(;D;E))`
    fn sample() -> GameTree {
        GameTree::new(
            vec![named("A"), named("B")],
            vec![
                GameTree::new(vec![named("C")], vec![]),
                GameTree::new(vec![named("D"), named("E")], vec![]),
            ],
        )
    }

    fn name(node: &Node) -> &str {
        node.get(Property::Name).and_then(Value::as_text).unwrap_or("")
    }

    #[test]
    fn test_walk_order() {
        let tree = sample();
        let visited: Vec<(String, Vec<usize>)> = tree
            .iter()
            .map(|(p, n)| (name(n).to_string(), p.to_vec()))
            .collect();
        assert_eq!(
            visited,
            vec![
                ("A".to_string(), vec![0]),
                ("B".to_string(), vec![1]),
                ("C".to_string(), vec![0, 0]),
                ("D".to_string(), vec![1, 0]),
                ("E".to_string(), vec![1, 1]),
            ]
        );
    }

    #[test]
    fn test_walk_early_stop() {
        let tree = sample();
        let mut seen = Vec::new();
        let complete = tree.walk(|node, _| {
            seen.push(name(node).to_string());
            if name(node) == "C" {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        assert!(!complete);
        assert_eq!(seen, ["A", "B", "C"]);
        assert!(tree.walk(|_, _| ControlFlow::Continue(())));
    }

    #[test]
    fn test_walk_mut_matches_iter() {
        let mut tree = sample();
        let expected: Vec<Path> = tree.iter().map(|(p, _)| p).collect();
        let mut seen = Vec::new();
        let res: Result<(), ()> = tree.try_walk_mut(|node, path| {
            node.set(Property::Comment, path.to_string());
            seen.push(path.clone());
            Ok(())
        });
        assert!(res.is_ok());
        assert_eq!(seen, expected);
        assert_eq!(
            tree.get(&[1, 1]).and_then(|n| n.get(Property::Comment)),
            Some(&Value::Text("1:1".into()))
        );
    }

    #[test]
    fn test_get_paths() {
        let tree = sample();
        assert_eq!(tree.get(&[1, 0]).map(name), Some("D"));
        assert!(tree.get(&[2]).is_none());
        assert!(tree.get(&[2, 0]).is_none());
        assert!(tree.get(&[]).is_none());
        assert_eq!(tree.node_count(), 5);
    }

    #[test]
    fn test_nodes_along() {
        let tree = sample();
        let names = |nodes: Vec<(Path, &Node)>| -> Vec<String> {
            nodes
                .into_iter()
                .filter_map(|(_, n)| n.get(Property::Name)?.as_text().map(str::to_string))
                .collect()
        };
        let to = Path::from([1, 1]);
        assert_eq!(names(tree.nodes_along(&to, None).unwrap()), ["A", "B", "D", "E"]);
        assert_eq!(names(tree.nodes_along(&to, Some(&Path::root())).unwrap()), ["B", "D", "E"]);
        assert_eq!(names(tree.nodes_along(&to, Some(&Path::from([1, 0]))).unwrap()), ["E"]);
        assert!(tree.nodes_along(&to, Some(&Path::from([0, 0]))).unwrap().is_empty());
        assert!(tree.nodes_along(&to, Some(&to)).unwrap().is_empty());
        assert!(tree.nodes_along(&Path::from([2, 0]), None).is_none());
        let paths: Vec<Path> = tree.nodes_along(&to, None).unwrap().into_iter().map(|(p, _)| p).collect();
        assert_eq!(paths[2], Path::from([1, 0]));
    }

    #[test]
    fn test_empty_variation_ignored() {
        let mut tree = sample();
        tree.add_variation(GameTree::default());
        assert_eq!(tree.variations.len(), 2);
    }

    #[test]
    fn test_node_kind_cache_invalidation() {
        let mut node = Node::new();
        assert_eq!(node.kind(), NodeKind::Undefined);
        node.set(Property::AddBlack, vec![Point::new(0, 0)]);
        assert_eq!(node.kind(), NodeKind::Setup);
        node.set(Property::Black, Point::new(1, 1));
        assert_eq!(node.kind(), NodeKind::Move);
        node.set(Property::Size, Value::composed(9i64, 9i64));
        assert_eq!(node.kind(), NodeKind::Root);
        node.remove(Property::Size);
        assert_eq!(node.kind(), NodeKind::Move);
    }

    #[test]
    fn test_json_roundtrip() {
        let mut node = Node::new();
        node.set(Property::Player, Color::White);
        node.set(Property::Komi, 6.5);
        node.set(Property::AddBlack, vec![Point::new(0, 1)]);
        node.push_raw("XX", b"foo");
        let tree = GameTree::new(vec![node], vec![]);
        let json = serde_json::to_value(&tree).unwrap();
        assert_eq!(json["nodes"][0]["PL"], "W");
        assert_eq!(json["nodes"][0]["_raw"]["XX"][0], "foo");
        assert!(json.get("errors").is_none());
        let back: GameTree = serde_json::from_value(json).unwrap();
        assert_eq!(back, tree);
    }

    #[test]
    fn test_json_coerces_values() {
        let tree: GameTree = serde_json::from_str(
            r#"{"nodes":[{"SZ":9,"KM":6,"PL":"B","B":{"x":2,"y":3},"QQ":"x"}]}"#,
        )
        .unwrap();
        let root = &tree.nodes[0];
        assert_eq!(root.get(Property::Size), Some(&Value::composed(9i64, 9i64)));
        assert_eq!(root.get(Property::Komi), Some(&Value::Real(6.0)));
        assert_eq!(root.get(Property::Player), Some(&Value::Color(Color::Black)));
        assert_eq!(root.move_played(), Some((Color::Black, Point::new(2, 3))));
        assert_eq!(root.raw()["QQ"], vec![b"x".to_vec()]);
    }
}
