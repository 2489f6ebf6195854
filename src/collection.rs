//! The document model: an ordered collection of game trees.

use serde::{Serialize, Serializer};

use crate::error::SyntaxError;
use crate::nav::Navigator;
use crate::parser::Parser;
use crate::tree::GameTree;

/// SGF of the tree created by [`Collection::add_empty`].
const EMPTY_GAME: &str = "(;SZ[19])";

#[derive(Debug, Default)]
pub struct Collection {
    parser: Parser,
    keep_raw: bool,
    games: Vec<GameTree>,
}

impl Collection {
    pub fn new() -> Self {
        Collection::default()
    }

    /// A collection whose parses keep unknown and rejected raw values.
    pub fn with_keep_raw(keep_raw: bool) -> Self {
        Collection {
            keep_raw,
            ..Collection::default()
        }
    }

    /// Parse a collection and append its games. Returns how many games were
    /// added. Nothing is added on a syntax error.
    pub fn add_sgf(&mut self, data: impl AsRef<[u8]>) -> Result<usize, SyntaxError> {
        let games = self.parser.parse(data.as_ref(), self.keep_raw)?;
        let added = games.len();
        self.games.extend(games);
        Ok(added)
    }

    pub fn add_tree(&mut self, tree: GameTree) {
        self.games.push(tree);
    }

    /// Append a new game with an empty 19x19 board.
    pub fn add_empty(&mut self) -> usize {
        match self.add_sgf(EMPTY_GAME) {
            Ok(added) => added,
            Err(_) => 0,
        }
    }

    pub fn clear(&mut self) {
        self.games.clear();
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    pub fn games(&self) -> &[GameTree] {
        &self.games
    }

    pub fn get(&self, index: usize) -> Option<&GameTree> {
        self.games.get(index)
    }

    /// A navigator over a copy of game `index`. Store edits back with
    /// [`replace`](Self::replace).
    pub fn nav(&self, index: usize) -> Option<Navigator> {
        self.games.get(index).cloned().map(Navigator::new)
    }

    /// Swap game `index` for `tree`, returning the previous one.
    pub fn replace(&mut self, index: usize, tree: GameTree) -> Option<GameTree> {
        let slot = self.games.get_mut(index)?;
        Some(std::mem::replace(slot, tree))
    }

    /// SGF text of every game, concatenated.
    pub fn to_sgf(&self) -> String {
        self.games.iter().map(GameTree::to_sgf).collect()
    }
}

/// Serialized as the array of its games.
impl Serialize for Collection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.games.serialize(serializer)
    }
}

impl From<Vec<GameTree>> for Collection {
    fn from(games: Vec<GameTree>) -> Self {
        Collection {
            games,
            ..Collection::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::Path;
    use crate::property::Property;
    use crate::value::{Point, Value};

    #[test]
    fn test_add_and_nav() {
        let mut games = Collection::new();
        assert_eq!(games.add_sgf("(;SZ[9];B[ee])(;SZ[13])").unwrap(), 2);
        assert_eq!(games.add_empty(), 1);
        assert_eq!(games.len(), 3);

        let mut nav = games.nav(0).unwrap();
        assert!(nav.next());
        assert_eq!(
            nav.current().and_then(|n| n.get(Property::Black)),
            Some(&Value::Point(Point::new(4, 4)))
        );
        assert!(games.nav(3).is_none());

        let root = games.get(2).unwrap().nodes[0].get(Property::Size);
        assert_eq!(root, Some(&Value::composed(19i64, 19i64)));
    }

    #[test]
    fn test_syntax_error_adds_nothing() {
        let mut games = Collection::new();
        games.add_sgf("(;C[a])").unwrap();
        assert!(games.add_sgf("(;C[b])(;").is_err());
        assert_eq!(games.len(), 1);
    }

    #[test]
    fn test_replace_after_edit() {
        let mut games = Collection::new();
        games.add_sgf("(;SZ[9])").unwrap();
        let mut nav = games.nav(0).unwrap();
        nav.play(Point::new(2, 2), None).unwrap();
        assert_eq!(games.get(0).unwrap().nodes.len(), 1);
        games.replace(0, nav.into_tree());
        assert_eq!(games.get(0).unwrap().nodes.len(), 2);
        assert_eq!(games.to_sgf(), "(;SZ[9];B[cc])");
        assert!(games.nav(0).unwrap().update(Path::from([1])));
    }

    #[test]
    fn test_keep_raw_and_json() {
        let mut games = Collection::with_keep_raw(true);
        games.add_sgf("(;ZZ[x])").unwrap();
        let json = serde_json::to_value(&games).unwrap();
        assert_eq!(json[0]["nodes"][0]["_raw"]["ZZ"][0], "x");
        assert!(json.is_array());
    }
}
