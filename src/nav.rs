//! Cursor navigation and editing over a game tree.
//!
//! A [`Navigator`] owns one [`GameTree`] and a cursor [`Path`]. Moving the
//! cursor only queues a render on the lazily created [`Board`]; the position
//! is computed the next time [`Navigator::board`] is called. Edits mutate the
//! tree in place and force the board to rebuild from scratch.

use std::cmp::Ordering;
use std::ops::ControlFlow;

use log::trace;

use crate::board::{Board, MarkKind, Shape, board_size};
use crate::error::{EditError, RenderError};
use crate::path::Path;
use crate::property::{MARKUP, Property};
use crate::tree::{GameTree, Node, NodeKind};
use crate::value::{Color, Point, Value};

/// How an edit treats a point that already carries what is being set.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Toggle {
    /// Remove when present, add otherwise.
    #[default]
    Auto,
    On,
    Off,
}

/// A point to mark, with the text of a label mark.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MarkItem {
    pub point: Point,
    pub label: Option<String>,
}

impl MarkItem {
    pub fn labeled(point: Point, label: impl Into<String>) -> Self {
        MarkItem {
            point,
            label: Some(label.into()),
        }
    }
}

impl From<Point> for MarkItem {
    fn from(point: Point) -> Self {
        MarkItem { point, label: None }
    }
}

#[derive(Debug)]
pub struct Navigator {
    tree: GameTree,
    cursor: Path,
    board: Option<Board>,
}

/// A copy points at the same path but builds its own board on demand.
impl Clone for Navigator {
    fn clone(&self) -> Self {
        Navigator {
            tree: self.tree.clone(),
            cursor: self.cursor.clone(),
            board: None,
        }
    }
}

impl Navigator {
    /// A navigator on the root node of `tree`.
    pub fn new(tree: GameTree) -> Self {
        Navigator {
            tree,
            cursor: Path::root(),
            board: None,
        }
    }

    pub fn tree(&self) -> &GameTree {
        &self.tree
    }

    pub fn into_tree(self) -> GameTree {
        self.tree
    }

    /// The cursor.
    pub fn path(&self) -> &Path {
        &self.cursor
    }

    pub fn root(&self) -> Option<&Node> {
        self.tree.nodes.first()
    }

    /// The node under the cursor.
    pub fn current(&self) -> Option<&Node> {
        self.tree.get(&self.cursor)
    }

    /// The node at `path`, `None` if the path does not exist.
    pub fn get(&self, path: &[usize]) -> Option<&Node> {
        self.tree.get(path)
    }

    /// Mutable access to the node under the cursor. The board is rebuilt on
    /// its next read.
    pub fn current_mut(&mut self) -> Option<&mut Node> {
        self.touch(true);
        self.tree.get_mut(&self.cursor)
    }

    fn node_mut(&mut self) -> Result<&mut Node, EditError> {
        let cursor = &self.cursor;
        self.tree
            .get_mut(cursor)
            .ok_or_else(|| EditError::InvalidPath(cursor.clone()))
    }

    fn touch(&mut self, force_clear: bool) {
        if let Some(board) = &mut self.board {
            board.queue_render(self.cursor.clone(), force_clear);
        }
    }

    /// The position at the cursor, created on first use.
    pub fn board(&mut self) -> Result<&Board, RenderError> {
        let board = self.board.get_or_insert_with(|| {
            let mut board = Board::for_tree(&self.tree);
            board.queue_render(self.cursor.clone(), true);
            board
        });
        board.sync(&self.tree)?;
        Ok(board)
    }

    /// The position at the cursor as a single-node tree.
    pub fn flatten(&mut self) -> Result<GameTree, RenderError> {
        let node = self.board()?.render_to_node();
        Ok(GameTree::new(vec![node], Vec::new()))
    }

    // =========================================================================
    // Movement
    // =========================================================================

    /// Move the cursor to `path`. Fails, leaving the cursor alone, when the
    /// path does not exist.
    pub fn update(&mut self, path: impl Into<Path>) -> bool {
        let path = path.into();
        if self.tree.get(&path).is_none() {
            return false;
        }
        self.cursor = path;
        self.touch(false);
        true
    }

    /// Move to a path (`0:1:3`) or a relative alias: `root`, `first`,
    /// `prev`, `next`, `last`, `@first`, `@prev`, `@next`, `@last`, `@>` and
    /// `@<` (cycle variations forward and backward).
    pub fn move_to(&mut self, target: &str) -> bool {
        match target {
            "root" | "first" => self.first(),
            "prev" => self.prev(),
            "next" => self.next(),
            "last" => self.last(),
            "@first" => self.select_variation(0),
            "@prev" => self.prev_variation(),
            "@next" => self.next_variation(),
            "@last" => self.select_variation(-1),
            "@>" => self.cycle_variation(false),
            "@<" => self.cycle_variation(true),
            _ => match target.parse::<Path>() {
                Ok(path) => self.update(path),
                Err(_) => false,
            },
        }
    }

    pub fn first(&mut self) -> bool {
        self.update(Path::root())
    }

    /// Previous node. From the first node of a variation, the last node of
    /// the parent sequence.
    pub fn prev(&mut self) -> bool {
        let index = self.cursor.node_index();
        let target = if index > 0 {
            self.cursor.with_node(index - 1)
        } else {
            let Some((_, parent)) = self.cursor.branches().split_last() else {
                return false;
            };
            let Some(tail) = self
                .tree
                .sequence(parent)
                .and_then(|seq| seq.nodes.len().checked_sub(1))
            else {
                return false;
            };
            let mut path = parent.to_vec();
            path.push(tail);
            Path::from(path)
        };
        self.update(target)
    }

    /// Next node, entering the first variation after the end of a sequence.
    pub fn next(&mut self) -> bool {
        let Some(seq) = self.tree.sequence(self.cursor.branches()) else {
            return false;
        };
        let index = self.cursor.node_index();
        let target = if index + 1 < seq.nodes.len() {
            self.cursor.with_node(index + 1)
        } else if !seq.variations.is_empty() {
            self.cursor.child(0)
        } else {
            return false;
        };
        self.update(target)
    }

    /// The terminal node reached by following first variations.
    pub fn last(&mut self) -> bool {
        let mut branches = self.cursor.branches().to_vec();
        let Some(mut seq) = self.tree.sequence(&branches) else {
            return false;
        };
        if seq.variations.is_empty() && self.cursor.node_index() + 1 == seq.nodes.len() {
            return true;
        }
        while let Some(first) = seq.variations.first() {
            branches.push(0);
            seq = first;
        }
        branches.push(seq.nodes.len().saturating_sub(1));
        self.update(branches)
    }

    /// Index of the cursor's variation among its siblings. Always 0 unless
    /// the cursor is on the first node of a variation.
    pub fn variation(&self) -> usize {
        let path = self.cursor.as_slice();
        match path {
            [.., v, 0] => *v,
            _ => 0,
        }
    }

    /// Jump to sibling variation `n` (negative counts from the last one).
    /// Only possible from the first node of a variation.
    pub fn select_variation(&mut self, n: isize) -> bool {
        if !self.cursor.is_branch_start() {
            return false;
        }
        let Some((_, parent)) = self.cursor.branches().split_last() else {
            return false;
        };
        let Some(count) = self.tree.sequence(parent).map(|seq| seq.variations.len()) else {
            return false;
        };
        let n = if n < 0 { count as isize + n } else { n };
        if n < 0 || n as usize >= count {
            return false;
        }
        let target = self.cursor.sibling(n as usize);
        self.update(target)
    }

    pub fn prev_variation(&mut self) -> bool {
        match self.variation() {
            0 => false,
            v => self.select_variation(v as isize - 1),
        }
    }

    pub fn next_variation(&mut self) -> bool {
        self.select_variation(self.variation() as isize + 1)
    }

    /// Step through sibling variations, wrapping around. Always succeeds.
    pub fn cycle_variation(&mut self, reverse: bool) -> bool {
        let v = self.variation() as isize;
        let step = if reverse { -1 } else { 1 };
        if !self.select_variation(v + step) && v != 0 {
            self.select_variation(0);
        }
        true
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn is_root(&self) -> bool {
        self.cursor.is_root()
    }

    pub fn is_path(&self, path: &[usize]) -> bool {
        self.cursor.as_slice() == path
    }

    fn relation(&self, path: &Path) -> Option<Ordering> {
        self.tree.get(path)?;
        self.cursor.relation(path)
    }

    /// Whether the cursor is an ancestor of `path`.
    pub fn ascendant_of(&self, path: &Path, or_self: bool) -> bool {
        match self.relation(path) {
            Some(Ordering::Less) => true,
            Some(Ordering::Equal) => or_self,
            _ => false,
        }
    }

    /// Whether the cursor is a descendant of `path`.
    pub fn descendant_of(&self, path: &Path, or_self: bool) -> bool {
        match self.relation(path) {
            Some(Ordering::Greater) => true,
            Some(Ordering::Equal) => or_self,
            _ => false,
        }
    }

    /// Whether `path` exists and is on the same line as the cursor.
    pub fn related_to(&self, path: &Path) -> bool {
        self.relation(path).is_some()
    }

    /// Nodes from the root (or strictly after `from`) down to the cursor.
    pub fn get_nodes(&self, from: Option<&Path>) -> Vec<&Node> {
        self.tree
            .nodes_along(&self.cursor, from)
            .map(|nodes| nodes.into_iter().map(|(_, node)| node).collect())
            .unwrap_or_default()
    }

    /// Number of nodes from the root to the cursor, both included.
    pub fn length(&self) -> usize {
        let mut seq = &self.tree;
        let mut len = 0;
        for &b in self.cursor.branches() {
            len += seq.nodes.len();
            match seq.variations.get(b) {
                Some(next) => seq = next,
                None => break,
            }
        }
        len + self.cursor.node_index() + 1
    }

    /// Number of sibling variations at the cursor, 1 when there are none.
    pub fn variations_count(&self) -> usize {
        if !self.cursor.is_branch_start() {
            return 1;
        }
        let parent = self.cursor.branches().split_last().map(|(_, p)| p).unwrap_or(&[]);
        self.tree
            .sequence(parent)
            .map(|seq| seq.variations.len().max(1))
            .unwrap_or(1)
    }

    pub fn has_variations(&self) -> bool {
        self.variations_count() > 1
    }

    /// Path of this very node instance, compared by address.
    pub fn node_path(&self, node: &Node) -> Option<Path> {
        self.tree
            .iter()
            .find(|(_, n)| std::ptr::eq(*n, node))
            .map(|(path, _)| path)
    }

    /// See [`GameTree::walk`].
    pub fn walk<F>(&self, f: F) -> bool
    where
        F: FnMut(&Node, &Path) -> ControlFlow<()>,
    {
        self.tree.walk(f)
    }

    // =========================================================================
    // Edits
    // =========================================================================

    /// Insert an empty node right after the cursor and return its path. The
    /// cursor does not move.
    pub fn add_node(&mut self) -> Result<Path, EditError> {
        self.graft(GameTree::new(vec![Node::new()], Vec::new()))
    }

    /// Graft a copy of `tree` right after the cursor and return the path of
    /// its first node.
    pub fn insert(&mut self, tree: &GameTree) -> Result<Path, EditError> {
        self.graft(GameTree::new(tree.nodes.clone(), tree.variations.clone()))
    }

    /// Appends to the cursor's sequence when the cursor ends it and nothing
    /// branches there. Otherwise the rest of the sequence moves into a new
    /// first variation and `sub` becomes the last variation.
    fn graft(&mut self, sub: GameTree) -> Result<Path, EditError> {
        if sub.nodes.is_empty() {
            return Err(EditError::EmptyTree);
        }
        let cursor = self.cursor.clone();
        let index = cursor.node_index();
        let seq = self
            .tree
            .sequence_mut(cursor.branches())
            .filter(|seq| index < seq.nodes.len())
            .ok_or_else(|| EditError::InvalidPath(cursor.clone()))?;

        let path = if index + 1 == seq.nodes.len() && seq.variations.is_empty() {
            let GameTree {
                nodes, variations, ..
            } = sub;
            seq.nodes.extend(nodes);
            seq.variations = variations;
            cursor.with_node(index + 1)
        } else {
            if index + 1 < seq.nodes.len() {
                let tail = seq.nodes.split_off(index + 1);
                let variations = std::mem::take(&mut seq.variations);
                seq.variations.push(GameTree::new(tail, variations));
            }
            seq.variations.push(sub);
            cursor.child(seq.variations.len() - 1)
        };

        trace!("grafted at {path} after {cursor}");
        self.touch(true);
        Ok(path)
    }

    /// Detach the cursor's node with everything after it.
    ///
    /// Mid-sequence, the cursor moves to the previous node. On the first node
    /// of a variation the variation is removed, a single remaining sibling is
    /// merged back into the parent sequence, and the cursor moves to the
    /// parent's last node before the branch. The root cannot be cut.
    pub fn cut(&mut self) -> Result<GameTree, EditError> {
        let cursor = self.cursor.clone();
        if cursor.is_root() {
            return Err(EditError::Root);
        }
        let invalid = || EditError::InvalidPath(cursor.clone());
        let index = cursor.node_index();

        let (cut, target) = if index > 0 {
            let seq = self
                .tree
                .sequence_mut(cursor.branches())
                .filter(|seq| index < seq.nodes.len())
                .ok_or_else(invalid)?;
            let nodes = seq.nodes.split_off(index);
            let variations = std::mem::take(&mut seq.variations);
            (GameTree::new(nodes, variations), cursor.with_node(index - 1))
        } else {
            let (&v, parent) = cursor.branches().split_last().ok_or_else(invalid)?;
            let seq = self
                .tree
                .sequence_mut(parent)
                .filter(|seq| v < seq.variations.len())
                .ok_or_else(invalid)?;
            let tail = seq.nodes.len().checked_sub(1).ok_or_else(invalid)?;
            let cut = seq.variations.remove(v);
            if seq.variations.len() == 1 {
                if let Some(only) = seq.variations.pop() {
                    seq.nodes.extend(only.nodes);
                    seq.variations = only.variations;
                }
            }
            let mut path = parent.to_vec();
            path.push(tail);
            (cut, Path::from(path))
        };

        trace!("cut at {cursor}, cursor back to {target}");
        self.cursor = target;
        self.touch(true);
        Ok(cut)
    }

    /// Play `point` for `color` (default: the player to move) after the
    /// cursor and move onto the new node.
    ///
    /// An identical move already following the cursor is reused. Occupied
    /// points and moves whose own group would have no liberties are refused
    /// without touching the tree. Opponent captures are not considered for
    /// the liberty check.
    pub fn play(&mut self, point: Point, color: Option<Color>) -> Result<Path, EditError> {
        let color = match color {
            Some(color) => color,
            None => self.board()?.next_player(),
        };
        if let Some(path) = self.following_move(color, point) {
            self.update(path.clone());
            return Ok(path);
        }

        let board = self.board()?;
        if !board.contains(point) {
            return Err(EditError::OutOfBounds(point));
        }
        if board.color(point).is_some() {
            return Err(EditError::Occupied(point));
        }
        if board.group_has_liberties(point, Some(color)) == Some(false) {
            return Err(EditError::Suicide(point));
        }

        let path = self.add_node()?;
        if let Some(node) = self.tree.get_mut(&path) {
            node.set(Property::move_of(color), point);
        }
        self.update(path.clone());
        trace!("played {}[{point}] at {path}", color.letter());
        Ok(path)
    }

    fn following_move(&self, color: Color, point: Point) -> Option<Path> {
        let seq = self.tree.sequence(self.cursor.branches())?;
        let index = self.cursor.node_index();
        let candidates: Vec<Path> = if index + 1 < seq.nodes.len() {
            vec![self.cursor.with_node(index + 1)]
        } else {
            (0..seq.variations.len()).map(|v| self.cursor.child(v)).collect()
        };
        candidates.into_iter().find(|path| {
            self.tree
                .get(path)
                .and_then(|node| node.get(Property::move_of(color)))
                .and_then(Value::as_point)
                == Some(point)
        })
    }

    fn check_bounds(&self, points: impl IntoIterator<Item = Point>) -> Result<(), EditError> {
        let (width, height) = board_size(&self.tree);
        match points.into_iter().find(|p| p.x >= width || p.y >= height) {
            Some(p) => Err(EditError::OutOfBounds(p)),
            None => Ok(()),
        }
    }

    /// The position before the cursor's node is applied.
    fn parent_board(&self) -> Result<Board, RenderError> {
        let along = self
            .tree
            .nodes_along(&self.cursor, None)
            .ok_or_else(|| RenderError::InvalidPath(self.cursor.clone()))?;
        match along.len().checked_sub(2).and_then(|i| along.get(i)) {
            Some((path, _)) => Board::render(&self.tree, path),
            None => Ok(Board::for_tree(&self.tree)),
        }
    }

    /// Set up stones of `color` (`None` empties the points) on the cursor's
    /// node. A new node is added first when the cursor is on a move.
    ///
    /// With [`Toggle::Auto`] a point already holding `color` is emptied.
    pub fn stones(&mut self, color: Option<Color>, points: &[Point], toggle: Toggle) -> Result<(), EditError> {
        self.check_bounds(points.iter().copied())?;
        if self.current().map(Node::kind) == Some(NodeKind::Move) {
            let path = self.add_node()?;
            self.update(path);
        }

        let current = self.board()?;
        let before: Vec<Option<Color>> = points.iter().map(|&p| current.color(p)).collect();
        let parent = self.parent_board()?;

        const SETUP: [Property; 3] = [Property::AddBlack, Property::AddWhite, Property::AddEmpty];
        let node = self.node_mut()?;
        let mut lists = SETUP.map(|prop| node.points(prop));
        for (&p, was) in points.iter().zip(before) {
            for list in &mut lists {
                list.retain(|&q| q != p);
            }
            let target = match (color, toggle) {
                (None, _) => None,
                (Some(c), Toggle::On) => Some(c),
                (Some(c), Toggle::Off | Toggle::Auto) if was == Some(c) => None,
                (Some(_), Toggle::Off) => was,
                (Some(c), Toggle::Auto) => Some(c),
            };
            if target != parent.color(p) {
                let slot = match target {
                    Some(Color::Black) => 0,
                    Some(Color::White) => 1,
                    None => 2,
                };
                lists[slot].push(p);
            }
        }
        for (prop, list) in SETUP.into_iter().zip(lists) {
            node.set_points(prop, list);
        }

        trace!("setup edited at {}", self.cursor);
        self.touch(true);
        Ok(())
    }

    /// Add or remove marks of `kind` on the cursor's node. `None` removes
    /// every markup property instead.
    ///
    /// Shapes are exclusive: adding one on a point drops the other shapes
    /// there.
    pub fn marks(&mut self, kind: Option<MarkKind>, items: &[MarkItem], toggle: Toggle) -> Result<(), EditError> {
        let Some(kind) = kind else {
            let node = self.node_mut()?;
            for prop in MARKUP {
                node.remove(prop);
            }
            self.touch(true);
            return Ok(());
        };
        self.check_bounds(items.iter().map(|item| item.point))?;

        let prop = kind.property();
        let node = self.node_mut()?;
        let mut marks: Vec<Value> = node.get(prop).map(|v| v.items().to_vec()).unwrap_or_default();
        for item in items {
            let at = |v: &Value| mark_point(v) == Some(item.point);
            let add = match toggle {
                Toggle::Auto => !marks.iter().any(at),
                Toggle::On => true,
                Toggle::Off => false,
            };
            marks.retain(|v| !at(v));
            if !add {
                continue;
            }
            marks.push(match kind {
                MarkKind::Label => Value::composed(item.point, item.label.clone().unwrap_or_default()),
                _ => Value::Point(item.point),
            });
            if let MarkKind::Shape(shape) = kind {
                for other in Shape::ALL.into_iter().filter(|&s| s != shape) {
                    let other = MarkKind::Shape(other).property();
                    if node.contains(other) {
                        let rest = node.points(other).into_iter().filter(|&q| q != item.point).collect();
                        node.set_points(other, rest);
                    }
                }
            }
        }
        if marks.is_empty() {
            node.remove(prop);
        } else {
            node.set(prop, Value::List(marks));
        }

        trace!("{prop} edited at {}", self.cursor);
        self.touch(true);
        Ok(())
    }

    /// Set (or with `None`, delete) an info property on the cursor's node.
    /// `key` is a semantic name (`"blackplayer"`) or a property code (`"PB"`).
    pub fn infos(&mut self, key: &str, value: Option<Value>) -> Result<(), EditError> {
        let prop = Property::from_info_key(key).ok_or_else(|| EditError::UnknownProperty(key.to_string()))?;
        let value = value
            .map(|v| prop.coerce(v).ok_or(EditError::InvalidValue(prop)))
            .transpose()?;
        let node = self.node_mut()?;
        match value {
            Some(value) => {
                node.set(prop, value);
            }
            None => {
                node.remove(prop);
            }
        }
        self.touch(true);
        Ok(())
    }
}

fn mark_point(v: &Value) -> Option<Point> {
    match v {
        Value::Composed(c) => c.first.as_point(),
        other => other.as_point(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    /// ```text
    /// root - B[aa] - W[bb] -+- B[cc] - W[dd]
    ///                       +- B[ee] -+- W[ff]
    ///                                 +- W[gg]
    /// ```
    fn sample() -> Navigator {
        let games = parse("(;GM[1]SZ[9];B[aa];W[bb](;B[cc];W[dd])(;B[ee](;W[ff])(;W[gg])))", false).unwrap();
        Navigator::new(games.into_iter().next().unwrap())
    }

    fn at(path: &[usize]) -> Navigator {
        let mut nav = sample();
        assert!(nav.update(path));
        nav
    }

    #[test]
    fn test_next_prev() {
        let mut nav = at(&[2]);
        assert!(nav.next());
        assert!(nav.is_path(&[0, 0]));
        assert!(nav.prev());
        assert!(nav.is_path(&[2]));

        let mut nav = at(&[1, 0]);
        assert!(nav.prev());
        assert!(nav.is_path(&[2]));

        let mut nav = at(&[1, 1, 0]);
        assert!(!nav.next());
        assert!(nav.first());
        assert!(!nav.prev());
        assert!(nav.is_root());
    }

    #[test]
    fn test_last_and_length() {
        let mut nav = sample();
        assert!(nav.last());
        assert!(nav.is_path(&[0, 1]));
        assert_eq!(nav.length(), 5);
        assert!(nav.last());
        assert!(nav.is_path(&[0, 1]));

        let mut nav = at(&[1, 0]);
        assert!(nav.last());
        assert!(nav.is_path(&[1, 0, 0]));
        assert_eq!(nav.length(), 5);
    }

    #[test]
    fn test_update_invalid_path() {
        let mut nav = sample();
        assert!(!nav.update([2, 0]));
        assert!(!nav.update([9]));
        assert!(nav.is_root());
    }

    #[test]
    fn test_variations() {
        let mut nav = at(&[1, 0]);
        assert_eq!(nav.variation(), 1);
        assert_eq!(nav.variations_count(), 2);
        assert!(nav.has_variations());
        assert!(nav.select_variation(0));
        assert!(nav.is_path(&[0, 0]));
        assert!(!nav.prev_variation());
        assert!(nav.next_variation());
        assert!(nav.is_path(&[1, 0]));
        assert!(!nav.next_variation());
        assert!(!nav.select_variation(2));
        assert!(nav.select_variation(-2));
        assert!(nav.is_path(&[0, 0]));

        let mut nav = at(&[2]);
        assert_eq!(nav.variation(), 0);
        assert_eq!(nav.variations_count(), 1);
        assert!(!nav.select_variation(0));
    }

    #[test]
    fn test_cycle_variation() {
        let mut nav = at(&[0, 0]);
        assert!(nav.cycle_variation(false));
        assert!(nav.is_path(&[1, 0]));
        assert!(nav.cycle_variation(false));
        assert!(nav.is_path(&[0, 0]));
        assert!(nav.cycle_variation(true));
        assert!(nav.is_path(&[1, 0]));

        let mut nav = at(&[1]);
        assert!(nav.cycle_variation(false));
        assert!(nav.is_path(&[1]));
    }

    #[test]
    fn test_move_to_aliases() {
        let mut nav = sample();
        assert!(nav.move_to("last"));
        assert!(nav.move_to("prev"));
        assert!(nav.is_path(&[0, 0]));
        assert!(nav.move_to("@last"));
        assert!(nav.is_path(&[1, 0]));
        assert!(nav.move_to("@<"));
        assert!(nav.is_path(&[0, 0]));
        assert!(nav.move_to("1:1:0"));
        assert!(nav.move_to("root"));
        assert!(nav.is_root());
        assert!(!nav.move_to("sideways"));
        assert!(!nav.move_to("4:0"));
    }

    #[test]
    fn test_relations() {
        let nav = at(&[2]);
        assert!(nav.ascendant_of(&Path::from([1, 0, 0]), false));
        assert!(!nav.ascendant_of(&Path::from([2]), false));
        assert!(nav.ascendant_of(&Path::from([2]), true));
        assert!(nav.descendant_of(&Path::root(), false));
        assert!(nav.descendant_of(&Path::from([2]), true));
        assert!(nav.related_to(&Path::from([0, 1])));

        let nav = at(&[0, 0]);
        assert!(!nav.related_to(&Path::from([1, 0])));
        assert!(!nav.ascendant_of(&Path::from([1, 0, 0]), false));
        assert!(!nav.ascendant_of(&Path::from([0, 5]), false));
    }

    #[test]
    fn test_get_nodes() {
        let nav = at(&[1, 1, 0]);
        assert_eq!(nav.get_nodes(None).len(), 5);
        let tail = nav.get_nodes(Some(&Path::from([1])));
        assert_eq!(tail.len(), 3);
        assert_eq!(tail[0].move_played(), Some((Color::White, Point::new(1, 1))));
        assert!(nav.get_nodes(Some(&Path::from([0, 0]))).is_empty());
        assert!(nav.get_nodes(Some(&Path::from([1, 1, 0]))).is_empty());
    }

    #[test]
    fn test_node_path_by_identity() {
        let nav = sample();
        let node = nav.get(&[1, 0, 0]).unwrap();
        assert_eq!(nav.node_path(node), Some(Path::from([1, 0, 0])));
        let lookalike = node.clone();
        assert_eq!(nav.node_path(&lookalike), None);
    }

    #[test]
    fn test_board_follows_cursor() {
        let mut nav = sample();
        nav.last();
        let board = nav.board().unwrap();
        assert_eq!(board.color(Point::new(3, 3)), Some(Color::White));
        nav.update([1, 1, 0]);
        let board = nav.board().unwrap();
        assert_eq!(board.color(Point::new(3, 3)), None);
        assert_eq!(board.color(Point::new(6, 6)), Some(Color::White));

        let copy = nav.clone();
        assert!(copy.board.is_none());
        assert!(copy.is_path(&[1, 1, 0]));
    }

    #[test]
    fn test_flatten() {
        let mut nav = at(&[0, 1]);
        let flat = nav.flatten().unwrap();
        assert_eq!(flat.nodes.len(), 1);
        assert_eq!(flat.nodes[0].points(Property::AddBlack).len(), 2);
        assert_eq!(flat.nodes[0].points(Property::AddWhite).len(), 2);
    }
}
