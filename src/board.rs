//! Board replay and capture engine.
//!
//! A [`Board`] replays the nodes along a path of a [`GameTree`]: setup
//! stones, moves with capture resolution, next player, markup and the view
//! window. Rendering is lazy: [`Board::queue_render`] only records the
//! target path, [`Board::sync`] does the work. When the new target descends
//! from the last rendered path only the new nodes are replayed.

use std::fmt;

use indexmap::IndexMap;
use log::{debug, warn};
use serde::Serialize;

use crate::constants::{
    DEFAULT_BOARD_SIZE, GO_GAME_TYPE, MAX_BOARD_SIZE, MIN_BOARD_SIZE, OUTPUT_CHARSET,
    OUTPUT_VERSION,
};
use crate::error::RenderError;
use crate::path::Path;
use crate::property::Property;
use crate::tree::{GameTree, Node};
use crate::value::{Color, Point, Value};

/// Mutually exclusive shape marks.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    Circle,
    Cross,
    Selected,
    Square,
    Triangle,
}

impl Shape {
    pub const ALL: [Shape; 5] = [
        Shape::Circle,
        Shape::Cross,
        Shape::Selected,
        Shape::Square,
        Shape::Triangle,
    ];
}

/// Markup property families.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MarkKind {
    /// `DD`
    Dim,
    /// `LB`
    Label,
    Shape(Shape),
}

impl MarkKind {
    /// The property storing this kind of mark.
    pub fn property(self) -> Property {
        match self {
            MarkKind::Dim => Property::Dim,
            MarkKind::Label => Property::Label,
            MarkKind::Shape(Shape::Circle) => Property::Circle,
            MarkKind::Shape(Shape::Cross) => Property::Cross,
            MarkKind::Shape(Shape::Selected) => Property::Selected,
            MarkKind::Shape(Shape::Square) => Property::Square,
            MarkKind::Shape(Shape::Triangle) => Property::Triangle,
        }
    }

    /// All kinds, in the order marks are applied.
    pub fn all() -> impl Iterator<Item = MarkKind> {
        [MarkKind::Dim, MarkKind::Label]
            .into_iter()
            .chain(Shape::ALL.into_iter().map(MarkKind::Shape))
    }
}

/// Transient markup on an intersection.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Mark {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape: Option<Shape>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Stone played by the last replayed node.
    pub last: bool,
    pub dimmed: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Intersection {
    pub color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mark: Option<Mark>,
    /// Outside the active `VW` window.
    pub hidden: bool,
}

/// Rectangle in board coordinates.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Rect {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

/// Board dimensions declared by the root node, or the default size.
pub fn board_size(tree: &GameTree) -> (usize, usize) {
    let declared = tree
        .nodes
        .first()
        .and_then(|root| root.get(Property::Size))
        .and_then(Value::as_composed)
        .and_then(|c| c.first.as_number().zip(c.second.as_number()));
    let bounds = MIN_BOARD_SIZE..=MAX_BOARD_SIZE;
    match declared {
        Some((w, h)) if bounds.contains(&w) && bounds.contains(&h) => (w as usize, h as usize),
        _ => (DEFAULT_BOARD_SIZE, DEFAULT_BOARD_SIZE),
    }
}

#[derive(Clone, Debug)]
pub struct Board {
    width: usize,
    height: usize,
    cells: Vec<Intersection>,
    next_player: Color,
    /// Stones removed, indexed by the color of the removed stones.
    captured: [usize; 2],
    last_move: Option<Point>,
    infos: IndexMap<&'static str, Value>,
    rendered: Option<Path>,
    pending: Option<Path>,
    force_clear: bool,
    last_error: Option<RenderError>,
}

impl Board {
    /// An empty, unrendered board.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![Intersection::default(); width * height],
            next_player: Color::Black,
            captured: [0; 2],
            last_move: None,
            infos: IndexMap::new(),
            rendered: None,
            pending: None,
            force_clear: false,
            last_error: None,
        }
    }

    /// An empty board sized for `tree`.
    pub fn for_tree(tree: &GameTree) -> Self {
        let (w, h) = board_size(tree);
        Board::new(w, h)
    }

    /// The position at `path`.
    pub fn render(tree: &GameTree, path: &Path) -> Result<Board, RenderError> {
        let mut board = Board::for_tree(tree);
        board.queue_render(path.clone(), true);
        board.sync(tree)?;
        Ok(board)
    }

    /// Record the path to render on the next [`sync`](Self::sync).
    ///
    /// `force_clear` discards the cached position, for use after the tree
    /// was edited.
    pub fn queue_render(&mut self, path: Path, force_clear: bool) {
        self.pending = Some(path);
        self.force_clear |= force_clear;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Path of the position currently held, if any.
    pub fn rendered_path(&self) -> Option<&Path> {
        self.rendered.as_ref()
    }

    /// Error of the last failed render.
    pub fn last_error(&self) -> Option<&RenderError> {
        self.last_error.as_ref()
    }

    /// Bring the board to the queued path.
    pub fn sync(&mut self, tree: &GameTree) -> Result<(), RenderError> {
        let Some(target) = self.pending.take() else {
            return match &self.last_error {
                Some(e) => Err(e.clone()),
                None => Ok(()),
            };
        };
        self.last_error = None;

        let from = match self.rendered.take() {
            Some(r) if !self.force_clear && (r == target || target.is_descendant_of(&r)) => Some(r),
            _ => {
                self.clear(tree);
                None
            }
        };
        self.force_clear = false;

        let Some(nodes) = tree.nodes_along(&target, from.as_ref()) else {
            return Err(self.fail(RenderError::InvalidPath(target)));
        };
        match &from {
            Some(from) => debug!("board: replaying {} nodes from {from}", nodes.len()),
            None => debug!("board: full render of {target} ({} nodes)", nodes.len()),
        }

        for (path, node) in &nodes {
            if let Err(point) = self.render_node(node, path.is_root()) {
                warn!("illegal move at {point} (node {path})");
                return Err(self.fail(RenderError::IllegalMove {
                    path: path.clone(),
                    point,
                }));
            }
        }
        if let Some((_, node)) = nodes.last() {
            self.update_marks(node);
        }
        self.rendered = Some(target);
        Ok(())
    }

    fn fail(&mut self, error: RenderError) -> RenderError {
        self.cells.fill(Intersection::default());
        self.rendered = None;
        self.last_error = Some(error.clone());
        error
    }

    /// Reset to an empty board sized from the tree root.
    pub fn clear(&mut self, tree: &GameTree) {
        let (w, h) = board_size(tree);
        *self = Board {
            pending: self.pending.take(),
            force_clear: self.force_clear,
            ..Board::new(w, h)
        };
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// `(width, height)`
    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x < self.width && p.y < self.height
    }

    fn idx(&self, p: Point) -> Option<usize> {
        self.contains(p).then_some(p.y * self.width + p.x)
    }

    fn point(&self, i: usize) -> Point {
        Point::new(i % self.width, i / self.width)
    }

    pub fn get(&self, p: Point) -> Option<&Intersection> {
        self.cells.get(self.idx(p)?)
    }

    pub fn color(&self, p: Point) -> Option<Color> {
        self.get(p).and_then(|itn| itn.color)
    }

    /// Every intersection, row by row.
    pub fn iter(&self) -> impl Iterator<Item = (Point, &Intersection)> {
        self.cells.iter().enumerate().map(|(i, itn)| (self.point(i), itn))
    }

    pub fn next_player(&self) -> Color {
        self.next_player
    }

    /// Point of the move replayed by the last node, if it played one.
    pub fn last_move(&self) -> Option<Point> {
        self.last_move
    }

    /// Number of stones captured by `color`.
    pub fn captured_by(&self, color: Color) -> usize {
        self.captured[color.opponent().index()]
    }

    /// `(captured by black, captured by white)`
    pub fn captures(&self) -> (usize, usize) {
        (self.captured_by(Color::Black), self.captured_by(Color::White))
    }

    /// Game infos in effect, by semantic key.
    pub fn infos(&self) -> &IndexMap<&'static str, Value> {
        &self.infos
    }

    /// Smallest rectangle holding every visible intersection. The whole
    /// board when nothing is visible.
    pub fn visible_box(&self) -> Rect {
        let visible = self.iter().filter(|(_, itn)| !itn.hidden).map(|(p, _)| p);
        let bounds = visible.fold(None, |acc: Option<(Point, Point)>, p| {
            Some(match acc {
                None => (p, p),
                Some((lo, hi)) => (
                    Point::new(lo.x.min(p.x), lo.y.min(p.y)),
                    Point::new(hi.x.max(p.x), hi.y.max(p.y)),
                ),
            })
        });
        match bounds {
            Some((lo, hi)) => Rect {
                x: lo.x,
                y: lo.y,
                width: hi.x - lo.x + 1,
                height: hi.y - lo.y + 1,
            },
            None => Rect {
                x: 0,
                y: 0,
                width: self.width,
                height: self.height,
            },
        }
    }

    fn neighbors(&self, p: Point) -> impl Iterator<Item = Point> + use<> {
        let mut v = Vec::with_capacity(4);
        if p.y > 0 {
            v.push(Point::new(p.x, p.y - 1));
        }
        if p.x > 0 {
            v.push(Point::new(p.x - 1, p.y));
        }
        if p.y + 1 < self.height {
            v.push(Point::new(p.x, p.y + 1));
        }
        if p.x + 1 < self.width {
            v.push(Point::new(p.x + 1, p.y));
        }
        v.into_iter()
    }

    /// Whether the group at `p` has at least one liberty.
    ///
    /// On an empty intersection the group of a hypothetical `assume` stone is
    /// checked instead. `None` when `p` is off the board, or empty without
    /// `assume`.
    pub fn group_has_liberties(&self, p: Point, assume: Option<Color>) -> Option<bool> {
        let start = self.idx(p)?;
        let color = self.cells[start].color.or(assume)?;
        let mut visited = vec![false; self.cells.len()];
        visited[start] = true;
        let mut stack: Vec<Point> = self.neighbors(p).collect();
        while let Some(q) = stack.pop() {
            let Some(i) = self.idx(q) else { continue };
            if visited[i] {
                continue;
            }
            match self.cells[i].color {
                None => return Some(true),
                Some(c) if c == color => {
                    visited[i] = true;
                    stack.extend(self.neighbors(q));
                }
                _ => {}
            }
        }
        Some(false)
    }

    /// Remove the opponent groups left without liberties by the stone at `p`.
    ///
    /// Each orthogonal neighbor starts a probe; probes that meet share a
    /// set (union-find) and its liberty flag. Returns the number of stones
    /// removed.
    fn check_captured(&mut self, p: Point) -> usize {
        let Some(color) = self.color(p) else {
            return 0;
        };
        let enemy = color.opponent();
        let mut owner: Vec<Option<usize>> = vec![None; self.cells.len()];
        let mut parent = [0, 1, 2, 3];
        let mut libs = [false; 4];
        let mut stack: Vec<(Point, usize)> = self.neighbors(p).enumerate().map(|(g, q)| (q, g)).collect();

        while let Some((q, g)) = stack.pop() {
            let root = find(&mut parent, g);
            if libs[root] {
                continue;
            }
            let Some(i) = self.idx(q) else { continue };
            match self.cells[i].color {
                None => libs[root] = true,
                Some(c) if c == enemy => match owner[i] {
                    None => {
                        owner[i] = Some(g);
                        stack.extend(self.neighbors(q).map(|n| (n, g)));
                    }
                    Some(other) => {
                        let other = find(&mut parent, other);
                        if other != root {
                            parent[root] = other;
                            libs[other] |= libs[root];
                        }
                    }
                },
                _ => {}
            }
        }

        let mut removed = 0;
        for (i, g) in owner.into_iter().enumerate() {
            let Some(g) = g else { continue };
            if !libs[find(&mut parent, g)] {
                self.cells[i].color = None;
                removed += 1;
            }
        }
        self.captured[enemy.index()] += removed;
        removed
    }

    /// Apply one node on top of the current position. `Err` carries the
    /// point of an illegal move.
    fn render_node(&mut self, node: &Node, is_root: bool) -> Result<(), Point> {
        let mut claimed = vec![false; self.cells.len()];
        for (prop, color) in [
            (Property::AddBlack, Some(Color::Black)),
            (Property::AddWhite, Some(Color::White)),
            (Property::AddEmpty, None),
        ] {
            let Some(value) = node.get(prop) else { continue };
            for p in value.points() {
                let Some(i) = self.idx(p) else { continue };
                if !claimed[i] {
                    self.cells[i].color = color;
                    claimed[i] = true;
                }
            }
        }

        self.last_move = None;
        if !is_root {
            if let Some((color, p)) = node.move_played() {
                match self.idx(p) {
                    // Off the board: a pass.
                    None => self.next_player = color.opponent(),
                    Some(i) if self.cells[i].color.is_some() => return Err(p),
                    Some(i) => {
                        self.cells[i].color = Some(color);
                        self.check_captured(p);
                        self.last_move = Some(p);
                        self.next_player = color.opponent();
                    }
                }
            }
        }
        if let Some(color) = node.get(Property::Player).and_then(Value::as_color) {
            self.next_player = color;
        }

        self.update_visible(node);
        self.update_infos(node);
        Ok(())
    }

    fn update_infos(&mut self, node: &Node) {
        for prop in Property::infos() {
            let Some(key) = prop.info_key() else { continue };
            if prop.is_node_info() {
                self.infos.shift_remove(key);
            }
            if let Some(value) = node.get(prop) {
                self.infos.insert(key, value.clone());
            }
        }
    }

    fn update_visible(&mut self, node: &Node) {
        let Some(view) = node.get(Property::View) else {
            return;
        };
        let window: Vec<usize> = view.points().filter_map(|p| self.idx(p)).collect();
        let hide = !view.items().is_empty();
        for itn in &mut self.cells {
            itn.hidden = hide;
        }
        for i in window {
            self.cells[i].hidden = false;
        }
    }

    fn update_marks(&mut self, node: &Node) {
        for itn in &mut self.cells {
            itn.mark = None;
        }
        if let Some(i) = self.last_move.and_then(|p| self.idx(p)) {
            self.cells[i].mark = Some(Mark {
                last: true,
                ..Mark::default()
            });
        }
        for kind in MarkKind::all() {
            let Some(value) = node.get(kind.property()) else { continue };
            for item in value.items() {
                let (point, label) = match (kind, item) {
                    (MarkKind::Label, Value::Composed(c)) => (c.first.as_point(), c.second.as_text()),
                    (_, v) => (v.as_point(), None),
                };
                let Some(i) = point.and_then(|p| self.idx(p)) else { continue };
                let mark = self.cells[i].mark.get_or_insert_with(Mark::default);
                match kind {
                    MarkKind::Dim => mark.dimmed = true,
                    MarkKind::Label => mark.label = label.map(str::to_string),
                    MarkKind::Shape(shape) => mark.shape = Some(shape),
                }
            }
        }
    }

    /// The position as a single standalone root node: setup stones, markup,
    /// infos, view window and player to move. The last-move marker is not
    /// representable and is dropped.
    pub fn render_to_node(&self) -> Node {
        let mut node = Node::new();
        node.set(Property::FileFormat, OUTPUT_VERSION);
        node.set(Property::Charset, OUTPUT_CHARSET);
        node.set(Property::GameType, GO_GAME_TYPE);
        node.set(
            Property::Size,
            Value::composed(self.width as i64, self.height as i64),
        );
        for (key, value) in &self.infos {
            if let Some(prop) = Property::from_info_key(key) {
                node.set(prop, value.clone());
            }
        }

        let mut lists: IndexMap<Property, Vec<Value>> = IndexMap::new();
        let mut view = Vec::new();
        let mut has_hidden = false;
        for (p, itn) in self.iter() {
            match itn.color {
                Some(Color::Black) => lists.entry(Property::AddBlack).or_default().push(p.into()),
                Some(Color::White) => lists.entry(Property::AddWhite).or_default().push(p.into()),
                None => {}
            }
            if let Some(mark) = &itn.mark {
                if mark.dimmed {
                    lists.entry(Property::Dim).or_default().push(p.into());
                }
                if let Some(label) = &mark.label {
                    lists
                        .entry(Property::Label)
                        .or_default()
                        .push(Value::composed(p, label.as_str()));
                }
                if let Some(shape) = mark.shape {
                    lists
                        .entry(MarkKind::Shape(shape).property())
                        .or_default()
                        .push(p.into());
                }
            }
            if itn.hidden {
                has_hidden = true;
            } else {
                view.push(Value::Point(p));
            }
        }
        for (prop, items) in lists {
            node.set(prop, Value::List(items));
        }
        if has_hidden {
            node.set(Property::View, Value::List(view));
        }
        node.set(Property::Player, self.next_player);
        node
    }
}

fn find(parent: &mut [usize; 4], mut g: usize) -> usize {
    while parent[g] != g {
        parent[g] = parent[parent[g]];
        g = parent[g];
    }
    g
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.height {
            for x in 0..self.width {
                let p = Point::new(x, y);
                let ch = match self.get(p) {
                    Some(itn) if itn.hidden => ' ',
                    Some(Intersection { color: Some(Color::Black), .. }) => 'X',
                    Some(Intersection { color: Some(Color::White), .. }) => 'O',
                    _ => '.',
                };
                if x + 1 < self.width {
                    write!(f, "{ch} ")?;
                } else {
                    write!(f, "{ch}")?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
