//! Property codec and validator.
//!
//! Decoding turns raw property values (bytes, still escaped) into [`Value`]s
//! according to the property's [`ValueType`]; encoding does the reverse.
//! [`Validator`] also runs the tree-level checks: root-only properties,
//! single assignment of game infos along a path, and setup/move conflicts.

use std::collections::HashMap;
use std::sync::OnceLock;

use log::debug;
use regex::Regex;

use crate::constants::{
    DEFAULT_BOARD_SIZE, DEFAULT_CHARSET, GO_GAME_TYPE, MAX_BOARD_SIZE, MIN_BOARD_SIZE,
    OUTPUT_CHARSET, SUPPORTED_VERSIONS, UTF8_CHARSETS,
};
use crate::error::{ErrorRecord, ValidationError, ValidationErrorKind as Kind};
use crate::path::Path;
use crate::property::{GAME_INFO, MOVE, Property, SETUP, ValueType, figure_default};
use crate::tree::{GameTree, Node};
use crate::value::{Color, Composed, Point, Value};

type Decoded = Result<Option<Value>, ValidationError>;

// =============================================================================
// Dates
// =============================================================================

const MONTH: &str = "(?:0[1-9]|1[0-2])";
const DAY: &str = "(?:0[1-9]|[12][0-9]|3[01])";

fn date_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let pattern = format!(
            "^(?:[0-9]{{4}}(?:-{MONTH}(?:-{DAY})?)?|{MONTH}(?:-{DAY})?|{DAY})$"
        );
        Regex::new(&pattern).expect("date pattern is valid")
    })
}

fn month_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(&format!("^{MONTH}$")).expect("month pattern is valid"))
}

fn day_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(&format!("^{DAY}$")).expect("day pattern is valid"))
}

/// Expand a compressed date list (`"2023-01-01,02,03"`) into full dates.
///
/// Shorthands `MM-DD`, `MM` and `DD` continue the running year/month prefix.
/// A malformed entry is dropped and resets the prefix; the next full date
/// starts over.
pub fn expand_dates(list: &str) -> Vec<String> {
    let mut dates = Vec::new();
    let mut prefix = String::new();

    for v in list.split(',') {
        if !date_regex().is_match(v) {
            prefix.clear();
            continue;
        }
        let date = match v.len() {
            10 => {
                prefix = v[..8].to_string();
                Some(v.to_string())
            }
            7 => {
                prefix = format!("{}-", &v[..4]);
                Some(v.to_string())
            }
            4 => {
                prefix.clear();
                Some(v.to_string())
            }
            _ if prefix.is_empty() => None,
            5 => {
                let full = format!("{}-{v}", &prefix[..4]);
                prefix = full[..8].to_string();
                Some(full)
            }
            2 if (prefix.len() == 5 && month_regex().is_match(v))
                || (prefix.len() == 8 && day_regex().is_match(v)) =>
            {
                Some(format!("{prefix}{v}"))
            }
            _ => {
                prefix.clear();
                None
            }
        };
        dates.extend(date);
    }
    dates
}

/// Compress full dates (`YYYY`, `YYYY-MM`, `YYYY-MM-DD`) into the SGF list
/// form. Entries of any other length are dropped.
pub fn compress_dates<S: AsRef<str>>(list: &[S]) -> String {
    let mut out: Vec<&str> = Vec::new();
    let mut previous: Option<&str> = None;

    for v in list {
        let v: &str = v.as_ref();
        if !matches!(v.len(), 4 | 7 | 10) {
            continue;
        }
        let short = match previous {
            Some(p) if v.len() == 10 && p.len() == 10 && p.get(..7) == v.get(..7) => v.get(8..),
            Some(p) if v.len() == 10 && p.len() >= 7 && p.get(..4) == v.get(..4) => v.get(5..),
            Some(p) if v.len() == 7 && p.len() == 7 && p.get(..4) == v.get(..4) => v.get(5..),
            _ => None,
        };
        out.push(short.unwrap_or(v));
        previous = Some(v);
    }
    out.join(",")
}

// =============================================================================
// Raw value helpers
// =============================================================================

/// Split at the first unescaped `:`.
fn split_composed(raw: &[u8]) -> Option<(&[u8], &[u8])> {
    let mut escaped = false;
    for (i, &c) in raw.iter().enumerate() {
        match c {
            _ if escaped => escaped = false,
            b'\\' => escaped = true,
            b':' => return Some((&raw[..i], &raw[i + 1..])),
            _ => {}
        }
    }
    None
}

fn parse_number(s: &str) -> Option<i64> {
    let s = s.trim();
    s.parse::<i64>().ok().or_else(|| {
        let r = s.parse::<f64>().ok()?;
        (r.is_finite() && r.fract() == 0.0).then_some(r as i64)
    })
}

fn parse_real(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|r| r.is_finite())
}

fn format_point(raw: &[u8]) -> Result<Option<Point>, ValidationError> {
    if raw.len() != 2 {
        return Ok(None);
    }
    Point::from_sgf(raw)
        .map(Some)
        .ok_or_else(|| ValidationError::removed(Kind::Point(latin1(raw))))
}

/// `xx`, or `xx:yy` as a rectangle (`range`) or a point pair.
fn format_points(raw: &[u8], range: bool) -> Decoded {
    if raw.is_empty() {
        return Ok(None);
    }
    let mut parts = raw.split(|&c| c == b':');
    let (first, second) = (parts.next(), parts.next());
    if parts.next().is_some() {
        return Ok(None);
    }
    let (Some(a), Some(b)) = (first, second) else {
        return Ok(first.map(format_point).transpose()?.flatten().map(Value::Point));
    };
    let (Some(a), Some(b)) = (format_point(a)?, format_point(b)?) else {
        return Ok(None);
    };
    if !range {
        return Ok(Some(Value::composed(a, b)));
    }
    let points = (a.y..=b.y)
        .flat_map(|y| (a.x..=b.x).map(move |x| Value::Point(Point::new(x, y))))
        .collect();
    Ok(Some(Value::List(points)))
}

fn latin1(raw: &[u8]) -> String {
    raw.iter().map(|&b| b as char).collect()
}

fn escape(s: &str, composed: bool) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c == ']' || c == '\\' || (composed && c == ':') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

// =============================================================================
// Validator
// =============================================================================

/// Stateful decoder: tracks the active charset, whether the node being
/// decoded is the root, and the errors raised so far.
#[derive(Debug, Clone)]
pub struct Validator {
    charset: String,
    is_root: bool,
    errors: Vec<ValidationError>,
}

impl Default for Validator {
    fn default() -> Self {
        Validator::new()
    }
}

impl Validator {
    pub fn new() -> Self {
        Validator {
            charset: DEFAULT_CHARSET.to_string(),
            is_root: true,
            errors: Vec::new(),
        }
    }

    /// Back to the default charset, root state and no errors.
    pub fn reset(&mut self) {
        self.charset = DEFAULT_CHARSET.to_string();
        self.is_root = true;
        self.errors.clear();
    }

    pub fn charset(&self) -> &str {
        &self.charset
    }

    pub fn is_utf8(&self) -> bool {
        UTF8_CHARSETS.contains(&self.charset.as_str())
    }

    pub fn set_root(&mut self, is_root: bool) {
        self.is_root = is_root;
    }

    /// Errors raised since the last call.
    pub fn take_errors(&mut self) -> Vec<ValidationError> {
        std::mem::take(&mut self.errors)
    }

    /// Bytes to text under the active charset.
    fn decode_str(&self, raw: &[u8]) -> String {
        if self.is_utf8() {
            String::from_utf8_lossy(raw).into_owned()
        } else {
            latin1(raw)
        }
    }

    /// Text: newlines normalized to `\n`, tabs to spaces, escapes resolved
    /// and escaped newlines removed.
    pub fn format_text(&self, raw: &[u8]) -> String {
        let decoded = self.decode_str(raw);
        let mut out = String::with_capacity(decoded.len());
        let mut chars = decoded.chars().peekable();
        let mut escaped = false;
        while let Some(c) = chars.next() {
            let c = match c {
                '\r' => {
                    chars.next_if_eq(&'\n');
                    '\n'
                }
                '\n' => {
                    chars.next_if_eq(&'\r');
                    '\n'
                }
                '\t' | '\x0b' => ' ',
                c => c,
            };
            if escaped {
                escaped = false;
                if c != '\n' {
                    out.push(c);
                }
            } else if c == '\\' {
                escaped = true;
            } else {
                out.push(c);
            }
        }
        if escaped {
            out.push('\\');
        }
        out
    }

    /// Simple text: as [`format_text`](Self::format_text), with whitespace
    /// runs collapsed and the ends trimmed.
    pub fn format_simple_text(&self, raw: &[u8]) -> String {
        self.format_text(raw)
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn check_root(&self, prop: Property) -> Result<(), ValidationError> {
        if self.is_root {
            Ok(())
        } else {
            Err(ValidationError::removed(Kind::Root(prop)))
        }
    }

    /// Decode a property expecting one value.
    fn one_value<F>(&mut self, values: &[Vec<u8>], empty: Option<Value>, f: F) -> Decoded
    where
        F: FnOnce(&mut Self, &[u8]) -> Decoded,
    {
        match values {
            [] => Ok(empty),
            [v] => f(self, v),
            _ => Ok(None),
        }
    }

    /// Decode every value, flattening nested lists. Item errors are recorded
    /// and the item dropped (or replaced by its fallback).
    fn list_values<F>(&mut self, values: &[Vec<u8>], allow_empty: bool, mut f: F) -> Decoded
    where
        F: FnMut(&mut Self, &[u8]) -> Decoded,
    {
        let mut out = Vec::new();
        for raw in values {
            let item = match f(self, raw) {
                Ok(item) => item,
                Err(e) if e.fatal => {
                    self.errors.push(e.clone());
                    return Err(e);
                }
                Err(e) => {
                    let fallback = e.fallback.clone();
                    self.errors.push(e);
                    fallback
                }
            };
            match item {
                Some(Value::List(items)) => out.extend(items),
                Some(v) => out.push(v),
                None => {}
            }
        }
        Ok((allow_empty || !out.is_empty()).then_some(Value::List(out)))
    }

    fn decode_number(&self, values: &[Vec<u8>]) -> Option<i64> {
        match values {
            [v] => parse_number(&latin1(v)),
            _ => None,
        }
    }

    fn decode_board_size(&mut self, prop: Property, values: &[Vec<u8>]) -> Decoded {
        self.check_root(prop)?;
        let default = DEFAULT_BOARD_SIZE as i64;
        let fallback = Value::composed(default, default);
        let size = match values {
            [v] => {
                let text = latin1(v);
                let parts: Vec<&str> = text.split(':').collect();
                let floor = |s: &str| parse_real(s).map(|r| r.floor() as i64);
                match parts.as_slice() {
                    [a] => floor(a).map(|a| (a, a)),
                    [a, b] => floor(a).zip(floor(b)),
                    _ => None,
                }
            }
            _ => None,
        };
        let Some((w, h)) = size else {
            return Err(ValidationError::with_fallback(Kind::BoardSize, fallback));
        };
        let bounds = MIN_BOARD_SIZE..=MAX_BOARD_SIZE;
        if !bounds.contains(&w) || !bounds.contains(&h) {
            return Err(ValidationError::with_fallback(
                Kind::BoardSizeRange(w, h),
                fallback,
            ));
        }
        Ok(Some(Value::composed(w, h)))
    }

    fn decode_label(&mut self, raw: &[u8]) -> Decoded {
        let Some((point, text)) = split_composed(raw).filter(|(p, _)| !p.is_empty()) else {
            return Ok(None);
        };
        let text = self.format_simple_text(text);
        Ok(format_point(point)?.map(|p| Value::composed(p, text)))
    }

    fn decode_simple_texts(&mut self, raw: &[u8]) -> Composed {
        let (first, second) = split_composed(raw).unwrap_or((raw, b""));
        Composed::new(self.format_simple_text(first), self.format_simple_text(second))
    }

    fn decode_figure(&mut self, values: &[Vec<u8>]) -> Decoded {
        let default = figure_default();
        let [raw] = values else {
            return Ok(Some(default.into()));
        };
        let texts = self.decode_simple_texts(raw);
        let second = texts.second;
        let flags = match texts.first.as_text() {
            Some("") | None => default.first,
            Some(s) => match parse_number(s) {
                Some(n) => Value::Number(n),
                None => return Ok(None),
            },
        };
        Ok(Some(Composed { first: flags, second }.into()))
    }

    /// Decode the raw values of a known property.
    ///
    /// `Ok(None)` means the values are not acceptable and should stay raw.
    pub fn decode(&mut self, prop: Property, values: &[Vec<u8>]) -> Decoded {
        use ValueType as T;
        match prop.value_type() {
            T::Point => self.one_value(values, None, |_, v| {
                Ok(format_point(v)?.map(Value::Point))
            }),
            T::Flag => Ok(Some(Value::Flag)),
            T::Number => Ok(self.decode_number(values).map(Value::Number)),
            T::Real => Ok(match values {
                [v] => parse_real(&latin1(v)).map(Value::Real),
                _ => None,
            }),
            T::Format => {
                self.check_root(prop)?;
                match self.decode_number(values) {
                    Some(v) if SUPPORTED_VERSIONS.contains(&v) => Ok(Some(Value::Number(v))),
                    _ => {
                        let found = values.iter().map(|v| latin1(v)).collect::<Vec<_>>();
                        Err(ValidationError::fatal(Kind::Format(found.join(","))))
                    }
                }
            }
            T::GameType => {
                self.check_root(prop)?;
                match self.decode_number(values) {
                    Some(GO_GAME_TYPE) => Ok(Some(Value::Number(GO_GAME_TYPE))),
                    _ => Err(ValidationError::fatal(Kind::GameType)),
                }
            }
            T::VariationMode => {
                self.check_root(prop)?;
                Ok(self
                    .decode_number(values)
                    .map(|v| if (0..=3).contains(&v) { v } else { v.max(0) & 3 })
                    .map(Value::Number))
            }
            T::BoardSize => self.decode_board_size(prop, values),
            T::PointEList => self.list_values(values, true, |_, v| format_points(v, true)),
            T::PointList => self.list_values(values, false, |_, v| format_points(v, true)),
            T::Color => self.one_value(values, None, |_, v| {
                Ok(std::str::from_utf8(v)
                    .ok()
                    .filter(|s| s.len() == 1)
                    .and_then(Color::parse)
                    .map(Value::Color))
            }),
            T::Charset => {
                self.check_root(prop)?;
                self.one_value(values, None, |this, v| {
                    let charset = latin1(v).trim().to_string();
                    if charset.is_empty() {
                        return Ok(None);
                    }
                    this.charset = charset.clone();
                    Ok(Some(Value::Text(charset)))
                })
            }
            T::Dates => self.one_value(values, None, |this, v| {
                let text: String = this
                    .format_simple_text(v)
                    .chars()
                    .filter(|c| *c != ' ')
                    .collect();
                let dates = expand_dates(&text);
                Ok((!dates.is_empty()).then(|| dates.into()))
            }),
            T::SimpleText => self.one_value(values, None, |this, v| {
                Ok(Some(Value::Text(this.format_simple_text(v))))
            }),
            T::Text => self.one_value(values, None, |this, v| {
                Ok(Some(Value::Text(this.format_text(v))))
            }),
            T::Highlight => Ok(self
                .decode_number(values)
                .filter(|v| *v == 1 || *v == 2)
                .map(Value::Number)),
            T::ComposedPoints => self.list_values(values, false, |_, v| format_points(v, false)),
            T::Labels => self.list_values(values, false, |this, v| this.decode_label(v)),
            T::SimpleTexts => self.one_value(values, None, |this, v| {
                Ok(Some(this.decode_simple_texts(v).into()))
            }),
            T::Figure => self.decode_figure(values),
        }
    }

    /// Decode one property into `node`.
    ///
    /// Accepted values are installed and leave the raw channel; rejected ones
    /// go back to it unless the error asks for removal. Only fatal errors are
    /// returned, the others are recorded.
    pub fn validate(
        &mut self,
        node: &mut Node,
        code: &str,
        values: Vec<Vec<u8>>,
    ) -> Result<(), ValidationError> {
        let Some(prop) = Property::from_code(code) else {
            node.set_raw(code, values);
            return Ok(());
        };
        match self.decode(prop, &values) {
            Ok(Some(value)) => {
                node.set(prop, value);
            }
            Ok(None) => node.set_raw(code, values),
            Err(e) if e.fatal => {
                self.errors.push(e.clone());
                return Err(e);
            }
            Err(e) => {
                if !e.remove {
                    match &e.fallback {
                        Some(fallback) => {
                            node.set(prop, fallback.clone());
                        }
                        None => node.set_raw(code, values),
                    }
                }
                self.errors.push(e);
            }
        }
        Ok(())
    }

    /// Decode `CA` first on the root, so text properties see the charset.
    pub fn check_charset(&mut self, node: &mut Node) -> Result<(), ValidationError> {
        let code = Property::Charset.code();
        if self.is_root {
            if let Some(values) = node.take_raw(code) {
                self.validate(node, code, values)?;
            }
        }
        Ok(())
    }

    /// Decode every raw property of a node. The raw channel is emptied
    /// unless `keep_raw` is set.
    pub fn validate_node(&mut self, node: &mut Node, keep_raw: bool) -> Result<(), ValidationError> {
        self.check_charset(node)?;
        let codes: Vec<String> = node.raw().keys().cloned().collect();
        for code in codes {
            if let Some(values) = node.take_raw(&code) {
                self.validate(node, &code, values)?;
            }
        }
        if !keep_raw {
            node.clear_raw();
        }
        Ok(())
    }

    /// Validate a whole game. Non-fatal errors end up in `tree.errors`; a
    /// fatal one aborts and is returned.
    pub fn validate_tree(&mut self, tree: &mut GameTree, keep_raw: bool) -> Result<(), ValidationError> {
        self.reset();
        let mut records = Vec::new();
        // Whether game infos were set, per branch prefix.
        let mut infos: HashMap<Vec<usize>, bool> = HashMap::new();

        tree.try_walk_mut(|node, path| {
            let branch = path.branches().to_vec();
            let inherited = branch
                .split_last()
                .and_then(|(_, parent)| infos.get(parent).copied())
                .unwrap_or(false);
            let seen = infos.entry(branch).or_insert(inherited);

            self.is_root = path.is_root();
            self.validate_node(node, keep_raw)?;
            records.extend(self.take_errors().into_iter().map(|error| ErrorRecord {
                error,
                path: path.clone(),
            }));

            for kind in resolve_conflicts(node, seen) {
                records.push(ErrorRecord {
                    error: ValidationError::new(kind),
                    path: path.clone(),
                });
            }
            Ok(())
        })?;

        debug!("validated game tree: {} errors", records.len());
        tree.errors = records;
        Ok(())
    }
}

/// Node-level conflict checks run after decoding.
fn resolve_conflicts(node: &mut Node, infos_seen: &mut bool) -> Vec<Kind> {
    let mut conflicts = Vec::new();

    if *infos_seen {
        let redefined = take_props(node, &GAME_INFO);
        if !redefined.is_empty() {
            conflicts.push(Kind::InfoRedefined(redefined));
        }
    } else if GAME_INFO.iter().any(|&p| node.contains(p)) {
        *infos_seen = true;
    }

    if SETUP.iter().any(|&p| node.contains(p)) {
        let moves = take_props(node, &MOVE);
        if !moves.is_empty() {
            conflicts.push(Kind::SetupAndMove(moves));
        }
    }

    let black = node.contains(Property::Black);
    let white = node.contains(Property::White);
    if black == white {
        node.remove(Property::Ko);
        node.remove(Property::MoveNumber);
    }
    if black && white {
        let b = node.remove(Property::Black).and_then(|v| v.as_point());
        let w = node.remove(Property::White).and_then(|v| v.as_point());
        if let (Some(b), Some(w)) = (b, w) {
            if b != w {
                for (prop, p) in [(Property::AddBlack, b), (Property::AddWhite, w)] {
                    let mut points = node.points(prop);
                    points.push(p);
                    node.set_points(prop, points);
                }
            }
            conflicts.push(Kind::AmbiguousMove { black: b, white: w });
        }
    }
    conflicts
}

fn take_props(node: &mut Node, props: &[Property]) -> Vec<(Property, Value)> {
    props
        .iter()
        .filter_map(|&p| node.remove(p).map(|v| (p, v)))
        .collect()
}

// =============================================================================
// Encoding
// =============================================================================

fn value_to_string(value: &Value, composed: bool) -> String {
    match value {
        Value::Flag => String::new(),
        Value::Number(n) => n.to_string(),
        Value::Real(r) => r.to_string(),
        Value::Text(s) => escape(s, composed),
        Value::Color(c) => c.letter().to_string(),
        Value::Point(p) => p.to_sgf().unwrap_or_default(),
        Value::Composed(c) => format!(
            "{}:{}",
            value_to_string(&c.first, true),
            value_to_string(&c.second, true)
        ),
        Value::List(items) => items
            .iter()
            .map(|v| value_to_string(v, composed))
            .collect::<Vec<_>>()
            .join(","),
    }
}

/// Encode a decoded value, brackets included (`[dd]`, `[aa][bb]`).
pub fn encode(prop: Property, value: &Value) -> String {
    use ValueType as T;
    match prop.value_type() {
        T::Flag => "[]".to_string(),
        T::BoardSize => match value.as_composed() {
            Some(c) if c.first == c.second => format!("[{}]", value_to_string(&c.first, false)),
            _ => format!("[{}]", value_to_string(value, false)),
        },
        T::Dates => {
            let dates: Vec<&str> = value.items().iter().filter_map(Value::as_text).collect();
            format!("[{}]", compress_dates(&dates))
        }
        T::PointList | T::PointEList | T::ComposedPoints | T::Labels => {
            let items = value.items();
            if items.is_empty() {
                return "[]".to_string();
            }
            items
                .iter()
                .map(|v| format!("[{}]", value_to_string(v, false)))
                .collect()
        }
        _ => format!("[{}]", value_to_string(value, false)),
    }
}

/// SGF form of a node: decoded properties, then raw ones verbatim.
/// Raw bytes are read as UTF-8.
pub fn node_to_sgf(node: &Node) -> String {
    let mut out = String::new();
    write_node(&mut out, node, true, None);
    out
}

/// SGF form of a whole game.
///
/// The output is UTF-8. Raw values are decoded under the game's charset,
/// and the root carries `CA[UTF-8]` whenever it had a `CA` or any value is
/// non-ASCII, so that parsing the output gives back the same text.
pub fn tree_to_sgf(tree: &GameTree) -> String {
    let root_charset = tree
        .nodes
        .first()
        .and_then(|root| root.get(Property::Charset))
        .and_then(Value::as_text);
    let raw_utf8 = root_charset.is_some_and(|cs| UTF8_CHARSETS.contains(&cs));
    let tag = root_charset.is_some() || !tree.iter().all(|(_, node)| node_is_ascii(node));

    let mut out = String::new();
    write_tree(&mut out, tree, raw_utf8, tag.then_some(OUTPUT_CHARSET));
    out
}

fn write_tree(out: &mut String, tree: &GameTree, raw_utf8: bool, mut charset: Option<&str>) {
    out.push('(');
    for node in &tree.nodes {
        write_node(out, node, raw_utf8, charset.take());
    }
    for variation in &tree.variations {
        write_tree(out, variation, raw_utf8, None);
    }
    out.push(')');
}

/// `charset`, when given, replaces (or adds) the node's `CA`.
fn write_node(out: &mut String, node: &Node, raw_utf8: bool, charset: Option<&str>) {
    out.push(';');
    if let Some(charset) = charset {
        out.push_str(Property::Charset.code());
        out.push_str(&encode(Property::Charset, &Value::from(charset)));
    }
    for (prop, value) in node.props() {
        if charset.is_some() && prop == Property::Charset {
            continue;
        }
        out.push_str(prop.code());
        out.push_str(&encode(prop, value));
    }
    for (code, values) in node.raw() {
        out.push_str(code);
        if values.is_empty() {
            out.push_str("[]");
        }
        for v in values {
            out.push('[');
            if raw_utf8 {
                out.push_str(&String::from_utf8_lossy(v));
            } else {
                out.push_str(&latin1(v));
            }
            out.push(']');
        }
    }
}

fn node_is_ascii(node: &Node) -> bool {
    node.props().all(|(_, v)| value_is_ascii(v))
        && node.raw().values().flatten().all(|v| v.is_ascii())
}

fn value_is_ascii(value: &Value) -> bool {
    match value {
        Value::Text(s) => s.is_ascii(),
        Value::Composed(c) => value_is_ascii(&c.first) && value_is_ascii(&c.second),
        Value::List(items) => items.iter().all(value_is_ascii),
        _ => true,
    }
}

/// Tag a fatal error for a whole game.
pub(crate) fn tree_error(error: ValidationError) -> ErrorRecord {
    ErrorRecord {
        error,
        path: Path::empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(values: &[&str]) -> Vec<Vec<u8>> {
        values.iter().map(|v| v.as_bytes().to_vec()).collect()
    }

    fn decode(prop: Property, values: &[&str]) -> Decoded {
        Validator::new().decode(prop, &raw(values))
    }

    fn node_with(props: &[(&str, &[&str])]) -> Node {
        let mut node = Node::new();
        for (code, values) in props {
            node.set_raw(code, raw(values));
        }
        node
    }

    // =========================================================================
    // Decoders
    // =========================================================================

    #[test]
    fn test_decode_points() {
        assert_eq!(
            decode(Property::Black, &["dd"]).unwrap(),
            Some(Value::Point(Point::new(3, 3)))
        );
        assert_eq!(decode(Property::Black, &[""]).unwrap(), None);
        let err = decode(Property::Black, &["d1"]).unwrap_err();
        assert!(err.remove);
        assert_eq!(err.code(), "sgf:validator:point");

        let range = decode(Property::AddBlack, &["aa:bb", "cc"]).unwrap().unwrap();
        let points: Vec<Point> = range.points().collect();
        assert_eq!(
            points,
            vec![
                Point::new(0, 0),
                Point::new(1, 0),
                Point::new(0, 1),
                Point::new(1, 1),
                Point::new(2, 2)
            ]
        );
        assert_eq!(decode(Property::View, &[""]).unwrap(), Some(Value::List(vec![])));
        assert_eq!(decode(Property::AddBlack, &[""]).unwrap(), None);
    }

    #[test]
    fn test_bad_item_in_list_is_dropped() {
        let mut v = Validator::new();
        let value = v.decode(Property::AddWhite, &raw(&["aa", "a!", "bb"])).unwrap();
        assert_eq!(
            value,
            Some(Value::List(vec![Point::new(0, 0).into(), Point::new(1, 1).into()]))
        );
        assert_eq!(v.take_errors().len(), 1);
    }

    #[test]
    fn test_decode_composed_points_and_labels() {
        assert_eq!(
            decode(Property::Arrow, &["aa:bb"]).unwrap(),
            Some(Value::List(vec![Value::composed(Point::new(0, 0), Point::new(1, 1))]))
        );
        assert_eq!(
            decode(Property::Label, &["dd:A  b", "ee:x\\:y"]).unwrap(),
            Some(Value::List(vec![
                Value::composed(Point::new(3, 3), "A b"),
                Value::composed(Point::new(4, 4), "x:y"),
            ]))
        );
        assert_eq!(decode(Property::Label, &[":A"]).unwrap(), None);
    }

    #[test]
    fn test_decode_text() {
        let v = Validator::new();
        assert_eq!(v.format_text(b"a\r\nb\\]c\\\nd\te"), "a\nb]cd e");
        assert_eq!(v.format_simple_text(b"  a \n\n b\\\\ "), "a b\\");
        assert_eq!(v.format_text(b"caf\xe9"), "caf\u{e9}");
    }

    #[test]
    fn test_utf8_charset() {
        let mut v = Validator::new();
        let mut node = node_with(&[("C", &["caf\u{e9}"]), ("CA", &["UTF-8"])]);
        v.validate_node(&mut node, false).unwrap();
        assert!(v.is_utf8());
        assert_eq!(node.get(Property::Comment), Some(&Value::Text("caf\u{e9}".into())));
    }

    #[test]
    fn test_decode_numbers() {
        assert_eq!(decode(Property::Handicap, &["3"]).unwrap(), Some(Value::Number(3)));
        assert_eq!(decode(Property::Komi, &["6.5"]).unwrap(), Some(Value::Real(6.5)));
        assert_eq!(decode(Property::Komi, &["x"]).unwrap(), None);
        assert_eq!(decode(Property::Style, &["7"]).unwrap(), Some(Value::Number(3)));
        assert_eq!(decode(Property::Style, &["-2"]).unwrap(), Some(Value::Number(0)));
        assert_eq!(decode(Property::Tesuji, &["2"]).unwrap(), Some(Value::Number(2)));
        assert_eq!(decode(Property::Tesuji, &["3"]).unwrap(), None);
        assert_eq!(decode(Property::Ko, &["whatever"]).unwrap(), Some(Value::Flag));
    }

    #[test]
    fn test_decode_root_properties() {
        assert_eq!(
            decode(Property::Size, &["9:13"]).unwrap(),
            Some(Value::composed(9i64, 13i64))
        );
        let err = decode(Property::Size, &["60"]).unwrap_err();
        assert_eq!(err.fallback, Some(Value::composed(19i64, 19i64)));
        let err = decode(Property::Size, &["big"]).unwrap_err();
        assert_eq!(err.kind, Kind::BoardSize);

        assert!(decode(Property::FileFormat, &["5"]).unwrap_err().fatal);
        assert!(decode(Property::GameType, &["2"]).unwrap_err().fatal);

        let mut v = Validator::new();
        v.set_root(false);
        let err = v.decode(Property::Size, &raw(&["9"])).unwrap_err();
        assert!(err.remove);
        assert_eq!(err.code(), "sgf:validator:root");
    }

    #[test]
    fn test_decode_misc() {
        assert_eq!(decode(Property::Player, &["w"]).unwrap(), Some(Color::White.into()));
        assert_eq!(decode(Property::Player, &["x"]).unwrap(), None);
        assert_eq!(
            decode(Property::Application, &["Go\\:Tool:1.0"]).unwrap(),
            Some(Value::composed("Go:Tool", "1.0"))
        );
        assert_eq!(
            decode(Property::Figure, &[""]).unwrap(),
            Some(Value::composed(32768i64, ""))
        );
        assert_eq!(
            decode(Property::Figure, &["5:Diagram"]).unwrap(),
            Some(Value::composed(5i64, "Diagram"))
        );
        assert_eq!(decode(Property::Figure, &["x:y"]).unwrap(), None);
    }

    // =========================================================================
    // Dates
    // =========================================================================

    #[test]
    fn test_expand_dates() {
        assert_eq!(
            expand_dates("2023-01-01,02,03"),
            vec!["2023-01-01", "2023-01-02", "2023-01-03"]
        );
        assert_eq!(
            expand_dates("1996-05,06-12,13,1997"),
            vec!["1996-05", "1996-06-12", "1996-06-13", "1997"]
        );
        // No prefix after a bare year, malformed entry resets.
        assert_eq!(expand_dates("2000,05,bad,10,2001-02"), vec!["2000", "2001-02"]);
        assert_eq!(expand_dates("2010-10-10,13"), vec!["2010-10-10", "2010-10-13"]);
        assert_eq!(expand_dates("2010-13-01"), Vec::<String>::new());
    }

    #[test]
    fn test_compress_dates() {
        let dates = ["2023-01-01", "2023-01-02", "2023-01-03"];
        assert_eq!(compress_dates(&dates), "2023-01-01,02,03");
        let dates = ["1996-05", "1996-06-12", "1996-07", "1997", "1997-02"];
        let compressed = compress_dates(&dates);
        assert_eq!(compressed, "1996-05,06-12,1996-07,1997,1997-02");
        assert_eq!(expand_dates(&compressed), dates);
    }

    // =========================================================================
    // Node and tree validation
    // =========================================================================

    #[test]
    fn test_validate_node_keeps_unknown_raw() {
        let mut v = Validator::new();
        let mut node = node_with(&[("XY", &["1"]), ("B", &["d1"]), ("KM", &["x"]), ("C", &["hi"])]);
        v.validate_node(&mut node, true).unwrap();
        assert_eq!(node.get(Property::Comment), Some(&Value::Text("hi".into())));
        assert!(node.raw().contains_key("XY"));
        assert!(node.raw().contains_key("KM"));
        assert!(!node.raw().contains_key("B"));
        assert_eq!(v.take_errors().len(), 1);

        let mut node = node_with(&[("XY", &["1"])]);
        v.validate_node(&mut node, false).unwrap();
        assert!(node.raw().is_empty());
    }

    #[test]
    fn test_validate_tree_conflicts() {
        let root = node_with(&[("SZ", &["9"]), ("PB", &["a"])]);
        let both_moves = node_with(&[("B", &["aa"]), ("W", &["bb"]), ("KO", &[""])]);
        let same_point = node_with(&[("B", &["cc"]), ("W", &["cc"])]);
        let setup_move = node_with(&[("AB", &["dd"]), ("W", &["ee"])]);
        let redefined = node_with(&[("PB", &["b"]), ("C", &["x"])]);
        let mut tree = GameTree::new(vec![root, both_moves, same_point, setup_move, redefined], vec![]);

        Validator::new().validate_tree(&mut tree, false).unwrap();

        let n1 = &tree.nodes[1];
        assert_eq!(n1.points(Property::AddBlack), vec![Point::new(0, 0)]);
        assert_eq!(n1.points(Property::AddWhite), vec![Point::new(1, 1)]);
        assert!(!n1.contains(Property::Black) && !n1.contains(Property::Ko));

        let n2 = &tree.nodes[2];
        assert!(n2.is_empty());

        let n3 = &tree.nodes[3];
        assert!(!n3.contains(Property::White));
        assert!(n3.contains(Property::AddBlack));

        let n4 = &tree.nodes[4];
        assert!(!n4.contains(Property::BlackPlayer));
        assert!(n4.contains(Property::Comment));

        let paths: Vec<Vec<usize>> = tree.errors.iter().map(|r| r.path.to_vec()).collect();
        assert_eq!(paths, vec![vec![1], vec![2], vec![3], vec![4]]);
        assert!(tree.errors.iter().all(|r| r.error.code() == "sgf:validator:conflict"));
    }

    #[test]
    fn test_game_info_per_branch() {
        let root = node_with(&[("GM", &["1"])]);
        let a = GameTree::new(vec![node_with(&[("PB", &["x"])])], vec![]);
        let b = GameTree::new(
            vec![node_with(&[("PB", &["y"])]), node_with(&[("PW", &["z"])])],
            vec![],
        );
        let mut tree = GameTree::new(vec![root], vec![a, b]);
        Validator::new().validate_tree(&mut tree, false).unwrap();
        assert_eq!(tree.errors.len(), 1);
        assert_eq!(tree.errors[0].path.to_vec(), vec![1, 1]);
    }

    #[test]
    fn test_root_only_outside_root() {
        let mut tree = GameTree::new(
            vec![node_with(&[("FF", &["4"])]), node_with(&[("SZ", &["9"])])],
            vec![],
        );
        Validator::new().validate_tree(&mut tree, true).unwrap();
        assert!(tree.nodes[1].is_empty());
        assert_eq!(tree.errors[0].error.code(), "sgf:validator:root");
    }

    #[test]
    fn test_fatal_aborts() {
        let mut tree = GameTree::new(vec![node_with(&[("GM", &["3"])])], vec![]);
        let err = Validator::new().validate_tree(&mut tree, false).unwrap_err();
        assert_eq!(err.code(), "sgf:validator:gametype");
    }

    // =========================================================================
    // Encoding
    // =========================================================================

    #[test]
    fn test_encode() {
        assert_eq!(encode(Property::Size, &Value::composed(19i64, 19i64)), "[19]");
        assert_eq!(encode(Property::Size, &Value::composed(9i64, 13i64)), "[9:13]");
        assert_eq!(encode(Property::Ko, &Value::Flag), "[]");
        assert_eq!(encode(Property::Comment, &"a]b\\c".into()), "[a\\]b\\\\c]");
        assert_eq!(
            encode(Property::Label, &Value::List(vec![Value::composed(Point::new(0, 1), "a:b")])),
            "[ab:a\\:b]"
        );
        assert_eq!(encode(Property::View, &Value::List(vec![])), "[]");
        assert_eq!(encode(Property::Player, &Color::Black.into()), "[B]");
        assert_eq!(encode(Property::Komi, &Value::Real(6.5)), "[6.5]");
    }

    #[test]
    fn test_node_to_sgf() {
        let mut node = Node::new();
        node.set(Property::Black, Point::new(3, 3));
        node.set(Property::Comment, "hi");
        node.push_raw("XX", b"a\\]");
        assert_eq!(node_to_sgf(&node), ";B[dd]C[hi]XX[a\\]]");
    }

    #[test]
    fn test_tree_to_sgf_charset() {
        use crate::parser::parse;

        let tree = parse(b"(;CA[ISO-8859-1]C[ok];XX[\xE9t\xE9])", true).unwrap().remove(0);
        let out = tree_to_sgf(&tree);
        assert_eq!(out, "(;CA[UTF-8]C[ok];XX[\u{e9}t\u{e9}])");

        let again = parse(&out, true).unwrap().remove(0);
        assert_eq!(again.nodes[1].raw()["XX"], vec!["\u{e9}t\u{e9}".as_bytes().to_vec()]);
        assert_eq!(tree_to_sgf(&again), out);

        let ascii = parse("(;C[ok];B[aa])", true).unwrap().remove(0);
        assert_eq!(tree_to_sgf(&ascii), "(;C[ok];B[aa])");
    }
}
