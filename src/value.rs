//! Decoded property values.
//!
//! A property decodes into a [`Value`]: a scalar, a [`Point`], a
//! [`Composed`] pair or a list of those. The serde mapping is the structured
//! interchange form: points are `{x, y}` objects, composed values are
//! `{first, second}` objects, colors are `"B"`/`"W"` and flags are `true`.

use std::fmt;

use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::constants::ALPHABET;

/// Stone color.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    #[serde(rename = "B")]
    Black,
    #[serde(rename = "W")]
    White,
}

impl Color {
    /// The opposite color.
    pub fn opponent(self) -> Color {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }

    /// Parse `b`, `black`, `w` or `white` (case insensitive).
    pub fn parse(s: &str) -> Option<Color> {
        match s.to_ascii_lowercase().as_str() {
            "b" | "black" => Some(Color::Black),
            "w" | "white" => Some(Color::White),
            _ => None,
        }
    }

    /// Single-letter SGF form.
    pub fn letter(self) -> char {
        match self {
            Color::Black => 'B',
            Color::White => 'W',
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Color::Black => 0,
            Color::White => 1,
        }
    }
}

/// A board intersection, 0-based from the top-left corner.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Point {
    pub x: usize,
    pub y: usize,
}

impl Point {
    pub const fn new(x: usize, y: usize) -> Self {
        Point { x, y }
    }

    /// Parse the two-letter SGF form (`"dd"` is `(3, 3)`).
    ///
    /// Returns `None` unless `s` is exactly two alphabet letters.
    pub fn from_sgf(s: &[u8]) -> Option<Point> {
        match s {
            [x, y] => Some(Point::new(coordinate(*x)?, coordinate(*y)?)),
            _ => None,
        }
    }

    /// The two-letter SGF form, or `None` if a coordinate exceeds the alphabet.
    pub fn to_sgf(self) -> Option<String> {
        let x = *ALPHABET.get(self.x)?;
        let y = *ALPHABET.get(self.y)?;
        Some([x as char, y as char].iter().collect())
    }
}

fn coordinate(c: u8) -> Option<usize> {
    ALPHABET.iter().position(|&a| a == c)
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_sgf() {
            Some(s) => f.write_str(&s),
            None => write!(f, "({}, {})", self.x, self.y),
        }
    }
}

/// An ordered pair of values, written `first:second` in SGF.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Composed {
    pub first: Value,
    pub second: Value,
}

impl Composed {
    pub fn new(first: impl Into<Value>, second: impl Into<Value>) -> Self {
        Composed {
            first: first.into(),
            second: second.into(),
        }
    }
}

/// A decoded property value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Presence-only property (`KO`, `DO`, `IT`).
    Flag,
    Number(i64),
    Real(f64),
    Text(String),
    Color(Color),
    Point(Point),
    Composed(Box<Composed>),
    List(Vec<Value>),
}

impl Value {
    pub fn as_point(&self) -> Option<Point> {
        match self {
            Value::Point(p) => Some(*p),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<i64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<f64> {
        match self {
            Value::Real(r) => Some(*r),
            Value::Number(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<Color> {
        match self {
            Value::Color(c) => Some(*c),
            _ => None,
        }
    }

    pub fn as_composed(&self) -> Option<&Composed> {
        match self {
            Value::Composed(c) => Some(c),
            _ => None,
        }
    }

    /// List elements, or the value itself as a one-element slice.
    pub fn items(&self) -> &[Value] {
        match self {
            Value::List(items) => items,
            other => std::slice::from_ref(other),
        }
    }

    /// Every point held by the value, looking through lists.
    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        self.items().iter().filter_map(Value::as_point)
    }

    pub fn composed(first: impl Into<Value>, second: impl Into<Value>) -> Value {
        Value::Composed(Box::new(Composed::new(first, second)))
    }
}

impl From<Point> for Value {
    fn from(p: Point) -> Self {
        Value::Point(p)
    }
}

impl From<Color> for Value {
    fn from(c: Color) -> Self {
        Value::Color(c)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n)
    }
}

impl From<f64> for Value {
    fn from(r: f64) -> Self {
        Value::Real(r)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Composed> for Value {
    fn from(c: Composed) -> Self {
        Value::Composed(Box::new(c))
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Flag => serializer.serialize_bool(true),
            Value::Number(n) => serializer.serialize_i64(*n),
            Value::Real(r) => serializer.serialize_f64(*r),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Color(c) => c.serialize(serializer),
            Value::Point(p) => p.serialize(serializer),
            Value::Composed(c) => {
                let mut s = serializer.serialize_struct("Composed", 2)?;
                s.serialize_field("first", &c.first)?;
                s.serialize_field("second", &c.second)?;
                s.end()
            }
            Value::List(items) => items.serialize(serializer),
        }
    }
}

/// Generic deserialization. The result is shape-based (a `"B"` string stays
/// text); `Property::coerce` turns it into the property's decoded type.
impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a property value")
    }

    fn visit_bool<E: de::Error>(self, _: bool) -> Result<Value, E> {
        Ok(Value::Flag)
    }

    fn visit_i64<E: de::Error>(self, n: i64) -> Result<Value, E> {
        Ok(Value::Number(n))
    }

    fn visit_u64<E: de::Error>(self, n: u64) -> Result<Value, E> {
        i64::try_from(n)
            .map(Value::Number)
            .map_err(|_| E::custom("number out of range"))
    }

    fn visit_f64<E: de::Error>(self, r: f64) -> Result<Value, E> {
        Ok(Value::Real(r))
    }

    fn visit_str<E: de::Error>(self, s: &str) -> Result<Value, E> {
        Ok(Value::Text(s.to_string()))
    }

    fn visit_string<E: de::Error>(self, s: String) -> Result<Value, E> {
        Ok(Value::Text(s))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut items = Vec::new();
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::List(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Value, A::Error> {
        let mut x = None;
        let mut y = None;
        let mut first = None;
        let mut second = None;
        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "x" => x = Some(map.next_value::<usize>()?),
                "y" => y = Some(map.next_value::<usize>()?),
                "first" => first = Some(map.next_value::<Value>()?),
                "second" => second = Some(map.next_value::<Value>()?),
                other => return Err(de::Error::unknown_field(other, &["x", "y", "first", "second"])),
            }
        }
        match (x, y, first, second) {
            (Some(x), Some(y), None, None) => Ok(Value::Point(Point::new(x, y))),
            (None, None, Some(a), Some(b)) => Ok(Value::composed(a, b)),
            _ => Err(de::Error::custom("expected {x, y} or {first, second}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_sgf_roundtrip() {
        assert_eq!(Point::from_sgf(b"aa"), Some(Point::new(0, 0)));
        assert_eq!(Point::from_sgf(b"sA"), Some(Point::new(18, 26)));
        assert_eq!(Point::new(4, 2).to_sgf().as_deref(), Some("ec"));
        assert_eq!(Point::from_sgf(b"a"), None);
        assert_eq!(Point::from_sgf(b"a1"), None);
        assert_eq!(Point::new(52, 0).to_sgf(), None);
    }

    #[test]
    fn test_color_helpers() {
        assert_eq!(Color::Black.opponent(), Color::White);
        assert_eq!(Color::parse("White"), Some(Color::White));
        assert_eq!(Color::parse("b"), Some(Color::Black));
        assert_eq!(Color::parse("x"), None);
    }

    #[test]
    fn test_value_json_shapes() {
        let v = Value::List(vec![
            Value::Point(Point::new(1, 2)),
            Value::composed(Point::new(0, 0), "A"),
        ]);
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, r#"[{"x":1,"y":2},{"first":{"x":0,"y":0},"second":"A"}]"#);
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);
        assert_eq!(serde_json::to_string(&Value::Flag).unwrap(), "true");
        assert_eq!(serde_json::to_string(&Value::Color(Color::White)).unwrap(), r#""W""#);
    }
}
