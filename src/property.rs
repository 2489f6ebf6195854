//! Known SGF properties.
//!
//! Every property code the codec understands is a [`Property`] variant, and
//! each variant maps to one [`ValueType`] that selects its decoder and
//! encoder. Codes outside this table stay undecoded in a node's raw side
//! channel.

use std::fmt;

use crate::value::{Color, Composed, Value};

/// Value grammar of a property. Selects the decoder/encoder pair.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ValueType {
    /// Single point (`B`, `W`).
    Point,
    /// Value ignored, presence is the signal.
    Flag,
    Number,
    Real,
    /// `FF`: number restricted to supported versions, root only.
    Format,
    /// `GM`: must be Go, root only.
    GameType,
    /// `ST`: number in `0..=3`, root only.
    VariationMode,
    /// `SZ`: number or `columns:rows`, root only.
    BoardSize,
    /// List of points with `aa:bb` ranges, may be empty.
    PointEList,
    /// List of points with `aa:bb` ranges, not empty.
    PointList,
    Color,
    /// `CA`, root only.
    Charset,
    /// Compressed date list.
    Dates,
    SimpleText,
    Text,
    /// Number restricted to 1 or 2.
    Highlight,
    /// List of `point:point` pairs.
    ComposedPoints,
    /// List of `point:text` labels.
    Labels,
    /// `simpletext:simpletext` pair.
    SimpleTexts,
    /// `number:simpletext` pair, defaulting when empty.
    Figure,
}

macro_rules! properties {
    ($($variant:ident => $code:literal, $ty:ident;)*) => {
        /// A known property code.
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Property {
            $($variant,)*
        }

        impl Property {
            /// Every known property, in table order.
            pub const ALL: &'static [Property] = &[$(Property::$variant,)*];

            /// The SGF identifier (`"B"`, `"AB"`, ...).
            pub fn code(self) -> &'static str {
                match self {
                    $(Property::$variant => $code,)*
                }
            }

            /// Look up a property by its SGF identifier.
            pub fn from_code(code: &str) -> Option<Property> {
                match code {
                    $($code => Some(Property::$variant),)*
                    _ => None,
                }
            }

            pub fn value_type(self) -> ValueType {
                match self {
                    $(Property::$variant => ValueType::$ty,)*
                }
            }
        }
    };
}

properties! {
    Black => "B", Point;
    White => "W", Point;
    Ko => "KO", Flag;
    Doubtful => "DO", Flag;
    Interesting => "IT", Flag;
    MoveNumber => "MN", Number;
    BlackMovesLeft => "OB", Number;
    WhiteMovesLeft => "OW", Number;
    PrintMode => "PM", Number;
    Handicap => "HA", Number;
    FileFormat => "FF", Format;
    GameType => "GM", GameType;
    Style => "ST", VariationMode;
    Size => "SZ", BoardSize;
    Dim => "DD", PointEList;
    View => "VW", PointEList;
    BlackTerritory => "TB", PointEList;
    WhiteTerritory => "TW", PointEList;
    AddBlack => "AB", PointList;
    AddEmpty => "AE", PointList;
    AddWhite => "AW", PointList;
    Circle => "CR", PointList;
    Cross => "MA", PointList;
    Selected => "SL", PointList;
    Square => "SQ", PointList;
    Triangle => "TR", PointList;
    Player => "PL", Color;
    Charset => "CA", Charset;
    Date => "DT", Dates;
    GameResult => "RE", SimpleText;
    Rules => "RU", SimpleText;
    Name => "N", SimpleText;
    Annotator => "AN", SimpleText;
    BlackRank => "BR", SimpleText;
    BlackTeam => "BT", SimpleText;
    Copyright => "CP", SimpleText;
    Event => "EV", SimpleText;
    GameName => "GN", SimpleText;
    Opening => "ON", SimpleText;
    Overtime => "OT", SimpleText;
    BlackPlayer => "PB", SimpleText;
    Place => "PC", SimpleText;
    WhitePlayer => "PW", SimpleText;
    Round => "RO", SimpleText;
    Source => "SO", SimpleText;
    User => "US", SimpleText;
    WhiteRank => "WR", SimpleText;
    WhiteTeam => "WT", SimpleText;
    Comment => "C", Text;
    GameComment => "GC", Text;
    EvenPosition => "DM", Highlight;
    GoodForBlack => "GB", Highlight;
    GoodForWhite => "GW", Highlight;
    Hotspot => "HO", Highlight;
    Unclear => "UC", Highlight;
    BadMove => "BM", Highlight;
    Tesuji => "TE", Highlight;
    Estimate => "V", Real;
    TimeLimit => "TM", Real;
    BlackTimeLeft => "BL", Real;
    WhiteTimeLeft => "WL", Real;
    Komi => "KM", Real;
    Arrow => "AR", ComposedPoints;
    Line => "LN", ComposedPoints;
    Label => "LB", Labels;
    Application => "AP", SimpleTexts;
    Figure => "FG", Figure;
}

/// Setup properties. Mutually exclusive with [`MOVE`] on one node.
pub const SETUP: [Property; 4] = [
    Property::AddBlack,
    Property::AddEmpty,
    Property::AddWhite,
    Property::Player,
];

/// Move properties.
pub const MOVE: [Property; 4] = [
    Property::Black,
    Property::Ko,
    Property::MoveNumber,
    Property::White,
];

/// Game-info properties: set at most once along any root-to-leaf path.
pub const GAME_INFO: [Property; 23] = [
    Property::Annotator,
    Property::BlackRank,
    Property::BlackTeam,
    Property::Copyright,
    Property::Date,
    Property::Event,
    Property::GameName,
    Property::GameComment,
    Property::Opening,
    Property::Overtime,
    Property::BlackPlayer,
    Property::Place,
    Property::WhitePlayer,
    Property::GameResult,
    Property::Round,
    Property::Rules,
    Property::Source,
    Property::TimeLimit,
    Property::User,
    Property::WhiteRank,
    Property::WhiteTeam,
    Property::Handicap,
    Property::Komi,
];

/// Markup properties cleared by `marks(None, ..)`.
pub const MARKUP: [Property; 9] = [
    Property::Dim,
    Property::Label,
    Property::Circle,
    Property::Cross,
    Property::Selected,
    Property::Square,
    Property::Triangle,
    Property::Arrow,
    Property::Line,
];

/// Semantic names of game-info and node-info properties. Node infos (the
/// `true` entries) only describe the node they are set on.
const INFO_KEYS: [(Property, &str, bool); 28] = [
    (Property::Annotator, "annotator", false),
    (Property::BlackRank, "blackrank", false),
    (Property::BlackTeam, "blackteam", false),
    (Property::Copyright, "copy", false),
    (Property::Date, "date", false),
    (Property::Event, "event", false),
    (Property::GameName, "gamename", false),
    (Property::GameComment, "gamecomment", false),
    (Property::Opening, "opening", false),
    (Property::Overtime, "overtime", false),
    (Property::BlackPlayer, "blackplayer", false),
    (Property::Place, "location", false),
    (Property::WhitePlayer, "whiteplayer", false),
    (Property::GameResult, "result", false),
    (Property::Round, "round", false),
    (Property::Rules, "rules", false),
    (Property::Source, "source", false),
    (Property::TimeLimit, "maintime", false),
    (Property::User, "user", false),
    (Property::WhiteRank, "whiterank", false),
    (Property::WhiteTeam, "whiteteam", false),
    (Property::Handicap, "handicap", false),
    (Property::Komi, "komi", false),
    (Property::Comment, "nodecomment", true),
    (Property::BlackTimeLeft, "blacktimeleft", true),
    (Property::BlackMovesLeft, "blackmovesleft", true),
    (Property::WhiteMovesLeft, "whitemovesleft", true),
    (Property::WhiteTimeLeft, "whitetimeleft", true),
];

impl Property {
    pub fn is_setup(self) -> bool {
        SETUP.contains(&self)
    }

    pub fn is_move(self) -> bool {
        MOVE.contains(&self)
    }

    pub fn is_game_info(self) -> bool {
        GAME_INFO.contains(&self)
    }

    /// Properties only meaningful on the root node of a game.
    pub fn is_root_only(self) -> bool {
        matches!(
            self.value_type(),
            ValueType::Format
                | ValueType::GameType
                | ValueType::VariationMode
                | ValueType::BoardSize
                | ValueType::Charset
        ) || self == Property::Application
    }

    /// The move property played by `color`.
    pub fn move_of(color: Color) -> Property {
        match color {
            Color::Black => Property::Black,
            Color::White => Property::White,
        }
    }

    /// Semantic info name (`"blackplayer"` for `PB`), if any.
    pub fn info_key(self) -> Option<&'static str> {
        INFO_KEYS.iter().find(|(p, ..)| *p == self).map(|(_, k, _)| *k)
    }

    /// Whether an info property only applies to the node carrying it.
    pub fn is_node_info(self) -> bool {
        INFO_KEYS.iter().any(|(p, _, node)| *p == self && *node)
    }

    /// Resolve a semantic info name or a raw 1-2 letter code.
    pub fn from_info_key(key: &str) -> Option<Property> {
        INFO_KEYS
            .iter()
            .find(|(_, k, _)| k.eq_ignore_ascii_case(key))
            .map(|(p, ..)| *p)
            .or_else(|| match key.len() {
                1 | 2 => Property::from_code(&key.to_ascii_uppercase()),
                _ => None,
            })
    }

    /// All info properties with a semantic name.
    pub fn infos() -> impl Iterator<Item = Property> {
        INFO_KEYS.iter().map(|(p, ..)| *p)
    }

    /// Convert a generically shaped value into this property's decoded type.
    ///
    /// Used when values come from the structured interchange form or from an
    /// editor rather than from SGF text. Returns `None` when the shape cannot
    /// be reconciled with the property.
    pub fn coerce(self, value: Value) -> Option<Value> {
        use ValueType as T;
        match (self.value_type(), value) {
            (T::Flag, _) => Some(Value::Flag),
            (T::Point, v @ Value::Point(_)) => Some(v),
            (T::Point, Value::Text(s)) => crate::value::Point::from_sgf(s.as_bytes()).map(Value::Point),
            (
                T::Number | T::Format | T::GameType | T::VariationMode | T::Highlight,
                Value::Real(r),
            ) if r.fract() == 0.0 => Some(Value::Number(r as i64)),
            (
                T::Number | T::Format | T::GameType | T::VariationMode | T::Highlight,
                v @ Value::Number(_),
            ) => Some(v),
            (T::Real, Value::Number(n)) => Some(Value::Real(n as f64)),
            (T::Real, v @ Value::Real(_)) => Some(v),
            (T::Color, Value::Text(s)) => Color::parse(&s).map(Value::Color),
            (T::Color, v @ Value::Color(_)) => Some(v),
            (T::Charset | T::SimpleText | T::Text, v @ Value::Text(_)) => Some(v),
            (T::BoardSize, Value::Number(n)) => Some(Value::composed(n, n)),
            (T::BoardSize, Value::List(items)) => match items.as_slice() {
                [Value::Number(w), Value::Number(h)] => Some(Value::composed(*w, *h)),
                _ => None,
            },
            (T::BoardSize | T::SimpleTexts | T::Figure, v @ Value::Composed(_)) => Some(v),
            (T::Dates, Value::Text(s)) => Some(Value::List(vec![Value::Text(s)])),
            (T::Dates, v @ Value::List(_)) => Some(v),
            (T::PointList | T::PointEList, Value::Point(p)) => Some(Value::List(vec![Value::Point(p)])),
            (T::PointList | T::PointEList | T::ComposedPoints | T::Labels, Value::List(items)) => {
                Some(Value::List(items))
            }
            (T::ComposedPoints | T::Labels, v @ Value::Composed(_)) => Some(Value::List(vec![v])),
            _ => None,
        }
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Default `FG` value when the property carries no value.
pub(crate) fn figure_default() -> Composed {
    Composed::new(crate::constants::FIGURE_DEFAULT_FLAGS, "")
}
