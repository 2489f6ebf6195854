//! Error types.
//!
//! Three tiers, matching where a problem is detected:
//! - [`SyntaxError`]: the token stream is broken. Always fatal to a parse.
//! - [`ValidationError`]: a property could not be decoded or conflicts with
//!   another one. Recorded as an [`ErrorRecord`] on the owning tree, fatal
//!   only for that tree when flagged so.
//! - [`RenderError`]: replaying a path onto a board hit an occupied
//!   intersection.
//!
//! [`EditError`] covers navigator edits that are refused.

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::path::Path;
use crate::property::Property;
use crate::value::{Point, Value};

/// Unexpected character or token in the SGF text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parse error: unexpected '{found}' ({token}) at line {line}, char {column}")]
pub struct SyntaxError {
    /// Byte offset in the input.
    pub index: usize,
    /// 1-based line number.
    pub line: usize,
    /// 1-based column.
    pub column: usize,
    /// The offending characters.
    pub found: String,
    /// Description of the token being read.
    pub token: &'static str,
}

impl SyntaxError {
    pub fn code(&self) -> &'static str {
        "sgf:parser"
    }
}

/// What went wrong while validating a property or a node.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationErrorKind {
    #[error("invalid point string '{0}'")]
    Point(String),
    #[error("root property '{0}' used outside of root node")]
    Root(Property),
    #[error("unsupported SGF format version ({0})")]
    Format(String),
    #[error("unsupported game type, GM[1] required")]
    GameType,
    #[error("invalid board size")]
    BoardSize,
    #[error("illegal board size [{0}:{1}], expected {min} <= SZ <= {max}", min = crate::constants::MIN_BOARD_SIZE, max = crate::constants::MAX_BOARD_SIZE)]
    BoardSizeRange(i64, i64),
    #[error("invalid value for property '{0}'")]
    Value(Property),
    #[error("redefined game info properties not allowed")]
    InfoRedefined(Vec<(Property, Value)>),
    #[error("setup and move properties are mutually exclusive")]
    SetupAndMove(Vec<(Property, Value)>),
    #[error("B and W properties set on the same node")]
    AmbiguousMove { black: Point, white: Point },
}

/// A classified validation failure.
///
/// `fatal` aborts validation of the whole tree. `fallback` is installed in
/// place of the undecodable value. `remove` drops the raw value instead of
/// keeping it as unknown.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind}")]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    pub fatal: bool,
    pub remove: bool,
    pub fallback: Option<Value>,
}

impl ValidationError {
    pub fn new(kind: ValidationErrorKind) -> Self {
        ValidationError {
            kind,
            fatal: false,
            remove: false,
            fallback: None,
        }
    }

    pub fn fatal(kind: ValidationErrorKind) -> Self {
        ValidationError {
            fatal: true,
            ..ValidationError::new(kind)
        }
    }

    pub fn removed(kind: ValidationErrorKind) -> Self {
        ValidationError {
            remove: true,
            ..ValidationError::new(kind)
        }
    }

    pub fn with_fallback(kind: ValidationErrorKind, fallback: Value) -> Self {
        ValidationError {
            fallback: Some(fallback),
            ..ValidationError::new(kind)
        }
    }

    /// Stable error code.
    pub fn code(&self) -> &'static str {
        match self.kind {
            ValidationErrorKind::Point(_) => "sgf:validator:point",
            ValidationErrorKind::Root(_) => "sgf:validator:root",
            ValidationErrorKind::Format(_) => "sgf:validator:format",
            ValidationErrorKind::GameType => "sgf:validator:gametype",
            ValidationErrorKind::BoardSize | ValidationErrorKind::BoardSizeRange(..) => {
                "sgf:validator:boardsize"
            }
            ValidationErrorKind::Value(_) => "sgf:validator:value",
            ValidationErrorKind::InfoRedefined(_)
            | ValidationErrorKind::SetupAndMove(_)
            | ValidationErrorKind::AmbiguousMove { .. } => "sgf:validator:conflict",
        }
    }
}

impl Serialize for ValidationError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("ValidationError", 3)?;
        s.serialize_field("code", self.code())?;
        s.serialize_field("message", &self.to_string())?;
        s.serialize_field("fatal", &self.fatal)?;
        s.end()
    }
}

/// A validation error tagged with the path of the node it was raised on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorRecord {
    pub error: ValidationError,
    pub path: Path,
}

/// Board replay failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("illegal move at {point} (node {path})")]
    IllegalMove { path: Path, point: Point },
    #[error("invalid path {0}")]
    InvalidPath(Path),
}

/// A refused navigator edit. The tree is left unchanged.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EditError {
    #[error("the root node cannot be cut")]
    Root,
    #[error("invalid path {0}")]
    InvalidPath(Path),
    #[error("cannot insert a tree without nodes")]
    EmptyTree,
    #[error("intersection {0} is not empty")]
    Occupied(Point),
    #[error("move at {0} leaves its group without liberties")]
    Suicide(Point),
    #[error("point {0} is outside the board")]
    OutOfBounds(Point),
    #[error("unknown property '{0}'")]
    UnknownProperty(String),
    #[error("invalid value for property '{0}'")]
    InvalidValue(Property),
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Crate-wide error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Edit(#[from] EditError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
