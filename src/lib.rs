//! gosgf: SGF game records for the game of Go.
//!
//! Parses SGF text into validated game trees, navigates and edits them, and
//! replays any node onto a board with capture resolution.
//!
//! ## Modules
//!
//! - [`tokenizer`] - Lexical state machine over the raw bytes
//! - [`parser`] - Recursive descent into game trees, per-game validation
//! - [`codec`] - Property decoding, validation and SGF encoding
//! - [`tree`] - Nodes, game trees and walks
//! - [`path`] - Node addresses
//! - [`nav`] - Cursor movement and tree edits
//! - [`board`] - Position replay and captures
//! - [`collection`] - A whole SGF document
//!
//! ## Example
//!
//! ```
//! use gosgf::collection::Collection;
//! use gosgf::value::{Color, Point};
//!
//! let mut games = Collection::new();
//! games.add_sgf("(;GM[1]SZ[9];B[ee];W[ce])").unwrap();
//!
//! let mut nav = games.nav(0).unwrap();
//! nav.last();
//! let board = nav.board().unwrap();
//! assert_eq!(board.color(Point::new(4, 4)), Some(Color::Black));
//! assert_eq!(board.next_player(), Color::Black);
//! ```

pub mod board;
pub mod codec;
pub mod collection;
pub mod constants;
pub mod error;
pub mod nav;
pub mod parser;
pub mod path;
pub mod property;
pub mod tokenizer;
pub mod tree;
pub mod value;

pub use collection::Collection;
pub use error::{Error, Result};
pub use nav::Navigator;
pub use parser::parse;
pub use tree::{GameTree, Node};
