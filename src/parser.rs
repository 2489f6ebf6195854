//! SGF parser.
//!
//! Recursive descent over [`Tokenizer`] output. Each top-level game is
//! validated on its own: a fatal validation error replaces that game with an
//! error-only placeholder and parsing goes on with the next one. Syntax
//! errors abort the whole parse.

use log::{debug, warn};

use crate::codec::{Validator, tree_error};
use crate::error::SyntaxError;
use crate::tokenizer::{TokenKind, Tokenizer};
use crate::tree::{GameTree, Node};

#[derive(Debug, Default)]
pub struct Parser {
    validator: Validator,
}

impl Parser {
    pub fn new() -> Self {
        Parser::default()
    }

    /// Parse a collection of games.
    ///
    /// With `keep_raw`, unknown and rejected property values stay in each
    /// node's raw channel.
    pub fn parse(&mut self, data: &[u8], keep_raw: bool) -> Result<Vec<GameTree>, SyntaxError> {
        let mut tokens = Tokenizer::new(data);
        let mut collection = Vec::new();

        loop {
            let tok = tokens.next_token()?;
            match tok.kind {
                TokenKind::End => break,
                TokenKind::VariationStart => {}
                _ => return Err(tok.unexpected()),
            }

            let mut tree = variation(&mut tokens)?;
            match self.validator.validate_tree(&mut tree, keep_raw) {
                Ok(()) => {
                    debug!(
                        "game {}: {} nodes, {} errors",
                        collection.len(),
                        tree.node_count(),
                        tree.errors.len()
                    );
                    collection.push(tree);
                }
                Err(e) => {
                    warn!("game {} rejected: {e}", collection.len());
                    collection.push(GameTree::placeholder(vec![tree_error(e)]));
                }
            }
        }

        Ok(collection)
    }
}

/// Parse a collection with a fresh [`Parser`].
pub fn parse(data: impl AsRef<[u8]>, keep_raw: bool) -> Result<Vec<GameTree>, SyntaxError> {
    Parser::new().parse(data.as_ref(), keep_raw)
}

/// After `(`: nodes and nested variations up to the matching `)`.
fn variation(tokens: &mut Tokenizer<'_>) -> Result<GameTree, SyntaxError> {
    let mut tree = GameTree::default();
    loop {
        let tok = tokens.next_token()?;
        match tok.kind {
            TokenKind::VariationEnd => return Ok(tree),
            TokenKind::NodeStart => tree.add_node(node(tokens)?),
            TokenKind::VariationStart => tree.add_variation(variation(tokens)?),
            _ => return Err(tok.unexpected()),
        }
    }
}

/// After `;`: properties with their raw values.
fn node(tokens: &mut Tokenizer<'_>) -> Result<Node, SyntaxError> {
    let mut node = Node::new();
    let mut name = None;
    loop {
        let tok = tokens.next_token()?;
        match tok.kind {
            TokenKind::NodeEnd => return Ok(node),
            TokenKind::PropName => name = Some(String::from_utf8_lossy(tok.value).into_owned()),
            TokenKind::ValueStart => match &name {
                Some(name) => node.push_raw(name, value(tokens)?),
                None => return Err(tok.unexpected()),
            },
            _ => return Err(tok.unexpected()),
        }
    }
}

/// After `[`: the value and its closing `]`.
fn value<'a>(tokens: &mut Tokenizer<'a>) -> Result<&'a [u8], SyntaxError> {
    let tok = tokens.next_token()?;
    if tok.kind != TokenKind::Value {
        return Err(tok.unexpected());
    }
    let end = tokens.next_token()?;
    if end.kind != TokenKind::ValueEnd {
        return Err(end.unexpected());
    }
    Ok(tok.value)
}
