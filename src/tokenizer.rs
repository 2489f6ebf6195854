//! SGF tokenizer.
//!
//! A single-pass finite-state machine over the input bytes. Whitespace is
//! skipped everywhere except inside property names and values; inside a
//! value, a backslash takes the following byte verbatim so `\]` never ends
//! the value early. Values borrow the input, still escaped: unescaping is the
//! codec's job since it depends on the property type and charset.

use crate::error::SyntaxError;

/// Token kinds.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TokenKind {
    VariationStart,
    VariationEnd,
    NodeStart,
    /// Synthetic: the current node has no more properties.
    NodeEnd,
    PropName,
    ValueStart,
    Value,
    ValueEnd,
    End,
}

impl TokenKind {
    pub fn name(self) -> &'static str {
        match self {
            TokenKind::VariationStart => "variation-start",
            TokenKind::VariationEnd => "variation-end",
            TokenKind::NodeStart => "node-start",
            TokenKind::NodeEnd => "node-end",
            TokenKind::PropName => "property-name",
            TokenKind::ValueStart => "value-start",
            TokenKind::Value => "value",
            TokenKind::ValueEnd => "value-end",
            TokenKind::End => "end",
        }
    }
}

/// A token with its position.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    /// Payload of `PropName` and `Value` tokens.
    pub value: &'a [u8],
    /// Byte offset of the token start.
    pub index: usize,
    /// 1-based line.
    pub line: usize,
    /// 1-based column.
    pub column: usize,
}

impl Token<'_> {
    /// Error describing this token as unexpected.
    pub fn unexpected(&self) -> SyntaxError {
        let found = match self.kind {
            TokenKind::End => "end of input".to_string(),
            _ if !self.value.is_empty() => String::from_utf8_lossy(self.value).into_owned(),
            TokenKind::VariationStart => "(".to_string(),
            TokenKind::VariationEnd => ")".to_string(),
            TokenKind::NodeStart => ";".to_string(),
            TokenKind::ValueStart => "[".to_string(),
            TokenKind::ValueEnd => "]".to_string(),
            _ => String::new(),
        };
        SyntaxError {
            index: self.index,
            line: self.line,
            column: self.column,
            found,
            token: self.kind.name(),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum State {
    Start,
    Variation,
    Variations,
    Node,
    NodeEnd,
    PropName,
    Prop,
    Value,
    ValueEnd,
    Values,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Class {
    VariationStart,
    VariationEnd,
    NodeStart,
    ValueStart,
    ValueEnd,
    Escape,
    Space,
    PropChar,
    Other,
}

fn classify(c: u8) -> Class {
    match c {
        b'(' => Class::VariationStart,
        b')' => Class::VariationEnd,
        b';' => Class::NodeStart,
        b'[' => Class::ValueStart,
        b']' => Class::ValueEnd,
        b'\\' => Class::Escape,
        b' ' | b'\t' | b'\r' | b'\n' | 0x0b => Class::Space,
        b'A'..=b'Z' => Class::PropChar,
        _ => Class::Other,
    }
}

/// Restartable tokenizer over a byte slice.
pub struct Tokenizer<'a> {
    input: &'a [u8],
    pos: usize,
    line: usize,
    /// Column of the last consumed byte, 0 right after a line break.
    column: usize,
    /// Last line-break byte, to count `\r\n` and `\n\r` once.
    line_break: Option<u8>,
    state: State,
    depth: usize,
    /// Set once the iterator has yielded an error.
    failed: bool,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Tokenizer {
            input,
            pos: 0,
            line: 1,
            column: 0,
            line_break: None,
            state: State::Start,
            depth: 0,
            failed: false,
        }
    }

    /// Restart on new input.
    pub fn reset(&mut self, input: &'a [u8]) {
        *self = Tokenizer::new(input);
    }

    /// Current variation nesting depth.
    pub fn depth(&self) -> usize {
        self.depth
    }

    fn bump(&mut self) -> Option<u8> {
        let c = *self.input.get(self.pos)?;
        self.pos += 1;
        self.column += 1;
        if c == b'\r' || c == b'\n' {
            match self.line_break {
                Some(prev) if prev != c => {
                    self.column = 0;
                    self.line_break = None;
                }
                _ => {
                    self.line += 1;
                    self.column = 0;
                    self.line_break = Some(c);
                }
            }
        } else {
            self.line_break = None;
        }
        Some(c)
    }

    /// Give back the last byte. Never called on a line break.
    fn unbump(&mut self) {
        self.pos -= 1;
        self.column -= 1;
    }

    fn close_variation(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        self.state = if self.depth > 0 {
            State::Variations
        } else {
            State::Start
        };
    }

    /// Read the next token.
    pub fn next_token(&mut self) -> Result<Token<'a>, SyntaxError> {
        let mut start = self.pos;
        let mut start_line = self.line;
        let mut start_column = self.column + 1;
        let mut len = 0;
        let mut escaped = false;

        let kind = loop {
            let state = self.state;
            let Some(c) = self.bump() else {
                break TokenKind::End;
            };

            if escaped {
                escaped = false;
                len += 1;
                continue;
            }

            let class = classify(c);
            if class == Class::Space && state != State::Value && state != State::PropName {
                start = self.pos;
                start_line = self.line;
                start_column = self.column + 1;
                continue;
            }

            let kind = match (state, class) {
                (State::Start | State::Variations, Class::VariationStart) => {
                    self.depth += 1;
                    self.state = State::Variation;
                    Some(TokenKind::VariationStart)
                }
                (State::Variations, Class::VariationEnd) => {
                    self.close_variation();
                    Some(TokenKind::VariationEnd)
                }
                (State::Variation, Class::NodeStart) => {
                    self.state = State::Node;
                    Some(TokenKind::NodeStart)
                }
                (State::Node | State::Values, Class::PropChar) => {
                    self.state = State::PropName;
                    len += 1;
                    None
                }
                (
                    State::Node | State::Values,
                    Class::NodeStart | Class::VariationStart | Class::VariationEnd,
                ) => {
                    self.unbump();
                    self.state = State::NodeEnd;
                    Some(TokenKind::NodeEnd)
                }
                (State::NodeEnd, Class::NodeStart) => {
                    self.state = State::Node;
                    Some(TokenKind::NodeStart)
                }
                (State::NodeEnd, Class::VariationStart) => {
                    self.depth += 1;
                    self.state = State::Variation;
                    Some(TokenKind::VariationStart)
                }
                (State::NodeEnd, Class::VariationEnd) => {
                    self.close_variation();
                    Some(TokenKind::VariationEnd)
                }
                (State::PropName, Class::PropChar) => {
                    len += 1;
                    None
                }
                (State::PropName, Class::ValueStart) => {
                    self.unbump();
                    self.state = State::Prop;
                    Some(TokenKind::PropName)
                }
                (State::PropName, Class::Space) => {
                    self.state = State::Prop;
                    Some(TokenKind::PropName)
                }
                (State::Prop | State::Values, Class::ValueStart) => {
                    self.state = State::Value;
                    Some(TokenKind::ValueStart)
                }
                (State::Value, Class::ValueEnd) => {
                    self.unbump();
                    self.state = State::ValueEnd;
                    Some(TokenKind::Value)
                }
                (State::Value, Class::Escape) => {
                    escaped = true;
                    len += 1;
                    None
                }
                (State::Value, _) => {
                    len += 1;
                    None
                }
                (State::ValueEnd, Class::ValueEnd) => {
                    self.state = State::Values;
                    Some(TokenKind::ValueEnd)
                }
                _ => {
                    return Err(SyntaxError {
                        index: self.pos - 1,
                        line: self.line,
                        column: self.column,
                        found: String::from_utf8_lossy(&[c]).into_owned(),
                        token: state_name(state),
                    });
                }
            };

            if let Some(kind) = kind {
                break kind;
            }
        };

        Ok(Token {
            kind,
            value: &self.input[start..start + len],
            index: start,
            line: start_line,
            column: start_column,
        })
    }
}

fn state_name(state: State) -> &'static str {
    match state {
        State::Start => "expecting variation-start",
        State::Variation => "expecting node-start",
        State::Variations => "expecting variation",
        State::Node => "expecting property-name",
        State::NodeEnd => "expecting node-end",
        State::PropName => "reading property-name",
        State::Prop => "expecting value-start",
        State::Value => "reading value",
        State::ValueEnd => "expecting value-end",
        State::Values => "expecting value or property",
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Result<Token<'a>, SyntaxError>;

    /// Yields tokens until (and excluding) `End`, or up to a single error.
    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.next_token() {
            Ok(tok) if tok.kind == TokenKind::End => None,
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
            other => Some(other),
        }
    }
}

impl std::iter::FusedIterator for Tokenizer<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        Tokenizer::new(input.as_bytes())
            .map(|t| t.unwrap().kind)
            .collect()
    }

    #[test]
    fn test_token_sequence() {
        use TokenKind::*;
        assert_eq!(
            kinds("(;FF[4]C[hi](;B[aa]))"),
            vec![
                VariationStart,
                NodeStart,
                PropName,
                ValueStart,
                Value,
                ValueEnd,
                PropName,
                ValueStart,
                Value,
                ValueEnd,
                NodeEnd,
                VariationStart,
                NodeStart,
                PropName,
                ValueStart,
                Value,
                ValueEnd,
                NodeEnd,
                VariationEnd,
                VariationEnd,
            ]
        );
    }

    #[test]
    fn test_escapes_stay_in_value() {
        let mut tok = Tokenizer::new(br"(;C[a\]b\\]AB[aa][bb])");
        let values: Vec<&[u8]> = std::iter::from_fn(|| tok.next())
            .map(|t| t.unwrap())
            .filter(|t| t.kind == TokenKind::Value)
            .map(|t| t.value)
            .collect();
        assert_eq!(values, vec![&br"a\]b\\"[..], b"aa", b"bb"]);
    }

    #[test]
    fn test_whitespace_and_delimiters_inside_values() {
        let mut tok = Tokenizer::new(b"( ;\n C [ a(b);c\n]\n)");
        let values: Vec<Vec<u8>> = std::iter::from_fn(|| tok.next())
            .map(|t| t.unwrap())
            .filter(|t| t.kind == TokenKind::Value)
            .map(|t| t.value.to_vec())
            .collect();
        assert_eq!(values, vec![b" a(b);c\n".to_vec()]);
    }

    #[test]
    fn test_reconstructs_input() {
        let input = "(;GM[1]C[x\\]y](;B[aa];W[bb])(;B[cc]))";
        let mut out = String::new();
        for tok in Tokenizer::new(input.as_bytes()) {
            let tok = tok.unwrap();
            match tok.kind {
                TokenKind::VariationStart => out.push('('),
                TokenKind::VariationEnd => out.push(')'),
                TokenKind::NodeStart => out.push(';'),
                TokenKind::ValueStart => out.push('['),
                TokenKind::ValueEnd => out.push(']'),
                TokenKind::PropName | TokenKind::Value => {
                    out.push_str(std::str::from_utf8(tok.value).unwrap())
                }
                TokenKind::NodeEnd | TokenKind::End => {}
            }
        }
        assert_eq!(out, input);
    }

    #[test]
    fn test_iterator_stops_after_error() {
        let items: Vec<_> = Tokenizer::new(b"(;B[aa]x;W[bb])").collect();
        let errors = items.iter().filter(|t| t.is_err()).count();
        assert_eq!(errors, 1);
        assert!(items.last().is_some_and(|t| t.is_err()));
    }

    #[test]
    fn test_error_position() {
        let mut tok = Tokenizer::new(b"(;FF[4]\r\n;B)");
        let err = std::iter::from_fn(|| tok.next())
            .find_map(|t| t.err())
            .unwrap();
        assert_eq!(err.line, 2);
        assert_eq!(err.column, 3);
        assert_eq!(err.index, 11);
        assert_eq!(err.found, ")");
    }

    #[test]
    fn test_lf_cr_counts_once() {
        let mut tok = Tokenizer::new(b"(;\n\r\n\r?");
        let err = std::iter::from_fn(|| tok.next())
            .find_map(|t| t.err())
            .unwrap();
        assert_eq!(err.line, 3);
        assert_eq!(err.column, 1);
    }

    #[test]
    fn test_lowercase_outside_value_is_error() {
        let mut tok = Tokenizer::new(b"(;b[aa])");
        let err = std::iter::from_fn(|| tok.next())
            .find_map(|t| t.err())
            .unwrap();
        assert_eq!(err.found, "b");
        assert_eq!(err.column, 3);
    }

    #[test]
    fn test_reset() {
        let mut tok = Tokenizer::new(b"(;)");
        while tok.next().is_some() {}
        tok.reset(b"(;C[x])");
        assert_eq!(tok.next_token().unwrap().kind, TokenKind::VariationStart);
        assert_eq!(tok.depth(), 1);
    }
}
