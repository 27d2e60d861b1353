//! Token-level plumbing shared by every construct parser.

use crate::error::ParseError;

/// Reserved words the grammar dispatches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Package,
    Syntax,
    Message,
    Enum,
    Option,
    Import,
    Extend,
    Service,
    Map,
    Repeated,
    Required,
    Optional,
    Oneof,
    Extensions,
    Reserved,
    Function,
    Rpc,
    Returns,
    Stream,
    To,
    Max,
}

impl Keyword {
    pub fn from_token(token: &str) -> Option<Keyword> {
        let kw = match token {
            "package" => Keyword::Package,
            "syntax" => Keyword::Syntax,
            "message" => Keyword::Message,
            "enum" => Keyword::Enum,
            "option" => Keyword::Option,
            "import" => Keyword::Import,
            "extend" => Keyword::Extend,
            "service" => Keyword::Service,
            "map" => Keyword::Map,
            "repeated" => Keyword::Repeated,
            "required" => Keyword::Required,
            "optional" => Keyword::Optional,
            "oneof" => Keyword::Oneof,
            "extensions" => Keyword::Extensions,
            "reserved" => Keyword::Reserved,
            "function" => Keyword::Function,
            "rpc" => Keyword::Rpc,
            "returns" => Keyword::Returns,
            "stream" => Keyword::Stream,
            "to" => Keyword::To,
            "max" => Keyword::Max,
            _ => return None,
        };
        Some(kw)
    }
}

/// Nesting limit used when none is configured.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Whether `token` is one of the single-character punctuation tokens.
pub fn is_punctuation(token: &str) -> bool {
    matches!(
        token,
        "{" | "}" | "(" | ")" | "<" | ">" | "[" | "]" | "," | ";" | "=" | ":"
    )
}

/// Whether `token` is a `//` comment token.
pub fn is_comment(token: &str) -> bool {
    token.starts_with("//")
}

/// Collect the run of comment tokens starting at `pos`.
///
/// Returns the comment bodies in source order and the position of the first
/// non-comment token. A body is the token minus its first three characters,
/// with `+` rewritten to a space.
pub fn collect_comments(tokens: &[String], pos: usize) -> (Vec<String>, usize) {
    let run = tokens[pos.min(tokens.len())..]
        .iter()
        .take_while(|t| is_comment(t));
    let comments: Vec<String> = run
        .map(|t| t.chars().skip(3).collect::<String>().replace('+', " "))
        .collect();
    let next = pos + comments.len();
    (comments, next)
}

fn opens_quote(token: &str) -> bool {
    let mut chars = token.chars();
    matches!(chars.next(), Some('"') | Some('\'')) && !chars.any(|c| c == '"' || c == '\'')
}

fn closes_quote(token: &str) -> bool {
    match token.char_indices().find(|&(_, c)| c == '"' || c == '\'') {
        Some((i, _)) => i + 1 == token.len(),
        None => false,
    }
}

/// Merge string literals the lexer split into several tokens.
///
/// A token that opens a quote without closing it is joined with every token
/// up to and including the next one that closes a quote. Without a closing
/// token the sequence is left as is, and the dangling literal surfaces later
/// as an unexpected token.
pub fn coalesce_strings(tokens: Vec<String>) -> Vec<String> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        let tok = &tokens[i];
        if opens_quote(tok) {
            let start = if tok.len() == 1 { i + 1 } else { i };
            if let Some(end) = (start..tokens.len()).find(|&j| closes_quote(&tokens[j])) {
                let literal = tokens[i..=end].concat();
                log::trace!("coalesced string literal {}", literal);
                out.push(literal);
                i = end + 1;
                continue;
            }
        }
        out.push(tok.clone());
        i += 1;
    }
    out
}

/// Read position over an immutable token slice.
///
/// Each construct parser borrows the cursor mutably while it runs and hands
/// it back positioned just past its terminator.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    tokens: &'a [String],
    pos: usize,
    /// Index of `tokens[0]` in the full stream.
    base: usize,
    depth: usize,
    max_depth: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(tokens: &'a [String]) -> Self {
        Cursor {
            tokens,
            pos: 0,
            base: 0,
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Step one nesting level down; fails past the configured limit.
    pub fn enter(&mut self) -> Result<(), ParseError> {
        if self.depth >= self.max_depth {
            return Err(ParseError::TooDeep {
                limit: self.max_depth,
            });
        }
        self.depth += 1;
        Ok(())
    }

    pub fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    pub fn peek(&self) -> Option<&'a str> {
        self.peek_nth(0)
    }

    /// Look `n` tokens past the current one.
    pub fn peek_nth(&self, n: usize) -> Option<&'a str> {
        self.tokens.get(self.pos + n).map(String::as_str)
    }

    pub fn peek_is(&self, expected: &str) -> bool {
        self.peek() == Some(expected)
    }

    pub fn peek_keyword(&self) -> Option<Keyword> {
        self.peek().and_then(Keyword::from_token)
    }

    pub fn advance(&mut self) -> Option<&'a str> {
        let tok = self.peek()?;
        self.pos += 1;
        Some(tok)
    }

    /// Consume the next token if it equals `expected`.
    pub fn eat(&mut self, expected: &str) -> bool {
        if self.peek_is(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Reject the token `n` places past the read position.
    pub fn unexpected_nth(&self, n: usize, context: &'static str) -> ParseError {
        let index = self.pos + n;
        let found = self.tokens.get(index).map_or("", String::as_str);
        ParseError::unexpected(found, context, self.base + index)
    }

    /// Reject the token consumed last.
    pub fn unexpected_last(&self, context: &'static str) -> ParseError {
        let index = self.pos.saturating_sub(1);
        let found = self.tokens.get(index).map_or("", String::as_str);
        ParseError::unexpected(found, context, self.base + index)
    }

    /// Input ran out before `expected`.
    pub fn unterminated(&self, expected: &'static str, context: &'static str) -> ParseError {
        ParseError::Unterminated {
            expected,
            context,
            token: self.base + self.tokens.len(),
        }
    }

    /// Consume any token; end of input is an unterminated `context`.
    pub fn next(&mut self, expected: &'static str, context: &'static str) -> Result<&'a str, ParseError> {
        match self.advance() {
            Some(tok) => Ok(tok),
            None => Err(self.unterminated(expected, context)),
        }
    }

    /// Consume a token that must equal `expected`.
    pub fn expect(&mut self, expected: &'static str, context: &'static str) -> Result<(), ParseError> {
        match self.advance() {
            Some(tok) if tok == expected => Ok(()),
            Some(_) => Err(self.unexpected_last(context)),
            None => Err(self.unterminated(expected, context)),
        }
    }

    /// Consume a name-like token: anything but punctuation or a comment.
    pub fn word(&mut self, expected: &'static str, context: &'static str) -> Result<&'a str, ParseError> {
        match self.advance() {
            Some(tok) if is_punctuation(tok) || is_comment(tok) => Err(self.unexpected_last(context)),
            Some(tok) => Ok(tok),
            None => Err(self.unterminated(expected, context)),
        }
    }

    /// Consume a comment run and return its bodies.
    pub fn take_comments(&mut self) -> Vec<String> {
        let (comments, next) = collect_comments(self.tokens, self.pos);
        if !comments.is_empty() {
            log::trace!("collected {} comment line(s)", comments.len());
        }
        self.pos = next;
        comments
    }

    /// Split off the tokens up to the `}` closing the block whose `{` was
    /// just consumed, and move past that `}`.
    pub fn take_block(&mut self, context: &'static str) -> Result<Cursor<'a>, ParseError> {
        let start = self.pos;
        let mut depth = 1usize;
        for (offset, tok) in self.tokens[start..].iter().enumerate() {
            match tok.as_str() {
                "{" => depth += 1,
                "}" => depth -= 1,
                _ => {}
            }
            if depth == 0 {
                let end = start + offset;
                self.pos = end + 1;
                return Ok(Cursor {
                    tokens: &self.tokens[start..end],
                    pos: 0,
                    base: self.base + start,
                    depth: self.depth,
                    max_depth: self.max_depth,
                });
            }
        }
        Err(self.unterminated("}", context))
    }
}
