pub mod lexer;
pub mod cursor;
pub mod grammar;
pub mod options;
pub mod service;
pub mod linker;

use crate::error::ParseError;
use crate::types::{Schema, Syntax};
use cursor::{coalesce_strings, Cursor, DEFAULT_MAX_DEPTH};

/// Parser configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Syntax assumed when the file has no `syntax` statement.
    pub default_syntax: Syntax,
    /// Maximum nesting of messages and option maps.
    pub max_depth: usize,
    /// Merge `extend` fields into their target messages after parsing.
    pub link_extensions: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            default_syntax: Syntax::Proto3,
            max_depth: DEFAULT_MAX_DEPTH,
            link_extensions: true,
        }
    }
}

/// Parse `.proto` source text into a `Schema`.
///
/// This is the main entry point for the parser module.
pub fn parse(source: &str) -> Result<Schema, ParseError> {
    parse_with(source, &ParseOptions::default())
}

/// Parse `.proto` source text with explicit options.
pub fn parse_with(source: &str, options: &ParseOptions) -> Result<Schema, ParseError> {
    let tokens = lexer::tokenize(source)?;
    parse_tokens(tokens, options)
}

/// Parse an already tokenized source.
///
/// Tokens follow the lexer's conventions: punctuation split out, string
/// literals quoted, and comments kept as tokens starting with `//`.
pub fn parse_tokens<I, S>(tokens: I, options: &ParseOptions) -> Result<Schema, ParseError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let tokens = coalesce_strings(tokens.into_iter().map(Into::into).collect());
    let mut cur = Cursor::new(&tokens).with_max_depth(options.max_depth);
    let mut schema = grammar::parse_schema(&mut cur, options.default_syntax)?;
    if options.link_extensions {
        linker::link_extensions(&mut schema)?;
    }
    log::debug!(
        "parsed schema: {} message(s), {} enum(s), {} service(s)",
        schema.messages.len(),
        schema.enums.len(),
        schema.services.len()
    );
    Ok(schema)
}
