/// Errors from the protobuf schema parser.
///
/// Every variant is fatal: the first violation aborts the parse and no
/// partial tree is returned.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("syntax error at line {line}: {message}")]
    Lex { line: usize, message: String },

    /// `token` is the index of the offending token in the token stream.
    #[error("unexpected token '{found}' in {context} at token {token}")]
    UnexpectedToken {
        found: String,
        context: &'static str,
        token: usize,
    },

    /// `token` is the index where input ran out: the end of the stream or
    /// the `}` closing the enclosing block.
    #[error("no closing {expected} for {context} at token {token}")]
    Unterminated {
        expected: &'static str,
        context: &'static str,
        token: usize,
    },

    #[error("missing {what} in {context}")]
    Missing {
        what: &'static str,
        context: String,
    },

    #[error("duplicate {kind} '{name}'")]
    Duplicate { kind: &'static str, name: String },

    #[error("invalid number '{literal}' in {context}")]
    InvalidNumber {
        literal: String,
        context: &'static str,
    },

    #[error("expected protobuf syntax version but found {0}")]
    InvalidSyntaxVersion(String),

    #[error("protobuf syntax version should be first thing in file")]
    SyntaxNotFirst,

    #[error("{message} does not declare {tag} as an extension number")]
    ExtensionOutOfRange { message: String, tag: u32 },

    #[error("unexpected value for option optimize_for: {0}")]
    InvalidOptimizeFor(String),

    #[error("declarations nested deeper than {limit} levels")]
    TooDeep { limit: usize },
}

impl ParseError {
    pub(crate) fn unexpected(found: &str, context: &'static str, token: usize) -> Self {
        ParseError::UnexpectedToken {
            found: found.to_string(),
            context,
            token,
        }
    }

    pub(crate) fn duplicate(kind: &'static str, name: &str) -> Self {
        ParseError::Duplicate {
            kind,
            name: name.to_string(),
        }
    }
}

/// Result type alias for parser operations.
pub type Result<T> = std::result::Result<T, ParseError>;
