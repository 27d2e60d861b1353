use crate::error::ParseError;

const PUNCTUATION: &[u8] = b"{}()<>[],;=:";

/// Tokenizer for `.proto` source text.
///
/// Produces the flat token strings the grammar consumes: punctuation,
/// words (keywords, identifiers, numbers), whole quoted strings, and `//`
/// comments kept as `// body` tokens. Block comments are dropped.
pub struct Lexer<'a> {
    src: &'a str,
    input: &'a [u8],
    pos: usize,
    line: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer {
            src: input,
            input: input.as_bytes(),
            pos: 0,
            line: 1,
        }
    }

    pub fn current_line(&self) -> usize {
        self.line
    }

    fn peek_byte(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn peek_byte_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let b = self.peek_byte()?;
        self.pos += 1;
        if b == b'\n' {
            self.line += 1;
        }
        Some(b)
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::Lex {
            line: self.line,
            message: message.into(),
        }
    }

    fn skip_whitespace_and_block_comments(&mut self) -> Result<(), ParseError> {
        loop {
            match self.peek_byte() {
                Some(b) if b.is_ascii_whitespace() => {
                    self.advance();
                }
                Some(b'/') if self.peek_byte_at(1) == Some(b'*') => {
                    let start_line = self.line;
                    self.pos += 2;
                    loop {
                        match self.advance() {
                            Some(b'*') if self.peek_byte() == Some(b'/') => {
                                self.advance();
                                break;
                            }
                            Some(_) => {}
                            None => {
                                return Err(ParseError::Lex {
                                    line: start_line,
                                    message: "unterminated block comment".into(),
                                })
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn read_line_comment(&mut self) -> String {
        let start = self.pos + 2;
        while let Some(b) = self.peek_byte() {
            if b == b'\n' {
                break;
            }
            self.advance();
        }
        let body = self.src[start..self.pos].trim();
        format!("// {}", body)
    }

    fn read_string(&mut self, quote: u8) -> Result<String, ParseError> {
        let start = self.pos;
        self.advance();
        loop {
            match self.peek_byte() {
                Some(b'\n') | None => return Err(self.error("unterminated string literal")),
                Some(b'\\') => {
                    self.advance();
                    self.advance();
                }
                Some(b) => {
                    self.advance();
                    if b == quote {
                        break;
                    }
                }
            }
        }
        Ok(self.src[start..self.pos].to_string())
    }

    fn read_word(&mut self) -> String {
        let start = self.pos;
        while let Some(b) = self.peek_byte() {
            let ends_word = b.is_ascii_whitespace()
                || PUNCTUATION.contains(&b)
                || b == b'"'
                || b == b'\''
                || (b == b'/' && matches!(self.peek_byte_at(1), Some(b'/') | Some(b'*')));
            if ends_word {
                break;
            }
            self.advance();
        }
        self.src[start..self.pos].to_string()
    }

    /// Read the next token, or `None` at end of input.
    pub fn next_token(&mut self) -> Result<Option<String>, ParseError> {
        self.skip_whitespace_and_block_comments()?;

        let token = match self.peek_byte() {
            None => return Ok(None),
            Some(b'/') if self.peek_byte_at(1) == Some(b'/') => self.read_line_comment(),
            Some(q @ (b'"' | b'\'')) => self.read_string(q)?,
            Some(b) if PUNCTUATION.contains(&b) => {
                self.advance();
                (b as char).to_string()
            }
            Some(_) => self.read_word(),
        };
        Ok(Some(token))
    }
}

/// Split `.proto` source into the token sequence the grammar consumes.
pub fn tokenize(input: &str) -> Result<Vec<String>, ParseError> {
    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();
    while let Some(tok) = lexer.next_token()? {
        tokens.push(tok);
    }
    log::trace!("lexed {} tokens over {} lines", tokens.len(), lexer.current_line());
    Ok(tokens)
}
