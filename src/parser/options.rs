//! Option statements, bracketed field option lists and nested option maps.

use crate::error::ParseError;
use crate::types::{OptionMap, OptionValue};
use super::cursor::{is_punctuation, Cursor};

const OPTIMIZE_FOR: [&str; 3] = ["SPEED", "CODE_SIZE", "LITE_RUNTIME"];

/// Strip surrounding quote characters from a literal.
pub fn unquote(token: &str) -> &str {
    token.trim_matches(|c| c == '"' || c == '\'')
}

/// Decode a scalar option literal: `true`/`false` become booleans, anything
/// else is kept as a string without its quotes.
pub fn literal(token: &str) -> OptionValue {
    match token {
        "true" => OptionValue::Bool(true),
        "false" => OptionValue::Bool(false),
        _ => OptionValue::Str(unquote(token).to_string()),
    }
}

/// An option name: `name`, `(ext.name)` or `(ext).sub`.
fn option_name(cur: &mut Cursor, context: &'static str) -> Result<String, ParseError> {
    if !cur.eat("(") {
        return Ok(cur.word("option name", context)?.to_string());
    }
    let mut name = cur.word("option name", context)?.to_string();
    cur.expect(")", context)?;
    if let Some(suffix) = cur.peek().filter(|t| t.starts_with('.')) {
        cur.advance();
        name.push_str(suffix);
    }
    Ok(name)
}

/// The value after `=`: a literal, or `{` opening an option map.
fn option_value(cur: &mut Cursor, name: &str, context: &'static str) -> Result<OptionValue, ParseError> {
    let tok = cur.next("option value", context)?;
    let value = if tok == "{" {
        OptionValue::Map(parse_option_map(cur)?)
    } else {
        if is_punctuation(tok) {
            return Err(cur.unexpected_last(context));
        }
        literal(tok)
    };

    if name == "optimize_for" {
        let known = value.as_str().is_some_and(|v| OPTIMIZE_FOR.contains(&v));
        if !known {
            return Err(ParseError::InvalidOptimizeFor(tok.to_string()));
        }
    }
    Ok(value)
}

/// Parse `option name = value;` and return the binding.
pub fn parse_option(cur: &mut Cursor) -> Result<(String, OptionValue), ParseError> {
    cur.expect("option", "option")?;
    let name = option_name(cur, "option")?;
    cur.expect("=", "option")?;
    let value = option_value(cur, &name, "option")?;
    cur.expect(";", "option")?;
    Ok((name, value))
}

/// Parse an `option` statement and bind it into `scope`.
pub fn parse_option_into(cur: &mut Cursor, scope: &mut OptionMap) -> Result<(), ParseError> {
    let (name, value) = parse_option(cur)?;
    scope.bind(name, value)
}

/// Parse the body of an option map; the opening `{` is already consumed.
///
/// `key: value` binds a key once. `key { ... }` appends a block to the list
/// under `key`, so the same key may repeat in that form only.
pub fn parse_option_map(cur: &mut Cursor) -> Result<OptionMap, ParseError> {
    const CONTEXT: &str = "option map";

    cur.enter()?;
    let mut map = OptionMap::new();
    loop {
        cur.take_comments();
        let tok = cur.next("}", CONTEXT)?;
        let key = match tok {
            "}" => break,
            "," | ";" => continue,
            "(" => {
                let key = cur.word("option map key", CONTEXT)?;
                cur.expect(")", CONTEXT)?;
                key
            }
            _ if is_punctuation(tok) => return Err(cur.unexpected_last(CONTEXT)),
            _ => tok,
        };

        cur.take_comments();
        match cur.next("option map value", CONTEXT)? {
            ":" => {
                if map.contains_key(key) {
                    return Err(ParseError::duplicate("option map key", key));
                }
                cur.take_comments();
                let value = match cur.next("option map value", CONTEXT)? {
                    "{" => OptionValue::Map(parse_option_map(cur)?),
                    v if is_punctuation(v) => return Err(cur.unexpected_last(CONTEXT)),
                    v => literal(v),
                };
                map.bind(key.to_string(), value)?;
            }
            "{" => {
                let block = parse_option_map(cur)?;
                map.push_block(key.to_string(), block)?;
            }
            _ => return Err(cur.unexpected_last(CONTEXT)),
        }
    }
    cur.leave();
    Ok(map)
}

/// Parse a bracketed `[name = value, (ext) = value]` list.
pub fn parse_field_options(cur: &mut Cursor) -> Result<OptionMap, ParseError> {
    const CONTEXT: &str = "field options";

    cur.expect("[", CONTEXT)?;
    let mut opts = OptionMap::new();
    loop {
        cur.take_comments();
        let name = option_name(cur, CONTEXT)?;
        cur.expect("=", CONTEXT)?;
        let value = option_value(cur, &name, CONTEXT)?;
        opts.bind(name, value)?;
        cur.take_comments();
        match cur.next("]", CONTEXT)? {
            "," => continue,
            "]" => return Ok(opts),
            _ => return Err(cur.unexpected_last(CONTEXT)),
        }
    }
}
