use crate::error::ParseError;
use crate::types::*;
use super::cursor::{Cursor, Keyword};
use super::options::{parse_field_options, parse_option_into, unquote};
use super::service::parse_service;

/// Parse a whole token stream into a schema (extensions not yet linked).
pub fn parse_schema(cur: &mut Cursor, default_syntax: Syntax) -> Result<Schema, ParseError> {
    let mut schema = Schema {
        syntax: default_syntax,
        ..Default::default()
    };
    let mut first_statement = true;

    loop {
        let comments = cur.take_comments();
        let Some(tok) = cur.peek() else {
            break;
        };
        if tok == ";" {
            cur.advance();
            continue;
        }
        if first_statement {
            schema.comments = comments.clone();
        }

        let Some(keyword) = cur.peek_keyword() else {
            return Err(cur.unexpected_nth(0, "file"));
        };
        match keyword {
            Keyword::Package => {
                schema.package = Some(parse_package(cur)?);
            }
            Keyword::Syntax => {
                if !first_statement {
                    return Err(ParseError::SyntaxNotFirst);
                }
                schema.syntax = parse_syntax(cur)?;
            }
            Keyword::Message => {
                let mut message = parse_message(cur)?;
                message.comments = comments;
                log::debug!("parsed message {}", message.name);
                schema.messages.push(message);
            }
            Keyword::Enum => {
                let mut def = parse_enum(cur)?;
                def.comments = comments;
                log::debug!("parsed enum {}", def.name);
                schema.enums.push(def);
            }
            Keyword::Option => parse_option_into(cur, &mut schema.options)?,
            Keyword::Import => schema.imports.push(parse_import(cur)?),
            Keyword::Extend => {
                let extend = parse_extend(cur)?;
                log::debug!("parsed extend {}", extend.name);
                schema.extends.push(extend);
            }
            Keyword::Service => {
                let mut service = parse_service(cur)?;
                service.comments = comments;
                log::debug!("parsed service {}", service.name);
                schema.services.push(service);
            }
            Keyword::Map
            | Keyword::Repeated
            | Keyword::Required
            | Keyword::Optional
            | Keyword::Oneof
            | Keyword::Extensions
            | Keyword::Reserved
            | Keyword::Function
            | Keyword::Rpc
            | Keyword::Returns
            | Keyword::Stream
            | Keyword::To
            | Keyword::Max => return Err(cur.unexpected_nth(0, "file")),
        }
        first_statement = false;
    }

    Ok(schema)
}

fn parse_package(cur: &mut Cursor) -> Result<String, ParseError> {
    cur.expect("package", "package")?;
    let name = cur.word("package name", "package")?;
    cur.expect(";", "package")?;
    Ok(name.to_string())
}

fn parse_syntax(cur: &mut Cursor) -> Result<Syntax, ParseError> {
    cur.expect("syntax", "syntax")?;
    cur.expect("=", "syntax")?;
    let version = cur.next("syntax version", "syntax")?;
    let quoted = version.starts_with('"') || version.starts_with('\'');
    let syntax = match unquote(version) {
        "proto2" if quoted => Syntax::Proto2,
        "proto3" if quoted => Syntax::Proto3,
        _ => return Err(ParseError::InvalidSyntaxVersion(version.to_string())),
    };
    cur.expect(";", "syntax")?;
    Ok(syntax)
}

fn parse_import(cur: &mut Cursor) -> Result<Import, ParseError> {
    cur.expect("import", "import")?;
    let modifier = match cur.peek() {
        Some("public") => Some(ImportModifier::Public),
        Some("weak") => Some(ImportModifier::Weak),
        _ => None,
    };
    if modifier.is_some() {
        cur.advance();
    }
    let path = unquote(cur.word("import path", "import")?);
    cur.expect(";", "import")?;
    Ok(Import {
        module: module_name(path),
        modifier,
    })
}

/// `dir/file.proto` -> `dir/file`.
fn module_name(path: &str) -> String {
    let (dir, file) = match path.rfind('/') {
        Some(i) => path.split_at(i + 1),
        None => ("", path),
    };
    let stem = file.split('.').next().unwrap_or(file);
    format!("{}{}", dir, stem)
}

pub fn parse_message(cur: &mut Cursor) -> Result<Message, ParseError> {
    cur.expect("message", "message")?;
    let name = cur.word("message name", "message")?;
    parse_message_block(cur, name)
}

fn parse_extend(cur: &mut Cursor) -> Result<Extend, ParseError> {
    cur.expect("extend", "extend")?;
    let name = cur.word("extend target", "extend")?;
    let message = parse_message_block(cur, name)?;
    Ok(Extend {
        name: name.to_string(),
        message,
    })
}

/// Isolate the `{ ... }` span by brace depth, then parse it as a body.
fn parse_message_block(cur: &mut Cursor, name: &str) -> Result<Message, ParseError> {
    cur.expect("{", "message")?;
    let mut body = cur.take_block("message")?;
    body.enter()?;

    let mut message = Message::new(name);
    parse_message_body(&mut body, &mut message)?;
    Ok(message)
}

fn parse_message_body(body: &mut Cursor, message: &mut Message) -> Result<(), ParseError> {
    loop {
        let comments = body.take_comments();
        let Some(tok) = body.peek() else {
            return Ok(());
        };
        if tok == ";" {
            body.advance();
            continue;
        }

        match body.peek_keyword() {
            Some(Keyword::Map | Keyword::Repeated | Keyword::Optional | Keyword::Required) => {
                message.fields.push(parse_field(body, comments)?);
            }
            Some(Keyword::Enum) => {
                let mut def = parse_enum(body)?;
                def.comments = comments;
                message.enums.push(def);
            }
            Some(Keyword::Message) => {
                let mut nested = parse_message(body)?;
                nested.comments = comments;
                message.messages.push(nested);
            }
            Some(Keyword::Extensions) => message.extensions.extend(parse_extensions(body)?),
            Some(Keyword::Reserved) => {
                message
                    .reserved
                    .extend(parse_reserved(body, i64::from(MAX_FIELD_NUMBER))?);
            }
            Some(Keyword::Oneof) => parse_oneof(body, &mut message.fields)?,
            Some(Keyword::Extend) => message.extends.push(parse_extend(body)?),
            Some(Keyword::Option) => parse_option_into(body, &mut message.options)?,
            // proto3 drops the field rule: anything else starts an implicitly optional field.
            Some(
                Keyword::Package
                | Keyword::Syntax
                | Keyword::Import
                | Keyword::Service
                | Keyword::Function
                | Keyword::Rpc
                | Keyword::Returns
                | Keyword::Stream
                | Keyword::To
                | Keyword::Max,
            )
            | None => message.fields.push(parse_field(body, comments)?),
        }
    }
}

/// Parse `map<K, V>`, the `map` keyword already consumed.
pub(super) fn parse_map_type(cur: &mut Cursor) -> Result<MapType, ParseError> {
    cur.expect("<", "map type")?;
    let key = cur.word("map key type", "map type")?;
    cur.expect(",", "map type")?;
    let value = cur.word("map value type", "map type")?;
    cur.expect(">", "map type")?;
    Ok(MapType {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// A type or name slot of a field; a bare `;` here means it was left out.
fn field_part<'a>(
    cur: &mut Cursor<'a>,
    what: &'static str,
    context: impl FnOnce() -> String,
) -> Result<&'a str, ParseError> {
    if cur.peek_is(";") {
        return Err(ParseError::Missing {
            what,
            context: context(),
        });
    }
    cur.word(what, "message field")
}

fn parse_field(cur: &mut Cursor, mut comments: Vec<String>) -> Result<Field, ParseError> {
    const CONTEXT: &str = "message field";

    let (field_type, rule) = match cur.peek_keyword() {
        Some(Keyword::Map) => {
            cur.advance();
            (FieldType::Map(parse_map_type(cur)?), None)
        }
        Some(rule @ (Keyword::Repeated | Keyword::Required | Keyword::Optional)) => {
            cur.advance();
            comments.extend(cur.take_comments());
            let ty = field_part(cur, "field type", || "message field".to_string())?;
            (FieldType::from_name(ty), Some(rule))
        }
        _ => {
            let ty = field_part(cur, "field type", || "message field".to_string())?;
            (FieldType::from_name(ty), None)
        }
    };
    let name = field_part(cur, "field name", || {
        format!("field of type {}", field_type.name())
    })?;

    cur.expect("=", CONTEXT)?;
    let tag: u32 = number(cur.next("field number", CONTEXT)?, "field number")?;
    let options = if cur.peek_is("[") {
        parse_field_options(cur)?
    } else {
        OptionMap::new()
    };
    cur.expect(";", CONTEXT)?;

    Ok(Field {
        name: name.to_string(),
        field_type,
        tag,
        required: rule == Some(Keyword::Required),
        repeated: rule == Some(Keyword::Repeated),
        oneof: None,
        options,
        comments,
    })
}

/// Parse a `oneof name { ... }` group, appending its members to `fields`.
fn parse_oneof(cur: &mut Cursor, fields: &mut Vec<Field>) -> Result<(), ParseError> {
    cur.expect("oneof", "oneof")?;
    let name = cur.word("oneof name", "oneof")?;
    cur.expect("{", "oneof")?;

    loop {
        let comments = cur.take_comments();
        let tok = cur.peek().ok_or_else(|| cur.unterminated("}", "oneof"))?;
        match tok {
            "}" => {
                cur.advance();
                return Ok(());
            }
            ";" => {
                cur.advance();
            }
            _ => match Keyword::from_token(tok) {
                Some(Keyword::Repeated | Keyword::Required | Keyword::Map | Keyword::Option) => {
                    return Err(cur.unexpected_nth(0, "oneof"));
                }
                _ => {
                    let mut field = parse_field(cur, comments)?;
                    field.oneof = Some(name.to_string());
                    fields.push(field);
                }
            },
        }
    }
}

fn parse_extensions(cur: &mut Cursor) -> Result<Vec<ExtensionRange>, ParseError> {
    const CONTEXT: &str = "extensions";

    cur.expect("extensions", CONTEXT)?;
    let mut ranges = Vec::new();
    loop {
        let from: u32 = number(cur.next("extension range", CONTEXT)?, CONTEXT)?;
        let to = if cur.eat("to") {
            match cur.next("extension range end", CONTEXT)? {
                "max" => MAX_FIELD_NUMBER,
                end => number(end, CONTEXT)?,
            }
        } else {
            from
        };
        ranges.push(ExtensionRange { from, to });

        match cur.next(";", CONTEXT)? {
            "," => continue,
            ";" => return Ok(ranges),
            _ => return Err(cur.unexpected_last(CONTEXT)),
        }
    }
}

fn parse_reserved(cur: &mut Cursor, max: i64) -> Result<Vec<Reserved>, ParseError> {
    const CONTEXT: &str = "reserved";

    cur.expect("reserved", CONTEXT)?;
    let mut reserved = Vec::new();
    loop {
        let tok = cur.next("reserved entry", CONTEXT)?;
        if tok.starts_with('"') || tok.starts_with('\'') {
            reserved.push(Reserved::Name(unquote(tok).to_string()));
        } else {
            let from: i64 = number(tok, CONTEXT)?;
            let to = if cur.eat("to") {
                match cur.next("reserved range end", CONTEXT)? {
                    "max" => max,
                    end => number(end, CONTEXT)?,
                }
            } else {
                from
            };
            reserved.push(Reserved::Range { from, to });
        }

        match cur.next(";", CONTEXT)? {
            "," => continue,
            ";" => return Ok(reserved),
            _ => return Err(cur.unexpected_last(CONTEXT)),
        }
    }
}

pub fn parse_enum(cur: &mut Cursor) -> Result<EnumDef, ParseError> {
    cur.expect("enum", "enum")?;
    let name = cur.word("enum name", "enum")?;
    cur.expect("{", "enum")?;

    let mut def = EnumDef {
        name: name.to_string(),
        ..Default::default()
    };
    loop {
        let comments = cur.take_comments();
        let tok = cur.peek().ok_or_else(|| cur.unterminated("}", "enum"))?;
        match tok {
            "}" => {
                cur.advance();
                cur.eat(";");
                return Ok(def);
            }
            ";" => {
                cur.advance();
            }
            _ => match Keyword::from_token(tok) {
                Some(Keyword::Option) => parse_option_into(cur, &mut def.options)?,
                Some(Keyword::Reserved) => {
                    def.reserved.extend(parse_reserved(cur, i64::from(i32::MAX))?);
                }
                _ => {
                    let value = parse_enum_value(cur, comments)?;
                    if def.value(&value.name).is_some() {
                        return Err(ParseError::duplicate("enum value", &value.name));
                    }
                    def.values.push(value);
                }
            },
        }
    }
}

/// `NAME = 1;` or `NAME = 1 [options];`
fn parse_enum_value(cur: &mut Cursor, comments: Vec<String>) -> Result<EnumValue, ParseError> {
    const CONTEXT: &str = "enum value";

    let Some(terminator) = cur.peek_nth(3) else {
        return Err(cur.unterminated(";", CONTEXT));
    };
    if cur.peek_nth(1).is_some_and(|t| t != "=") {
        return Err(cur.unexpected_nth(1, CONTEXT));
    }
    if terminator != ";" && terminator != "[" {
        return Err(cur.unexpected_nth(3, CONTEXT));
    }

    let name = cur.word("enum value name", CONTEXT)?;
    cur.expect("=", CONTEXT)?;
    let value: i32 = number(cur.next("enum number", CONTEXT)?, CONTEXT)?;
    let options = if cur.peek_is("[") {
        parse_field_options(cur)?
    } else {
        OptionMap::new()
    };
    cur.expect(";", CONTEXT)?;

    Ok(EnumValue {
        name: name.to_string(),
        value,
        options,
        comments,
    })
}

/// Decimal or `0x` hexadecimal integer, optionally signed.
fn parse_integer(literal: &str) -> Option<i64> {
    let (negative, digits) = match literal.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, literal.strip_prefix('+').unwrap_or(literal)),
    };
    let magnitude = match digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        Some(hex) if !hex.is_empty() && hex.bytes().all(|b| b.is_ascii_hexdigit()) => {
            i64::from_str_radix(hex, 16).ok()?
        }
        Some(_) => return None,
        None if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => {
            digits.parse::<i64>().ok()?
        }
        None => return None,
    };
    Some(if negative { -magnitude } else { magnitude })
}

fn number<T: TryFrom<i64>>(literal: &str, context: &'static str) -> Result<T, ParseError> {
    parse_integer(literal)
        .and_then(|n| T::try_from(n).ok())
        .ok_or_else(|| ParseError::InvalidNumber {
            literal: literal.to_string(),
            context,
        })
}
