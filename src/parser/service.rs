use crate::error::ParseError;
use crate::types::{FieldType, OptionMap, RpcArgument, RpcMethod, Service};
use super::cursor::{Cursor, Keyword};
use super::grammar::parse_map_type;
use super::options::parse_option_into;

/// Parse `service Name { ... }`.
pub fn parse_service(cur: &mut Cursor) -> Result<Service, ParseError> {
    const CONTEXT: &str = "service";

    cur.expect("service", CONTEXT)?;
    let name = cur.word("service name", CONTEXT)?;
    cur.expect("{", CONTEXT)?;

    let mut service = Service {
        name: name.to_string(),
        ..Default::default()
    };
    loop {
        let comments = cur.take_comments();
        let tok = cur.peek().ok_or_else(|| cur.unterminated("}", CONTEXT))?;
        match tok {
            "}" => {
                cur.advance();
                cur.eat(";");
                return Ok(service);
            }
            ";" => {
                cur.advance();
            }
            _ => match Keyword::from_token(tok) {
                Some(Keyword::Option) => parse_option_into(cur, &mut service.options)?,
                Some(Keyword::Function | Keyword::Rpc) => {
                    service.methods.push(parse_rpc(cur, comments)?);
                }
                _ => return Err(cur.unexpected_nth(0, CONTEXT)),
            },
        }
    }
}

/// An argument shape: `Type`, `repeated Type` or `map<K, V>`.
fn parse_rpc_type(cur: &mut Cursor, context: &'static str) -> Result<(FieldType, bool), ParseError> {
    match cur.peek_keyword() {
        Some(Keyword::Map) => {
            cur.advance();
            Ok((FieldType::Map(parse_map_type(cur)?), false))
        }
        Some(Keyword::Repeated) => {
            cur.advance();
            let ty = cur.word("type", context)?;
            Ok((FieldType::from_name(ty), true))
        }
        _ => {
            let ty = cur.word("type", context)?;
            Ok((FieldType::from_name(ty), false))
        }
    }
}

/// `function Name (params) returns (Output);` or the same with a `{ option ...; }` body.
fn parse_rpc(cur: &mut Cursor, comments: Vec<String>) -> Result<RpcMethod, ParseError> {
    const CONTEXT: &str = "rpc";
    const PARAMS: &str = "rpc parameters";

    cur.advance();
    let name = cur.word("method name", CONTEXT)?;
    cur.expect("(", CONTEXT)?;

    let mut client_streaming = false;
    let mut inputs = Vec::new();
    cur.take_comments();
    if !cur.eat(")") {
        loop {
            cur.take_comments();
            if cur.eat("stream") {
                client_streaming = true;
            }
            let (ty, repeated) = parse_rpc_type(cur, PARAMS)?;
            cur.take_comments();
            let param_name = match cur.peek() {
                Some(",") | Some(")") => None,
                _ => Some(cur.word("parameter name", PARAMS)?.to_string()),
            };
            inputs.push(RpcArgument {
                name: param_name,
                ty,
                repeated,
            });
            cur.take_comments();
            match cur.next(")", PARAMS)? {
                "," => continue,
                ")" => break,
                _ => return Err(cur.unexpected_last(PARAMS)),
            }
        }
    }

    cur.expect("returns", CONTEXT)?;
    cur.expect("(", CONTEXT)?;
    let server_streaming = cur.eat("stream");
    let (ty, repeated) = parse_rpc_type(cur, CONTEXT)?;
    cur.expect(")", CONTEXT)?;
    let output = RpcArgument {
        name: None,
        ty,
        repeated,
    };

    let mut options = OptionMap::new();
    if !cur.eat(";") {
        cur.expect("{", CONTEXT)?;
        loop {
            cur.take_comments();
            let tok = cur.peek().ok_or_else(|| cur.unterminated("}", CONTEXT))?;
            match tok {
                "}" => {
                    cur.advance();
                    cur.eat(";");
                    break;
                }
                ";" => {
                    cur.advance();
                }
                _ => match Keyword::from_token(tok) {
                    Some(Keyword::Option) => parse_option_into(cur, &mut options)?,
                    _ => return Err(cur.unexpected_nth(0, "rpc options")),
                },
            }
        }
    }

    Ok(RpcMethod {
        name: name.to_string(),
        inputs,
        output,
        client_streaming,
        server_streaming,
        options,
        comments,
    })
}
