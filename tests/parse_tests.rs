//! End-to-end parsing tests over inline sources and the `testdata` fixtures.

use pretty_assertions::assert_eq;
use protoschema::types::*;
use protoschema::{parse, parse_tokens, parse_with, ParseError, ParseOptions};

fn testdata(name: &str) -> String {
    let path = format!("{}/testdata/{}", env!("CARGO_MANIFEST_DIR"), name);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to read {}: {}", path, e))
}

#[test]
fn test_message_end_to_end() {
    let schema =
        parse("syntax = \"proto3\"; message M { string name = 1; repeated int32 ids = 2; }").unwrap();
    assert_eq!(schema.messages.len(), 1);
    let m = &schema.messages[0];
    assert_eq!(m.name, "M");

    let name = Field::new("name", FieldType::Scalar("string".into()), 1);
    let mut ids = Field::new("ids", FieldType::Scalar("int32".into()), 2);
    ids.repeated = true;
    assert_eq!(m.fields, vec![name, ids]);
}

#[test]
fn test_service_end_to_end() {
    let schema = parse("service S { function Get (Req) returns (Res); }").unwrap();
    assert_eq!(schema.services.len(), 1);
    let s = &schema.services[0];
    assert_eq!(s.name, "S");
    assert_eq!(s.methods.len(), 1);
    let get = &s.methods[0];
    assert_eq!(get.name, "Get");
    assert_eq!(get.inputs.len(), 1);
    assert_eq!(get.inputs[0].ty.name(), "Req");
    assert_eq!(get.output.ty.name(), "Res");
    assert!(!get.output.repeated);
    assert!(!get.client_streaming);
    assert!(!get.server_streaming);
}

#[test]
fn test_proto3_fields_default_to_optional() {
    let schema = parse(
        r#"
        syntax = "proto3";
        message A {
            string a = 1;
            B b = 2;
            bytes c = 3;
            message B { double d = 1; .pkg.Other e = 2; }
        }
        "#,
    )
    .unwrap();
    let a = &schema.messages[0];
    let all_fields = a.fields.iter().chain(a.messages[0].fields.iter());
    for field in all_fields {
        assert!(!field.required, "{} should not be required", field.name);
        assert!(!field.repeated, "{} should not be repeated", field.name);
    }
    assert_eq!(
        a.messages[0].fields[1].field_type,
        FieldType::MessageRef(".pkg.Other".into())
    );
}

#[test]
fn test_syntax_position() {
    assert_eq!(parse("syntax = \"proto3\";").unwrap().syntax, Syntax::Proto3);
    assert_eq!(parse("syntax = \"proto2\";").unwrap().syntax, Syntax::Proto2);
    assert_eq!(
        parse("message M {} syntax = \"proto3\";"),
        Err(ParseError::SyntaxNotFirst)
    );
    assert_eq!(
        parse("syntax = \"proto3\"; syntax = \"proto3\";"),
        Err(ParseError::SyntaxNotFirst)
    );
}

#[test]
fn test_default_syntax_is_configurable() {
    assert_eq!(parse("").unwrap().syntax, Syntax::Proto3);
    let options = ParseOptions {
        default_syntax: Syntax::Proto2,
        ..Default::default()
    };
    assert_eq!(parse_with("package x;", &options).unwrap().syntax, Syntax::Proto2);
}

#[test]
fn test_comment_runs() {
    let schema = parse(
        "// one\n// two\n// three\nmessage M {}\n// for E\nenum E { A = 0; }\n// dangling",
    )
    .unwrap();
    assert_eq!(schema.messages[0].comments, vec!["one", "two", "three"]);
    assert_eq!(schema.comments, vec!["one", "two", "three"]);
    assert_eq!(schema.enums[0].comments, vec!["for E"]);
}

#[test]
fn test_nested_option_map() {
    let schema = parse("option (x) = { a: 1 b: { c: \"d\" } };").unwrap();
    let x = schema.options.get("x").and_then(OptionValue::as_map).unwrap();
    assert_eq!(x.get("a"), Some(&OptionValue::Str("1".into())));
    let b = x.get("b").and_then(OptionValue::as_map).unwrap();
    assert_eq!(b.len(), 1);
    assert_eq!(b.get("c"), Some(&OptionValue::Str("d".into())));
}

#[test]
fn test_comments_between_option_entries() {
    let schema = parse("option (x) = {\n // note\n a: 1\n};").unwrap();
    let x = schema.options.get("x").and_then(OptionValue::as_map).unwrap();
    assert_eq!(x.get("a"), Some(&OptionValue::Str("1".into())));

    let schema = parse(
        "message M {\n  int32 a = 1 [\n    // why\n    deprecated = true\n  ];\n}\nservice S {\n  rpc Get (\n    // input\n    Req\n  ) returns (Res);\n}",
    )
    .unwrap();
    assert_eq!(
        schema.messages[0].fields[0].options.get("deprecated"),
        Some(&OptionValue::Bool(true))
    );
    assert_eq!(schema.services[0].methods[0].inputs[0].ty.name(), "Req");
}

#[test]
fn test_errors_report_token_index() {
    assert_eq!(
        parse("package a b;"),
        Err(ParseError::UnexpectedToken {
            found: "b".into(),
            context: "package",
            token: 2,
        })
    );
    // Tokens inside a message body keep their position in the whole stream.
    assert!(matches!(
        parse("message M { int32 a 1; }"),
        Err(ParseError::UnexpectedToken { ref found, token: 5, .. }) if found == "1"
    ));
    assert!(matches!(
        parse("enum E { A = 0;"),
        Err(ParseError::Unterminated { expected: "}", token: 7, .. })
    ));
}

#[test]
fn test_optimize_for() {
    assert!(parse("option optimize_for = CODE_SIZE;").is_ok());
    assert_eq!(
        parse("option optimize_for = TINY;"),
        Err(ParseError::InvalidOptimizeFor("TINY".into()))
    );
}

#[test]
fn test_parse_tokens_coalesces_split_strings() {
    let tokens = vec![
        "option", "go_package", "=", "\"example.com/a", ";", "b\"", ";", "message", "M", "{",
        "}",
    ];
    let schema = parse_tokens(tokens, &ParseOptions::default()).unwrap();
    assert_eq!(
        schema.options.get("go_package"),
        Some(&OptionValue::Str("example.com/a;b".into()))
    );
    assert_eq!(schema.messages[0].name, "M");
}

#[test]
fn test_parse_tokens_comment_encoding() {
    let tokens = vec!["//+a+plus+encoded+line", "message", "M", "{", "}"];
    let schema = parse_tokens(tokens, &ParseOptions::default()).unwrap();
    assert_eq!(schema.messages[0].comments, vec!["a plus encoded line"]);
}

#[test]
fn test_unterminated_literal_surfaces_as_unexpected_token() {
    let tokens = vec!["option", "x", "=", "\"never", "closed", ";"];
    assert!(matches!(
        parse_tokens(tokens, &ParseOptions::default()),
        Err(ParseError::UnexpectedToken { ref found, .. }) if found == "closed"
    ));
}

#[test]
fn test_first_error_wins() {
    let result = parse("message A { int32 a = x; } message B { int32 b = y; }");
    assert_eq!(
        result,
        Err(ParseError::InvalidNumber {
            literal: "x".into(),
            context: "field number",
        })
    );
}

#[test]
fn test_lexer_errors_propagate() {
    assert!(matches!(
        parse("message M {\n string s = 1 [default = \"open];\n}"),
        Err(ParseError::Lex { line: 2, .. })
    ));
}

#[test]
fn test_addressbook_fixture() {
    let schema = parse(&testdata("addressbook.proto")).unwrap();
    assert_eq!(schema.syntax, Syntax::Proto3);
    assert_eq!(schema.package.as_deref(), Some("tutorial"));
    assert_eq!(
        schema.comments,
        vec!["Address book example.", "Shared by the integration tests."]
    );
    assert_eq!(
        schema.imports,
        vec![Import {
            module: "google/protobuf/timestamp".into(),
            modifier: None,
        }]
    );
    assert_eq!(schema.options.len(), 3);
    assert_eq!(
        schema.options.get("java_multiple_files"),
        Some(&OptionValue::Bool(true))
    );

    let person = schema.find_message("Person").unwrap();
    assert_eq!(person.comments, vec!["One person in the book."]);
    let names: Vec<_> = person.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["name", "id", "email", "phones", "last_updated", "slack", "matrix", "labels"]
    );
    // A trailing comment belongs to the declaration that follows it.
    assert_eq!(person.field("email").unwrap().comments, vec!["Unique ID number for this person."]);

    let phones = person.field("phones").unwrap();
    assert!(phones.repeated);
    assert_eq!(phones.field_type, FieldType::MessageRef("PhoneNumber".into()));
    assert_eq!(
        person.field("last_updated").unwrap().field_type,
        FieldType::MessageRef("google.protobuf.Timestamp".into())
    );
    assert_eq!(person.field("slack").unwrap().oneof.as_deref(), Some("contact"));

    let labels = person.field("labels").unwrap();
    assert_eq!(
        labels.map_type(),
        Some(&MapType {
            key: "string".into(),
            value: "string".into(),
        })
    );
    assert_eq!(labels.options.get("deprecated"), Some(&OptionValue::Bool(true)));

    assert_eq!(person.enums[0].name, "PhoneType");
    assert_eq!(person.enums[0].value("WORK").map(|v| v.value), Some(2));
    assert!(schema.find_message("Person.PhoneNumber").is_some());

    let book = schema.find_message("AddressBook").unwrap();
    assert!(book.comments.is_empty());
}

#[test]
fn test_service_fixture() {
    let schema = parse(&testdata("service.proto")).unwrap();

    let meta = schema.options.get("file_meta").and_then(OptionValue::as_map).unwrap();
    assert_eq!(meta.get("owner"), Some(&OptionValue::Str("platform".into())));
    let contacts = meta.get("contact").and_then(OptionValue::as_list).unwrap();
    assert_eq!(contacts.len(), 2);
    assert_eq!(contacts[0].get("email"), Some(&OptionValue::Str("a@example.com".into())));

    let users = schema.service("Users").unwrap();
    assert_eq!(users.options.get("svc_version"), Some(&OptionValue::Str("2".into())));
    assert_eq!(users.methods.len(), 3);

    let get = users.method("Get").unwrap();
    assert_eq!(get.comments, vec!["Fetch a single user."]);
    assert_eq!(get.inputs[0].name.as_deref(), Some("req"));

    let watch = users.method("Watch").unwrap();
    assert!(watch.client_streaming);
    assert!(watch.server_streaming);
    let http = watch.options.get("google.api.http").and_then(OptionValue::as_map).unwrap();
    assert_eq!(http.get("get"), Some(&OptionValue::Str("/v1/users:watch".into())));
    assert_eq!(http.get("additional_bindings").and_then(OptionValue::as_list).map(|l| l.len()), Some(1));

    let bulk = users.method("Bulk").unwrap();
    assert!(bulk.inputs[0].repeated);
    assert_eq!(bulk.inputs[1].ty.name(), "map");
    assert!(bulk.output.repeated);
    assert!(!bulk.client_streaming);
}
