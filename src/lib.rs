//! Protoschema: a recursive-descent parser for Protocol Buffers IDL.
//!
//! Turns `.proto` source text into a [`Schema`] tree of messages, enums,
//! services, options and comments, ready for code generators or static
//! analysis. `extend` blocks are validated against the target message's
//! `extensions` ranges and merged into it before the tree is returned.
//!
//! # Quick Start
//!
//! ```rust
//! use protoschema::types::FieldType;
//!
//! let schema = protoschema::parse(r#"
//!     syntax = "proto3";
//!     package shop;
//!
//!     // A thing for sale.
//!     message Item {
//!         string name = 1;
//!         repeated int32 ids = 2;
//!         map<string, Price> prices = 3;
//!     }
//!
//!     service Catalog {
//!         rpc Get (ItemRequest) returns (Item);
//!     }
//! "#).unwrap();
//!
//! let item = schema.find_message("Item").unwrap();
//! assert_eq!(item.comments, vec!["A thing for sale."]);
//! assert_eq!(item.fields[0].field_type, FieldType::Scalar("string".into()));
//! assert!(item.fields[1].repeated);
//! assert_eq!(item.fields[2].field_type.name(), "map");
//! assert_eq!(schema.service("Catalog").unwrap().methods[0].output.ty.name(), "Item");
//! ```

pub mod error;
pub mod types;
pub mod parser;

pub use error::ParseError;
pub use parser::{parse, parse_tokens, parse_with, ParseOptions};
pub use types::Schema;
