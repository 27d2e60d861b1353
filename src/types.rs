use indexmap::map::Entry;
use indexmap::IndexMap;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::error::ParseError;

/// Largest legal field number; `extensions N to max` resolves to this.
pub const MAX_FIELD_NUMBER: u32 = 0x1FFF_FFFF;

/// The protobuf language revision declared by `syntax = "..."`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum Syntax {
    Proto2,
    #[default]
    Proto3,
}

impl Syntax {
    /// The numeric version: 2 or 3.
    pub fn version(self) -> u8 {
        match self {
            Syntax::Proto2 => 2,
            Syntax::Proto3 => 3,
        }
    }
}

/// The root of a parsed `.proto` file.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Schema {
    pub syntax: Syntax,
    pub package: Option<String>,
    pub imports: Vec<Import>,
    pub messages: Vec<Message>,
    pub enums: Vec<EnumDef>,
    pub services: Vec<Service>,
    /// Top-level `extend` blocks. Their fields are also merged into the
    /// target message once linking has run.
    pub extends: Vec<Extend>,
    pub options: OptionMap,
    /// Comment run preceding the first statement of the file.
    pub comments: Vec<String>,
}

/// An `import` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Import {
    /// Imported module name with the file extension stripped.
    pub module: String,
    pub modifier: Option<ImportModifier>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum ImportModifier {
    Public,
    Weak,
}

/// A `message` declaration. Also used as the synthetic container of an
/// `extend` block's fields.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Message {
    pub name: String,
    pub messages: Vec<Message>,
    pub enums: Vec<EnumDef>,
    pub fields: Vec<Field>,
    pub extends: Vec<Extend>,
    /// Ranges declared with `extensions`; empty when the message cannot be extended.
    pub extensions: Vec<ExtensionRange>,
    pub reserved: Vec<Reserved>,
    pub options: OptionMap,
    pub comments: Vec<String>,
}

impl Message {
    pub fn new(name: impl Into<String>) -> Self {
        Message {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Find a field by name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Find a field by tag.
    pub fn field_by_tag(&self, tag: u32) -> Option<&Field> {
        self.fields.iter().find(|f| f.tag == tag)
    }

    /// Find a directly nested message by name.
    pub fn message(&self, name: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.name == name)
    }

    /// Whether `tag` lies inside any declared extension range.
    pub fn accepts_extension(&self, tag: u32) -> bool {
        self.extensions.iter().any(|r| r.contains(tag))
    }
}

/// A message field, map field, or oneof member.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Field {
    pub name: String,
    pub field_type: FieldType,
    pub tag: u32,
    pub required: bool,
    pub repeated: bool,
    /// Name of the enclosing `oneof` group, if any.
    pub oneof: Option<String>,
    pub options: OptionMap,
    pub comments: Vec<String>,
}

impl Field {
    /// A singular field with no rule keyword, no options and no comments.
    pub fn new(name: impl Into<String>, field_type: FieldType, tag: u32) -> Self {
        Field {
            name: name.into(),
            field_type,
            tag,
            required: false,
            repeated: false,
            oneof: None,
            options: OptionMap::new(),
            comments: Vec::new(),
        }
    }

    /// The `map<K, V>` shape, when this is a map field.
    pub fn map_type(&self) -> Option<&MapType> {
        match &self.field_type {
            FieldType::Map(m) => Some(m),
            _ => None,
        }
    }
}

/// The declared type of a field or RPC argument.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum FieldType {
    /// One of the built-in scalar types (`int32`, `string`, ...).
    Scalar(String),
    /// A message or enum type, referenced by name only.
    MessageRef(String),
    Map(MapType),
}

impl FieldType {
    const SCALARS: [&'static str; 15] = [
        "double", "float", "int32", "int64", "uint32", "uint64", "sint32", "sint64", "fixed32",
        "fixed64", "sfixed32", "sfixed64", "bool", "string", "bytes",
    ];

    /// Classify a declared type name.
    pub fn from_name(name: &str) -> Self {
        if Self::is_scalar(name) {
            FieldType::Scalar(name.to_string())
        } else {
            FieldType::MessageRef(name.to_string())
        }
    }

    pub fn is_scalar(name: &str) -> bool {
        Self::SCALARS.contains(&name)
    }

    /// The declared type name; `"map"` for map fields.
    pub fn name(&self) -> &str {
        match self {
            FieldType::Scalar(n) | FieldType::MessageRef(n) => n,
            FieldType::Map(_) => "map",
        }
    }
}

/// Key and value type names of a `map<K, V>` field.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct MapType {
    pub key: String,
    pub value: String,
}

/// An `enum` declaration.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct EnumDef {
    pub name: String,
    pub values: Vec<EnumValue>,
    pub reserved: Vec<Reserved>,
    pub options: OptionMap,
    pub comments: Vec<String>,
}

impl EnumDef {
    /// Find a value by name.
    pub fn value(&self, name: &str) -> Option<&EnumValue> {
        self.values.iter().find(|v| v.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct EnumValue {
    pub name: String,
    pub value: i32,
    pub options: OptionMap,
    pub comments: Vec<String>,
}

/// An inclusive `[from, to]` interval of field numbers open to `extend` blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ExtensionRange {
    pub from: u32,
    pub to: u32,
}

impl ExtensionRange {
    pub fn contains(&self, tag: u32) -> bool {
        self.from <= tag && tag <= self.to
    }
}

/// A `reserved` entry of a message or enum.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum Reserved {
    /// Inclusive number range; a single number is a range of one.
    Range { from: i64, to: i64 },
    Name(String),
}

/// An `extend Target { ... }` block.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Extend {
    /// Name of the extended message, as written.
    pub name: String,
    /// Synthetic message holding only the extension fields.
    pub message: Message,
}

/// A `service` declaration.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Service {
    pub name: String,
    pub methods: Vec<RpcMethod>,
    pub options: OptionMap,
    pub comments: Vec<String>,
}

impl Service {
    pub fn method(&self, name: &str) -> Option<&RpcMethod> {
        self.methods.iter().find(|m| m.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct RpcMethod {
    pub name: String,
    pub inputs: Vec<RpcArgument>,
    pub output: RpcArgument,
    pub client_streaming: bool,
    pub server_streaming: bool,
    pub options: OptionMap,
    pub comments: Vec<String>,
}

/// One input parameter or the output of an RPC method.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct RpcArgument {
    /// Parameter name; outputs and unnamed parameters have none.
    pub name: Option<String>,
    pub ty: FieldType,
    pub repeated: bool,
}

/// The value bound to an option name.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize), serde(untagged))]
pub enum OptionValue {
    Bool(bool),
    /// Any other literal, with surrounding quotes removed.
    Str(String),
    /// `key: { ... }` or `option x = { ... }`.
    Map(OptionMap),
    /// Repeated `key { ... }` blocks, in occurrence order.
    List(Vec<OptionMap>),
}

impl OptionValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&OptionMap> {
        match self {
            OptionValue::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[OptionMap]> {
        match self {
            OptionValue::List(l) => Some(l),
            _ => None,
        }
    }
}

impl From<bool> for OptionValue {
    fn from(b: bool) -> Self {
        OptionValue::Bool(b)
    }
}

impl From<&str> for OptionValue {
    fn from(s: &str) -> Self {
        OptionValue::Str(s.to_string())
    }
}

/// Ordered option bindings of one scope.
///
/// A key is either bound once to a value ([`OptionMap::bind`]) or collects
/// repeated nested blocks ([`OptionMap::push_block`]); mixing the two, or
/// binding a key twice, is a duplicate.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize), serde(transparent))]
pub struct OptionMap(IndexMap<String, OptionValue>);

impl OptionMap {
    pub fn new() -> Self {
        OptionMap(IndexMap::new())
    }

    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Bind `key` to a single value. Fails if the key is already present.
    pub fn bind(&mut self, key: String, value: OptionValue) -> Result<(), ParseError> {
        match self.0.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(value);
                Ok(())
            }
            Entry::Occupied(slot) => Err(ParseError::duplicate("option", slot.key())),
        }
    }

    /// Append a nested `key { ... }` block. Fails if `key` holds a single value.
    pub fn push_block(&mut self, key: String, block: OptionMap) -> Result<(), ParseError> {
        match self.0.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(OptionValue::List(vec![block]));
                Ok(())
            }
            Entry::Occupied(mut slot) => match slot.get_mut() {
                OptionValue::List(blocks) => {
                    blocks.push(block);
                    Ok(())
                }
                _ => Err(ParseError::duplicate("option map key", slot.key())),
            },
        }
    }
}

impl<'a> IntoIterator for &'a OptionMap {
    type Item = (&'a String, &'a OptionValue);
    type IntoIter = indexmap::map::Iter<'a, String, OptionValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Schema {
    /// Find a message by a name written at file level.
    ///
    /// Same rules as [`Schema::resolve_message`] with an empty scope.
    pub fn find_message(&self, name: &str) -> Option<&Message> {
        self.resolve_message(&[], name)
    }

    pub fn find_message_mut(&mut self, name: &str) -> Option<&mut Message> {
        self.resolve_message_mut(&[], name)
    }

    /// Resolve a message name written inside the messages `scope`
    /// (outermost first).
    ///
    /// A leading `.` makes the name fully qualified. Otherwise the name is
    /// tried relative to each enclosing message, innermost first, then from
    /// the top level. Either form may carry the file's `package` prefix. A
    /// single-segment name that is still unresolved matches the first
    /// message of that name in depth-first order.
    pub fn resolve_message(&self, scope: &[String], name: &str) -> Option<&Message> {
        let path = self.locate_message(scope, name)?;
        let (&first, rest) = path.split_first()?;
        Some(rest.iter().fold(&self.messages[first], |msg, &i| &msg.messages[i]))
    }

    pub fn resolve_message_mut(&mut self, scope: &[String], name: &str) -> Option<&mut Message> {
        let path = self.locate_message(scope, name)?;
        let (&first, rest) = path.split_first()?;
        Some(rest.iter().fold(&mut self.messages[first], |msg, &i| &mut msg.messages[i]))
    }

    pub fn service(&self, name: &str) -> Option<&Service> {
        self.services.iter().find(|s| s.name == name)
    }

    pub fn enum_def(&self, name: &str) -> Option<&EnumDef> {
        self.enums.iter().find(|e| e.name == name)
    }

    /// `name` with the file's package prefix removed, if it has one.
    fn strip_package<'n>(&self, name: &'n str) -> Option<&'n str> {
        let package = self.package.as_deref()?;
        name.strip_prefix(package)?.strip_prefix('.')
    }

    /// Index path from the top level down to the named message.
    fn locate_message(&self, scope: &[String], name: &str) -> Option<Vec<usize>> {
        if let Some(qualified) = name.strip_prefix('.') {
            let relative = self.strip_package(qualified).unwrap_or(qualified);
            return locate_by_path(&self.messages, relative.split('.'));
        }

        for depth in (0..=scope.len()).rev() {
            let parts = scope[..depth]
                .iter()
                .map(String::as_str)
                .chain(name.split('.'));
            if let Some(path) = locate_by_path(&self.messages, parts) {
                return Some(path);
            }
        }
        if let Some(path) = self
            .strip_package(name)
            .and_then(|relative| locate_by_path(&self.messages, relative.split('.')))
        {
            return Some(path);
        }
        if name.contains('.') {
            return None;
        }
        locate_by_simple_name(&self.messages, name)
    }
}

fn locate_by_path<'p>(
    messages: &[Message],
    parts: impl IntoIterator<Item = &'p str>,
) -> Option<Vec<usize>> {
    let mut indices = Vec::new();
    let mut level = messages;
    for part in parts {
        let idx = level.iter().position(|m| m.name == part)?;
        indices.push(idx);
        level = &level[idx].messages;
    }
    if indices.is_empty() {
        return None;
    }
    Some(indices)
}

fn locate_by_simple_name(messages: &[Message], name: &str) -> Option<Vec<usize>> {
    for (idx, msg) in messages.iter().enumerate() {
        if msg.name == name {
            return Some(vec![idx]);
        }
        if let Some(mut rest) = locate_by_simple_name(&msg.messages, name) {
            rest.insert(0, idx);
            return Some(rest);
        }
    }
    None
}
