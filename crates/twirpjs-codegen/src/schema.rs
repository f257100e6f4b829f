//! Schema data model.
//!
//! This is the decoded, transport-independent view of a set of `.proto`
//! files: just the parts the generator needs (names, field shapes, type
//! references, services). Decoders in [`crate::descriptor`] produce it; every
//! other component reads it.

/// Ordered list of files, in the order the transport supplied them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    pub files: Vec<File>,
}

impl Schema {
    pub fn new(files: Vec<File>) -> Self {
        Self { files }
    }

    pub fn file(&self, name: &str) -> Option<&File> {
        self.files.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct File {
    pub name: String,
    pub package: String,
    pub messages: Vec<Message>,
    pub enums: Vec<Enum>,
    pub services: Vec<Service>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    pub name: String,
    pub fields: Vec<Field>,
    pub nested: Vec<Message>,
    pub enums: Vec<Enum>,
    /// Set when the descriptor carries `options.map_entry = true`.
    pub map_entry: bool,
}

impl Message {
    pub fn new(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            name: name.into(),
            fields,
            ..Default::default()
        }
    }

    pub fn with_nested(mut self, nested: Message) -> Self {
        self.nested.push(nested);
        self
    }

    pub fn with_enum(mut self, e: Enum) -> Self {
        self.enums.push(e);
        self
    }

    /// Synthetic `<Name>Entry` message for a `map<K, V>` field.
    pub fn map_entry(name: impl Into<String>, key: Field, value: Field) -> Self {
        Self {
            name: name.into(),
            fields: vec![key, value],
            map_entry: true,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub tag: ScalarType,
    /// Qualified name (`.pkg.Type`), only for message, group and enum tags.
    pub type_ref: Option<String>,
    pub label: Label,
}

impl Field {
    pub fn scalar(name: impl Into<String>, tag: ScalarType) -> Self {
        Self {
            name: name.into(),
            tag,
            type_ref: None,
            label: Label::Singular,
        }
    }

    pub fn message(name: impl Into<String>, type_ref: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tag: ScalarType::Message,
            type_ref: Some(type_ref.into()),
            label: Label::Singular,
        }
    }

    pub fn enumeration(name: impl Into<String>, type_ref: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tag: ScalarType::Enum,
            type_ref: Some(type_ref.into()),
            label: Label::Singular,
        }
    }

    pub fn repeated(mut self) -> Self {
        self.label = Label::Repeated;
        self
    }

    pub fn is_repeated(&self) -> bool {
        self.label == Label::Repeated
    }
}

/// Field type tag, mirroring `FieldDescriptorProto.Type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Double,
    Float,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Sint32,
    Sint64,
    Fixed32,
    Fixed64,
    Sfixed32,
    Sfixed64,
    Bool,
    String,
    Bytes,
    Message,
    Group,
    Enum,
}

impl ScalarType {
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::Double
                | Self::Float
                | Self::Int32
                | Self::Int64
                | Self::Uint32
                | Self::Uint64
                | Self::Sint32
                | Self::Sint64
                | Self::Fixed32
                | Self::Fixed64
                | Self::Sfixed32
                | Self::Sfixed64
        )
    }

    pub fn is_message_like(self) -> bool {
        matches!(self, Self::Message | Self::Group)
    }

    /// Parse the descriptor spelling (`TYPE_INT32`) or the short `.proto`
    /// spelling (`int32`).
    pub fn parse(s: &str) -> Option<Self> {
        let short = s.strip_prefix("TYPE_").unwrap_or(s).to_ascii_lowercase();
        Some(match short.as_str() {
            "double" => Self::Double,
            "float" => Self::Float,
            "int32" => Self::Int32,
            "int64" => Self::Int64,
            "uint32" => Self::Uint32,
            "uint64" => Self::Uint64,
            "sint32" => Self::Sint32,
            "sint64" => Self::Sint64,
            "fixed32" => Self::Fixed32,
            "fixed64" => Self::Fixed64,
            "sfixed32" => Self::Sfixed32,
            "sfixed64" => Self::Sfixed64,
            "bool" => Self::Bool,
            "string" => Self::String,
            "bytes" => Self::Bytes,
            "message" => Self::Message,
            "group" => Self::Group,
            "enum" => Self::Enum,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Label {
    #[default]
    Singular,
    Repeated,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Enum {
    pub name: String,
    pub values: Vec<String>,
}

impl Enum {
    pub fn new<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Service {
    pub name: String,
    pub methods: Vec<Method>,
}

impl Service {
    /// `pkg.Service`, the segment used in the endpoint path.
    pub fn qualified_name(&self, package: &str) -> String {
        if package.is_empty() {
            self.name.clone()
        } else {
            format!("{package}.{}", self.name)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Method {
    pub name: String,
    pub input_type: String,
    pub output_type: String,
    pub client_streaming: bool,
    pub server_streaming: bool,
}

impl Method {
    pub fn unary(
        name: impl Into<String>,
        input_type: impl Into<String>,
        output_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            input_type: input_type.into(),
            output_type: output_type.into(),
            client_streaming: false,
            server_streaming: false,
        }
    }

    pub fn is_streaming(&self) -> bool {
        self.client_streaming || self.server_streaming
    }
}

/// `.pkg.Name` for a top-level type.
pub fn qualify_type_name(package: &str, name: &str) -> String {
    if package.is_empty() {
        format!(".{name}")
    } else {
        format!(".{package}.{name}")
    }
}

/// Last dotted segment of a qualified name (`.pkg.Outer.Inner` → `Inner`).
pub fn short_name(qualified: &str) -> &str {
    qualified.rsplit('.').next().unwrap_or(qualified)
}
