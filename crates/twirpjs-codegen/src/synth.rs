//! Defaulting code synthesis.
//!
//! [`Synthesizer`] walks a message's fields and builds an emission tree of
//! [`Node`]s describing how each value is read from a parsed JSON response and
//! what it falls back to when absent. The tree says nothing about layout;
//! [`crate::render`] turns it into JavaScript text.

use crate::classify::{Classifier, FieldKind};
use crate::error::Result;
use crate::schema::{Field, ScalarType};

/// Loop variable bound by `.map(v => ...)` and `.reduce((a, [k, v]) => ...)`.
pub const LOOP_VAR: &str = "v";

/// Chain of accessors from a root value (`data`, `v`) down to a field.
///
/// The root is always present; every hop after the first may cross an absent
/// message and is rendered with optional chaining.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPath {
    root: String,
    segments: Vec<String>,
}

impl AccessPath {
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            root: name.into(),
            segments: Vec::new(),
        }
    }

    pub fn child(&self, name: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        Self {
            root: self.root.clone(),
            segments,
        }
    }

    pub fn render(&self) -> String {
        let mut out = self.root.clone();
        for (i, seg) in self.segments.iter().enumerate() {
            out.push_str(if i == 0 { "." } else { "?." });
            out.push_str(seg);
        }
        out
    }
}

/// Fallback literal used when a value is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZeroValue {
    Number,
    Bool,
    String,
    Object,
}

impl ZeroValue {
    pub fn for_tag(tag: ScalarType) -> Self {
        match tag {
            t if t.is_numeric() => Self::Number,
            ScalarType::Bool => Self::Bool,
            ScalarType::String => Self::String,
            _ => Self::Object,
        }
    }

    pub fn literal(self) -> &'static str {
        match self {
            Self::Number => "0",
            Self::Bool => "false",
            Self::String => "\"\"",
            Self::Object => "{}",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// `name: path || zero`
    Scalar {
        name: String,
        path: AccessPath,
        zero: ZeroValue,
    },
    /// `name: path || ""`
    Timestamp { name: String, path: AccessPath },
    /// Entry reduction into a fresh keyed object.
    Map {
        name: String,
        path: AccessPath,
        value: Element,
    },
    /// Guarded element-wise map into a fresh array.
    Repeated {
        name: String,
        path: AccessPath,
        element: Element,
    },
    /// Nested object literal.
    Message {
        name: String,
        path: AccessPath,
        fields: Vec<Node>,
    },
}

impl Node {
    pub fn name(&self) -> &str {
        match self {
            Self::Scalar { name, .. }
            | Self::Timestamp { name, .. }
            | Self::Map { name, .. }
            | Self::Repeated { name, .. }
            | Self::Message { name, .. } => name,
        }
    }
}

/// How one map value or array element is rebuilt from [`LOOP_VAR`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    /// `v || zero`
    Defaulted(ZeroValue),
    /// Object literal over the element message's fields, rooted at `v`.
    Object(Vec<Node>),
}

#[derive(Debug, Clone, Copy)]
pub struct Synthesizer<'i, 's> {
    classifier: Classifier<'i, 's>,
}

impl<'i, 's> Synthesizer<'i, 's> {
    pub fn new(classifier: Classifier<'i, 's>) -> Self {
        Self { classifier }
    }

    /// Emit nodes for `fields` read from `path`.
    pub fn emit(&self, fields: &[Field], path: &AccessPath) -> Result<Vec<Node>> {
        self.emit_fields(fields, path, &mut Vec::new())
    }

    /// Emit nodes for the fields of the message named `qualified`. The message
    /// itself counts as being expanded, so direct self-references stop here.
    pub fn emit_message(&self, qualified: &str, path: &AccessPath) -> Result<Vec<Node>> {
        let message = self.classifier.index.message(qualified, "synthesis root")?;
        let mut expanding = vec![qualified.to_string()];
        self.emit_fields(&message.fields, path, &mut expanding)
    }

    fn emit_fields(
        &self,
        fields: &[Field],
        path: &AccessPath,
        expanding: &mut Vec<String>,
    ) -> Result<Vec<Node>> {
        fields
            .iter()
            .map(|f| self.emit_field(f, path, expanding))
            .collect()
    }

    fn emit_field(
        &self,
        field: &Field,
        path: &AccessPath,
        expanding: &mut Vec<String>,
    ) -> Result<Node> {
        let name = field.name.clone();
        let path = path.child(&field.name);
        Ok(match self.classifier.classify(field)? {
            FieldKind::Scalar => Node::Scalar {
                name,
                path,
                zero: ZeroValue::for_tag(field.tag),
            },
            FieldKind::Timestamp if field.is_repeated() => Node::Repeated {
                name,
                path,
                element: Element::Defaulted(ZeroValue::String),
            },
            FieldKind::Timestamp => Node::Timestamp { name, path },
            FieldKind::Map => {
                let entry = self.classifier.index.map_entry(
                    field.type_ref.as_deref().unwrap_or_default(),
                    &format!("field `{}`", field.name),
                )?;
                let value = self.element(&entry.fields[1], expanding)?;
                Node::Map { name, path, value }
            }
            FieldKind::Repeated => {
                let element = self.element(field, expanding)?;
                Node::Repeated {
                    name,
                    path,
                    element,
                }
            }
            FieldKind::Message => {
                let type_ref = field.type_ref.as_deref().unwrap_or_default();
                if expanding.iter().any(|t| t == type_ref) {
                    tracing::debug!(field = %field.name, type_ref, "recursive reference left unexpanded");
                    return Ok(Node::Scalar {
                        name,
                        path,
                        zero: ZeroValue::Object,
                    });
                }
                let message = self
                    .classifier
                    .index
                    .message(type_ref, &format!("field `{}`", field.name))?;
                expanding.push(type_ref.to_string());
                let fields = self.emit_fields(&message.fields, &path, expanding)?;
                expanding.pop();
                Node::Message { name, path, fields }
            }
        })
    }

    /// Rebuild rule for one value of `field`'s type, ignoring repetition.
    fn element(&self, field: &Field, expanding: &mut Vec<String>) -> Result<Element> {
        if field.type_ref.as_deref() == Some(self.classifier.config.timestamp_type.as_str()) {
            return Ok(Element::Defaulted(ZeroValue::String));
        }
        if !field.tag.is_message_like() {
            return Ok(Element::Defaulted(ZeroValue::for_tag(field.tag)));
        }

        let type_ref = field.type_ref.as_deref().unwrap_or_default();
        let message = self
            .classifier
            .index
            .message(type_ref, &format!("field `{}`", field.name))?;
        if message.fields.is_empty() || expanding.iter().any(|t| t == type_ref) {
            return Ok(Element::Defaulted(ZeroValue::Object));
        }

        expanding.push(type_ref.to_string());
        let fields = self.emit_fields(&message.fields, &AccessPath::root(LOOP_VAR), expanding)?;
        expanding.pop();
        Ok(Element::Object(fields))
    }
}
