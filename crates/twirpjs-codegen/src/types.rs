//! Type annotations for generated declarations and bindings.

use crate::classify::{Classifier, FieldKind};
use crate::error::{CodegenError, Result};
use crate::schema::{short_name, Field, Message, ScalarType};

pub const NUMBER: &str = "number";
pub const BOOLEAN: &str = "boolean";
pub const STRING: &str = "string";

/// Resolves the annotation text for a field. Pure: the same field always
/// yields the same text.
#[derive(Debug, Clone, Copy)]
pub struct TypeResolver<'i, 's> {
    classifier: Classifier<'i, 's>,
}

impl<'i, 's> TypeResolver<'i, 's> {
    pub fn new(classifier: Classifier<'i, 's>) -> Self {
        Self { classifier }
    }

    pub fn resolve(&self, owner: &Message, field: &Field) -> Result<String> {
        match self.classifier.classify(field)? {
            FieldKind::Timestamp if field.is_repeated() => Ok(format!("{STRING}[]")),
            FieldKind::Timestamp => Ok(STRING.to_string()),
            FieldKind::Map => self.resolve_map(owner, field),
            FieldKind::Repeated => Ok(format!("{}[]", self.element_type(owner, field)?)),
            FieldKind::Message | FieldKind::Scalar => self.element_type(owner, field),
        }
    }

    fn resolve_map(&self, owner: &Message, field: &Field) -> Result<String> {
        let entry = self.classifier.index.map_entry(
            field.type_ref.as_deref().unwrap_or_default(),
            &format!("field `{}.{}`", owner.name, field.name),
        )?;
        let (key, value) = (&entry.fields[0], &entry.fields[1]);
        let key_type = self.element_type(entry, key)?;
        let value_type = self.resolve(entry, value)?;
        Ok(format!("{{ [key: {key_type}]: {value_type} }}"))
    }

    /// Type of a single value, ignoring repetition.
    fn element_type(&self, owner: &Message, field: &Field) -> Result<String> {
        if field.type_ref.as_deref() == Some(self.classifier.config.timestamp_type.as_str()) {
            return Ok(STRING.to_string());
        }
        match field.tag {
            t if t.is_numeric() => Ok(NUMBER.to_string()),
            ScalarType::Bool => Ok(BOOLEAN.to_string()),
            ScalarType::String | ScalarType::Bytes => Ok(STRING.to_string()),
            _ => match field.type_ref.as_deref() {
                Some(type_ref) => Ok(short_name(type_ref).to_string()),
                None => Err(CodegenError::unresolved(
                    "<missing type name>",
                    format!("field `{}.{}`", owner.name, field.name),
                )),
            },
        }
    }
}
