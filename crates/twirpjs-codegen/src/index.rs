//! Qualified-name lookup over a [`Schema`].
//!
//! Built once per generation run, then only read. Lookups of unknown names
//! fail at the point of use with [`CodegenError::SchemaResolution`]; nothing
//! is validated up front.

use crate::config::GeneratorConfig;
use crate::error::{CodegenError, Result};
use crate::schema::{qualify_type_name, Enum, Message, Schema};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug)]
pub struct SchemaIndex<'a> {
    messages: BTreeMap<String, &'a Message>,
    enums: BTreeMap<String, &'a Enum>,
    /// Messages declared inside another message.
    nested: BTreeSet<String>,
    map_entry_suffix: String,
}

impl<'a> SchemaIndex<'a> {
    pub fn build(schema: &'a Schema, config: &GeneratorConfig) -> Result<Self> {
        let mut index = Self {
            messages: BTreeMap::new(),
            enums: BTreeMap::new(),
            nested: BTreeSet::new(),
            map_entry_suffix: config.map_entry_suffix.clone(),
        };

        for file in &schema.files {
            for message in &file.messages {
                index.register_message(qualify_type_name(&file.package, &message.name), message)?;
            }
            for e in &file.enums {
                index.register_enum(qualify_type_name(&file.package, &e.name), e)?;
            }
        }

        tracing::debug!(
            messages = index.messages.len(),
            enums = index.enums.len(),
            "schema index built"
        );
        Ok(index)
    }

    fn register_message(&mut self, qualified: String, message: &'a Message) -> Result<()> {
        for nested in &message.nested {
            let nested_qualified = format!("{qualified}.{}", nested.name);
            self.nested.insert(nested_qualified.clone());
            self.register_message(nested_qualified, nested)?;
        }
        for e in &message.enums {
            self.register_enum(format!("{qualified}.{}", e.name), e)?;
        }
        if self.messages.insert(qualified.clone(), message).is_some()
            || self.enums.contains_key(&qualified)
        {
            return Err(CodegenError::DuplicateType(qualified));
        }
        Ok(())
    }

    fn register_enum(&mut self, qualified: String, e: &'a Enum) -> Result<()> {
        if self.enums.insert(qualified.clone(), e).is_some() || self.messages.contains_key(&qualified)
        {
            return Err(CodegenError::DuplicateType(qualified));
        }
        Ok(())
    }

    /// Resolve a message by qualified name; `context` names the referrer for
    /// the error message.
    pub fn message(&self, qualified: &str, context: &str) -> Result<&'a Message> {
        self.messages
            .get(qualified)
            .copied()
            .ok_or_else(|| CodegenError::unresolved(qualified, context))
    }

    /// Resolve the entry message behind a map field, checking its key/value
    /// shape.
    pub fn map_entry(&self, qualified: &str, context: &str) -> Result<&'a Message> {
        let entry = self.message(qualified, context)?;
        if entry.fields.len() != 2 {
            return Err(CodegenError::InvalidMapEntry(qualified.to_string()));
        }
        Ok(entry)
    }

    pub fn get_enum(&self, qualified: &str) -> Option<&'a Enum> {
        self.enums.get(qualified).copied()
    }

    pub fn contains(&self, qualified: &str) -> bool {
        self.messages.contains_key(qualified) || self.enums.contains_key(qualified)
    }

    /// A synthetic map entry. The descriptor flag decides when set; without
    /// it, only a nested `<Name><suffix>` message with exactly a `key` and a
    /// `value` field qualifies.
    pub fn is_map_entry(&self, qualified: &str, message: &Message) -> bool {
        if message.map_entry {
            return true;
        }
        self.nested.contains(qualified)
            && qualified.ends_with(&self.map_entry_suffix)
            && matches!(
                message.fields.as_slice(),
                [key, value] if key.name == "key" && value.name == "value"
            )
    }

    /// Message names in index order (sorted by qualified name).
    pub fn message_names(&self) -> impl Iterator<Item = &str> {
        self.messages.keys().map(String::as_str)
    }
}
