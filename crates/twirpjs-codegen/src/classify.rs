//! Field classification.
//!
//! Every field falls into exactly one [`FieldKind`]. The precedence lives in
//! [`RULES`] and is evaluated top to bottom; the first matching rule wins.
//! Maps are encoded as repeated entry messages, so the map rule must stay
//! ahead of the repeated rule.

use crate::config::GeneratorConfig;
use crate::error::Result;
use crate::index::SchemaIndex;
use crate::schema::Field;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Timestamp,
    Map,
    Repeated,
    Message,
    Scalar,
}

type Predicate = fn(&SchemaIndex<'_>, &GeneratorConfig, &Field) -> Result<bool>;

/// Ordered precedence table.
pub const RULES: &[(FieldKind, Predicate)] = &[
    (FieldKind::Timestamp, is_timestamp),
    (FieldKind::Map, is_map),
    (FieldKind::Repeated, is_repeated),
    (FieldKind::Message, is_message),
    (FieldKind::Scalar, always),
];

fn is_timestamp(_: &SchemaIndex<'_>, config: &GeneratorConfig, f: &Field) -> Result<bool> {
    Ok(f.type_ref.as_deref() == Some(config.timestamp_type.as_str()))
}

/// Maps are encoded as `repeated <Name>Entry`; a singular reference is never
/// a map, whatever the target looks like.
fn is_map(index: &SchemaIndex<'_>, _: &GeneratorConfig, f: &Field) -> Result<bool> {
    if !f.is_repeated() || !f.tag.is_message_like() {
        return Ok(false);
    }
    let Some(type_ref) = f.type_ref.as_deref() else {
        return Ok(false);
    };
    let message = index.message(type_ref, &format!("field `{}`", f.name))?;
    Ok(index.is_map_entry(type_ref, message))
}

fn is_repeated(_: &SchemaIndex<'_>, _: &GeneratorConfig, f: &Field) -> Result<bool> {
    Ok(f.is_repeated())
}

fn is_message(_: &SchemaIndex<'_>, _: &GeneratorConfig, f: &Field) -> Result<bool> {
    Ok(f.tag.is_message_like())
}

fn always(_: &SchemaIndex<'_>, _: &GeneratorConfig, _: &Field) -> Result<bool> {
    Ok(true)
}

#[derive(Debug, Clone, Copy)]
pub struct Classifier<'i, 's> {
    pub index: &'i SchemaIndex<'s>,
    pub config: &'i GeneratorConfig,
}

impl<'i, 's> Classifier<'i, 's> {
    pub fn new(index: &'i SchemaIndex<'s>, config: &'i GeneratorConfig) -> Self {
        Self { index, config }
    }

    pub fn classify(&self, field: &Field) -> Result<FieldKind> {
        for (kind, matches) in RULES {
            if matches(self.index, self.config, field)? {
                return Ok(*kind);
            }
        }
        Ok(FieldKind::Scalar)
    }
}
