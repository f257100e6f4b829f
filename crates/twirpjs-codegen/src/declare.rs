//! Type declarations for every generated message and enum.

use crate::error::Result;
use crate::index::SchemaIndex;
use crate::schema::{qualify_type_name, Enum, Message, Schema};
use crate::types::TypeResolver;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Declaration {
    /// `export type Name = { field: type, ... }`
    Object {
        name: String,
        qualified: String,
        fields: Vec<(String, String)>,
    },
    /// `export type Name = "A" | "B"`
    Enum {
        name: String,
        qualified: String,
        values: Vec<String>,
    },
}

impl Declaration {
    pub fn name(&self) -> &str {
        match self {
            Self::Object { name, .. } | Self::Enum { name, .. } => name,
        }
    }

    pub fn qualified(&self) -> &str {
        match self {
            Self::Object { qualified, .. } | Self::Enum { qualified, .. } => qualified,
        }
    }

    pub fn render(&self) -> String {
        match self {
            Self::Object { name, fields, .. } if fields.is_empty() => {
                format!("export type {name} = {{}}\n")
            }
            Self::Object { name, fields, .. } => {
                let body = fields
                    .iter()
                    .map(|(field, ty)| format!("  {field}: {ty}"))
                    .collect::<Vec<_>>()
                    .join(",\n");
                format!("export type {name} = {{\n{body}\n}}\n")
            }
            Self::Enum { name, values, .. } if values.is_empty() => {
                format!("export type {name} = string\n")
            }
            Self::Enum { name, values, .. } => {
                let union = values
                    .iter()
                    .map(|v| format!("\"{v}\""))
                    .collect::<Vec<_>>()
                    .join(" | ");
                format!("export type {name} = {union}\n")
            }
        }
    }
}

/// Collect declarations in schema order: each message, then its nested
/// types, then the file's enums. Map entries are skipped; built-in names are
/// filtered later by the assembler.
pub fn collect(
    schema: &Schema,
    index: &SchemaIndex<'_>,
    resolver: &TypeResolver<'_, '_>,
) -> Result<Vec<Declaration>> {
    let mut out = Vec::new();
    for file in &schema.files {
        for message in &file.messages {
            let qualified = qualify_type_name(&file.package, &message.name);
            collect_message(&qualified, message, index, resolver, &mut out)?;
        }
        for e in &file.enums {
            push_enum(qualify_type_name(&file.package, &e.name), e, &mut out);
        }
    }
    Ok(out)
}

fn collect_message(
    qualified: &str,
    message: &Message,
    index: &SchemaIndex<'_>,
    resolver: &TypeResolver<'_, '_>,
    out: &mut Vec<Declaration>,
) -> Result<()> {
    if index.is_map_entry(qualified, message) {
        return Ok(());
    }
    let fields = message
        .fields
        .iter()
        .map(|f| Ok((f.name.clone(), resolver.resolve(message, f)?)))
        .collect::<Result<Vec<_>>>()?;
    out.push(Declaration::Object {
        name: message.name.clone(),
        qualified: qualified.to_string(),
        fields,
    });
    for nested in &message.nested {
        let nested_qualified = format!("{qualified}.{}", nested.name);
        collect_message(&nested_qualified, nested, index, resolver, out)?;
    }
    for e in &message.enums {
        push_enum(format!("{qualified}.{}", e.name), e, out);
    }
    Ok(())
}

fn push_enum(qualified: String, e: &Enum, out: &mut Vec<Declaration>) {
    out.push(Declaration::Enum {
        name: e.name.clone(),
        qualified,
        values: e.values.clone(),
    });
}
