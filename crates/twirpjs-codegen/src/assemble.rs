//! Final artifact assembly.

use crate::binding::Binding;
use crate::config::GeneratorConfig;
use crate::declare::Declaration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedArtifact {
    pub name: String,
    pub content: String,
}

/// Replace the schema extension with the target extension; a name without
/// the schema extension gets the target extension appended.
pub fn output_file_name(source: &str, config: &GeneratorConfig) -> String {
    let stem = source
        .strip_suffix(config.schema_extension.as_str())
        .unwrap_or(source);
    format!("{stem}{}", config.target_extension)
}

/// `export {A, B}`
pub fn export_manifest(bindings: &[Binding]) -> String {
    let names = bindings
        .iter()
        .map(|b| b.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    format!("export {{{names}}}\n")
}

pub fn assemble(
    declarations: &[Declaration],
    bindings: &[Binding],
    source_file_name: &str,
    config: &GeneratorConfig,
) -> GeneratedArtifact {
    let mut blocks: Vec<String> = Vec::new();
    if let Some(header) = &config.header {
        blocks.push(format!("{header}\n"));
    }
    blocks.extend(
        declarations
            .iter()
            .filter(|d| !config.is_builtin(d.qualified()))
            .map(Declaration::render),
    );
    blocks.extend(bindings.iter().map(Binding::render));
    blocks.push(export_manifest(bindings));

    GeneratedArtifact {
        name: output_file_name(source_file_name, config),
        content: blocks.join("\n"),
    }
}
