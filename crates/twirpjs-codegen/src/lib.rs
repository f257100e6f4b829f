//! Schema-driven JavaScript client generation for Twirp-style RPC services.
//!
//! The pipeline for one `.proto` file:
//!
//! - decode the schema ([`descriptor`]) and index every qualified name ([`index`])
//! - classify fields ([`classify`]) and resolve their annotations ([`types`])
//! - build the defaulting tree for each method's output ([`synth`]) and render
//!   it ([`render`]) inside a `fetch` binding ([`binding`])
//! - concatenate declarations, bindings and the export manifest ([`assemble`])
//!
//! Everything is synchronous and deterministic: the same schema and config
//! always produce byte-identical output.

pub mod assemble;
pub mod binding;
pub mod classify;
pub mod config;
pub mod declare;
pub mod descriptor;
pub mod error;
pub mod index;
pub mod render;
pub mod schema;
pub mod synth;
pub mod types;

pub use assemble::GeneratedArtifact;
pub use config::{CsrfConfig, GeneratorConfig};
pub use error::{CodegenError, Result};
pub use schema::Schema;

use crate::binding::BindingGenerator;
use crate::classify::Classifier;
use crate::index::SchemaIndex;
use crate::synth::Synthesizer;
use crate::types::TypeResolver;

/// Generate the client module for `file_to_generate`.
///
/// Declarations cover every type in `schema` (imports included, built-ins
/// excluded); bindings cover the unary methods of the designated file only.
/// Streaming methods have no request/response mapping and are skipped.
pub fn generate(
    schema: &Schema,
    file_to_generate: &str,
    config: &GeneratorConfig,
) -> Result<GeneratedArtifact> {
    let file = schema
        .file(file_to_generate)
        .ok_or_else(|| CodegenError::UnknownFile(file_to_generate.to_string()))?;

    let index = SchemaIndex::build(schema, config)?;
    let classifier = Classifier::new(&index, config);
    let declarations = declare::collect(schema, &index, &TypeResolver::new(classifier))?;
    let generator = BindingGenerator::new(&index, Synthesizer::new(classifier), config);

    let mut bindings = Vec::new();
    for service in &file.services {
        for method in &service.methods {
            if method.is_streaming() {
                tracing::warn!(
                    service = %service.name,
                    method = %method.name,
                    "skipping streaming method"
                );
                continue;
            }
            bindings.push(generator.bind(&file.package, service, method)?);
        }
    }

    let artifact = assemble::assemble(&declarations, &bindings, &file.name, config);
    tracing::info!(
        file = %file.name,
        output = %artifact.name,
        declarations = declarations.len(),
        bindings = bindings.len(),
        "generated client"
    );
    Ok(artifact)
}

/// [`generate`] for each file in order; stops at the first failure.
pub fn generate_all<S: AsRef<str>>(
    schema: &Schema,
    files_to_generate: &[S],
    config: &GeneratorConfig,
) -> Result<Vec<GeneratedArtifact>> {
    files_to_generate
        .iter()
        .map(|f| generate(schema, f.as_ref(), config))
        .collect()
}
