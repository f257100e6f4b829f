//! protoc plugin mode.
//!
//! protoc writes a `CodeGeneratorRequest` to stdin and expects a
//! `CodeGeneratorResponse` on stdout. Requests that cannot be decoded are a
//! hard failure (non-zero exit); generation failures are returned inside the
//! response so protoc can attribute them to the input files.

use anyhow::{Context, Result};
use std::io::{self, Read, Write};
use twirpjs_codegen::descriptor::{decode_plugin_request, encode_plugin_response};
use twirpjs_codegen::{generate_all, GeneratorConfig};

pub fn run(base: GeneratorConfig) -> Result<()> {
    let mut input = Vec::new();
    io::stdin()
        .read_to_end(&mut input)
        .context("failed to read CodeGeneratorRequest from stdin")?;

    let response = respond(&input, base)?;

    let mut stdout = io::stdout().lock();
    stdout
        .write_all(&response)
        .context("failed to write CodeGeneratorResponse")?;
    stdout.flush()?;
    Ok(())
}

/// Encoded response for one encoded request.
pub fn respond(request: &[u8], mut config: GeneratorConfig) -> Result<Vec<u8>> {
    let request = decode_plugin_request(request).context("failed to decode CodeGeneratorRequest")?;
    tracing::debug!(
        files = request.files_to_generate.len(),
        parameter = ?request.parameter,
        "plugin request"
    );

    let outcome = match request.parameter.as_deref() {
        Some(parameter) => config.apply_parameter(parameter),
        None => Ok(()),
    }
    .and_then(|()| generate_all(&request.schema, &request.files_to_generate, &config));

    if let Err(e) = &outcome {
        tracing::error!(error = %e, "generation failed");
    }
    Ok(encode_plugin_response(outcome))
}
