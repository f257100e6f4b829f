//! Per-method client bindings.
//!
//! Each binding is an `async` arrow function that POSTs the JSON-encoded
//! input to `/<prefix>/<pkg.Service>/<Method>`, rejects any non-200 status
//! with the response's status text, and rebuilds the typed output from the
//! parsed body.

use crate::config::GeneratorConfig;
use crate::error::Result;
use crate::index::SchemaIndex;
use crate::render::Renderer;
use crate::schema::{short_name, Method, Service};
use crate::synth::{AccessPath, Synthesizer};

/// Name of the parsed response body inside the generated function.
pub const RESPONSE_ROOT: &str = "data";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub name: String,
    pub endpoint: String,
    pub input_type: String,
    pub output_type: String,
    /// Function body, one statement per line, indented one level.
    pub body: String,
}

impl Binding {
    pub fn render(&self) -> String {
        format!(
            "const {} = async (input: {}): Promise<{}> => {{\n{}}}\n",
            self.name, self.input_type, self.output_type, self.body
        )
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BindingGenerator<'i, 's> {
    index: &'i SchemaIndex<'s>,
    synth: Synthesizer<'i, 's>,
    config: &'i GeneratorConfig,
}

impl<'i, 's> BindingGenerator<'i, 's> {
    pub fn new(
        index: &'i SchemaIndex<'s>,
        synth: Synthesizer<'i, 's>,
        config: &'i GeneratorConfig,
    ) -> Self {
        Self {
            index,
            synth,
            config,
        }
    }

    /// `/<prefix>/<pkg.Service>/<Method>`
    pub fn endpoint(&self, package: &str, service: &Service, method: &Method) -> String {
        let prefix = self.config.transport_prefix.trim_matches('/');
        let service = service.qualified_name(package);
        if prefix.is_empty() {
            format!("/{service}/{}", method.name)
        } else {
            format!("/{prefix}/{service}/{}", method.name)
        }
    }

    pub fn bind(&self, package: &str, service: &Service, method: &Method) -> Result<Binding> {
        let context = format!("method `{}.{}`", service.name, method.name);
        self.index.message(&method.input_type, &context)?;
        self.index.message(&method.output_type, &context)?;

        let endpoint = self.endpoint(package, service, method);
        tracing::debug!(method = %method.name, %endpoint, "binding method");

        let mut r = Renderer::new(1);
        if let Some(csrf) = &self.config.csrf {
            r.line(&format!(
                "const token = document.querySelector('meta[name=\"{}\"]')?.getAttribute('content') || ''",
                csrf.meta_name
            ));
        }
        r.line(&format!("const res = await fetch('{endpoint}', {{"));
        r.indent();
        r.line("headers: {");
        r.indent();
        if let Some(csrf) = &self.config.csrf {
            r.line(&format!("'{}': token,", csrf.header));
        }
        r.line("'Content-Type': 'application/json'");
        r.dedent();
        r.line("},");
        r.line("credentials: 'same-origin',");
        r.line("method: 'POST',");
        r.line("body: JSON.stringify(input)");
        r.dedent();
        r.line("})");
        r.line("if (res.status !== 200) {");
        r.indent();
        r.line("throw new Error(res.statusText)");
        r.dedent();
        r.line("}");
        r.line(&format!("const {RESPONSE_ROOT} = await res.json()"));

        if self.config.is_passthrough(&method.output_type) {
            r.line(&format!("return {RESPONSE_ROOT}"));
        } else {
            let nodes = self
                .synth
                .emit_message(&method.output_type, &AccessPath::root(RESPONSE_ROOT))?;
            r.object("return ", &nodes, "");
        }

        Ok(Binding {
            name: method.name.clone(),
            endpoint,
            input_type: short_name(&method.input_type).to_string(),
            output_type: short_name(&method.output_type).to_string(),
            body: r.finish(),
        })
    }
}
