//! Generator configuration.
//!
//! A single [`GeneratorConfig`] value is threaded through every component.
//! It can be read from a JSON file (every key optional) and then adjusted
//! with protoc plugin parameters (`--twirpjs_opt=prefix=rpc,csrf=false`).

use crate::error::{CodegenError, Result};
use serde::Deserialize;
use std::collections::BTreeSet;

pub const DEFAULT_TIMESTAMP_TYPE: &str = ".google.protobuf.Timestamp";

/// Declarations and bindings carry Flow annotations.
pub const DEFAULT_HEADER: &str = "// @flow";

const WRAPPER_TYPES: &[&str] = &[
    ".google.protobuf.DoubleValue",
    ".google.protobuf.FloatValue",
    ".google.protobuf.Int64Value",
    ".google.protobuf.UInt64Value",
    ".google.protobuf.Int32Value",
    ".google.protobuf.UInt32Value",
    ".google.protobuf.BoolValue",
    ".google.protobuf.StringValue",
    ".google.protobuf.BytesValue",
];

const JSON_NATIVE_TYPES: &[&str] = &[
    ".google.protobuf.Any",
    ".google.protobuf.Struct",
    ".google.protobuf.Value",
    ".google.protobuf.ListValue",
];

const OTHER_WELL_KNOWN_TYPES: &[&str] = &[
    ".google.protobuf.Timestamp",
    ".google.protobuf.Duration",
    ".google.protobuf.Empty",
    ".google.protobuf.FieldMask",
    ".google.protobuf.NullValue",
];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// First endpoint path segment (`/twirp/pkg.Service/Method`).
    pub transport_prefix: String,
    /// CSRF token hook; `None` omits the header entirely.
    pub csrf: Option<CsrfConfig>,
    pub schema_extension: String,
    pub target_extension: String,
    /// First line of every artifact; `None` omits it.
    pub header: Option<String>,
    pub timestamp_type: String,
    pub map_entry_suffix: String,
    /// Qualified names assumed to exist in the target runtime; no
    /// declaration is generated for them.
    pub builtin_types: BTreeSet<String>,
    /// Qualified output types returned exactly as parsed from the response.
    pub passthrough_types: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CsrfConfig {
    /// `name` attribute of the `<meta>` tag holding the token.
    pub meta_name: String,
    pub header: String,
}

impl Default for CsrfConfig {
    fn default() -> Self {
        Self {
            meta_name: "csrf-token".to_string(),
            header: "X-CSRF-Token".to_string(),
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        let builtin_types = WRAPPER_TYPES
            .iter()
            .chain(JSON_NATIVE_TYPES)
            .chain(OTHER_WELL_KNOWN_TYPES)
            .map(|s| s.to_string())
            .collect();
        let passthrough_types = WRAPPER_TYPES
            .iter()
            .chain(JSON_NATIVE_TYPES)
            .map(|s| s.to_string())
            .collect();

        Self {
            transport_prefix: "twirp".to_string(),
            csrf: Some(CsrfConfig::default()),
            schema_extension: ".proto".to_string(),
            target_extension: ".js".to_string(),
            header: Some(DEFAULT_HEADER.to_string()),
            timestamp_type: DEFAULT_TIMESTAMP_TYPE.to_string(),
            map_entry_suffix: "Entry".to_string(),
            builtin_types,
            passthrough_types,
        }
    }
}

impl GeneratorConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| CodegenError::InvalidConfig(format!("config JSON: {e}")))
    }

    pub fn is_builtin(&self, qualified: &str) -> bool {
        self.builtin_types.contains(qualified)
    }

    pub fn is_passthrough(&self, qualified: &str) -> bool {
        self.passthrough_types.contains(qualified)
    }

    /// Apply a protoc plugin parameter string: comma-separated `key=value`
    /// pairs. Set-valued keys take `+`-separated qualified names and extend
    /// the current set; a leading `-` on a name removes it instead.
    pub fn apply_parameter(&mut self, parameter: &str) -> Result<()> {
        for part in parameter.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| CodegenError::InvalidConfig(format!("expected key=value, got `{part}`")))?;
            let value = value.trim();
            match key.trim() {
                "prefix" => self.transport_prefix = value.trim_matches('/').to_string(),
                "csrf" => match value {
                    "true" => {
                        if self.csrf.is_none() {
                            self.csrf = Some(CsrfConfig::default());
                        }
                    }
                    "false" => self.csrf = None,
                    other => {
                        return Err(CodegenError::InvalidConfig(format!(
                            "csrf expects true/false, got `{other}`"
                        )))
                    }
                },
                "csrf_meta" => {
                    self.csrf.get_or_insert_with(CsrfConfig::default).meta_name = value.to_string()
                }
                "extension" => self.target_extension = normalize_extension(value),
                "schema_extension" => self.schema_extension = normalize_extension(value),
                "header" => {
                    self.header = (!value.is_empty()).then(|| value.to_string());
                }
                "timestamp" => self.timestamp_type = value.to_string(),
                "builtin" => edit_set(&mut self.builtin_types, value),
                "passthrough" => edit_set(&mut self.passthrough_types, value),
                other => {
                    return Err(CodegenError::InvalidConfig(format!(
                        "unknown parameter `{other}`"
                    )))
                }
            }
        }
        Ok(())
    }
}

fn normalize_extension(value: &str) -> String {
    if value.starts_with('.') {
        value.to_string()
    } else {
        format!(".{value}")
    }
}

fn edit_set(set: &mut BTreeSet<String>, value: &str) {
    for name in value.split('+').map(str::trim).filter(|s| !s.is_empty()) {
        if let Some(removed) = name.strip_prefix('-') {
            set.remove(removed);
        } else {
            set.insert(name.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_reserve_well_known_types() {
        let cfg = GeneratorConfig::default();
        assert!(cfg.is_builtin(".google.protobuf.StringValue"));
        assert!(cfg.is_builtin(".google.protobuf.Timestamp"));
        assert!(cfg.is_passthrough(".google.protobuf.Struct"));
        assert!(!cfg.is_passthrough(".google.protobuf.Timestamp"));
        assert_eq!(cfg.transport_prefix, "twirp");
        assert!(cfg.csrf.is_some());
        assert_eq!(cfg.header.as_deref(), Some("// @flow"));
    }

    #[test]
    fn header_can_be_replaced_or_dropped() -> Result<()> {
        let mut cfg = GeneratorConfig::default();
        cfg.apply_parameter("header=// @ts-nocheck")?;
        assert_eq!(cfg.header.as_deref(), Some("// @ts-nocheck"));
        cfg.apply_parameter("header=")?;
        assert_eq!(cfg.header, None);

        let cfg = GeneratorConfig::from_json(r#"{ "header": null }"#)?;
        assert_eq!(cfg.header, None);
        Ok(())
    }

    #[test]
    fn parameter_overrides() -> Result<()> {
        let mut cfg = GeneratorConfig::default();
        cfg.apply_parameter("prefix=/rpc/, csrf=false, extension=ts, passthrough=.acme.Blob+-.google.protobuf.Any")?;
        assert_eq!(cfg.transport_prefix, "rpc");
        assert!(cfg.csrf.is_none());
        assert_eq!(cfg.target_extension, ".ts");
        assert!(cfg.is_passthrough(".acme.Blob"));
        assert!(!cfg.is_passthrough(".google.protobuf.Any"));
        Ok(())
    }

    #[test]
    fn parameter_rejects_unknown_keys() {
        let mut cfg = GeneratorConfig::default();
        let err = cfg.apply_parameter("colour=blue").unwrap_err();
        assert!(matches!(err, CodegenError::InvalidConfig(_)));
        assert!(cfg.apply_parameter("novalue").is_err());
        assert!(cfg.apply_parameter("csrf=maybe").is_err());
    }

    #[test]
    fn json_config_fills_missing_keys_with_defaults() -> Result<()> {
        let cfg = GeneratorConfig::from_json(r#"{ "transport_prefix": "api", "csrf": null }"#)?;
        assert_eq!(cfg.transport_prefix, "api");
        assert!(cfg.csrf.is_none());
        assert_eq!(cfg.map_entry_suffix, "Entry");
        assert!(cfg.is_builtin(".google.protobuf.Empty"));
        Ok(())
    }
}
