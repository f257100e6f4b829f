//! Schema decoding and response encoding.
//!
//! Two transports deliver the same descriptor data:
//!
//! - a protoc plugin `CodeGeneratorRequest` (binary, on stdin), decoded with
//!   `prost-types`;
//! - a `FileDescriptorSet`, either binary or rendered as JSON by
//!   `buf build --as-file-descriptor-set -o descriptor.json`.
//!
//! Both end up as a [`Schema`]. Anything the generator does not use
//! (options other than `map_entry`, source info, oneofs) is ignored.

use crate::assemble::GeneratedArtifact;
use crate::error::{CodegenError, Result};
use crate::schema::{Enum, Field, File, Label, Message, Method, ScalarType, Schema, Service};
use prost::Message as _;
use prost_types::compiler::{code_generator_response, CodeGeneratorRequest, CodeGeneratorResponse};
use prost_types::field_descriptor_proto::{Label as ProtoLabel, Type as ProtoType};
use prost_types::{
    DescriptorProto, EnumDescriptorProto, FieldDescriptorProto, FileDescriptorProto,
    FileDescriptorSet, ServiceDescriptorProto,
};
use serde::Deserialize;

// =============================================================================
// protoc plugin transport
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginRequest {
    pub schema: Schema,
    pub files_to_generate: Vec<String>,
    pub parameter: Option<String>,
}

pub fn decode_plugin_request(bytes: &[u8]) -> Result<PluginRequest> {
    let request = CodeGeneratorRequest::decode(bytes)
        .map_err(|e| CodegenError::MalformedInput(format!("CodeGeneratorRequest: {e}")))?;
    Ok(PluginRequest {
        schema: schema_from_descriptors(&request.proto_file)?,
        files_to_generate: request.file_to_generate,
        parameter: request.parameter,
    })
}

/// Encode a plugin response. Generation failures travel in the response's
/// `error` field, which protoc reports against the input files.
pub fn encode_plugin_response(outcome: Result<Vec<GeneratedArtifact>>) -> Vec<u8> {
    let response = match outcome {
        Ok(artifacts) => CodeGeneratorResponse {
            supported_features: Some(
                code_generator_response::Feature::Proto3Optional as u64,
            ),
            file: artifacts
                .into_iter()
                .map(|a| code_generator_response::File {
                    name: Some(a.name),
                    content: Some(a.content),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        },
        Err(e) => CodeGeneratorResponse {
            error: Some(e.to_string()),
            ..Default::default()
        },
    };
    response.encode_to_vec()
}

/// Binary `FileDescriptorSet` (`buf build -o set.binpb`, `protoc -o`).
pub fn decode_descriptor_set(bytes: &[u8]) -> Result<Schema> {
    let set = FileDescriptorSet::decode(bytes)
        .map_err(|e| CodegenError::MalformedInput(format!("FileDescriptorSet: {e}")))?;
    schema_from_descriptors(&set.file)
}

pub fn schema_from_descriptors(files: &[FileDescriptorProto]) -> Result<Schema> {
    files.iter().map(file_from_descriptor).collect::<Result<Vec<_>>>().map(Schema::new)
}

fn file_from_descriptor(f: &FileDescriptorProto) -> Result<File> {
    Ok(File {
        name: f.name().to_string(),
        package: f.package().to_string(),
        messages: f
            .message_type
            .iter()
            .map(message_from_descriptor)
            .collect::<Result<_>>()?,
        enums: f.enum_type.iter().map(enum_from_descriptor).collect(),
        services: f.service.iter().map(service_from_descriptor).collect(),
    })
}

fn message_from_descriptor(m: &DescriptorProto) -> Result<Message> {
    Ok(Message {
        name: m.name().to_string(),
        fields: m
            .field
            .iter()
            .map(field_from_descriptor)
            .collect::<Result<_>>()?,
        nested: m
            .nested_type
            .iter()
            .map(message_from_descriptor)
            .collect::<Result<_>>()?,
        enums: m.enum_type.iter().map(enum_from_descriptor).collect(),
        map_entry: m.options.as_ref().is_some_and(|o| o.map_entry()),
    })
}

fn field_from_descriptor(f: &FieldDescriptorProto) -> Result<Field> {
    if f.r#type.is_none() && f.type_name.is_none() {
        return Err(CodegenError::MalformedInput(format!(
            "field `{}` has neither a type nor a type name",
            f.name()
        )));
    }
    // protoc may leave `type` unset for message/enum references resolved
    // later; a type name alone means a message.
    let tag = if f.r#type.is_none() {
        ScalarType::Message
    } else {
        scalar_from_proto(f.r#type())
    };
    Ok(Field {
        name: f.name().to_string(),
        tag,
        type_ref: f.type_name.clone().filter(|t| !t.is_empty()),
        label: if f.label() == ProtoLabel::Repeated {
            Label::Repeated
        } else {
            Label::Singular
        },
    })
}

fn scalar_from_proto(t: ProtoType) -> ScalarType {
    match t {
        ProtoType::Double => ScalarType::Double,
        ProtoType::Float => ScalarType::Float,
        ProtoType::Int64 => ScalarType::Int64,
        ProtoType::Uint64 => ScalarType::Uint64,
        ProtoType::Int32 => ScalarType::Int32,
        ProtoType::Fixed64 => ScalarType::Fixed64,
        ProtoType::Fixed32 => ScalarType::Fixed32,
        ProtoType::Bool => ScalarType::Bool,
        ProtoType::String => ScalarType::String,
        ProtoType::Group => ScalarType::Group,
        ProtoType::Message => ScalarType::Message,
        ProtoType::Bytes => ScalarType::Bytes,
        ProtoType::Uint32 => ScalarType::Uint32,
        ProtoType::Enum => ScalarType::Enum,
        ProtoType::Sfixed32 => ScalarType::Sfixed32,
        ProtoType::Sfixed64 => ScalarType::Sfixed64,
        ProtoType::Sint32 => ScalarType::Sint32,
        ProtoType::Sint64 => ScalarType::Sint64,
    }
}

fn enum_from_descriptor(e: &EnumDescriptorProto) -> Enum {
    Enum::new(e.name(), e.value.iter().map(|v| v.name().to_string()))
}

fn service_from_descriptor(s: &ServiceDescriptorProto) -> Service {
    Service {
        name: s.name().to_string(),
        methods: s
            .method
            .iter()
            .map(|m| Method {
                name: m.name().to_string(),
                input_type: m.input_type().to_string(),
                output_type: m.output_type().to_string(),
                client_streaming: m.client_streaming(),
                server_streaming: m.server_streaming(),
            })
            .collect(),
    }
}

// =============================================================================
// Buf descriptor set JSON
// =============================================================================

pub fn decode_descriptor_set_json(text: &str) -> Result<Schema> {
    let set: JsonSet = serde_json::from_str(text)
        .map_err(|e| CodegenError::MalformedInput(format!("descriptor set JSON: {e}")))?;
    set.file
        .into_iter()
        .map(JsonFile::into_file)
        .collect::<Result<Vec<_>>>()
        .map(Schema::new)
}

// Only the keys the generator reads; serde skips the rest (`number`,
// `jsonName`, `sourceCodeInfo`, extension options).

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct JsonSet {
    file: Vec<JsonFile>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct JsonFile {
    name: String,
    package: String,
    message_type: Vec<JsonMessage>,
    enum_type: Vec<JsonEnum>,
    service: Vec<JsonService>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct JsonMessage {
    name: String,
    field: Vec<JsonField>,
    nested_type: Vec<JsonMessage>,
    enum_type: Vec<JsonEnum>,
    options: JsonMessageOptions,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct JsonMessageOptions {
    map_entry: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct JsonField {
    name: String,
    label: JsonLabel,
    r#type: Option<String>,
    type_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
enum JsonLabel {
    #[serde(rename = "LABEL_REPEATED")]
    Repeated,
    #[default]
    #[serde(other)]
    Singular,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct JsonEnum {
    name: String,
    value: Vec<JsonEnumValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct JsonEnumValue {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct JsonService {
    name: String,
    method: Vec<JsonMethod>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct JsonMethod {
    name: String,
    input_type: String,
    output_type: String,
    client_streaming: bool,
    server_streaming: bool,
}

fn required(value: String, what: impl FnOnce() -> String) -> Result<String> {
    if value.is_empty() {
        return Err(CodegenError::MalformedInput(format!("{} is missing", what())));
    }
    Ok(value)
}

fn convert_all<T, U>(items: Vec<T>, f: impl FnMut(T) -> Result<U>) -> Result<Vec<U>> {
    items.into_iter().map(f).collect()
}

impl JsonFile {
    fn into_file(self) -> Result<File> {
        Ok(File {
            name: required(self.name, || "file name".to_string())?,
            package: self.package,
            messages: convert_all(self.message_type, JsonMessage::into_message)?,
            enums: convert_all(self.enum_type, JsonEnum::into_enum)?,
            services: convert_all(self.service, JsonService::into_service)?,
        })
    }
}

impl JsonMessage {
    fn into_message(self) -> Result<Message> {
        let name = required(self.name, || "message name".to_string())?;
        Ok(Message {
            fields: convert_all(self.field, |f| f.into_field(&name))?,
            nested: convert_all(self.nested_type, Self::into_message)?,
            enums: convert_all(self.enum_type, JsonEnum::into_enum)?,
            map_entry: self.options.map_entry,
            name,
        })
    }
}

impl JsonField {
    fn into_field(self, message: &str) -> Result<Field> {
        let name = required(self.name, || format!("name of a field in `{message}`"))?;
        let tag = match (self.r#type.as_deref(), &self.type_name) {
            (Some(t), _) => ScalarType::parse(t).ok_or_else(|| {
                CodegenError::MalformedInput(format!(
                    "field `{message}.{name}` has unknown type `{t}`"
                ))
            })?,
            // A bare type name is a message reference protoc has not tagged.
            (None, Some(_)) => ScalarType::Message,
            (None, None) => {
                return Err(CodegenError::MalformedInput(format!(
                    "field `{message}.{name}` has neither a type nor a type name"
                )))
            }
        };
        Ok(Field {
            name,
            tag,
            type_ref: self.type_name.filter(|t| !t.is_empty()),
            label: match self.label {
                JsonLabel::Repeated => Label::Repeated,
                JsonLabel::Singular => Label::Singular,
            },
        })
    }
}

impl JsonEnum {
    fn into_enum(self) -> Result<Enum> {
        let name = required(self.name, || "enum name".to_string())?;
        let values = convert_all(self.value, |v| {
            required(v.name, || format!("name of a value in enum `{name}`"))
        })?;
        Ok(Enum { name, values })
    }
}

impl JsonService {
    fn into_service(self) -> Result<Service> {
        let name = required(self.name, || "service name".to_string())?;
        let methods = convert_all(self.method, |m| {
            let method = required(m.name, || format!("name of a method in `{name}`"))?;
            Ok(Method {
                input_type: required(m.input_type, || format!("input type of `{name}.{method}`"))?,
                output_type: required(m.output_type, || {
                    format!("output type of `{name}.{method}`")
                })?,
                client_streaming: m.client_streaming,
                server_streaming: m.server_streaming,
                name: method,
            })
        })?;
        Ok(Service { name, methods })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message as _;
    use prost_types::{EnumValueDescriptorProto, MessageOptions, MethodDescriptorProto};

    const DESCRIPTOR_JSON: &str = r#"{
      "file": [{
        "name": "acme/user.proto",
        "package": "acme",
        "messageType": [{
          "name": "User",
          "field": [
            { "name": "name", "number": 1, "label": "LABEL_OPTIONAL", "type": "TYPE_STRING", "jsonName": "name" },
            { "name": "meta", "number": 2, "label": "LABEL_REPEATED", "type": "TYPE_MESSAGE", "typeName": ".acme.User.MetaEntry" },
            { "name": "role", "number": 3, "label": "LABEL_OPTIONAL", "type": "TYPE_ENUM", "typeName": ".acme.Role" }
          ],
          "nestedType": [{
            "name": "MetaEntry",
            "field": [
              { "name": "key", "number": 1, "label": "LABEL_OPTIONAL", "type": "TYPE_STRING" },
              { "name": "value", "number": 2, "label": "LABEL_OPTIONAL", "type": "TYPE_STRING" }
            ],
            "options": { "mapEntry": true }
          }]
        }],
        "enumType": [{ "name": "Role", "value": [{ "name": "ADMIN", "number": 0 }, { "name": "GUEST", "number": 1 }] }],
        "service": [{
          "name": "Users",
          "method": [{ "name": "GetUser", "inputType": ".acme.User", "outputType": ".acme.User", "options": {} }]
        }],
        "syntax": "proto3"
      }]
    }"#;

    #[test]
    fn decodes_buf_descriptor_json() -> Result<()> {
        let schema = decode_descriptor_set_json(DESCRIPTOR_JSON)?;
        let file = schema.file("acme/user.proto").expect("file present");
        assert_eq!(file.package, "acme");
        let user = &file.messages[0];
        assert_eq!(user.fields.len(), 3);
        assert_eq!(user.fields[1].label, Label::Repeated);
        assert_eq!(user.fields[1].type_ref.as_deref(), Some(".acme.User.MetaEntry"));
        assert!(user.nested[0].map_entry);
        assert_eq!(user.fields[2].tag, ScalarType::Enum);
        assert_eq!(file.enums[0].values, vec!["ADMIN", "GUEST"]);
        assert_eq!(file.services[0].methods[0].output_type, ".acme.User");
        Ok(())
    }

    #[test]
    fn rejects_malformed_json() {
        let err = decode_descriptor_set_json("{ not json").unwrap_err();
        assert!(matches!(err, CodegenError::MalformedInput(_)));

        let bad_type = r#"{ "file": [{ "name": "a.proto", "messageType": [{ "name": "A", "field": [{ "name": "x", "type": "TYPE_QUATERNION" }] }] }] }"#;
        let err = decode_descriptor_set_json(bad_type).unwrap_err();
        assert!(err.to_string().contains("TYPE_QUATERNION"), "err={err}");

        let no_input = r#"{ "file": [{ "name": "a.proto", "service": [{ "name": "S", "method": [{ "name": "M", "outputType": ".A" }] }] }] }"#;
        let err = decode_descriptor_set_json(no_input).unwrap_err();
        assert_eq!(
            err,
            CodegenError::MalformedInput("input type of `S.M` is missing".to_string())
        );
    }

    #[test]
    fn unknown_labels_and_options_are_singular_defaults() -> Result<()> {
        let text = r#"{ "file": [{ "name": "a.proto", "messageType": [{
            "name": "A",
            "field": [{ "name": "x", "label": "LABEL_REQUIRED", "type": "TYPE_BOOL" }],
            "options": { "deprecated": true }
        }] }] }"#;
        let schema = decode_descriptor_set_json(text)?;
        let a = &schema.files[0].messages[0];
        assert_eq!(a.fields[0].label, Label::Singular);
        assert!(!a.map_entry);
        Ok(())
    }

    fn user_file() -> FileDescriptorProto {
        FileDescriptorProto {
            name: Some("acme/user.proto".to_string()),
            package: Some("acme".to_string()),
            message_type: vec![DescriptorProto {
                name: Some("User".to_string()),
                field: vec![
                    FieldDescriptorProto {
                        name: Some("tags".to_string()),
                        label: Some(ProtoLabel::Repeated as i32),
                        r#type: Some(ProtoType::String as i32),
                        ..Default::default()
                    },
                    FieldDescriptorProto {
                        name: Some("labels".to_string()),
                        label: Some(ProtoLabel::Repeated as i32),
                        r#type: Some(ProtoType::Message as i32),
                        type_name: Some(".acme.User.LabelsEntry".to_string()),
                        ..Default::default()
                    },
                ],
                nested_type: vec![DescriptorProto {
                    name: Some("LabelsEntry".to_string()),
                    field: vec![
                        FieldDescriptorProto {
                            name: Some("key".to_string()),
                            r#type: Some(ProtoType::String as i32),
                            ..Default::default()
                        },
                        FieldDescriptorProto {
                            name: Some("value".to_string()),
                            r#type: Some(ProtoType::Int64 as i32),
                            ..Default::default()
                        },
                    ],
                    options: Some(MessageOptions {
                        map_entry: Some(true),
                        ..Default::default()
                    }),
                    ..Default::default()
                }],
                ..Default::default()
            }],
            enum_type: vec![EnumDescriptorProto {
                name: Some("Role".to_string()),
                value: vec![EnumValueDescriptorProto {
                    name: Some("ADMIN".to_string()),
                    number: Some(0),
                    ..Default::default()
                }],
                ..Default::default()
            }],
            service: vec![ServiceDescriptorProto {
                name: Some("Users".to_string()),
                method: vec![MethodDescriptorProto {
                    name: Some("Watch".to_string()),
                    input_type: Some(".acme.User".to_string()),
                    output_type: Some(".acme.User".to_string()),
                    server_streaming: Some(true),
                    ..Default::default()
                }],
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn decodes_plugin_request() -> Result<()> {
        let request = CodeGeneratorRequest {
            file_to_generate: vec!["acme/user.proto".to_string()],
            parameter: Some("csrf=false".to_string()),
            proto_file: vec![user_file()],
            ..Default::default()
        };
        let decoded = decode_plugin_request(&request.encode_to_vec())?;
        assert_eq!(decoded.files_to_generate, vec!["acme/user.proto"]);
        assert_eq!(decoded.parameter.as_deref(), Some("csrf=false"));

        let user = &decoded.schema.files[0].messages[0];
        assert_eq!(user.fields[0].tag, ScalarType::String);
        assert!(user.fields[0].is_repeated());
        assert!(user.nested[0].map_entry);
        assert_eq!(user.nested[0].fields[1].tag, ScalarType::Int64);
        assert!(decoded.schema.files[0].services[0].methods[0].is_streaming());
        Ok(())
    }

    #[test]
    fn decodes_binary_descriptor_set() -> Result<()> {
        let set = FileDescriptorSet {
            file: vec![user_file()],
        };
        let schema = decode_descriptor_set(&set.encode_to_vec())?;
        assert_eq!(schema.files[0].enums[0], Enum::new("Role", ["ADMIN"]));
        Ok(())
    }

    #[test]
    fn garbage_bytes_are_malformed_input() {
        let err = decode_plugin_request(&[0xff, 0xff, 0xff]).unwrap_err();
        assert!(matches!(err, CodegenError::MalformedInput(_)));
    }

    #[test]
    fn response_carries_files_or_error() -> Result<()> {
        let ok = encode_plugin_response(Ok(vec![GeneratedArtifact {
            name: "a.js".to_string(),
            content: "export {}\n".to_string(),
        }]));
        let decoded = CodeGeneratorResponse::decode(ok.as_slice())
            .map_err(|e| CodegenError::MalformedInput(e.to_string()))?;
        assert_eq!(decoded.error, None);
        assert_eq!(decoded.file[0].name(), "a.js");
        assert_eq!(decoded.file[0].content(), "export {}\n");

        let failed = encode_plugin_response(Err(CodegenError::UnknownFile("b.proto".to_string())));
        let decoded = CodeGeneratorResponse::decode(failed.as_slice())
            .map_err(|e| CodegenError::MalformedInput(e.to_string()))?;
        assert!(decoded.file.is_empty());
        assert_eq!(decoded.error(), "file `b.proto` is not part of the schema");
        Ok(())
    }
}
