//! Property-based tests for generation.
//!
//! 1. Declarations list a message's fields exactly, in order
//! 2. Type resolution is idempotent
//! 3. Generation is deterministic
//! 4. Nested repeated/map/message fields render balanced containers

use proptest::prelude::*;
use twirpjs_codegen::classify::Classifier;
use twirpjs_codegen::index::SchemaIndex;
use twirpjs_codegen::schema::{Field, File, Message, Method, ScalarType, Schema, Service};
use twirpjs_codegen::types::TypeResolver;
use twirpjs_codegen::{generate, GeneratorConfig};

// ============================================================================
// Strategies
// ============================================================================

fn scalar_strategy() -> impl Strategy<Value = ScalarType> {
    prop_oneof![
        Just(ScalarType::Double),
        Just(ScalarType::Int32),
        Just(ScalarType::Uint64),
        Just(ScalarType::Sfixed32),
        Just(ScalarType::Bool),
        Just(ScalarType::String),
        Just(ScalarType::Bytes),
    ]
}

/// Field names are made unique by suffixing their position.
fn fields_strategy() -> impl Strategy<Value = Vec<Field>> {
    prop::collection::vec(("[a-z][a-z_]{0,8}", scalar_strategy(), any::<bool>()), 0..12).prop_map(
        |specs| {
            specs
                .into_iter()
                .enumerate()
                .map(|(i, (name, tag, repeated))| {
                    let field = Field::scalar(format!("{name}{i}"), tag);
                    if repeated {
                        field.repeated()
                    } else {
                        field
                    }
                })
                .collect()
        },
    )
}

#[derive(Debug, Clone, Copy)]
enum Layer {
    Repeated,
    Map,
    Message,
}

fn layer_strategy() -> impl Strategy<Value = Layer> {
    prop_oneof![Just(Layer::Repeated), Just(Layer::Map), Just(Layer::Message)]
}

fn schema_with(messages: Vec<Message>, output: &str) -> Schema {
    Schema::new(vec![File {
        name: "gen.proto".to_string(),
        package: "gen".to_string(),
        messages,
        services: vec![Service {
            name: "Svc".to_string(),
            methods: vec![Method::unary("Call", ".gen.Req", output)],
        }],
        ..Default::default()
    }])
}

/// `L0 -> L1 -> ... -> Ln`, each hop a repeated, map or singular message
/// field named `next`; the innermost message holds one string.
fn layered_schema(layers: &[Layer]) -> Schema {
    let mut messages = vec![Message::new("Req", vec![])];
    for (i, layer) in layers.iter().enumerate() {
        let next = format!(".gen.L{}", i + 1);
        let message = match layer {
            Layer::Repeated => Message::new(format!("L{i}"), vec![Field::message("next", next).repeated()]),
            Layer::Message => Message::new(format!("L{i}"), vec![Field::message("next", next)]),
            Layer::Map => Message::new(
                format!("L{i}"),
                vec![Field::message("next", format!(".gen.L{i}.NextEntry")).repeated()],
            )
            .with_nested(Message::map_entry(
                "NextEntry",
                Field::scalar("key", ScalarType::String),
                Field::message("value", next),
            )),
        };
        messages.push(message);
    }
    messages.push(Message::new(
        format!("L{}", layers.len()),
        vec![Field::scalar("leaf", ScalarType::String)],
    ));
    schema_with(messages, ".gen.L0")
}

fn balanced(text: &str) -> bool {
    let mut stack = Vec::new();
    for c in text.chars() {
        match c {
            '{' | '(' | '[' => stack.push(c),
            '}' | ')' | ']' => {
                let open = match c {
                    '}' => '{',
                    ')' => '(',
                    _ => '[',
                };
                if stack.pop() != Some(open) {
                    return false;
                }
            }
            _ => {}
        }
    }
    stack.is_empty()
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn declaration_lists_fields_in_order(fields in fields_strategy()) {
        let names: Vec<String> = fields.iter().map(|f| f.name.clone()).collect();
        let schema = schema_with(vec![Message::new("Req", vec![]), Message::new("Out", fields)], ".gen.Out");
        let out = generate(&schema, "gen.proto", &GeneratorConfig::default()).unwrap().content;

        let start = out.find("export type Out = ").unwrap();
        let decl = &out[start..out[start..].find("\n\n").map_or(out.len(), |e| start + e)];
        let declared: Vec<String> = decl
            .lines()
            .skip(1)
            .filter_map(|l| l.trim().split_once(':').map(|(n, _)| n.to_string()))
            .collect();
        prop_assert_eq!(declared, names);
    }

    #[test]
    fn resolve_is_idempotent(fields in fields_strategy()) {
        let schema = schema_with(vec![Message::new("Req", vec![]), Message::new("Out", fields)], ".gen.Out");
        let config = GeneratorConfig::default();
        let index = SchemaIndex::build(&schema, &config).unwrap();
        let resolver = TypeResolver::new(Classifier::new(&index, &config));
        let out = index.message(".gen.Out", "test").unwrap();
        for f in &out.fields {
            prop_assert_eq!(resolver.resolve(out, f).unwrap(), resolver.resolve(out, f).unwrap());
        }
    }

    #[test]
    fn generation_is_deterministic(fields in fields_strategy()) {
        let schema = schema_with(vec![Message::new("Req", vec![]), Message::new("Out", fields)], ".gen.Out");
        let config = GeneratorConfig::default();
        let first = generate(&schema, "gen.proto", &config).unwrap();
        let second = generate(&schema, "gen.proto", &config).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn layered_fields_render_balanced(layers in prop::collection::vec(layer_strategy(), 1..=3)) {
        let schema = layered_schema(&layers);
        let out = generate(&schema, "gen.proto", &GeneratorConfig::default()).unwrap().content;
        prop_assert!(balanced(&out), "unbalanced output:\n{}", out);
        prop_assert!(out.contains("leaf: "), "leaf not reached:\n{}", out);

        let repeated = layers.iter().filter(|l| matches!(l, Layer::Repeated)).count();
        let maps = layers.iter().filter(|l| matches!(l, Layer::Map)).count();
        prop_assert_eq!(out.matches(".map(v => {").count(), repeated);
        prop_assert_eq!(out.matches("Object.entries(").count(), maps);
        prop_assert!(!out.contains("NextEntry"));
    }
}

#[test]
fn depth_three_repeated_nesting() {
    let schema = layered_schema(&[Layer::Repeated, Layer::Repeated, Layer::Repeated]);
    let out = generate(&schema, "gen.proto", &GeneratorConfig::default())
        .unwrap()
        .content;
    assert!(balanced(&out));
    assert!(out.contains(concat!(
        "    next: data.next ? data.next.map(v => {\n",
        "      return {\n",
        "        next: v.next ? v.next.map(v => {\n",
        "          return {\n",
        "            next: v.next ? v.next.map(v => {\n",
        "              return {\n",
        "                leaf: v.leaf || \"\"\n",
        "              }\n",
        "            }) : []\n",
        "          }\n",
        "        }) : []\n",
        "      }\n",
        "    }) : []\n",
    )));
}
