//! The schema-driven form synthesizer.
//!
//! [`synthesize`] derives an ordered list of editable field descriptors from
//! a chart's values schema and the current values document. It is a pure
//! function of its inputs and is re-invoked whenever either changes, so the
//! rendered basic form always reflects the raw document.

use serde_yaml::Value;
use tracing::debug;

use crate::{
    document::ValuesDocument,
    path::ValuesPath,
    schema::{SchemaNode, SchemaType},
};

mod registry;

use registry::KnownField;
pub use registry::SliderSpec;

/// The widget a field renders as. Closed set; extending it means touching
/// the registry or the type fallback below, nothing else.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldKind {
    Text {
        /// Integer-typed fields render as text with a numeric input mode.
        numeric: bool,
    },
    Slider(SliderSpec),
    Boolean,
    /// An expandable group of nested fields. The subsection itself carries no
    /// value, only its children do.
    Subsection { children: Vec<FieldDescriptor> },
}

/// A single editable entry of the basic form.
///
/// Descriptors are derived, never hand-constructed, and are regenerated
/// whenever the document or the schema changes.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldDescriptor {
    pub path: ValuesPath,
    pub kind: FieldKind,
    pub title: String,

    /// The current value at `path`, falling back to the schema's declared
    /// default. The fallback is display-only and is never written back into
    /// the document until the user edits the field.
    pub value: Option<Value>,

    /// For subsections: the path whose value toggles the nested fields.
    pub enabler_path: Option<ValuesPath>,
    pub enabler_condition: Option<Value>,
}

/// Derives the basic form's field list from `schema` and `doc`.
///
/// Top-level object properties are visited in schema declaration order,
/// which is part of the observable contract. The kind of each field is
/// resolved by the well-known-name registry first and by the declared
/// primitive type second; properties of unsupported types are skipped.
/// Anonymous object properties do not become subsections, their nested
/// fields are flattened into the surrounding list at deeper dotted paths.
pub fn synthesize(schema: &SchemaNode, doc: &ValuesDocument) -> Vec<FieldDescriptor> {
    synthesize_properties(schema, doc, &ValuesPath::root())
}

fn synthesize_properties(
    schema: &SchemaNode,
    doc: &ValuesDocument,
    parent: &ValuesPath,
) -> Vec<FieldDescriptor> {
    let mut fields = Vec::new();

    for (name, node) in &schema.properties {
        let path = parent.join(name);

        if let Some(known) = registry::lookup(name) {
            fields.push(known_field(known, node, doc, path));
            continue;
        }

        let kind = match node.schema_type {
            SchemaType::String => FieldKind::Text { numeric: false },
            SchemaType::Integer => FieldKind::Text { numeric: true },
            SchemaType::Boolean => FieldKind::Boolean,
            SchemaType::Object => {
                fields.extend(synthesize_properties(node, doc, &path));
                continue;
            }
            SchemaType::Array | SchemaType::Unsupported => {
                debug!(
                    property = %path,
                    schema_type = %node.schema_type,
                    "skipping property with unsupported type"
                );
                continue;
            }
        };

        fields.push(FieldDescriptor {
            value: current_value(doc, &path, node),
            title: node.title.clone().unwrap_or_else(|| name.clone()),
            path,
            kind,
            enabler_path: None,
            enabler_condition: None,
        });
    }

    fields
}

fn known_field(
    known: KnownField,
    node: &SchemaNode,
    doc: &ValuesDocument,
    path: ValuesPath,
) -> FieldDescriptor {
    match known {
        KnownField::Text { title } => FieldDescriptor {
            kind: FieldKind::Text {
                numeric: node.schema_type == SchemaType::Integer,
            },
            title: title.to_owned(),
            value: current_value(doc, &path, node),
            path,
            enabler_path: None,
            enabler_condition: None,
        },
        KnownField::Slider { title, spec } => FieldDescriptor {
            kind: FieldKind::Slider(spec),
            title: title.to_owned(),
            value: current_value(doc, &path, node),
            path,
            enabler_path: None,
            enabler_condition: None,
        },
        KnownField::Subsection {
            title,
            enabler_path,
            enabler_condition,
        } => FieldDescriptor {
            kind: FieldKind::Subsection {
                children: synthesize_properties(node, doc, &path),
            },
            title: title.to_owned(),
            value: None,
            path,
            enabler_path: enabler_path.parse().ok(),
            enabler_condition: Some(Value::Bool(enabler_condition)),
        },
    }
}

fn current_value(doc: &ValuesDocument, path: &ValuesPath, node: &SchemaNode) -> Option<Value> {
    doc.get(path).cloned().or_else(|| {
        node.default
            .as_ref()
            .map(|default| serde_yaml::to_value(default).unwrap_or(Value::Null))
    })
}
