//! The restricted JSON Schema fragment describing a chart's configuration
//! surface (`values.schema.json`).

use indexmap::IndexMap;
use serde::Deserialize;
use snafu::{ResultExt, Snafu};

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to parse values schema"))]
    ParseSchema { source: serde_json::Error },
}

/// The declared type of a schema property.
///
/// Anything outside the supported set deserializes as [`Unsupported`] instead
/// of failing the whole schema; such properties are skipped during form
/// synthesis.
///
/// [`Unsupported`]: SchemaType::Unsupported
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SchemaType {
    Object,
    String,
    Integer,
    Boolean,
    Array,
    #[default]
    #[serde(other)]
    Unsupported,
}

/// A JSON Schema fragment, restricted to the vocabulary the basic form
/// understands. Read-only input; the engine never mutates it.
///
/// Property order is preserved, because the generated form's field order
/// follows schema declaration order.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct SchemaNode {
    #[serde(rename = "type", default)]
    pub schema_type: SchemaType,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub properties: IndexMap<String, SchemaNode>,

    /// The default the schema declares for this property, used for display
    /// when the document has no value at its path yet.
    #[serde(default)]
    pub default: Option<serde_json::Value>,
}

impl SchemaNode {
    /// Parses a `values.schema.json` payload. Unknown schema keywords are
    /// ignored.
    pub fn from_json(input: &str) -> Result<Self> {
        serde_json::from_str(input).context(ParseSchemaSnafu)
    }
}
