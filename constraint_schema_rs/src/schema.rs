use indexmap::IndexMap;
use serde::Serialize;

/// A partial JSON Schema object. Keys keep insertion order.
pub type Fragment = serde_json::Map<String, serde_json::Value>;

/// Generated schema for one class.
///
/// `required` is omitted from the serialized form when empty. `definitions`
/// holds the resolved-mode definitions block, already nested under the key path
/// derived from the ref pointer prefix, and is flattened into the object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassSchema {
    #[serde(rename = "type")]
    pub r#type: &'static str,

    pub properties: IndexMap<String, Fragment>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    #[serde(flatten)]
    pub definitions: Fragment,
}

impl ClassSchema {
    /// Keys the typed fields serialize to; a flattened definitions block must not use them.
    pub(crate) const RESERVED_KEYS: [&'static str; 3] = ["type", "properties", "required"];

    #[must_use]
    pub fn new() -> Self {
        Self {
            r#type: "object",
            properties: IndexMap::new(),
            required: Vec::new(),
            definitions: Fragment::new(),
        }
    }
}

impl Default for ClassSchema {
    fn default() -> Self {
        Self::new()
    }
}

/// Class name to generated schema, in first-seen class order.
pub type SchemaMap = IndexMap<String, ClassSchema>;
