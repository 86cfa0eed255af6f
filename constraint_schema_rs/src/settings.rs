//! Settings for schema generation.

use crate::converter::{ConverterTable, NESTED_VALIDATION, default_converters};

/// Default prefix for `$ref` pointers and the definitions block key.
pub const DEFAULT_REF_POINTER_PREFIX: &str = "#/definitions/";

/// Settings that control schema generation behavior.
#[derive(Debug, Clone)]
pub struct SchemaSettings {
    /// Prepended verbatim to a class name to form a `$ref` pointer. With the
    /// leading `#/` and one trailing `/` removed, its `/`-separated segments are
    /// also the key path of the definitions block in resolved mode.
    ///
    /// **Default: `#/definitions/`.**
    pub ref_pointer_prefix: String,

    /// Converters overlaid onto the default table for this call only.
    pub additional_converters: ConverterTable,

    /// When true, only properties carrying the `isDefined` marker are required.
    /// When false, every property without an optional marker is required.
    ///
    /// **Default: false.**
    pub skip_missing_properties: bool,

    /// When true, each class schema inlines the schemas of every class it
    /// reaches through nested-object properties into a definitions block.
    ///
    /// **Default: false.** Nested objects are emitted as bare `$ref` pointers.
    pub resolve_references: bool,
}

impl Default for SchemaSettings {
    fn default() -> Self {
        Self {
            ref_pointer_prefix: DEFAULT_REF_POINTER_PREFIX.to_string(),
            additional_converters: ConverterTable::new(),
            skip_missing_properties: false,
            resolve_references: false,
        }
    }
}

impl SchemaSettings {
    #[must_use]
    pub fn with_ref_pointer_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.ref_pointer_prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn with_additional_converters(mut self, converters: ConverterTable) -> Self {
        self.additional_converters = converters;
        self
    }

    #[must_use]
    pub fn with_skip_missing_properties(mut self, skip: bool) -> Self {
        self.skip_missing_properties = skip;
        self
    }

    #[must_use]
    pub fn with_resolve_references(mut self, resolve: bool) -> Self {
        self.resolve_references = resolve;
        self
    }

    /// The default table with `additional_converters` overlaid.
    ///
    /// Nested-object markers always become placeholders, so an overlay entry for
    /// them has no effect.
    #[must_use]
    pub fn converters(&self) -> ConverterTable {
        if self.additional_converters.contains(NESTED_VALIDATION) {
            tracing::warn!(
                constraint = NESTED_VALIDATION,
                "converter overlay for nested objects is ignored"
            );
        }
        default_converters().overlay(&self.additional_converters)
    }

    /// `$ref` pointer for `class_name`.
    #[must_use]
    pub fn pointer(&self, class_name: &str) -> String {
        format!("{}{class_name}", self.ref_pointer_prefix)
    }

    /// Key path of the definitions block. Empty when the prefix is just `#/`.
    #[must_use]
    pub fn definitions_path(&self) -> Vec<&str> {
        let prefix: &str = &self.ref_pointer_prefix;
        let trimmed: &str = prefix.strip_prefix("#/").unwrap_or(prefix);
        let trimmed: &str = trimmed.strip_suffix('/').unwrap_or(trimmed);
        if trimmed.is_empty() {
            Vec::new()
        } else {
            trimmed.split('/').collect()
        }
    }
}
