//! Constraint records and their grouping by class and property.
//!
//! A metadata snapshot is a flat, ordered list of [`ConstraintRecord`]s, one per
//! annotation use-site. [`MetadataIndex`] groups it by declaring class and then
//! by property, keeping first-seen order for both and declaration order for the
//! records of each property.

use crate::converter::NESTED_VALIDATION;
use crate::error::SchemaGenError;
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

/// A single validation constraint declared on a class property.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstraintRecord {
    /// Stable, unique name of the declaring class.
    #[serde(default)]
    pub target: String,

    #[serde(default)]
    pub property_name: String,

    /// Constraint identifier used as the converter table key.
    pub constraint: String,

    #[serde(default)]
    pub arguments: Vec<Value>,

    /// The constraint applies to each element of an array property.
    #[serde(default)]
    pub each: bool,

    /// Declared type of the property, as reported by the metadata provider.
    /// For nested-object validation this names the referenced class.
    #[serde(default)]
    pub property_type: Option<String>,
}

impl ConstraintRecord {
    #[must_use]
    pub fn new(
        target: impl Into<String>,
        property_name: impl Into<String>,
        constraint: impl Into<String>,
    ) -> Self {
        Self {
            target: target.into(),
            property_name: property_name.into(),
            constraint: constraint.into(),
            arguments: Vec::new(),
            each: false,
            property_type: None,
        }
    }

    #[must_use]
    pub fn with_arguments(mut self, arguments: Vec<Value>) -> Self {
        self.arguments = arguments;
        self
    }

    #[must_use]
    pub fn each(mut self) -> Self {
        self.each = true;
        self
    }

    #[must_use]
    pub fn with_property_type(mut self, property_type: impl Into<String>) -> Self {
        self.property_type = Some(property_type.into());
        self
    }
}

/// Records of one class, keyed by property name in first-seen order.
pub type PropertyConstraints<'a> = IndexMap<&'a str, Vec<&'a ConstraintRecord>>;

/// Constraint records grouped by class, then by property.
#[derive(Debug, Default)]
pub struct MetadataIndex<'a> {
    classes: IndexMap<&'a str, PropertyConstraints<'a>>,
}

impl<'a> MetadataIndex<'a> {
    /// Group `records` by declaring class and property.
    ///
    /// # Errors
    ///
    /// Returns `SchemaGenError::InvalidMetadata` if any record has an empty class
    /// name or property name, or is a nested-object marker that does not name
    /// the referenced class.
    pub fn new(records: &'a [ConstraintRecord]) -> Result<Self, SchemaGenError> {
        let mut classes: IndexMap<&'a str, PropertyConstraints<'a>> = IndexMap::new();
        for (index, record) in records.iter().enumerate() {
            if record.target.trim().is_empty() {
                return Err(SchemaGenError::invalid_metadata(
                    index,
                    format!("`{}` constraint has no declaring class", record.constraint),
                ));
            }
            if record.property_name.trim().is_empty() {
                return Err(SchemaGenError::invalid_metadata(
                    index,
                    format!(
                        "`{}` constraint on `{}` has no property name",
                        record.constraint, record.target
                    ),
                ));
            }
            if record.constraint == NESTED_VALIDATION
                && record
                    .property_type
                    .as_deref()
                    .is_none_or(|ty| ty.trim().is_empty())
            {
                return Err(SchemaGenError::invalid_metadata(
                    index,
                    format!(
                        "nested property `{}.{}` does not name its class",
                        record.target, record.property_name
                    ),
                ));
            }
            classes
                .entry(record.target.as_str())
                .or_default()
                .entry(record.property_name.as_str())
                .or_default()
                .push(record);
        }
        Ok(Self { classes })
    }

    /// Iterate classes in first-seen order.
    pub fn classes(&self) -> impl Iterator<Item = (&'a str, &PropertyConstraints<'a>)> {
        self.classes.iter().map(|(name, props)| (*name, props))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
