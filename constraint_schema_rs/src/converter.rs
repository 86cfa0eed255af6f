//! Constraint-to-fragment converters.
//!
//! A [`ConverterTable`] maps a constraint identifier to a [`ConverterEntry`]: either
//! a fixed schema fragment or a function of the constraint's arguments. The
//! process-wide default table is built once and never mutated; callers customize
//! conversion by overlaying their own entries onto a copy.

use crate::error::SchemaGenError;
use crate::schema::Fragment;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

/// Marks a property as mandatory; contributes `not: {type: "null"}`.
pub const IS_DEFINED: &str = "isDefined";
/// Marks a property as optional.
pub const IS_OPTIONAL: &str = "isOptional";
/// Conditional validation; the marker an optional property carries.
pub const CONDITIONAL_VALIDATION: &str = "conditionalValidation";
/// Validate a nested object against its own class schema.
pub const NESTED_VALIDATION: &str = "nestedValidation";
pub const IS_STRING: &str = "isString";
pub const IS_EMAIL: &str = "isEmail";
pub const MIN_LENGTH: &str = "minLength";
pub const MAX_LENGTH: &str = "maxLength";

/// Signature of a converter function: constraint arguments to fragment.
/// Returning `None` contributes no keys.
pub type ConverterFn = dyn Fn(&[Value]) -> Option<Fragment> + Send + Sync;

/// A schema fragment producer for one constraint identifier.
#[derive(Clone)]
pub enum ConverterEntry {
    Fragment(Fragment),
    Function(Arc<ConverterFn>),
}

impl ConverterEntry {
    /// A fixed fragment from a JSON object. Non-object values yield an empty fragment.
    #[must_use]
    pub fn fixed(value: Value) -> Self {
        Self::Fragment(into_fragment(value))
    }

    #[must_use]
    pub fn function<F>(converter: F) -> Self
    where
        F: Fn(&[Value]) -> Option<Fragment> + Send + Sync + 'static,
    {
        Self::Function(Arc::new(converter))
    }

    /// Produce this entry's fragment for the given constraint arguments.
    #[must_use]
    pub fn convert(&self, arguments: &[Value]) -> Option<Fragment> {
        match self {
            Self::Fragment(fragment) => Some(fragment.clone()),
            Self::Function(converter) => converter(arguments),
        }
    }
}

impl fmt::Debug for ConverterEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fragment(fragment) => f.debug_tuple("Fragment").field(fragment).finish(),
            Self::Function(_) => f.write_str("Function(..)"),
        }
    }
}

impl From<Fragment> for ConverterEntry {
    fn from(fragment: Fragment) -> Self {
        Self::Fragment(fragment)
    }
}

/// Mapping of constraint identifier to converter.
#[derive(Debug, Clone, Default)]
pub struct ConverterTable {
    entries: BTreeMap<String, ConverterEntry>,
}

impl ConverterTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, replacing any existing entry for `constraint`.
    #[must_use]
    pub fn with(mut self, constraint: impl Into<String>, entry: ConverterEntry) -> Self {
        self.insert(constraint, entry);
        self
    }

    pub fn insert(
        &mut self,
        constraint: impl Into<String>,
        entry: ConverterEntry,
    ) -> Option<ConverterEntry> {
        self.entries.insert(constraint.into(), entry)
    }

    #[must_use]
    pub fn contains(&self, constraint: &str) -> bool {
        self.entries.contains_key(constraint)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Key-level overlay: entries of `overlay` replace or extend a copy of `self`.
    #[must_use]
    pub fn overlay(&self, overlay: &Self) -> Self {
        let mut entries: BTreeMap<String, ConverterEntry> = self.entries.clone();
        for (constraint, entry) in &overlay.entries {
            entries.insert(constraint.clone(), entry.clone());
        }
        Self { entries }
    }

    /// Fragment for `constraint`, or `None` when it has no entry or the converter declines.
    #[must_use]
    pub fn lookup(&self, constraint: &str, arguments: &[Value]) -> Option<Fragment> {
        let Some(entry) = self.entries.get(constraint) else {
            tracing::trace!(constraint, "no converter registered, skipping");
            return None;
        };
        entry.convert(arguments)
    }

    /// Parse a table of fixed fragments from a JSON object of objects.
    ///
    /// # Errors
    ///
    /// Returns `SchemaGenError::InvalidConverters` if `value` is not an object or
    /// any entry is not an object.
    pub fn from_json(value: Value) -> Result<Self, SchemaGenError> {
        let Value::Object(map) = value else {
            return Err(SchemaGenError::InvalidConverters(
                "expected an object keyed by constraint identifier".to_string(),
            ));
        };
        let mut table = Self::new();
        for (constraint, fragment) in map {
            let Value::Object(fragment) = fragment else {
                return Err(SchemaGenError::InvalidConverters(format!(
                    "converter for `{constraint}` must be an object"
                )));
            };
            table.insert(constraint, ConverterEntry::Fragment(fragment));
        }
        Ok(table)
    }
}

static DEFAULT_CONVERTERS: LazyLock<ConverterTable> = LazyLock::new(|| {
    let mut table = ConverterTable::new();
    marker_and_type_converters(&mut table);
    string_converters(&mut table);
    string_argument_converters(&mut table);
    number_converters(&mut table);
    value_converters(&mut table);
    array_converters(&mut table);
    table
});

/// The process-wide default converter table.
#[must_use]
pub fn default_converters() -> &'static ConverterTable {
    &DEFAULT_CONVERTERS
}

fn into_fragment(value: Value) -> Fragment {
    match value {
        Value::Object(map) => map,
        _ => Fragment::new(),
    }
}

/// Schema for a literal constraint value: its primitive JSON type.
fn primitive_schema(value: &Value) -> Option<Fragment> {
    let ty: &str = match value {
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        _ => return None,
    };
    Some(into_fragment(json!({ "type": ty })))
}

/// Schemas of `values` paired with the values, if every value is a primitive.
fn enum_schemas(values: &[Value]) -> Option<Vec<(Fragment, Value)>> {
    values
        .iter()
        .map(|v| primitive_schema(v).map(|s| (s, v.clone())))
        .collect()
}

/// One `type` + `enum` fragment for `values` when they share a primitive type.
fn homogeneous_enum(values: &[Value]) -> Option<Fragment> {
    let schemas: Vec<(Fragment, Value)> = enum_schemas(values)?;
    let (head, _) = schemas.first()?;
    if schemas.iter().any(|(s, _)| s.get("type") != head.get("type")) {
        return None;
    }
    let mut fragment: Fragment = head.clone();
    fragment.insert("enum".to_string(), Value::Array(values.to_vec()));
    Some(fragment)
}

fn first_number(arguments: &[Value]) -> Option<&Value> {
    arguments.first().filter(|v| v.is_number())
}

fn first_str(arguments: &[Value]) -> Option<&str> {
    arguments.first().and_then(Value::as_str)
}

fn first_array(arguments: &[Value]) -> Option<&[Value]> {
    arguments.first().and_then(Value::as_array).map(Vec::as_slice)
}

fn string_format(format: &str) -> ConverterEntry {
    ConverterEntry::fixed(json!({ "format": format, "type": "string" }))
}

fn string_pattern(pattern: &str) -> ConverterEntry {
    ConverterEntry::fixed(json!({ "pattern": pattern, "type": "string" }))
}

fn date_one_of() -> Value {
    json!([
        { "format": "date", "type": "string" },
        { "format": "date-time", "type": "string" }
    ])
}

fn marker_and_type_converters(table: &mut ConverterTable) {
    table.insert(IS_DEFINED, ConverterEntry::fixed(json!({ "not": { "type": "null" } })));
    table.insert(CONDITIONAL_VALIDATION, ConverterEntry::fixed(json!({})));
    table.insert(IS_OPTIONAL, ConverterEntry::fixed(json!({})));
    table.insert("whitelistValidation", ConverterEntry::fixed(json!({})));
    table.insert(IS_STRING, ConverterEntry::fixed(json!({ "type": "string" })));
    table.insert("isBoolean", ConverterEntry::fixed(json!({ "type": "boolean" })));
    table.insert("isNumber", ConverterEntry::fixed(json!({ "type": "number" })));
    table.insert("isInt", ConverterEntry::fixed(json!({ "type": "integer" })));
    table.insert("isObject", ConverterEntry::fixed(json!({ "type": "object" })));
    table.insert(
        "isNotEmptyObject",
        ConverterEntry::fixed(json!({ "minProperties": 1, "type": "object" })),
    );
    table.insert(
        "isArray",
        ConverterEntry::fixed(json!({ "items": {}, "type": "array" })),
    );
    table.insert("isDate", ConverterEntry::fixed(json!({ "oneOf": date_one_of() })));
    table.insert(
        "minDate",
        ConverterEntry::function(|args| {
            let date: &str = first_str(args)?;
            Some(into_fragment(
                json!({ "description": format!("After {date}"), "oneOf": date_one_of() }),
            ))
        }),
    );
    table.insert(
        "maxDate",
        ConverterEntry::function(|args| {
            let date: &str = first_str(args)?;
            Some(into_fragment(
                json!({ "description": format!("Before {date}"), "oneOf": date_one_of() }),
            ))
        }),
    );
}

fn string_converters(table: &mut ConverterTable) {
    table.insert(IS_EMAIL, string_format("email"));
    table.insert("isUrl", string_format("url"));
    table.insert("isUUID", string_format("uuid"));
    table.insert("isISO8601", string_format("date-time"));
    table.insert("isJSON", string_format("json"));
    table.insert("isBase64", string_format("base64"));
    table.insert("isFQDN", string_format("hostname"));
    table.insert("isCreditCard", string_format("credit-card"));
    table.insert("isCurrency", string_format("currency"));
    table.insert("isISBN", string_format("isbn"));
    table.insert("isISIN", string_format("isin"));
    table.insert("isMobilePhone", string_format("mobile-phone"));
    table.insert("isAlpha", string_pattern("^[a-zA-Z]+$"));
    table.insert("isAlphanumeric", string_pattern("^[0-9a-zA-Z]+$"));
    table.insert("isAscii", string_pattern(r"^[\x00-\x7F]+$"));
    table.insert("isHexColor", string_pattern("^#?([0-9A-F]{3}|[0-9A-F]{6})$"));
    table.insert("isHexadecimal", string_pattern("^[0-9a-fA-F]+$"));
    table.insert("isMongoId", string_pattern("^[0-9a-fA-F]{24}$"));
    table.insert("isMultibyte", string_pattern(r"[^\x00-\x7F]"));
    table.insert("isMilitaryTime", string_pattern(r"^([01]\d|2[0-3]):?([0-5]\d)$"));
    table.insert("isNumberString", string_pattern("^[-+]?[0-9]+$"));
    table.insert(
        "isDateString",
        string_pattern(r"\d{4}-[01]\d-[0-3]\dT[0-2]\d:[0-5]\d:[0-5]\d.\d+Z?"),
    );
    for plain in ["isLowercase", "isUppercase", "isByteLength", "isVariableWidth"] {
        table.insert(plain, ConverterEntry::fixed(json!({ "type": "string" })));
    }
    table.insert(
        "isBooleanString",
        ConverterEntry::fixed(json!({ "enum": ["true", "false"], "type": "string" })),
    );
    table.insert("isNotEmpty", ConverterEntry::fixed(json!({ "minLength": 1 })));
    table.insert(
        "isEmpty",
        ConverterEntry::fixed(json!({
            "anyOf": [
                { "enum": [""], "type": "string" },
                { "not": { "anyOf": [
                    { "type": "string" },
                    { "type": "object" },
                    { "type": "array" },
                    { "type": "number" },
                    { "type": "boolean" }
                ] } }
            ]
        })),
    );
}

fn string_argument_converters(table: &mut ConverterTable) {
    table.insert(
        "isIP",
        ConverterEntry::function(|args| {
            let v6: bool = match args.first() {
                Some(Value::String(s)) => s == "6",
                Some(Value::Number(n)) => n.as_u64() == Some(6),
                _ => false,
            };
            let format: &str = if v6 { "ipv6" } else { "ipv4" };
            Some(into_fragment(json!({ "format": format, "type": "string" })))
        }),
    );
    table.insert(
        "contains",
        ConverterEntry::function(|args| {
            let seed: &str = first_str(args)?;
            Some(into_fragment(json!({ "pattern": seed, "type": "string" })))
        }),
    );
    table.insert(
        "notContains",
        ConverterEntry::function(|args| {
            let seed: &str = first_str(args)?;
            Some(into_fragment(
                json!({ "not": { "pattern": seed }, "type": "string" }),
            ))
        }),
    );
    table.insert(
        "matches",
        ConverterEntry::function(|args| {
            let pattern: &str = first_str(args)?;
            Some(into_fragment(json!({ "pattern": pattern, "type": "string" })))
        }),
    );
    table.insert(
        MIN_LENGTH,
        ConverterEntry::function(|args| {
            let min: &Value = first_number(args)?;
            Some(into_fragment(json!({ "minLength": min, "type": "string" })))
        }),
    );
    table.insert(
        MAX_LENGTH,
        ConverterEntry::function(|args| {
            let max: &Value = first_number(args)?;
            Some(into_fragment(json!({ "maxLength": max, "type": "string" })))
        }),
    );
    table.insert(
        "length",
        ConverterEntry::function(|args| {
            let min: &Value = first_number(args)?;
            let fragment: Value = if let Some(max) = args.get(1).filter(|v| v.is_number()) {
                json!({ "maxLength": max, "minLength": min, "type": "string" })
            } else {
                json!({ "minLength": min, "type": "string" })
            };
            Some(into_fragment(fragment))
        }),
    );
}

fn number_converters(table: &mut ConverterTable) {
    table.insert(
        "isPositive",
        ConverterEntry::fixed(json!({ "exclusiveMinimum": true, "minimum": 0, "type": "number" })),
    );
    table.insert(
        "isNegative",
        ConverterEntry::fixed(json!({ "exclusiveMaximum": true, "maximum": 0, "type": "number" })),
    );
    table.insert(
        "isDivisibleBy",
        ConverterEntry::function(|args| {
            let divisor: &Value = first_number(args)?;
            Some(into_fragment(json!({ "multipleOf": divisor, "type": "number" })))
        }),
    );
    table.insert(
        "min",
        ConverterEntry::function(|args| {
            let min: &Value = first_number(args)?;
            Some(into_fragment(json!({ "minimum": min, "type": "number" })))
        }),
    );
    table.insert(
        "max",
        ConverterEntry::function(|args| {
            let max: &Value = first_number(args)?;
            Some(into_fragment(json!({ "maximum": max, "type": "number" })))
        }),
    );
}

fn value_converters(table: &mut ConverterTable) {
    table.insert(
        "equals",
        ConverterEntry::function(|args| {
            let value: &Value = args.first()?;
            let mut fragment: Fragment = primitive_schema(value)?;
            fragment.insert("enum".to_string(), json!([value]));
            Some(fragment)
        }),
    );
    table.insert(
        "notEquals",
        ConverterEntry::function(|args| {
            let value: &Value = args.first()?;
            let mut fragment: Fragment = primitive_schema(value)?;
            fragment.insert("enum".to_string(), json!([value]));
            Some(into_fragment(json!({ "not": fragment })))
        }),
    );
    table.insert(
        "isIn",
        ConverterEntry::function(|args| homogeneous_enum(first_array(args)?)),
    );
    table.insert(
        "isNotIn",
        ConverterEntry::function(|args| {
            let fragment: Fragment = homogeneous_enum(first_array(args)?)?;
            Some(into_fragment(json!({ "not": fragment })))
        }),
    );
    table.insert(
        "isEnum",
        ConverterEntry::function(|args| {
            let values: Vec<Value> = match args.first()? {
                Value::Object(entries) => entries.values().cloned().collect(),
                Value::Array(values) => values.clone(),
                _ => return None,
            };
            Some(into_fragment(json!({ "enum": values, "type": "string" })))
        }),
    );
}

fn array_converters(table: &mut ConverterTable) {
    table.insert(
        "arrayNotEmpty",
        ConverterEntry::fixed(json!({ "items": {}, "minItems": 1, "type": "array" })),
    );
    table.insert(
        "arrayUnique",
        ConverterEntry::fixed(json!({ "items": {}, "type": "array", "uniqueItems": true })),
    );
    table.insert(
        "arrayMinSize",
        ConverterEntry::function(|args| {
            let min: &Value = first_number(args)?;
            Some(into_fragment(json!({ "items": {}, "minItems": min, "type": "array" })))
        }),
    );
    table.insert(
        "arrayMaxSize",
        ConverterEntry::function(|args| {
            let max: &Value = first_number(args)?;
            Some(into_fragment(json!({ "items": {}, "maxItems": max, "type": "array" })))
        }),
    );
    table.insert(
        "arrayContains",
        ConverterEntry::function(|args| {
            let Some(schemas) = first_array(args).and_then(enum_schemas).filter(|s| !s.is_empty())
            else {
                return Some(into_fragment(json!({ "items": {}, "type": "array" })));
            };
            let any_of: Vec<Value> = schemas
                .into_iter()
                .map(|(mut schema, value)| {
                    schema.insert("enum".to_string(), json!([value]));
                    json!({ "items": { "not": schema } })
                })
                .collect();
            Some(into_fragment(
                json!({ "not": { "anyOf": any_of }, "type": "array" }),
            ))
        }),
    );
    table.insert(
        "arrayNotContains",
        ConverterEntry::function(|args| {
            let Some(schemas) = first_array(args).and_then(enum_schemas).filter(|s| !s.is_empty())
            else {
                return Some(into_fragment(json!({ "items": {}, "type": "array" })));
            };
            let any_of: Vec<Value> = schemas
                .into_iter()
                .map(|(mut schema, value)| {
                    schema.insert("enum".to_string(), json!([value]));
                    Value::Object(schema)
                })
                .collect();
            Some(into_fragment(
                json!({ "items": { "not": { "anyOf": any_of } }, "type": "array" }),
            ))
        }),
    );
}
