use thiserror::Error;

/// Error type for constraint-to-schema conversion operations.
#[derive(Debug, Error)]
pub enum SchemaGenError {
    /// A constraint record lacks a usable class or property name.
    #[error("invalid metadata at record {index}: {reason}")]
    InvalidMetadata { index: usize, reason: String },

    /// A nested-object property points at a class that is not in the snapshot.
    #[error("class `{referenced_by}` references `{class}`, which has no metadata")]
    DanglingReference { class: String, referenced_by: String },

    /// The definitions block, or one of its entries, would replace a key of the
    /// root schema itself.
    #[error("definitions key `{key}` collides with a schema key; choose another ref pointer prefix")]
    DefinitionsCollision { key: String },

    /// The requested root class is not in the snapshot.
    #[error("no metadata for class `{0}`")]
    UnknownClass(String),

    /// A converter overlay document has the wrong shape.
    #[error("invalid converter overlay: {0}")]
    InvalidConverters(String),

    /// I/O error (e.g., reading a snapshot file, writing the output file).
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization error.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl SchemaGenError {
    pub(crate) fn invalid_metadata(index: usize, reason: impl Into<String>) -> Self {
        Self::InvalidMetadata {
            index,
            reason: reason.into(),
        }
    }
}
