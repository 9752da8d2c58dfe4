//! Error types for record marshalling
//!
//! Every conversion step reports failure to its caller through `MarshalError`.
//! Nothing is retried and no partially built record or object escapes.

use std::fmt;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, MarshalError>;

#[derive(Debug, Clone, PartialEq)]
pub enum MarshalError {
    /// Named attribute (or registry entry) not present on the managed object
    MissingAttribute { attr: String },
    /// Sequence length or count disagrees with the declared shape
    ShapeMismatch {
        field: String,
        expected: usize,
        found: i64,
    },
    /// Attribute present but none of the accepted representations matched
    AttributeTypeMismatch {
        attr: String,
        expected: &'static str,
        found: String,
    },
    /// Data type tag has no conversion path (Time, Boolean, unknown)
    UnsupportedType { tag: i32 },
    /// Element of `base`/`data` missing or of the wrong kind
    ConversionError {
        index: usize,
        expected: &'static str,
        found: String,
    },
    /// Native buffer could not be allocated
    AllocationFailure { bytes: usize },
    /// Character slot width is not usable
    InvalidWidth { width: i64 },
    /// Failure raised by the managed object system itself
    Host { message: String },
}

impl MarshalError {
    pub fn missing(attr: impl Into<String>) -> Self {
        Self::MissingAttribute { attr: attr.into() }
    }

    pub fn shape(field: impl Into<String>, expected: usize, found: i64) -> Self {
        Self::ShapeMismatch {
            field: field.into(),
            expected,
            found,
        }
    }

    pub fn host(message: impl Into<String>) -> Self {
        Self::Host { message: message.into() }
    }

    /// Short stable name of the error kind, used as a log field
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingAttribute { .. } => "missing_attribute",
            Self::ShapeMismatch { .. } => "shape_mismatch",
            Self::AttributeTypeMismatch { .. } => "attribute_type_mismatch",
            Self::UnsupportedType { .. } => "unsupported_type",
            Self::ConversionError { .. } => "conversion_error",
            Self::AllocationFailure { .. } => "allocation_failure",
            Self::InvalidWidth { .. } => "invalid_width",
            Self::Host { .. } => "host",
        }
    }
}

impl fmt::Display for MarshalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingAttribute { attr } => {
                write!(f, "Missing attribute '{}'", attr)
            }
            Self::ShapeMismatch { field, expected, found } => {
                write!(f, "Shape mismatch for '{}': expected {}, found {}", field, expected, found)
            }
            Self::AttributeTypeMismatch { attr, expected, found } => {
                write!(f, "Attribute '{}' has wrong type: expected {}, found {}", attr, expected, found)
            }
            Self::UnsupportedType { tag } => {
                write!(f, "Unsupported cell data type: {}", tag)
            }
            Self::ConversionError { index, expected, found } => {
                write!(f, "Cannot convert item {}: expected {}, found {}", index, expected, found)
            }
            Self::AllocationFailure { bytes } => {
                write!(f, "Failed to allocate {} bytes for cell buffer", bytes)
            }
            Self::InvalidWidth { width } => {
                write!(f, "Invalid character slot width: {}", width)
            }
            Self::Host { message } => {
                write!(f, "Object system error: {}", message)
            }
        }
    }
}

impl std::error::Error for MarshalError {}
