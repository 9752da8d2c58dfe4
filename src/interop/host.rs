//! Managed object system seam
//!
//! The marshaller never touches a runtime's objects directly. It goes through
//! `ObjectSystem`, whose `Ref` type is an owned reference: cloning acquires,
//! dropping releases. A failed conversion can therefore return early with `?`
//! at any point and every reference acquired so far is released on the way out.

use crate::errors::{MarshalError, Result};

/// Primitive view of a managed value, as seen by the coercion rules
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    None,
    Bool(bool),
    Int(i64),
    /// Integer outside the machine-word range
    BigInt(i128),
    Float(f64),
    Text(Vec<u8>),
    Sequence,
    Other(String),
}

impl Primitive {
    /// Managed-side type name (for error messages)
    pub fn type_name(&self) -> &str {
        match self {
            Self::None => "None",
            Self::Bool(_) => "bool",
            Self::Int(_) | Self::BigInt(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "str",
            Self::Sequence => "list",
            Self::Other(name) => name,
        }
    }
}

/// Text is never a sequence of items, even where the host can index it
pub(crate) fn require_sequence(value: &Primitive) -> Result<()> {
    match value {
        Primitive::Sequence => Ok(()),
        other => Err(MarshalError::host(format!("'{}' is not a sequence", other.type_name()))),
    }
}

/// Operations the marshaller needs from a managed object system
pub trait ObjectSystem {
    /// Owned reference to a managed object; released on drop
    type Ref: Clone;

    /// Import a module by name
    fn import(&self, module: &str) -> Result<Self::Ref>;

    /// Look up an attribute; `Ok(None)` when it does not exist
    fn get_attr(&self, obj: &Self::Ref, name: &str) -> Result<Option<Self::Ref>>;

    fn set_attr(&self, obj: &Self::Ref, name: &str, value: Self::Ref) -> Result<()>;

    /// Call `callable(*args, **kwargs)`
    fn call(
        &self,
        callable: &Self::Ref,
        args: &[Self::Ref],
        kwargs: &[(&str, Self::Ref)],
    ) -> Result<Self::Ref>;

    fn inspect(&self, obj: &Self::Ref) -> Primitive;

    /// Length of a sequence
    fn seq_len(&self, seq: &Self::Ref) -> Result<usize>;

    /// Item of a sequence; `Ok(None)` when the index is out of range
    fn item(&self, seq: &Self::Ref, index: usize) -> Result<Option<Self::Ref>>;

    /// Build a list taking ownership of `items`
    fn new_list(&self, items: Vec<Self::Ref>) -> Result<Self::Ref>;

    fn new_int(&self, value: i64) -> Result<Self::Ref>;

    fn new_float(&self, value: f64) -> Result<Self::Ref>;

    fn new_bool(&self, value: bool) -> Result<Self::Ref>;

    fn new_text(&self, bytes: &[u8]) -> Result<Self::Ref>;
}
