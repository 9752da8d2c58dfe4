//! Typed attribute accessors
//!
//! Each accessor looks up one named attribute and tries the accepted source
//! representations in a fixed priority order. The first match wins; when none
//! matches the read fails with `AttributeTypeMismatch`. The reference taken by
//! the lookup is released before returning.

use super::host::{ObjectSystem, Primitive};
use crate::errors::{MarshalError, Result};
use crate::records::SpiceInt;
use num_traits::NumCast;

/// Source representation an accessor is willing to read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Bool,
    Int,
    BigInt,
    Float,
}

/// Value matched by a `SourceKind`
#[derive(Debug, Clone, Copy, PartialEq)]
enum Scalar {
    Bool(bool),
    Int(i128),
    Float(f64),
}

impl SourceKind {
    fn accept(self, value: &Primitive) -> Option<Scalar> {
        match (self, value) {
            (Self::Bool, Primitive::Bool(b)) => Some(Scalar::Bool(*b)),
            (Self::Int, Primitive::Int(v)) => Some(Scalar::Int(*v as i128)),
            (Self::BigInt, Primitive::BigInt(v)) => Some(Scalar::Int(*v)),
            (Self::Float, Primitive::Float(v)) => Some(Scalar::Float(*v)),
            _ => None,
        }
    }
}

/// Data type tags
pub const TAG_SOURCES: &[SourceKind] = &[SourceKind::Int, SourceKind::BigInt];
/// Generic numbers: float first, then integers
pub const NUMBER_SOURCES: &[SourceKind] = &[SourceKind::Float, SourceKind::Int, SourceKind::BigInt];
/// Integer fields: integers first, floats truncated toward zero
pub const INTEGER_SOURCES: &[SourceKind] = &[SourceKind::Int, SourceKind::BigInt, SourceKind::Float];
pub const BOOL_SOURCES: &[SourceKind] = &[SourceKind::Bool];

/// Fetch a required attribute
pub fn lookup<H: ObjectSystem>(host: &H, obj: &H::Ref, attr: &str) -> Result<H::Ref> {
    host.get_attr(obj, attr)?
        .ok_or_else(|| MarshalError::missing(attr))
}

/// Fetch a required attribute and check it is a sequence, returning its length
pub fn sequence_attr<H: ObjectSystem>(host: &H, obj: &H::Ref, attr: &str) -> Result<(H::Ref, usize)> {
    let seq = lookup(host, obj, attr)?;
    let len = host.seq_len(&seq).map_err(|_| MarshalError::AttributeTypeMismatch {
        attr: attr.to_string(),
        expected: "sequence",
        found: host.inspect(&seq).type_name().to_string(),
    })?;
    Ok((seq, len))
}

fn read_scalar<H: ObjectSystem>(
    host: &H,
    obj: &H::Ref,
    attr: &str,
    sources: &[SourceKind],
    expected: &'static str,
) -> Result<Scalar> {
    let value = lookup(host, obj, attr)?;
    let primitive = host.inspect(&value);

    sources
        .iter()
        .find_map(|kind| kind.accept(&primitive))
        .ok_or_else(|| mismatch(attr, expected, primitive.type_name()))
}

fn mismatch(attr: &str, expected: &'static str, found: &str) -> MarshalError {
    MarshalError::AttributeTypeMismatch {
        attr: attr.to_string(),
        expected,
        found: found.to_string(),
    }
}

/// Read a data type tag (int, big int)
pub fn tag_attr<H: ObjectSystem>(host: &H, obj: &H::Ref, attr: &str) -> Result<i32> {
    match read_scalar(host, obj, attr, TAG_SOURCES, "int")? {
        Scalar::Int(v) => <i32 as NumCast>::from(v).ok_or_else(|| mismatch(attr, "int", "out-of-range int")),
        other => Err(mismatch(attr, "int", scalar_name(other))),
    }
}

/// Read a generic number (float, int, big int)
pub fn number_attr<H: ObjectSystem>(host: &H, obj: &H::Ref, attr: &str) -> Result<f64> {
    match read_scalar(host, obj, attr, NUMBER_SOURCES, "float")? {
        Scalar::Float(v) => Ok(v),
        Scalar::Int(v) => Ok(v as f64),
        other => Err(mismatch(attr, "float", scalar_name(other))),
    }
}

/// Read a native integer (int, big int, float truncated)
pub fn int_attr<H: ObjectSystem>(host: &H, obj: &H::Ref, attr: &str) -> Result<SpiceInt> {
    let converted = match read_scalar(host, obj, attr, INTEGER_SOURCES, "int")? {
        Scalar::Int(v) => <SpiceInt as NumCast>::from(v),
        Scalar::Float(v) => <SpiceInt as NumCast>::from(v),
        Scalar::Bool(_) => None,
    };
    converted.ok_or_else(|| mismatch(attr, "int", "out-of-range number"))
}

/// Read a boolean (bool only)
pub fn bool_attr<H: ObjectSystem>(host: &H, obj: &H::Ref, attr: &str) -> Result<bool> {
    match read_scalar(host, obj, attr, BOOL_SOURCES, "bool")? {
        Scalar::Bool(b) => Ok(b),
        other => Err(mismatch(attr, "bool", scalar_name(other))),
    }
}

/// Read a text attribute
pub fn text_attr<H: ObjectSystem>(host: &H, obj: &H::Ref, attr: &str) -> Result<String> {
    let value = lookup(host, obj, attr)?;
    match host.inspect(&value) {
        Primitive::Text(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        other => Err(mismatch(attr, "str", other.type_name())),
    }
}

fn scalar_name(scalar: Scalar) -> &'static str {
    match scalar {
        Scalar::Bool(_) => "bool",
        Scalar::Int(_) => "int",
        Scalar::Float(_) => "float",
    }
}

/// Coerce a sequence element to a double (float, int, big int)
pub(crate) fn element_to_double(value: &Primitive) -> Option<f64> {
    NUMBER_SOURCES.iter().find_map(|kind| match kind.accept(value)? {
        Scalar::Float(v) => Some(v),
        Scalar::Int(v) => Some(v as f64),
        Scalar::Bool(_) => None,
    })
}

/// Coerce a sequence element to a native integer (int, big int, float truncated)
pub(crate) fn element_to_int(value: &Primitive) -> Option<SpiceInt> {
    INTEGER_SOURCES.iter().find_map(|kind| match kind.accept(value)? {
        Scalar::Int(v) => <SpiceInt as NumCast>::from(v),
        Scalar::Float(v) => <SpiceInt as NumCast>::from(v),
        Scalar::Bool(_) => None,
    })
}
