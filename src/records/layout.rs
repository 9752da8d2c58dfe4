//! Type-length resolution for cell items
//!
//! Every element of a cell buffer, control segment included, has the same
//! width. The width comes from the data type tag, and for character cells
//! from the declared slot length. Both marshalling directions size and offset
//! buffers through `ItemLayout` only.

use super::{SpiceDouble, SpiceInt, CTRL_SIZE};
use crate::errors::{MarshalError, Result};

/// Cell data type tag (order matches CSPICE `_SpiceDataType`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum DataType {
    Character = 0,
    DoublePrecision = 1,
    Integer = 2,
    Time = 3,
    Boolean = 4,
}

impl DataType {
    #[inline]
    pub const fn tag(self) -> i32 {
        self as i32
    }

    pub const fn from_tag(tag: i32) -> Option<Self> {
        match tag {
            0 => Some(Self::Character),
            1 => Some(Self::DoublePrecision),
            2 => Some(Self::Integer),
            3 => Some(Self::Time),
            4 => Some(Self::Boolean),
            _ => None,
        }
    }
}

impl TryFrom<i32> for DataType {
    type Error = MarshalError;

    fn try_from(tag: i32) -> Result<Self> {
        Self::from_tag(tag).ok_or(MarshalError::UnsupportedType { tag })
    }
}

/// Resolved per-item layout of a cell buffer
///
/// Only the variants with a defined encoding exist here. Time and Boolean
/// cells never resolve, so every `match` on this type is the complete set of
/// conversion paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemLayout {
    Character { width: usize },
    Integer,
    Double,
}

impl ItemLayout {
    /// Resolve the layout for a raw type tag and declared slot length
    pub fn resolve(tag: i32, length: SpiceInt) -> Result<Self> {
        match DataType::try_from(tag)? {
            DataType::Character => {
                if length < 1 {
                    return Err(MarshalError::InvalidWidth { width: length as i64 });
                }
                Ok(Self::Character { width: length as usize })
            }
            DataType::Integer => Ok(Self::Integer),
            DataType::DoublePrecision => Ok(Self::Double),
            DataType::Time | DataType::Boolean => Err(MarshalError::UnsupportedType { tag }),
        }
    }

    /// Bytes occupied by one item
    #[inline]
    pub const fn width(self) -> usize {
        match self {
            Self::Character { width } => width,
            Self::Integer => core::mem::size_of::<SpiceInt>(),
            Self::Double => core::mem::size_of::<SpiceDouble>(),
        }
    }

    #[inline]
    pub const fn data_type(self) -> DataType {
        match self {
            Self::Character { .. } => DataType::Character,
            Self::Integer => DataType::Integer,
            Self::Double => DataType::DoublePrecision,
        }
    }

    /// Total items in a buffer holding `size` data items
    #[inline]
    pub fn item_count(size: usize) -> Option<usize> {
        CTRL_SIZE.checked_add(size)
    }

    /// Total bytes for a buffer holding `size` data items, `None` on overflow
    pub fn buffer_len(self, size: usize) -> Option<usize> {
        Self::item_count(size)?.checked_mul(self.width())
    }

    /// Managed-side type name for an item (for error messages)
    pub const fn managed_type_name(self) -> &'static str {
        match self {
            Self::Character { .. } => "str",
            Self::Integer => "int",
            Self::Double => "float",
        }
    }
}
