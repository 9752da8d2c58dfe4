//! Heap object representation
//!
//! Objects refer to each other by `ObjId`. Every id stored inside an object
//! owns one reference to its target, released when the container is freed.

use super::store::{Handle, ObjectStore};
use crate::errors::Result;
use std::collections::BTreeMap;

/// Index of a heap slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjId(pub(crate) u32);

impl ObjId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Initializer run by a class call on the fresh instance
///
/// `args` holds one entry per declared parameter, `None` when not supplied.
pub type InitFn = for<'s> fn(&'s ObjectStore, &Handle<'s>, &[Option<Handle<'s>>]) -> Result<()>;

/// A class: a name, its parameter list and an initializer
#[derive(Clone)]
pub struct ClassDef {
    pub name: String,
    pub params: Vec<String>,
    pub init: InitFn,
}

impl std::fmt::Debug for ClassDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassDef")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub enum Object {
    None,
    Bool(bool),
    Int(i64),
    BigInt(i128),
    Float(f64),
    Str(Vec<u8>),
    List(Vec<ObjId>),
    Module {
        name: String,
        attrs: BTreeMap<String, ObjId>,
    },
    Class(ClassDef),
    Instance {
        class: ObjId,
        attrs: BTreeMap<String, ObjId>,
    },
}

impl Object {
    /// Ids this object holds a reference to
    pub(crate) fn children(&self) -> Vec<ObjId> {
        match self {
            Self::List(items) => items.clone(),
            Self::Module { attrs, .. } => attrs.values().copied().collect(),
            Self::Instance { class, attrs } => {
                let mut ids: Vec<ObjId> = attrs.values().copied().collect();
                ids.push(*class);
                ids
            }
            _ => Vec::new(),
        }
    }

    pub(crate) fn attrs_mut(&mut self) -> Option<&mut BTreeMap<String, ObjId>> {
        match self {
            Self::Module { attrs, .. } | Self::Instance { attrs, .. } => Some(attrs),
            _ => None,
        }
    }

    pub(crate) fn attrs(&self) -> Option<&BTreeMap<String, ObjId>> {
        match self {
            Self::Module { attrs, .. } | Self::Instance { attrs, .. } => Some(attrs),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::None => "NoneType",
            Self::Bool(_) => "bool",
            Self::Int(_) | Self::BigInt(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "str",
            Self::List(_) => "list",
            Self::Module { .. } => "module",
            Self::Class(_) => "type",
            Self::Instance { .. } => "object",
        }
    }
}
