//! The `spice` record kinds
//!
//! Initializers mirror the managed-side classes: a fresh `Cell` is filled with
//! placeholder items of its data type, geometry records start at zero vectors.

use super::object::ClassDef;
use super::store::{Handle, ObjectStore};
use crate::config::RegistryConfig;
use crate::errors::{MarshalError, Result};
use crate::interop::{fields, Primitive};
use crate::records::{DataType, CTRL_SIZE};

/// Shortest character slot a managed `Cell` is created with
pub const MIN_CHAR_LEN: i64 = 6;

impl ObjectStore {
    /// Store with the record-kind module described by `registry` installed
    pub fn with_spice_module(registry: &RegistryConfig) -> Self {
        let store = Self::new();
        store.install_spice_module(registry);
        store
    }

    pub fn install_spice_module(&self, registry: &RegistryConfig) {
        let classes = vec![
            class(self, &registry.cell, &["dtArg", "szArg", registry.length_keyword.as_str()], cell_init),
            class(self, &registry.plane, &[fields::NORMAL, fields::CONSTANT], plane_init),
            class(
                self,
                &registry.ellipse,
                &[fields::CENTER, fields::SEMI_MAJOR, fields::SEMI_MINOR],
                ellipse_init,
            ),
            class(self, &registry.ek_att_dsc, &[], ek_att_dsc_init),
            class(self, &registry.ek_seg_sum, &[], ek_seg_sum_init),
        ];
        self.install_module(&registry.module, classes);
    }
}

fn class<'s>(
    store: &'s ObjectStore,
    name: &str,
    params: &[&str],
    init: super::object::InitFn,
) -> (String, Handle<'s>) {
    let def = ClassDef {
        name: name.to_string(),
        params: params.iter().map(|p| p.to_string()).collect(),
        init,
    };
    (name.to_string(), store.class(def))
}

/// `int(arg)` for ints and floats
fn int_arg(store: &ObjectStore, arg: &Handle<'_>, param: &str) -> Result<i64> {
    match store.primitive(arg) {
        Primitive::Int(v) => Ok(v),
        Primitive::BigInt(v) => i64::try_from(v)
            .map_err(|_| MarshalError::host(format!("{} out of range", param))),
        Primitive::Float(v) if v.is_finite() => Ok(v.trunc() as i64),
        other => Err(MarshalError::host(format!(
            "{} must be a number, not {}",
            param,
            other.type_name()
        ))),
    }
}

fn required<'a, 's>(args: &'a [Option<Handle<'s>>], index: usize, param: &str) -> Result<&'a Handle<'s>> {
    args.get(index)
        .and_then(Option::as_ref)
        .ok_or_else(|| MarshalError::host(format!("missing required argument '{}'", param)))
}

fn zero_vector(store: &ObjectStore) -> Handle<'_> {
    store.list((0..3).map(|_| store.float(0.0)).collect())
}

fn cell_init<'s>(store: &'s ObjectStore, this: &Handle<'s>, args: &[Option<Handle<'s>>]) -> Result<()> {
    let dtype_arg = required(args, 0, "dtArg")?;
    let size_arg = required(args, 1, "szArg")?;

    let dtype = int_arg(store, dtype_arg, "dtArg")?;
    let size = usize::try_from(int_arg(store, size_arg, "szArg")?)
        .map_err(|_| MarshalError::host("szArg must not be negative"))?;

    let tag = i32::try_from(dtype).ok().and_then(DataType::from_tag);
    let (length, fill) = match tag {
        Some(DataType::Character) => {
            let requested = match args.get(2).and_then(Option::as_ref) {
                Some(arg) => int_arg(store, arg, "lenArg")?,
                None => MIN_CHAR_LEN,
            };
            let length = requested.max(MIN_CHAR_LEN);
            (length, store.text(&vec![b' '; length as usize - 1]))
        }
        Some(DataType::DoublePrecision) | Some(DataType::Time) => (0, store.float(0.0)),
        Some(DataType::Integer) => (0, store.int(0)),
        Some(DataType::Boolean) => (0, store.bool(true)),
        None => return Err(MarshalError::host(format!("Invalid type: {}", dtype))),
    };

    store.set_attr(this, fields::DTYPE, dtype_arg.clone())?;
    store.set_attr(this, fields::LENGTH, store.int(length))?;
    store.set_attr(this, fields::SIZE, size_arg.clone())?;
    store.set_attr(this, fields::CARD, store.int(0))?;
    store.set_attr(this, fields::IS_SET, store.bool(false))?;
    store.set_attr(this, fields::ADJUST, store.bool(false))?;
    store.set_attr(this, fields::INIT, store.bool(false))?;
    store.set_attr(this, fields::BASE, store.list(vec![fill.clone(); CTRL_SIZE]))?;
    store.set_attr(this, fields::DATA, store.list(vec![fill; size]))?;
    Ok(())
}

fn plane_init<'s>(store: &'s ObjectStore, this: &Handle<'s>, args: &[Option<Handle<'s>>]) -> Result<()> {
    let normal = match args.first().and_then(Option::as_ref) {
        Some(normal) => normal.clone(),
        None => zero_vector(store),
    };
    let constant = match args.get(1).and_then(Option::as_ref) {
        Some(constant) => constant.clone(),
        None => store.float(0.0),
    };

    store.set_attr(this, fields::NORMAL, normal)?;
    store.set_attr(this, fields::CONSTANT, constant)
}

fn ellipse_init<'s>(store: &'s ObjectStore, this: &Handle<'s>, args: &[Option<Handle<'s>>]) -> Result<()> {
    for (index, name) in [fields::CENTER, fields::SEMI_MAJOR, fields::SEMI_MINOR]
        .into_iter()
        .enumerate()
    {
        let value = match args.get(index).and_then(Option::as_ref) {
            Some(value) => value.clone(),
            None => zero_vector(store),
        };
        store.set_attr(this, name, value)?;
    }
    Ok(())
}

fn ek_att_dsc_init<'s>(store: &'s ObjectStore, this: &Handle<'s>, _args: &[Option<Handle<'s>>]) -> Result<()> {
    for name in [fields::CCLASS, fields::DTYPE, fields::STRLEN, fields::SIZE] {
        store.set_attr(this, name, store.int(0))?;
    }
    store.set_attr(this, fields::INDEXD, store.bool(false))?;
    store.set_attr(this, fields::NULLOK, store.bool(false))
}

fn ek_seg_sum_init<'s>(store: &'s ObjectStore, this: &Handle<'s>, _args: &[Option<Handle<'s>>]) -> Result<()> {
    store.set_attr(this, fields::TABNAM, store.text(b""))?;
    store.set_attr(this, fields::NROWS, store.int(0))?;
    store.set_attr(this, fields::NCOLS, store.int(0))?;
    store.set_attr(this, fields::CNAMES, store.list(Vec::new()))?;
    store.set_attr(this, fields::CDESCRS, store.list(Vec::new()))
}
