//! Interoperability - managed objects ↔ native records
//!
//! Design: every record kind has a fixed schema of attribute names and the
//! accessor used for each. Conversions are all-or-nothing; managed references
//! and native buffers are RAII so any early return releases them.
//!
//! Architecture:
//! - `host.rs` - object system seam (`ObjectSystem`, `Primitive`)
//! - `accessors.rs` - typed attribute getters with coercion priorities
//! - `decode.rs` - managed Cell → native `Cell`
//! - `encode.rs` - native cell → managed Cell
//! - `geometry.rs` - Plane and Ellipse converters
//! - `ek.rs` - EK descriptor converters
//! - `stats.rs` - per-thread conversion and buffer counters

mod accessors;
mod decode;
mod ek;
mod encode;
mod geometry;
mod host;
pub(crate) mod stats;

pub use accessors::{
    bool_attr, int_attr, lookup, number_attr, tag_attr, text_attr, SourceKind, BOOL_SOURCES,
    INTEGER_SOURCES, NUMBER_SOURCES, TAG_SOURCES,
};
pub use host::{ObjectSystem, Primitive};
pub(crate) use host::require_sequence;
pub use stats::{reset_stats, stats, InteropStats};

use crate::config::RegistryConfig;
use crate::errors::{MarshalError, Result};
use crate::logging;

/// Attribute names of the managed record kinds
pub mod fields {
    pub const DTYPE: &str = "dtype";
    pub const LENGTH: &str = "length";
    pub const SIZE: &str = "size";
    pub const CARD: &str = "card";
    pub const IS_SET: &str = "isSet";
    pub const ADJUST: &str = "adjust";
    pub const INIT: &str = "init";
    pub const BASE: &str = "base";
    pub const DATA: &str = "data";

    pub const NORMAL: &str = "normal";
    pub const CONSTANT: &str = "constant";

    pub const CENTER: &str = "center";
    pub const SEMI_MAJOR: &str = "semi_major";
    pub const SEMI_MINOR: &str = "semi_minor";

    pub const CCLASS: &str = "cclass";
    pub const STRLEN: &str = "strlen";
    pub const INDEXD: &str = "indexd";
    pub const NULLOK: &str = "nullok";

    pub const TABNAM: &str = "tabnam";
    pub const NROWS: &str = "nrows";
    pub const NCOLS: &str = "ncols";
    pub const CNAMES: &str = "cnames";
    pub const CDESCRS: &str = "cdescrs";
}

/// Converter between one object system and native records
#[derive(Debug)]
pub struct Marshaller<H: ObjectSystem> {
    host: H,
    registry: RegistryConfig,
}

impl<H: ObjectSystem> Marshaller<H> {
    pub fn new(host: H, registry: RegistryConfig) -> Self {
        Self { host, registry }
    }

    /// Marshaller using the default `spice` registry
    pub fn with_defaults(host: H) -> Self {
        Self::new(host, RegistryConfig::default())
    }

    #[inline]
    pub fn host(&self) -> &H {
        &self.host
    }

    #[inline]
    pub fn registry(&self) -> &RegistryConfig {
        &self.registry
    }

    /// Look up a record kind in the registry module
    fn record_kind(&self, name: &str) -> Result<H::Ref> {
        let module = self.host.import(&self.registry.module)?;
        self.host
            .get_attr(&module, name)?
            .ok_or_else(|| MarshalError::missing(format!("{}.{}", self.registry.module, name)))
    }

    /// Construct a record kind with no arguments
    fn instantiate(&self, name: &str) -> Result<H::Ref> {
        let kind = self.record_kind(name)?;
        self.host.call(&kind, &[], &[])
    }

    /// Build a managed list of floats
    fn float_list(&self, values: &[f64]) -> Result<H::Ref> {
        let items = values
            .iter()
            .map(|&v| self.host.new_float(v))
            .collect::<Result<Vec<_>>>()?;
        self.host.new_list(items)
    }

    /// Record the outcome of one public conversion
    fn finish<T>(&self, op: &'static str, result: Result<T>) -> Result<T> {
        match &result {
            Ok(_) => {
                stats::note_conversion();
                logging::log_conversion(op);
            }
            Err(err) => {
                stats::note_error();
                logging::log_marshal_error(op, err);
            }
        }
        result
    }
}

#[cfg(test)]
mod tests;
