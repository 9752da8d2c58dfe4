//! spice-marshal - conversion between CSPICE records and managed objects
//!
//! Native cells, planes, ellipses and EK descriptors are converted to and from
//! objects of a managed runtime reached through the `ObjectSystem` seam.

// Core modules
pub mod config;
pub mod errors;
pub mod ffi;
pub mod interop;
pub mod logging;
pub mod records;
pub mod runtime;

#[cfg(feature = "python")]
pub mod python;

// Re-export commonly used items
pub use config::{Config, ConfigError, RegistryConfig};
pub use errors::{MarshalError, Result};
pub use interop::{stats, InteropStats, Marshaller, ObjectSystem, Primitive};
pub use records::{
    Cell, CellHeader, CellRef, DataType, EkAttDsc, EkSegSum, Ellipse, ItemLayout, Plane, RawCell,
    CTRL_SIZE,
};
pub use runtime::{Handle, ObjectStore};
