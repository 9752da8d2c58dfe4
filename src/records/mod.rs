//! Native record definitions
//!
//! C-compatible layouts of the records exchanged with the ephemeris library:
//! cells, planes, ellipses and EK descriptors. Nothing here talks to the
//! managed object system; see `interop` for the conversions.

pub mod cell;
pub mod ek;
pub mod geometry;
pub mod layout;

pub use cell::{Cell, CellBuffer, CellHeader, CellRef, RawCell};
pub use ek::{EkAttDsc, EkSegSum, RawEkAttDsc, RawEkSegSum};
pub use geometry::{Ellipse, Plane};
pub use layout::{DataType, ItemLayout};

/// Native integer (`SpiceInt`)
pub type SpiceInt = i32;
/// Native double (`SpiceDouble`)
pub type SpiceDouble = f64;
/// Native boolean (`SpiceBoolean`)
pub type SpiceBoolean = i32;

pub const SPICETRUE: SpiceBoolean = 1;
pub const SPICEFALSE: SpiceBoolean = 0;

/// Reserved control items at the front of every cell buffer
pub const CTRL_SIZE: usize = 6;
