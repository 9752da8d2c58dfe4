//! Reference object runtime
//!
//! Design: a small refcounted object model implementing `ObjectSystem`, with
//! the `spice` record kinds installed as classes. It gives the marshaller a
//! managed side to run against without an embedded interpreter, and makes
//! reference leaks observable through `live_objects` and `refcount`.
//!
//! Architecture:
//! - `object.rs` - heap object variants and class definitions
//! - `store.rs` - slot heap, `Handle` RAII references, `ObjectSystem` impl
//! - `classes.rs` - `Cell`, `Plane`, `Ellipse`, `EkAttDsc`, `EkSegSum`

mod classes;
mod object;
mod store;

pub use classes::MIN_CHAR_LEN;
pub use object::{ClassDef, InitFn, ObjId, Object};
pub use store::{Handle, ObjectStore};
