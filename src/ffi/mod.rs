//! Foreign Function Interface
//!
//! C entry points for native code holding cells created on the Rust side.
//! A cell handed out by `Cell::into_raw` (or `spice_marshal_cell_new`) must be
//! returned through `spice_marshal_cell_free` exactly once.

use crate::logging::{log_ffi_call, trace};
use crate::records::{Cell, DataType, ItemLayout, RawCell, SpiceInt};

/// Create an empty cell; null on unsupported type or allocation failure
#[no_mangle]
pub extern "C" fn spice_marshal_cell_new(dtype: i32, size: SpiceInt, length: SpiceInt) -> *mut RawCell {
    log_ffi_call("spice_marshal_cell_new");

    let Some(dtype) = DataType::from_tag(dtype) else {
        return std::ptr::null_mut();
    };
    let Ok(size) = usize::try_from(size) else {
        return std::ptr::null_mut();
    };

    match Cell::new(dtype, size, length) {
        Ok(cell) => cell.into_raw(),
        Err(err) => {
            trace!(event = "cell_new_failed", error = %err);
            std::ptr::null_mut()
        }
    }
}

/// Release a cell created on the Rust side
///
/// # Safety
/// - `cell` must come from `Cell::into_raw` or `spice_marshal_cell_new`, or be null
/// - `cell` must not be used afterwards
#[no_mangle]
pub unsafe extern "C" fn spice_marshal_cell_free(cell: *mut RawCell) {
    if cell.is_null() {
        return;
    }

    log_ffi_call("spice_marshal_cell_free");
    drop(Cell::from_raw(cell));
}

/// Byte width of one item of `cell`; -1 for null or unsupported cells
///
/// # Safety
/// `cell` must point to a readable `RawCell` or be null.
#[no_mangle]
pub unsafe extern "C" fn spice_marshal_cell_element_width(cell: *const RawCell) -> isize {
    let Some(raw) = cell.as_ref() else {
        return -1;
    };

    ItemLayout::resolve(raw.dtype, raw.length)
        .ok()
        .and_then(|layout| isize::try_from(layout.width()).ok())
        .unwrap_or(-1)
}
