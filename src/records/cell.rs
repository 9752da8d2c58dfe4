//! Native cell records
//!
//! A cell is a header plus one contiguous buffer laid out as
//! `[control segment][data segment]`. The control segment always holds
//! `CTRL_SIZE` items; the data segment holds `size` items. All items share the
//! width resolved by `ItemLayout`.
//!
//! - `CellBuffer` owns zeroed native storage and releases it on drop
//! - `Cell` is an owned record (decoded, or built on the native side)
//! - `CellRef` borrows a record produced elsewhere for encoding
//! - `RawCell` is the C layout handed to and received from native code

use super::layout::{DataType, ItemLayout};
use super::{SpiceBoolean, SpiceDouble, SpiceInt, CTRL_SIZE, SPICEFALSE, SPICETRUE};
use crate::errors::{MarshalError, Result};
use crate::interop::stats;
use crate::logging::trace;
use core::ffi::c_void;
use core::ptr::NonNull;
use std::alloc::{alloc_zeroed, dealloc, Layout};

/// Alignment of cell storage, enough for every item type
const BUFFER_ALIGN: usize = 8;

/// Owned, zero-initialized native storage for a cell
pub struct CellBuffer {
    ptr: NonNull<u8>,
    len: usize,
}

impl CellBuffer {
    /// Allocate `len` zeroed bytes
    pub fn zeroed(len: usize) -> Result<Self> {
        if len == 0 {
            return Ok(Self { ptr: NonNull::dangling(), len: 0 });
        }

        let layout = Layout::from_size_align(len, BUFFER_ALIGN)
            .map_err(|_| MarshalError::AllocationFailure { bytes: len })?;

        let raw = unsafe { alloc_zeroed(layout) };
        let ptr = NonNull::new(raw).ok_or(MarshalError::AllocationFailure { bytes: len })?;

        stats::note_buffer_allocated();
        trace!(event = "cell_buffer_alloc", size_bytes = len, address = ?raw);

        Ok(Self { ptr, len })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        unsafe { core::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        unsafe { core::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    #[inline]
    fn as_mut_ptr(&mut self) -> *mut u8 {
        self.ptr.as_ptr()
    }
}

impl Drop for CellBuffer {
    fn drop(&mut self) {
        if self.len == 0 {
            return;
        }

        trace!(event = "cell_buffer_release", size_bytes = self.len, address = ?self.ptr.as_ptr());

        unsafe {
            let layout = Layout::from_size_align_unchecked(self.len, BUFFER_ALIGN);
            dealloc(self.ptr.as_ptr(), layout);
        }
        stats::note_buffer_released();
    }
}

impl core::fmt::Debug for CellBuffer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "CellBuffer {{ len: {} }}", self.len)
    }
}

/// Scalar part of a cell record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellHeader {
    /// Raw type tag; unknown tags are kept so they can be rejected explicitly
    pub dtype: i32,
    pub length: SpiceInt,
    pub size: SpiceInt,
    pub card: SpiceInt,
    pub is_set: bool,
    pub adjust: bool,
    pub init: bool,
}

impl CellHeader {
    pub fn new(dtype: DataType, size: SpiceInt, length: SpiceInt) -> Self {
        Self {
            dtype: dtype.tag(),
            length,
            size,
            card: 0,
            is_set: false,
            adjust: false,
            init: false,
        }
    }
}

/// Borrowed view of a cell, used as encoder input
#[derive(Debug, Clone, Copy)]
pub struct CellRef<'a> {
    header: CellHeader,
    layout: ItemLayout,
    bytes: &'a [u8],
}

impl<'a> CellRef<'a> {
    /// Validate a header against its buffer
    pub fn new(header: CellHeader, bytes: &'a [u8]) -> Result<Self> {
        let layout = ItemLayout::resolve(header.dtype, header.length)?;
        let size = checked_size(header.size)?;
        let expected = layout
            .buffer_len(size)
            .ok_or(MarshalError::AllocationFailure { bytes: usize::MAX })?;

        if bytes.len() != expected {
            return Err(MarshalError::shape("buffer", expected, bytes.len() as i64));
        }

        Ok(Self { header, layout, bytes })
    }

    /// Borrow a natively produced cell
    ///
    /// # Safety
    /// `raw.base` must point to at least `(CTRL_SIZE + size) * width` readable
    /// bytes that stay valid and unmodified for `'a`.
    pub unsafe fn from_raw(raw: &'a RawCell) -> Result<Self> {
        let header = raw.header();
        let layout = ItemLayout::resolve(header.dtype, header.length)?;
        let size = checked_size(header.size)?;
        let len = layout
            .buffer_len(size)
            .ok_or(MarshalError::AllocationFailure { bytes: usize::MAX })?;

        if raw.base.is_null() {
            return Err(MarshalError::shape("base", len, 0));
        }

        let bytes = core::slice::from_raw_parts(raw.base as *const u8, len);
        Ok(Self { header, layout, bytes })
    }

    #[inline]
    pub fn header(&self) -> &CellHeader {
        &self.header
    }

    #[inline]
    pub fn layout(&self) -> ItemLayout {
        self.layout
    }

    /// Items in the buffer, control segment included
    #[inline]
    pub fn item_count(&self) -> usize {
        CTRL_SIZE + self.header.size as usize
    }

    #[inline]
    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Bytes of item `index` (absolute, control segment first)
    ///
    /// # Panics
    /// Panics if `index >= self.item_count()`.
    #[inline]
    pub fn item(&self, index: usize) -> &'a [u8] {
        let width = self.layout.width();
        &self.bytes[index * width..(index + 1) * width]
    }

    /// Integer item at `index`
    ///
    /// # Panics
    /// Panics if `index >= self.item_count()` or the items are not 4 bytes wide.
    pub fn int_at(&self, index: usize) -> SpiceInt {
        let mut raw = [0u8; core::mem::size_of::<SpiceInt>()];
        raw.copy_from_slice(self.item(index));
        SpiceInt::from_ne_bytes(raw)
    }

    /// Double item at `index`
    ///
    /// # Panics
    /// Panics if `index >= self.item_count()` or the items are not 8 bytes wide.
    pub fn double_at(&self, index: usize) -> SpiceDouble {
        let mut raw = [0u8; core::mem::size_of::<SpiceDouble>()];
        raw.copy_from_slice(self.item(index));
        SpiceDouble::from_ne_bytes(raw)
    }

    /// Stored text of a character item, ending at the first NUL
    ///
    /// # Panics
    /// Panics if `index >= self.item_count()`.
    pub fn text_at(&self, index: usize) -> &'a [u8] {
        let slot = self.item(index);
        let end = slot.iter().position(|&b| b == 0).unwrap_or(slot.len());
        &slot[..end]
    }
}

/// Owned cell record backed by a `CellBuffer`
#[derive(Debug)]
pub struct Cell {
    header: CellHeader,
    layout: ItemLayout,
    buffer: CellBuffer,
}

impl Cell {
    /// Create an empty cell with zeroed storage
    ///
    /// `length` is the character slot width and is ignored for numeric cells.
    pub fn new(dtype: DataType, size: usize, length: SpiceInt) -> Result<Self> {
        let length = if dtype == DataType::Character { length } else { 0 };
        let layout = ItemLayout::resolve(dtype.tag(), length)?;
        let size_native = SpiceInt::try_from(size)
            .map_err(|_| MarshalError::AllocationFailure { bytes: usize::MAX })?;
        let len = layout
            .buffer_len(size)
            .ok_or(MarshalError::AllocationFailure { bytes: usize::MAX })?;

        Ok(Self {
            header: CellHeader::new(dtype, size_native, length),
            layout,
            buffer: CellBuffer::zeroed(len)?,
        })
    }

    /// Assemble a record from a validated header and matching buffer
    pub(crate) fn from_parts(header: CellHeader, layout: ItemLayout, buffer: CellBuffer) -> Self {
        debug_assert_eq!(layout.buffer_len(header.size as usize), Some(buffer.len()));
        Self { header, layout, buffer }
    }

    #[inline]
    pub fn header(&self) -> &CellHeader {
        &self.header
    }

    #[inline]
    pub fn layout(&self) -> ItemLayout {
        self.layout
    }

    #[inline]
    pub fn data_type(&self) -> DataType {
        self.layout.data_type()
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.header.size as usize
    }

    #[inline]
    pub fn card(&self) -> usize {
        self.header.card as usize
    }

    /// Whole buffer, control segment included
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        self.buffer.as_slice()
    }

    #[inline]
    pub fn as_cell_ref(&self) -> CellRef<'_> {
        CellRef {
            header: self.header,
            layout: self.layout,
            bytes: self.buffer.as_slice(),
        }
    }

    pub fn set_card(&mut self, card: usize) -> Result<()> {
        if card > self.size() {
            return Err(MarshalError::shape("card", self.size(), card as i64));
        }
        self.header.card = card as SpiceInt;
        Ok(())
    }

    pub fn set_flags(&mut self, is_set: bool, adjust: bool, init: bool) {
        self.header.is_set = is_set;
        self.header.adjust = adjust;
        self.header.init = init;
    }

    /// Mutable bytes of item `index` (absolute, control segment first)
    pub(crate) fn item_mut(&mut self, index: usize) -> &mut [u8] {
        let width = self.layout.width();
        &mut self.buffer.as_mut_slice()[index * width..(index + 1) * width]
    }

    /// Append an integer to the data segment
    pub fn append_int(&mut self, value: SpiceInt) -> Result<()> {
        let slot = self.next_slot(ItemLayout::Integer)?;
        self.item_mut(slot).copy_from_slice(&value.to_ne_bytes());
        self.header.card += 1;
        Ok(())
    }

    /// Append a double to the data segment
    pub fn append_double(&mut self, value: SpiceDouble) -> Result<()> {
        let slot = self.next_slot(ItemLayout::Double)?;
        self.item_mut(slot).copy_from_slice(&value.to_ne_bytes());
        self.header.card += 1;
        Ok(())
    }

    /// Append a string to the data segment, truncated to the slot width
    pub fn append_text(&mut self, value: &str) -> Result<()> {
        let width = self.layout.width();
        let slot = self.next_slot(ItemLayout::Character { width })?;
        let item = self.item_mut(slot);
        let n = value.len().min(width);
        item[..n].copy_from_slice(&value.as_bytes()[..n]);
        item[n..].fill(0);
        self.header.card += 1;
        Ok(())
    }

    fn next_slot(&self, wanted: ItemLayout) -> Result<usize> {
        let index = CTRL_SIZE + self.card();
        if self.layout != wanted {
            return Err(MarshalError::ConversionError {
                index,
                expected: self.layout.managed_type_name(),
                found: wanted.managed_type_name().to_string(),
            });
        }
        if self.card() >= self.size() {
            return Err(MarshalError::shape("card", self.size(), self.card() as i64 + 1));
        }
        Ok(index)
    }

    /// C view of this cell; its pointers stay valid while `self` is alive
    pub fn as_raw(&mut self) -> RawCell {
        let width = self.layout.width();
        let base = self.buffer.as_mut_ptr();
        let data = if self.buffer.is_empty() {
            base
        } else {
            unsafe { base.add(CTRL_SIZE * width) }
        };

        RawCell {
            dtype: self.header.dtype,
            length: self.header.length,
            size: self.header.size,
            card: self.header.card,
            is_set: to_spice_bool(self.header.is_set),
            adjust: to_spice_bool(self.header.adjust),
            init: to_spice_bool(self.header.init),
            base: base as *mut c_void,
            data: data as *mut c_void,
        }
    }

    /// Hand ownership to native code
    ///
    /// The returned pointer must be released with `Cell::from_raw` or
    /// `spice_marshal_cell_free`.
    pub fn into_raw(mut self) -> *mut RawCell {
        let raw = self.as_raw();
        let owned = Box::new(OwnedRawCell { raw, cell: self });
        Box::into_raw(owned) as *mut RawCell
    }

    /// Take back a cell created by `into_raw`
    ///
    /// Header fields native code may have updated (card, flags) are read back.
    ///
    /// # Safety
    /// `ptr` must come from `Cell::into_raw` and must not be used afterwards.
    pub unsafe fn from_raw(ptr: *mut RawCell) -> Cell {
        let owned = Box::from_raw(ptr as *mut OwnedRawCell);
        let OwnedRawCell { raw, mut cell } = *owned;

        let card = raw.card.clamp(0, cell.header.size);
        cell.header.card = card;
        cell.header.is_set = raw.is_set != SPICEFALSE;
        cell.header.adjust = raw.adjust != SPICEFALSE;
        cell.header.init = raw.init != SPICEFALSE;
        cell
    }
}

/// C layout of a cell (matches CSPICE `SpiceCell`)
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawCell {
    pub dtype: i32,
    pub length: SpiceInt,
    pub size: SpiceInt,
    pub card: SpiceInt,
    pub is_set: SpiceBoolean,
    pub adjust: SpiceBoolean,
    pub init: SpiceBoolean,
    pub base: *mut c_void,
    pub data: *mut c_void,
}

impl RawCell {
    pub fn header(&self) -> CellHeader {
        CellHeader {
            dtype: self.dtype,
            length: self.length,
            size: self.size,
            card: self.card,
            is_set: self.is_set != SPICEFALSE,
            adjust: self.adjust != SPICEFALSE,
            init: self.init != SPICEFALSE,
        }
    }
}

/// Heap block behind `Cell::into_raw`; `raw` must stay the first field
#[repr(C)]
struct OwnedRawCell {
    raw: RawCell,
    cell: Cell,
}

#[inline]
fn to_spice_bool(value: bool) -> SpiceBoolean {
    if value {
        SPICETRUE
    } else {
        SPICEFALSE
    }
}

fn checked_size(size: SpiceInt) -> Result<usize> {
    usize::try_from(size).map_err(|_| MarshalError::shape("size", 0, size as i64))
}
