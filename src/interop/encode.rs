//! Native cell → managed Cell
//!
//! The layout is resolved when the `CellRef` is built, so an unsupported data
//! type is rejected before any managed object exists.

use super::fields;
use super::host::ObjectSystem;
use super::Marshaller;
use crate::errors::Result;
use crate::logging::perf;
use crate::records::{Cell, CellRef, ItemLayout, RawCell, CTRL_SIZE};
use std::ops::Range;

impl<H: ObjectSystem> Marshaller<H> {
    /// Encode a borrowed native cell as a new managed Cell
    pub fn encode_cell(&self, cell: &CellRef<'_>) -> Result<H::Ref> {
        let _timer = perf::track("encode_cell");
        let result = self.encode_cell_inner(cell);
        self.finish("encode_cell", result)
    }

    /// Encode an owned cell, releasing its native buffer afterwards
    pub fn encode_owned_cell(&self, cell: Cell) -> Result<H::Ref> {
        let _timer = perf::track("encode_owned_cell");
        let result = self.encode_cell_inner(&cell.as_cell_ref());
        drop(cell);
        self.finish("encode_owned_cell", result)
    }

    /// Encode a cell produced by native code
    ///
    /// # Safety
    /// Same contract as `CellRef::from_raw`.
    pub unsafe fn encode_raw_cell(&self, raw: &RawCell) -> Result<H::Ref> {
        let result = CellRef::from_raw(raw).and_then(|cell| self.encode_cell_inner(&cell));
        self.finish("encode_raw_cell", result)
    }

    fn encode_cell_inner(&self, cell: &CellRef<'_>) -> Result<H::Ref> {
        let host = &self.host;
        let header = cell.header();

        let kind = self.record_kind(&self.registry.cell)?;
        let args = [
            host.new_int(header.dtype as i64)?,
            host.new_int(header.size as i64)?,
        ];
        let kwargs = [(
            self.registry.length_keyword.as_str(),
            host.new_int(header.length as i64)?,
        )];
        let obj = host.call(&kind, &args, &kwargs)?;

        for (name, value) in [
            (fields::DTYPE, header.dtype),
            (fields::LENGTH, header.length),
            (fields::SIZE, header.size),
            (fields::CARD, header.card),
        ] {
            host.set_attr(&obj, name, host.new_int(value as i64)?)?;
        }
        for (name, value) in [
            (fields::IS_SET, header.is_set),
            (fields::ADJUST, header.adjust),
            (fields::INIT, header.init),
        ] {
            host.set_attr(&obj, name, host.new_bool(value)?)?;
        }

        let base = self.item_list(cell, 0..CTRL_SIZE)?;
        let data = self.item_list(cell, CTRL_SIZE..cell.item_count())?;
        host.set_attr(&obj, fields::BASE, base)?;
        host.set_attr(&obj, fields::DATA, data)?;

        Ok(obj)
    }

    /// Managed list of the items at `indices`
    fn item_list(&self, cell: &CellRef<'_>, indices: Range<usize>) -> Result<H::Ref> {
        let host = &self.host;
        let items = indices
            .map(|index| match cell.layout() {
                ItemLayout::Character { .. } => host.new_text(cell.text_at(index)),
                ItemLayout::Integer => host.new_int(cell.int_at(index) as i64),
                ItemLayout::Double => host.new_float(cell.double_at(index)),
            })
            .collect::<Result<Vec<_>>>()?;
        host.new_list(items)
    }
}
