//! Managed Cell → native cell record
//!
//! Shape is validated before anything is allocated. Once the buffer exists,
//! every later failure drops it again, so a rejected object never leaves a
//! native allocation behind.

use super::accessors::{bool_attr, element_to_double, element_to_int, int_attr, sequence_attr, tag_attr};
use super::fields;
use super::host::{ObjectSystem, Primitive};
use super::Marshaller;
use crate::errors::{MarshalError, Result};
use crate::logging::perf;
use crate::records::{Cell, CellBuffer, CellHeader, ItemLayout, CTRL_SIZE};

impl<H: ObjectSystem> Marshaller<H> {
    /// Decode a managed Cell into an owned native cell
    pub fn decode_cell(&self, obj: &H::Ref) -> Result<Cell> {
        let _timer = perf::track("decode_cell");
        let result = self.decode_cell_inner(obj);
        self.finish("decode_cell", result)
    }

    fn decode_cell_inner(&self, obj: &H::Ref) -> Result<Cell> {
        let host = &self.host;

        let (base, base_len) = sequence_attr(host, obj, fields::BASE)?;
        let (data, data_len) = sequence_attr(host, obj, fields::DATA)?;

        if base_len != CTRL_SIZE {
            return Err(MarshalError::shape(fields::BASE, CTRL_SIZE, base_len as i64));
        }

        let size = int_attr(host, obj, fields::SIZE)?;
        let size_items = usize::try_from(size)
            .map_err(|_| MarshalError::shape(fields::SIZE, data_len, size as i64))?;
        if data_len != size_items {
            return Err(MarshalError::shape(fields::DATA, size_items, data_len as i64));
        }

        let header = CellHeader {
            dtype: tag_attr(host, obj, fields::DTYPE)?,
            length: int_attr(host, obj, fields::LENGTH)?,
            size,
            card: int_attr(host, obj, fields::CARD)?,
            is_set: bool_attr(host, obj, fields::IS_SET)?,
            adjust: bool_attr(host, obj, fields::ADJUST)?,
            init: bool_attr(host, obj, fields::INIT)?,
        };

        if header.card < 0 || header.card > size {
            return Err(MarshalError::shape(fields::CARD, size_items, header.card as i64));
        }

        let layout = ItemLayout::resolve(header.dtype, header.length)?;
        let len = layout
            .buffer_len(size_items)
            .ok_or(MarshalError::AllocationFailure { bytes: usize::MAX })?;

        let mut buffer = CellBuffer::zeroed(len)?;
        let width = layout.width();

        for index in 0..CTRL_SIZE + size_items {
            let (seq, pos) = if index < CTRL_SIZE {
                (&base, index)
            } else {
                (&data, index - CTRL_SIZE)
            };

            let item = host.item(seq, pos)?.ok_or_else(|| MarshalError::ConversionError {
                index,
                expected: layout.managed_type_name(),
                found: "nothing".to_string(),
            })?;

            let slot = &mut buffer.as_mut_slice()[index * width..(index + 1) * width];
            store_item(layout, slot, index, &host.inspect(&item))?;
        }

        Ok(Cell::from_parts(header, layout, buffer))
    }
}

/// Write one managed element into its zeroed slot
fn store_item(layout: ItemLayout, slot: &mut [u8], index: usize, value: &Primitive) -> Result<()> {
    let stored = match layout {
        ItemLayout::Character { width } => match value {
            Primitive::Text(bytes) => {
                let n = bytes.len().min(width);
                slot[..n].copy_from_slice(&bytes[..n]);
                true
            }
            _ => false,
        },
        ItemLayout::Integer => element_to_int(value)
            .map(|v| slot.copy_from_slice(&v.to_ne_bytes()))
            .is_some(),
        ItemLayout::Double => element_to_double(value)
            .map(|v| slot.copy_from_slice(&v.to_ne_bytes()))
            .is_some(),
    };

    if stored {
        Ok(())
    } else {
        Err(MarshalError::ConversionError {
            index,
            expected: layout.managed_type_name(),
            found: value.type_name().to_string(),
        })
    }
}
