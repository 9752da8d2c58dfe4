//! EK descriptor converters
//!
//! Summaries are checked against the fixed native limits on decode, so a
//! decoded `EkSegSum` always converts to its raw layout.

use super::accessors::{bool_attr, int_attr, sequence_attr, tag_attr, text_attr};
use super::fields;
use super::host::{ObjectSystem, Primitive};
use super::Marshaller;
use crate::errors::{MarshalError, Result};
use crate::records::{EkAttDsc, EkSegSum};

impl<H: ObjectSystem> Marshaller<H> {
    pub fn encode_ek_att_dsc(&self, dsc: &EkAttDsc) -> Result<H::Ref> {
        let result = self.encode_att_dsc_inner(dsc);
        self.finish("encode_ek_att_dsc", result)
    }

    pub fn decode_ek_att_dsc(&self, obj: &H::Ref) -> Result<EkAttDsc> {
        let result = self.decode_att_dsc_inner(obj);
        self.finish("decode_ek_att_dsc", result)
    }

    pub fn encode_ek_seg_sum(&self, summary: &EkSegSum) -> Result<H::Ref> {
        let result = self.encode_seg_sum_inner(summary);
        self.finish("encode_ek_seg_sum", result)
    }

    pub fn decode_ek_seg_sum(&self, obj: &H::Ref) -> Result<EkSegSum> {
        let result = self.decode_seg_sum_inner(obj);
        self.finish("decode_ek_seg_sum", result)
    }

    fn encode_att_dsc_inner(&self, dsc: &EkAttDsc) -> Result<H::Ref> {
        let host = &self.host;
        let obj = self.instantiate(&self.registry.ek_att_dsc)?;

        for (name, value) in [
            (fields::CCLASS, dsc.cclass),
            (fields::DTYPE, dsc.dtype),
            (fields::STRLEN, dsc.strlen),
            (fields::SIZE, dsc.size),
        ] {
            host.set_attr(&obj, name, host.new_int(value as i64)?)?;
        }
        host.set_attr(&obj, fields::INDEXD, host.new_bool(dsc.indexd)?)?;
        host.set_attr(&obj, fields::NULLOK, host.new_bool(dsc.nullok)?)?;
        Ok(obj)
    }

    fn decode_att_dsc_inner(&self, obj: &H::Ref) -> Result<EkAttDsc> {
        let host = &self.host;
        Ok(EkAttDsc {
            cclass: int_attr(host, obj, fields::CCLASS)?,
            dtype: tag_attr(host, obj, fields::DTYPE)?,
            strlen: int_attr(host, obj, fields::STRLEN)?,
            size: int_attr(host, obj, fields::SIZE)?,
            indexd: bool_attr(host, obj, fields::INDEXD)?,
            nullok: bool_attr(host, obj, fields::NULLOK)?,
        })
    }

    fn encode_seg_sum_inner(&self, summary: &EkSegSum) -> Result<H::Ref> {
        let host = &self.host;
        summary.validate()?;

        let obj = self.instantiate(&self.registry.ek_seg_sum)?;
        host.set_attr(&obj, fields::TABNAM, host.new_text(summary.tabnam.as_bytes())?)?;
        host.set_attr(&obj, fields::NROWS, host.new_int(summary.nrows as i64)?)?;
        host.set_attr(&obj, fields::NCOLS, host.new_int(summary.ncols() as i64)?)?;

        let names = summary
            .cnames
            .iter()
            .map(|name| host.new_text(name.as_bytes()))
            .collect::<Result<Vec<_>>>()?;
        host.set_attr(&obj, fields::CNAMES, host.new_list(names)?)?;

        let descriptors = summary
            .cdescrs
            .iter()
            .map(|dsc| self.encode_att_dsc_inner(dsc))
            .collect::<Result<Vec<_>>>()?;
        host.set_attr(&obj, fields::CDESCRS, host.new_list(descriptors)?)?;

        Ok(obj)
    }

    fn decode_seg_sum_inner(&self, obj: &H::Ref) -> Result<EkSegSum> {
        let host = &self.host;

        let tabnam = text_attr(host, obj, fields::TABNAM)?;
        let nrows = int_attr(host, obj, fields::NROWS)?;
        let ncols = int_attr(host, obj, fields::NCOLS)?;

        let (names, names_len) = sequence_attr(host, obj, fields::CNAMES)?;
        let (descrs, descrs_len) = sequence_attr(host, obj, fields::CDESCRS)?;

        let columns = usize::try_from(ncols)
            .map_err(|_| MarshalError::shape(fields::NCOLS, names_len, ncols as i64))?;
        if names_len != columns {
            return Err(MarshalError::shape(fields::CNAMES, columns, names_len as i64));
        }
        if descrs_len != columns {
            return Err(MarshalError::shape(fields::CDESCRS, columns, descrs_len as i64));
        }

        let mut cnames = Vec::with_capacity(columns);
        for index in 0..columns {
            let value = host.item(&names, index)?.map(|item| host.inspect(&item));
            match value {
                Some(Primitive::Text(bytes)) => {
                    cnames.push(String::from_utf8_lossy(&bytes).into_owned())
                }
                other => {
                    return Err(MarshalError::ConversionError {
                        index,
                        expected: "str",
                        found: other.as_ref().map_or("nothing", |v| v.type_name()).to_string(),
                    })
                }
            }
        }

        let mut cdescrs = Vec::with_capacity(columns);
        for index in 0..columns {
            let item = host.item(&descrs, index)?.ok_or_else(|| MarshalError::ConversionError {
                index,
                expected: "EkAttDsc",
                found: "nothing".to_string(),
            })?;
            cdescrs.push(self.decode_att_dsc_inner(&item)?);
        }

        let summary = EkSegSum { tabnam, nrows, cnames, cdescrs };
        summary.validate()?;
        Ok(summary)
    }
}
