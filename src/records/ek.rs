//! EK (event kernel) descriptor records
//!
//! `EkAttDsc` describes one column; `EkSegSum` summarizes a segment. The raw
//! forms match `SpiceEKAttDsc` and `SpiceEKSegSum`, fixed-size character
//! arrays included.

use super::{SpiceBoolean, SpiceInt, SPICEFALSE, SPICETRUE};
use crate::errors::{MarshalError, Result};
use serde::{Deserialize, Serialize};

/// Table name buffer length, NUL included
pub const SPICE_EK_TSTRLN: usize = 65;
/// Column name buffer length, NUL included
pub const SPICE_EK_CSTRLN: usize = 33;
/// Maximum columns per segment
pub const SPICE_EK_MXCLSG: usize = 100;

/// Column attribute descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EkAttDsc {
    pub cclass: i32,
    pub dtype: i32,
    pub strlen: SpiceInt,
    pub size: SpiceInt,
    pub indexd: bool,
    pub nullok: bool,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawEkAttDsc {
    pub cclass: i32,
    pub dtype: i32,
    pub strlen: SpiceInt,
    pub size: SpiceInt,
    pub indexd: SpiceBoolean,
    pub nullok: SpiceBoolean,
}

impl From<EkAttDsc> for RawEkAttDsc {
    fn from(dsc: EkAttDsc) -> Self {
        Self {
            cclass: dsc.cclass,
            dtype: dsc.dtype,
            strlen: dsc.strlen,
            size: dsc.size,
            indexd: if dsc.indexd { SPICETRUE } else { SPICEFALSE },
            nullok: if dsc.nullok { SPICETRUE } else { SPICEFALSE },
        }
    }
}

impl From<RawEkAttDsc> for EkAttDsc {
    fn from(raw: RawEkAttDsc) -> Self {
        Self {
            cclass: raw.cclass,
            dtype: raw.dtype,
            strlen: raw.strlen,
            size: raw.size,
            indexd: raw.indexd != SPICEFALSE,
            nullok: raw.nullok != SPICEFALSE,
        }
    }
}

/// Segment summary
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EkSegSum {
    pub tabnam: String,
    pub nrows: SpiceInt,
    pub cnames: Vec<String>,
    pub cdescrs: Vec<EkAttDsc>,
}

impl EkSegSum {
    #[inline]
    pub fn ncols(&self) -> usize {
        self.cnames.len()
    }

    /// Check the summary fits the fixed native layout
    pub fn validate(&self) -> Result<()> {
        check_text("tabnam", &self.tabnam, SPICE_EK_TSTRLN)?;

        if self.cnames.len() > SPICE_EK_MXCLSG {
            return Err(MarshalError::shape("cnames", SPICE_EK_MXCLSG, self.cnames.len() as i64));
        }
        if self.cdescrs.len() != self.cnames.len() {
            return Err(MarshalError::shape("cdescrs", self.cnames.len(), self.cdescrs.len() as i64));
        }
        for name in &self.cnames {
            check_text("cnames", name, SPICE_EK_CSTRLN)?;
        }
        Ok(())
    }

    pub fn to_raw(&self) -> Result<Box<RawEkSegSum>> {
        self.validate()?;

        let mut raw = Box::new(RawEkSegSum::zeroed());
        copy_text(&mut raw.tabnam, &self.tabnam);
        raw.nrows = self.nrows;
        raw.ncols = self.ncols() as SpiceInt;

        for (slot, name) in raw.cnames.iter_mut().zip(&self.cnames) {
            copy_text(slot, name);
        }
        for (slot, dsc) in raw.cdescrs.iter_mut().zip(&self.cdescrs) {
            *slot = (*dsc).into();
        }
        Ok(raw)
    }

    pub fn from_raw(raw: &RawEkSegSum) -> Result<Self> {
        let ncols = usize::try_from(raw.ncols)
            .ok()
            .filter(|&n| n <= SPICE_EK_MXCLSG)
            .ok_or_else(|| MarshalError::shape("ncols", SPICE_EK_MXCLSG, raw.ncols as i64))?;

        Ok(Self {
            tabnam: read_text(&raw.tabnam),
            nrows: raw.nrows,
            cnames: raw.cnames[..ncols].iter().map(|n| read_text(n)).collect(),
            cdescrs: raw.cdescrs[..ncols].iter().map(|&d| d.into()).collect(),
        })
    }
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct RawEkSegSum {
    pub tabnam: [u8; SPICE_EK_TSTRLN],
    pub nrows: SpiceInt,
    pub ncols: SpiceInt,
    pub cnames: [[u8; SPICE_EK_CSTRLN]; SPICE_EK_MXCLSG],
    pub cdescrs: [RawEkAttDsc; SPICE_EK_MXCLSG],
}

impl RawEkSegSum {
    pub fn zeroed() -> Self {
        Self {
            tabnam: [0; SPICE_EK_TSTRLN],
            nrows: 0,
            ncols: 0,
            cnames: [[0; SPICE_EK_CSTRLN]; SPICE_EK_MXCLSG],
            cdescrs: [RawEkAttDsc::default(); SPICE_EK_MXCLSG],
        }
    }
}

impl core::fmt::Debug for RawEkSegSum {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RawEkSegSum")
            .field("tabnam", &read_text(&self.tabnam))
            .field("nrows", &self.nrows)
            .field("ncols", &self.ncols)
            .finish_non_exhaustive()
    }
}

/// Text must leave room for the terminating NUL
fn check_text(field: &str, text: &str, buffer_len: usize) -> Result<()> {
    if text.len() >= buffer_len {
        return Err(MarshalError::shape(field, buffer_len - 1, text.len() as i64));
    }
    Ok(())
}

fn copy_text(slot: &mut [u8], text: &str) {
    slot.fill(0);
    let n = text.len().min(slot.len() - 1);
    slot[..n].copy_from_slice(&text.as_bytes()[..n]);
}

fn read_text(slot: &[u8]) -> String {
    let end = slot.iter().position(|&b| b == 0).unwrap_or(slot.len());
    String::from_utf8_lossy(&slot[..end]).into_owned()
}
