//! Python binding
//!
//! `PyHost` implements `ObjectSystem` over real Python objects, so the same
//! marshaller runs against the `spice` package. The extension module exposes
//! round-trip hooks (decode, then encode again) for each record kind.

use crate::config::Config;
use crate::errors::{MarshalError, Result};
use crate::interop::{self, Marshaller, ObjectSystem, Primitive};
use crate::logging::{self, LogConfig};
use once_cell::sync::Lazy;
use pyo3::exceptions::{
    PyAttributeError, PyMemoryError, PyNotImplementedError, PyRuntimeError, PyTypeError,
    PyValueError,
};
use pyo3::prelude::*;
use pyo3::types::{PyBool, PyBytes, PyDict, PyFloat, PyList, PyLong, PySequence, PyString, PyTuple};

static CONFIG: Lazy<Config> = Lazy::new(Config::discover);

/// Object system backed by the running interpreter
#[derive(Debug, Clone, Copy)]
pub struct PyHost<'py> {
    py: Python<'py>,
}

impl<'py> PyHost<'py> {
    pub fn new(py: Python<'py>) -> Self {
        Self { py }
    }
}

fn host_error(err: PyErr) -> MarshalError {
    MarshalError::host(err.to_string())
}

impl<'py> ObjectSystem for PyHost<'py> {
    type Ref = &'py PyAny;

    fn import(&self, module: &str) -> Result<&'py PyAny> {
        let module: &PyAny = PyModule::import(self.py, module).map_err(host_error)?;
        Ok(module)
    }

    fn get_attr(&self, obj: &&'py PyAny, name: &str) -> Result<Option<&'py PyAny>> {
        match obj.getattr(name) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_instance_of::<PyAttributeError>(self.py) => Ok(None),
            Err(err) => Err(host_error(err)),
        }
    }

    fn set_attr(&self, obj: &&'py PyAny, name: &str, value: &'py PyAny) -> Result<()> {
        obj.setattr(name, value).map_err(host_error)
    }

    fn call(
        &self,
        callable: &&'py PyAny,
        args: &[&'py PyAny],
        kwargs: &[(&str, &'py PyAny)],
    ) -> Result<&'py PyAny> {
        let kwargs_dict = PyDict::new(self.py);
        for (key, value) in kwargs {
            kwargs_dict.set_item(*key, *value).map_err(host_error)?;
        }
        callable
            .call(PyTuple::new(self.py, args), Some(kwargs_dict))
            .map_err(host_error)
    }

    fn inspect(&self, obj: &&'py PyAny) -> Primitive {
        let obj = *obj;

        if let Ok(value) = obj.downcast::<PyBool>() {
            return Primitive::Bool(value.is_true());
        }
        if obj.is_instance_of::<PyLong>() {
            if let Ok(value) = obj.extract::<i64>() {
                return Primitive::Int(value);
            }
            if let Ok(value) = obj.extract::<i128>() {
                return Primitive::BigInt(value);
            }
            return Primitive::Other("int".to_string());
        }
        if let Ok(value) = obj.downcast::<PyFloat>() {
            return Primitive::Float(value.value());
        }
        if let Ok(value) = obj.downcast::<PyString>() {
            return Primitive::Text(value.to_string_lossy().into_owned().into_bytes());
        }
        if let Ok(value) = obj.downcast::<PyBytes>() {
            return Primitive::Text(value.as_bytes().to_vec());
        }
        if obj.is_none() {
            return Primitive::None;
        }
        if obj.downcast::<PySequence>().is_ok() {
            return Primitive::Sequence;
        }

        let name = obj
            .get_type()
            .name()
            .map(str::to_string)
            .unwrap_or_else(|_| "object".to_string());
        Primitive::Other(name)
    }

    fn seq_len(&self, seq: &&'py PyAny) -> Result<usize> {
        interop::require_sequence(&self.inspect(seq))?;
        seq.downcast::<PySequence>()
            .map_err(|err| MarshalError::host(err.to_string()))?
            .len()
            .map_err(host_error)
    }

    fn item(&self, seq: &&'py PyAny, index: usize) -> Result<Option<&'py PyAny>> {
        if index >= self.seq_len(seq)? {
            return Ok(None);
        }
        seq.get_item(index).map(Some).map_err(host_error)
    }

    fn new_list(&self, items: Vec<&'py PyAny>) -> Result<&'py PyAny> {
        let list: &PyAny = PyList::new(self.py, items);
        Ok(list)
    }

    fn new_int(&self, value: i64) -> Result<&'py PyAny> {
        Ok(value.to_object(self.py).into_ref(self.py))
    }

    fn new_float(&self, value: f64) -> Result<&'py PyAny> {
        Ok(value.to_object(self.py).into_ref(self.py))
    }

    fn new_bool(&self, value: bool) -> Result<&'py PyAny> {
        Ok(value.to_object(self.py).into_ref(self.py))
    }

    fn new_text(&self, bytes: &[u8]) -> Result<&'py PyAny> {
        let text: &PyAny = PyString::new(self.py, &String::from_utf8_lossy(bytes));
        Ok(text)
    }
}

impl From<MarshalError> for PyErr {
    fn from(err: MarshalError) -> PyErr {
        let message = err.to_string();
        match err {
            MarshalError::MissingAttribute { .. } => PyAttributeError::new_err(message),
            MarshalError::ShapeMismatch { .. } | MarshalError::InvalidWidth { .. } => {
                PyValueError::new_err(message)
            }
            MarshalError::AttributeTypeMismatch { .. } | MarshalError::ConversionError { .. } => {
                PyTypeError::new_err(message)
            }
            MarshalError::UnsupportedType { .. } => PyNotImplementedError::new_err(message),
            MarshalError::AllocationFailure { .. } => PyMemoryError::new_err(message),
            MarshalError::Host { .. } => PyRuntimeError::new_err(message),
        }
    }
}

fn marshaller(py: Python<'_>) -> Marshaller<PyHost<'_>> {
    Marshaller::new(PyHost::new(py), CONFIG.registry.clone())
}

/// Decode a `spice.Cell` into a native cell and encode it back
#[pyfunction]
fn cell_roundtrip<'py>(py: Python<'py>, obj: &'py PyAny) -> PyResult<&'py PyAny> {
    let marshaller = marshaller(py);
    let cell = marshaller.decode_cell(&obj)?;
    Ok(marshaller.encode_owned_cell(cell)?)
}

#[pyfunction]
fn plane_roundtrip<'py>(py: Python<'py>, obj: &'py PyAny) -> PyResult<&'py PyAny> {
    let marshaller = marshaller(py);
    let plane = marshaller.decode_plane(&obj)?;
    Ok(marshaller.encode_plane(&plane)?)
}

#[pyfunction]
fn ellipse_roundtrip<'py>(py: Python<'py>, obj: &'py PyAny) -> PyResult<&'py PyAny> {
    let marshaller = marshaller(py);
    let ellipse = marshaller.decode_ellipse(&obj)?;
    Ok(marshaller.encode_ellipse(&ellipse)?)
}

#[pyfunction]
fn ek_att_dsc_roundtrip<'py>(py: Python<'py>, obj: &'py PyAny) -> PyResult<&'py PyAny> {
    let marshaller = marshaller(py);
    let dsc = marshaller.decode_ek_att_dsc(&obj)?;
    Ok(marshaller.encode_ek_att_dsc(&dsc)?)
}

#[pyfunction]
fn ek_seg_sum_roundtrip<'py>(py: Python<'py>, obj: &'py PyAny) -> PyResult<&'py PyAny> {
    let marshaller = marshaller(py);
    let summary = marshaller.decode_ek_seg_sum(&obj)?;
    Ok(marshaller.encode_ek_seg_sum(&summary)?)
}

/// Counters of the calling thread: (conversions, errors, buffers allocated, buffers released)
#[pyfunction]
fn interop_stats() -> (usize, usize, usize, usize) {
    let stats = interop::stats();
    (
        stats.conversions,
        stats.marshaling_errors,
        stats.buffers_allocated,
        stats.buffers_released,
    )
}

#[pymodule]
fn spice_marshal(_py: Python, m: &PyModule) -> PyResult<()> {
    logging::init_with_config(LogConfig::from(&CONFIG.logging).with_env_overrides());

    m.add_function(wrap_pyfunction!(cell_roundtrip, m)?)?;
    m.add_function(wrap_pyfunction!(plane_roundtrip, m)?)?;
    m.add_function(wrap_pyfunction!(ellipse_roundtrip, m)?)?;
    m.add_function(wrap_pyfunction!(ek_att_dsc_roundtrip, m)?)?;
    m.add_function(wrap_pyfunction!(ek_seg_sum_roundtrip, m)?)?;
    m.add_function(wrap_pyfunction!(interop_stats, m)?)?;
    Ok(())
}
