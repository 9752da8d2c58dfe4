//! Plane and Ellipse converters

use super::accessors::{element_to_double, number_attr, sequence_attr};
use super::fields;
use super::host::ObjectSystem;
use super::Marshaller;
use crate::errors::{MarshalError, Result};
use crate::records::{Ellipse, Plane};

impl<H: ObjectSystem> Marshaller<H> {
    pub fn encode_plane(&self, plane: &Plane) -> Result<H::Ref> {
        let result = self.encode_plane_inner(plane);
        self.finish("encode_plane", result)
    }

    pub fn decode_plane(&self, obj: &H::Ref) -> Result<Plane> {
        let result = self.decode_plane_inner(obj);
        self.finish("decode_plane", result)
    }

    pub fn encode_ellipse(&self, ellipse: &Ellipse) -> Result<H::Ref> {
        let result = self.encode_ellipse_inner(ellipse);
        self.finish("encode_ellipse", result)
    }

    pub fn decode_ellipse(&self, obj: &H::Ref) -> Result<Ellipse> {
        let result = self.decode_ellipse_inner(obj);
        self.finish("decode_ellipse", result)
    }

    fn encode_plane_inner(&self, plane: &Plane) -> Result<H::Ref> {
        let obj = self.instantiate(&self.registry.plane)?;
        self.host
            .set_attr(&obj, fields::CONSTANT, self.host.new_float(plane.constant)?)?;
        self.host
            .set_attr(&obj, fields::NORMAL, self.float_list(&plane.normal)?)?;
        Ok(obj)
    }

    fn decode_plane_inner(&self, obj: &H::Ref) -> Result<Plane> {
        Ok(Plane {
            normal: self.vector_attr(obj, fields::NORMAL)?,
            constant: number_attr(&self.host, obj, fields::CONSTANT)?,
        })
    }

    fn encode_ellipse_inner(&self, ellipse: &Ellipse) -> Result<H::Ref> {
        let obj = self.instantiate(&self.registry.ellipse)?;
        for (name, vector) in [
            (fields::CENTER, &ellipse.center),
            (fields::SEMI_MAJOR, &ellipse.semi_major),
            (fields::SEMI_MINOR, &ellipse.semi_minor),
        ] {
            self.host.set_attr(&obj, name, self.float_list(vector)?)?;
        }
        Ok(obj)
    }

    fn decode_ellipse_inner(&self, obj: &H::Ref) -> Result<Ellipse> {
        Ok(Ellipse {
            center: self.vector_attr(obj, fields::CENTER)?,
            semi_major: self.vector_attr(obj, fields::SEMI_MAJOR)?,
            semi_minor: self.vector_attr(obj, fields::SEMI_MINOR)?,
        })
    }

    /// Read a 3-vector attribute, coercing each component with the number rule
    fn vector_attr(&self, obj: &H::Ref, attr: &str) -> Result<[f64; 3]> {
        let (seq, len) = sequence_attr(&self.host, obj, attr)?;
        if len != 3 {
            return Err(MarshalError::shape(attr, 3, len as i64));
        }

        let mut vector = [0.0; 3];
        for (index, slot) in vector.iter_mut().enumerate() {
            let item = self.host.item(&seq, index)?;
            let value = item.as_ref().map(|item| self.host.inspect(item));
            *slot = value
                .as_ref()
                .and_then(element_to_double)
                .ok_or_else(|| MarshalError::ConversionError {
                    index,
                    expected: "float",
                    found: value
                        .as_ref()
                        .map_or("nothing", |v| v.type_name())
                        .to_string(),
                })?;
        }
        Ok(vector)
    }
}
