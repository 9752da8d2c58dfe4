//! Fixed-shape geometry records

use super::SpiceDouble;
use serde::{Deserialize, Serialize};

/// Plane `{ x : <normal, x> = constant }` (matches `SpicePlane`)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Plane {
    pub normal: [SpiceDouble; 3],
    pub constant: SpiceDouble,
}

impl Plane {
    pub const fn new(normal: [SpiceDouble; 3], constant: SpiceDouble) -> Self {
        Self { normal, constant }
    }
}

/// Ellipse by center and generating vectors (matches `SpiceEllipse`)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Ellipse {
    pub center: [SpiceDouble; 3],
    pub semi_major: [SpiceDouble; 3],
    pub semi_minor: [SpiceDouble; 3],
}

impl Ellipse {
    pub const fn new(
        center: [SpiceDouble; 3],
        semi_major: [SpiceDouble; 3],
        semi_minor: [SpiceDouble; 3],
    ) -> Self {
        Self { center, semi_major, semi_minor }
    }
}
