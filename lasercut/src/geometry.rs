use std::ops::Mul;

use crate::{Pos, EPSILON};

/// Rotation quaternion with scalar part `w` and vector part `v`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quaternion {
    pub w: f64,
    pub v: Pos,
}

impl Quaternion {
    pub const IDENTITY: Self = Self {
        w: 1.0,
        v: Pos::new(0.0, 0.0, 0.0),
    };

    pub const fn new(w: f64, v: Pos) -> Self {
        Self { w, v }
    }

    /// Quaternion with no scalar part, used to carry a point through a
    /// rotation.
    pub const fn pure(v: Pos) -> Self {
        Self { w: 0.0, v }
    }

    /// Rotation of `angle` radians about the unit vector `axis`.
    pub fn from_axis_angle(axis: Pos, angle: f64) -> Self {
        let (sin, cos) = (angle / 2.0).sin_cos();
        Self::new(cos, axis * sin)
    }

    /// The shortest rotation taking the direction `from` onto `to`.
    ///
    /// Returns the identity when the two are parallel or anti-parallel, since
    /// the axis is undefined there. Both inputs are expected to be unit length.
    pub fn rotation_between(from: Pos, to: Pos) -> Self {
        let axis = from.cross(&to);
        let Some(axis) = axis.try_normalize(EPSILON) else {
            return Self::IDENTITY;
        };

        let angle = from.dot(&to).clamp(-1.0, 1.0).acos();
        Self::from_axis_angle(axis, angle)
    }

    pub fn conjugate(&self) -> Self {
        Self::new(self.w, -self.v)
    }

    pub fn norm(&self) -> f64 {
        (self.w * self.w + self.v.norm_squared()).sqrt()
    }

    /// Rotates a point by conjugation, `q p q*`.
    pub fn rotate(&self, point: &Pos) -> Pos {
        (*self * Self::pure(*point) * self.conjugate()).v
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Quaternion {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self::new(
            self.w * rhs.w - self.v.dot(&rhs.v),
            rhs.v * self.w + self.v * rhs.w + self.v.cross(&rhs.v),
        )
    }
}
