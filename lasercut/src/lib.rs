//! Turns flat mesh objects into closed boundary outlines and lays them out as
//! a single SVG cutting path.
//!
//! The pipeline runs strictly forward: [`boundary`] edges of a [`mesh::Mesh`]
//! are walked into [`outline::Outlines`], flattened by a
//! [`projection::Projector`], placed by [`layout::layout`] and finally written
//! by [`format::svg::SvgFile`]. [`export`] chains the stages per object.

use nalgebra::{Vector2, Vector3};

pub mod boundary;
pub mod error;
pub mod export;
pub mod format;
pub mod geometry;
pub mod layout;
pub mod mesh;
pub mod outline;
pub mod projection;

pub type Pos = Vector3<f64>;
pub type Pos2 = Vector2<f64>;

/// Tolerance for parallel and closure checks.
pub const EPSILON: f64 = f64::EPSILON;
