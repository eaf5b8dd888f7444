use tracing::debug;

use crate::{
    error::{ExportError, ExportResult},
    geometry::Quaternion,
    outline::Outlines,
    Pos, Pos2,
};

/// Maps points onto the plane perpendicular to a reference normal by rotating
/// that normal onto +Z and dropping the z component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projector {
    rotation: Quaternion,
}

impl Projector {
    pub fn from_normal(normal: Pos) -> Self {
        Self {
            rotation: Quaternion::rotation_between(normal, Pos::z()),
        }
    }

    pub fn rotation(&self) -> Quaternion {
        self.rotation
    }

    pub fn rotate(&self, point: &Pos) -> Pos {
        self.rotation.rotate(point)
    }

    pub fn project(&self, point: &Pos) -> Pos2 {
        self.rotate(point).xy()
    }

    /// Projects every vertex of `outlines`, failing if the rotated points do
    /// not share a z value within `tolerance`. The tolerance is relative to
    /// the extent of the geometry once that exceeds one unit.
    pub fn flatten(&self, outlines: Outlines<Pos>, tolerance: f64) -> ExportResult<Outlines<Pos2>> {
        let rotated = outlines.map(|x| self.rotate(x));

        if let Some(first) = rotated.positions().first() {
            let (mut min, mut max) = (Pos::repeat(f64::MAX), Pos::repeat(f64::MIN));
            let mut deviation = 0.0_f64;
            for point in rotated.positions() {
                min = min.inf(point);
                max = max.sup(point);
                deviation = deviation.max((point.z - first.z).abs());
            }

            let extent = (max - min).amax().max(1.0);
            if deviation > tolerance * extent {
                return Err(ExportError::NonPlanar { deviation });
            }

            debug!(
                "Flattened {} vertices with {deviation} out of plane deviation",
                rotated.vertex_count()
            );
        }

        Ok(rotated.map(|x| x.xy()))
    }
}
