use std::{
    f64::consts::{FRAC_PI_2, PI},
    iter,
};

use common::config::{ExportConfig, Padding, Style};
use nalgebra::Rotation2;
use tracing::debug;

use crate::{
    error::{ExportError, ExportResult},
    outline::Outlines,
    Pos2, EPSILON,
};

/// How flattened outlines are placed on the page.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutParams {
    /// Margins in output pixels.
    pub padding: Padding,
    /// Output pixels per input unit.
    pub unit_scale: f64,
    pub auto_rotate: bool,
    pub style: Style,
}

/// Axis aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Pos2,
    pub max: Pos2,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    MoveTo(Pos2),
    LineTo(Pos2),
    Close,
}

/// Outlines in final document coordinates along with the document size.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    /// Bounds of the outlines after auto rotation but before scaling, or
    /// `None` when there is nothing to cut.
    pub bounds: Option<Bounds>,
    pub padding: Padding,
    /// Counter-clockwise rotation applied before placement, in radians.
    pub rotation: f64,
    pub translation: Pos2,
    pub width: f64,
    pub height: f64,
    pub outlines: Outlines<Pos2>,
    pub style: Style,
}

impl LayoutParams {
    pub fn from_config(config: &ExportConfig) -> Self {
        Self {
            padding: config.padding_pixels(),
            unit_scale: config.unit_scale(),
            auto_rotate: config.auto_rotate,
            style: config.style.clone(),
        }
    }
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            padding: Padding::ZERO,
            unit_scale: 1.0,
            auto_rotate: false,
            style: Style::default(),
        }
    }
}

impl Bounds {
    pub fn of<'a>(points: impl IntoIterator<Item = &'a Pos2>) -> Option<Self> {
        points.into_iter().fold(None, |bounds, point| {
            Some(match bounds {
                None => Bounds {
                    min: *point,
                    max: *point,
                },
                Some(Bounds { min, max }) => Bounds {
                    min: min.inf(point),
                    max: max.sup(point),
                },
            })
        })
    }

    pub fn size(&self) -> Pos2 {
        self.max - self.min
    }
}

impl Layout {
    /// Drawing commands for every outline: a move to its first vertex, lines
    /// through the rest and a close back to the start.
    pub fn commands(&self) -> impl Iterator<Item = PathCommand> + '_ {
        self.outlines.outlines().iter().flat_map(move |outline| {
            let mut points = self.outlines.points(outline).copied();
            let first = points.next().map(PathCommand::MoveTo);

            first
                .into_iter()
                .chain(points.map(PathCommand::LineTo))
                .chain(iter::once(PathCommand::Close))
        })
    }
}

/// Endpoints of the longest edge over all outlines. Edges are visited in
/// outline order, each loop ending with its closing edge, and the first of
/// several equally long edges wins. Edges no longer than [`EPSILON`] are
/// never picked.
pub fn longest_edge(outlines: &Outlines<Pos2>) -> Option<(Pos2, Pos2)> {
    let mut longest = None;
    let mut length = EPSILON;

    for outline in outlines.outlines() {
        for (a, b) in outline.edges() {
            let (a, b) = (*outlines.position(a), *outlines.position(b));
            let edge = (b - a).norm();
            if edge > length {
                length = edge;
                longest = Some((a, b));
            }
        }
    }

    longest
}

/// The counter-clockwise angle in `(-π/2, π/2]` that turns `direction`
/// parallel to the y axis.
pub fn alignment_angle(direction: Pos2) -> f64 {
    let angle = (FRAC_PI_2 - direction.y.atan2(direction.x)).rem_euclid(PI);
    if angle > FRAC_PI_2 {
        angle - PI
    } else {
        angle
    }
}

/// Places flattened outlines on the page.
///
/// With auto rotation every point is first turned about the origin so the
/// longest edge runs vertically. The result is scaled by the unit scale and
/// shifted so the bounding box starts at the negative-side padding. Nothing
/// is flipped, so the y axis keeps pointing the way the mesh had it.
pub fn layout(mut outlines: Outlines<Pos2>, params: &LayoutParams) -> ExportResult<Layout> {
    let mut rotation = 0.0;
    if params.auto_rotate {
        let (a, b) = longest_edge(&outlines).ok_or(ExportError::DegenerateGeometry)?;
        rotation = alignment_angle(b - a);

        let rotate = Rotation2::new(rotation);
        for point in outlines.positions_mut() {
            *point = rotate * *point;
        }
    }

    let bounds = Bounds::of(outlines.positions());
    let (min, size) = bounds.map_or((Pos2::zeros(), Pos2::zeros()), |x| (x.min, x.size()));

    let scale = params.unit_scale;
    let padding = params.padding;
    let translation = Pos2::new(padding.x_neg, padding.y_neg) - min * scale;
    for point in outlines.positions_mut() {
        *point = *point * scale + translation;
    }

    let width = padding.x_neg + size.x * scale + padding.x_pos;
    let height = padding.y_neg + size.y * scale + padding.y_pos;
    debug!(
        "Laid out {} outlines in {width}x{height} (rotation: {rotation})",
        outlines.len()
    );

    Ok(Layout {
        bounds,
        padding,
        rotation,
        translation,
        width,
        height,
        outlines,
        style: params.style.clone(),
    })
}
