use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// Pixels per inch used by Inkscape and most browsers. The SVG 1.1
/// recommendation used 90.
pub const DEFAULT_PIXELS_PER_INCH: f64 = 96.0;

/// A named length unit that geometry can be expressed in. Every unit maps to
/// some number of output pixels through a [`UnitTable`].
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum LengthUnit {
    Px,
    Pt,
    Pc,
    In,
    Mm,
    Cm,
}

/// Converts named units into pixel-equivalent scale factors for a given
/// pixel density.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnitTable {
    pixels_per_inch: f64,
}

impl LengthUnit {
    pub const ALL: [LengthUnit; 6] = [
        LengthUnit::Px,
        LengthUnit::Pt,
        LengthUnit::Pc,
        LengthUnit::In,
        LengthUnit::Mm,
        LengthUnit::Cm,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name.trim().to_lowercase().as_str() {
            "px" | "pixel" | "pixels" => LengthUnit::Px,
            "pt" | "point" | "points" => LengthUnit::Pt,
            "pc" | "pica" | "picas" => LengthUnit::Pc,
            "in" | "inch" | "inches" => LengthUnit::In,
            "mm" | "millimeter" | "millimeters" => LengthUnit::Mm,
            "cm" | "centimeter" | "centimeters" => LengthUnit::Cm,
            _ => return None,
        })
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            LengthUnit::Px => "px",
            LengthUnit::Pt => "pt",
            LengthUnit::Pc => "pc",
            LengthUnit::In => "in",
            LengthUnit::Mm => "mm",
            LengthUnit::Cm => "cm",
        }
    }

    /// Size of one of this unit in inches, or `None` for pixels, which are
    /// defined by the pixel density itself.
    fn inches(&self) -> Option<f64> {
        match self {
            LengthUnit::Px => None,
            LengthUnit::Pt => Some(1.0 / 72.0),
            LengthUnit::Pc => Some(1.0 / 6.0),
            LengthUnit::In => Some(1.0),
            LengthUnit::Mm => Some(1.0 / 25.4),
            LengthUnit::Cm => Some(1.0 / 2.54),
        }
    }
}

impl Display for LengthUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl UnitTable {
    pub fn new(pixels_per_inch: f64) -> Self {
        Self { pixels_per_inch }
    }

    pub fn pixels_per_inch(&self) -> f64 {
        self.pixels_per_inch
    }

    /// Number of output pixels in one of `unit`.
    pub fn scale(&self, unit: LengthUnit) -> f64 {
        unit.inches()
            .map_or(1.0, |inches| inches * self.pixels_per_inch)
    }

    /// Converts `value` expressed in `unit` into pixels.
    pub fn to_pixels(&self, value: f64, unit: LengthUnit) -> f64 {
        value * self.scale(unit)
    }

    pub fn entries(&self) -> impl Iterator<Item = (LengthUnit, f64)> + '_ {
        LengthUnit::ALL.into_iter().map(|unit| (unit, self.scale(unit)))
    }
}

impl Default for UnitTable {
    fn default() -> Self {
        Self::new(DEFAULT_PIXELS_PER_INCH)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn svg_spec_density_matches_classic_table() {
        let table = UnitTable::new(90.0);
        assert_relative_eq!(table.scale(LengthUnit::Px), 1.0);
        assert_relative_eq!(table.scale(LengthUnit::Pt), 1.25);
        assert_relative_eq!(table.scale(LengthUnit::Pc), 15.0);
        assert_relative_eq!(table.scale(LengthUnit::In), 90.0);
        assert_relative_eq!(table.scale(LengthUnit::Mm), 90.0 / 25.4);
        assert_relative_eq!(table.scale(LengthUnit::Cm), 90.0 / 2.54);
    }

    #[test]
    fn pixels_ignore_density() {
        for ppi in [72.0, 90.0, 96.0, 300.0] {
            assert_eq!(UnitTable::new(ppi).scale(LengthUnit::Px), 1.0);
        }
    }

    #[test]
    fn centimeter_is_ten_millimeters() {
        let table = UnitTable::default();
        assert_relative_eq!(
            table.to_pixels(1.0, LengthUnit::Cm),
            table.to_pixels(10.0, LengthUnit::Mm),
            max_relative = 1e-12
        );
    }

    #[test]
    fn unit_names() {
        assert_eq!(LengthUnit::from_name("MM"), Some(LengthUnit::Mm));
        assert_eq!(LengthUnit::from_name(" inch "), Some(LengthUnit::In));
        assert_eq!(LengthUnit::from_name("furlong"), None);

        for unit in LengthUnit::ALL {
            assert_eq!(LengthUnit::from_name(unit.symbol()), Some(unit));
        }
    }

    #[test]
    fn table_lists_every_unit() {
        let table = UnitTable::default();
        assert_eq!(table.entries().count(), LengthUnit::ALL.len());
    }
}
