use std::{fs, path::Path};

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::units::{LengthUnit, UnitTable, DEFAULT_PIXELS_PER_INCH};

/// Everything needed to turn a set of flat mesh objects into cut files.
///
/// Lengths in [`ExportConfig::padding`] are expressed in
/// [`ExportConfig::unit`], the same unit one mesh coordinate represents.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ExportConfig {
    pub unit: LengthUnit,
    pub pixels_per_inch: f64,
    pub padding: Padding,
    /// Rotate each outline set so its longest edge runs vertically.
    pub auto_rotate: bool,
    pub style: Style,
    pub profile: Profile,
    /// Largest allowed out-of-plane deviation after flattening, relative to
    /// the size of the object. `inf` disables the check.
    pub coplanar_tolerance: f64,
    pub filter: ObjectFilter,
}

/// Margins around the outline bounding box, one per side.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct Padding {
    pub x_neg: f64,
    pub x_pos: f64,
    pub y_neg: f64,
    pub y_pos: f64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct Style {
    pub stroke: String,
    pub stroke_width: f64,
    pub fill: String,
    pub fill_opacity: f64,
}

/// SVG profile advertised by the generated document.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    Tiny,
    Full,
}

/// Decides which objects of a scene get exported.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct ObjectFilter {
    /// Only export objects listed in `selected`.
    pub only_selected: bool,
    pub selected: Vec<String>,
    /// Only export objects whose name starts with this.
    pub prefix: Option<String>,
}

impl ExportConfig {
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(err) => {
                warn!("Failed to load config, using defaults: {:#}", err);
                ExportConfig::default()
            }
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let string = fs::read_to_string(path)
            .with_context(|| format!("Failed to read `{}`", path.display()))?;
        let config = Self::from_toml(&string)?;
        info!("Loaded config from `{}`", path.display());
        Ok(config)
    }

    pub fn from_toml(string: &str) -> Result<Self> {
        let config: Self = toml::from_str(string)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, toml::to_string(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.pixels_per_inch.is_finite() && self.pixels_per_inch > 0.0,
            "Pixels per inch must be positive, got {}",
            self.pixels_per_inch
        );
        self.padding.validate()?;
        self.style.validate()?;
        ensure!(
            self.coplanar_tolerance >= 0.0,
            "Coplanar tolerance must not be negative, got {}",
            self.coplanar_tolerance
        );
        ensure!(
            !self.filter.only_selected || !self.filter.selected.is_empty(),
            "Only selected objects requested but nothing is selected"
        );
        Ok(())
    }

    pub fn units(&self) -> UnitTable {
        UnitTable::new(self.pixels_per_inch)
    }

    /// Output pixels per mesh unit.
    pub fn unit_scale(&self) -> f64 {
        self.units().scale(self.unit)
    }

    /// Padding converted into output pixels.
    pub fn padding_pixels(&self) -> Padding {
        self.padding.scaled(self.unit_scale())
    }
}

impl Padding {
    pub const ZERO: Padding = Padding::uniform(0.0);

    pub const fn uniform(value: f64) -> Self {
        Self {
            x_neg: value,
            x_pos: value,
            y_neg: value,
            y_pos: value,
        }
    }

    pub fn scaled(&self, scale: f64) -> Self {
        Self {
            x_neg: self.x_neg * scale,
            x_pos: self.x_pos * scale,
            y_neg: self.y_neg * scale,
            y_pos: self.y_pos * scale,
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (side, value) in [
            ("x-neg", self.x_neg),
            ("x-pos", self.x_pos),
            ("y-neg", self.y_neg),
            ("y-pos", self.y_pos),
        ] {
            ensure!(
                value.is_finite() && value >= 0.0,
                "Padding {side} must be a non-negative number, got {value}"
            );
        }
        Ok(())
    }
}

impl Style {
    pub fn validate(&self) -> Result<()> {
        ensure!(!self.stroke.trim().is_empty(), "Stroke color is empty");
        ensure!(!self.fill.trim().is_empty(), "Fill color is empty");
        ensure!(
            self.stroke_width.is_finite() && self.stroke_width >= 0.0,
            "Stroke width must not be negative, got {}",
            self.stroke_width
        );
        ensure!(
            (0.0..=1.0).contains(&self.fill_opacity),
            "Fill opacity must be within 0.0..=1.0, got {}",
            self.fill_opacity
        );
        Ok(())
    }
}

impl Profile {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name.to_lowercase().as_str() {
            "tiny" => Profile::Tiny,
            "full" => Profile::Full,
            _ => return None,
        })
    }

    pub fn base_profile(&self) -> &'static str {
        match self {
            Profile::Tiny => "tiny",
            Profile::Full => "full",
        }
    }

    pub fn version(&self) -> &'static str {
        match self {
            Profile::Tiny => "1.2",
            Profile::Full => "1.1",
        }
    }
}

impl ObjectFilter {
    pub fn matches(&self, name: &str) -> bool {
        (!self.only_selected || self.selected.iter().any(|x| x == name))
            && self.prefix.as_ref().map_or(true, |x| name.starts_with(x.as_str()))
    }

    /// File stem for an exported object: the name without the filter prefix
    /// and any separator following it.
    pub fn output_stem<'a>(&self, name: &'a str) -> &'a str {
        let stripped = self
            .prefix
            .as_ref()
            .and_then(|prefix| name.strip_prefix(prefix.as_str()))
            .unwrap_or(name)
            .trim_start_matches(['_', '-', '.']);

        if stripped.is_empty() {
            name
        } else {
            stripped
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            unit: LengthUnit::Cm,
            pixels_per_inch: DEFAULT_PIXELS_PER_INCH,
            padding: Padding::uniform(1.0),
            auto_rotate: false,
            style: Style::default(),
            profile: Profile::Tiny,
            coplanar_tolerance: 1e-6,
            filter: ObjectFilter {
                prefix: Some("LC".into()),
                ..Default::default()
            },
        }
    }
}

impl Default for Padding {
    fn default() -> Self {
        Self::uniform(1.0)
    }
}

impl Default for Style {
    fn default() -> Self {
        Self {
            stroke: "black".into(),
            stroke_width: 1.0,
            fill: "white".into(),
            fill_opacity: 0.0,
        }
    }
}

impl Default for Profile {
    fn default() -> Self {
        Profile::Tiny
    }
}
