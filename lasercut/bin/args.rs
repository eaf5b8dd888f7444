use std::{path::PathBuf, str::FromStr};

use anyhow::{Context, Result};
use clap::Parser;
use common::{
    config::{ExportConfig, Padding, Profile},
    units::LengthUnit,
};
use nalgebra::{ArrayStorage, Const, Matrix, Scalar, Vector4, U1};
use num_traits::Zero;

#[derive(Debug, Parser)]
/// Exports the boundary of flat mesh objects as SVG cut paths.
pub struct Args {
    /// Path to .obj or .stl files. Every matching object becomes one SVG.
    #[arg(required = true)]
    pub meshes: Vec<PathBuf>,

    #[arg(long)]
    /// TOML export config. Flags below override its values.
    pub config: Option<PathBuf>,
    #[arg(long)]
    /// Write the effective config to this path.
    pub save_config: Option<PathBuf>,
    #[arg(short, long, default_value = ".")]
    /// Directory to write the SVG files into.
    pub output_dir: PathBuf,

    #[arg(long, value_parser = unit_value_parser)]
    /// Unit one mesh coordinate represents (px, pt, pc, in, mm, cm).
    pub unit: Option<LengthUnit>,
    #[arg(long)]
    /// Output pixel density used to convert units.
    pub pixels_per_inch: Option<f64>,
    #[arg(long, value_parser = vector_value_parser::<f64, 4>)]
    /// Margin around the outlines in the mesh unit, as
    /// "x-neg, x-pos, y-neg, y-pos".
    pub padding: Option<Vector4<f64>>,
    #[arg(long)]
    /// Rotate each object so its longest edge runs vertically.
    pub auto_rotate: bool,
    #[arg(long)]
    /// Largest out-of-plane deviation allowed, relative to object size.
    pub coplanar_tolerance: Option<f64>,

    #[arg(long, conflicts_with = "all")]
    /// Only export objects whose name starts with this.
    pub prefix: Option<String>,
    #[arg(long)]
    /// Export objects regardless of their name prefix.
    pub all: bool,
    #[arg(short, long)]
    /// Only export the objects with these names.
    pub select: Vec<String>,

    #[arg(long)]
    /// Stroke color of the cut path.
    pub stroke: Option<String>,
    #[arg(long)]
    pub stroke_width: Option<f64>,
    #[arg(long)]
    /// Fill color of the cut path.
    pub fill: Option<String>,
    #[arg(long)]
    pub fill_opacity: Option<f64>,
    #[arg(long, value_parser = profile_value_parser)]
    /// SVG profile to declare (tiny or full).
    pub profile: Option<Profile>,

    #[arg(short, long, action = clap::ArgAction::Count)]
    /// Log more detail, repeat for even more.
    pub verbose: u8,
}

impl Args {
    /// Loads the config file if one was given and applies the command line
    /// overrides on top of it.
    pub fn export_config(&self) -> Result<ExportConfig> {
        let mut config = match &self.config {
            Some(path) => ExportConfig::load(path)?,
            None => ExportConfig::default(),
        };

        if let Some(unit) = self.unit {
            config.unit = unit;
        }
        if let Some(ppi) = self.pixels_per_inch {
            config.pixels_per_inch = ppi;
        }
        if let Some(padding) = self.padding {
            config.padding = Padding {
                x_neg: padding[0],
                x_pos: padding[1],
                y_neg: padding[2],
                y_pos: padding[3],
            };
        }
        config.auto_rotate |= self.auto_rotate;
        if let Some(tolerance) = self.coplanar_tolerance {
            config.coplanar_tolerance = tolerance;
        }

        if self.all {
            config.filter.prefix = None;
        } else if let Some(prefix) = &self.prefix {
            config.filter.prefix = Some(prefix.to_owned());
        }
        if !self.select.is_empty() {
            config.filter.only_selected = true;
            config.filter.selected = self.select.clone();
        }

        let style = &mut config.style;
        if let Some(stroke) = &self.stroke {
            style.stroke = stroke.to_owned();
        }
        if let Some(width) = self.stroke_width {
            style.stroke_width = width;
        }
        if let Some(fill) = &self.fill {
            style.fill = fill.to_owned();
        }
        if let Some(opacity) = self.fill_opacity {
            style.fill_opacity = opacity;
        }
        if let Some(profile) = self.profile {
            config.profile = profile;
        }

        config.validate()?;
        Ok(config)
    }
}

fn unit_value_parser(raw: &str) -> Result<LengthUnit> {
    LengthUnit::from_name(raw).with_context(|| format!("Unknown unit `{raw}`"))
}

fn profile_value_parser(raw: &str) -> Result<Profile> {
    Profile::from_name(raw).with_context(|| format!("Unknown SVG profile `{raw}`"))
}

fn vector_value_parser<T, const N: usize>(
    raw: &str,
) -> Result<Matrix<T, Const<N>, U1, ArrayStorage<T, N, 1>>>
where
    T: FromStr + Scalar + Zero,
    T::Err: Send + Sync + std::error::Error + 'static,
{
    let mut vec = Matrix::<T, Const<N>, U1, ArrayStorage<T, N, 1>>::zeros();

    let mut parts = raw.splitn(N, ',');
    for i in 0..N {
        let element = parts.next().context("Missing vector element")?.trim();
        vec[i] = element
            .parse()
            .context("Can't convert element from string")?;
    }

    Ok(vec)
}
