use common::{
    config::{ExportConfig, Profile},
    progress::Progress,
};
use mesh_format::MeshObject;
use tracing::{debug, info, warn};

use crate::{
    boundary::boundary_edges,
    error::ExportResult,
    format::svg::SvgFile,
    layout::{layout, Layout, LayoutParams},
    mesh::Mesh,
    outline::{assemble, Outlines},
    projection::Projector,
    Pos2,
};

/// Settings for exporting a single object.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportParams {
    pub layout: LayoutParams,
    pub coplanar_tolerance: f64,
    pub profile: Profile,
}

/// Outcome of exporting one object of a batch.
#[derive(Debug)]
pub struct ExportedObject {
    pub name: String,
    /// Output file name without extension.
    pub stem: String,
    pub result: ExportResult<SvgFile>,
}

impl From<&ExportConfig> for ExportParams {
    fn from(config: &ExportConfig) -> Self {
        Self {
            layout: LayoutParams::from_config(config),
            coplanar_tolerance: config.coplanar_tolerance,
            profile: config.profile,
        }
    }
}

impl Default for ExportParams {
    fn default() -> Self {
        Self {
            layout: LayoutParams::default(),
            coplanar_tolerance: 1e-6,
            profile: Profile::default(),
        }
    }
}

/// Boundary outlines of `mesh` in the plane of its first usable face.
pub fn flatten(mesh: &Mesh, coplanar_tolerance: f64) -> ExportResult<Outlines<Pos2>> {
    let boundary = boundary_edges(mesh)?;
    let normal = mesh.reference_normal()?;
    let outlines = assemble(mesh, &boundary)?;

    debug!(
        "Found {} boundary edges, reference normal [{:.4}, {:.4}, {:.4}]",
        boundary.len(),
        normal.x,
        normal.y,
        normal.z
    );
    Projector::from_normal(normal).flatten(outlines, coplanar_tolerance)
}

/// Runs the whole pipeline for one mesh.
pub fn export_mesh(mesh: &Mesh, params: &ExportParams) -> ExportResult<Layout> {
    let outlines = flatten(mesh, params.coplanar_tolerance)?;
    layout(outlines, &params.layout)
}

/// Exports every object the config's filter accepts. An object that fails is
/// logged and reported in its [`ExportedObject`] without stopping the rest.
pub fn export_objects(
    objects: &[MeshObject],
    config: &ExportConfig,
    progress: Progress,
) -> Vec<ExportedObject> {
    let params = ExportParams::from(config);
    let selected = objects
        .iter()
        .filter(|x| config.filter.matches(&x.name))
        .collect::<Vec<_>>();

    progress.set_total(selected.len() as u64);
    debug!(
        "Exporting {} of {} objects",
        selected.len(),
        objects.len()
    );

    let mut exported = Vec::with_capacity(selected.len());
    for object in selected {
        let result = Mesh::from_object(object)
            .and_then(|mesh| export_mesh(&mesh, &params))
            .map(|layout| SvgFile::new(layout, params.profile));

        match &result {
            Ok(file) => info!(
                "Exported `{}` ({} outlines, {:.2}x{:.2})",
                object.name,
                file.layout().outlines.len(),
                file.width(),
                file.height()
            ),
            Err(err) => warn!("Skipping `{}`: {err}", object.name),
        }

        exported.push(ExportedObject {
            name: object.name.clone(),
            stem: config.filter.output_stem(&object.name).to_owned(),
            result,
        });
        progress.add_complete(1);
    }

    progress.set_finished();
    exported
}
