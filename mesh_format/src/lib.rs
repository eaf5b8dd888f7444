use anyhow::{bail, Result};
use common::{progress::Progress, serde::Deserializer};
use nalgebra::Vector3;
use tracing::debug;

mod obj;
mod stl;
mod util;

/// A named polygon mesh as read from a file. Faces index into `verts` and
/// may have any number of corners.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MeshObject {
    pub name: String,
    pub verts: Vec<Vector3<f32>>,
    pub faces: Vec<Vec<u32>>,
}

impl MeshObject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Parses every object in a mesh file. `fallback_name` names objects the
/// file itself leaves unnamed, usually the file stem.
pub fn load_objects<T: Deserializer>(
    des: &mut T,
    format: &str,
    fallback_name: &str,
    progress: Progress,
) -> Result<Vec<MeshObject>> {
    let format = format.to_ascii_lowercase();
    let objects = match format.as_str() {
        "stl" => vec![stl::parse(des, fallback_name, progress.clone())?],
        "obj" => obj::parse(des, fallback_name, progress.clone())?,
        _ => bail!("Unsupported format: {}", format),
    };

    progress.set_finished();
    for object in objects.iter() {
        debug!(
            "Parsed `{}` {{ vert: {}, face: {} }}",
            object.name,
            object.verts.len(),
            object.faces.len()
        );
    }

    Ok(objects)
}
