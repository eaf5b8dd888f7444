use std::collections::HashMap;

use anyhow::{bail, Context, Result};
use common::{progress::Progress, serde::Deserializer};
use nalgebra::Vector3;

use crate::{util::lines, MeshObject};

/// Faces of one `o` block, still indexing the file-wide vertex list.
struct PendingObject {
    name: String,
    named: bool,
    faces: Vec<Vec<u32>>,
}

pub fn parse<T: Deserializer>(
    des: &mut T,
    fallback_name: &str,
    progress: Progress,
) -> Result<Vec<MeshObject>> {
    let mut verts = Vec::new();
    let mut objects = vec![PendingObject::new(fallback_name, false)];

    let mut line_number = 0;
    lines(des, progress, |line| {
        line_number += 1;
        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("v") => {
                let vert = next_vertex(parts)
                    .with_context(|| format!("Invalid vertex on line {line_number}"))?;
                verts.push(vert);
            }
            Some("f") => {
                let face = next_face(parts, verts.len())
                    .with_context(|| format!("Invalid face on line {line_number}"))?;
                if let Some(object) = objects.last_mut() {
                    object.faces.push(face);
                }
            }
            Some("o") => {
                let name = parts.collect::<Vec<_>>().join(" ");
                objects.push(PendingObject::new(&name, true));
            }
            _ => {}
        }
        Ok(())
    })?;

    objects
        .into_iter()
        .filter(|x| x.named || !x.faces.is_empty())
        .map(|x| x.finish(&verts))
        .collect()
}

impl PendingObject {
    fn new(name: &str, named: bool) -> Self {
        Self {
            name: name.to_owned(),
            named,
            faces: Vec::new(),
        }
    }

    /// Copies the vertices this object uses out of the shared list, in order
    /// of first use, and renumbers its faces to match.
    fn finish(self, verts: &[Vector3<f32>]) -> Result<MeshObject> {
        let mut object = MeshObject::new(self.name);
        let mut remap = HashMap::new();

        for face in self.faces {
            let mut local = Vec::with_capacity(face.len());
            for idx in face {
                let Some(&vert) = verts.get(idx as usize) else {
                    bail!("Face in `{}` references missing vertex {}", object.name, idx + 1);
                };

                let next = object.verts.len() as u32;
                let local_idx = *remap.entry(idx).or_insert_with(|| {
                    object.verts.push(vert);
                    next
                });
                local.push(local_idx);
            }
            object.faces.push(local);
        }

        Ok(object)
    }
}

fn next_vertex<'a>(mut parts: impl Iterator<Item = &'a str>) -> Option<Vector3<f32>> {
    Some(Vector3::new(
        parts.next()?.parse().ok()?,
        parts.next()?.parse().ok()?,
        parts.next()?.parse().ok()?,
    ))
}

/// Parses `f a b c ...` where each corner may be `v`, `v/t`, `v//n` or
/// `v/t/n`, and negative indices count back from the latest vertex.
fn next_face<'a>(parts: impl Iterator<Item = &'a str>, vertex_count: usize) -> Option<Vec<u32>> {
    fn next_idx(str: &str, vertex_count: usize) -> Option<u32> {
        let number = str.split_once('/').map(|x| x.0).unwrap_or(str);
        let number = number.parse::<i64>().ok()?;
        let idx = match number {
            0 => return None,
            1.. => number - 1,
            _ => vertex_count as i64 + number,
        };
        u32::try_from(idx).ok()
    }

    let face = parts
        .map(|x| next_idx(x, vertex_count))
        .collect::<Option<Vec<_>>>()?;
    (face.len() >= 3).then_some(face)
}

#[cfg(test)]
mod tests {
    use common::serde::SliceDeserializer;

    use super::*;

    fn load(src: &str) -> Result<Vec<MeshObject>> {
        let mut des = SliceDeserializer::new(src.as_bytes());
        parse(&mut des, "file", Progress::new())
    }

    #[test]
    fn splits_named_objects() {
        let objects = load(
            "# two plates\n\
             o LC_square\n\
             v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\n\
             f 1 2 3 4\n\
             o LC_triangle\n\
             v 5 0 0\nv 6 0 0\nv 5 1 0\n\
             f 5/1/1 6/2/1 7/3/1\n",
        )
        .unwrap();

        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0].name, "LC_square");
        assert_eq!(objects[0].verts.len(), 4);
        assert_eq!(objects[0].faces, vec![vec![0, 1, 2, 3]]);

        assert_eq!(objects[1].name, "LC_triangle");
        assert_eq!(objects[1].verts[0], Vector3::new(5.0, 0.0, 0.0));
        assert_eq!(objects[1].faces, vec![vec![0, 1, 2]]);
    }

    #[test]
    fn unnamed_file_uses_fallback() {
        let objects = load("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3").unwrap();
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].name, "file");
    }

    #[test]
    fn negative_indices() {
        let objects = load("v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\n").unwrap();
        assert_eq!(objects[0].faces, vec![vec![0, 1, 2]]);
    }

    #[test]
    fn named_object_without_faces_is_kept() {
        let objects = load("o Empty\nv 0 0 0\n").unwrap();
        assert_eq!(objects.len(), 1);
        assert!(objects[0].faces.is_empty());
    }

    #[test]
    fn errors_name_the_line() {
        let err = load("o Plate\n\n# corners\n\nv 0 0 0\r\nv 1 oops 0\n").unwrap_err();
        assert!(format!("{err:#}").contains("line 6"), "{err:#}");
    }

    #[test]
    fn invalid_lines() {
        assert!(load("v 0 zero 0\n").is_err());
        assert!(load("v 0 0 0\nf 1 2\n").is_err());
        assert!(load("v 0 0 0\nf 1 2 9\n").is_err());
        assert!(load("v 0 0 0\nf 0 1 1\n").is_err());
    }
}
