use std::collections::HashMap;

use anyhow::{ensure, Result};
use common::{progress::Progress, serde::Deserializer};
use nalgebra::Vector3;

use crate::{util::tokenize, MeshObject};

pub fn parse<T: Deserializer>(
    des: &mut T,
    fallback_name: &str,
    progress: Progress,
) -> Result<MeshObject> {
    let is_ascii = &*des.read_bytes(5) == b"solid";

    // Some exporters start binary headers with `solid` too, so trust the
    // triangle count if it exactly explains the file size.
    des.jump_to(80);
    let tri_count = des.read_u32_le() as usize;
    let is_binary_sized = des.size() == 84 + tri_count * 50;
    des.jump_to(0);

    if is_ascii && !is_binary_sized {
        ascii::parse(des, fallback_name, progress)
    } else {
        binary::parse(des, fallback_name, progress)
    }
}

/// ```text
/// UINT8[80]    – Header                 - 80 bytes
/// UINT32       – Number of triangles    - 04 bytes
/// foreach triangle                      - 50 bytes
///     REAL32[3] – Normal vector         - 12 bytes
///     REAL32[3] – Vertex 1              - 12 bytes
///     REAL32[3] – Vertex 2              - 12 bytes
///     REAL32[3] – Vertex 3              - 12 bytes
///     UINT16    – Attribute byte count  - 02 bytes
/// end
/// ```
mod binary {
    use super::*;

    pub fn parse<T: Deserializer>(
        des: &mut T,
        name: &str,
        progress: Progress,
    ) -> Result<MeshObject> {
        ensure!(des.size() >= 84, "Binary STL is missing its header");
        des.advance_by(80); // skip header
        let tri_count = des.read_u32_le();
        ensure!(
            des.size() >= 84 + tri_count as usize * 50,
            "Binary STL declares {tri_count} triangles but is truncated"
        );
        progress.set_total(tri_count as u64);

        let mut verts = HashMap::new();
        let mut faces = Vec::new();
        for i in 0..tri_count {
            progress.set_complete(i as u64);
            des.advance_by(4 * 3); // skip normal
            faces.push(vec![
                vert_idx(&mut verts, des_vec3f_bin(des)),
                vert_idx(&mut verts, des_vec3f_bin(des)),
                vert_idx(&mut verts, des_vec3f_bin(des)),
            ]);
            des.advance_by(2);
        }

        Ok(finish(name, verts, faces))
    }
}

/// ```text
/// solid name
/// facet normal ni nj nk
///     outer loop
///         vertex v1x v1y v1z
///         vertex v2x v2y v2z
///         vertex v3x v3y v3z
///     endloop
/// endfacet
/// endsolid name
/// ```
mod ascii {
    use crate::util::WHITESPACE;

    use super::*;

    pub fn parse<T: Deserializer>(
        des: &mut T,
        fallback_name: &str,
        progress: Progress,
    ) -> Result<MeshObject> {
        let mut verts = HashMap::new();
        let mut faces = Vec::new();
        let mut name = None;

        let mut builder = [Vector3::zeros(); 3];
        let mut component = 9;
        let mut after_solid = false;

        tokenize(des, &WHITESPACE, progress, |token| {
            if after_solid {
                after_solid = false;
                if token != "facet" && token != "endsolid" {
                    name = Some(token.to_owned());
                    return Ok(());
                }
            }

            if component < 9 {
                if token == "vertex" {
                    return Ok(());
                }

                let value = token
                    .parse::<f32>()
                    .map_err(|_| anyhow::anyhow!("Invalid vertex component `{token}`"))?;
                builder[component / 3][component % 3] = value;
                component += 1;
                return Ok(());
            }

            match token {
                "solid" => after_solid = true,
                // the nine components of a facet follow its first `vertex`
                "vertex" => component = 0,
                "endloop" => {
                    faces.push(vec![
                        vert_idx(&mut verts, builder[0]),
                        vert_idx(&mut verts, builder[1]),
                        vert_idx(&mut verts, builder[2]),
                    ]);
                }
                _ => {}
            }
            Ok(())
        })?;

        let name = name.as_deref().unwrap_or(fallback_name);
        Ok(finish(name, verts, faces))
    }
}

/// Welds vertices with identical bit patterns so shared edges are detected.
/// Negative zero is stored as zero so both spellings weld together.
fn vert_idx(verts: &mut HashMap<Vector3<u32>, u32>, vert: Vector3<f32>) -> u32 {
    let size = verts.len() as u32;
    let key = vert.map(|x| (if x == 0.0 { 0.0_f32 } else { x }).to_bits());
    *verts.entry(key).or_insert(size)
}

fn finish(name: &str, verts: HashMap<Vector3<u32>, u32>, faces: Vec<Vec<u32>>) -> MeshObject {
    let mut verts = verts.into_iter().collect::<Vec<_>>();
    verts.sort_by_key(|(_vert, idx)| *idx);
    let verts = (verts.into_iter())
        .map(|(vert, _idx)| vert.map(f32::from_bits))
        .collect();
    MeshObject {
        name: name.to_owned(),
        verts,
        faces,
    }
}

fn des_vec3f_bin<T: Deserializer>(des: &mut T) -> Vector3<f32> {
    Vector3::new(des.read_f32_le(), des.read_f32_le(), des.read_f32_le())
}

#[cfg(test)]
mod tests {
    use common::serde::SliceDeserializer;

    use super::*;

    const SQUARE: [[f32; 3]; 6] = [
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [1.0, 1.0, 0.0],
        [0.0, 0.0, 0.0],
        [1.0, 1.0, 0.0],
        [0.0, 1.0, 0.0],
    ];

    fn binary_square() -> Vec<u8> {
        let mut out = vec![0; 80];
        out.extend_from_slice(&2_u32.to_le_bytes());
        for tri in SQUARE.chunks(3) {
            out.extend([0.0_f32, 0.0, 1.0].iter().flat_map(|x| x.to_le_bytes()));
            for vert in tri {
                out.extend(vert.iter().flat_map(|x| x.to_le_bytes()));
            }
            out.extend_from_slice(&[0, 0]);
        }
        out
    }

    fn ascii_square() -> String {
        let mut out = String::from("solid plate\n");
        for tri in SQUARE.chunks(3) {
            out.push_str("  facet normal 0 0 1\n    outer loop\n");
            for [x, y, z] in tri {
                out.push_str(&format!("      vertex {x} {y} {z}\n"));
            }
            out.push_str("    endloop\n  endfacet\n");
        }
        out.push_str("endsolid plate");
        out
    }

    #[test]
    fn binary_welds_shared_vertices() {
        let data = binary_square();
        let mut des = SliceDeserializer::new(&data);
        let mesh = parse(&mut des, "square", Progress::new()).unwrap();

        assert_eq!(mesh.name, "square");
        assert_eq!(mesh.verts.len(), 4);
        assert_eq!(mesh.faces, vec![vec![0, 1, 2], vec![0, 2, 3]]);
    }

    #[test]
    fn binary_with_solid_header() {
        let mut data = binary_square();
        data[..5].copy_from_slice(b"solid");
        let mut des = SliceDeserializer::new(&data);
        let mesh = parse(&mut des, "square", Progress::new()).unwrap();
        assert_eq!(mesh.faces.len(), 2);
    }

    #[test]
    fn ascii_uses_solid_name() {
        let data = ascii_square();
        let mut des = SliceDeserializer::new(data.as_bytes());
        let mesh = parse(&mut des, "square", Progress::new()).unwrap();

        assert_eq!(mesh.name, "plate");
        assert_eq!(mesh.verts.len(), 4);
        assert_eq!(mesh.faces, vec![vec![0, 1, 2], vec![0, 2, 3]]);
    }

    #[test]
    fn negative_zero_welds() {
        let mut data = binary_square();
        // rewrite the x of the second triangle's first corner as -0.0
        let offset = 84 + 50 + 12;
        data[offset..offset + 4].copy_from_slice(&(-0.0_f32).to_le_bytes());

        let mut des = SliceDeserializer::new(&data);
        let mesh = parse(&mut des, "square", Progress::new()).unwrap();
        assert_eq!(mesh.verts.len(), 4);
        assert_eq!(mesh.faces, vec![vec![0, 1, 2], vec![0, 2, 3]]);
    }

    #[test]
    fn truncated_binary() {
        let mut data = binary_square();
        data.truncate(100);
        let mut des = SliceDeserializer::new(&data);
        assert!(parse(&mut des, "square", Progress::new()).is_err());
    }
}
