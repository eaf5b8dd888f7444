use std::collections::HashMap;

use crate::{
    error::{ExportError, ExportResult},
    mesh::Mesh,
};

/// Every undirected edge of a mesh along with how many faces use it.
#[derive(Debug, Clone)]
pub struct EdgeTable {
    edges: Vec<Edge>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    /// Endpoints in the direction the first face using this edge winds.
    pub vertices: [u32; 2],
    pub faces: u32,
}

impl EdgeTable {
    pub fn build(mesh: &Mesh) -> Self {
        let mut edges = Vec::<Edge>::new();
        let mut edge_map = HashMap::new();

        for face in mesh.faces() {
            for (i, &a) in face.iter().enumerate() {
                let b = face[(i + 1) % face.len()];
                if a == b {
                    continue;
                }

                let idx = *edge_map.entry((a.min(b), a.max(b))).or_insert_with(|| {
                    edges.push(Edge {
                        vertices: [a, b],
                        faces: 0,
                    });
                    edges.len() - 1
                });
                edges[idx].faces += 1;
            }
        }

        Self { edges }
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Edges bordering exactly one face, in the order they were first seen.
    pub fn boundary(&self) -> impl Iterator<Item = &Edge> + '_ {
        self.edges.iter().filter(|x| x.is_boundary())
    }
}

impl Edge {
    pub fn is_boundary(&self) -> bool {
        self.faces == 1
    }

    /// The endpoint that is not `vertex`.
    pub fn opposite(&self, vertex: u32) -> u32 {
        if self.vertices[0] == vertex {
            self.vertices[1]
        } else {
            self.vertices[0]
        }
    }
}

/// Collects the boundary edges of a mesh. Fails if the mesh has no faces, as
/// nothing could be flattened without a face normal.
pub fn boundary_edges(mesh: &Mesh) -> ExportResult<Vec<Edge>> {
    if mesh.face_count() == 0 {
        return Err(ExportError::EmptyMesh);
    }

    Ok(EdgeTable::build(mesh).boundary().copied().collect())
}
