use mesh_format::MeshObject;

use crate::{
    error::{ExportError, ExportResult},
    Pos, EPSILON,
};

/// A polygon mesh in double precision. Faces list vertex indices in winding
/// order and may have any number of corners.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    vertices: Box<[Pos]>,
    faces: Box<[Box<[u32]>]>,
}

impl Mesh {
    /// Creates a new mesh, checking that every face only references
    /// existing vertices.
    pub fn new(vertices: Vec<Pos>, faces: Vec<Vec<u32>>) -> ExportResult<Self> {
        for (face, indices) in faces.iter().enumerate() {
            if let Some(&vertex) = indices.iter().find(|&&x| x as usize >= vertices.len()) {
                return Err(ExportError::VertexOutOfRange { face, vertex });
            }
        }

        Ok(Self {
            vertices: vertices.into_boxed_slice(),
            faces: faces.into_iter().map(Vec::into_boxed_slice).collect(),
        })
    }

    pub fn from_object(object: &MeshObject) -> ExportResult<Self> {
        let vertices = object.verts.iter().map(|x| x.cast::<f64>()).collect();
        Self::new(vertices, object.faces.clone())
    }

    pub fn vertices(&self) -> &[Pos] {
        self.vertices.as_ref()
    }

    pub fn faces(&self) -> &[Box<[u32]>] {
        self.faces.as_ref()
    }

    pub fn face(&self, index: usize) -> Option<&[u32]> {
        self.faces.get(index).map(AsRef::as_ref)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Unit normal of a face following its winding, or `None` for degenerate
    /// faces. Uses Newell's method so non-triangular faces are handled.
    pub fn normal(&self, index: usize) -> Option<Pos> {
        let face = self.face(index)?;
        let mut normal = Pos::zeros();

        for (i, &a) in face.iter().enumerate() {
            let b = face[(i + 1) % face.len()];
            let (a, b) = (self.vertices[a as usize], self.vertices[b as usize]);
            normal.x += (a.y - b.y) * (a.z + b.z);
            normal.y += (a.z - b.z) * (a.x + b.x);
            normal.z += (a.x - b.x) * (a.y + b.y);
        }

        normal.try_normalize(EPSILON)
    }

    /// The normal used to flatten the whole mesh. The mesh is assumed to be
    /// flat, so the first face with a usable normal stands in for all of them.
    pub fn reference_normal(&self) -> ExportResult<Pos> {
        (0..self.face_count())
            .find_map(|idx| self.normal(idx))
            .ok_or(ExportError::EmptyMesh)
    }
}
