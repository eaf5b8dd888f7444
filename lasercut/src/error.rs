use thiserror::Error;

/// Reasons a single object cannot be exported. None of these are transient,
/// so the batch driver skips the object instead of retrying.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExportError {
    #[error("Mesh has no faces to take a normal from")]
    EmptyMesh,

    #[error("Face {face} references missing vertex {vertex}")]
    VertexOutOfRange { face: usize, vertex: u32 },

    #[error("Boundary edges do not form closed loops (stuck at vertex {vertex})")]
    OpenBoundary { vertex: u32 },

    #[error("Mesh is not planar, vertices deviate {deviation} from the projection plane")]
    NonPlanar { deviation: f64 },

    #[error("No edge of positive length to align with")]
    DegenerateGeometry,
}

pub type ExportResult<T> = std::result::Result<T, ExportError>;
