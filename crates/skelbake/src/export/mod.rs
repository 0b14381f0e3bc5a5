//! Writers for baked meshes

pub mod obj;

pub use obj::{MeshWriteReport, NonTriangularFace, ObjWriter, write_obj};
