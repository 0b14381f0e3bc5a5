//! Wavefront OBJ subset writer
//!
//! Only `v`, `vn` and triangular `f` records are emitted. Indices are
//! 1-based and continue across meshes written through the same writer.

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use glam::Vec3;
use log::{debug, warn};

use crate::error::Result;
use crate::skinning::BakedMesh;

/// A face with other than three vertices ended face output for a mesh
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde-support",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct NonTriangularFace {
    pub mesh: String,
    /// Index of the offending face within the mesh
    pub face: usize,
    pub vertex_count: usize,
}

impl fmt::Display for NonTriangularFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "mesh '{}': face {} has {} vertices, remaining faces not written",
            self.mesh, self.face, self.vertex_count
        )
    }
}

/// What was written for one mesh
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde-support",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct MeshWriteReport {
    pub mesh: String,
    pub vertices: usize,
    pub faces: usize,
    pub warning: Option<NonTriangularFace>,
}

/// Streams baked meshes as OBJ text
pub struct ObjWriter<W: Write> {
    inner: W,
    normals: bool,
    vertex_base: usize,
    normal_base: usize,
}

impl<W: Write> ObjWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            normals: false,
            vertex_base: 0,
            normal_base: 0,
        }
    }

    /// Also emit `vn` records and `v//vn` face references
    pub fn with_normals(mut self, normals: bool) -> Self {
        self.normals = normals;
        self
    }

    /// Vertices written so far
    pub fn vertices_written(&self) -> usize {
        self.vertex_base
    }

    pub fn write_mesh(&mut self, mesh: &BakedMesh) -> Result<MeshWriteReport> {
        for position in &mesh.positions {
            write_vec3(&mut self.inner, "v", *position)?;
        }

        let normals = mesh.normals.as_deref().filter(|_| self.normals);
        if let Some(normals) = normals {
            for normal in normals {
                write_vec3(&mut self.inner, "vn", *normal)?;
            }
        }

        let mut report = MeshWriteReport {
            mesh: mesh.name.clone(),
            vertices: mesh.positions.len(),
            faces: 0,
            warning: None,
        };

        for (index, face) in mesh.faces.iter().enumerate() {
            let [a, b, c] = face.as_slice() else {
                let warning = NonTriangularFace {
                    mesh: mesh.name.clone(),
                    face: index,
                    vertex_count: face.len(),
                };
                warn!("{warning}");
                report.warning = Some(warning);
                break;
            };

            let (a, b, c) = (*a as usize, *b as usize, *c as usize);
            if normals.is_some() {
                let (va, vb, vc) = (
                    a + self.vertex_base + 1,
                    b + self.vertex_base + 1,
                    c + self.vertex_base + 1,
                );
                let (na, nb, nc) = (
                    a + self.normal_base + 1,
                    b + self.normal_base + 1,
                    c + self.normal_base + 1,
                );
                writeln!(self.inner, "f {va}//{na} {vb}//{nb} {vc}//{nc}")?;
            } else {
                writeln!(
                    self.inner,
                    "f {} {} {}",
                    a + self.vertex_base + 1,
                    b + self.vertex_base + 1,
                    c + self.vertex_base + 1
                )?;
            }
            report.faces += 1;
        }

        self.vertex_base += mesh.positions.len();
        if let Some(normals) = normals {
            self.normal_base += normals.len();
        }

        debug!(
            "Wrote mesh '{}': {} vertices, {} faces",
            report.mesh, report.vertices, report.faces
        );
        Ok(report)
    }

    pub fn write_meshes<'m>(
        &mut self,
        meshes: impl IntoIterator<Item = &'m BakedMesh>,
    ) -> Result<Vec<MeshWriteReport>> {
        meshes.into_iter().map(|mesh| self.write_mesh(mesh)).collect()
    }

    /// Flush and return the underlying writer
    pub fn into_inner(mut self) -> Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

fn write_vec3<W: Write>(out: &mut W, tag: &str, v: Vec3) -> Result<()> {
    writeln!(out, "{tag} {} {} {}", v.x, v.y, v.z)?;
    Ok(())
}

/// Write `meshes` to a new OBJ file at `path`, positions and faces only
pub fn write_obj<P: AsRef<Path>>(path: P, meshes: &[BakedMesh]) -> Result<Vec<MeshWriteReport>> {
    let file = File::create(path)?;
    let mut writer = ObjWriter::new(BufWriter::new(file));
    let reports = writer.write_meshes(meshes)?;
    writer.into_inner()?;
    Ok(reports)
}
