//! Source mesh data and bone bindings

use glam::{Mat4, Vec3};

use crate::error::{BakeError, Result};
use crate::skeleton::JointId;

/// One polygon as a list of vertex indices
pub type Face = Vec<u32>;

/// Influence of a bone on a single vertex
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde-support",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct VertexWeight {
    pub vertex: usize,
    pub weight: f32,
}

impl VertexWeight {
    pub const fn new(vertex: usize, weight: f32) -> Self {
        Self { vertex, weight }
    }
}

/// Binding between a mesh and one skeleton joint
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde-support",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct MeshBone {
    /// Name of the joint driving this bone
    pub joint: String,
    /// Maps a mesh-space vertex into the joint's local space at bind time
    pub offset: Mat4,
    pub weights: Vec<VertexWeight>,
}

impl MeshBone {
    pub fn new(joint: impl Into<String>, offset: Mat4, weights: Vec<VertexWeight>) -> Self {
        Self {
            joint: joint.into(),
            offset,
            weights,
        }
    }
}

/// A triangle mesh with optional skinning data
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(
    feature = "serde-support",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct Mesh {
    pub name: String,
    pub positions: Vec<Vec3>,
    pub normals: Option<Vec<Vec3>>,
    pub faces: Vec<Face>,
    pub bones: Vec<MeshBone>,
    /// Scene node that carries this mesh, if any
    pub node: Option<JointId>,
}

impl Mesh {
    pub fn new(name: impl Into<String>, positions: Vec<Vec3>) -> Self {
        Self {
            name: name.into(),
            positions,
            ..Default::default()
        }
    }

    pub fn with_normals(mut self, normals: Vec<Vec3>) -> Self {
        self.normals = Some(normals);
        self
    }

    pub fn with_faces(mut self, faces: Vec<Face>) -> Self {
        self.faces = faces;
        self
    }

    pub fn with_bone(mut self, bone: MeshBone) -> Self {
        self.bones.push(bone);
        self
    }

    pub fn with_node(mut self, node: JointId) -> Self {
        self.node = Some(node);
        self
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn is_skinned(&self) -> bool {
        !self.bones.is_empty()
    }

    /// Check attribute lengths, weight targets and face indices
    pub fn validate(&self) -> Result<()> {
        if let Some(normals) = &self.normals
            && normals.len() != self.positions.len()
        {
            return Err(BakeError::AttributeMismatch {
                mesh: self.name.clone(),
                positions: self.positions.len(),
                normals: normals.len(),
            });
        }

        let vertex_count = self.positions.len();
        for bone in &self.bones {
            if let Some(bad) = bone.weights.iter().find(|w| w.vertex >= vertex_count) {
                return Err(BakeError::VertexOutOfRange {
                    bone: bone.joint.clone(),
                    vertex: bad.vertex,
                    vertex_count,
                });
            }
        }

        for (face, indices) in self.faces.iter().enumerate() {
            if let Some(&bad) = indices.iter().find(|&&i| i as usize >= vertex_count) {
                return Err(BakeError::FaceIndexOutOfRange {
                    mesh: self.name.clone(),
                    face,
                    vertex: bad as usize,
                    vertex_count,
                });
            }
        }

        Ok(())
    }
}
