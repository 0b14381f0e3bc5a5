//! Vertex skinning into a sampled pose
//!
//! Baking evaluates the skeleton at one time, builds a skinning matrix per
//! bone (`world(joint) * offset`) and deforms every vertex influenced by at
//! least one bone. Output goes into a [`BakedMesh`] owned by the caller;
//! the source [`Mesh`] is never modified, so one mesh can be baked at any
//! number of times.
//!
//! # Example
//!
//! ```rust
//! use glam::{Mat4, Vec3};
//! use skelbake::mesh::{Mesh, MeshBone, VertexWeight};
//! use skelbake::skeleton::{Joint, Skeleton};
//! use skelbake::skinning::{BakeOptions, bake_pose};
//!
//! let skeleton = Skeleton::new(vec![Joint::root(
//!     "Root",
//!     Mat4::from_translation(Vec3::new(0.0, 1.0, 0.0)),
//! )])?;
//! let mesh = Mesh::new("quad", vec![Vec3::ZERO, Vec3::X])
//!     .with_bone(MeshBone::new("Root", Mat4::IDENTITY, vec![VertexWeight::new(0, 1.0)]));
//!
//! let baked = bake_pose(&mesh, &skeleton, None, 0.0, BakeOptions::default())?;
//! assert_eq!(baked.positions[0], Vec3::new(0.0, 1.0, 0.0));
//! assert_eq!(baked.positions[1], Vec3::X);
//! # Ok::<(), skelbake::BakeError>(())
//! ```

use glam::{Mat4, Vec3};
use log::{debug, trace};

use crate::animation::Animation;
use crate::error::{BakeError, Result};
use crate::mesh::{Face, Mesh};
use crate::skeleton::{
    EvaluationOptions, Skeleton, WorldTransformTable, evaluate_world_transforms,
};

/// How the bone matrices influencing a vertex are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde-support",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum SkinningMode {
    /// Linear blend skinning: `sum(w * M) / sum(w)`
    #[default]
    Weighted,
    /// Product of the influencing bone matrices in bone order
    ///
    /// Weights are ignored. This reproduces output from exporters that
    /// multiplied bone transforms together instead of blending them and is
    /// wrong for any vertex with more than one influence.
    SequentialProduct,
}

/// Options for a bake call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde-support",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct BakeOptions {
    pub evaluation: EvaluationOptions,
    pub skinning: SkinningMode,
    /// Move unskinned meshes by the world transform of their owning node
    pub rigid_meshes: bool,
}

/// Deformed copy of a mesh
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(
    feature = "serde-support",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct BakedMesh {
    pub name: String,
    pub positions: Vec<Vec3>,
    pub normals: Option<Vec<Vec3>>,
    pub faces: Vec<Face>,
    /// Number of vertices that were actually transformed
    pub deformed_vertices: usize,
}

impl BakedMesh {
    /// Undeformed copy of `mesh`
    pub fn from_mesh(mesh: &Mesh) -> Self {
        let mut baked = Self::default();
        baked.reset_from(mesh);
        baked
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Overwrite this buffer with the undeformed data of `mesh`,
    /// keeping existing allocations
    fn reset_from(&mut self, mesh: &Mesh) {
        self.name.clone_from(&mesh.name);
        self.positions.clone_from(&mesh.positions);
        self.normals.clone_from(&mesh.normals);
        self.faces.clone_from(&mesh.faces);
        self.deformed_vertices = 0;
    }

    fn apply(&mut self, vertex: usize, matrix: &Mat4) {
        self.positions[vertex] = matrix.transform_point3(self.positions[vertex]);
        if let Some(normals) = &mut self.normals {
            normals[vertex] = matrix.transform_vector3(normals[vertex]).normalize_or_zero();
        }
        self.deformed_vertices += 1;
    }
}

/// Bone index and weight affecting one vertex
#[derive(Debug, Clone, Copy)]
struct Influence {
    bone: usize,
    weight: f32,
}

/// Bakes meshes bound to one skeleton
#[derive(Debug, Clone, Copy)]
pub struct PoseBaker<'a> {
    skeleton: &'a Skeleton,
    options: BakeOptions,
}

impl<'a> PoseBaker<'a> {
    pub fn new(skeleton: &'a Skeleton, options: BakeOptions) -> Self {
        Self { skeleton, options }
    }

    pub fn skeleton(&self) -> &Skeleton {
        self.skeleton
    }

    pub fn options(&self) -> &BakeOptions {
        &self.options
    }

    /// World transforms for `animation` at `time`
    pub fn evaluate(
        &self,
        animation: Option<&Animation>,
        time: f64,
    ) -> Result<WorldTransformTable> {
        evaluate_world_transforms(self.skeleton, animation, time, self.options.evaluation)
    }

    /// Evaluate the pose and bake a single mesh into a fresh buffer
    pub fn bake(&self, mesh: &Mesh, animation: Option<&Animation>, time: f64) -> Result<BakedMesh> {
        let world = self.evaluate(animation, time)?;
        let mut baked = BakedMesh::default();
        self.bake_into(mesh, &world, &mut baked)?;
        Ok(baked)
    }

    /// Evaluate the pose once and bake every mesh in `meshes`
    pub fn bake_all<'m>(
        &self,
        meshes: impl IntoIterator<Item = &'m Mesh>,
        animation: Option<&Animation>,
        time: f64,
    ) -> Result<Vec<BakedMesh>> {
        let world = self.evaluate(animation, time)?;
        meshes
            .into_iter()
            .map(|mesh| {
                let mut baked = BakedMesh::default();
                self.bake_into(mesh, &world, &mut baked)?;
                Ok(baked)
            })
            .collect()
    }

    /// Bake `mesh` into `out` using an already evaluated pose
    ///
    /// `out` is overwritten. On error its contents are unspecified.
    pub fn bake_into(
        &self,
        mesh: &Mesh,
        world: &WorldTransformTable,
        out: &mut BakedMesh,
    ) -> Result<()> {
        mesh.validate()?;
        out.reset_from(mesh);

        if !mesh.is_skinned() {
            return self.bake_rigid(mesh, world, out);
        }

        let bone_matrices = self.bone_matrices(mesh, world)?;
        let influences = collect_influences(mesh);
        let vertex_matrices = blend_all(&influences, &bone_matrices, self.options.skinning);

        for (vertex, matrix) in vertex_matrices.iter().enumerate() {
            if let Some(matrix) = matrix {
                out.apply(vertex, matrix);
            }
        }

        debug!(
            "Baked mesh '{}': {} of {} vertices deformed by {} bones",
            mesh.name,
            out.deformed_vertices,
            mesh.vertex_count(),
            mesh.bones.len()
        );
        Ok(())
    }

    fn bake_rigid(
        &self,
        mesh: &Mesh,
        world: &WorldTransformTable,
        out: &mut BakedMesh,
    ) -> Result<()> {
        let Some(node) = mesh.node.filter(|_| self.options.rigid_meshes) else {
            trace!("Mesh '{}' has no bones, copied unchanged", mesh.name);
            return Ok(());
        };

        let matrix = world
            .get(node)
            .ok_or_else(|| BakeError::UnknownJoint(node.to_string()))?;
        for vertex in 0..out.vertex_count() {
            out.apply(vertex, &matrix);
        }

        debug!("Mesh '{}' moved rigidly with node {}", mesh.name, node);
        Ok(())
    }

    /// `world(joint) * offset` for every bone, in bone order
    fn bone_matrices(&self, mesh: &Mesh, world: &WorldTransformTable) -> Result<Vec<Mat4>> {
        mesh.bones
            .iter()
            .map(|bone| {
                let world_matrix = self
                    .skeleton
                    .find(&bone.joint)
                    .and_then(|id| world.get(id))
                    .ok_or_else(|| BakeError::UnknownJoint(bone.joint.clone()))?;
                Ok(world_matrix * bone.offset)
            })
            .collect()
    }
}

/// Evaluate the pose of `skeleton` and bake `mesh` into it
pub fn bake_pose(
    mesh: &Mesh,
    skeleton: &Skeleton,
    animation: Option<&Animation>,
    time: f64,
    options: BakeOptions,
) -> Result<BakedMesh> {
    PoseBaker::new(skeleton, options).bake(mesh, animation, time)
}

/// Per-vertex influence lists, each in bone order
fn collect_influences(mesh: &Mesh) -> Vec<Vec<Influence>> {
    let mut influences = vec![Vec::new(); mesh.vertex_count()];
    for (bone, binding) in mesh.bones.iter().enumerate() {
        for weight in &binding.weights {
            influences[weight.vertex].push(Influence {
                bone,
                weight: weight.weight,
            });
        }
    }
    influences
}

#[cfg(not(feature = "parallel"))]
fn blend_all(
    influences: &[Vec<Influence>],
    bones: &[Mat4],
    mode: SkinningMode,
) -> Vec<Option<Mat4>> {
    influences
        .iter()
        .map(|list| blend(list, bones, mode))
        .collect()
}

#[cfg(feature = "parallel")]
fn blend_all(
    influences: &[Vec<Influence>],
    bones: &[Mat4],
    mode: SkinningMode,
) -> Vec<Option<Mat4>> {
    use rayon::prelude::*;

    influences
        .par_iter()
        .map(|list| blend(list, bones, mode))
        .collect()
}

/// Skinning matrix for one vertex, or `None` to leave it untouched
fn blend(influences: &[Influence], bones: &[Mat4], mode: SkinningMode) -> Option<Mat4> {
    if influences.is_empty() {
        return None;
    }

    match mode {
        SkinningMode::Weighted => {
            let total: f32 = influences.iter().map(|i| i.weight).sum();
            if total == 0.0 {
                return None;
            }
            let sum = influences
                .iter()
                .fold(Mat4::ZERO, |acc, i| acc + bones[i.bone] * i.weight);
            Some(sum * total.recip())
        }
        SkinningMode::SequentialProduct => Some(influences.iter().fold(Mat4::IDENTITY, |acc, i| {
            trace!("Ignoring weight {} of bone {}", i.weight, i.bone);
            acc * bones[i.bone]
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{AnimationChannel, Keyframe, KeyframeTrack};
    use crate::mesh::{MeshBone, VertexWeight};
    use crate::skeleton::{Joint, JointId};
    use glam::Quat;

    fn two_joints() -> Skeleton {
        Skeleton::new(vec![
            Joint::root("Root", Mat4::from_translation(Vec3::new(0.0, 1.0, 0.0))),
            Joint::child(
                "Child",
                JointId(0),
                Mat4::from_translation(Vec3::new(2.0, 0.0, 0.0)),
            ),
        ])
        .unwrap()
    }

    fn weights(pairs: &[(usize, f32)]) -> Vec<VertexWeight> {
        pairs
            .iter()
            .map(|&(vertex, weight)| VertexWeight::new(vertex, weight))
            .collect()
    }

    #[test]
    fn test_identity_bone_leaves_vertex() {
        let skeleton = Skeleton::new(vec![Joint::root("Root", Mat4::IDENTITY)]).unwrap();
        let p = Vec3::new(0.3, -1.7, 4.2);
        let mesh = Mesh::new("m", vec![p]).with_bone(MeshBone::new(
            "Root",
            Mat4::IDENTITY,
            weights(&[(0, 1.0)]),
        ));

        let baked = bake_pose(&mesh, &skeleton, None, 0.0, BakeOptions::default()).unwrap();
        assert_eq!(baked.positions[0], p);
        assert_eq!(baked.deformed_vertices, 1);
    }

    #[test]
    fn test_zero_influence_vertex_is_bit_identical() {
        let skeleton = two_joints();
        let odd = Vec3::new(0.1, 1.0e-7, -3.333_333);
        let mesh = Mesh::new("m", vec![Vec3::ZERO, odd])
            .with_normals(vec![Vec3::Z, Vec3::new(0.6, 0.0, 0.8)])
            .with_bone(MeshBone::new("Child", Mat4::IDENTITY, weights(&[(0, 1.0)])));

        let baked = bake_pose(&mesh, &skeleton, None, 0.0, BakeOptions::default()).unwrap();
        assert_eq!(
            baked.positions[1].to_array().map(f32::to_bits),
            odd.to_array().map(f32::to_bits)
        );
        assert_eq!(baked.normals.unwrap()[1], Vec3::new(0.6, 0.0, 0.8));
        assert_eq!(baked.deformed_vertices, 1);
    }

    #[test]
    fn test_offset_cancels_rest_pose() {
        let skeleton = two_joints();
        let child_world = Mat4::from_translation(Vec3::new(2.0, 1.0, 0.0));
        let mesh = Mesh::new("m", vec![Vec3::new(5.0, 5.0, 5.0)]).with_bone(MeshBone::new(
            "Child",
            child_world.inverse(),
            weights(&[(0, 1.0)]),
        ));

        let baked = bake_pose(&mesh, &skeleton, None, 0.0, BakeOptions::default()).unwrap();
        assert!((baked.positions[0] - Vec3::splat(5.0)).length() < 0.001);
    }

    #[test]
    fn test_weighted_blend_normalizes_by_total() {
        let skeleton = Skeleton::new(vec![
            Joint::root("A", Mat4::from_translation(Vec3::new(2.0, 0.0, 0.0))),
            Joint::root("B", Mat4::from_translation(Vec3::new(0.0, 4.0, 0.0))),
        ])
        .unwrap();
        // Weights sum to 2, so the blend is the plain average
        let mesh = Mesh::new("m", vec![Vec3::ZERO])
            .with_bone(MeshBone::new("A", Mat4::IDENTITY, weights(&[(0, 1.0)])))
            .with_bone(MeshBone::new("B", Mat4::IDENTITY, weights(&[(0, 1.0)])));

        let baked = bake_pose(&mesh, &skeleton, None, 0.0, BakeOptions::default()).unwrap();
        assert!((baked.positions[0] - Vec3::new(1.0, 2.0, 0.0)).length() < 0.001);
    }

    #[test]
    fn test_sequential_product_ignores_weights() {
        let skeleton = Skeleton::new(vec![
            Joint::root("A", Mat4::from_translation(Vec3::new(2.0, 0.0, 0.0))),
            Joint::root("B", Mat4::from_translation(Vec3::new(0.0, 4.0, 0.0))),
        ])
        .unwrap();
        let mesh = Mesh::new("m", vec![Vec3::ZERO])
            .with_bone(MeshBone::new("A", Mat4::IDENTITY, weights(&[(0, 0.25)])))
            .with_bone(MeshBone::new("B", Mat4::IDENTITY, weights(&[(0, 0.75)])));
        let options = BakeOptions {
            skinning: SkinningMode::SequentialProduct,
            ..Default::default()
        };

        let baked = bake_pose(&mesh, &skeleton, None, 0.0, options).unwrap();
        assert!((baked.positions[0] - Vec3::new(2.0, 4.0, 0.0)).length() < 0.001);
    }

    #[test]
    fn test_zero_total_weight_keeps_vertex() {
        let skeleton = two_joints();
        let mesh = Mesh::new("m", vec![Vec3::X]).with_bone(MeshBone::new(
            "Root",
            Mat4::IDENTITY,
            weights(&[(0, 0.0)]),
        ));

        let baked = bake_pose(&mesh, &skeleton, None, 0.0, BakeOptions::default()).unwrap();
        assert_eq!(baked.positions[0], Vec3::X);
        assert_eq!(baked.deformed_vertices, 0);
    }

    #[test]
    fn test_normals_rotated_and_renormalized() {
        let skeleton = Skeleton::new(vec![Joint::root(
            "Root",
            Mat4::from_scale_rotation_translation(
                Vec3::splat(3.0),
                Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
                Vec3::new(7.0, 0.0, 0.0),
            ),
        )])
        .unwrap();
        let mesh = Mesh::new("m", vec![Vec3::ZERO])
            .with_normals(vec![Vec3::X])
            .with_bone(MeshBone::new("Root", Mat4::IDENTITY, weights(&[(0, 1.0)])));

        let baked = bake_pose(&mesh, &skeleton, None, 0.0, BakeOptions::default()).unwrap();
        let normal = baked.normals.unwrap()[0];
        assert!((normal - Vec3::Y).length() < 0.001);
        assert!((baked.positions[0] - Vec3::new(7.0, 0.0, 0.0)).length() < 0.001);
    }

    #[test]
    fn test_unknown_joint() {
        let skeleton = two_joints();
        let mesh = Mesh::new("m", vec![Vec3::ZERO]).with_bone(MeshBone::new(
            "Missing",
            Mat4::IDENTITY,
            weights(&[(0, 1.0)]),
        ));

        let err = bake_pose(&mesh, &skeleton, None, 0.0, BakeOptions::default()).unwrap_err();
        assert!(matches!(err, BakeError::UnknownJoint(name) if name == "Missing"));
    }

    #[test]
    fn test_vertex_out_of_range() {
        let skeleton = two_joints();
        let mesh = Mesh::new("m", vec![Vec3::ZERO]).with_bone(MeshBone::new(
            "Root",
            Mat4::IDENTITY,
            weights(&[(4, 1.0)]),
        ));

        let err = bake_pose(&mesh, &skeleton, None, 0.0, BakeOptions::default()).unwrap_err();
        assert!(matches!(err, BakeError::VertexOutOfRange { vertex: 4, .. }));
    }

    #[test]
    fn test_face_index_out_of_range() {
        let skeleton = two_joints();
        let mesh = Mesh::new("m", vec![Vec3::ZERO, Vec3::X]).with_faces(vec![vec![0, 1, 2]]);

        let err = bake_pose(&mesh, &skeleton, None, 0.0, BakeOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            BakeError::FaceIndexOutOfRange { face: 0, vertex: 2, .. }
        ));
    }

    #[test]
    fn test_unskinned_mesh_copied() {
        let skeleton = two_joints();
        let mesh = Mesh::new("static", vec![Vec3::X, Vec3::Y])
            .with_faces(vec![vec![0, 1, 1]])
            .with_node(JointId(1));

        let baked = bake_pose(&mesh, &skeleton, None, 0.0, BakeOptions::default()).unwrap();
        assert_eq!(baked.positions, mesh.positions);
        assert_eq!(baked.faces, mesh.faces);
        assert_eq!(baked.name, "static");
    }

    #[test]
    fn test_rigid_mesh_follows_node() {
        let skeleton = two_joints();
        let mesh = Mesh::new("prop", vec![Vec3::ZERO]).with_node(JointId(1));
        let options = BakeOptions {
            rigid_meshes: true,
            ..Default::default()
        };

        let baked = bake_pose(&mesh, &skeleton, None, 0.0, options).unwrap();
        assert!((baked.positions[0] - Vec3::new(2.0, 1.0, 0.0)).length() < 0.001);
    }

    #[test]
    fn test_bake_into_reuses_buffer_across_times() {
        let skeleton = two_joints();
        let channel = AnimationChannel::new(
            "Root",
            KeyframeTrack::new(vec![
                Keyframe::new(0.0, Vec3::ZERO),
                Keyframe::new(1.0, Vec3::new(0.0, 0.0, 10.0)),
            ])
            .unwrap(),
            KeyframeTrack::constant(Quat::IDENTITY),
            KeyframeTrack::constant(Vec3::ONE),
        );
        let animation = Animation::from_channels("Slide", vec![channel]);
        let mesh = Mesh::new("m", vec![Vec3::ZERO]).with_bone(MeshBone::new(
            "Root",
            Mat4::IDENTITY,
            weights(&[(0, 1.0)]),
        ));

        let baker = PoseBaker::new(&skeleton, BakeOptions::default());
        let mut out = BakedMesh::default();
        for (time, z) in [(0.25, 2.5), (0.5, 5.0)] {
            let world = baker.evaluate(Some(&animation), time).unwrap();
            baker.bake_into(&mesh, &world, &mut out).unwrap();
            assert!((out.positions[0].z - z).abs() < 0.001);
        }
        // Source mesh untouched
        assert_eq!(mesh.positions[0], Vec3::ZERO);
    }

    #[test]
    fn test_identity_table_applies_offsets_only() {
        let skeleton = two_joints();
        let mesh = Mesh::new("m", vec![Vec3::ZERO]).with_bone(MeshBone::new(
            "Child",
            Mat4::from_translation(Vec3::new(0.0, 0.0, -1.0)),
            weights(&[(0, 1.0)]),
        ));

        let baker = PoseBaker::new(&skeleton, BakeOptions::default());
        let mut out = BakedMesh::from_mesh(&mesh);
        baker
            .bake_into(&mesh, &WorldTransformTable::identity(skeleton.len()), &mut out)
            .unwrap();
        assert_eq!(out.positions[0], Vec3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn test_bake_all_shares_pose() {
        let skeleton = two_joints();
        let a = Mesh::new("a", vec![Vec3::ZERO]).with_bone(MeshBone::new(
            "Root",
            Mat4::IDENTITY,
            weights(&[(0, 1.0)]),
        ));
        let b = Mesh::new("b", vec![Vec3::ZERO]);

        let baked = PoseBaker::new(&skeleton, BakeOptions::default())
            .bake_all([&a, &b], None, 0.0)
            .unwrap();
        assert_eq!(baked.len(), 2);
        assert_eq!(baked[0].positions[0], Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(baked[1].positions[0], Vec3::ZERO);
    }
}
