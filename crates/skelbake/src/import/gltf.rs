//! glTF 2.0 scene import
//!
//! Every node reachable from the default scene becomes a joint, so meshes
//! parented under plain transform nodes still follow their ancestors.
//! Skins only decide which joints a primitive's vertices are bound to.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use glam::{Mat4, Quat, Vec3};
use gltf::animation::util::ReadOutputs;
use gltf::animation::{Interpolation, Property};
use gltf::mesh::Mode;
use gltf::{Document, Node, buffer};
use log::{debug, info, warn};

use crate::animation::{Animation, AnimationChannel, KeyframeTrack, TrackKind};
use crate::error::{BakeError, Result};
use crate::mesh::{Face, Mesh, MeshBone, VertexWeight};
use crate::scene::Scene;
use crate::skeleton::{Joint, JointId, Skeleton};

/// Load a `.gltf` or `.glb` file and its buffers
///
/// Images are not decoded.
pub fn load_gltf<P: AsRef<Path>>(path: P) -> Result<Scene> {
    let path = path.as_ref();
    info!("Loading glTF scene from {}", path.display());

    let gltf::Gltf { document, blob } = gltf::Gltf::open(path).map_err(import_error)?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    let buffers = gltf::import_buffers(&document, Some(base), blob).map_err(import_error)?;

    Scene::from_gltf(&document, &buffers)
}

fn import_error(err: gltf::Error) -> BakeError {
    BakeError::Import(err.to_string())
}

impl Scene {
    /// Build a scene from an already parsed glTF document
    pub fn from_gltf(document: &Document, buffers: &[buffer::Data]) -> Result<Self> {
        let nodes = NodeTable::build(document)?;
        let skeleton = Skeleton::new(nodes.joints.clone())?;

        let animations = document
            .animations()
            .map(|animation| read_animation(&animation, &nodes, buffers))
            .collect::<Result<Vec<_>>>()?;

        let mut meshes = Vec::new();
        for node in &nodes.order {
            read_node_meshes(node, &nodes, buffers, &mut meshes)?;
        }

        info!(
            "Imported {} joints, {} animations, {} meshes",
            skeleton.len(),
            animations.len(),
            meshes.len()
        );
        Ok(Self::new(skeleton, animations, meshes))
    }
}

/// Nodes of the active glTF scene, flattened into joints
struct NodeTable<'a> {
    order: Vec<Node<'a>>,
    joints: Vec<Joint>,
    ids: HashMap<usize, JointId>,
}

impl<'a> NodeTable<'a> {
    fn build(document: &'a Document) -> Result<Self> {
        let mut table = Self {
            order: Vec::new(),
            joints: Vec::new(),
            ids: HashMap::new(),
        };
        let scene = document
            .default_scene()
            .or_else(|| document.scenes().next());
        let Some(scene) = scene else {
            warn!("glTF document has no scenes");
            return Ok(table);
        };

        let mut names = HashSet::new();
        let mut stack: Vec<(Node<'a>, Option<JointId>)> =
            scene.nodes().map(|node| (node, None)).collect();
        stack.reverse();

        while let Some((node, parent)) = stack.pop() {
            if table.ids.contains_key(&node.index()) {
                return Err(BakeError::Import(format!(
                    "node {} is reachable more than once",
                    node.index()
                )));
            }

            let id = JointId(table.joints.len());
            let name = unique_name(&node, &mut names);
            let rest_pose = Mat4::from_cols_array_2d(&node.transform().matrix());
            table.joints.push(Joint {
                name,
                parent,
                rest_pose,
            });
            table.ids.insert(node.index(), id);

            let children: Vec<_> = node.children().collect();
            stack.extend(children.into_iter().rev().map(|child| (child, Some(id))));
            table.order.push(node);
        }

        debug!(
            "Scene {} flattened into {} joints",
            scene.index(),
            table.joints.len()
        );
        Ok(table)
    }

    fn id(&self, node: &Node<'_>) -> Option<JointId> {
        self.ids.get(&node.index()).copied()
    }

    fn node(&self, id: JointId) -> &Node<'a> {
        &self.order[id.0]
    }

    fn name(&self, id: JointId) -> &str {
        &self.joints[id.0].name
    }
}

fn unique_name(node: &Node<'_>, taken: &mut HashSet<String>) -> String {
    let mut name = node
        .name()
        .map_or_else(|| format!("node{}", node.index()), str::to_string);
    while taken.contains(&name) {
        name = format!("{name}.{}", node.index());
    }
    taken.insert(name.clone());
    name
}

/// Per-node tracks collected while walking an animation's channels
#[derive(Default)]
struct PendingChannel {
    translation: Option<KeyframeTrack<Vec3>>,
    rotation: Option<KeyframeTrack<Quat>>,
    scale: Option<KeyframeTrack<Vec3>>,
}

fn read_animation(
    animation: &gltf::Animation<'_>,
    nodes: &NodeTable<'_>,
    buffers: &[buffer::Data],
) -> Result<Animation> {
    let name = animation
        .name()
        .map_or_else(|| format!("animation{}", animation.index()), str::to_string);
    let mut pending: Vec<(JointId, PendingChannel)> = Vec::new();

    for channel in animation.channels() {
        let target = channel.target();
        let node = target.node();
        let Some(id) = nodes.id(&node) else {
            warn!(
                "Animation '{}' targets node {} outside the active scene, skipped",
                name,
                node.index()
            );
            continue;
        };
        let joint = nodes.name(id);

        if target.property() == Property::MorphTargetWeights {
            warn!("Animation '{name}': morph weights on '{joint}' skipped");
            continue;
        }

        let reader = channel.reader(|buffer| buffers.get(buffer.index()).map(|data| &data.0[..]));
        let times: Vec<f64> = reader
            .read_inputs()
            .ok_or_else(|| {
                BakeError::Import(format!("animation '{name}' has a sampler without inputs"))
            })?
            .map(f64::from)
            .collect();
        let outputs = reader.read_outputs().ok_or_else(|| {
            BakeError::Import(format!("animation '{name}' has a sampler without outputs"))
        })?;
        let cubic = channel.sampler().interpolation() == Interpolation::CubicSpline;

        let index = pending
            .iter()
            .position(|(existing, _)| *existing == id)
            .unwrap_or_else(|| {
                pending.push((id, PendingChannel::default()));
                pending.len() - 1
            });
        let slot = &mut pending[index].1;

        match outputs {
            ReadOutputs::Translations(values) => {
                let values = spline_values(values.map(Vec3::from_array), cubic);
                slot.translation = Some(
                    KeyframeTrack::from_samples(times, values)
                        .map_err(|e| e.in_track(joint, TrackKind::Translation))?,
                );
            }
            ReadOutputs::Rotations(values) => {
                let values = spline_values(values.into_f32().map(Quat::from_array), cubic);
                let values: Vec<Quat> = values.into_iter().map(Quat::normalize).collect();
                slot.rotation = Some(
                    KeyframeTrack::from_samples(times, values)
                        .map_err(|e| e.in_track(joint, TrackKind::Rotation))?,
                );
            }
            ReadOutputs::Scales(values) => {
                let values = spline_values(values.map(Vec3::from_array), cubic);
                slot.scale = Some(
                    KeyframeTrack::from_samples(times, values)
                        .map_err(|e| e.in_track(joint, TrackKind::Scale))?,
                );
            }
            ReadOutputs::MorphTargetWeights(_) => {}
        }
    }

    let channels = pending
        .into_iter()
        .map(|(id, tracks)| {
            let (translation, rotation, scale) = nodes.node(id).transform().decomposed();
            AnimationChannel::new(
                nodes.name(id),
                tracks
                    .translation
                    .unwrap_or_else(|| KeyframeTrack::constant(Vec3::from_array(translation))),
                tracks
                    .rotation
                    .unwrap_or_else(|| KeyframeTrack::constant(Quat::from_array(rotation))),
                tracks
                    .scale
                    .unwrap_or_else(|| KeyframeTrack::constant(Vec3::from_array(scale))),
            )
        })
        .collect();

    let animation = Animation::from_channels(name, channels);
    debug!(
        "Animation '{}': {} channels, {:.3}s",
        animation.name,
        animation.channels().len(),
        animation.duration
    );
    Ok(animation)
}

/// Cubic-spline outputs hold (in-tangent, value, out-tangent) per key
fn spline_values<T: Copy>(values: impl Iterator<Item = T>, cubic: bool) -> Vec<T> {
    let values: Vec<T> = values.collect();
    if cubic {
        values.chunks_exact(3).map(|chunk| chunk[1]).collect()
    } else {
        values
    }
}

fn read_node_meshes(
    node: &Node<'_>,
    nodes: &NodeTable<'_>,
    buffers: &[buffer::Data],
    out: &mut Vec<Mesh>,
) -> Result<()> {
    let Some(gltf_mesh) = node.mesh() else {
        return Ok(());
    };
    let owner = nodes.id(node);
    let mesh_name = gltf_mesh
        .name()
        .map_or_else(|| format!("mesh{}", gltf_mesh.index()), str::to_string);

    let skin = match node.skin() {
        Some(skin) => Some(read_skin(&skin, nodes, buffers)?),
        None => None,
    };

    for primitive in gltf_mesh.primitives() {
        let name = format!("{mesh_name}.{}", primitive.index());
        let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| &data.0[..]));

        let Some(positions) = reader.read_positions() else {
            warn!("Primitive '{name}' has no POSITION attribute, skipped");
            continue;
        };
        let positions: Vec<Vec3> = positions.map(Vec3::from_array).collect();
        let normals = reader
            .read_normals()
            .map(|normals| normals.map(Vec3::from_array).collect());

        let indices: Vec<u32> = match reader.read_indices() {
            Some(indices) => indices.into_u32().collect(),
            None => {
                let count = u32::try_from(positions.len()).map_err(|_| {
                    BakeError::Import(format!("primitive '{name}' has too many vertices"))
                })?;
                (0..count).collect()
            }
        };
        let faces = assemble_faces(primitive.mode(), &indices);

        let mut bones = Vec::new();
        if let Some((joints, offsets)) = &skin {
            let mut weights: Vec<Vec<VertexWeight>> = vec![Vec::new(); joints.len()];
            let mut set = 0;
            while let (Some(joint_set), Some(weight_set)) =
                (reader.read_joints(set), reader.read_weights(set))
            {
                for (vertex, (slots, amounts)) in joint_set
                    .into_u16()
                    .zip(weight_set.into_f32())
                    .enumerate()
                {
                    for (slot, weight) in slots.into_iter().zip(amounts) {
                        if weight == 0.0 {
                            continue;
                        }
                        let target = weights.get_mut(usize::from(slot)).ok_or_else(|| {
                            BakeError::Import(format!(
                                "primitive '{name}' references skin joint {slot} of {}",
                                joints.len()
                            ))
                        })?;
                        target.push(VertexWeight::new(vertex, weight));
                    }
                }
                set += 1;
            }

            bones = joints
                .iter()
                .zip(offsets)
                .zip(weights)
                .filter(|(_, weights)| !weights.is_empty())
                .map(|((joint, offset), weights)| MeshBone::new(joint.clone(), *offset, weights))
                .collect();
        }

        debug!(
            "Primitive '{}': {} vertices, {} faces, {} bones",
            name,
            positions.len(),
            faces.len(),
            bones.len()
        );
        out.push(Mesh {
            name,
            positions,
            normals,
            faces,
            bones,
            node: owner,
        });
    }

    Ok(())
}

/// Joint names and inverse bind matrices of a skin
fn read_skin(
    skin: &gltf::Skin<'_>,
    nodes: &NodeTable<'_>,
    buffers: &[buffer::Data],
) -> Result<(Vec<String>, Vec<Mat4>)> {
    let joints = skin
        .joints()
        .map(|joint| {
            nodes
                .id(&joint)
                .map(|id| nodes.name(id).to_string())
                .ok_or_else(|| {
                    BakeError::Import(format!(
                        "skin {} uses node {} outside the active scene",
                        skin.index(),
                        joint.index()
                    ))
                })
        })
        .collect::<Result<Vec<_>>>()?;

    let reader = skin.reader(|buffer| buffers.get(buffer.index()).map(|data| &data.0[..]));
    let offsets: Vec<Mat4> = match reader.read_inverse_bind_matrices() {
        Some(matrices) => matrices.map(|m| Mat4::from_cols_array_2d(&m)).collect(),
        None => vec![Mat4::IDENTITY; joints.len()],
    };
    if offsets.len() != joints.len() {
        return Err(BakeError::Import(format!(
            "skin {} has {} inverse bind matrices for {} joints",
            skin.index(),
            offsets.len(),
            joints.len()
        )));
    }

    Ok((joints, offsets))
}

/// Split an index stream into faces according to the primitive mode
fn assemble_faces(mode: Mode, indices: &[u32]) -> Vec<Face> {
    match mode {
        Mode::Triangles => indices.chunks_exact(3).map(<[u32]>::to_vec).collect(),
        Mode::TriangleStrip => indices
            .windows(3)
            .enumerate()
            .map(|(i, w)| {
                if i % 2 == 0 {
                    vec![w[0], w[1], w[2]]
                } else {
                    vec![w[1], w[0], w[2]]
                }
            })
            .collect(),
        Mode::TriangleFan => match indices.split_first() {
            Some((&hub, rest)) => rest.windows(2).map(|w| vec![hub, w[0], w[1]]).collect(),
            None => Vec::new(),
        },
        Mode::Lines => indices.chunks_exact(2).map(<[u32]>::to_vec).collect(),
        Mode::LineStrip => indices.windows(2).map(<[u32]>::to_vec).collect(),
        Mode::LineLoop => {
            let mut faces: Vec<Face> = indices.windows(2).map(<[u32]>::to_vec).collect();
            if let (Some(&first), Some(&last)) = (indices.first(), indices.last())
                && indices.len() > 2
            {
                faces.push(vec![last, first]);
            }
            faces
        }
        Mode::Points => indices.iter().map(|&i| vec![i]).collect(),
    }
}
