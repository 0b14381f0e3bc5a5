//! World transform evaluation for the joint hierarchy
//!
//! Each joint's local pose comes from the animation channel that names it,
//! or from its rest pose when no channel does. Local poses are then
//! combined down the tree according to a [`HierarchyPolicy`].

use glam::Mat4;
use log::{debug, trace};

use super::joint::{JointId, Skeleton};
use crate::animation::{Animation, KeyBoundary};
use crate::error::{BakeError, Result};

/// How local poses are combined into world transforms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde-support",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum HierarchyPolicy {
    /// `world(j) = world(parent) * local(j)`, accumulated from the roots
    #[default]
    Accumulating,
    /// `world(j) = local(parent) * local(j)`
    ///
    /// Ignores every ancestor above the direct parent, so it only matches
    /// `Accumulating` for hierarchies two levels deep. Kept to reproduce
    /// output from tools that composed nodes this way.
    SingleLevel,
}

/// Knobs for a single pose evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde-support",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct EvaluationOptions {
    pub policy: HierarchyPolicy,
    pub boundary: KeyBoundary,
}

/// World-space transform of every joint at one sample time
#[derive(Debug, Clone, PartialEq)]
pub struct WorldTransformTable {
    transforms: Vec<Mat4>,
    time: f64,
}

impl WorldTransformTable {
    /// Table with every joint at identity
    pub fn identity(joint_count: usize) -> Self {
        Self {
            transforms: vec![Mat4::IDENTITY; joint_count],
            time: 0.0,
        }
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    pub fn get(&self, id: JointId) -> Option<Mat4> {
        self.transforms.get(id.0).copied()
    }

    /// World transform of the joint called `name`
    pub fn by_name(&self, skeleton: &Skeleton, name: &str) -> Option<Mat4> {
        skeleton.find(name).and_then(|id| self.get(id))
    }

    pub fn transforms(&self) -> &[Mat4] {
        &self.transforms
    }

    pub fn iter(&self) -> impl Iterator<Item = (JointId, &Mat4)> {
        self.transforms
            .iter()
            .enumerate()
            .map(|(index, transform)| (JointId(index), transform))
    }
}

/// Local pose of every joint at `time`
///
/// Channels are matched to joints by exact name. A joint without a
/// channel keeps its rest pose. Channels naming no joint are ignored.
pub fn local_poses(
    skeleton: &Skeleton,
    animation: Option<&Animation>,
    time: f64,
    boundary: KeyBoundary,
) -> Result<Vec<Mat4>> {
    let mut poses: Vec<Mat4> = skeleton
        .joints()
        .iter()
        .map(|joint| joint.rest_pose)
        .collect();

    let Some(animation) = animation else {
        return Ok(poses);
    };

    let channels = animation.channel_map();
    let mut matched = 0usize;
    for (index, joint) in skeleton.joints().iter().enumerate() {
        if let Some(channel) = channels.get(joint.name.as_str()) {
            poses[index] = channel.evaluate(time, boundary)?;
            matched += 1;
            trace!("Joint '{}' animated at t={}", joint.name, time);
        }
    }

    if matched < channels.len() {
        debug!(
            "Animation '{}': {} of {} channels target no joint in the skeleton",
            animation.name,
            channels.len() - matched,
            channels.len()
        );
    }

    Ok(poses)
}

/// Evaluate the world transform of every joint at `time`
pub fn evaluate_world_transforms(
    skeleton: &Skeleton,
    animation: Option<&Animation>,
    time: f64,
    options: EvaluationOptions,
) -> Result<WorldTransformTable> {
    if !time.is_finite() {
        return Err(BakeError::NonFiniteTime(time));
    }

    debug!(
        "Evaluating {} joints at t={} ({:?})",
        skeleton.len(),
        time,
        options.policy
    );

    let local = local_poses(skeleton, animation, time, options.boundary)?;
    let transforms = match options.policy {
        HierarchyPolicy::Accumulating => accumulate(skeleton, &local),
        HierarchyPolicy::SingleLevel => single_level(skeleton, &local),
    };

    Ok(WorldTransformTable { transforms, time })
}

/// Pre-order walk passing each joint's world transform down to its children
fn accumulate(skeleton: &Skeleton, local: &[Mat4]) -> Vec<Mat4> {
    let mut world = vec![Mat4::IDENTITY; local.len()];
    let mut stack: Vec<(JointId, Mat4)> = skeleton
        .roots()
        .iter()
        .rev()
        .map(|&root| (root, Mat4::IDENTITY))
        .collect();

    while let Some((id, parent_world)) = stack.pop() {
        let transform = parent_world * local[id.0];
        world[id.0] = transform;
        stack.extend(
            skeleton
                .children(id)
                .iter()
                .rev()
                .map(|&child| (child, transform)),
        );
    }

    world
}

fn single_level(skeleton: &Skeleton, local: &[Mat4]) -> Vec<Mat4> {
    skeleton
        .joints()
        .iter()
        .enumerate()
        .map(|(index, joint)| match joint.parent {
            Some(parent) => local[parent.0] * local[index],
            None => local[index],
        })
        .collect()
}
