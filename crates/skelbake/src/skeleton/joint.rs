//! Joint arena with integer parent links

use std::collections::HashMap;
use std::fmt;

use glam::Mat4;

use crate::error::{BakeError, Result};

/// Handle to a joint inside a [`Skeleton`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde-support",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct JointId(pub usize);

impl JointId {
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for JointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A node of the joint tree
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde-support",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct Joint {
    pub name: String,
    pub parent: Option<JointId>,
    /// Local transform used when no channel drives this joint
    pub rest_pose: Mat4,
}

impl Joint {
    pub fn root(name: impl Into<String>, rest_pose: Mat4) -> Self {
        Self {
            name: name.into(),
            parent: None,
            rest_pose,
        }
    }

    pub fn child(name: impl Into<String>, parent: JointId, rest_pose: Mat4) -> Self {
        Self {
            name: name.into(),
            parent: Some(parent),
            rest_pose,
        }
    }
}

/// Validated joint hierarchy
///
/// Joints are stored in a flat arena and refer to their parent by index.
/// The children lists and a parent-before-child visiting order are built
/// once at construction. Several roots are allowed.
#[derive(Debug, Clone, Default)]
pub struct Skeleton {
    joints: Vec<Joint>,
    children: Vec<Vec<JointId>>,
    roots: Vec<JointId>,
    preorder: Vec<JointId>,
    by_name: HashMap<String, JointId>,
}

impl Skeleton {
    /// Build a skeleton, rejecting bad parents, cycles and duplicate names
    pub fn new(joints: Vec<Joint>) -> Result<Self> {
        let count = joints.len();
        let mut children = vec![Vec::new(); count];
        let mut roots = Vec::new();
        let mut by_name = HashMap::with_capacity(count);

        for (index, joint) in joints.iter().enumerate() {
            if by_name.insert(joint.name.clone(), JointId(index)).is_some() {
                return Err(BakeError::InvalidHierarchy(format!(
                    "duplicate joint name '{}'",
                    joint.name
                )));
            }

            match joint.parent {
                None => roots.push(JointId(index)),
                Some(parent) if parent.0 >= count => {
                    return Err(BakeError::InvalidHierarchy(format!(
                        "joint '{}' has parent {} but only {} joints exist",
                        joint.name, parent, count
                    )));
                }
                Some(parent) if parent.0 == index => {
                    return Err(BakeError::InvalidHierarchy(format!(
                        "joint '{}' is its own parent",
                        joint.name
                    )));
                }
                Some(parent) => children[parent.0].push(JointId(index)),
            }
        }

        let preorder = walk_preorder(&roots, &children);
        if preorder.len() != count {
            let orphan = (0..count)
                .find(|&index| !preorder.contains(&JointId(index)))
                .map_or_else(String::new, |index| joints[index].name.clone());
            return Err(BakeError::InvalidHierarchy(format!(
                "joint '{orphan}' is part of a parent cycle"
            )));
        }

        Ok(Self {
            joints,
            children,
            roots,
            preorder,
            by_name,
        })
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    pub fn joint(&self, id: JointId) -> Option<&Joint> {
        self.joints.get(id.0)
    }

    /// Look up a joint by exact name
    pub fn find(&self, name: &str) -> Option<JointId> {
        self.by_name.get(name).copied()
    }

    pub fn parent(&self, id: JointId) -> Option<JointId> {
        self.joints.get(id.0).and_then(|joint| joint.parent)
    }

    pub fn children(&self, id: JointId) -> &[JointId] {
        self.children.get(id.0).map_or(&[], Vec::as_slice)
    }

    pub fn roots(&self) -> &[JointId] {
        &self.roots
    }

    /// Every joint, parents before their children
    pub fn preorder(&self) -> &[JointId] {
        &self.preorder
    }

    /// Number of ancestors above `id`
    pub fn depth(&self, id: JointId) -> usize {
        let mut depth = 0;
        let mut current = self.parent(id);
        while let Some(parent) = current {
            depth += 1;
            current = self.parent(parent);
        }
        depth
    }
}

/// Iterative pre-order walk from every root
fn walk_preorder(roots: &[JointId], children: &[Vec<JointId>]) -> Vec<JointId> {
    let mut order = Vec::with_capacity(children.len());
    let mut stack: Vec<JointId> = roots.iter().rev().copied().collect();

    while let Some(id) = stack.pop() {
        order.push(id);
        stack.extend(children[id.0].iter().rev().copied());
    }

    order
}
