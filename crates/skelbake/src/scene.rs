//! Loaded scene: skeleton, animations and meshes

use crate::animation::Animation;
use crate::error::{BakeError, Result};
use crate::mesh::Mesh;
use crate::skeleton::Skeleton;
use crate::skinning::{BakeOptions, BakedMesh, PoseBaker};

/// Which animation to sample
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AnimationSelector {
    /// First animation, or the rest pose when the scene has none
    #[default]
    First,
    ByName(String),
    ByIndex(usize),
    /// Ignore all animations and bake the rest pose
    RestPose,
}

/// Which meshes to bake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MeshSelector {
    #[default]
    First,
    Index(usize),
    All,
}

/// Everything a bake needs, owned in one place
#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub skeleton: Skeleton,
    pub animations: Vec<Animation>,
    pub meshes: Vec<Mesh>,
}

impl Scene {
    pub fn new(skeleton: Skeleton, animations: Vec<Animation>, meshes: Vec<Mesh>) -> Self {
        Self {
            skeleton,
            animations,
            meshes,
        }
    }

    pub fn first_animation(&self) -> Option<&Animation> {
        self.animations.first()
    }

    pub fn animation_by_name(&self, name: &str) -> Result<&Animation> {
        self.animations
            .iter()
            .find(|animation| animation.name == name)
            .ok_or_else(|| BakeError::AnimationNotFound(name.to_string()))
    }

    pub fn animation_by_index(&self, index: usize) -> Result<&Animation> {
        self.animations
            .get(index)
            .ok_or_else(|| BakeError::AnimationNotFound(format!("#{index}")))
    }

    /// Resolve a selector; `Ok(None)` means bake the rest pose
    pub fn select_animation(&self, selector: &AnimationSelector) -> Result<Option<&Animation>> {
        match selector {
            AnimationSelector::First => Ok(self.first_animation()),
            AnimationSelector::ByName(name) => self.animation_by_name(name).map(Some),
            AnimationSelector::ByIndex(index) => self.animation_by_index(*index).map(Some),
            AnimationSelector::RestPose => Ok(None),
        }
    }

    pub fn first_mesh(&self) -> Result<&Mesh> {
        self.meshes.first().ok_or(BakeError::MeshNotFound(0))
    }

    pub fn mesh(&self, index: usize) -> Result<&Mesh> {
        self.meshes.get(index).ok_or(BakeError::MeshNotFound(index))
    }

    pub fn select_meshes(&self, selector: MeshSelector) -> Result<Vec<&Mesh>> {
        match selector {
            MeshSelector::First => self.first_mesh().map(|mesh| vec![mesh]),
            MeshSelector::Index(index) => self.mesh(index).map(|mesh| vec![mesh]),
            MeshSelector::All => Ok(self.meshes.iter().collect()),
        }
    }

    /// Bake the selected meshes into the selected animation at `time`
    pub fn bake(
        &self,
        animation: &AnimationSelector,
        meshes: MeshSelector,
        time: f64,
        options: BakeOptions,
    ) -> Result<Vec<BakedMesh>> {
        let animation = self.select_animation(animation)?;
        let meshes = self.select_meshes(meshes)?;
        PoseBaker::new(&self.skeleton, options).bake_all(meshes, animation, time)
    }
}
