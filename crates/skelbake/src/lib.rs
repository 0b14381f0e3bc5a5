//! Skeletal pose evaluation and vertex skinning
//!
//! `skelbake` samples a skeletal animation at a single point in time and
//! deforms ("bakes") a skinned mesh into that pose. The result is a static
//! mesh that can be written out as Wavefront OBJ text.
//!
//! The pipeline, leaves first:
//!
//! 1. [`animation::KeyframeTrack`] looks up and interpolates keys
//! 2. [`animation::AnimationChannel`] composes translation, rotation and
//!    scale into a local pose
//! 3. [`skeleton::evaluate_world_transforms`] combines local poses down the
//!    joint tree
//! 4. [`skinning::PoseBaker`] blends bone matrices per vertex
//! 5. [`export::ObjWriter`] serializes the result
//!
//! # Example
//!
//! ```rust,no_run
//! use skelbake::{AnimationSelector, BakeOptions, MeshSelector, load_gltf, write_obj};
//!
//! let scene = load_gltf("character.glb")?;
//! let baked = scene.bake(
//!     &AnimationSelector::First,
//!     MeshSelector::All,
//!     0.5,
//!     BakeOptions::default(),
//! )?;
//! write_obj("character.baked.obj", &baked)?;
//! # Ok::<(), skelbake::BakeError>(())
//! ```
//!
//! # Features
//!
//! - `gltf` (default): glTF 2.0 import
//! - `parallel`: per-vertex skinning on rayon
//! - `serde-support`: `Serialize`/`Deserialize` on the data model

pub mod animation;
pub mod error;
pub mod export;
pub mod import;
pub mod mesh;
pub mod scene;
pub mod skeleton;
pub mod skinning;

pub use glam;

pub use animation::{Animation, AnimationChannel, KeyBoundary, Keyframe, KeyframeTrack};
pub use error::{BakeError, Result};
pub use export::{MeshWriteReport, NonTriangularFace, ObjWriter, write_obj};
#[cfg(feature = "gltf")]
pub use import::load_gltf;
pub use mesh::{Face, Mesh, MeshBone, VertexWeight};
pub use scene::{AnimationSelector, MeshSelector, Scene};
pub use skeleton::{
    EvaluationOptions, HierarchyPolicy, Joint, JointId, Skeleton, WorldTransformTable,
    evaluate_world_transforms,
};
pub use skinning::{BakeOptions, BakedMesh, PoseBaker, SkinningMode, bake_pose};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
