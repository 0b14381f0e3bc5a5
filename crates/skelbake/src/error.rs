use std::io;
use thiserror::Error;

use crate::animation::TrackKind;

/// Error types for pose evaluation, skinning and scene I/O
#[derive(Error, Debug)]
pub enum BakeError {
    /// A keyframe track has no keys at all
    #[error("Empty {track} track on joint '{joint}'")]
    EmptyKeyframeTrack { joint: String, track: TrackKind },

    /// Keyframe times go backwards somewhere in the track
    #[error("{track} track on joint '{joint}' is not time-ordered at key {index}")]
    UnorderedKeyframes {
        joint: String,
        track: TrackKind,
        index: usize,
    },

    /// The bracketing keyframe pair has the same timestamp
    #[error(
        "Zero-duration keyframe interval in {track} track on joint '{joint}' at key {index} (time {time})"
    )]
    ZeroDurationKeyframeInterval {
        joint: String,
        track: TrackKind,
        index: usize,
        time: f64,
    },

    /// Pose queries need a finite time
    #[error("Non-finite sample time: {0}")]
    NonFiniteTime(f64),

    /// A bone binding refers to a joint the skeleton does not contain
    #[error("Unknown joint: {0}")]
    UnknownJoint(String),

    /// The joint arena does not describe a valid tree
    #[error("Invalid hierarchy: {0}")]
    InvalidHierarchy(String),

    /// A bone weight points past the end of the vertex buffer
    #[error("Bone '{bone}' references vertex {vertex}, but the mesh has {vertex_count} vertices")]
    VertexOutOfRange {
        bone: String,
        vertex: usize,
        vertex_count: usize,
    },

    /// A face points past the end of the vertex buffer
    #[error("Mesh '{mesh}' face {face} references vertex {vertex}, but the mesh has {vertex_count} vertices")]
    FaceIndexOutOfRange {
        mesh: String,
        face: usize,
        vertex: usize,
        vertex_count: usize,
    },

    /// Per-vertex attribute arrays disagree in length
    #[error("Mesh '{mesh}' has {positions} positions but {normals} normals")]
    AttributeMismatch {
        mesh: String,
        positions: usize,
        normals: usize,
    },

    /// Requested animation is not part of the scene
    #[error("Animation not found: {0}")]
    AnimationNotFound(String),

    /// Requested mesh index is not part of the scene
    #[error("Mesh not found: {0}")]
    MeshNotFound(usize),

    /// Failure reported by the scene importer
    #[error("Import error: {0}")]
    Import(String),

    /// I/O error while writing baked output
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type using BakeError
pub type Result<T> = std::result::Result<T, BakeError>;
