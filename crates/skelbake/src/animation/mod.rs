//! Keyframe animation
//!
//! This module provides the animation data the pose evaluator consumes:
//! - Keyframe tracks with time lookup and interpolation
//! - Linear interpolation for translation and scale, slerp for rotation
//! - Per-joint channels composed as `T * R * S`
//! - Animation clips with exact-name channel lookup
//!
//! # Example
//!
//! ```rust
//! use glam::{Quat, Vec3};
//! use skelbake::animation::{AnimationChannel, KeyBoundary, Keyframe, KeyframeTrack};
//!
//! let translation = KeyframeTrack::new(vec![
//!     Keyframe::new(0.0, Vec3::ZERO),
//!     Keyframe::new(1.0, Vec3::new(0.0, 2.0, 0.0)),
//! ])?;
//! let channel = AnimationChannel::new(
//!     "Hips",
//!     translation,
//!     KeyframeTrack::constant(Quat::IDENTITY),
//!     KeyframeTrack::constant(Vec3::ONE),
//! );
//!
//! let pose = channel.evaluate(0.5, KeyBoundary::Wrap)?;
//! assert!((pose.w_axis.y - 1.0).abs() < 1e-5);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod channel;
mod track;
mod types;

pub use channel::{Animation, AnimationChannel};
pub use track::{KeyBoundary, Keyframe, KeyframeTrack, TrackError};
pub use types::{Interpolate, TrackKind};
