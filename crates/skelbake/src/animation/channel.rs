//! Per-joint animation channels and whole animation clips

use std::collections::HashMap;

use glam::{Mat4, Quat, Vec3};

use super::track::{KeyBoundary, KeyframeTrack};
use super::types::TrackKind;
use crate::error::Result;

/// Translation, rotation and scale tracks driving one joint
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde-support",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct AnimationChannel {
    /// Name of the joint this channel targets
    pub joint: String,
    pub translation: KeyframeTrack<Vec3>,
    pub rotation: KeyframeTrack<Quat>,
    pub scale: KeyframeTrack<Vec3>,
}

impl AnimationChannel {
    pub fn new(
        joint: impl Into<String>,
        translation: KeyframeTrack<Vec3>,
        rotation: KeyframeTrack<Quat>,
        scale: KeyframeTrack<Vec3>,
    ) -> Self {
        Self {
            joint: joint.into(),
            translation,
            rotation,
            scale,
        }
    }

    /// A channel that holds a single pose for all time
    pub fn constant(
        joint: impl Into<String>,
        translation: Vec3,
        rotation: Quat,
        scale: Vec3,
    ) -> Self {
        Self::new(
            joint,
            KeyframeTrack::constant(translation),
            KeyframeTrack::constant(rotation),
            KeyframeTrack::constant(scale),
        )
    }

    /// Interpolated translation, rotation and scale at `time`
    pub fn sample(&self, time: f64, boundary: KeyBoundary) -> Result<(Vec3, Quat, Vec3)> {
        let translation = self
            .translation
            .value_at(time, boundary)
            .map_err(|e| e.in_track(&self.joint, TrackKind::Translation))?;
        let rotation = self
            .rotation
            .value_at(time, boundary)
            .map_err(|e| e.in_track(&self.joint, TrackKind::Rotation))?;
        let scale = self
            .scale
            .value_at(time, boundary)
            .map_err(|e| e.in_track(&self.joint, TrackKind::Scale))?;
        Ok((translation, rotation, scale))
    }

    /// Local pose at `time`, composed as `T * R * S`
    pub fn evaluate(&self, time: f64, boundary: KeyBoundary) -> Result<Mat4> {
        let (translation, rotation, scale) = self.sample(time, boundary)?;
        Ok(Mat4::from_scale_rotation_translation(
            scale,
            rotation,
            translation,
        ))
    }

    /// Total number of keys across all three tracks
    pub fn key_count(&self) -> usize {
        self.translation.len() + self.rotation.len() + self.scale.len()
    }

    /// Latest key time across all three tracks
    pub fn end_time(&self) -> f64 {
        self.translation
            .end_time()
            .max(self.rotation.end_time())
            .max(self.scale.end_time())
    }
}

/// A named animation clip
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde-support",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct Animation {
    pub name: String,
    /// Length of the clip in ticks
    pub duration: f64,
    /// Tick rate; 0 when the source file did not state one
    pub ticks_per_second: f64,
    channels: Vec<AnimationChannel>,
}

impl Animation {
    pub fn new(
        name: impl Into<String>,
        duration: f64,
        ticks_per_second: f64,
        channels: Vec<AnimationChannel>,
    ) -> Self {
        Self {
            name: name.into(),
            duration,
            ticks_per_second,
            channels,
        }
    }

    /// Build a clip whose duration is the latest key time of its channels
    pub fn from_channels(name: impl Into<String>, channels: Vec<AnimationChannel>) -> Self {
        let duration = channels
            .iter()
            .map(AnimationChannel::end_time)
            .fold(0.0, f64::max);
        Self::new(name, duration, 1.0, channels)
    }

    pub fn channels(&self) -> &[AnimationChannel] {
        &self.channels
    }

    /// First channel targeting `joint`, by exact name
    pub fn channel(&self, joint: &str) -> Option<&AnimationChannel> {
        self.channels.iter().find(|channel| channel.joint == joint)
    }

    /// Channels keyed by joint name; the first channel wins on duplicates
    pub fn channel_map(&self) -> HashMap<&str, &AnimationChannel> {
        let mut map = HashMap::with_capacity(self.channels.len());
        for channel in &self.channels {
            map.entry(channel.joint.as_str()).or_insert(channel);
        }
        map
    }

    /// Convert seconds into this clip's tick units
    pub fn seconds_to_ticks(&self, seconds: f64) -> f64 {
        if self.ticks_per_second > 0.0 {
            seconds * self.ticks_per_second
        } else {
            seconds
        }
    }

    /// Duration in seconds
    pub fn duration_seconds(&self) -> f64 {
        if self.ticks_per_second > 0.0 {
            self.duration / self.ticks_per_second
        } else {
            self.duration
        }
    }
}
