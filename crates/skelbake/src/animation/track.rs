//! Keyframe tracks and time lookup

use thiserror::Error;

use super::types::{Interpolate, TrackKind};
use crate::error::BakeError;

/// A single timestamped sample
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde-support",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct Keyframe<T> {
    pub time: f64,
    pub value: T,
}

impl<T> Keyframe<T> {
    pub const fn new(time: f64, value: T) -> Self {
        Self { time, value }
    }
}

/// How a lookup treats times outside the key range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde-support",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum KeyBoundary {
    /// Times before the second key, or at/after the last key, blend
    /// between keys 0 and 1 with an extrapolated factor.
    #[default]
    Wrap,
    /// Hold the first value before the first key and the last value at or
    /// after the last key.
    Clamp,
}

/// Track-level failures, without joint context
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum TrackError {
    #[error("track has no keyframes")]
    Empty,

    #[error("keyframe {index} is earlier than its predecessor")]
    Unordered { index: usize },

    #[error("key {index} and its successor share a timestamp (lookup time {time})")]
    ZeroDurationInterval { index: usize, time: f64 },
}

impl TrackError {
    /// Attach the joint and track kind the failure belongs to
    pub fn in_track(self, joint: &str, track: TrackKind) -> BakeError {
        let joint = joint.to_string();
        match self {
            Self::Empty => BakeError::EmptyKeyframeTrack { joint, track },
            Self::Unordered { index } => BakeError::UnorderedKeyframes {
                joint,
                track,
                index,
            },
            Self::ZeroDurationInterval { index, time } => {
                BakeError::ZeroDurationKeyframeInterval {
                    joint,
                    track,
                    index,
                    time,
                }
            }
        }
    }
}

/// Time-ordered keyframes for one animated quantity
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde-support",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct KeyframeTrack<T> {
    keys: Vec<Keyframe<T>>,
}

impl<T: Interpolate> KeyframeTrack<T> {
    /// Build a track, checking it is non-empty and time-ordered
    pub fn new(keys: Vec<Keyframe<T>>) -> Result<Self, TrackError> {
        if keys.is_empty() {
            return Err(TrackError::Empty);
        }
        if let Some(index) = keys
            .windows(2)
            .position(|pair| pair[1].time < pair[0].time)
        {
            return Err(TrackError::Unordered { index: index + 1 });
        }
        Ok(Self { keys })
    }

    /// A track holding one value for all time
    pub fn constant(value: T) -> Self {
        Self {
            keys: vec![Keyframe::new(0.0, value)],
        }
    }

    /// Build a track from parallel time and value arrays
    ///
    /// Extra entries in the longer array are dropped.
    pub fn from_samples(
        times: impl IntoIterator<Item = f64>,
        values: impl IntoIterator<Item = T>,
    ) -> Result<Self, TrackError> {
        let keys = times
            .into_iter()
            .zip(values)
            .map(|(time, value)| Keyframe::new(time, value))
            .collect();
        Self::new(keys)
    }

    pub fn keys(&self) -> &[Keyframe<T>] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Time of the last key, or 0 for an empty track
    pub fn end_time(&self) -> f64 {
        self.keys.last().map_or(0.0, |key| key.time)
    }

    /// Index of the earlier key in the bracketing pair for `time`
    ///
    /// This is the smallest `i` with `time < keys[i + 1].time`. When no key
    /// after the first lies beyond `time`, the lookup falls back to 0.
    pub fn find_key_index(&self, time: f64) -> usize {
        self.keys
            .windows(2)
            .position(|pair| time < pair[1].time)
            .unwrap_or(0)
    }

    /// Interpolated value at `time`
    pub fn value_at(&self, time: f64, boundary: KeyBoundary) -> Result<T, TrackError> {
        let (first, last) = match self.keys.as_slice() {
            [] => return Err(TrackError::Empty),
            [only] => return Ok(only.value),
            [first, .., last] => (first, last),
        };

        if boundary == KeyBoundary::Clamp {
            if time <= first.time {
                return Ok(first.value);
            }
            if time >= last.time {
                return Ok(last.value);
            }
        }

        let index = self.find_key_index(time);
        let next = (index + 1) % self.keys.len();
        let current = &self.keys[index];
        let following = &self.keys[next];

        let span = following.time - current.time;
        if span == 0.0 {
            return Err(TrackError::ZeroDurationInterval { index, time });
        }

        let factor = ((time - current.time) / span) as f32;
        Ok(current.value.interpolate(&following.value, factor))
    }
}
