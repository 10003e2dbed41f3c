//! Hand landmark geometry: the 21-point detection contract and the fixed
//! 5-knuckle subset used as the biometric basis.

use serde::{Deserialize, Serialize};

use crate::error::{PalmError, Result};

/// Number of landmarks a keypoint detector must return for a visible hand.
pub const LANDMARK_COUNT: usize = 21;

/// A single detected hand landmark in image-coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    /// Detector confidence in [0, 1].
    pub confidence: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64, confidence: f64) -> Self {
        Self { x, y, confidence }
    }

    /// Euclidean distance to another landmark, in pixels.
    pub fn distance_to(&self, other: &Landmark) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// A complete 21-point hand detection.
///
/// Produced only by a [`KeypointProvider`](crate::detector::KeypointProvider);
/// the core never post-processes raw pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandLandmarks {
    points: [Landmark; LANDMARK_COUNT],
}

impl HandLandmarks {
    pub fn new(points: [Landmark; LANDMARK_COUNT]) -> Self {
        Self { points }
    }

    /// Build from a detector's point sequence, rejecting anything that is not
    /// exactly 21 points.
    pub fn from_points(points: Vec<Landmark>) -> Result<Self> {
        let len = points.len();
        let points: [Landmark; LANDMARK_COUNT] = points.try_into().map_err(|_| {
            PalmError::Serialization(format!(
                "Expected {LANDMARK_COUNT} landmarks, got {len}"
            ))
        })?;
        Ok(Self { points })
    }

    pub fn point(&self, index: usize) -> Landmark {
        self.points[index]
    }

    /// The landmark for a named knuckle point.
    pub fn knuckle(&self, knuckle: Knuckle) -> Landmark {
        self.points[knuckle.landmark_index()]
    }

    pub fn points(&self) -> &[Landmark; LANDMARK_COUNT] {
        &self.points
    }
}

/// The 5 fixed landmark indices used as the biometric basis.
///
/// These indices follow the MediaPipe hand-landmark layout and are a fixed
/// constant of the scheme, never learned or configured at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Knuckle {
    Wrist,
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Knuckle {
    pub const ALL: [Knuckle; 5] = [
        Knuckle::Wrist,
        Knuckle::Index,
        Knuckle::Middle,
        Knuckle::Ring,
        Knuckle::Pinky,
    ];

    /// Position of this knuckle in the 21-point landmark array.
    pub fn landmark_index(self) -> usize {
        match self {
            Knuckle::Wrist => 0,
            Knuckle::Index => 5,
            Knuckle::Middle => 9,
            Knuckle::Ring => 13,
            Knuckle::Pinky => 17,
        }
    }

    /// Stable name used in distance-vector keys and persisted records.
    pub fn name(self) -> &'static str {
        match self {
            Knuckle::Wrist => "wrist",
            Knuckle::Index => "index_knuckle",
            Knuckle::Middle => "middle_knuckle",
            Knuckle::Ring => "ring_knuckle",
            Knuckle::Pinky => "pinky_knuckle",
        }
    }
}

impl std::fmt::Display for Knuckle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Canonical key for an unordered knuckle pair: the two names joined by `_`
/// in lexical order, so `(a, b)` and `(b, a)` always produce the same key.
pub fn pair_key(a: Knuckle, b: Knuckle) -> String {
    let (first, second) = if a.name() <= b.name() {
        (a.name(), b.name())
    } else {
        (b.name(), a.name())
    };
    format!("{first}_{second}")
}

/// The pair whose raw distance anchors normalization.
pub const REFERENCE_PAIR: &str = "middle_knuckle_wrist";
