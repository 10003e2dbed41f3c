//! Mock keypoint provider for testing.

use std::path::Path;

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use super::{DetectorSource, KeypointProvider};
use crate::error::Result;
use crate::landmarks::{HandLandmarks, Landmark, LANDMARK_COUNT};

/// Base hand geometry in a 640x480 frame: wrist at the bottom, the four
/// finger knuckles fanned above it, remaining landmarks spread along the
/// fingers.
const BASE_HAND: [(f64, f64); LANDMARK_COUNT] = [
    (320.0, 420.0), // 0  wrist
    (270.0, 390.0),
    (240.0, 350.0),
    (225.0, 310.0),
    (215.0, 275.0),
    (260.0, 260.0), // 5  index knuckle
    (255.0, 215.0),
    (252.0, 180.0),
    (250.0, 150.0),
    (305.0, 245.0), // 9  middle knuckle
    (305.0, 195.0),
    (305.0, 155.0),
    (305.0, 120.0),
    (345.0, 255.0), // 13 ring knuckle
    (350.0, 205.0),
    (352.0, 170.0),
    (354.0, 140.0),
    (385.0, 280.0), // 17 pinky knuckle
    (395.0, 240.0),
    (400.0, 210.0),
    (405.0, 185.0),
];

/// Mock keypoint provider for testing.
/// WARNING: Do not use in production - returns a synthetic hand, not a
/// detection of the supplied image!
pub struct MockKeypointProvider {
    seed: u64,
    fixed: Option<HandLandmarks>,
}

impl MockKeypointProvider {
    /// Deterministic synthetic hand derived from `seed`: the same seed
    /// always yields the same landmarks, different seeds yield different
    /// hands.
    pub fn new(seed: u64) -> Self {
        Self { seed, fixed: None }
    }

    /// Always return exactly these landmarks.
    pub fn from_landmarks(landmarks: HandLandmarks) -> Self {
        Self {
            seed: 0,
            fixed: Some(landmarks),
        }
    }

    /// Create a mock with a default seed for simple tests.
    pub fn default_test() -> Self {
        Self::new(0xDEAD_BEEF)
    }

    fn synthesize(&self) -> HandLandmarks {
        let mut points = [Landmark::new(0.0, 0.0, 0.0); LANDMARK_COUNT];
        for (i, &(bx, by)) in BASE_HAND.iter().enumerate() {
            let (jx, jy) = self.jitter(i as u64);
            points[i] = Landmark::new(bx + jx, by + jy, 0.9 + 0.005 * (i % 10) as f64);
        }
        HandLandmarks::new(points)
    }

    /// Deterministic per-point jitter in [-4, 4) pixels, hashed from the
    /// seed and landmark index.
    fn jitter(&self, index: u64) -> (f64, f64) {
        let mut hasher = Sha256::new();
        hasher.update(self.seed.to_le_bytes());
        hasher.update(index.to_le_bytes());
        hasher.update(b"palmkey-mock-landmarks");
        let digest = hasher.finalize();

        let dx = (digest[0] as f64 / 255.0) * 8.0 - 4.0;
        let dy = (digest[1] as f64 / 255.0) * 8.0 - 4.0;
        (dx, dy)
    }
}

impl Default for MockKeypointProvider {
    fn default() -> Self {
        Self::default_test()
    }
}

#[async_trait]
impl KeypointProvider for MockKeypointProvider {
    async fn detect(&self, _image: &Path) -> Result<HandLandmarks> {
        match &self.fixed {
            Some(landmarks) => Ok(landmarks.clone()),
            None => Ok(self.synthesize()),
        }
    }

    fn source_id(&self) -> DetectorSource {
        DetectorSource::Mock
    }
}
