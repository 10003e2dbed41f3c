//! Shared fixtures for unit tests.

use chrono::Utc;

use crate::landmarks::{HandLandmarks, Landmark, LANDMARK_COUNT};
use crate::store::Registration;
use crate::template::DistanceVector;

/// A plausible right-hand detection in a 640x480 frame. Knuckle indices
/// (0, 5, 9, 13, 17) get distinct positions; the rest sit near the palm
/// center.
pub(crate) fn sample_landmarks() -> HandLandmarks {
    let mut points = [Landmark::new(300.0, 300.0, 0.9); LANDMARK_COUNT];
    points[0] = Landmark::new(320.0, 420.0, 0.98); // wrist
    points[5] = Landmark::new(260.0, 260.0, 0.95); // index knuckle
    points[9] = Landmark::new(305.0, 245.0, 0.96); // middle knuckle
    points[13] = Landmark::new(345.0, 255.0, 0.94); // ring knuckle
    points[17] = Landmark::new(385.0, 280.0, 0.93); // pinky knuckle
    HandLandmarks::new(points)
}

/// A registration with the given normalized distances and placeholder
/// metadata.
pub(crate) fn registration_with_distances(
    identity: &str,
    normalized: DistanceVector,
) -> Registration {
    let now = Utc::now();
    Registration {
        identity: identity.to_string(),
        signature: "0123456789abcdef".to_string(),
        normalized_distances: normalized,
        raw_distances: DistanceVector::new(),
        registered_at: now,
        last_used: now,
    }
}
