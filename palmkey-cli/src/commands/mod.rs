//! Command implementations.

pub mod delete;
pub mod list;
pub mod recognize;
pub mod register;

use palmkey_core::PalmError;

/// Map an expected domain error to the message its envelope should carry.
///
/// Returns `None` for internal faults (storage, serialization, transport),
/// which bubble to the outermost boundary and exit 1.
pub fn domain_failure_message(err: &PalmError) -> Option<String> {
    match err {
        PalmError::DetectorUnavailable(reason) => {
            Some(format!("Palm detector not available: {reason}"))
        }
        PalmError::NoHandDetected | PalmError::InsufficientConfidence { .. } => Some(
            "Failed to detect hand keypoints in image. Please ensure your palm is clearly visible."
                .to_string(),
        ),
        PalmError::DetectionTimeout(timeout) => {
            Some(format!("Keypoint detection timed out after {timeout:?}"))
        }
        PalmError::AlreadyRegistered(_) => Some(
            "Palm already registered for this identity. Please delete the existing registration first."
                .to_string(),
        ),
        PalmError::NotRegistered(identity) => {
            Some(format!("No palm registered for {identity}"))
        }
        PalmError::InvalidIdentity { .. }
        | PalmError::MissingReference(_)
        | PalmError::NoCommonMeasurements => Some(err.to_string()),
        _ => None,
    }
}
