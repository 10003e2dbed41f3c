//! Palm template construction: pairwise knuckle distances, scale
//! normalization and signature derivation.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{PalmError, Result};
use crate::landmarks::{pair_key, HandLandmarks, Knuckle, REFERENCE_PAIR};

/// Minimum detector confidence required on every knuckle point.
pub const MIN_KNUCKLE_CONFIDENCE: f64 = 0.5;

/// Number of hex characters kept from the SHA-256 digest.
pub const SIGNATURE_LEN: usize = 16;

/// Mapping from canonical unordered-pair keys to non-negative scalars.
///
/// Built from the 5 knuckle points this always holds exactly C(5,2) = 10
/// entries. The ordered map keeps keys sorted, which makes signature
/// derivation independent of insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DistanceVector(BTreeMap<String, f64>);

impl DistanceVector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: String, value: f64) {
        self.0.insert(key, value);
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.0.get(key).copied()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl FromIterator<(String, f64)> for DistanceVector {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// The ephemeral output of template building for one detection.
///
/// Created transiently for every detection; promoted to a
/// [`Registration`](crate::store::Registration) only on explicit
/// registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    /// 16-hex-char digest of the normalized distances. Used for quick
    /// equality and display; matching itself uses distances, not signatures.
    pub signature: String,
    /// Pairwise knuckle distances in pixel units.
    pub raw_distances: DistanceVector,
    /// Raw distances scaled by the wrist-to-middle-knuckle reference.
    pub normalized_distances: DistanceVector,
    /// Optional snapshot of the landmarks the template was built from.
    pub landmarks: Option<HandLandmarks>,
    pub created_at: DateTime<Utc>,
}

/// Builder turning a hand detection into a [`Template`].
///
/// Pure function of the landmarks; no side effects.
pub struct TemplateBuilder {
    landmarks: HandLandmarks,
    retain_landmarks: bool,
}

impl TemplateBuilder {
    pub fn new(landmarks: HandLandmarks) -> Self {
        Self {
            landmarks,
            retain_landmarks: false,
        }
    }

    /// Keep the raw landmark snapshot on the built template.
    pub fn retain_landmarks(mut self, retain: bool) -> Self {
        self.retain_landmarks = retain;
        self
    }

    pub fn build(self) -> Result<Template> {
        self.check_knuckle_confidence()?;

        let raw_distances = knuckle_distances(&self.landmarks);
        let normalized_distances = normalize_distances(&raw_distances)?;
        let signature = derive_signature(&normalized_distances);

        debug!(
            signature = %signature,
            measurements = raw_distances.len(),
            "Built palm template"
        );

        Ok(Template {
            signature,
            raw_distances,
            normalized_distances,
            landmarks: self.retain_landmarks.then_some(self.landmarks),
            created_at: Utc::now(),
        })
    }

    fn check_knuckle_confidence(&self) -> Result<()> {
        let lowest = Knuckle::ALL
            .iter()
            .map(|&k| self.landmarks.knuckle(k).confidence)
            .fold(f64::INFINITY, f64::min);

        if lowest < MIN_KNUCKLE_CONFIDENCE {
            return Err(PalmError::InsufficientConfidence {
                lowest,
                threshold: MIN_KNUCKLE_CONFIDENCE,
            });
        }
        Ok(())
    }
}

/// Euclidean distance for every unordered knuckle pair, canonically keyed.
fn knuckle_distances(landmarks: &HandLandmarks) -> DistanceVector {
    let mut distances = DistanceVector::new();
    for (i, &a) in Knuckle::ALL.iter().enumerate() {
        for &b in &Knuckle::ALL[i + 1..] {
            let d = landmarks.knuckle(a).distance_to(&landmarks.knuckle(b));
            distances.insert(pair_key(a, b), d);
        }
    }
    distances
}

/// Scale every entry by the reference pair so templates are size-invariant.
///
/// A missing reference fails explicitly rather than silently picking an
/// unrelated pair as the scale anchor.
pub(crate) fn normalize_distances(raw: &DistanceVector) -> Result<DistanceVector> {
    let reference = raw
        .get(REFERENCE_PAIR)
        .ok_or(PalmError::MissingReference(REFERENCE_PAIR))?;

    Ok(raw.iter().map(|(k, v)| (k.to_string(), v / reference)).collect())
}

/// Derive the signature: entries sorted by key, rendered as `key:value` with
/// 6 decimal digits, joined by `|`, SHA-256 hashed, first 16 hex chars kept.
pub(crate) fn derive_signature(normalized: &DistanceVector) -> String {
    let rendered = normalized
        .iter()
        .map(|(k, v)| format!("{k}:{v:.6}"))
        .collect::<Vec<_>>()
        .join("|");

    let digest = Sha256::digest(rendered.as_bytes());
    hex::encode(digest)[..SIGNATURE_LEN].to_string()
}
