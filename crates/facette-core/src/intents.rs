//! Query builder: classified profile → deduplicated retrieval intents.
//!
//! Intent order mirrors the classification group order; symmetry carries
//! no technique variant and yields no intent. Duplicate (feature,
//! variant) pairs are expected when labels repeat and are dropped
//! silently.

use crate::types::{FeatureProfile, RetrievalIntent};
use std::collections::HashSet;

/// Normalize a variant label for metadata matching: trim, lowercase,
/// whitespace to underscores.
pub fn normalize(text: &str) -> String {
    text.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// Derive the ordered, deduplicated retrieval intents for a profile.
///
/// Deterministic and order-stable: the same profile always produces the
/// identical sequence.
pub fn build_intents(profile: &FeatureProfile) -> Vec<RetrievalIntent> {
    let candidates = [
        (
            "face_shape",
            profile.face_shape.primary.as_str(),
            format!("{} face makeup technique", profile.face_shape.primary),
        ),
        (
            "nose",
            profile.nose.tip.as_str(),
            format!("{} nose contour technique", profile.nose.tip),
        ),
        (
            "eyes",
            profile.eyes.shape.as_str(),
            format!("{} eyes makeup technique", profile.eyes.shape),
        ),
        (
            "lips",
            profile.lips.fullness.as_str(),
            format!("{} lips makeup technique", profile.lips.fullness),
        ),
        (
            "brows",
            profile.eyebrows.arch.as_str(),
            format!("{} eyebrow shaping", profile.eyebrows.arch),
        ),
        (
            "jawline",
            profile.jaw_chin.jaw.as_str(),
            format!("{} jawline contour technique", profile.jaw_chin.jaw),
        ),
        (
            "chin",
            profile.jaw_chin.chin_shape.as_str(),
            format!("{} chin contour technique", profile.jaw_chin.chin_shape),
        ),
        (
            "cheekbones",
            profile.cheekbones.prominence.as_str(),
            format!("{} cheekbone makeup technique", profile.cheekbones.prominence),
        ),
    ];

    let mut seen = HashSet::new();
    let mut intents = Vec::new();
    for (feature, label, query) in candidates {
        if label.is_empty() {
            continue;
        }
        let variant = normalize(label);
        if !seen.insert((feature, variant.clone())) {
            continue;
        }
        intents.push(RetrievalIntent {
            feature: feature.to_string(),
            variant,
            query,
        });
    }
    intents
}
