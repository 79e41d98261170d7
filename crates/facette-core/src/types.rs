use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// A detected anatomical point: pixel coordinates in the normalized image
/// space plus relative depth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Ordered set of facial landmarks, indexed positionally by the MediaPipe
/// face-mesh scheme. Immutable for the duration of one analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LandmarkSet {
    pub points: Vec<Landmark>,
}

impl LandmarkSet {
    pub fn new(points: Vec<Landmark>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Landmark at a mesh index. Callers validate the set size up front.
    pub fn point(&self, index: usize) -> Landmark {
        self.points[index]
    }
}

#[derive(Error, Debug)]
pub enum LandmarkError {
    #[error("no face detected")]
    NoFaceDetected,
    #[error("invalid image: {0}")]
    InvalidImage(String),
}

/// Contract for the external landmark-detection collaborator.
///
/// Exactly one such contract exists; implementations differ only in the
/// underlying mesh model.
pub trait LandmarkProvider {
    fn detect(&self, image: &[u8]) -> Result<LandmarkSet, LandmarkError>;
}

/// Scale-invariant geometric measurements keyed by metric name.
///
/// Every value is a pixel distance or angle normalized by face width or
/// face height, so downstream classification never sees raw pixels.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricProfile {
    pub values: BTreeMap<String, f64>,
}

impl MetricProfile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, value: f64) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }
}

/// Facial-index classification of the overall face outline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceShape {
    pub primary: String,
    pub secondary: Option<String>,
    pub ratio: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceSymmetry {
    pub level: String,
    pub eye_alignment: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoseMetrics {
    pub width_ratio: f64,
    pub length_ratio: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Nose {
    pub width: String,
    pub length: String,
    pub tip: String,
    pub metrics: NoseMetrics,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EyeMetrics {
    pub eye_ratio: f64,
    pub inter_eye_distance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Eyes {
    pub shape: String,
    pub orientation: String,
    pub spacing: String,
    pub metrics: EyeMetrics,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LipMetrics {
    pub fullness_ratio: f64,
    pub ul_lr_ratio: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lips {
    pub fullness: String,
    pub secondary: Option<String>,
    pub balance: String,
    pub contour: String,
    pub metrics: LipMetrics,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Eyebrows {
    pub arch: String,
    pub thickness: String,
    pub angle: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JawChinMetrics {
    pub jaw_width_ratio: f64,
    pub chin_projection: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JawChin {
    pub jaw: String,
    pub chin_shape: String,
    pub metrics: JawChinMetrics,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheekboneMetrics {
    pub prominence: f64,
    pub height_ratio: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cheekbones {
    pub prominence: String,
    pub height: String,
    pub definition: String,
    pub metrics: CheekboneMetrics,
}

/// Categorical facial-feature profile, one record per feature group.
///
/// Produced once per analysis, immutable thereafter. Serializes as the
/// nested document consumed by the output boundary and the query builder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureProfile {
    pub face_shape: FaceShape,
    pub face_symmetry: FaceSymmetry,
    pub nose: Nose,
    pub eyes: Eyes,
    pub lips: Lips,
    pub eyebrows: Eyebrows,
    pub jaw_chin: JawChin,
    pub cheekbones: Cheekbones,
}

/// One retrieval query derived from a classified feature/variant pair.
///
/// `variant` is normalized (lowercase, whitespace as underscores) for
/// metadata matching; `query` keeps the human phrasing for embedding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalIntent {
    pub feature: String,
    pub variant: String,
    pub query: String,
}

/// A retrieved step-by-step technique bound to a feature/variant.
///
/// Steps are ground truth: the generation stage must never alter,
/// reorder, or invent them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechniqueRecord {
    pub feature: String,
    pub variant: String,
    pub technique: String,
    pub steps: Vec<String>,
    pub distance: f32,
}

/// Final unit returned to the boundary: a technique plus grounded
/// explanation and caution text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub feature: String,
    pub variant: String,
    pub technique: String,
    pub steps: Vec<String>,
    pub why_it_matches: String,
    pub awareness: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landmark_set_accessors() {
        let set = LandmarkSet::new(vec![
            Landmark::new(1.0, 2.0, 0.0),
            Landmark::new(3.0, 4.0, -0.1),
        ]);
        assert_eq!(set.len(), 2);
        assert!(!set.is_empty());
        assert_eq!(set.point(1).x, 3.0);
    }

    #[test]
    fn test_metric_profile_roundtrip() {
        let mut metrics = MetricProfile::new();
        metrics.insert("face_ratio", 0.92);
        assert_eq!(metrics.get("face_ratio"), Some(0.92));
        assert_eq!(metrics.get("missing"), None);
    }

    #[test]
    fn test_feature_profile_serializes_nested() {
        let profile = FeatureProfile {
            face_shape: FaceShape {
                primary: "oval".into(),
                secondary: Some("round".into()),
                ratio: 0.92,
            },
            face_symmetry: FaceSymmetry {
                level: "high".into(),
                eye_alignment: 0.01,
            },
            nose: Nose {
                width: "narrow".into(),
                length: "short".into(),
                tip: "rounded".into(),
                metrics: NoseMetrics {
                    width_ratio: 0.12,
                    length_ratio: 0.25,
                },
            },
            eyes: Eyes {
                shape: "almond".into(),
                orientation: "balanced".into(),
                spacing: "balanced".into(),
                metrics: EyeMetrics {
                    eye_ratio: 0.7,
                    inter_eye_distance: 0.34,
                },
            },
            lips: Lips {
                fullness: "medium".into(),
                secondary: None,
                balance: "balanced".into(),
                contour: "natural".into(),
                metrics: LipMetrics {
                    fullness_ratio: 0.06,
                    ul_lr_ratio: 1.0,
                },
            },
            eyebrows: Eyebrows {
                arch: "soft arch".into(),
                thickness: "natural".into(),
                angle: 8.0,
            },
            jaw_chin: JawChin {
                jaw: "balanced".into(),
                chin_shape: "prominent".into(),
                metrics: JawChinMetrics {
                    jaw_width_ratio: 0.4,
                    chin_projection: 0.9,
                },
            },
            cheekbones: Cheekbones {
                prominence: "moderate".into(),
                height: "balanced".into(),
                definition: "natural".into(),
                metrics: CheekboneMetrics {
                    prominence: 0.9,
                    height_ratio: 0.15,
                },
            },
        };

        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["face_shape"]["primary"], "oval");
        assert_eq!(json["nose"]["metrics"]["width_ratio"], 0.12);
        assert!(json["lips"]["secondary"].is_null());
    }
}
