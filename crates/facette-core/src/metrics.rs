//! Metric engine: landmark coordinates → scale-invariant geometric ratios.
//!
//! Face extents come from the full coordinate set; every other metric is a
//! pixel distance or angle normalized by face width or face height, so the
//! downstream cascades never see raw pixels.

use crate::types::{LandmarkSet, MetricProfile};
use thiserror::Error;

// --- MediaPipe face-mesh anatomical indices ---
const LEFT_EYE_CENTER: usize = 33;
const RIGHT_EYE_CENTER: usize = 263;
const LEFT_EYE_INNER: usize = 133;
const LEFT_EYE_OUTER: usize = 173;
const LEFT_EYE_TOP: usize = 159;
const LEFT_EYE_BOTTOM: usize = 145;
const RIGHT_EYE_INNER: usize = 362;
const RIGHT_EYE_TOP: usize = 386;
const RIGHT_EYE_BOTTOM: usize = 374;
const NOSE_TIP: usize = 1;
const NOSE_BRIDGE: usize = 168;
const NOSE_LEFT_ALA: usize = 98;
const NOSE_RIGHT_ALA: usize = 327;
const UPPER_LIP: usize = 13;
const LOWER_LIP: usize = 14;
const LIP_LEFT_CORNER: usize = 61;
const LIP_RIGHT_CORNER: usize = 291;
const LEFT_BROW_INNER: usize = 105;
const LEFT_BROW_OUTER: usize = 65;
const RIGHT_BROW_INNER: usize = 334;
const RIGHT_BROW_OUTER: usize = 295;
const JAW_LEFT: usize = 234;
const JAW_RIGHT: usize = 454;
const CHIN: usize = 152;
const FOREHEAD_TOP: usize = 10;

/// Full MediaPipe face mesh; the highest index used above is 454.
const MIN_LANDMARKS: usize = 468;

#[derive(Error, Debug)]
pub enum GeometryError {
    #[error("landmark set is empty")]
    EmptyLandmarks,
    #[error("landmark set has {got} points, {required} required")]
    InsufficientLandmarks { required: usize, got: usize },
    #[error("degenerate face extents (zero width or height)")]
    DegenerateFace,
    #[error("image dimensions are zero")]
    EmptyImage,
}

/// Compute the normalized metric profile for one landmark set.
///
/// `dims` is the (height, width) of the space the landmarks were extracted
/// in. Pure: no side effects, deterministic for a given input.
pub fn compute_metrics(
    landmarks: &LandmarkSet,
    dims: (u32, u32),
) -> Result<MetricProfile, GeometryError> {
    if landmarks.is_empty() {
        return Err(GeometryError::EmptyLandmarks);
    }
    if landmarks.len() < MIN_LANDMARKS {
        return Err(GeometryError::InsufficientLandmarks {
            required: MIN_LANDMARKS,
            got: landmarks.len(),
        });
    }
    let (height, width) = dims;
    if height == 0 || width == 0 {
        return Err(GeometryError::EmptyImage);
    }

    // Face bounding extents over the full coordinate set
    let mut min_x = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for p in &landmarks.points {
        min_x = min_x.min(p.x);
        max_x = max_x.max(p.x);
        min_y = min_y.min(p.y);
        max_y = max_y.max(p.y);
    }
    let face_width = max_x - min_x;
    let face_height = max_y - min_y;
    if face_width <= 0.0 || face_height <= 0.0 {
        return Err(GeometryError::DegenerateFace);
    }

    tracing::debug!(
        face_width,
        face_height,
        image_height = height,
        image_width = width,
        "computing metric profile"
    );

    let mut metrics = MetricProfile::new();
    metrics.insert("face_width", face_width);
    metrics.insert("face_height", face_height);
    // Facial index used in anthropometry: height over width
    metrics.insert("face_ratio", face_height / face_width);

    // --- Eyes ---
    let left_eye = landmarks.point(LEFT_EYE_CENTER);
    let right_eye = landmarks.point(RIGHT_EYE_CENTER);
    metrics.insert(
        "inter_eye_distance",
        (right_eye.x - left_eye.x).abs() / face_width,
    );
    metrics.insert("eye_symmetry", (left_eye.y - right_eye.y).abs() / face_height);
    metrics.insert(
        "left_eye_width",
        (landmarks.point(LEFT_EYE_INNER).x - landmarks.point(LEFT_EYE_OUTER).x).abs() / face_width,
    );
    metrics.insert(
        "left_eye_height",
        (landmarks.point(LEFT_EYE_TOP).y - landmarks.point(LEFT_EYE_BOTTOM).y).abs() / face_height,
    );
    metrics.insert(
        "right_eye_width",
        (landmarks.point(RIGHT_EYE_INNER).x - landmarks.point(RIGHT_EYE_TOP).x).abs() / face_width,
    );
    metrics.insert(
        "right_eye_height",
        (landmarks.point(RIGHT_EYE_TOP).y - landmarks.point(RIGHT_EYE_BOTTOM).y).abs()
            / face_height,
    );

    // --- Nose ---
    let nose_tip = landmarks.point(NOSE_TIP);
    let nose_bridge = landmarks.point(NOSE_BRIDGE);
    metrics.insert(
        "nose_width",
        (landmarks.point(NOSE_RIGHT_ALA).x - landmarks.point(NOSE_LEFT_ALA).x).abs() / face_width,
    );
    metrics.insert("nose_length", (nose_tip.y - nose_bridge.y).abs() / face_height);

    // --- Lips ---
    let upper_lip = landmarks.point(UPPER_LIP);
    let lower_lip = landmarks.point(LOWER_LIP);
    metrics.insert(
        "upper_lip_height",
        (upper_lip.y - lower_lip.y).abs() / face_height,
    );
    metrics.insert(
        "lower_lip_height",
        (lower_lip.y - upper_lip.y).abs() / face_height,
    );
    metrics.insert(
        "lip_width",
        (landmarks.point(LIP_RIGHT_CORNER).x - landmarks.point(LIP_LEFT_CORNER).x).abs()
            / face_width,
    );

    // --- Eyebrows (slope angle in degrees, inner → outer) ---
    metrics.insert(
        "left_brow_angle",
        brow_angle_degrees(landmarks, LEFT_BROW_INNER, LEFT_BROW_OUTER),
    );
    metrics.insert(
        "right_brow_angle",
        brow_angle_degrees(landmarks, RIGHT_BROW_INNER, RIGHT_BROW_OUTER),
    );

    // --- Jaw & chin ---
    let chin = landmarks.point(CHIN);
    metrics.insert(
        "jaw_width",
        (landmarks.point(JAW_RIGHT).x - landmarks.point(JAW_LEFT).x).abs() / face_width,
    );
    metrics.insert("chin_projection", (chin.y - min_y) / face_height);

    // --- Cheekbones ---
    metrics.insert(
        "cheekbone_prominence",
        (landmarks.point(JAW_RIGHT).x - landmarks.point(JAW_LEFT).x).abs() / face_width,
    );
    metrics.insert(
        "cheekbone_height",
        (landmarks.point(FOREHEAD_TOP).y - chin.y).abs() / face_height,
    );

    Ok(metrics)
}

/// Arctangent of vertical-over-horizontal displacement between two named
/// brow points, in degrees.
fn brow_angle_degrees(landmarks: &LandmarkSet, inner: usize, outer: usize) -> f64 {
    let a = landmarks.point(inner);
    let b = landmarks.point(outer);
    (b.y - a.y).atan2(b.x - a.x).to_degrees()
}
