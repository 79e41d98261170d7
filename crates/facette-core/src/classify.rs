//! Classification engine: metric profile → categorical feature profile.
//!
//! One threshold cascade per feature group, each appending a fixed-template
//! sentence to the narrative. Narrative section order is a contract
//! (face shape, symmetry, nose, eyes, lips, eyebrows, jaw/chin,
//! cheekbones) because consumers may display it verbatim.

use crate::cascade::Cascade;
use crate::types::{
    CheekboneMetrics, Cheekbones, EyeMetrics, Eyebrows, Eyes, FaceShape, FaceSymmetry,
    FeatureProfile, JawChin, JawChinMetrics, LipMetrics, Lips, MetricProfile, Nose, NoseMetrics,
};
use thiserror::Error;

// --- Cascade boundaries per feature group ---
const FACE_SHAPE: Cascade<'static> = Cascade::new(
    &[(0.85, "broad"), (0.90, "round"), (0.95, "oval"), (1.00, "long")],
    "very long",
);
const SYMMETRY: Cascade<'static> = Cascade::new(&[(0.015, "high"), (0.03, "moderate")], "noticeable asymmetry");
const NOSE_WIDTH: Cascade<'static> = Cascade::new(&[(0.14, "narrow"), (0.18, "average")], "wide");
const NOSE_LENGTH: Cascade<'static> = Cascade::new(&[(0.28, "short"), (0.36, "average")], "long");
const EYE_SPACING: Cascade<'static> = Cascade::new(&[(0.32, "close-set"), (0.36, "balanced")], "wide-set");
const LIP_FULLNESS: Cascade<'static> = Cascade::new(&[(0.05, "thin"), (0.08, "medium")], "full");
const BROW_ARCH: Cascade<'static> = Cascade::new(&[(5.0, "straight"), (15.0, "soft arch")], "defined arch");
const JAW_WIDTH: Cascade<'static> = Cascade::new(&[(0.35, "narrow"), (0.45, "balanced")], "wide");
const CHIN_PROJECTION: Cascade<'static> = Cascade::new(&[(0.03, "pointed"), (0.05, "balanced")], "prominent");
const CHEEK_PROMINENCE: Cascade<'static> = Cascade::new(&[(0.8, "subtle"), (1.0, "moderate")], "prominent");
const CHEEK_HEIGHT: Cascade<'static> = Cascade::new(&[(0.1, "low-set"), (0.2, "balanced")], "high-set");

// Eye shape and orientation use lower bounds / absolute differences rather
// than upper-bound brackets, so they stay as explicit comparisons.
const EYE_ROUND_MIN: f64 = 0.8;
const EYE_ALMOND_MIN: f64 = 0.6;
const EYE_ASYMMETRY_MIN: f64 = 0.02;
const LIP_UPPER_DOMINANT_MIN: f64 = 1.05;
const LIP_LOWER_DOMINANT_MAX: f64 = 0.95;

#[derive(Error, Debug)]
pub enum ClassifyError {
    #[error("metric profile is missing required key: {0}")]
    MissingMetric(String),
}

fn require(metrics: &MetricProfile, key: &str) -> Result<f64, ClassifyError> {
    metrics
        .get(key)
        .ok_or_else(|| ClassifyError::MissingMetric(key.to_string()))
}

/// Classify a metric profile into a feature profile plus its narrative.
///
/// Fails atomically on any missing metric key — no partial profile is
/// ever produced.
pub fn classify(metrics: &MetricProfile) -> Result<(FeatureProfile, String), ClassifyError> {
    let mut narrative = Vec::new();

    // --- Face shape (facial index) ---
    let ratio = require(metrics, "face_ratio")?;
    let primary = FACE_SHAPE.select(ratio);
    let secondary = match primary {
        "oval" => Some("round"),
        "long" => Some("oval"),
        "very long" => Some("long"),
        _ => None,
    };
    let face_shape = FaceShape {
        primary: primary.to_string(),
        secondary: secondary.map(str::to_string),
        ratio,
    };
    let mut line = format!("Your face shape is {primary}");
    if let Some(sec) = secondary {
        line.push_str(&format!(" with subtle {sec} influence"));
    }
    line.push('.');
    narrative.push(line);

    // --- Symmetry ---
    let alignment = require(metrics, "eye_symmetry")?;
    let level = SYMMETRY.select(alignment);
    let face_symmetry = FaceSymmetry {
        level: level.to_string(),
        eye_alignment: alignment,
    };
    narrative.push(format!("Your facial symmetry is {level}."));

    // --- Nose (width and length cascades combined into a tip shape) ---
    let width_ratio = require(metrics, "nose_width")?;
    let length_ratio = require(metrics, "nose_length")?;
    let nose_width = NOSE_WIDTH.select(width_ratio);
    let nose_length = NOSE_LENGTH.select(length_ratio);
    let nose_tip = if nose_length == "short" && nose_width == "narrow" {
        "rounded"
    } else if nose_width == "wide" {
        "soft curve"
    } else {
        "defined"
    };
    let nose = Nose {
        width: nose_width.to_string(),
        length: nose_length.to_string(),
        tip: nose_tip.to_string(),
        metrics: NoseMetrics {
            width_ratio,
            length_ratio,
        },
    };
    narrative.push(format!(
        "Your nose is {nose_width} in width, {nose_length} in length, with a {nose_tip} tip."
    ));

    // --- Eyes ---
    let left_height = require(metrics, "left_eye_height")?;
    let right_height = require(metrics, "right_eye_height")?;
    let left_width = require(metrics, "left_eye_width")?;
    let right_width = require(metrics, "right_eye_width")?;
    let eye_ratio = (left_height + right_height) / (left_width + right_width);
    let eye_shape = if eye_ratio > EYE_ROUND_MIN {
        "round"
    } else if eye_ratio > EYE_ALMOND_MIN {
        "almond"
    } else {
        "hooded"
    };
    let orientation = if (left_height - right_height).abs() > EYE_ASYMMETRY_MIN {
        "asymmetric"
    } else {
        "balanced"
    };
    let inter_eye = require(metrics, "inter_eye_distance")?;
    let spacing = EYE_SPACING.select(inter_eye);
    let eyes = Eyes {
        shape: eye_shape.to_string(),
        orientation: orientation.to_string(),
        spacing: spacing.to_string(),
        metrics: EyeMetrics {
            eye_ratio,
            inter_eye_distance: inter_eye,
        },
    };
    narrative.push(format!(
        "Your eyes are {eye_shape}, {orientation}, and {spacing}."
    ));

    // --- Lips ---
    let upper = require(metrics, "upper_lip_height")?;
    let lower = require(metrics, "lower_lip_height")?;
    let fullness_ratio = upper + lower;
    let fullness = LIP_FULLNESS.select(fullness_ratio);
    // Secondary label marks proximity to the adjacent bracket boundary.
    let lip_secondary = match fullness {
        "thin" if fullness_ratio > 0.045 => Some("medium"),
        "medium" if fullness_ratio < 0.055 => Some("thin"),
        "medium" => Some("full"),
        "full" if fullness_ratio < 0.09 => Some("medium"),
        _ => None,
    };
    let ul_lr_ratio = if lower != 0.0 { upper / lower } else { 1.0 };
    let balance = if ul_lr_ratio > LIP_UPPER_DOMINANT_MIN {
        "upper-dominant"
    } else if ul_lr_ratio < LIP_LOWER_DOMINANT_MAX {
        "lower-dominant"
    } else {
        "balanced"
    };
    let contour = if fullness == "full" && balance == "balanced" {
        "pouty"
    } else if fullness == "medium" && balance == "upper-dominant" {
        "bow-shaped"
    } else {
        "natural"
    };
    let lips = Lips {
        fullness: fullness.to_string(),
        secondary: lip_secondary.map(str::to_string),
        balance: balance.to_string(),
        contour: contour.to_string(),
        metrics: LipMetrics {
            fullness_ratio,
            ul_lr_ratio,
        },
    };
    let mut lip_line = format!("Your lips are {fullness}");
    if let Some(sec) = lip_secondary {
        lip_line.push_str(&format!(" with mild {sec} influence"));
    }
    lip_line.push_str(&format!(", {balance}, with a {contour} contour."));
    narrative.push(lip_line);

    // --- Eyebrows ---
    let angle =
        (require(metrics, "left_brow_angle")? + require(metrics, "right_brow_angle")?) / 2.0;
    let arch = BROW_ARCH.select(angle);
    let eyebrows = Eyebrows {
        arch: arch.to_string(),
        thickness: "natural".to_string(),
        angle,
    };
    narrative.push(format!("Your eyebrows are {arch} with natural thickness."));

    // --- Jaw & chin (independent cascades) ---
    let jaw_width_ratio = require(metrics, "jaw_width")?;
    let chin_projection = require(metrics, "chin_projection")?;
    let jaw = JAW_WIDTH.select(jaw_width_ratio);
    let chin_shape = CHIN_PROJECTION.select(chin_projection);
    let jaw_chin = JawChin {
        jaw: jaw.to_string(),
        chin_shape: chin_shape.to_string(),
        metrics: JawChinMetrics {
            jaw_width_ratio,
            chin_projection,
        },
    };
    narrative.push(format!("Your jaw is {jaw} and your chin is {chin_shape}."));

    // --- Cheekbones (independent cascades) ---
    let prominence = require(metrics, "cheekbone_prominence")?;
    let height_ratio = require(metrics, "cheekbone_height")?;
    let prominence_label = CHEEK_PROMINENCE.select(prominence);
    let height_label = CHEEK_HEIGHT.select(height_ratio);
    let cheekbones = Cheekbones {
        prominence: prominence_label.to_string(),
        height: height_label.to_string(),
        definition: "natural".to_string(),
        metrics: CheekboneMetrics {
            prominence,
            height_ratio,
        },
    };
    narrative.push(format!(
        "Your cheekbones are {prominence_label} and {height_label}, giving your face well-structured contours."
    ));

    let profile = FeatureProfile {
        face_shape,
        face_symmetry,
        nose,
        eyes,
        lips,
        eyebrows,
        jaw_chin,
        cheekbones,
    };

    tracing::debug!(
        face_shape = %profile.face_shape.primary,
        symmetry = %profile.face_symmetry.level,
        "classified feature profile"
    );

    Ok((profile, narrative.join("\n")))
}
