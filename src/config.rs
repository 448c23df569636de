use std::fs;
use std::path::{Path, PathBuf};

use imageproc::geometric_transformations::Interpolation;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};
use crate::face::LandmarkTopology;

/// Top level configuration of a [`crate::NormalisedFaceCropper`] and its
/// model backends. Every section falls back to its defaults, so a JSON file
/// only needs the values it changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CropperConfig {
    pub topology: LandmarkTopology,
    pub rotation: RotationConfig,
    pub detection: DetectionConfig,
    pub landmarks: LandmarkConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarpInterpolation {
    Nearest,
    Bilinear,
    Bicubic,
}

impl From<WarpInterpolation> for Interpolation {
    fn from(value: WarpInterpolation) -> Self {
        match value {
            WarpInterpolation::Nearest => Interpolation::Nearest,
            WarpInterpolation::Bilinear => Interpolation::Bilinear,
            WarpInterpolation::Bicubic => Interpolation::Bicubic,
        }
    }
}

/// How the face image is resampled when its roll is removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationConfig {
    pub interpolation: WarpInterpolation,
    /// Colour of pixels that have no source after rotation.
    pub fill: [u8; 3],
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            interpolation: WarpInterpolation::Bilinear,
            fill: [0, 0, 0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub model_path: PathBuf,
    pub min_score: f32,
    pub nms_iou_threshold: f32,
    pub intra_threads: i16,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/face_detection_back_256x256_float32_opt.onnx"),
            min_score: 0.5,
            nms_iou_threshold: 0.3,
            intra_threads: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LandmarkConfig {
    pub model_path: PathBuf,
    /// Minimum face presence probability for landmarks to be reported.
    pub min_presence: f32,
    pub intra_threads: i16,
}

impl Default for LandmarkConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/face_landmarks_detector.onnx"),
            min_presence: 0.5,
            intra_threads: 4,
        }
    }
}

impl CropperConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let config = Self::from_json(&content)?;
        info!("loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let config: CropperConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        self.topology.validate()?;

        if !(0.0..=1.0).contains(&self.detection.nms_iou_threshold) {
            return Err(Error::InvalidConfig(format!(
                "nms_iou_threshold must be within [0, 1], got {}",
                self.detection.nms_iou_threshold
            )));
        }

        Ok(())
    }
}
