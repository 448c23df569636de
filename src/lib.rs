//! Roll-normalised face crops.
//!
//! The pipeline for every face found in an image:
//!
//! 1. a [`FaceDetectionModel`] returns relative bounding boxes,
//! 2. each box is clipped out of the image ([`crop::clip_face`]),
//! 3. a [`FaceLandmarksModel`] locates the face mesh in the clipped image,
//! 4. the eye landmarks give the eye centres, their midpoint and the roll
//!    angle ([`geometry`]),
//! 5. the face is rotated back around the eyes midpoint and cropped to the
//!    face edges ([`normaliser::normalise_roll`]).
//!
//! The detectors are traits so that any model can be plugged in. With the
//! `onnx` feature the crate provides BlazeFace and MediaPipe face mesh
//! implementations running on ONNX Runtime.
//!
//! ```no_run
//! # #[cfg(feature = "onnx")]
//! # fn main() -> facecropping::Result<()> {
//! use facecropping::face_detection::model_blazeface::BlazefaceModel;
//! use facecropping::face_landmarks::model_mediapipe::MediapipeFaceLandmarksModel;
//! use facecropping::{CropperConfig, NormalisedFaceCropper};
//!
//! let config = CropperConfig::default();
//! let mut cropper = NormalisedFaceCropper::with_config(
//!     BlazefaceModel::new(&config.detection)?,
//!     MediapipeFaceLandmarksModel::new(&config.landmarks)?,
//!     &config,
//! )?;
//!
//! let image = image::RgbImage::new(640, 480);
//! if let Some(faces) = cropper.crop_faces_from_image(&image)? {
//!     println!("{} faces", faces.len());
//! }
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "onnx"))]
//! # fn main() {}
//! ```

pub mod config;
pub mod crop;
mod cropper;
mod error;
pub mod face;
pub mod face_detection;
pub mod face_landmarks;
pub mod geometry;
pub mod normaliser;
pub mod rotation;

pub use config::CropperConfig;
pub use cropper::{NormalisedFace, NormalisedFaceCropper};
pub use error::{Error, Result};
pub use face::{FaceLandmarks, Landmark, LandmarkTopology};
pub use face_detection::{BoundingBox, FaceDetectionModel};
pub use face_landmarks::FaceLandmarksModel;
pub use geometry::{EyeGeometry, PixelPoint};
