#[cfg(feature = "onnx")]
pub mod model_mediapipe;

use image::RgbImage;

use crate::error::Result;
use crate::face::FaceLandmarks;

/// Locates facial landmarks in an image that contains a single face.
///
/// Landmark coordinates are normalized to `[0, 1]` relative to the image
/// passed to `run`. Only the first returned set is used by the cropper.
pub trait FaceLandmarksModel {
    /// Returns `None` when no face was found in the image.
    fn run(&mut self, face_image: &RgbImage) -> Result<Option<Vec<FaceLandmarks>>>;
}

impl<T: FaceLandmarksModel + ?Sized> FaceLandmarksModel for Box<T> {
    fn run(&mut self, face_image: &RgbImage) -> Result<Option<Vec<FaceLandmarks>>> {
        (**self).run(face_image)
    }
}
