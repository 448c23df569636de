#[cfg(feature = "onnx")]
pub mod model_blazeface;

use image::RgbImage;

use crate::error::Result;

/// A detected face rectangle. All values are fractions of the full image
/// dimensions, with the origin in the top left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub xmin: f32,
    pub ymin: f32,
    pub width: f32,
    pub height: f32,
    /// Detector confidence, 1.0 when the detector does not report one.
    pub score: f32,
}

impl BoundingBox {
    pub fn new(xmin: f32, ymin: f32, width: f32, height: f32) -> Self {
        Self {
            xmin,
            ymin,
            width,
            height,
            score: 1.0,
        }
    }

    pub fn with_score(mut self, score: f32) -> Self {
        self.score = score;
        self
    }

    pub fn xmax(&self) -> f32 {
        self.xmin + self.width
    }

    pub fn ymax(&self) -> f32 {
        self.ymin + self.height
    }

    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Intersection over union of two boxes.
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let inter_w = (self.xmax().min(other.xmax()) - self.xmin.max(other.xmin)).max(0.0);
        let inter_h = (self.ymax().min(other.ymax()) - self.ymin.max(other.ymin)).max(0.0);
        let inter_area = inter_w * inter_h;
        let union_area = self.area() + other.area() - inter_area;

        if union_area > 0.0 {
            inter_area / union_area
        } else {
            0.0
        }
    }
}

/// Locates faces in a full image.
///
/// Implementations hold model state and are not expected to be shared
/// between threads; create one per worker instead.
pub trait FaceDetectionModel {
    /// Returns `None` when no face was found.
    fn run(&mut self, image: &RgbImage) -> Result<Option<Vec<BoundingBox>>>;
}

impl<T: FaceDetectionModel + ?Sized> FaceDetectionModel for Box<T> {
    fn run(&mut self, image: &RgbImage) -> Result<Option<Vec<BoundingBox>>> {
        (**self).run(image)
    }
}
