use std::sync::Arc;

use image::imageops::{self, FilterType};
use image::RgbImage;
use ndarray::{Array, CowArray};
use ort::tensor::OrtOwnedTensor;
use ort::{Environment, ExecutionProvider, GraphOptimizationLevel, Session, SessionBuilder, Value};
use tracing::{debug, info};

use crate::config::DetectionConfig;
use crate::error::{Error, Result};
use crate::face_detection::{BoundingBox, FaceDetectionModel};

const INPUT_SIZE: u32 = 256;
// SSD layers of the 256x256 "back" model; layers sharing a stride share a grid
const STRIDES: [u32; 4] = [16, 32, 32, 32];
const ANCHORS_PER_LAYER: usize = 2;
const NUM_ANCHORS: usize = 896;
// box centre, size and 6 keypoints
const NUM_COORDS: usize = 16;
const SCORE_CLIPPING: f32 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Anchor {
    x_center: f32,
    y_center: f32,
}

/// BlazeFace face detector running on ONNX Runtime.
///
/// Expects a model with a `1x256x256x3` input and four outputs: the scores
/// of the 16x16 and 8x8 grids followed by their box regressors.
pub struct BlazefaceModel {
    _environment: Arc<Environment>,
    session: Session,
    anchors: Vec<Anchor>,
    min_score: f32,
    nms_iou_threshold: f32,
}

impl BlazefaceModel {
    pub fn new(config: &DetectionConfig) -> Result<Self> {
        let environment = Environment::builder()
            .with_name("blazeface")
            .with_execution_providers([ExecutionProvider::CPU(Default::default())])
            .build()?
            .into_arc();

        let session = SessionBuilder::new(&environment)?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(config.intra_threads)?
            .with_model_from_file(&config.model_path)?;

        info!("loaded face detection model {}", config.model_path.display());

        Ok(BlazefaceModel {
            _environment: environment,
            session,
            anchors: generate_anchors(),
            min_score: config.min_score,
            nms_iou_threshold: config.nms_iou_threshold,
        })
    }

    fn extract(outputs: &[Value], index: usize) -> Result<Vec<f32>> {
        let value = outputs
            .get(index)
            .ok_or_else(|| Error::ModelOutput(format!("missing output {}", index)))?;
        let tensor: OrtOwnedTensor<f32, _> = value.try_extract()?;
        let data: Vec<f32> = tensor.view().iter().copied().collect();
        Ok(data)
    }
}

impl FaceDetectionModel for BlazefaceModel {
    fn run(&mut self, image: &RgbImage) -> Result<Option<Vec<BoundingBox>>> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Ok(None);
        }

        // the model sees the centred square of the image
        let side = width.min(height);
        let offset = ((width - side) / 2, (height - side) / 2);
        let square = imageops::crop_imm(image, offset.0, offset.1, side, side).to_image();
        let input = imageops::resize(&square, INPUT_SIZE, INPUT_SIZE, FilterType::Triangle);

        // pixels in [-1, 1]
        let input: Vec<f32> = input
            .pixels()
            .flat_map(|p| p.0)
            .map(|p| p as f32 / 127.5 - 1.0)
            .collect();

        let array: CowArray<_, _> =
            Array::from_shape_vec((1, INPUT_SIZE as usize, INPUT_SIZE as usize, 3), input)?
                .into_dyn()
                .into();

        let inputs = vec![Value::from_array(self.session.allocator(), &array)?];
        let outputs: Vec<Value> = self.session.run(inputs)?;

        let mut scores = Self::extract(&outputs, 0)?;
        scores.extend(Self::extract(&outputs, 1)?);
        let mut raw_boxes = Self::extract(&outputs, 2)?;
        raw_boxes.extend(Self::extract(&outputs, 3)?);

        if scores.len() != NUM_ANCHORS || raw_boxes.len() != NUM_ANCHORS * NUM_COORDS {
            return Err(Error::ModelOutput(format!(
                "expected {} scores and {} box values, got {} and {}",
                NUM_ANCHORS,
                NUM_ANCHORS * NUM_COORDS,
                scores.len(),
                raw_boxes.len()
            )));
        }

        let candidates: Vec<BoundingBox> = scores
            .iter()
            .zip(raw_boxes.chunks_exact(NUM_COORDS))
            .zip(self.anchors.iter())
            .filter_map(|((&raw_score, raw_box), anchor)| {
                let score = sigmoid(raw_score.clamp(-SCORE_CLIPPING, SCORE_CLIPPING));
                if score < self.min_score {
                    return None;
                }
                let square_box = decode_box(raw_box, anchor);
                Some(to_image_box(&square_box, side, offset, (width, height)).with_score(score))
            })
            .collect();

        let faces = non_max_suppression(candidates, self.nms_iou_threshold);
        debug!("blazeface kept {} boxes", faces.len());

        if faces.is_empty() {
            Ok(None)
        } else {
            Ok(Some(faces))
        }
    }
}

fn generate_anchors() -> Vec<Anchor> {
    let mut anchors = Vec::with_capacity(NUM_ANCHORS);

    let mut layer = 0;
    while layer < STRIDES.len() {
        let stride = STRIDES[layer];
        let mut anchors_per_cell = 0;
        while layer < STRIDES.len() && STRIDES[layer] == stride {
            anchors_per_cell += ANCHORS_PER_LAYER;
            layer += 1;
        }

        let grid = INPUT_SIZE / stride;
        for y in 0..grid {
            for x in 0..grid {
                let anchor = Anchor {
                    x_center: (x as f32 + 0.5) / grid as f32,
                    y_center: (y as f32 + 0.5) / grid as f32,
                };
                anchors.extend(std::iter::repeat(anchor).take(anchors_per_cell));
            }
        }
    }

    anchors
}

// decode a regressed box against its (unit sized) anchor, relative to the model input
fn decode_box(raw_box: &[f32], anchor: &Anchor) -> BoundingBox {
    let scale = INPUT_SIZE as f32;
    let x_center = raw_box[0] / scale + anchor.x_center;
    let y_center = raw_box[1] / scale + anchor.y_center;
    let w = raw_box[2] / scale;
    let h = raw_box[3] / scale;

    BoundingBox::new(x_center - w / 2.0, y_center - h / 2.0, w, h)
}

// map a box relative to the centred square back to the full image
fn to_image_box(square_box: &BoundingBox, side: u32, offset: (u32, u32), image_size: (u32, u32)) -> BoundingBox {
    let side = side as f32;
    let (width, height) = (image_size.0 as f32, image_size.1 as f32);

    BoundingBox::new(
        (square_box.xmin * side + offset.0 as f32) / width,
        (square_box.ymin * side + offset.1 as f32) / height,
        square_box.width * side / width,
        square_box.height * side / height,
    )
}

fn non_max_suppression(mut boxes: Vec<BoundingBox>, iou_threshold: f32) -> Vec<BoundingBox> {
    boxes.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut keep: Vec<BoundingBox> = Vec::with_capacity(boxes.len());
    for candidate in boxes {
        if keep.iter().all(|kept| kept.iou(&candidate) <= iou_threshold) {
            keep.push(candidate);
        }
    }
    keep
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchor_grid_covers_both_feature_maps() {
        let anchors = generate_anchors();
        assert_eq!(anchors.len(), NUM_ANCHORS);
        // 16x16 grid with 2 anchors per cell comes first
        assert_eq!(anchors[0], anchors[1]);
        assert!((anchors[0].x_center - 0.5 / 16.0).abs() < 1e-6);
        // then the 8x8 grid with 6 anchors per cell
        assert!((anchors[512].x_center - 0.5 / 8.0).abs() < 1e-6);
        assert_eq!(anchors[512], anchors[517]);
        assert!((anchors[NUM_ANCHORS - 1].y_center - 7.5 / 8.0).abs() < 1e-6);
    }

    #[test]
    fn decoded_box_is_centred_on_anchor() {
        let anchor = Anchor {
            x_center: 0.5,
            y_center: 0.25,
        };
        let mut raw = [0.0f32; NUM_COORDS];
        raw[2] = 64.0;
        raw[3] = 128.0;
        let decoded = decode_box(&raw, &anchor);
        assert!((decoded.xmin - 0.375).abs() < 1e-6);
        assert!((decoded.ymin - 0.0).abs() < 1e-6);
        assert!((decoded.width - 0.25).abs() < 1e-6);
        assert!((decoded.height - 0.5).abs() < 1e-6);
    }

    #[test]
    fn square_box_maps_into_wide_image() {
        // 400x200 image, the model saw columns [100, 300)
        let square_box = BoundingBox::new(0.0, 0.5, 0.5, 0.5);
        let mapped = to_image_box(&square_box, 200, (100, 0), (400, 200));
        assert!((mapped.xmin - 0.25).abs() < 1e-6);
        assert!((mapped.ymin - 0.5).abs() < 1e-6);
        assert!((mapped.width - 0.25).abs() < 1e-6);
        assert!((mapped.height - 0.5).abs() < 1e-6);
    }

    #[test]
    fn overlapping_boxes_are_suppressed() {
        let boxes = vec![
            BoundingBox::new(0.1, 0.1, 0.3, 0.3).with_score(0.7),
            BoundingBox::new(0.11, 0.1, 0.3, 0.3).with_score(0.9),
            BoundingBox::new(0.6, 0.6, 0.2, 0.2).with_score(0.8),
        ];
        let kept = non_max_suppression(boxes, 0.3);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].score, 0.9);
        assert_eq!(kept[1].score, 0.8);
    }

    #[test]
    fn sigmoid_is_centred() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(SCORE_CLIPPING) > 0.999);
    }
}
