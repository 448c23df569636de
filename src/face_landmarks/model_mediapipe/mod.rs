use std::sync::Arc;

use image::imageops::{self, FilterType};
use image::RgbImage;
use ndarray::{Array, CowArray};
use ort::tensor::OrtOwnedTensor;
use ort::{Environment, ExecutionProvider, GraphOptimizationLevel, Session, SessionBuilder, Value};
use tracing::info;

use crate::config::LandmarkConfig;
use crate::error::{Error, Result};
use crate::face::FaceLandmarks;
use crate::face_landmarks::FaceLandmarksModel;

const INPUT_SIZE: u32 = 256;
// x, y, z per landmark
const LANDMARK_STRIDE: usize = 3;

/// MediaPipe face mesh running on ONNX Runtime.
///
/// Output 0 holds 468 (or 478 with irises) landmarks in input pixels,
/// output 1 the face presence logit.
pub struct MediapipeFaceLandmarksModel {
    _environment: Arc<Environment>,
    session: Session,
    min_presence: f32,
}

impl MediapipeFaceLandmarksModel {
    pub fn new(config: &LandmarkConfig) -> Result<Self> {
        let environment = Environment::builder()
            .with_name("face_mesh")
            .with_execution_providers([ExecutionProvider::CPU(Default::default())])
            .build()?
            .into_arc();

        let session = SessionBuilder::new(&environment)?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(config.intra_threads)?
            .with_model_from_file(&config.model_path)?;

        info!("loaded face landmark model {}", config.model_path.display());

        Ok(MediapipeFaceLandmarksModel {
            _environment: environment,
            session,
            min_presence: config.min_presence,
        })
    }
}

impl FaceLandmarksModel for MediapipeFaceLandmarksModel {
    fn run(&mut self, face_image: &RgbImage) -> Result<Option<Vec<FaceLandmarks>>> {
        if face_image.width() == 0 || face_image.height() == 0 {
            return Ok(None);
        }

        // stretching to the square input keeps coordinates relative to the face image
        let input = imageops::resize(face_image, INPUT_SIZE, INPUT_SIZE, FilterType::Triangle);

        let input: Vec<f32> = input
            .pixels()
            .flat_map(|p| p.0)
            .map(|p| p as f32 / 255.0)
            .collect();

        let array: CowArray<_, _> =
            Array::from_shape_vec((1, INPUT_SIZE as usize, INPUT_SIZE as usize, 3), input)?
                .into_dyn()
                .into();

        let inputs = vec![Value::from_array(self.session.allocator(), &array)?];
        let outputs: Vec<Value> = self.session.run(inputs)?;

        if outputs.len() < 2 {
            return Err(Error::ModelOutput(format!(
                "expected landmark and presence outputs, got {} outputs",
                outputs.len()
            )));
        }

        let face_flag: OrtOwnedTensor<f32, _> = outputs[1].try_extract()?;
        let face_flag = face_flag
            .view()
            .iter()
            .next()
            .copied()
            .ok_or_else(|| Error::ModelOutput("empty face presence output".to_string()))?;

        if sigmoid(face_flag) < self.min_presence {
            return Ok(None);
        }

        let res: OrtOwnedTensor<f32, _> = outputs[0].try_extract()?;
        let res: Vec<f32> = res.view().iter().map(|p| p / INPUT_SIZE as f32).collect();

        if res.is_empty() || res.len() % LANDMARK_STRIDE != 0 {
            return Err(Error::ModelOutput(format!(
                "landmark output of length {} is not a list of 3D points",
                res.len()
            )));
        }

        Ok(Some(vec![FaceLandmarks::from_vec(&res, LANDMARK_STRIDE)]))
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}
