use image::RgbImage;
use tracing::debug;

use crate::config::{CropperConfig, RotationConfig};
use crate::crop::clip_face;
use crate::error::Result;
use crate::face::{LandmarkMesh, LandmarkTopology};
use crate::face_detection::{BoundingBox, FaceDetectionModel};
use crate::face_landmarks::FaceLandmarksModel;
use crate::geometry::EyeGeometry;
use crate::normaliser::normalise_roll;

/// A face whose roll has been removed.
#[derive(Debug, Clone)]
pub struct NormalisedFace {
    /// Where the face was found, relative to the full image.
    pub bounding_box: BoundingBox,
    /// Eye frame measured on the clipped face image.
    pub eyes: EyeGeometry,
    /// The roll-corrected face. May have zero rows or columns.
    pub image: RgbImage,
}

impl NormalisedFace {
    pub fn roll_angle(&self) -> f64 {
        self.eyes.roll_angle
    }

    pub fn is_empty(&self) -> bool {
        self.image.width() == 0 || self.image.height() == 0
    }
}

/// Finds the faces in an image and returns an upright crop of each.
///
/// Owns one face detector and one landmark detector. Faces are processed one
/// after another and independently of each other.
pub struct NormalisedFaceCropper<D, L> {
    face_detector: D,
    landmark_detector: L,
    topology: LandmarkTopology,
    rotation: RotationConfig,
}

impl<D, L> NormalisedFaceCropper<D, L>
where
    D: FaceDetectionModel,
    L: FaceLandmarksModel,
{
    pub fn new(face_detector: D, landmark_detector: L) -> Self {
        Self {
            face_detector,
            landmark_detector,
            topology: LandmarkTopology::default(),
            rotation: RotationConfig::default(),
        }
    }

    pub fn with_config(face_detector: D, landmark_detector: L, config: &CropperConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            face_detector,
            landmark_detector,
            topology: config.topology.clone(),
            rotation: config.rotation.clone(),
        })
    }

    pub fn topology(&self) -> &LandmarkTopology {
        &self.topology
    }

    pub fn rotation(&self) -> &RotationConfig {
        &self.rotation
    }

    /// Crop out the faces in `image` with their roll reversed.
    ///
    /// `image` must use the RGB channel order the detectors expect. Returns
    /// `None` when no face is detected. Faces the landmark detector cannot
    /// handle are left out of the result.
    pub fn crop_faces_from_image(&mut self, image: &RgbImage) -> Result<Option<Vec<RgbImage>>> {
        Ok(self
            .detect_normalised_faces(image)?
            .map(|faces| faces.into_iter().map(|face| face.image).collect()))
    }

    /// Like [`Self::crop_faces_from_image`], keeping the geometry of each face.
    pub fn detect_normalised_faces(&mut self, image: &RgbImage) -> Result<Option<Vec<NormalisedFace>>> {
        let boxes = match self.face_detector.run(image)? {
            Some(boxes) if !boxes.is_empty() => boxes,
            _ => {
                debug!("no faces detected");
                return Ok(None);
            }
        };
        debug!("{} faces detected", boxes.len());

        let mut faces = Vec::with_capacity(boxes.len());
        for bounding_box in boxes {
            if let Some(face) = self.normalise_face(image, bounding_box)? {
                faces.push(face);
            }
        }

        Ok(Some(faces))
    }

    fn normalise_face(&mut self, image: &RgbImage, bounding_box: BoundingBox) -> Result<Option<NormalisedFace>> {
        let face_image = clip_face(image, &bounding_box);

        let landmarks = match self.landmark_detector.run(&face_image)? {
            Some(sets) => match sets.into_iter().next() {
                Some(landmarks) => landmarks,
                None => return Ok(None),
            },
            None => return Ok(None),
        };

        let left_eye = landmarks.get_mesh(&self.topology, LandmarkMesh::LeftEye)?;
        let right_eye = landmarks.get_mesh(&self.topology, LandmarkMesh::RightEye)?;
        let face_edges = landmarks.get_face_edges(&self.topology)?;

        let eyes = EyeGeometry::from_landmarks(&left_eye, &right_eye, face_image.dimensions());
        debug!(
            left_eye = ?eyes.left_eye,
            right_eye = ?eyes.right_eye,
            midpoint = ?eyes.midpoint,
            roll_angle = eyes.roll_angle,
            "eye geometry"
        );

        let image = normalise_roll(
            &face_image,
            &face_edges,
            eyes.midpoint,
            eyes.roll_angle,
            &self.rotation,
        )?;

        Ok(Some(NormalisedFace {
            bounding_box,
            eyes,
            image,
        }))
    }
}
