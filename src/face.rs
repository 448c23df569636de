use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A landmark in coordinates normalized to the face image it was located in.
pub type Landmark = Point2<f32>;

// position of each face edge inside `LandmarkTopology::face_edge`
pub const FACE_EDGE_LEFT: usize = 0;
pub const FACE_EDGE_BOTTOM: usize = 1;
pub const FACE_EDGE_RIGHT: usize = 2;
pub const FACE_EDGE_TOP: usize = 3;

// face mesh (468 points) topology
pub const LEFT_EYE_INDICES: [usize; 16] = [
    33, 7, 163, 144, 145, 153, 154, 155, 133, 173, 157, 158, 159, 160, 161, 246,
];
pub const RIGHT_EYE_INDICES: [usize; 16] = [
    362, 382, 381, 380, 374, 373, 390, 249, 263, 466, 388, 387, 386, 385, 384, 398,
];
// left edge, chin, right edge, forehead
pub const FACE_EDGE_INDICES: [usize; 4] = [234, 152, 454, 10];

pub enum LandmarkMesh {
    LeftEye,
    RightEye,
    FaceEdge,
}

/// Indices into the landmark model's output that make up each region the
/// cropper needs. These belong to the landmark model, so swapping the model
/// means swapping the topology with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LandmarkTopology {
    pub left_eye: Vec<usize>,
    pub right_eye: Vec<usize>,
    /// Ordered as left edge, bottom (chin), right edge, top (forehead).
    pub face_edge: [usize; 4],
}

impl Default for LandmarkTopology {
    fn default() -> Self {
        Self {
            left_eye: LEFT_EYE_INDICES.to_vec(),
            right_eye: RIGHT_EYE_INDICES.to_vec(),
            face_edge: FACE_EDGE_INDICES,
        }
    }
}

impl LandmarkTopology {
    pub fn indices(&self, mesh: LandmarkMesh) -> &[usize] {
        match mesh {
            LandmarkMesh::LeftEye => self.left_eye.as_slice(),
            LandmarkMesh::RightEye => self.right_eye.as_slice(),
            LandmarkMesh::FaceEdge => &self.face_edge[..],
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.left_eye.is_empty() {
            return Err(Error::InvalidTopology(
                "left eye needs at least one landmark".to_string(),
            ));
        }
        if self.right_eye.is_empty() {
            return Err(Error::InvalidTopology(
                "right eye needs at least one landmark".to_string(),
            ));
        }
        Ok(())
    }
}

/// One set of facial landmarks as returned by a landmark model.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceLandmarks {
    pub points: Vec<Landmark>,
}

impl FaceLandmarks {
    pub fn new(points: Vec<Landmark>) -> Self {
        Self { points }
    }

    // construct from a flattened vector of points with `stride` values each,
    // keeping only x and y
    pub fn from_vec(points: &[f32], stride: usize) -> FaceLandmarks {
        let stride = stride.max(2);
        FaceLandmarks {
            points: points
                .chunks_exact(stride)
                .map(|p| Landmark::new(p[0], p[1]))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get_point(&self, index: usize) -> Option<Landmark> {
        self.points.get(index).copied()
    }

    pub fn get_points(&self, indices: &[usize]) -> Result<Vec<Landmark>> {
        indices
            .iter()
            .map(|&i| {
                self.get_point(i).ok_or(Error::LandmarkOutOfRange {
                    index: i,
                    len: self.points.len(),
                })
            })
            .collect()
    }

    pub fn get_mesh(&self, topology: &LandmarkTopology, mesh: LandmarkMesh) -> Result<Vec<Landmark>> {
        self.get_points(topology.indices(mesh))
    }

    pub fn get_face_edges(&self, topology: &LandmarkTopology) -> Result<[Landmark; 4]> {
        let mut edges = [Landmark::origin(); 4];
        for (edge, &index) in edges.iter_mut().zip(topology.face_edge.iter()) {
            *edge = self.get_point(index).ok_or(Error::LandmarkOutOfRange {
                index,
                len: self.points.len(),
            })?;
        }
        Ok(edges)
    }
}
