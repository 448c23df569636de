//! Eye based coordinate frame of a face.
//!
//! Images index pixels by row, growing downwards. Angles are easier to reason
//! about with y growing upwards, so eye centres use a "height-up" y value
//! (`height - 1 - row`). Keep the two conventions apart by going through
//! [`row_to_height_up`] and [`height_up_to_row`].

use crate::crop::to_pixel;
use crate::face::Landmark;

/// Integer pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PixelPoint {
    pub x: i32,
    pub y: i32,
}

impl PixelPoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

pub fn row_to_height_up(row: f64, height: u32) -> f64 {
    height as f64 - 1.0 - row
}

pub fn height_up_to_row(y: f64, height: u32) -> f64 {
    height as f64 - 1.0 - y
}

/// Centre of an eye in pixels, with a height-up y coordinate.
///
/// `landmarks` are normalized to an image of `image_size = (width, height)`
/// and must not be empty.
pub fn eye_centre(landmarks: &[Landmark], image_size: (u32, u32)) -> PixelPoint {
    let (width, height) = image_size;
    let n = landmarks.len() as f64;

    let sum_x: f64 = landmarks.iter().map(|p| p.x as f64).sum();
    let sum_y: f64 = landmarks.iter().map(|p| p.y as f64).sum();

    PixelPoint::new(
        to_pixel(sum_x * width as f64 / n),
        to_pixel(row_to_height_up(sum_y * height as f64 / n, height)),
    )
}

/// Midpoint between the eye centres, rounded once per coordinate.
///
/// The eye centres are height-up; averaging them and flipping back yields a
/// point in row/column space, which is what the rotation pivots around.
pub fn eyes_midpoint(left_eye: PixelPoint, right_eye: PixelPoint, image_height: u32) -> PixelPoint {
    PixelPoint::new(
        to_pixel((left_eye.x + right_eye.x) as f64 / 2.0),
        to_pixel(height_up_to_row(
            (left_eye.y + right_eye.y) as f64 / 2.0,
            image_height,
        )),
    )
}

/// Roll of the face in degrees, in `(-90, 270]`, from the height-up eye
/// centres. Positive angles mean the right eye sits higher than the left.
pub fn roll_angle(left_eye: PixelPoint, right_eye: PixelPoint) -> f64 {
    // the equal x case must be handled before the gradient is computed
    if right_eye.y == left_eye.y {
        if right_eye.x >= left_eye.x {
            0.0
        } else {
            180.0
        }
    } else if right_eye.x == left_eye.x {
        if right_eye.y > left_eye.y {
            90.0
        } else {
            270.0
        }
    } else {
        let gradient =
            (right_eye.y - left_eye.y) as f64 / (right_eye.x - left_eye.x) as f64;
        if right_eye.x > left_eye.x {
            gradient.atan().to_degrees()
        } else {
            180.0 + gradient.atan().to_degrees()
        }
    }
}

/// Eye centres, their midpoint and the resulting roll of one face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeGeometry {
    pub left_eye: PixelPoint,
    pub right_eye: PixelPoint,
    pub midpoint: PixelPoint,
    pub roll_angle: f64,
}

impl EyeGeometry {
    pub fn from_landmarks(
        left_eye_landmarks: &[Landmark],
        right_eye_landmarks: &[Landmark],
        image_size: (u32, u32),
    ) -> Self {
        let left_eye = eye_centre(left_eye_landmarks, image_size);
        let right_eye = eye_centre(right_eye_landmarks, image_size);

        EyeGeometry {
            left_eye,
            right_eye,
            midpoint: eyes_midpoint(left_eye, right_eye, image_size.1),
            roll_angle: roll_angle(left_eye, right_eye),
        }
    }
}
