use image::{Rgb, RgbImage};
use imageproc::geometric_transformations::{warp, Projection};
use nalgebra::{Matrix2x3, Matrix2xX, Matrix3xX};

use crate::config::RotationConfig;
use crate::crop::to_pixel;
use crate::error::{Error, Result};
use crate::face::Landmark;
use crate::geometry::PixelPoint;

/// 2x3 affine transform mapping source pixel coordinates to rotated ones.
pub type RotationMatrix = Matrix2x3<f64>;

/// Rotation by `angle_degrees` around `pivot` with unit scale.
///
/// Same layout as OpenCV's `getRotationMatrix2D`: in image coordinates a
/// positive angle turns the content counter-clockwise on screen.
pub fn rotation_matrix(pivot: PixelPoint, angle_degrees: f64) -> RotationMatrix {
    let (sin, cos) = angle_degrees.to_radians().sin_cos();
    let (cx, cy) = (pivot.x as f64, pivot.y as f64);

    RotationMatrix::new(
        cos,
        sin,
        (1.0 - cos) * cx - sin * cy,
        -sin,
        cos,
        sin * cx + (1.0 - cos) * cy,
    )
}

/// Move normalized landmarks through `matrix`.
///
/// Landmarks are scaled to pixels of an image of `image_size = (width, height)`
/// in row/column space, transformed and rounded. Row 0 of the result holds the
/// x values, row 1 the y values, one column per landmark.
pub fn rotate_landmarks(
    landmarks: &[Landmark],
    matrix: &RotationMatrix,
    image_size: (u32, u32),
) -> Matrix2xX<i32> {
    let (width, height) = (image_size.0 as f64, image_size.1 as f64);

    let homogeneous = Matrix3xX::from_fn(landmarks.len(), |row, col| match row {
        0 => landmarks[col].x as f64 * width,
        1 => landmarks[col].y as f64 * height,
        _ => 1.0,
    });

    (matrix * homogeneous).map(to_pixel)
}

/// Warp the whole image with `matrix`. The output keeps the input size and
/// pixels without a source are filled with `config.fill`.
pub fn rotate_image(image: &RgbImage, matrix: &RotationMatrix, config: &RotationConfig) -> Result<RgbImage> {
    if image.width() == 0 || image.height() == 0 {
        return Ok(image.clone());
    }

    #[rustfmt::skip]
    let projection = Projection::from_matrix([
        matrix[(0, 0)] as f32, matrix[(0, 1)] as f32, matrix[(0, 2)] as f32,
        matrix[(1, 0)] as f32, matrix[(1, 1)] as f32, matrix[(1, 2)] as f32,
        0.0, 0.0, 1.0,
    ])
    .ok_or(Error::InvalidWarp)?;

    Ok(warp(
        image,
        &projection,
        config.interpolation.into(),
        Rgb(config.fill),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WarpInterpolation;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn zero_angle_is_identity() {
        let matrix = rotation_matrix(PixelPoint::new(37, 12), 0.0);
        assert_eq!(matrix, RotationMatrix::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0));
    }

    #[test]
    fn pivot_is_fixed() {
        let pivot = PixelPoint::new(40, 25);
        let matrix = rotation_matrix(pivot, 33.0);
        let x = matrix[(0, 0)] * 40.0 + matrix[(0, 1)] * 25.0 + matrix[(0, 2)];
        let y = matrix[(1, 0)] * 40.0 + matrix[(1, 1)] * 25.0 + matrix[(1, 2)];
        assert!(close(x, 40.0));
        assert!(close(y, 25.0));
    }

    #[test]
    fn quarter_turn_matches_opencv_sense() {
        // +90 degrees around the origin sends (1, 0) to (0, -1) in row/column space
        let matrix = rotation_matrix(PixelPoint::new(0, 0), 90.0);
        let x = matrix[(0, 0)] * 1.0 + matrix[(0, 2)];
        let y = matrix[(1, 0)] * 1.0 + matrix[(1, 2)];
        assert!(close(x, 0.0));
        assert!(close(y, -1.0));
    }

    #[test]
    fn landmarks_are_scaled_then_rotated() {
        let landmarks = [
            Landmark::new(0.1, 0.5),
            Landmark::new(0.5, 0.9),
            Landmark::new(0.9, 0.5),
            Landmark::new(0.5, 0.1),
        ];

        let identity = rotation_matrix(PixelPoint::new(50, 50), 0.0);
        let rotated = rotate_landmarks(&landmarks, &identity, (100, 200));
        assert_eq!(rotated.ncols(), 4);
        assert_eq!(rotated.row(0).iter().copied().collect::<Vec<_>>(), vec![10, 50, 90, 50]);
        assert_eq!(rotated.row(1).iter().copied().collect::<Vec<_>>(), vec![100, 180, 100, 20]);

        // half turn around the centre swaps opposite edges
        let half_turn = rotation_matrix(PixelPoint::new(50, 50), 180.0);
        let rotated = rotate_landmarks(&landmarks, &half_turn, (100, 100));
        assert_eq!(rotated.column(0).iter().copied().collect::<Vec<_>>(), vec![90, 50]);
        assert_eq!(rotated.column(1).iter().copied().collect::<Vec<_>>(), vec![50, 10]);
    }

    #[test]
    fn identity_warp_keeps_pixels() {
        let image = RgbImage::from_fn(16, 12, |x, y| Rgb([x as u8 * 10, y as u8 * 20, 7]));
        let config = RotationConfig {
            interpolation: WarpInterpolation::Nearest,
            ..Default::default()
        };
        let rotated = rotate_image(&image, &rotation_matrix(PixelPoint::new(8, 6), 0.0), &config).unwrap();
        assert_eq!(rotated, image);
    }

    #[test]
    fn empty_image_is_left_alone() {
        let image = RgbImage::new(0, 7);
        let rotated = rotate_image(&image, &rotation_matrix(PixelPoint::new(0, 3), 45.0), &RotationConfig::default()).unwrap();
        assert_eq!(rotated.dimensions(), (0, 7));
    }

    #[test]
    fn warp_keeps_size_and_fills_background() {
        let image = RgbImage::from_pixel(20, 10, Rgb([200, 200, 200]));
        let config = RotationConfig {
            interpolation: WarpInterpolation::Nearest,
            fill: [1, 2, 3],
        };
        let rotated = rotate_image(&image, &rotation_matrix(PixelPoint::new(10, 5), 90.0), &config).unwrap();
        assert_eq!(rotated.dimensions(), (20, 10));
        // the rotated content is 10 wide, so the far left column has no source
        assert_eq!(rotated.get_pixel(0, 5), &Rgb([1, 2, 3]));
        assert_eq!(rotated.get_pixel(10, 5), &Rgb([200, 200, 200]));
    }
}
