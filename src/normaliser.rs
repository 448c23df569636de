use image::RgbImage;
use tracing::trace;

use crate::config::RotationConfig;
use crate::crop::safe_crop;
use crate::error::Result;
use crate::face::{Landmark, FACE_EDGE_BOTTOM, FACE_EDGE_LEFT, FACE_EDGE_RIGHT, FACE_EDGE_TOP};
use crate::geometry::PixelPoint;
use crate::rotation::{rotate_image, rotate_landmarks, rotation_matrix};

/// Undo the roll of a face and crop it to its edges.
///
/// `face_edges` are normalized to `face_image` and ordered left, bottom,
/// right, top. The image and the edges are rotated by `-roll_angle` around
/// `eyes_midpoint` with one shared matrix, then the rotated image is cropped
/// between the rotated edges.
pub fn normalise_roll(
    face_image: &RgbImage,
    face_edges: &[Landmark; 4],
    eyes_midpoint: PixelPoint,
    roll_angle: f64,
    config: &RotationConfig,
) -> Result<RgbImage> {
    let image_size = face_image.dimensions();

    let matrix = rotation_matrix(eyes_midpoint, -roll_angle);
    trace!(?matrix, roll_angle, "rotating face");

    let edges = rotate_landmarks(face_edges, &matrix, image_size);
    let rotated = rotate_image(face_image, &matrix, config)?;

    Ok(safe_crop(
        &rotated,
        edges[(1, FACE_EDGE_TOP)],
        edges[(1, FACE_EDGE_BOTTOM)],
        edges[(0, FACE_EDGE_LEFT)],
        edges[(0, FACE_EDGE_RIGHT)],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WarpInterpolation;
    use image::Rgb;

    fn nearest() -> RotationConfig {
        RotationConfig {
            interpolation: WarpInterpolation::Nearest,
            ..Default::default()
        }
    }

    fn pattern(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| Rgb([(x * 3) as u8, (y * 5) as u8, 11]))
    }

    // left, bottom, right, top
    fn edges() -> [Landmark; 4] {
        [
            Landmark::new(0.2, 0.5),
            Landmark::new(0.5, 0.8),
            Landmark::new(0.8, 0.5),
            Landmark::new(0.5, 0.2),
        ]
    }

    #[test]
    fn upright_face_is_cropped_at_its_edges() {
        let image = pattern(50, 50);
        let face = normalise_roll(&image, &edges(), PixelPoint::new(25, 25), 0.0, &nearest()).unwrap();

        // rows [10, 40), columns [10, 40]
        assert_eq!(face.dimensions(), (31, 30));
        let expected = safe_crop(&image, 10, 40, 10, 40);
        assert_eq!(face, expected);
    }

    #[test]
    fn half_turn_swaps_top_and_bottom() {
        // a face upside down: forehead below the chin
        let image = pattern(60, 60);
        let upside_down = [
            Landmark::new(0.75, 0.5),
            Landmark::new(0.5, 0.25),
            Landmark::new(0.25, 0.5),
            Landmark::new(0.5, 0.75),
        ];
        let face = normalise_roll(&image, &upside_down, PixelPoint::new(30, 30), 180.0, &nearest()).unwrap();

        // after the half turn the forehead sits at row 15 and the chin at row 45
        assert_eq!(face.height(), 30);
        assert_eq!(face.width(), 31);
        // the top left of the crop comes from the bottom right of the source
        assert_eq!(face.get_pixel(0, 0), image.get_pixel(45, 45));
    }

    #[test]
    fn quarter_roll_keeps_face_extent() {
        // the edges of an upright face turned a quarter counter-clockwise
        let image = pattern(80, 80);
        let rolled = [
            Landmark::new(0.5, 0.8),
            Landmark::new(0.8, 0.5),
            Landmark::new(0.5, 0.2),
            Landmark::new(0.2, 0.5),
        ];
        let face = normalise_roll(&image, &rolled, PixelPoint::new(40, 40), 90.0, &nearest()).unwrap();

        // rows [16, 64), columns [16, 64]
        assert_eq!(face.height(), 48);
        assert_eq!(face.width(), 49);
        assert_eq!(face.get_pixel(0, 0), image.get_pixel(16, 64));
    }

    #[test]
    fn collapsed_edges_give_an_empty_crop() {
        let image = pattern(30, 30);
        let flat = [Landmark::new(0.5, 0.5); 4];
        let face = normalise_roll(&image, &flat, PixelPoint::new(15, 15), 12.0, &nearest()).unwrap();
        assert_eq!(face.height(), 0);
    }

    #[test]
    fn empty_face_image_gives_an_empty_crop() {
        let image = RgbImage::new(0, 0);
        let face = normalise_roll(&image, &edges(), PixelPoint::new(0, 0), 30.0, &nearest()).unwrap();
        assert_eq!(face.dimensions(), (0, 0));
    }
}
