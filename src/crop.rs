use image::{imageops, Pixel};
use imageproc::definitions::Image;

use crate::face_detection::BoundingBox;

/// Crop `image` to the rows `[top, bottom)` and the columns `[left, right]`.
///
/// Every bound is first clamped into `[0, dimension - 1]`, so out-of-range
/// bounds never fail: they collapse to a one pixel wide strip or an empty
/// image at the nearest edge. Note the asymmetry: the bottom row is excluded
/// while the right column is included. Callers rely on it.
pub fn safe_crop<P>(image: &Image<P>, top: i32, bottom: i32, left: i32, right: i32) -> Image<P>
where
    P: Pixel + 'static,
{
    let (width, height) = image.dimensions();

    let top = clamp_to_extent(top, height);
    let bottom = clamp_to_extent(bottom, height);
    let left = clamp_to_extent(left, width);
    let right = clamp_to_extent(right, width);

    let rows = bottom.saturating_sub(top);
    let columns = if width == 0 || right < left {
        0
    } else {
        right - left + 1
    };

    imageops::crop_imm(image, left, top, columns, rows).to_image()
}

fn clamp_to_extent(value: i32, extent: u32) -> u32 {
    if extent == 0 {
        return 0;
    }
    value.clamp(0, (extent - 1) as i32) as u32
}

/// Cut the region of a (relative) bounding box out of the full image.
pub fn clip_face<P>(image: &Image<P>, face_box: &BoundingBox) -> Image<P>
where
    P: Pixel + 'static,
{
    let (width, height) = image.dimensions();
    let (width, height) = (width as f64, height as f64);

    let xmin = face_box.xmin as f64;
    let ymin = face_box.ymin as f64;

    // top left and bottom right corners in pixels
    let left = to_pixel(xmin * width);
    let top = to_pixel(ymin * height);
    let right = to_pixel((xmin + face_box.width as f64) * width);
    let bottom = to_pixel((ymin + face_box.height as f64) * height);

    safe_crop(image, top, bottom, left, right)
}

pub(crate) fn to_pixel(value: f64) -> i32 {
    value.round_ties_even() as i32
}
