//! Masked cutouts of detection regions.

use image::RgbImage;

use crate::detect::BoundingBox;
use crate::region::Mask;
use crate::util::{GarmatchError, GarmatchResult};

/// Applies `mask` to `image` and crops the result to the pixel bounds of
/// `bbox`.
///
/// Background pixels come out black. The crop clamps to the image, so a box
/// reaching past the frame yields the intersection and a box fully outside
/// yields an empty image — callers gate on the minimum-size threshold either
/// way. Errors only when the mask dimensions differ from the image.
pub fn masked_crop(
    image: &RgbImage,
    mask: &Mask,
    bbox: &BoundingBox,
) -> GarmatchResult<RgbImage> {
    if mask.width() != image.width() || mask.height() != image.height() {
        return Err(GarmatchError::MaskImageMismatch {
            mask_width: mask.width(),
            mask_height: mask.height(),
            image_width: image.width(),
            image_height: image.height(),
        });
    }

    let (x0, y0, x1, y1) = super::pixel_bounds(bbox, image.width(), image.height());
    let crop_width = x1.saturating_sub(x0);
    let crop_height = y1.saturating_sub(y0);

    let mut out = RgbImage::new(crop_width, crop_height);
    for y in 0..crop_height {
        for x in 0..crop_width {
            let src_x = x0 + x;
            let src_y = y0 + y;
            if mask.get(src_x, src_y) {
                out.put_pixel(x, y, *image.get_pixel(src_x, src_y));
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn solid(width: u32, height: u32, value: u8) -> RgbImage {
        RgbImage::from_pixel(width, height, Rgb([value, value, value]))
    }

    #[test]
    fn background_is_black_and_crop_matches_box() {
        let image = solid(8, 8, 200);
        let bbox = BoundingBox::new(2.0, 2.0, 6.0, 5.0).unwrap();
        // Mask only the left half of the box.
        let half = BoundingBox::new(2.0, 2.0, 4.0, 5.0).unwrap();
        let mask = Mask::from_box(8, 8, &half);

        let cutout = masked_crop(&image, &mask, &bbox).unwrap();
        assert_eq!((cutout.width(), cutout.height()), (4, 3));
        assert_eq!(cutout.get_pixel(0, 0), &Rgb([200, 200, 200]));
        assert_eq!(cutout.get_pixel(3, 0), &Rgb([0, 0, 0]));
    }

    #[test]
    fn out_of_frame_boxes_clamp() {
        let image = solid(4, 4, 10);
        let bbox = BoundingBox::new(2.0, 2.0, 9.0, 9.0).unwrap();
        let mask = Mask::from_box(4, 4, &bbox);
        let cutout = masked_crop(&image, &mask, &bbox).unwrap();
        assert_eq!((cutout.width(), cutout.height()), (2, 2));
    }

    #[test]
    fn mismatched_mask_errors() {
        let image = solid(4, 4, 10);
        let bbox = BoundingBox::new(0.0, 0.0, 2.0, 2.0).unwrap();
        let mask = Mask::from_box(5, 4, &bbox);
        assert!(masked_crop(&image, &mask, &bbox).is_err());
    }
}
