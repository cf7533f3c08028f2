use anyhow::{Context, Result};
use image::{Rgba, RgbaImage, imageops};

use crate::processing::layout::{CropRect, center_offset, fill_crop};
use crate::processing::resize::resize_region;

/// Paint an axis-aligned block of `canvas`, clipped to its bounds.
pub fn fill_rect(canvas: &mut RgbaImage, x: u32, y: u32, w: u32, h: u32, color: Rgba<u8>) {
    let x_end = x.saturating_add(w).min(canvas.width());
    let y_end = y.saturating_add(h).min(canvas.height());
    for py in y.min(y_end)..y_end {
        for px in x.min(x_end)..x_end {
            canvas.put_pixel(px, py, color);
        }
    }
}

/// Draw `image` crop-to-fill into tile `tile_index` of a wide `canvas`.
///
/// The tile is first painted with `background`, then the centered crop from
/// [`fill_crop`] is resampled onto it. Parts of the crop that fall outside the
/// image stay background. Returns the crop used, in image coordinates.
pub fn composite_tile(
    canvas: &mut RgbaImage,
    tile_index: u32,
    image: &RgbaImage,
    tile_w: u32,
    tile_h: u32,
    background: Rgba<u8>,
) -> Result<CropRect> {
    let origin_x = tile_index
        .checked_mul(tile_w)
        .context("tile origin exceeds canvas range")?;
    fill_rect(canvas, origin_x, 0, tile_w, tile_h, background);

    let (img_w, img_h) = image.dimensions();
    let crop = fill_crop(img_w, img_h, tile_w, tile_h);
    if crop.width() <= 0 || crop.height() <= 0 {
        return Ok(crop);
    }

    // Source pixels per tile pixel on each axis.
    let sx = crop.width() as f64 / f64::from(tile_w);
    let sy = crop.height() as f64 / f64::from(tile_h);

    let left = crop.left.max(0);
    let top = crop.top.max(0);
    let right = crop.right.min(i64::from(img_w));
    let bottom = crop.bottom.min(i64::from(img_h));
    if left >= right || top >= bottom {
        return Ok(crop);
    }

    let to_tile_x = |v: i64| (((v - crop.left) as f64 / sx).round() as i64).clamp(0, i64::from(tile_w));
    let to_tile_y = |v: i64| (((v - crop.top) as f64 / sy).round() as i64).clamp(0, i64::from(tile_h));
    let (dx0, dx1) = (to_tile_x(left), to_tile_x(right));
    let (dy0, dy1) = (to_tile_y(top), to_tile_y(bottom));
    if dx1 <= dx0 || dy1 <= dy0 {
        return Ok(crop);
    }

    let visible = (
        left as u32,
        top as u32,
        (right - left) as u32,
        (bottom - top) as u32,
    );
    let scaled = resize_region(image, Some(visible), (dx1 - dx0) as u32, (dy1 - dy0) as u32)?;
    imageops::overlay(canvas, &scaled, i64::from(origin_x) + dx0, dy0);
    Ok(crop)
}

/// Draw `image` unscaled and centered on a fresh canvas at least as large as
/// both the image and `min_w` x `min_h`.
pub fn letterbox(image: &RgbaImage, min_w: u32, min_h: u32, background: Rgba<u8>) -> RgbaImage {
    let width = min_w.max(image.width());
    let height = min_h.max(image.height());
    let mut canvas = RgbaImage::from_pixel(width, height, background);
    let (ox, oy) = center_offset(image.width(), image.height(), width, height);
    imageops::overlay(&mut canvas, image, i64::from(ox), i64::from(oy));
    canvas
}
