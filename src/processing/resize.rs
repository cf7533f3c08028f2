use anyhow::{Context, Result, ensure};
use fast_image_resize as fir;
use image::RgbaImage;

/// Source window in pixels: `(left, top, width, height)`.
pub type Region = (u32, u32, u32, u32);

/// Resample `source` to exactly `target_w` x `target_h`.
pub fn resize_rgba(source: &RgbaImage, target_w: u32, target_h: u32) -> Result<RgbaImage> {
    resize_region(source, None, target_w, target_h)
}

/// Resample the `region` of `source` (all of it when `None`) to
/// `target_w` x `target_h` without copying the region out first.
///
/// Pixels are treated as opaque; the wallpaper never carries transparency.
pub fn resize_region(
    source: &RgbaImage,
    region: Option<Region>,
    target_w: u32,
    target_h: u32,
) -> Result<RgbaImage> {
    ensure!(target_w > 0 && target_h > 0, "resize dimensions must be positive");
    let (left, top, width, height) = region.unwrap_or((0, 0, source.width(), source.height()));
    ensure!(
        width > 0
            && height > 0
            && left.saturating_add(width) <= source.width()
            && top.saturating_add(height) <= source.height(),
        "resize region {width}x{height}+{left}+{top} is outside the {}x{} source",
        source.width(),
        source.height()
    );
    if region.is_none() && source.dimensions() == (target_w, target_h) {
        return Ok(source.clone());
    }

    let view = fir::images::ImageRef::new(
        source.width(),
        source.height(),
        source.as_raw(),
        fir::PixelType::U8x4,
    )
    .context("source buffer does not match its dimensions")?;
    let mut out = fir::images::Image::new(target_w, target_h, fir::PixelType::U8x4);
    let options = fir::ResizeOptions::new()
        .resize_alg(fir::ResizeAlg::Convolution(fir::FilterType::Bilinear))
        .use_alpha(false)
        .crop(
            f64::from(left),
            f64::from(top),
            f64::from(width),
            f64::from(height),
        );
    fir::Resizer::new()
        .resize(&view, &mut out, Some(&options))
        .context("resample failed")?;
    RgbaImage::from_raw(target_w, target_h, out.into_vec())
        .context("resampled buffer does not match its dimensions")
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn close(p: &Rgba<u8>, want: [u8; 4]) -> bool {
        p.0.iter().zip(want).all(|(got, want)| got.abs_diff(want) <= 1)
    }

    #[test]
    fn resize_keeps_flat_color() {
        let src = RgbaImage::from_pixel(40, 20, Rgba([10, 200, 30, 255]));
        let out = resize_rgba(&src, 7, 3).unwrap();
        assert_eq!(out.dimensions(), (7, 3));
        assert!(out.pixels().all(|p| close(p, [10, 200, 30, 255])));
    }

    #[test]
    fn region_is_sampled_in_place() {
        // Left half red, right half blue; sampling only the right half.
        let src = RgbaImage::from_fn(20, 10, |x, _| {
            if x < 10 {
                Rgba([250, 0, 0, 255])
            } else {
                Rgba([0, 0, 250, 255])
            }
        });
        let out = resize_region(&src, Some((10, 0, 10, 10)), 5, 5).unwrap();
        assert!(out.pixels().all(|p| close(p, [0, 0, 250, 255])), "{:?}", out.get_pixel(0, 0));
    }

    #[test]
    fn resize_rejects_bad_requests() {
        let src = RgbaImage::new(4, 4);
        assert!(resize_rgba(&src, 0, 4).is_err());
        assert!(resize_region(&src, Some((2, 0, 3, 4)), 2, 2).is_err());
        assert!(resize_region(&src, Some((0, 0, 0, 4)), 2, 2).is_err());
    }
}
