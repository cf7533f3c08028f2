/// Integer rectangle in pixel space. Edges may fall outside the image it
/// addresses; consumers clip at draw time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub left: i64,
    pub top: i64,
    pub right: i64,
    pub bottom: i64,
}

impl CropRect {
    pub fn width(&self) -> i64 {
        self.right - self.left
    }

    pub fn height(&self) -> i64 {
        self.bottom - self.top
    }
}

/// Integer downsample factor applied while decoding a `native_*` image for a
/// `target_*` viewport.
///
/// When the source is relatively wider than the target, the height is the
/// dimension that must still cover the viewport, so the height ratio wins;
/// otherwise the width ratio does. The ratio is truncated so the decoded
/// image never falls below the target on that dimension.
pub fn sample_factor(native_w: u32, native_h: u32, target_w: u32, target_h: u32) -> u32 {
    let nw = native_w.max(1);
    let nh = native_h.max(1);
    let tw = target_w.max(1);
    let th = target_h.max(1);

    let native_ratio = nw as f32 / nh as f32;
    let target_ratio = tw as f32 / th as f32;
    let factor = if native_ratio < target_ratio {
        nw / tw
    } else {
        nh / th
    };
    factor.max(1)
}

/// Largest power of two not exceeding `factor` (decoders sample in powers of two).
pub fn power_of_two_floor(factor: u32) -> u32 {
    let factor = factor.max(1);
    1 << (u32::BITS - 1 - factor.leading_zeros())
}

/// Source scale for a crop-to-fill of an `img_*` image onto a `tile_*` tile.
///
/// The result is the number of source pixels per tile pixel. Images smaller
/// than the tile are never stretched up (scale 1).
pub fn fill_scale(img_w: u32, img_h: u32, tile_w: u32, tile_h: u32) -> f32 {
    let img_ratio = img_w as f32 / img_h.max(1) as f32;
    let tile_ratio = tile_w as f32 / tile_h.max(1) as f32;
    if img_ratio > tile_ratio && img_h > tile_h {
        img_h as f32 / tile_h.max(1) as f32
    } else if img_w > tile_w {
        img_w as f32 / tile_w.max(1) as f32
    } else {
        1.0
    }
}

/// Centered source rectangle that, scaled by [`fill_scale`], covers one tile.
pub fn fill_crop(img_w: u32, img_h: u32, tile_w: u32, tile_h: u32) -> CropRect {
    let scale = fill_scale(img_w, img_h, tile_w, tile_h);
    let half_w = (tile_w as f32 * scale / 2.0).round() as i64;
    let half_h = (tile_h as f32 * scale / 2.0).round() as i64;
    let cx = i64::from(img_w / 2);
    let cy = i64::from(img_h / 2);
    CropRect {
        left: cx - half_w,
        top: cy - half_h,
        right: cx + half_w,
        bottom: cy + half_h,
    }
}

/// Size of an `img_*` image scaled so its shorter side (relative to the
/// screen aspect) matches the screen exactly. May upscale.
pub fn scale_to_screen(img_w: u32, img_h: u32, screen_w: u32, screen_h: u32) -> (u32, u32) {
    let iw = img_w.max(1) as f32;
    let ih = img_h.max(1) as f32;
    let img_ratio = iw / ih;
    let screen_ratio = screen_w.max(1) as f32 / screen_h.max(1) as f32;
    let scale = if img_ratio > screen_ratio {
        screen_h.max(1) as f32 / ih
    } else {
        screen_w.max(1) as f32 / iw
    };
    let w = (iw * scale).round().max(1.0);
    let h = (ih * scale).round().max(1.0);
    (w as u32, h as u32)
}

pub fn center_offset(inner_w: u32, inner_h: u32, outer_w: u32, outer_h: u32) -> (u32, u32) {
    let ox = outer_w.saturating_sub(inner_w) / 2;
    let oy = outer_h.saturating_sub(inner_h) / 2;
    (ox, oy)
}
