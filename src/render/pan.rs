//! Presents a window of the composite cache at the current scroll offset.

use image::{Rgba, RgbaImage, imageops};
use tracing::{trace, warn};

use crate::events::DrawOutcome;
use crate::processing::compositor::fill_rect;
use crate::processing::resize::resize_region;
use crate::render::surface::{LockedCanvas, SurfaceHolder};

pub const PLACEHOLDER_RADIUS: f32 = 80.0;
pub const PLACEHOLDER_STROKE: f32 = 10.0;

/// Region of the composite buffer shown on the surface, right/bottom exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceRect {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl SourceRect {
    pub const fn width(&self) -> u32 {
        self.right - self.left
    }

    pub const fn height(&self) -> u32 {
        self.bottom - self.top
    }
}

/// Window of a `pan_length`-wide travel at `offset`, sized to the view.
pub fn visible_rect(offset: f32, pan_length: u32, view_w: u32, view_h: u32) -> SourceRect {
    let offset = if offset.is_finite() { offset.clamp(0.0, 1.0) } else { 0.0 };
    let left = (f64::from(offset) * f64::from(pan_length)).round() as u32;
    SourceRect {
        left,
        top: 0,
        right: left + view_w,
        bottom: view_h,
    }
}

/// Colors used when nothing is cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: Rgba<u8>,
    pub marker: Rgba<u8>,
}

/// Draw one frame on `surface`.
///
/// With a buffer the visible window is stretched over the whole canvas;
/// without one the canvas is cleared and a ring marks "no image yet". The
/// surface lock is released and the frame posted on every path.
pub fn render<S: SurfaceHolder + ?Sized>(
    surface: &mut S,
    buffer: Option<&RgbaImage>,
    offset: f32,
    pan_length: u32,
    palette: Palette,
) -> DrawOutcome {
    let Some(mut lock) = LockedCanvas::acquire(surface) else {
        trace!("surface unavailable; frame skipped");
        return DrawOutcome::Skipped;
    };
    let canvas = lock.canvas();
    match buffer {
        Some(buffer) => {
            let rect = visible_rect(offset, pan_length, canvas.width(), canvas.height());
            draw_window(canvas, buffer, rect, palette.background);
            DrawOutcome::Image(rect)
        }
        None => {
            draw_placeholder(canvas, palette);
            DrawOutcome::Placeholder
        }
    }
}

fn draw_window(canvas: &mut RgbaImage, buffer: &RgbaImage, rect: SourceRect, background: Rgba<u8>) {
    let (cw, ch) = canvas.dimensions();
    if cw == 0 || ch == 0 {
        return;
    }
    // Only the part of the window that overlaps the buffer has pixels.
    let left = rect.left.min(buffer.width());
    let top = rect.top.min(buffer.height());
    let right = rect.right.min(buffer.width());
    let bottom = rect.bottom.min(buffer.height());
    if right <= left || bottom <= top {
        fill_rect(canvas, 0, 0, cw, ch, background);
        return;
    }

    let dst_w = (u64::from(right - left) * u64::from(cw) / u64::from(rect.width())) as u32;
    let dst_h = (u64::from(bottom - top) * u64::from(ch) / u64::from(rect.height())) as u32;
    if dst_w < cw || dst_h < ch {
        fill_rect(canvas, 0, 0, cw, ch, background);
    }
    if (right - left, bottom - top) == (dst_w, dst_h) {
        let window = imageops::crop_imm(buffer, left, top, dst_w, dst_h).to_image();
        imageops::replace(canvas, &window, 0, 0);
        return;
    }
    let window = (left, top, right - left, bottom - top);
    match resize_region(buffer, Some(window), dst_w.max(1), dst_h.max(1)) {
        Ok(scaled) => imageops::replace(canvas, &scaled, 0, 0),
        Err(err) => {
            warn!("failed to stretch cached window: {err:#}");
            fill_rect(canvas, 0, 0, cw, ch, background);
        }
    }
}

/// Clear `canvas` and draw a centered ring.
pub fn draw_placeholder(canvas: &mut RgbaImage, palette: Palette) {
    let (w, h) = canvas.dimensions();
    fill_rect(canvas, 0, 0, w, h, palette.background);

    let cx = w as f32 / 2.0;
    let cy = h as f32 / 2.0;
    let outer = PLACEHOLDER_RADIUS + PLACEHOLDER_STROKE / 2.0;
    let inner = PLACEHOLDER_RADIUS - PLACEHOLDER_STROKE / 2.0;
    let x0 = (cx - outer).floor().max(0.0) as u32;
    let y0 = (cy - outer).floor().max(0.0) as u32;
    let x1 = ((cx + outer).ceil() as u32).min(w);
    let y1 = ((cy + outer).ceil() as u32).min(h);
    for y in y0..y1 {
        for x in x0..x1 {
            let dx = x as f32 + 0.5 - cx;
            let dy = y as f32 + 0.5 - cy;
            let d = (dx * dx + dy * dy).sqrt();
            if d >= inner && d <= outer {
                canvas.put_pixel(x, y, palette.marker);
            }
        }
    }
}
