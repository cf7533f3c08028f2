//! The wide offscreen buffer panned across all virtual screens.

use std::path::Path;

use image::{Rgba, RgbaImage};
use tracing::{debug, warn};

use crate::cursor::CandidateList;
use crate::error::Error;
use crate::processing::compositor::{composite_tile, fill_rect, letterbox};
use crate::processing::decode::load_scaled;
use crate::processing::layout::scale_to_screen;
use crate::processing::resize::resize_rgba;

/// How the buffer is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheLayout {
    /// `tile_count` crop-to-fill tiles side by side.
    Tiled,
    /// One image scaled to the screen and centered.
    Single,
}

/// Result of a full tiled rebuild.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RebuildReport {
    pub composed: u32,
    pub failed: u32,
}

#[derive(Debug)]
pub struct CompositeCache {
    buffer: Option<RgbaImage>,
    layout: CacheLayout,
    tile_width: u32,
    tile_height: u32,
    tile_count: u32,
    populated: bool,
}

impl Default for CompositeCache {
    fn default() -> Self {
        Self::new()
    }
}

impl CompositeCache {
    pub const fn new() -> Self {
        Self {
            buffer: None,
            layout: CacheLayout::Tiled,
            tile_width: 0,
            tile_height: 0,
            tile_count: 0,
            populated: false,
        }
    }

    /// Drop the buffer; the next render shows the placeholder.
    pub fn invalidate(&mut self) {
        self.buffer = None;
        self.populated = false;
    }

    pub const fn is_populated(&self) -> bool {
        self.populated
    }

    pub const fn layout(&self) -> CacheLayout {
        self.layout
    }

    pub const fn tile_width(&self) -> u32 {
        self.tile_width
    }

    pub const fn tile_height(&self) -> u32 {
        self.tile_height
    }

    pub const fn tile_count(&self) -> u32 {
        self.tile_count
    }

    /// Whether a tiled buffer already exists for this geometry.
    pub fn matches(&self, tile_count: u32, tile_w: u32, tile_h: u32) -> bool {
        self.layout == CacheLayout::Tiled
            && self.buffer.is_some()
            && self.tile_count == tile_count
            && self.tile_width == tile_w
            && self.tile_height == tile_h
    }

    /// The composite buffer, only while it holds a complete frame.
    pub fn current_buffer(&self) -> Option<&RgbaImage> {
        if self.populated {
            self.buffer.as_ref()
        } else {
            None
        }
    }

    /// Distance in pixels the view can travel across the buffer.
    pub fn pan_length(&self) -> u32 {
        match self.layout {
            CacheLayout::Tiled if self.populated => {
                self.tile_count.saturating_sub(1).saturating_mul(self.tile_width)
            }
            _ => 0,
        }
    }

    /// Allocate a fresh `tile_w * tile_count` x `tile_h` buffer and composite
    /// every tile, drawing successive candidates round-robin.
    ///
    /// A tile whose image fails to load stays `background`; the rebuild
    /// continues with the next tile. The cache is populated once at least one
    /// tile holds an image.
    pub fn rebuild_all(
        &mut self,
        candidates: &mut CandidateList,
        tile_count: u32,
        tile_w: u32,
        tile_h: u32,
        background: Rgba<u8>,
    ) -> RebuildReport {
        self.invalidate();
        self.layout = CacheLayout::Tiled;
        self.tile_count = tile_count;
        self.tile_width = tile_w;
        self.tile_height = tile_h;
        let mut report = RebuildReport::default();
        if candidates.is_empty() || tile_count == 0 || tile_w == 0 || tile_h == 0 {
            return report;
        }

        let Some(width) = tile_w.checked_mul(tile_count) else {
            warn!(tile_w, tile_count, "composite buffer too wide; cache left empty");
            return report;
        };
        let mut canvas = RgbaImage::from_pixel(width, tile_h, background);
        for tile in 0..tile_count {
            if draw_tile(&mut canvas, candidates, tile, tile_w, tile_h, background) {
                report.composed += 1;
            } else {
                report.failed += 1;
            }
        }
        self.buffer = Some(canvas);
        self.populated = report.composed > 0;
        report
    }

    /// Re-composite tile `index` in place with the next candidate.
    ///
    /// No-op (returns `false`) when no tiled buffer exists or the index is out
    /// of range.
    pub fn refresh_tile(
        &mut self,
        index: u32,
        candidates: &mut CandidateList,
        background: Rgba<u8>,
    ) -> bool {
        if self.layout != CacheLayout::Tiled || index >= self.tile_count {
            return false;
        }
        let (tile_w, tile_h) = (self.tile_width, self.tile_height);
        let Some(canvas) = self.buffer.as_mut() else {
            return false;
        };
        if candidates.is_empty() {
            return false;
        }
        let ok = draw_tile(canvas, candidates, index, tile_w, tile_h, background);
        self.populated |= ok;
        ok
    }

    /// Replace the buffer with a single image scaled to the screen.
    ///
    /// The image is scaled so it covers the screen on its tighter axis and
    /// centered on a buffer sized to the larger of screen and scaled image.
    ///
    /// # Errors
    /// Returns [`Error::Decode`] if the image cannot be loaded; the cache is
    /// left unpopulated.
    pub fn load_single(
        &mut self,
        path: &Path,
        screen_w: u32,
        screen_h: u32,
        background: Rgba<u8>,
    ) -> Result<(), Error> {
        self.invalidate();
        self.layout = CacheLayout::Single;
        self.tile_count = 1;
        self.tile_width = screen_w;
        self.tile_height = screen_h;

        let decoded = load_scaled(path, screen_w, screen_h)?;
        let (scaled_w, scaled_h) =
            scale_to_screen(decoded.width(), decoded.height(), screen_w, screen_h);
        let scaled =
            resize_rgba(&decoded.pixels, scaled_w, scaled_h).map_err(|err| Error::decode(path, err))?;
        let canvas = letterbox(&scaled, screen_w, screen_h, background);
        debug!(
            path = %path.display(),
            width = canvas.width(),
            height = canvas.height(),
            "single image cached"
        );
        self.buffer = Some(canvas);
        self.populated = true;
        Ok(())
    }
}

fn draw_tile(
    canvas: &mut RgbaImage,
    candidates: &mut CandidateList,
    tile: u32,
    tile_w: u32,
    tile_h: u32,
    background: Rgba<u8>,
) -> bool {
    let Some((image_index, path)) = candidates.advance() else {
        return false;
    };
    let decoded = match load_scaled(path, tile_w, tile_h) {
        Ok(decoded) => decoded,
        Err(err) => {
            warn!(tile, image_index, "tile left blank: {err}");
            fill_rect(canvas, tile * tile_w, 0, tile_w, tile_h, background);
            return false;
        }
    };
    match composite_tile(canvas, tile, &decoded.pixels, tile_w, tile_h, background) {
        Ok(crop) => {
            debug!(
                tile,
                image_index,
                path = %decoded.path.display(),
                crop = ?crop,
                "tile composited"
            );
            true
        }
        Err(err) => {
            warn!(tile, image_index, "tile composite failed: {err:#}");
            false
        }
    }
}
