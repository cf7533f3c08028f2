//! Drawable surface protocol: lock a pixel buffer, draw, then post it.

use std::path::PathBuf;

use image::{Rgba, RgbaImage};
use tracing::warn;

/// A host-provided output surface.
///
/// `lock_canvas` returns `false` when no buffer can be acquired (surface not
/// ready or already torn down). Every successful lock must be matched by one
/// `unlock_canvas_and_post`; [`LockedCanvas`] enforces that.
pub trait SurfaceHolder {
    fn lock_canvas(&mut self) -> bool;
    /// Back buffer of the currently locked frame.
    fn canvas_mut(&mut self) -> &mut RgbaImage;
    fn unlock_canvas_and_post(&mut self);
    /// Apply a new size reported by the host.
    fn configure(&mut self, width: u32, height: u32);
}

/// Scoped lock on a [`SurfaceHolder`]; posts the frame when dropped.
pub struct LockedCanvas<'a, S: SurfaceHolder + ?Sized> {
    holder: &'a mut S,
}

impl<'a, S: SurfaceHolder + ?Sized> LockedCanvas<'a, S> {
    pub fn acquire(holder: &'a mut S) -> Option<Self> {
        if holder.lock_canvas() {
            Some(Self { holder })
        } else {
            None
        }
    }

    pub fn canvas(&mut self) -> &mut RgbaImage {
        self.holder.canvas_mut()
    }
}

impl<S: SurfaceHolder + ?Sized> Drop for LockedCanvas<'_, S> {
    fn drop(&mut self) {
        self.holder.unlock_canvas_and_post();
    }
}

/// Headless surface backed by an RGBA buffer.
///
/// Posted frames replace `front`; with a snapshot path configured each post
/// is also written out as an image file.
#[derive(Debug)]
pub struct MemorySurface {
    back: RgbaImage,
    front: Option<RgbaImage>,
    locked: bool,
    available: bool,
    presented: u64,
    snapshot: Option<PathBuf>,
}

impl MemorySurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            back: RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255])),
            front: None,
            locked: false,
            available: width > 0 && height > 0,
            presented: 0,
            snapshot: None,
        }
    }

    pub fn with_snapshot(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot = Some(path.into());
        self
    }

    /// Simulate a surface that cannot currently be locked.
    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    pub fn size(&self) -> (u32, u32) {
        self.back.dimensions()
    }

    /// Last posted frame.
    pub fn front(&self) -> Option<&RgbaImage> {
        self.front.as_ref()
    }

    pub fn presented(&self) -> u64 {
        self.presented
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }
}

impl SurfaceHolder for MemorySurface {
    fn lock_canvas(&mut self) -> bool {
        if !self.available || self.locked {
            return false;
        }
        self.locked = true;
        true
    }

    fn canvas_mut(&mut self) -> &mut RgbaImage {
        &mut self.back
    }

    fn unlock_canvas_and_post(&mut self) {
        if !self.locked {
            return;
        }
        self.locked = false;
        self.presented += 1;
        if let Some(path) = &self.snapshot
            && let Err(err) = self.back.save(path)
        {
            warn!(path = %path.display(), "failed to write frame snapshot: {err}");
        }
        self.front = Some(self.back.clone());
    }

    fn configure(&mut self, width: u32, height: u32) {
        if self.back.dimensions() != (width, height) {
            self.back = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255]));
        }
        self.available = width > 0 && height > 0;
    }
}
