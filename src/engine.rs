//! Wallpaper controller: reacts to host and settings events, owns the cache,
//! and decides when to rebuild, rotate and draw.
//!
//! Every method runs on the wallpaper task's single loop, so a draw never
//! observes a half-built cache. Time is passed in explicitly to keep the
//! state machine deterministic under test.

use image::Rgba;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::cache::{CacheLayout, CompositeCache};
use crate::config::{Configuration, MAX_SCREEN_COUNT, SettingKey};
use crate::cursor::{CandidateList, RoundRobin};
use crate::events::{DrawOutcome, HostEvent};
use crate::render::pan::{self, Palette};
use crate::render::surface::SurfaceHolder;
use crate::schedule::{RotationState, Timers};
use crate::sources;

/// Counters for diagnostics and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub searches: u64,
    pub rebuilds: u64,
    pub tile_refreshes: u64,
    pub image_reloads: u64,
    pub frames: u64,
    pub placeholders: u64,
}

#[derive(Debug)]
pub struct Engine {
    cfg: Configuration,
    surface: Option<(u32, u32)>,
    visible: bool,
    searched: bool,
    candidates: CandidateList,
    tiles: RoundRobin,
    cache: CompositeCache,
    offset: f32,
    timers: Timers,
    stats: EngineStats,
}

impl Engine {
    pub fn new(cfg: Configuration) -> Self {
        Self {
            cfg,
            surface: None,
            visible: false,
            searched: false,
            candidates: CandidateList::default(),
            tiles: RoundRobin::default(),
            cache: CompositeCache::new(),
            offset: 0.0,
            timers: Timers::new(),
            stats: EngineStats::default(),
        }
    }

    pub fn config(&self) -> &Configuration {
        &self.cfg
    }

    pub fn cache(&self) -> &CompositeCache {
        &self.cache
    }

    pub fn candidates(&self) -> &CandidateList {
        &self.candidates
    }

    /// Tile the next per-screen rotation refreshes.
    pub fn next_tile(&self) -> usize {
        self.tiles.position()
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn offset(&self) -> f32 {
        self.offset
    }

    pub fn rotation(&self) -> RotationState {
        self.timers.rotation()
    }

    pub fn rotation_deadline(&self) -> Option<Instant> {
        self.timers.rotation_deadline()
    }

    pub fn draw_requested(&self) -> bool {
        self.timers.draw_pending()
    }

    /// Consume the pending draw request.
    pub fn take_draw_request(&mut self) -> bool {
        self.timers.take_draw()
    }

    /// Horizontal travel across the cache; zero outside per-screen mode.
    pub fn pan_length(&self) -> u32 {
        if self.cache.layout() == CacheLayout::Tiled {
            self.cache.pan_length()
        } else {
            0
        }
    }

    pub fn handle(&mut self, event: HostEvent, now: Instant) {
        match event {
            HostEvent::VisibilityChanged(visible) => self.on_visibility_changed(visible, now),
            HostEvent::SurfaceChanged { width, height } => {
                self.on_surface_changed(width, height, now);
            }
            HostEvent::SurfaceDestroyed => self.on_surface_destroyed(),
            HostEvent::OffsetsChanged(offset) => self.on_offsets_changed(offset),
            HostEvent::SettingChanged { key, config } => self.on_setting_changed(key, config, now),
        }
    }

    pub fn on_visibility_changed(&mut self, visible: bool, now: Instant) {
        self.visible = visible;
        if visible {
            self.timers.post_draw();
            self.keep_rotation_armed(now);
        } else {
            self.timers.cancel_all();
        }
        debug!(visible, rotation = ?self.timers.rotation(), "visibility changed");
    }

    pub fn on_surface_changed(&mut self, width: u32, height: u32, now: Instant) {
        let resized = self.surface != Some((width, height));
        self.surface = Some((width, height));
        if !self.searched {
            self.search();
            self.rebuild_cache();
        } else if resized {
            info!(width, height, "surface resized; rebuilding cache");
            self.rebuild_cache();
        }
        self.keep_rotation_armed(now);
        self.request_draw();
    }

    pub fn on_surface_destroyed(&mut self) {
        self.surface = None;
        self.timers.cancel_all();
        self.cache.invalidate();
        debug!("surface destroyed");
    }

    pub fn on_offsets_changed(&mut self, offset: f32) {
        self.offset = if offset.is_finite() {
            offset.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.request_draw();
    }

    /// Apply a new settings snapshot in which `key` changed.
    ///
    /// Source and layout keys cancel the pending rotation, then search and
    /// rebuild synchronously before the timer is re-armed.
    pub fn on_setting_changed(&mut self, key: SettingKey, cfg: Configuration, now: Instant) {
        self.cfg = cfg;
        info!(%key, "setting changed");
        match key {
            key if key.requires_rebuild() => {
                self.timers.cancel_rotation();
                self.search();
                self.rebuild_cache();
                self.arm_rotation(now);
            }
            SettingKey::MultiRotationTime => {
                if self.timers.rotation_deadline().is_some() {
                    self.arm_rotation(now);
                }
            }
            _ => {
                self.rebuild_cache();
            }
        }
        self.request_draw();
    }

    /// Run the rotation tick if its deadline has passed. Returns whether a
    /// tick ran.
    pub fn on_rotation_due(&mut self, now: Instant) -> bool {
        if !self.timers.rotation_due(now) {
            return false;
        }
        self.timers.cancel_rotation();
        self.rotate();
        self.arm_rotation(now);
        self.request_draw();
        true
    }

    /// Render the current frame onto `surface`.
    pub fn draw<S: SurfaceHolder + ?Sized>(&mut self, surface: &mut S) -> DrawOutcome {
        let palette = Palette {
            background: rgba(self.cfg.background_color),
            marker: rgba(self.cfg.placeholder_color),
        };
        let outcome = pan::render(
            surface,
            self.cache.current_buffer(),
            self.offset,
            self.pan_length(),
            palette,
        );
        match outcome {
            DrawOutcome::Skipped => {}
            DrawOutcome::Placeholder => {
                self.stats.frames += 1;
                self.stats.placeholders += 1;
            }
            DrawOutcome::Image(_) => self.stats.frames += 1,
        }
        outcome
    }

    fn request_draw(&mut self) {
        if self.visible {
            self.timers.post_draw();
        }
    }

    fn rotation_eligible(&self) -> bool {
        self.visible
            && self.surface.is_some()
            && self.cfg.enable_multi
            && self.candidates.len() > 1
    }

    fn arm_rotation(&mut self, now: Instant) {
        if self.rotation_eligible() {
            self.timers.arm_rotation(now, self.cfg.multi_rotation_time);
        } else {
            self.timers.cancel_rotation();
        }
    }

    /// Arm the rotation only if none is pending, so repeated host
    /// notifications do not push an existing deadline back.
    fn keep_rotation_armed(&mut self, now: Instant) {
        if !self.rotation_eligible() {
            self.timers.cancel_rotation();
        } else if self.timers.rotation() == RotationState::Idle {
            self.timers.arm_rotation(now, self.cfg.multi_rotation_time);
        }
    }

    fn search(&mut self) {
        self.searched = true;
        self.stats.searches += 1;
        let path = self.cfg.source_path();
        match sources::enumerate(&path, self.cfg.enable_multi) {
            Ok(found) => {
                info!(count = found.len(), path = %path.display(), "image candidates found");
                self.candidates = CandidateList::from_vec(found);
            }
            Err(err) => {
                warn!("image search failed: {err}");
                self.candidates.clear();
            }
        }
    }

    fn rebuild_cache(&mut self) {
        let Some((width, height)) = self.surface else {
            self.cache.invalidate();
            return;
        };
        self.stats.rebuilds += 1;
        let background = rgba(self.cfg.background_color);
        if self.cfg.enable_per_screen {
            let count = self.cfg.screen_count.clamp(1, MAX_SCREEN_COUNT);
            self.tiles.reset(count as usize);
            let report = self
                .cache
                .rebuild_all(&mut self.candidates, count, width, height, background);
            info!(
                composed = report.composed,
                failed = report.failed,
                tiles = count,
                "composite cache rebuilt"
            );
        } else {
            self.tiles.reset(0);
            self.reload_single(width, height, background);
        }
    }

    fn rotate(&mut self) {
        let background = rgba(self.cfg.background_color);
        if self.cfg.enable_per_screen {
            let Some(tile) = self.tiles.next() else {
                return;
            };
            let refreshed = self
                .cache
                .refresh_tile(tile as u32, &mut self.candidates, background);
            self.stats.tile_refreshes += 1;
            debug!(tile, refreshed, "rotated tile");
        } else if let Some((width, height)) = self.surface {
            self.reload_single(width, height, background);
            self.stats.image_reloads += 1;
        }
    }

    fn reload_single(&mut self, width: u32, height: u32, background: Rgba<u8>) {
        let Some((index, path)) = self.candidates.advance() else {
            self.cache.invalidate();
            return;
        };
        let path = path.to_path_buf();
        match self.cache.load_single(&path, width, height, background) {
            Ok(()) => debug!(index, path = %path.display(), "single image loaded"),
            Err(err) => warn!("single image load failed: {err}"),
        }
    }
}

fn rgba([r, g, b]: [u8; 3]) -> Rgba<u8> {
    Rgba([r, g, b, 255])
}
