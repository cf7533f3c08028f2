use crate::config::{Configuration, SettingKey};

/// Notifications delivered by the host shell and the settings store.
#[derive(Debug, Clone)]
pub enum HostEvent {
    VisibilityChanged(bool),
    SurfaceChanged { width: u32, height: u32 },
    SurfaceDestroyed,
    /// Horizontal scroll offset in `[0, 1]` across all virtual screens.
    OffsetsChanged(f32),
    SettingChanged {
        key: SettingKey,
        config: Configuration,
    },
}

/// What a single draw request ended up putting on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawOutcome {
    /// The surface could not be locked; the frame was skipped.
    Skipped,
    /// No cache yet; the placeholder marker was drawn.
    Placeholder,
    /// A window of the composite cache was presented.
    Image(crate::render::pan::SourceRect),
}
