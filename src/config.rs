use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Result, ensure};
use serde::Deserialize;
use serde::de::{self, Deserializer, Visitor};

/// Upper bound on virtual screens; launchers expose far fewer pages.
pub const MAX_SCREEN_COUNT: u32 = 64;

/// Settings snapshot consumed by the engine.
///
/// Field names match the keys written by the settings store, so a YAML
/// document produced by the host maps one-to-one onto this struct.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Selected photo. In multi mode its parent directory is the image pool.
    pub image_filepath: String,
    /// Rotate through every image next to `image_filepath`.
    pub enable_multi: bool,
    /// Give each virtual screen its own tile instead of one panned image.
    pub enable_per_screen: bool,
    /// Delay between rotation ticks. Accepts `"60"`, `60` or `"2m"`.
    #[serde(deserialize_with = "deserialize_rotation_time")]
    pub multi_rotation_time: Duration,
    /// Number of virtual screens spanned by the composite cache.
    pub screen_count: u32,
    /// Fill color behind every tile and around letterboxed images.
    pub background_color: [u8; 3],
    /// Stroke color of the "no image yet" marker.
    pub placeholder_color: [u8; 3],
}

impl Configuration {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let s = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&s)?)
    }

    /// Validate runtime invariants that cannot be expressed via serde defaults alone.
    pub fn validated(self) -> Result<Self> {
        ensure!(self.screen_count > 0, "screen_count must be greater than zero");
        ensure!(
            self.screen_count <= MAX_SCREEN_COUNT,
            "screen_count must be at most {MAX_SCREEN_COUNT}"
        );
        ensure!(
            !self.multi_rotation_time.is_zero(),
            "multi_rotation_time must be greater than zero"
        );
        Ok(self)
    }

    /// Configured source path with any `file://` prefix removed.
    pub fn source_path(&self) -> PathBuf {
        let raw = self.image_filepath.trim();
        PathBuf::from(raw.strip_prefix("file://").unwrap_or(raw))
    }

    /// Keys whose values differ between two snapshots, in declaration order.
    pub fn changed_keys(old: &Self, new: &Self) -> Vec<SettingKey> {
        let mut keys = Vec::new();
        if old.image_filepath != new.image_filepath {
            keys.push(SettingKey::ImageFilepath);
        }
        if old.enable_multi != new.enable_multi {
            keys.push(SettingKey::EnableMulti);
        }
        if old.enable_per_screen != new.enable_per_screen {
            keys.push(SettingKey::EnablePerScreen);
        }
        if old.multi_rotation_time != new.multi_rotation_time {
            keys.push(SettingKey::MultiRotationTime);
        }
        if old.screen_count != new.screen_count {
            keys.push(SettingKey::ScreenCount);
        }
        if old.background_color != new.background_color
            || old.placeholder_color != new.placeholder_color
        {
            keys.push(SettingKey::Colors);
        }
        keys
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            image_filepath: String::new(),
            enable_multi: true,
            enable_per_screen: true,
            multi_rotation_time: Duration::from_secs(60),
            screen_count: 5,
            background_color: [0, 0, 0],
            placeholder_color: [255, 255, 255],
        }
    }
}

/// Name of a setting carried by a change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    ImageFilepath,
    EnableMulti,
    EnablePerScreen,
    MultiRotationTime,
    ScreenCount,
    Colors,
}

impl SettingKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ImageFilepath => "image_filepath",
            Self::EnableMulti => "enable_multi",
            Self::EnablePerScreen => "enable_per_screen",
            Self::MultiRotationTime => "multi_rotation_time",
            Self::ScreenCount => "screen_count",
            Self::Colors => "colors",
        }
    }

    /// Whether a change to this key invalidates the candidate list and cache.
    pub fn requires_rebuild(&self) -> bool {
        matches!(
            self,
            Self::ImageFilepath | Self::EnableMulti | Self::EnablePerScreen | Self::ScreenCount
        )
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a rotation interval as integer seconds, falling back to humantime.
pub fn parse_rotation_time(raw: &str) -> Result<Duration> {
    let raw = raw.trim();
    if let Ok(secs) = raw.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }
    humantime::parse_duration(raw)
        .map_err(|err| anyhow::anyhow!("invalid multi_rotation_time '{raw}': {err}"))
}

fn deserialize_rotation_time<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    struct RotationTimeVisitor;

    impl<'de> Visitor<'de> for RotationTimeVisitor {
        type Value = Duration;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("integer seconds or a duration string such as \"60\" or \"2m\"")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Duration, E> {
            Ok(Duration::from_secs(v))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Duration, E> {
            u64::try_from(v)
                .map(Duration::from_secs)
                .map_err(|_| E::custom("multi_rotation_time must not be negative"))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Duration, E> {
            parse_rotation_time(v).map_err(E::custom)
        }
    }

    deserializer.deserialize_any(RotationTimeVisitor)
}
