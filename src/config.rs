//! Gallery configuration with environment overrides.
//!
//! Every value has a default; `GALLERIA_*` variables override them. Values
//! that fail to parse are ignored and the default is kept.

use std::time::Duration;

use tracing::warn;

use crate::carousel::CarouselConfig;
use crate::layout::{ColumnBreakpoints, ColumnCount, LayoutMode, DEFAULT_TARGET_HEIGHT};
use crate::scheduler::SchedulerConfig;

const DEFAULT_GAP_PX: f32 = 8.0;

/// Geometry settings handed to the layout engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutSettings {
    pub gap_px: f32,
    pub mode: LayoutMode,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            gap_px: DEFAULT_GAP_PX,
            mode: LayoutMode::Justified {
                target_row_height: DEFAULT_TARGET_HEIGHT,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GalleryConfig {
    pub layout: LayoutSettings,
    pub scheduler: SchedulerConfig,
    pub carousel: CarouselConfig,
}

impl GalleryConfig {
    /// Defaults with `GALLERIA_*` environment overrides applied.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(gap) = env_number::<f32>(&lookup, "GALLERIA_GAP_PX").filter(|v| *v >= 0.0) {
            config.layout.gap_px = gap;
        }

        let row_height = env_number::<f32>(&lookup, "GALLERIA_ROW_HEIGHT").filter(|v| *v > 0.0);
        let columns = env_number::<u32>(&lookup, "GALLERIA_COLUMNS").filter(|v| *v > 0);
        let mode = lookup("GALLERIA_MODE").map(|v| v.trim().to_ascii_lowercase());
        config.layout.mode = match (mode.as_deref(), columns) {
            (Some("masonry"), Some(count)) | (None, Some(count)) => LayoutMode::Masonry {
                columns: ColumnCount::Fixed(count),
            },
            (Some("masonry"), None) => LayoutMode::Masonry {
                columns: ColumnCount::Responsive(ColumnBreakpoints::default()),
            },
            _ => LayoutMode::Justified {
                target_row_height: row_height.unwrap_or(DEFAULT_TARGET_HEIGHT),
            },
        };

        if let Some(ms) = env_number::<u64>(&lookup, "GALLERIA_DEBOUNCE_MS") {
            config.scheduler.debounce = Duration::from_millis(ms);
        }
        if let Some(ms) = env_number::<u64>(&lookup, "GALLERIA_LOAD_TIMEOUT_MS") {
            config.scheduler.load_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = env_number::<u64>(&lookup, "GALLERIA_AUTOPLAY_MS").filter(|v| *v > 0) {
            config.carousel.autoplay_interval = Duration::from_millis(ms);
            config.carousel.autoplay = true;
        }
        if let Some(ms) = env_number::<u64>(&lookup, "GALLERIA_SCROLL_QUIET_MS") {
            config.carousel.scroll_quiet = Duration::from_millis(ms);
        }
        if let Some(enabled) = env_flag(&lookup, "GALLERIA_LOOP") {
            config.carousel.loop_enabled = enabled;
        }
        if let Some(enabled) = env_flag(&lookup, "GALLERIA_PAUSE_ON_HOVER") {
            config.carousel.pause_on_hover = enabled;
        }

        config
    }
}

fn env_number<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "Ignoring unparseable config value");
            None
        }
    }
}

fn env_flag(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<bool> {
    lookup(key).map(|v| {
        matches!(
            v.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}
