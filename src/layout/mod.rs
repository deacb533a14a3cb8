//! Layout computation for the gallery.
//!
//! - `JustifiedLayout` - rows scaled to fill the container width
//! - `MasonryLayout` - greedy shortest-column placement
//! - `LayoutCache` - LRU of recent results keyed by width, config and item list

pub mod breakpoints;
pub mod justified;
pub mod layout_cache;
pub mod masonry;

use thiserror::Error;

use crate::models::{GalleryItem, Placement, RowModel};

pub use breakpoints::{ColumnBreakpoints, ColumnCount};
pub use justified::{JustifiedLayout, DEFAULT_TARGET_HEIGHT, FINAL_ROW_STRETCH_THRESHOLD};
pub use layout_cache::LayoutCache;
pub use masonry::{MasonryLayout, MasonryPass};

/// Rejected layout settings. Only surfaced by [`LayoutConfig::validate`];
/// the packers themselves sanitize instead of failing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("target row height must be a positive number, got {0}")]
    InvalidRowHeight(f32),
    #[error("column count must be at least 1")]
    ZeroColumns,
    #[error("gap must be a non-negative number, got {0}")]
    InvalidGap(f32),
    #[error("container width must be a non-negative number, got {0}")]
    InvalidContainerWidth(f32),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LayoutMode {
    Justified { target_row_height: f32 },
    Masonry { columns: ColumnCount },
}

impl Default for LayoutMode {
    fn default() -> Self {
        LayoutMode::Justified {
            target_row_height: DEFAULT_TARGET_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LayoutConfig {
    pub container_width: f32,
    pub gap_px: f32,
    pub mode: LayoutMode,
}

impl LayoutConfig {
    pub fn justified(container_width: f32, target_row_height: f32, gap_px: f32) -> Self {
        Self {
            container_width,
            gap_px,
            mode: LayoutMode::Justified { target_row_height },
        }
    }

    pub fn masonry(container_width: f32, columns: ColumnCount, gap_px: f32) -> Self {
        Self {
            container_width,
            gap_px,
            mode: LayoutMode::Masonry { columns },
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.container_width.is_finite() || self.container_width < 0.0 {
            return Err(ConfigError::InvalidContainerWidth(self.container_width));
        }
        if !self.gap_px.is_finite() || self.gap_px < 0.0 {
            return Err(ConfigError::InvalidGap(self.gap_px));
        }
        match self.mode {
            LayoutMode::Justified { target_row_height } => {
                if !target_row_height.is_finite() || target_row_height <= 0.0 {
                    return Err(ConfigError::InvalidRowHeight(target_row_height));
                }
            }
            LayoutMode::Masonry { columns } => {
                let zero = match columns {
                    ColumnCount::Fixed(count) => count == 0,
                    ColumnCount::Responsive(bp) => bp.small == 0 || bp.medium == 0 || bp.large == 0,
                };
                if zero {
                    return Err(ConfigError::ZeroColumns);
                }
            }
        }
        Ok(())
    }

    /// Column count in effect at the configured width (masonry only).
    pub fn resolved_columns(&self) -> Option<u32> {
        match self.mode {
            LayoutMode::Masonry { columns } => Some(columns.resolve(self.container_width)),
            LayoutMode::Justified { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JustifiedResult {
    pub rows: Vec<RowModel>,
    pub total_height: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MasonryResult {
    pub placements: Vec<Placement>,
    pub column_count: u32,
    pub column_width: f32,
    pub total_height: f32,
}

/// Declarative geometry for one recompute pass, applied by a renderer.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutResult {
    Justified(JustifiedResult),
    Masonry(MasonryResult),
}

impl LayoutResult {
    pub fn item_count(&self) -> usize {
        match self {
            LayoutResult::Justified(result) => result.rows.iter().map(|r| r.items.len()).sum(),
            LayoutResult::Masonry(result) => result.placements.len(),
        }
    }

    pub fn total_height(&self) -> f32 {
        match self {
            LayoutResult::Justified(result) => result.total_height,
            LayoutResult::Masonry(result) => result.total_height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.item_count() == 0
    }
}

/// Runs whichever packer `config.mode` selects.
pub fn compute_layout(items: &[GalleryItem], config: &LayoutConfig) -> LayoutResult {
    match config.mode {
        LayoutMode::Justified { target_row_height } => {
            let rows =
                JustifiedLayout::new(target_row_height, config.gap_px).pack(items, config.container_width);
            let total_height = JustifiedLayout::total_height(&rows);
            LayoutResult::Justified(JustifiedResult { rows, total_height })
        }
        LayoutMode::Masonry { columns } => {
            let column_count = columns.resolve(config.container_width);
            let pass = MasonryLayout::new(column_count, config.gap_px)
                .balance(items, config.container_width);
            let total_height = pass.total_height();
            LayoutResult::Masonry(MasonryResult {
                placements: pass.placements,
                column_count,
                column_width: pass.column_width,
                total_height,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ItemId;

    fn make_items(count: u64) -> Vec<GalleryItem> {
        (0..count)
            .map(|i| GalleryItem::new(ItemId(i), 1600.0, 900.0))
            .collect()
    }

    #[test]
    fn test_compute_justified() {
        let config = LayoutConfig::justified(1000.0, 250.0, 10.0);
        let result = compute_layout(&make_items(5), &config);
        assert_eq!(result.item_count(), 5);
        assert!(matches!(result, LayoutResult::Justified(_)));
        assert!(result.total_height() > 250.0);
    }

    #[test]
    fn test_compute_masonry_resolves_breakpoints() {
        let config = LayoutConfig::masonry(800.0, ColumnCount::default(), 10.0);
        let LayoutResult::Masonry(result) = compute_layout(&make_items(4), &config) else {
            panic!("expected masonry result");
        };
        assert_eq!(result.column_count, 2);
        assert!((result.column_width - 395.0).abs() < 0.01);
        assert_eq!(config.resolved_columns(), Some(2));
    }

    #[test]
    fn test_zero_width_gives_empty_result() {
        let config = LayoutConfig::justified(0.0, 250.0, 10.0);
        assert!(compute_layout(&make_items(3), &config).is_empty());
    }

    #[test]
    fn test_validate() {
        assert!(LayoutConfig::justified(800.0, 200.0, 4.0).validate().is_ok());
        assert_eq!(
            LayoutConfig::justified(800.0, 0.0, 4.0).validate(),
            Err(ConfigError::InvalidRowHeight(0.0))
        );
        assert_eq!(
            LayoutConfig::masonry(800.0, ColumnCount::Fixed(0), 4.0).validate(),
            Err(ConfigError::ZeroColumns)
        );
        assert_eq!(
            LayoutConfig::justified(800.0, 200.0, -1.0).validate(),
            Err(ConfigError::InvalidGap(-1.0))
        );
    }
}
