use crate::models::{GalleryItem, Placement};

/// Greedy shortest-column masonry balancer.
///
/// Not optimal: items are placed in order into whichever column is currently
/// shortest. Deterministic and O(items * columns), so it is cheap to rerun on
/// every resize.
#[derive(Debug, Clone)]
pub struct MasonryLayout {
    pub column_count: u32,
    pub gap: f32,
}

/// Output of one balancing pass.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MasonryPass {
    pub placements: Vec<Placement>,
    pub column_width: f32,
    /// Final height of every column that can receive an item, trailing gap
    /// included. Capped at the item count.
    pub column_heights: Vec<f32>,
}

impl MasonryPass {
    pub fn total_height(&self) -> f32 {
        self.column_heights.iter().copied().fold(0.0, f32::max)
    }
}

impl Default for MasonryLayout {
    fn default() -> Self {
        Self {
            column_count: 3,
            gap: 0.0,
        }
    }
}

impl MasonryLayout {
    pub fn new(column_count: u32, gap: f32) -> Self {
        Self { column_count, gap }
    }

    /// Width shared by every column, or `None` when nothing fits.
    pub fn column_width(&self, container_width: f32) -> Option<f32> {
        if !container_width.is_finite() || container_width <= 0.0 {
            return None;
        }
        let columns = self.column_count.max(1) as f32;
        let width = (container_width - self.effective_gap() * (columns - 1.0)) / columns;
        (width.is_finite() && width > 0.0).then_some(width)
    }

    fn effective_gap(&self) -> f32 {
        if self.gap.is_finite() && self.gap > 0.0 {
            self.gap
        } else {
            0.0
        }
    }

    /// Places every item into the currently shortest column.
    pub fn balance(&self, items: &[GalleryItem], container_width: f32) -> MasonryPass {
        let Some(column_width) = self.column_width(container_width) else {
            return MasonryPass::default();
        };

        // Every placement adds positive height, so column `i` stays empty until
        // columns `0..i` are used; at most `items.len()` columns are ever reached.
        let reachable = (self.column_count.max(1) as usize).min(items.len().max(1));
        let gap = self.effective_gap();
        let mut column_heights = vec![0.0f32; reachable];
        let mut placements = Vec::with_capacity(items.len());

        for item in items {
            let column = shortest_column(&column_heights);
            let height = column_width / item.aspect_ratio();
            placements.push(Placement {
                id: item.id,
                column: column as u32,
                x: column as f32 * (column_width + gap),
                y: column_heights[column],
                width_px: column_width,
                height_px: height,
            });
            column_heights[column] += height + gap;
        }

        MasonryPass {
            placements,
            column_width,
            column_heights,
        }
    }
}

/// Index of the minimum height; the lowest index wins ties.
fn shortest_column(column_heights: &[f32]) -> usize {
    let mut index = 0;
    let mut best = column_heights.first().copied().unwrap_or(0.0);
    for (i, height) in column_heights.iter().enumerate().skip(1) {
        if *height < best {
            best = *height;
            index = i;
        }
    }
    index
}
