use crate::models::{GalleryItem, ItemId, RowItem, RowModel};

/// A trailing row whose natural fill exceeds this share of the container is
/// stretched like any other row; below it the row keeps the target height.
pub const FINAL_ROW_STRETCH_THRESHOLD: f32 = 0.9;

pub const DEFAULT_TARGET_HEIGHT: f32 = 220.0;

/// Configuration for the justified row packer.
///
/// Items are scaled to a shared target height and streamed left-to-right;
/// each full row is then rescaled so it spans the container exactly.
#[derive(Debug, Clone)]
pub struct JustifiedLayout {
    /// Target row height in pixels (default: 220)
    pub target_height: f32,
    /// Horizontal gap between items in a row in pixels (default: 0)
    pub gap: f32,
    /// Vertical gap between rows in pixels (default: same as `gap`)
    pub row_gap: f32,
}

impl Default for JustifiedLayout {
    fn default() -> Self {
        Self {
            target_height: DEFAULT_TARGET_HEIGHT,
            gap: 0.0,
            row_gap: 0.0,
        }
    }
}

impl JustifiedLayout {
    /// Creates a packer whose row gap matches the item gap.
    pub fn new(target_height: f32, gap: f32) -> Self {
        Self {
            target_height,
            gap,
            row_gap: gap,
        }
    }

    fn effective_target_height(&self) -> f32 {
        if self.target_height.is_finite() && self.target_height > 0.0 {
            self.target_height
        } else {
            DEFAULT_TARGET_HEIGHT
        }
    }

    fn effective_gap(value: f32) -> f32 {
        if value.is_finite() && value > 0.0 {
            value
        } else {
            0.0
        }
    }

    /// Packs items into justified rows.
    ///
    /// # Algorithm
    /// 1. Scale every item to the target height (`aspect_ratio * target_height`).
    /// 2. Accumulate items into the current row until the scaled widths plus
    ///    gaps reach the container width, then close the row.
    /// 3. Rescale each closed row so it fills the container; the trailing row is
    ///    only rescaled when it is already nearly full.
    /// 4. Round widths to whole pixels and take 1px off the last item of each row.
    ///
    /// Returns an empty vector for an empty list or an unmeasured container.
    pub fn pack(&self, items: &[GalleryItem], container_width: f32) -> Vec<RowModel> {
        if items.is_empty() || !container_width.is_finite() || container_width <= 0.0 {
            return Vec::new();
        }

        let target_height = self.effective_target_height();
        let gap = Self::effective_gap(self.gap);

        let mut rows: Vec<RowModel> = Vec::new();
        let mut pending: Vec<(ItemId, f32)> = Vec::new();
        let mut scaled_sum = 0.0f32;
        let mut y = 0.0f32;

        for item in items {
            let scaled_width = item.aspect_ratio() * target_height;
            pending.push((item.id, scaled_width));
            scaled_sum += scaled_width;

            let gaps = gap * (pending.len() - 1) as f32;
            if scaled_sum + gaps >= container_width {
                let row = self.finish_row(
                    rows.len() as u32,
                    y,
                    &pending,
                    scaled_sum,
                    container_width,
                    true,
                );
                y += row.height_px + Self::effective_gap(self.row_gap);
                rows.push(row);
                pending.clear();
                scaled_sum = 0.0;
            }
        }

        if !pending.is_empty() {
            let row = self.finish_row(
                rows.len() as u32,
                y,
                &pending,
                scaled_sum,
                container_width,
                false,
            );
            rows.push(row);
        }

        if let Some(last) = rows.last_mut() {
            last.is_final_row = true;
        }

        rows
    }

    /// Scales and rounds one row.
    ///
    /// `closed` rows always fill the container; an open (trailing) row only
    /// when its fill ratio is above [`FINAL_ROW_STRETCH_THRESHOLD`].
    fn finish_row(
        &self,
        row_index: u32,
        y: f32,
        entries: &[(ItemId, f32)],
        scaled_sum: f32,
        container_width: f32,
        closed: bool,
    ) -> RowModel {
        let target_height = self.effective_target_height();
        let gap = Self::effective_gap(self.gap);
        let count = entries.len();
        let gaps = gap * count.saturating_sub(1) as f32;

        let fill_ratio = (scaled_sum + gaps) / container_width;
        let stretch = closed || fill_ratio > FINAL_ROW_STRETCH_THRESHOLD;
        let scale = if stretch && scaled_sum > 0.0 {
            // Gaps wider than the container leave at least a pixel per item.
            let available = (container_width - gaps).max(count as f32);
            available / scaled_sum
        } else {
            1.0
        };
        let height = (target_height * scale).max(1.0);

        // Round the cumulative right edges so per-item rounding cannot drift.
        let mut items = Vec::with_capacity(count);
        let mut exact_edge = 0.0f32;
        let mut rounded_edge = 0.0f32;
        let mut x = 0.0f32;
        for (idx, &(id, scaled_width)) in entries.iter().enumerate() {
            exact_edge += scaled_width * scale;
            let edge = exact_edge.round();
            let mut width = (edge - rounded_edge).max(1.0);
            rounded_edge = edge;
            if idx + 1 == count {
                width = (width - 1.0).max(1.0);
            }
            items.push(RowItem {
                id,
                x,
                width_px: width,
                height_px: height,
            });
            x += width + gap;
        }

        RowModel::new(row_index, y, height, items)
    }

    /// Calculates the total height of all rows.
    /// Useful for scroll calculations.
    pub fn total_height(rows: &[RowModel]) -> f32 {
        rows.last().map(|row| row.y + row.height_px).unwrap_or(0.0)
    }
}
