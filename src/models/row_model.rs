use crate::models::ItemId;

/// One item inside a justified row, positioned relative to the row's left edge.
#[derive(Debug, Clone, PartialEq)]
pub struct RowItem {
    pub id: ItemId,
    pub x: f32,
    pub width_px: f32,
    pub height_px: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowModel {
    pub row_index: u32,
    /// Top edge of the row inside the gallery.
    pub y: f32,
    pub height_px: f32,
    pub items: Vec<RowItem>,
    pub is_final_row: bool,
}

impl RowModel {
    pub fn new(row_index: u32, y: f32, height_px: f32, items: Vec<RowItem>) -> Self {
        Self {
            row_index,
            y,
            height_px,
            items,
            is_final_row: false,
        }
    }

    /// Sum of item widths plus the gaps between them.
    pub fn occupied_width(&self, gap: f32) -> f32 {
        let widths: f32 = self.items.iter().map(|item| item.width_px).sum();
        widths + gap * self.items.len().saturating_sub(1) as f32
    }
}
