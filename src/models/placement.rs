use crate::models::ItemId;

/// Absolute position of one item in a masonry layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub id: ItemId,
    pub column: u32,
    pub x: f32,
    pub y: f32,
    pub width_px: f32,
    pub height_px: f32,
}

impl Placement {
    pub fn bottom(&self) -> f32 {
        self.y + self.height_px
    }

    pub fn right(&self) -> f32 {
        self.x + self.width_px
    }
}
