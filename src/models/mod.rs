pub mod aspect_index;
pub mod gallery_item;
pub mod placement;
pub mod row_model;

pub use aspect_index::*;
pub use gallery_item::*;
pub use placement::*;
pub use row_model::*;
