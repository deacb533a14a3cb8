use std::collections::HashMap;

use xxhash_rust::xxh3::xxh3_64;

use crate::models::{Dimensions, GalleryItem, ItemId};

/// Ordered collection of gallery items with id lookup.
///
/// This is the only place item order and natural sizes live; layouts are
/// derived from it and never written back.
#[derive(Debug, Clone, Default)]
pub struct AspectRatioIndex {
    items: Vec<GalleryItem>,
    positions: HashMap<ItemId, usize>,
}

impl AspectRatioIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_items(items: Vec<GalleryItem>) -> Self {
        let mut index = Self::new();
        index.replace(items);
        index
    }

    /// Replace the whole collection. Later duplicates of an id win.
    pub fn replace(&mut self, items: Vec<GalleryItem>) {
        let mut seen: HashMap<ItemId, usize> = HashMap::with_capacity(items.len());
        let mut deduped: Vec<GalleryItem> = Vec::with_capacity(items.len());
        for item in items {
            if let Some(&existing) = seen.get(&item.id) {
                deduped[existing] = item;
            } else {
                seen.insert(item.id, deduped.len());
                deduped.push(item);
            }
        }
        self.items = deduped;
        self.positions = seen;
    }

    /// Insert at `index` (clamped to the current length).
    ///
    /// An item with an id that is already present replaces the old entry,
    /// which is moved to the new position.
    pub fn insert(&mut self, index: usize, item: GalleryItem) {
        if let Some(old) = self.positions.get(&item.id).copied() {
            self.items.remove(old);
        }
        let index = index.min(self.items.len());
        self.items.insert(index, item);
        self.rebuild_positions();
    }

    pub fn push(&mut self, item: GalleryItem) {
        let len = self.items.len();
        self.insert(len, item);
    }

    pub fn remove(&mut self, id: ItemId) -> Option<GalleryItem> {
        let pos = self.positions.get(&id).copied()?;
        let item = self.items.remove(pos);
        self.rebuild_positions();
        Some(item)
    }

    /// Move the item at `from` so it ends up at `to`. Returns false if `from` is out of range.
    pub fn move_item(&mut self, from: usize, to: usize) -> bool {
        if from >= self.items.len() {
            return false;
        }
        let item = self.items.remove(from);
        let to = to.min(self.items.len());
        self.items.insert(to, item);
        self.rebuild_positions();
        true
    }

    /// Record natural dimensions for an item. Returns false for unknown ids.
    pub fn set_dimensions(&mut self, id: ItemId, width: f32, height: f32) -> bool {
        self.set_state(id, Dimensions::Known { width, height })
    }

    /// Record that an item's dimensions could not be loaded.
    pub fn mark_failed(&mut self, id: ItemId) -> bool {
        self.set_state(id, Dimensions::Failed)
    }

    fn set_state(&mut self, id: ItemId, dimensions: Dimensions) -> bool {
        match self.positions.get(&id) {
            Some(&pos) => {
                self.items[pos].dimensions = dimensions;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: ItemId) -> Option<&GalleryItem> {
        self.positions.get(&id).map(|&pos| &self.items[pos])
    }

    pub fn position(&self, id: ItemId) -> Option<usize> {
        self.positions.get(&id).copied()
    }

    pub fn items(&self) -> &[GalleryItem] {
        &self.items
    }

    pub fn ids(&self) -> Vec<ItemId> {
        self.items.iter().map(|item| item.id).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn resolved_count(&self) -> usize {
        self.items.iter().filter(|item| item.is_resolved()).count()
    }

    pub fn pending_count(&self) -> usize {
        self.items.len() - self.resolved_count()
    }

    pub fn all_resolved(&self) -> bool {
        self.items.iter().all(GalleryItem::is_resolved)
    }

    /// One finite, positive aspect ratio per item, in order.
    pub fn aspect_ratios(&self) -> Vec<f32> {
        self.items.iter().map(GalleryItem::aspect_ratio).collect()
    }

    /// Fast hash of ids and dimension state in the current order.
    /// Any add, remove, reorder or load result changes it.
    pub fn content_hash(&self) -> u64 {
        let mut hasher_input = Vec::with_capacity(self.items.len() * 17);
        for item in &self.items {
            hasher_input.extend_from_slice(&item.id.0.to_le_bytes());
            match item.dimensions {
                Dimensions::Pending => hasher_input.push(0),
                Dimensions::Failed => hasher_input.push(1),
                Dimensions::Known { width, height } => {
                    hasher_input.push(2);
                    hasher_input.extend_from_slice(&width.to_bits().to_le_bytes());
                    hasher_input.extend_from_slice(&height.to_bits().to_le_bytes());
                }
            }
        }
        xxh3_64(&hasher_input)
    }

    fn rebuild_positions(&mut self) {
        self.positions.clear();
        for (pos, item) in self.items.iter().enumerate() {
            self.positions.insert(item.id, pos);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_item(id: u64, width: f32, height: f32) -> GalleryItem {
        GalleryItem::new(ItemId(id), width, height)
    }

    fn ids(index: &AspectRatioIndex) -> Vec<u64> {
        index.ids().into_iter().map(|id| id.0).collect()
    }

    #[test]
    fn test_insert_remove_and_lookup() {
        let mut index = AspectRatioIndex::new();
        index.push(make_item(1, 100.0, 100.0));
        index.push(make_item(2, 200.0, 100.0));
        index.insert(0, make_item(3, 100.0, 200.0));

        assert_eq!(ids(&index), vec![3, 1, 2]);
        assert_eq!(index.position(ItemId(2)), Some(2));

        let removed = index.remove(ItemId(1)).unwrap();
        assert_eq!(removed.id, ItemId(1));
        assert_eq!(ids(&index), vec![3, 2]);
        assert_eq!(index.position(ItemId(2)), Some(1));
        assert!(index.remove(ItemId(1)).is_none());
    }

    #[test]
    fn test_insert_existing_id_moves_entry() {
        let mut index =
            AspectRatioIndex::from_items(vec![make_item(1, 1.0, 1.0), make_item(2, 1.0, 1.0)]);
        index.insert(5, make_item(1, 300.0, 100.0));

        assert_eq!(ids(&index), vec![2, 1]);
        assert!((index.get(ItemId(1)).unwrap().aspect_ratio() - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_replace_dedupes_ids() {
        let index = AspectRatioIndex::from_items(vec![
            make_item(1, 1.0, 1.0),
            make_item(2, 1.0, 1.0),
            make_item(1, 2.0, 1.0),
        ]);
        assert_eq!(ids(&index), vec![1, 2]);
        assert!((index.get(ItemId(1)).unwrap().aspect_ratio() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_move_item() {
        let mut index = AspectRatioIndex::from_items(
            (1..=4).map(|i| make_item(i, 1.0, 1.0)).collect(),
        );
        assert!(index.move_item(0, 3));
        assert_eq!(ids(&index), vec![2, 3, 4, 1]);
        assert!(!index.move_item(9, 0));
        assert_eq!(index.position(ItemId(1)), Some(3));
    }

    #[test]
    fn test_resolution_tracking() {
        let mut index = AspectRatioIndex::from_items(vec![
            GalleryItem::pending(ItemId(1)),
            GalleryItem::pending(ItemId(2)),
        ]);
        assert_eq!(index.pending_count(), 2);
        assert!(!index.all_resolved());

        assert!(index.set_dimensions(ItemId(1), 400.0, 200.0));
        assert!(index.mark_failed(ItemId(2)));
        assert!(!index.set_dimensions(ItemId(7), 1.0, 1.0));

        assert!(index.all_resolved());
        assert_eq!(index.aspect_ratios(), vec![2.0, 1.0]);
    }

    #[test]
    fn test_content_hash_changes() {
        let mut index = AspectRatioIndex::from_items(vec![
            make_item(1, 100.0, 100.0),
            GalleryItem::pending(ItemId(2)),
        ]);
        let initial = index.content_hash();
        assert_eq!(initial, index.content_hash());

        index.set_dimensions(ItemId(2), 50.0, 100.0);
        let loaded = index.content_hash();
        assert_ne!(initial, loaded);

        index.move_item(1, 0);
        assert_ne!(loaded, index.content_hash());
    }
}
