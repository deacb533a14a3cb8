use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::Mutex;
use xxhash_rust::xxh3::xxh3_64;

use crate::layout::{ColumnCount, LayoutConfig, LayoutMode, LayoutResult};

/// Maximum number of cached layouts to keep in memory.
const MAX_CACHE_ENTRIES: usize = 8;

/// Key for the layout cache: exact container width, layout settings and list contents.
///
/// Widths are not bucketed; a justified row must fill the container to the
/// pixel, so two widths never share a result.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct CacheKey {
    width_bits: u32,
    config_hash: u64,
    list_hash: u64,
}

impl CacheKey {
    pub fn new(config: &LayoutConfig, list_hash: u64) -> Self {
        Self {
            width_bits: config.container_width.to_bits(),
            config_hash: LayoutCache::compute_config_hash(config),
            list_hash,
        }
    }
}

/// Small LRU of recent layout results.
///
/// Window resizes tend to revisit the same handful of widths (maximize and
/// restore, sidebar toggles), so keeping the last few passes avoids rerunning
/// the packers for them.
pub struct LayoutCache {
    cache: Mutex<LruCache<CacheKey, LayoutResult>>,
}

impl LayoutCache {
    /// Creates a new empty layout cache.
    pub fn new() -> Self {
        Self::with_capacity(MAX_CACHE_ENTRIES)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Hashes everything in the config except the container width.
    pub fn compute_config_hash(config: &LayoutConfig) -> u64 {
        let mut hasher_input = Vec::with_capacity(32);
        hasher_input.extend_from_slice(&config.gap_px.to_bits().to_le_bytes());
        match config.mode {
            LayoutMode::Justified { target_row_height } => {
                hasher_input.push(0);
                hasher_input.extend_from_slice(&target_row_height.to_bits().to_le_bytes());
            }
            LayoutMode::Masonry { columns } => {
                hasher_input.push(1);
                match columns {
                    ColumnCount::Fixed(count) => {
                        hasher_input.push(0);
                        hasher_input.extend_from_slice(&count.to_le_bytes());
                    }
                    ColumnCount::Responsive(bp) => {
                        hasher_input.push(1);
                        for value in [
                            bp.small_max_width,
                            bp.medium_max_width,
                            bp.small,
                            bp.medium,
                            bp.large,
                        ] {
                            hasher_input.extend_from_slice(&value.to_le_bytes());
                        }
                    }
                }
            }
        }
        xxh3_64(&hasher_input)
    }

    /// Returns a cached result and marks it most recently used.
    pub fn get(&self, key: &CacheKey) -> Option<LayoutResult> {
        self.cache.lock().get(key).cloned()
    }

    pub fn insert(&self, key: CacheKey, result: LayoutResult) {
        self.cache.lock().put(key, result);
    }

    /// Clears the entire cache.
    pub fn clear(&self) {
        self.cache.lock().clear();
    }

    /// Returns the number of cached layouts.
    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.cache.lock().is_empty()
    }
}

impl Default for LayoutCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LayoutCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutCache")
            .field("entries", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{compute_layout, ColumnBreakpoints};
    use crate::models::{AspectRatioIndex, GalleryItem, ItemId};

    fn make_index(count: u64) -> AspectRatioIndex {
        AspectRatioIndex::from_items(
            (0..count)
                .map(|i| GalleryItem::new(ItemId(i), 1920.0, 1080.0))
                .collect(),
        )
    }

    #[test]
    fn test_config_hash_ignores_width() {
        let a = LayoutConfig::justified(1000.0, 200.0, 4.0);
        let b = LayoutConfig::justified(1400.0, 200.0, 4.0);
        assert_eq!(
            LayoutCache::compute_config_hash(&a),
            LayoutCache::compute_config_hash(&b)
        );
        assert_ne!(CacheKey::new(&a, 1), CacheKey::new(&b, 1));
    }

    #[test]
    fn test_config_hash_changes_with_mode() {
        let justified = LayoutConfig::justified(1000.0, 200.0, 4.0);
        let fixed = LayoutConfig::masonry(1000.0, ColumnCount::Fixed(3), 4.0);
        let responsive =
            LayoutConfig::masonry(1000.0, ColumnCount::Responsive(ColumnBreakpoints::default()), 4.0);

        let hashes = [
            LayoutCache::compute_config_hash(&justified),
            LayoutCache::compute_config_hash(&fixed),
            LayoutCache::compute_config_hash(&responsive),
        ];
        assert_ne!(hashes[0], hashes[1]);
        assert_ne!(hashes[1], hashes[2]);
    }

    #[test]
    fn test_cache_miss_then_hit() {
        let cache = LayoutCache::new();
        let index = make_index(10);
        let config = LayoutConfig::justified(1920.0, 220.0, 0.0);
        let key = CacheKey::new(&config, index.content_hash());

        assert!(cache.get(&key).is_none());

        let result = compute_layout(index.items(), &config);
        cache.insert(key, result.clone());

        assert_eq!(cache.get(&key), Some(result));
    }

    #[test]
    fn test_cache_eviction() {
        let cache = LayoutCache::new();
        let index = make_index(1);
        let result = compute_layout(index.items(), &LayoutConfig::justified(500.0, 220.0, 0.0));

        for width in 0..(MAX_CACHE_ENTRIES + 5) {
            let config = LayoutConfig::justified(500.0 + width as f32, 220.0, 0.0);
            cache.insert(CacheKey::new(&config, 7), result.clone());
        }

        assert_eq!(cache.len(), MAX_CACHE_ENTRIES);
        let oldest = CacheKey::new(&LayoutConfig::justified(500.0, 220.0, 0.0), 7);
        assert!(cache.get(&oldest).is_none());
    }

    #[test]
    fn test_list_change_misses() {
        let cache = LayoutCache::new();
        let mut index = make_index(3);
        let config = LayoutConfig::justified(1200.0, 220.0, 0.0);
        cache.insert(
            CacheKey::new(&config, index.content_hash()),
            compute_layout(index.items(), &config),
        );

        index.remove(ItemId(1));
        assert!(cache
            .get(&CacheKey::new(&config, index.content_hash()))
            .is_none());

        cache.clear();
        assert!(cache.is_empty());
    }
}
