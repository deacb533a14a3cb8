//! Directory discovery for gallery images.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::models::{GalleryItem, ItemId};
use crate::scanner::ScanError;

/// File extensions the dimension reader can decode.
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "webp", "gif", "bmp", "tif", "tiff",
];

/// Configuration for directory discovery.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Whether to scan directories recursively.
    pub recursive: bool,
    /// Maximum directory depth (0 = unlimited).
    pub max_depth: usize,
    /// Whether to follow symbolic links.
    pub follow_symlinks: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            recursive: false,
            max_depth: 0,
            follow_symlinks: false,
        }
    }
}

/// One discovered image. Ids follow the sorted path order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanEntry {
    pub id: ItemId,
    pub path: PathBuf,
}

impl ScanEntry {
    /// Gallery item with dimensions still unknown.
    pub fn pending_item(&self) -> GalleryItem {
        GalleryItem::pending(self.id)
    }
}

pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

/// Lists image files under `dir`, sorted by path.
pub fn discover_images(dir: &Path, config: &ScanConfig) -> Result<Vec<ScanEntry>, ScanError> {
    if !dir.is_dir() {
        return Err(ScanError::NotADirectory(dir.to_path_buf()));
    }

    let mut walker = WalkDir::new(dir).follow_links(config.follow_symlinks);
    if !config.recursive {
        walker = walker.max_depth(1);
    } else if config.max_depth > 0 {
        walker = walker.max_depth(config.max_depth);
    }

    let mut paths = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if entry.file_type().is_dir() || !is_image_path(entry.path()) {
            continue;
        }
        paths.push(entry.into_path());
    }

    paths.sort();
    info!("Discovered {} images in {:?}", paths.len(), dir);

    let entries = paths
        .into_iter()
        .enumerate()
        .map(|(i, path)| ScanEntry {
            id: ItemId(i as u64),
            path,
        })
        .collect::<Vec<_>>();
    debug!(count = entries.len(), "Assigned item ids");
    Ok(entries)
}
