//! Natural-size probing for discovered images.
//!
//! Only headers are decoded. Results are reported to the gallery as
//! `DimensionsResolved` or `DimensionsFailed` events as they complete.

use std::path::Path;

use image::ImageReader;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::runtime::{GalleryEvent, GalleryHandle};
use crate::scanner::{ScanEntry, ScanError};

/// Upper bound on concurrent header reads.
pub const MAX_WORKERS: usize = 16;

/// Counts from one [`load_dimensions`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub resolved: usize,
    pub failed: usize,
}

/// Reads an image's pixel size from its header.
pub fn read_dimensions(path: &Path) -> Result<(u32, u32), ScanError> {
    let reader = ImageReader::open(path)
        .map_err(|source| ScanError::Io {
            path: path.to_path_buf(),
            source,
        })?
        .with_guessed_format()
        .map_err(|source| ScanError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    let (width, height) = reader
        .into_dimensions()
        .map_err(|source| ScanError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
    if width == 0 || height == 0 {
        return Err(ScanError::EmptyImage(path.to_path_buf()));
    }
    Ok((width, height))
}

/// Probes every entry on the blocking pool and reports each result to `gallery`.
///
/// Stops early if the gallery goes away.
pub async fn load_dimensions(
    entries: Vec<ScanEntry>,
    gallery: GalleryHandle,
    workers: usize,
) -> LoadSummary {
    let workers = workers.clamp(1, MAX_WORKERS);
    let mut queue = entries.into_iter();
    let mut tasks = JoinSet::new();
    let mut summary = LoadSummary::default();

    loop {
        while tasks.len() < workers {
            let Some(entry) = queue.next() else {
                break;
            };
            tasks.spawn_blocking(move || {
                let result = read_dimensions(&entry.path);
                (entry, result)
            });
        }

        let Some(joined) = tasks.join_next().await else {
            break;
        };
        let event = match joined {
            Ok((entry, Ok((width, height)))) => {
                debug!(id = %entry.id, width, height, "Read image dimensions");
                summary.resolved += 1;
                GalleryEvent::DimensionsResolved {
                    id: entry.id,
                    width: width as f32,
                    height: height as f32,
                }
            }
            Ok((entry, Err(e))) => {
                warn!(id = %entry.id, "{}", e);
                summary.failed += 1;
                GalleryEvent::DimensionsFailed(entry.id)
            }
            Err(e) => {
                // The id is lost with the task; the load gate times it out.
                warn!("Dimension task failed: {}", e);
                summary.failed += 1;
                continue;
            }
        };

        if !gallery.send(event) {
            debug!("Gallery closed, abandoning dimension loads");
            tasks.abort_all();
            break;
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GalleryConfig;
    use crate::models::ItemId;
    use crate::runtime::Gallery;
    use image::RgbImage;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_read_dimensions_png() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wide.png");
        RgbImage::new(40, 20).save(&path).unwrap();

        assert_eq!(read_dimensions(&path).unwrap(), (40, 20));
    }

    #[test]
    fn test_read_dimensions_errors() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.png");
        assert!(matches!(read_dimensions(&missing), Err(ScanError::Io { .. })));

        let garbage = dir.path().join("garbage.png");
        fs::write(&garbage, b"definitely not an image").unwrap();
        assert!(matches!(
            read_dimensions(&garbage),
            Err(ScanError::Decode { .. })
        ));
    }

    #[tokio::test]
    async fn test_load_dimensions_reports_each_entry() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("good.png");
        RgbImage::new(30, 10).save(&good).unwrap();
        let bad = dir.path().join("bad.png");
        fs::write(&bad, b"nope").unwrap();

        let (gallery, handle, _outputs) = Gallery::new(&GalleryConfig::default());
        // Events queue up in the channel; the loop itself is not needed here.
        let entries = vec![
            ScanEntry {
                id: ItemId(0),
                path: good,
            },
            ScanEntry {
                id: ItemId(1),
                path: bad,
            },
        ];

        let summary = load_dimensions(entries, handle, 2).await;
        assert_eq!(
            summary,
            LoadSummary {
                resolved: 1,
                failed: 1
            }
        );
        drop(gallery);
    }

    #[tokio::test]
    async fn test_load_dimensions_stops_when_gallery_closed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.png");
        RgbImage::new(4, 4).save(&path).unwrap();

        let (gallery, handle, _outputs) = Gallery::new(&GalleryConfig::default());
        drop(gallery);

        let entries = (0..3)
            .map(|i| ScanEntry {
                id: ItemId(i),
                path: path.clone(),
            })
            .collect();
        let summary = load_dimensions(entries, handle, 1).await;
        assert_eq!(summary.resolved, 1);
    }
}
