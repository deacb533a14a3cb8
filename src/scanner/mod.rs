//! Image discovery and dimension loading for the CLI front end.

pub mod dimensions;
pub mod discovery;

use std::path::PathBuf;

use thiserror::Error;

pub use dimensions::{load_dimensions, read_dimensions, LoadSummary};
pub use discovery::{discover_images, is_image_path, ScanConfig, ScanEntry, IMAGE_EXTENSIONS};

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("not a directory: {0:?}")]
    NotADirectory(PathBuf),
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read dimensions of {path:?}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("image has zero size: {0:?}")]
    EmptyImage(PathBuf),
}
