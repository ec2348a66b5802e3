//! Error types for image decoding and image folder loading.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from decoding a single image.
///
/// Never cached: the next request for the same path attempts the decode again.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// File could not be read
    #[error("Failed to read image {path:?}: {source}")]
    Io {
        /// Path of the image
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// File was read but its content could not be decoded
    #[error("Failed to decode image {path:?}: {source}")]
    Image {
        /// Path of the image
        path: PathBuf,
        /// Underlying decoder error
        #[source]
        source: image::ImageError,
    },
}

impl DecodeError {
    /// Path of the image that failed.
    pub fn path(&self) -> &PathBuf {
        match self {
            DecodeError::Io { path, .. } | DecodeError::Image { path, .. } => path,
        }
    }
}

/// Errors from building an image sequence out of a folder.
#[derive(Error, Debug)]
pub enum SequenceError {
    /// Folder could not be listed
    #[error("Failed to read folder {path:?}: {source}")]
    ReadFolder {
        /// Folder that was scanned
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Folder holds no supported image files
    #[error("No image files found in {path:?}")]
    NoImages {
        /// Folder that was scanned
        path: PathBuf,
    },
}
