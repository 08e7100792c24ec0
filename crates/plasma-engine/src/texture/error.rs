use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TextureLoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("{path} has zero size")]
    Empty { path: PathBuf },

    #[error("texture loader has shut down")]
    Disconnected,
}
