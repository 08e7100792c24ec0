//! Texture loading and bookkeeping.
//!
//! `LOAD_TEXTURE` hands a path to the [`TextureLoader`] worker; the host
//! uploads finished images, records them in a [`TextureTable`] and reports
//! back with `Texture.on_load`.

mod error;
mod loader;
mod table;

pub use error::TextureLoadError;
pub use loader::{decode_file, texture_loaded_message, DecodedImage, LoadedTexture, TextureLoader};
pub use table::{TextureEntry, TextureTable};
