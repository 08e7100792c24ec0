use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};

use plasma_wire::Message;

use super::error::TextureLoadError;

/// Decoded RGBA8 pixels, rows top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Result of one load request.
#[derive(Debug)]
pub struct LoadedTexture {
    pub id: i32,
    pub result: Result<DecodedImage, TextureLoadError>,
}

struct Request {
    id: i32,
    path: PathBuf,
}

/// Decodes image files on a worker thread.
///
/// Requests are served in order; finished loads are collected with
/// [`poll`](Self::poll) on the thread that owns the GPU.
pub struct TextureLoader {
    requests: Option<Sender<Request>>,
    results: Receiver<LoadedTexture>,
    worker: Option<JoinHandle<()>>,
}

impl TextureLoader {
    pub fn spawn() -> std::io::Result<Self> {
        let (req_tx, req_rx) = mpsc::channel::<Request>();
        let (res_tx, res_rx) = mpsc::channel::<LoadedTexture>();

        let worker = thread::Builder::new()
            .name("plasma-texture-loader".into())
            .spawn(move || {
                for Request { id, path } in req_rx {
                    let result = decode_file(&path);
                    if let Err(e) = &result {
                        log::warn!("texture {id}: {e}");
                    }
                    if res_tx.send(LoadedTexture { id, result }).is_err() {
                        break;
                    }
                }
                log::debug!("texture loader stopped");
            })?;

        Ok(Self {
            requests: Some(req_tx),
            results: res_rx,
            worker: Some(worker),
        })
    }

    /// Queues a load. Fails only after the worker has gone away.
    pub fn request(&self, id: i32, path: impl Into<PathBuf>) -> Result<(), TextureLoadError> {
        let path = path.into();
        log::debug!("texture {id}: loading {}", path.display());
        self.requests
            .as_ref()
            .ok_or(TextureLoadError::Disconnected)?
            .send(Request { id, path })
            .map_err(|_| TextureLoadError::Disconnected)
    }

    /// Drains every finished load without blocking.
    pub fn poll(&self) -> Vec<LoadedTexture> {
        let mut done = Vec::new();
        loop {
            match self.results.try_recv() {
                Ok(t) => done.push(t),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        done
    }

    /// Blocks for the next finished load.
    pub fn wait(&self) -> Option<LoadedTexture> {
        self.results.recv().ok()
    }
}

impl Drop for TextureLoader {
    fn drop(&mut self) {
        // Closing the request channel ends the worker loop.
        self.requests = None;
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("texture loader thread panicked");
            }
        }
    }
}

/// Reads and decodes one image file into RGBA8.
pub fn decode_file(path: &Path) -> Result<DecodedImage, TextureLoadError> {
    let bytes = std::fs::read(path).map_err(|source| TextureLoadError::Io {
        path: path.to_owned(),
        source,
    })?;
    let img = image::load_from_memory(&bytes).map_err(|source| TextureLoadError::Decode {
        path: path.to_owned(),
        source,
    })?;

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(TextureLoadError::Empty { path: path.to_owned() });
    }
    Ok(DecodedImage {
        width,
        height,
        pixels: rgba.into_raw(),
    })
}

/// `Texture.on_load(id, success[, width, height])`.
pub fn texture_loaded_message(id: i32, size: Option<(u32, u32)>) -> Message {
    let mut m = Message::new("Texture.on_load");
    m.write_int32x(id).write_logical(size.is_some());
    if let Some((w, h)) = size {
        m.write_int32x(w as i32).write_int32x(h as i32);
    }
    m
}
