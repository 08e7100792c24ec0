use std::sync::Arc;

use plasma_wire::Message;

use crate::bus::Bus;
use crate::coords::Viewport;
use crate::input::{render_request, DisplayEvent};
use crate::render::{BackendError, DrawBackend, FrameReport, Interpreter, RenderConfig};
use crate::texture::{texture_loaded_message, DecodedImage, TextureLoader};

/// One display's conversation with the runtime.
///
/// Forwards input, asks for a command stream each frame, replays it through
/// the interpreter, and runs texture loads. Knows nothing about the GPU; the
/// caller supplies the draw backend and the texture upload.
pub struct DisplaySession {
    bus: Arc<Bus>,
    display_id: i32,
    interpreter: Interpreter,
    loader: TextureLoader,
}

impl DisplaySession {
    pub fn new(bus: Arc<Bus>, display_id: i32, config: &RenderConfig) -> std::io::Result<Self> {
        Ok(Self {
            bus,
            display_id,
            interpreter: Interpreter::new(config),
            loader: TextureLoader::spawn()?,
        })
    }

    #[inline]
    pub fn bus(&self) -> &Arc<Bus> {
        &self.bus
    }

    #[inline]
    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    /// Replaces the interpreter. Frame state and render modes start over.
    pub fn reconfigure(&mut self, config: &RenderConfig) {
        self.interpreter = Interpreter::new(config);
    }

    /// Sends one input event to the runtime.
    pub fn forward(&self, event: &DisplayEvent) {
        if let Some(mut m) = event.to_message(self.display_id) {
            self.bus.send(&mut m);
        }
    }

    /// Asks the runtime to render; the same-call reply is the frame's stream.
    pub fn request_frame(&self, viewport: Viewport) -> Option<Message> {
        let mut request = render_request(self.display_id, viewport.width, viewport.height);
        let reply = self.bus.send(&mut request);
        if reply.is_none() {
            log::debug!("Display.render: no reply; frame skipped");
        }
        reply
    }

    /// Replays `stream` through `backend`.
    pub fn render<B: DrawBackend + ?Sized>(&mut self, stream: &mut Message, backend: &mut B) -> FrameReport {
        let report = self.interpreter.render_frame(stream, backend);
        if !report.is_clean() {
            log::debug!(
                "frame: {} draw(s), {} decode error(s), {} backend error(s)",
                report.draws,
                report.errors.len(),
                report.backend_errors.len()
            );
        }
        report
    }

    /// Queues texture loads collected while rendering.
    pub fn request_loads(&self, loads: impl IntoIterator<Item = (i32, String)>) {
        for (id, path) in loads {
            if let Err(e) = self.loader.request(id, path) {
                log::warn!("texture {id}: {e}");
                self.notify_loaded(id, None);
            }
        }
    }

    /// Uploads every finished load through `upload` and reports each outcome
    /// with `Texture.on_load`. Returns how many loads finished.
    pub fn complete_textures(
        &self,
        mut upload: impl FnMut(i32, &DecodedImage) -> Result<(), BackendError>,
    ) -> usize {
        let done = self.loader.poll();
        let count = done.len();
        for loaded in done {
            let size = match loaded.result {
                Ok(image) => match upload(loaded.id, &image) {
                    Ok(()) => {
                        log::debug!("texture {}: {}x{} uploaded", loaded.id, image.width, image.height);
                        Some((image.width, image.height))
                    }
                    Err(e) => {
                        log::warn!("texture {}: {e}", loaded.id);
                        None
                    }
                },
                // The loader already logged the failure.
                Err(_) => None,
            };
            self.notify_loaded(loaded.id, size);
        }
        count
    }

    fn notify_loaded(&self, id: i32, size: Option<(u32, u32)>) {
        let mut m = texture_loaded_message(id, size);
        self.bus.send(&mut m);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    use crate::bus::BusConfig;
    use crate::input::names;
    use crate::render::{CommandWriter, RecordingBackend};

    type Sent = Arc<Mutex<Vec<Message>>>;

    /// A runtime that draws one box per `Display.render` and records
    /// everything it receives.
    fn session_with_runtime(stream: impl Fn(&mut CommandWriter) + Send + Sync + 'static) -> (DisplaySession, Sent) {
        let sent: Sent = Arc::default();
        let log = Arc::clone(&sent);
        let link = move |bytes: &[u8]| -> Option<Vec<u8>> {
            let m = Message::parse(bytes.to_vec());
            let is_render = m.type_name() == names::RENDER;
            let id = m.id();
            log.lock().unwrap().push(m);
            if !is_render {
                return None;
            }
            let mut w = CommandWriter::new(Message::reply_to(id, false));
            stream(&mut w);
            Some(w.finish().into_bytes())
        };
        let bus = Bus::new(link, BusConfig::default());
        let session = DisplaySession::new(bus, 0, &RenderConfig::default()).unwrap();
        (session, sent)
    }

    fn types(sent: &Sent) -> Vec<String> {
        sent.lock().unwrap().iter().map(|m| m.type_name().to_string()).collect()
    }

    // ── frames ──

    #[test]
    fn render_request_reply_is_replayed() {
        let (mut session, sent) = session_with_runtime(|w| {
            w.canvas(0, Some(0xFF00_0000), |c| {
                c.fill_box(0.0, 0.0, 10.0, 10.0, 0xFFFF_FFFF);
            });
        });

        let mut stream = session.request_frame(Viewport::new(640, 480)).unwrap();
        let mut backend = RecordingBackend::default();
        let report = session.render(&mut stream, &mut backend);

        assert!(report.is_clean());
        assert_eq!(report.draws, 1);
        assert_eq!(backend.draws[0].position_count, 6);

        let mut req = sent.lock().unwrap().remove(0);
        assert_eq!(req.type_name(), names::RENDER);
        assert_eq!((req.read_int32x(), req.read_int32x(), req.read_int32x()), (0, 640, 480));
    }

    #[test]
    fn silent_runtime_skips_the_frame() {
        let bus = Bus::new(|_: &[u8]| -> Option<Vec<u8>> { None }, BusConfig::default());
        let session = DisplaySession::new(bus, 0, &RenderConfig::default()).unwrap();
        assert!(session.request_frame(Viewport::new(1, 1)).is_none());
    }

    // ── input ──

    #[test]
    fn forwarded_events_reach_the_runtime() {
        let (session, sent) = session_with_runtime(|_| {});
        session.forward(&DisplayEvent::FocusGained);
        session.forward(&DisplayEvent::Text("\r".into()));
        assert_eq!(types(&sent), vec![names::FOCUS_GAINED.to_string()]);
    }

    // ── textures ──

    fn complete_within(
        session: &DisplaySession,
        mut upload: impl FnMut(i32, &DecodedImage) -> Result<(), BackendError>,
    ) -> usize {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let n = session.complete_textures(&mut upload);
            if n > 0 || Instant::now() > deadline {
                return n;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn finished_load_is_uploaded_and_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.png");
        image::RgbaImage::new(8, 4).save(&path).unwrap();

        let (mut session, sent) = session_with_runtime(move |w| {
            w.load_texture(5, "unused");
        });
        let mut stream = session.request_frame(Viewport::new(10, 10)).unwrap();
        let mut backend = RecordingBackend::default();
        session.render(&mut stream, &mut backend);
        assert_eq!(backend.textures, vec![(5, "unused".to_string())]);

        // Load the real file under the id the stream asked for.
        session.request_loads([(5, path.to_string_lossy().into_owned())]);
        let mut uploaded = Vec::new();
        assert_eq!(
            complete_within(&session, |id, img| {
                uploaded.push((id, img.width, img.height));
                Ok(())
            }),
            1
        );
        assert_eq!(uploaded, vec![(5, 8, 4)]);

        let mut on_load = sent.lock().unwrap().pop().unwrap();
        assert_eq!(on_load.type_name(), "Texture.on_load");
        assert_eq!(on_load.read_int32x(), 5);
        assert!(on_load.read_logical());
        assert_eq!((on_load.read_int32x(), on_load.read_int32x()), (8, 4));
    }

    #[test]
    fn failed_upload_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.png");
        image::RgbaImage::new(2, 2).save(&path).unwrap();

        let (session, sent) = session_with_runtime(|_| {});
        session.request_loads([(9, path.to_string_lossy().into_owned())]);
        complete_within(&session, |_, _| Err(BackendError::Texture("too big".into())));

        let mut on_load = sent.lock().unwrap().pop().unwrap();
        assert_eq!(on_load.read_int32x(), 9);
        assert!(!on_load.read_logical());
        assert_eq!(on_load.remaining(), 0);
    }

    #[test]
    fn missing_file_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        let (session, sent) = session_with_runtime(|_| {});
        session.request_loads([(1, dir.path().join("gone.png").to_string_lossy().into_owned())]);
        assert_eq!(complete_within(&session, |_, _| Ok(())), 1);

        let mut on_load = sent.lock().unwrap().pop().unwrap();
        assert_eq!(on_load.read_int32x(), 1);
        assert!(!on_load.read_logical());
    }
}
