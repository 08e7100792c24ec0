use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::{Duration, Instant};

use plasma_wire::{split_frames, write_frame, Message, SendDisposition};

use super::{BusConfig, RuntimeLink};

/// Persistent listener callback.
pub type Callback = Arc<dyn Fn(&mut Message) + Send + Sync>;

type OnceCallback = Box<dyn FnOnce(&mut Message) + Send>;
type ReplyCallback = Box<dyn FnOnce(Message) + Send>;

enum Handler {
    Every(Callback),
    Once(OnceCallback),
}

impl Handler {
    fn invoke(self, message: &mut Message) {
        match self {
            Handler::Every(cb) => cb(message),
            Handler::Once(cb) => cb(message),
        }
    }
}

struct PendingReply {
    registered: Instant,
    callback: ReplyCallback,
}

#[derive(Default)]
struct Registry {
    listeners: HashMap<String, Handler>,
    replies: HashMap<i32, PendingReply>,
}

/// Listener registry + reply correlation + runtime call.
///
/// Created behind an `Arc`; the reply router installed at construction holds
/// a weak handle back to the bus.
pub struct Bus {
    registry: Mutex<Registry>,
    link: Box<dyn RuntimeLink>,
    config: BusConfig,
}

impl Bus {
    pub fn new(link: impl RuntimeLink + 'static, config: BusConfig) -> Arc<Self> {
        Arc::new_cyclic(|weak: &Weak<Bus>| {
            let router = weak.clone();
            let route: Callback = Arc::new(move |m: &mut Message| {
                if let Some(bus) = router.upgrade() {
                    bus.route_reply(m);
                }
            });

            let mut registry = Registry::default();
            registry.listeners.insert(String::new(), Handler::Every(route));

            Bus {
                registry: Mutex::new(registry),
                link: Box::new(link),
                config,
            }
        })
    }

    #[inline]
    pub fn config(&self) -> &BusConfig {
        &self.config
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── listeners ─────────────────────────────────────────────────────────

    /// Installs (or replaces) the listener for `type_name`.
    pub fn register(&self, type_name: &str, callback: impl Fn(&mut Message) + Send + Sync + 'static) {
        self.insert(type_name, Handler::Every(Arc::new(callback)));
    }

    /// Installs a listener that removes itself after its first invocation.
    pub fn register_once(&self, type_name: &str, callback: impl FnOnce(&mut Message) + Send + 'static) {
        self.insert(type_name, Handler::Once(Box::new(callback)));
    }

    fn insert(&self, type_name: &str, handler: Handler) {
        if type_name.is_empty() {
            log::warn!("bus: the empty type is reserved for replies; listener ignored");
            return;
        }
        self.registry().listeners.insert(type_name.to_string(), handler);
    }

    /// Removes the listener for `type_name`. Returns whether one existed.
    pub fn unregister(&self, type_name: &str) -> bool {
        if type_name.is_empty() {
            log::warn!("bus: the reply router cannot be removed");
            return false;
        }
        self.registry().listeners.remove(type_name).is_some()
    }

    pub fn has_listener(&self, type_name: &str) -> bool {
        self.registry().listeners.contains_key(type_name)
    }

    // ── dispatch ──────────────────────────────────────────────────────────

    /// Routes `message` to the listener for its type.
    ///
    /// One-shot listeners are removed before they run. The callback runs with
    /// the lock released. Returns `false` when no listener matched.
    pub fn dispatch(&self, message: &mut Message) -> bool {
        let handler = {
            let mut guard = self.registry();
            let reg = &mut *guard;
            let ty = message.type_name();
            match reg.listeners.get(ty) {
                None => None,
                Some(Handler::Every(cb)) => Some(Handler::Every(Arc::clone(cb))),
                Some(Handler::Once(_)) => reg.listeners.remove(ty),
            }
        };

        match handler {
            Some(h) => {
                h.invoke(message);
                true
            }
            None => {
                log::debug!("bus: no listener for {:?}", message.type_name());
                false
            }
        }
    }

    fn route_reply(&self, reply: &mut Message) {
        let pending = self.registry().replies.remove(&reply.id());
        match pending {
            Some(p) => (p.callback)(std::mem::take(reply)),
            None => log::debug!("bus: reply {} has no pending callback", reply.id()),
        }
    }

    // ── outbound ──────────────────────────────────────────────────────────

    /// Transmits `message` to the runtime at most once.
    ///
    /// Returns the runtime's same-call reply, if any. Repeat calls and
    /// deferred messages transmit nothing and return `None`.
    pub fn send(&self, message: &mut Message) -> Option<Message> {
        match message.request_send() {
            SendDisposition::Transmit => self.link.send_message(message.as_bytes()).map(Message::parse),
            SendDisposition::Deferred | SendDisposition::AlreadySent => None,
        }
    }

    /// Sends `message` and arranges for `callback` to receive its reply.
    ///
    /// A same-call reply invokes `callback` immediately; otherwise it runs when
    /// a reply with the matching id is dispatched later. A message that was
    /// already sent or is deferred transmits nothing, and `callback` is dropped.
    pub fn send_rsvp(&self, mut message: Message, callback: impl FnOnce(Message) + Send + 'static) {
        let id = message.id();

        match message.request_send() {
            SendDisposition::Transmit => {}
            other => {
                log::debug!("bus: message {id} not transmitted ({other:?}); reply callback dropped");
                return;
            }
        }

        // Register before transmitting: the reply may arrive on another thread
        // before the link returns.
        self.registry().replies.insert(
            id,
            PendingReply {
                registered: Instant::now(),
                callback: Box::new(callback),
            },
        );

        if let Some(reply) = self.link.send_message(message.as_bytes()).map(Message::parse) {
            let pending = self.registry().replies.remove(&id);
            if let Some(p) = pending {
                (p.callback)(reply);
            }
        }
    }

    /// Channel flavor of [`send_rsvp`](Self::send_rsvp).
    pub fn request(&self, message: Message) -> Receiver<Message> {
        let (tx, rx) = mpsc::channel();
        self.send_rsvp(message, move |reply| {
            let _ = tx.send(reply);
        });
        rx
    }

    pub fn pending_replies(&self) -> usize {
        self.registry().replies.len()
    }

    /// Drops reply-correlation entries older than `max_age`.
    pub fn expire_replies(&self, max_age: Duration) -> usize {
        let now = Instant::now();
        let mut reg = self.registry();
        let before = reg.replies.len();
        reg.replies
            .retain(|_, p| now.saturating_duration_since(p.registered) <= max_age);
        let dropped = before - reg.replies.len();
        if dropped > 0 {
            log::warn!("bus: expired {dropped} unanswered reply callback(s)");
        }
        dropped
    }

    /// Applies `BusConfig::reply_timeout`, if set.
    pub fn expire_stale(&self) -> usize {
        match self.config.reply_timeout {
            Some(max_age) => self.expire_replies(max_age),
            None => 0,
        }
    }

    // ── inbound ───────────────────────────────────────────────────────────

    /// Delivers one message from the runtime.
    ///
    /// The message is dispatched as deferred, so a reply the listener sends is
    /// held back and returned here as the synchronous answer.
    pub fn receive(&self, bytes: Vec<u8>) -> Option<Vec<u8>> {
        let mut message = Message::parse(bytes);
        message.set_deferred(true);
        self.dispatch(&mut message);

        let reply = message.take_reply()?;
        if reply.send_requested() {
            Some(reply.into_bytes())
        } else {
            log::debug!("bus: reply to {} was created but never sent", message.id());
            None
        }
    }

    /// Delivers a blob of size-prefixed messages.
    ///
    /// Malformed regions are logged and skipped. Returns the sent replies as a
    /// size-prefixed blob.
    pub fn receive_batch(&self, blob: &[u8]) -> Vec<u8> {
        let mut replies = Vec::new();
        for frame in split_frames(blob) {
            match frame {
                Ok(message) => {
                    if let Some(reply) = self.receive(message.into_bytes()) {
                        write_frame(&mut replies, &reply);
                    }
                }
                Err(e) => log::warn!("bus: skipping message: {e}"),
            }
        }
        replies
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Records transmissions and answers through `respond`.
    struct ScriptedLink {
        sent: Arc<Mutex<Vec<Vec<u8>>>>,
        respond: Box<dyn Fn(&mut Message) -> Option<Message> + Send + Sync>,
    }

    fn bus_with(
        respond: impl Fn(&mut Message) -> Option<Message> + Send + Sync + 'static,
    ) -> (Arc<Bus>, Arc<Mutex<Vec<Vec<u8>>>>) {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let link = ScriptedLink { sent: Arc::clone(&sent), respond: Box::new(respond) };
        (Bus::new(link, BusConfig::default()), sent)
    }

    impl RuntimeLink for ScriptedLink {
        fn send_message(&self, bytes: &[u8]) -> Option<Vec<u8>> {
            self.sent.lock().unwrap().push(bytes.to_vec());
            let mut m = Message::parse(bytes.to_vec());
            (self.respond)(&mut m).map(Message::into_bytes)
        }
    }

    fn silent() -> (Arc<Bus>, Arc<Mutex<Vec<Vec<u8>>>>) {
        bus_with(|_| None)
    }

    // ── send ──────────────────────────────────────────────────────────────

    #[test]
    fn send_transmits_once() {
        let (bus, sent) = silent();
        let mut m = Message::new("App.ping");
        assert!(bus.send(&mut m).is_none());
        assert!(bus.send(&mut m).is_none());
        assert_eq!(sent.lock().unwrap().len(), 1);
    }

    #[test]
    fn deferred_send_does_not_transmit() {
        let (bus, sent) = silent();
        let mut m = Message::reply_to(4, true);
        assert!(bus.send(&mut m).is_none());
        assert!(m.send_requested());
        assert!(sent.lock().unwrap().is_empty());
    }

    #[test]
    fn same_call_reply_is_returned() {
        let (bus, _) = bus_with(|m| {
            let mut r = Message::reply_to(m.id(), false);
            r.write_int32x(m.read_int32x() * 2);
            Some(r)
        });
        let mut m = Message::new("Math.double");
        m.write_int32x(21);
        let mut reply = bus.send(&mut m).unwrap();
        assert_eq!(reply.id(), m.id());
        assert!(reply.is_reply());
        assert_eq!(reply.read_int32x(), 42);
    }

    // ── rsvp ──────────────────────────────────────────────────────────────

    #[test]
    fn rsvp_with_immediate_reply_runs_now() {
        let (bus, _) = bus_with(|m| Some(Message::reply_to(m.id(), false)));
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        bus.send_rsvp(Message::new("Q.now"), move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(bus.pending_replies(), 0);
    }

    #[test]
    fn rsvp_reply_arrives_later_exactly_once() {
        let (bus, _) = silent();
        let got = Arc::new(Mutex::new(Vec::new()));
        let g = Arc::clone(&got);

        let m = Message::new("Q.later");
        let id = m.id();
        bus.send_rsvp(m, move |mut r| {
            g.lock().unwrap().push(r.read_int32x());
        });
        assert_eq!(bus.pending_replies(), 1);

        let mut reply = Message::reply_to(id, false);
        reply.write_int32x(7);
        let bytes = reply.into_bytes();
        bus.receive(bytes.clone());
        bus.receive(bytes);

        assert_eq!(*got.lock().unwrap(), vec![7]);
        assert_eq!(bus.pending_replies(), 0);
    }

    #[test]
    fn request_channel_delivers_reply() {
        let (bus, _) = silent();
        let m = Message::new("Q.chan");
        let id = m.id();
        let rx = bus.request(m);
        assert!(rx.try_recv().is_err());

        bus.receive(Message::reply_to(id, false).into_bytes());
        assert_eq!(rx.try_recv().unwrap().id(), id);
    }

    #[test]
    fn rsvp_on_untransmitted_message_leaves_nothing_pending() {
        let (bus, sent) = silent();
        bus.send_rsvp(Message::reply_to(3, true), |_| {});

        let mut already = Message::new("Q.twice");
        bus.send(&mut already);
        bus.send_rsvp(already, |_| {});

        assert_eq!(sent.lock().unwrap().len(), 1);
        assert_eq!(bus.pending_replies(), 0);
    }

    #[test]
    fn request_on_deferred_message_disconnects() {
        let (bus, _) = silent();
        let rx = bus.request(Message::reply_to(8, true));
        assert!(matches!(rx.try_recv(), Err(mpsc::TryRecvError::Disconnected)));
    }

    #[test]
    fn expire_drops_stale_entries() {
        let (bus, _) = silent();
        bus.send_rsvp(Message::new("Q.never"), |_| {});
        assert_eq!(bus.expire_replies(Duration::from_secs(60)), 0);
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(bus.expire_replies(Duration::ZERO), 1);
        assert_eq!(bus.pending_replies(), 0);
    }

    #[test]
    fn expire_stale_without_timeout_keeps_entries() {
        let (bus, _) = silent();
        bus.send_rsvp(Message::new("Q.keep"), |_| {});
        assert_eq!(bus.expire_stale(), 0);
        assert_eq!(bus.pending_replies(), 1);
    }

    // ── listeners ─────────────────────────────────────────────────────────

    #[test]
    fn once_listener_runs_once() {
        let (bus, _) = silent();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        bus.register_once("Evt.one", move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });

        assert!(bus.dispatch(&mut Message::new("Evt.one")));
        assert!(!bus.dispatch(&mut Message::new("Evt.one")));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn exact_type_match_only() {
        let (bus, _) = silent();
        bus.register("Evt.a", |_| {});
        assert!(!bus.dispatch(&mut Message::new("Evt")));
        assert!(bus.dispatch(&mut Message::new("Evt.a")));
    }

    #[test]
    fn reply_router_is_protected() {
        let (bus, _) = silent();
        assert!(!bus.unregister(""));
        bus.register("", |_| {});
        assert!(bus.has_listener(""));
        assert!(!bus.unregister("Nothing.here"));
    }

    #[test]
    fn callbacks_may_reenter_the_bus() {
        let (bus, _) = silent();
        let hits = Arc::new(AtomicUsize::new(0));

        let h = Arc::clone(&hits);
        bus.register("Evt.inner", move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });

        let weak = Arc::downgrade(&bus);
        bus.register("Evt.outer", move |_| {
            let bus = weak.upgrade().unwrap();
            bus.dispatch(&mut Message::new("Evt.inner"));
            bus.unregister("Evt.inner");
        });

        bus.dispatch(&mut Message::new("Evt.outer"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(!bus.has_listener("Evt.inner"));
    }

    #[test]
    fn dispatch_from_two_threads() {
        let (bus, _) = silent();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        bus.register("Evt.tick", move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });

        let worker = {
            let bus = Arc::clone(&bus);
            std::thread::spawn(move || {
                for _ in 0..500 {
                    bus.dispatch(&mut Message::new("Evt.tick"));
                }
            })
        };
        for _ in 0..500 {
            bus.dispatch(&mut Message::new("Evt.tick"));
        }
        worker.join().unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1000);
    }

    // ── inbound ───────────────────────────────────────────────────────────

    #[test]
    fn receive_returns_deferred_reply() {
        let (bus, sent) = silent();
        bus.register("Runtime.ask", |m| {
            let v = m.read_int32x();
            let reply = m.reply();
            reply.write_int32x(v + 1);
            // Deferred: recorded here, returned by `receive`.
            assert_eq!(reply.request_send(), SendDisposition::Deferred);
        });

        let mut ask = Message::with_id("Runtime.ask", 900);
        ask.write_int32x(41);
        let mut reply = Message::parse(bus.receive(ask.into_bytes()).unwrap());
        assert_eq!(reply.id(), 900);
        assert_eq!(reply.read_int32x(), 42);
        assert!(sent.lock().unwrap().is_empty());
    }

    #[test]
    fn unsent_reply_is_not_returned() {
        let (bus, _) = silent();
        bus.register("Runtime.quiet", |m| {
            m.reply().write_int32x(1);
        });
        assert!(bus.receive(Message::new("Runtime.quiet").into_bytes()).is_none());
    }

    #[test]
    fn receive_batch_skips_malformed_region() {
        let (bus, _) = silent();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        bus.register("Evt.batch", move |m| {
            h.fetch_add(1, Ordering::SeqCst);
            let reply = m.reply();
            reply.write_int32x(1);
            reply.request_send();
        });

        let mut blob = Vec::new();
        write_frame(&mut blob, Message::new("Evt.batch").as_bytes());
        write_frame(&mut blob, Message::new("Evt.batch").as_bytes());
        blob.extend_from_slice(&[0, 0, 0x10, 0, 1, 2]);

        let replies = bus.receive_batch(&blob);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(split_frames(&replies).filter(Result::is_ok).count(), 2);
    }
}
