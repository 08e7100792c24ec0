use std::sync::atomic::{AtomicI32, Ordering};

use crate::codec;

static NEXT_MESSAGE_ID: AtomicI32 = AtomicI32::new(1);

/// Outcome of [`Message::request_send`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SendDisposition {
    /// First request; the caller should transmit now.
    Transmit,
    /// First request on a deferred message; transmission happens when the
    /// deferring context completes.
    Deferred,
    /// `send` was already requested once; nothing to do.
    AlreadySent,
}

/// A typed message crossing the runtime boundary.
///
/// Wire layout (big-endian for fixed-width values):
///
/// ```text
/// message_id : Int32X
/// type_name  : Int32X count + Int32X[count] scalar values   (count 0 = reply)
/// payload    : Byte[...]
/// ```
///
/// Writes always append; reads advance an independent cursor. Reads past the
/// end yield zero-filled values and latch [`has_overrun`](Self::has_overrun).
#[derive(Debug, Clone, Default)]
pub struct Message {
    id: i32,
    type_name: String,
    data: Vec<u8>,
    position: usize,
    overrun: bool,

    // A deferred message records `send()` without transmitting so its owner
    // can return it synchronously once the current dispatch completes.
    defer_reply: bool,
    send_requested: bool,

    reply: Option<Box<Message>>,
}

impl Message {
    /// Creates an outbound message with the next process-unique id.
    pub fn new(type_name: &str) -> Self {
        let id = NEXT_MESSAGE_ID.fetch_add(1, Ordering::Relaxed);
        Self::with_id(type_name, id)
    }

    /// Creates an outbound message with an explicit id and writes the header.
    pub fn with_id(type_name: &str, id: i32) -> Self {
        let mut m = Self {
            id,
            type_name: type_name.to_string(),
            ..Self::default()
        };
        codec::write_int32x(&mut m.data, id);
        codec::write_string(&mut m.data, type_name);
        m
    }

    /// Creates a reply addressed to `request_id`.
    pub fn reply_to(request_id: i32, defer_reply: bool) -> Self {
        let mut m = Self::with_id("", request_id);
        m.defer_reply = defer_reply;
        m
    }

    /// Parses an inbound buffer. The read cursor is left at the payload start.
    pub fn parse(data: Vec<u8>) -> Self {
        let mut m = Self { data, ..Self::default() };
        m.id = m.read_int32x();
        m.type_name = m.read_string();
        m
    }

    #[inline]
    pub fn id(&self) -> i32 {
        self.id
    }

    #[inline]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// `true` for the distinguished empty type.
    #[inline]
    pub fn is_reply(&self) -> bool {
        self.type_name.is_empty()
    }

    /// Encoded header + payload.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Bytes left before the read cursor hits the end.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// `true` once any read ran past the end of the buffer.
    #[inline]
    pub fn has_overrun(&self) -> bool {
        self.overrun
    }

    #[inline]
    pub fn is_deferred(&self) -> bool {
        self.defer_reply
    }

    /// Marks this message as deferred. Replies created afterwards inherit it.
    #[inline]
    pub fn set_deferred(&mut self, deferred: bool) {
        self.defer_reply = deferred;
    }

    #[inline]
    pub fn send_requested(&self) -> bool {
        self.send_requested
    }

    // ── reply ─────────────────────────────────────────────────────────────

    /// Returns the reply, creating it on first call.
    ///
    /// The reply carries this message's id and inherits its deferred flag.
    pub fn reply(&mut self) -> &mut Message {
        let (id, defer) = (self.id, self.defer_reply);
        self.reply
            .get_or_insert_with(|| Box::new(Message::reply_to(id, defer)))
    }

    #[inline]
    pub fn has_reply(&self) -> bool {
        self.reply.is_some()
    }

    /// Detaches the reply, if one was created.
    pub fn take_reply(&mut self) -> Option<Message> {
        self.reply.take().map(|b| *b)
    }

    /// Records a send request and reports what the caller should do.
    ///
    /// Only the first call can return `Transmit` or `Deferred`.
    pub fn request_send(&mut self) -> SendDisposition {
        if self.send_requested {
            return SendDisposition::AlreadySent;
        }
        self.send_requested = true;
        if self.defer_reply {
            SendDisposition::Deferred
        } else {
            SendDisposition::Transmit
        }
    }

    // ── reading ───────────────────────────────────────────────────────────

    pub fn read_byte(&mut self) -> u8 {
        match self.data.get(self.position) {
            Some(&b) => {
                self.position += 1;
                b
            }
            None => {
                self.overrun = true;
                0
            }
        }
    }

    #[inline]
    pub fn read_logical(&mut self) -> bool {
        self.read_byte() != 0
    }

    pub fn read_int32(&mut self) -> i32 {
        let b = [self.read_byte(), self.read_byte(), self.read_byte(), self.read_byte()];
        i32::from_be_bytes(b)
    }

    pub fn read_int32x(&mut self) -> i32 {
        codec::decode_int32x(|| self.read_byte())
    }

    #[inline]
    pub fn read_real32(&mut self) -> f32 {
        f32::from_bits(self.read_int32() as u32)
    }

    pub fn read_real64(&mut self) -> f64 {
        let hi = self.read_int32() as u32 as u64;
        let lo = self.read_int32() as u32 as u64;
        f64::from_bits((hi << 32) | lo)
    }

    /// Reads a scalar-list string. Invalid scalar values are dropped.
    pub fn read_string(&mut self) -> String {
        let count = self.read_int32x();
        if count <= 0 {
            return String::new();
        }

        // Every scalar takes at least one byte; never trust `count` for capacity.
        let mut s = String::with_capacity((count as usize).min(self.remaining()));
        for _ in 0..count {
            let n = self.read_int32x();
            if self.overrun {
                break;
            }
            if let Some(ch) = u32::try_from(n).ok().and_then(char::from_u32) {
                s.push(ch);
            }
        }
        s
    }

    /// Reads 16 `Real32` values in column-major order.
    pub fn read_matrix(&mut self) -> [f32; 16] {
        let mut m = [0.0; 16];
        for v in m.iter_mut() {
            *v = self.read_real32();
        }
        m
    }

    /// Advances the read cursor by `count` bytes, clamped to the end.
    pub fn skip(&mut self, count: usize) {
        let target = self.position.saturating_add(count);
        if target > self.data.len() {
            self.overrun = true;
        }
        self.position = target.min(self.data.len());
    }

    // ── writing ───────────────────────────────────────────────────────────

    pub fn write_byte(&mut self, value: u8) -> &mut Self {
        codec::write_byte(&mut self.data, value);
        self
    }

    pub fn write_logical(&mut self, value: bool) -> &mut Self {
        codec::write_byte(&mut self.data, value as u8);
        self
    }

    pub fn write_int32(&mut self, value: i32) -> &mut Self {
        codec::write_int32(&mut self.data, value);
        self
    }

    pub fn write_int32x(&mut self, value: i32) -> &mut Self {
        codec::write_int32x(&mut self.data, value);
        self
    }

    pub fn write_real32(&mut self, value: f32) -> &mut Self {
        codec::write_real32(&mut self.data, value);
        self
    }

    pub fn write_real64(&mut self, value: f64) -> &mut Self {
        codec::write_real64(&mut self.data, value);
        self
    }

    pub fn write_string(&mut self, value: &str) -> &mut Self {
        codec::write_string(&mut self.data, value);
        self
    }

    /// Appends pre-encoded bytes verbatim.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.data.extend_from_slice(bytes);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── identity ──────────────────────────────────────────────────────────

    #[test]
    fn ids_increase() {
        let a = Message::new("A.a");
        let b = Message::new("A.a");
        assert!(b.id() > a.id());
    }

    #[test]
    fn header_round_trip() {
        let mut out = Message::new("Display.render");
        out.write_int32x(0).write_int32x(640).write_int32x(480);
        let id = out.id();

        let mut back = Message::parse(out.into_bytes());
        assert_eq!(back.id(), id);
        assert_eq!(back.type_name(), "Display.render");
        assert!(!back.is_reply());
        assert_eq!(back.read_int32x(), 0);
        assert_eq!(back.read_int32x(), 640);
        assert_eq!(back.read_int32x(), 480);
        assert!(!back.has_overrun());
    }

    #[test]
    fn empty_type_is_reply() {
        let back = Message::parse(Message::reply_to(77, false).into_bytes());
        assert!(back.is_reply());
        assert_eq!(back.id(), 77);
    }

    // ── reply / send ──────────────────────────────────────────────────────

    #[test]
    fn reply_is_lazy_and_unique() {
        let mut m = Message::with_id("Q.q", 9);
        assert!(!m.has_reply());
        m.reply().write_int32x(5);
        m.reply().write_int32x(6);
        let mut r = Message::parse(m.take_reply().unwrap().into_bytes());
        assert_eq!(r.id(), 9);
        assert_eq!(r.read_int32x(), 5);
        assert_eq!(r.read_int32x(), 6);
    }

    #[test]
    fn reply_inherits_deferred_flag() {
        let mut m = Message::with_id("Q.q", 3);
        m.set_deferred(true);
        assert!(m.reply().is_deferred());
    }

    #[test]
    fn send_is_requested_once() {
        let mut m = Message::new("X.y");
        assert_eq!(m.request_send(), SendDisposition::Transmit);
        assert_eq!(m.request_send(), SendDisposition::AlreadySent);
        assert!(m.send_requested());
    }

    #[test]
    fn deferred_send_records_intent() {
        let mut m = Message::reply_to(1, true);
        assert_eq!(m.request_send(), SendDisposition::Deferred);
        assert_eq!(m.request_send(), SendDisposition::AlreadySent);
    }

    // ── primitives ────────────────────────────────────────────────────────

    #[test]
    fn primitives_round_trip() {
        let mut m = Message::with_id("P.p", 1);
        m.write_byte(0xAB)
            .write_logical(true)
            .write_int32(-123_456)
            .write_real32(1.5)
            .write_real64(-2.25)
            .write_string("héllo ✓");

        let mut r = Message::parse(m.into_bytes());
        assert_eq!(r.read_byte(), 0xAB);
        assert!(r.read_logical());
        assert_eq!(r.read_int32(), -123_456);
        assert_eq!(r.read_real32(), 1.5);
        assert_eq!(r.read_real64(), -2.25);
        assert_eq!(r.read_string(), "héllo ✓");
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn empty_string_round_trip() {
        let mut m = Message::with_id("S.s", 1);
        m.write_string("");
        let mut r = Message::parse(m.into_bytes());
        assert_eq!(r.read_string(), "");
        assert!(!r.has_overrun());
    }

    #[test]
    fn invalid_scalars_are_skipped() {
        let mut m = Message::with_id("S.s", 1);
        m.write_int32x(3).write_int32x('a' as i32).write_int32x(0xD800).write_int32x('b' as i32);
        let mut r = Message::parse(m.into_bytes());
        assert_eq!(r.read_string(), "ab");
    }

    #[test]
    fn huge_declared_string_stops_at_end() {
        let mut m = Message::with_id("S.s", 1);
        m.write_int32x(i32::MAX).write_int32x('z' as i32);
        let mut r = Message::parse(m.into_bytes());
        assert_eq!(r.read_string(), "z");
        assert!(r.has_overrun());
    }

    // ── leniency ──────────────────────────────────────────────────────────

    #[test]
    fn read_past_end_is_zero() {
        let mut r = Message::parse(Message::with_id("E.e", 1).into_bytes());
        assert_eq!(r.read_int32(), 0);
        assert_eq!(r.read_real64(), 0.0);
        assert!(r.has_overrun());
    }

    #[test]
    fn skip_clamps_to_end() {
        let mut m = Message::with_id("K.k", 1);
        m.write_int32(7);
        let mut r = Message::parse(m.into_bytes());
        r.skip(2);
        assert_eq!(r.remaining(), 2);
        r.skip(100);
        assert_eq!(r.remaining(), 0);
        assert!(r.has_overrun());
    }
}
