use crate::codec::write_int32;
use crate::error::FrameError;
use crate::message::Message;

/// Appends one size-prefixed message to a batch blob.
pub fn write_frame(out: &mut Vec<u8>, message_bytes: &[u8]) {
    write_int32(out, message_bytes.len() as i32);
    out.extend_from_slice(message_bytes);
}

/// Splits a blob of `size:Int32` prefixed messages.
///
/// A prefix that overruns the blob yields one `Err` and the scan skips the
/// declared region. Trailing bytes too short to hold a prefix are ignored.
pub fn split_frames(blob: &[u8]) -> Frames<'_> {
    Frames { blob, pos: 0 }
}

/// Iterator returned by [`split_frames`].
#[derive(Debug, Clone)]
pub struct Frames<'a> {
    blob: &'a [u8],
    pos: usize,
}

impl Iterator for Frames<'_> {
    type Item = Result<Message, FrameError>;

    fn next(&mut self) -> Option<Self::Item> {
        // `pos` may sit past the end after an oversized region.
        if self.blob.len().saturating_sub(self.pos) < 4 {
            return None;
        }

        let offset = self.pos;
        let prefix = [
            self.blob[offset],
            self.blob[offset + 1],
            self.blob[offset + 2],
            self.blob[offset + 3],
        ];
        let size = u32::from_be_bytes(prefix) as usize;
        let start = offset + 4;
        let available = self.blob.len() - start;

        // Skip the declared region either way.
        self.pos = start.saturating_add(size);

        if size > available {
            return Some(Err(FrameError::new(offset, size, available)));
        }

        Some(Ok(Message::parse(self.blob[start..start + size].to_vec())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg_bytes(type_name: &str, id: i32, payload: i32) -> Vec<u8> {
        let mut m = Message::with_id(type_name, id);
        m.write_int32x(payload);
        m.into_bytes()
    }

    #[test]
    fn splits_consecutive_frames() {
        let mut blob = Vec::new();
        write_frame(&mut blob, &msg_bytes("A.a", 1, 10));
        write_frame(&mut blob, &msg_bytes("B.b", 2, 20));

        let out: Vec<_> = split_frames(&blob).collect();
        assert_eq!(out.len(), 2);

        let mut a = out[0].clone().unwrap();
        assert_eq!(a.type_name(), "A.a");
        assert_eq!(a.read_int32x(), 10);
        let b = out[1].clone().unwrap();
        assert_eq!(b.id(), 2);
    }

    #[test]
    fn oversized_frame_is_reported_not_fatal() {
        let mut blob = Vec::new();
        write_frame(&mut blob, &msg_bytes("Ok.first", 1, 1));
        // Declares 1000 bytes but provides 3.
        write_int32(&mut blob, 1000);
        blob.extend_from_slice(&[1, 2, 3]);

        let out: Vec<_> = split_frames(&blob).collect();
        assert_eq!(out.len(), 2);
        assert!(out[0].is_ok());
        let err = out[1].clone().unwrap_err();
        assert_eq!(err.declared, 1000);
        assert_eq!(err.available, 3);
    }

    #[test]
    fn maximal_size_prefix_ends_the_scan() {
        let mut blob = Vec::new();
        blob.extend_from_slice(&[0xFF, 0xFF, 0xFF, 0xFF]);
        write_frame(&mut blob, &msg_bytes("Never.seen", 1, 0));

        let mut frames = split_frames(&blob);
        let err = frames.next().unwrap().unwrap_err();
        assert_eq!(err.declared, u32::MAX as usize);
        assert!(frames.next().is_none());
        assert!(frames.next().is_none());
    }

    #[test]
    fn short_trailer_is_ignored() {
        let mut blob = Vec::new();
        write_frame(&mut blob, &msg_bytes("X.y", 4, 0));
        blob.extend_from_slice(&[0, 0]);
        assert_eq!(split_frames(&blob).count(), 1);
    }

    #[test]
    fn empty_blob_yields_nothing() {
        assert_eq!(split_frames(&[]).count(), 0);
    }
}
