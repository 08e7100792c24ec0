use std::fmt;

/// A malformed region inside a batched message blob.
///
/// Produced by [`split_frames`](crate::split_frames) when a size prefix declares
/// more bytes than remain. Scanning resumes after the declared region, which in
/// practice ends the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameError {
    /// Byte offset of the size prefix within the blob.
    pub offset: usize,
    /// Payload length the prefix declared.
    pub declared: usize,
    /// Bytes actually available after the prefix.
    pub available: usize,
}

impl FrameError {
    pub(crate) fn new(offset: usize, declared: usize, available: usize) -> Self {
        Self { offset, declared, available }
    }
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "message frame at byte {} declares {} bytes but only {} remain",
            self.offset, self.declared, self.available
        )
    }
}

impl std::error::Error for FrameError {}
