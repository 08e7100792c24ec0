/// Boundary into the embedded application runtime.
///
/// Implementations may be called from the frame thread and from callbacks
/// running on other threads; they serialize access to the runtime themselves.
pub trait RuntimeLink: Send + Sync {
    /// Hands one encoded message to the runtime.
    ///
    /// Returns the encoded reply when the runtime answers within the same call.
    fn send_message(&self, bytes: &[u8]) -> Option<Vec<u8>>;
}

impl<F> RuntimeLink for F
where
    F: Fn(&[u8]) -> Option<Vec<u8>> + Send + Sync,
{
    fn send_message(&self, bytes: &[u8]) -> Option<Vec<u8>> {
        self(bytes)
    }
}
