use std::time::Duration;

/// Bus configuration.
#[derive(Debug, Clone, Default)]
pub struct BusConfig {
    /// Age after which an unanswered reply-correlation entry is dropped by
    /// [`Bus::expire_stale`](super::Bus::expire_stale).
    ///
    /// `None` keeps entries until answered.
    pub reply_timeout: Option<Duration>,
}
