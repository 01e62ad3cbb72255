// ── Per-subscription query options ──

use std::time::Duration;

/// Options governing one subscription's polling, staleness, retention,
/// and enablement. The latest subscriber's options win for the shared
/// entry, mirroring how the newest mount configures a shared query.
#[derive(Debug, Clone)]
pub struct QueryOptions {
    /// Recurring background reload period. `None` disables polling.
    pub refetch_interval: Option<Duration>,
    /// Age past which a cached value triggers a background refresh on the
    /// next subscribe. `None` means the value never goes stale on its own.
    pub stale_time: Option<Duration>,
    /// How long a value remains retained after the last unsubscribe.
    /// `None` retains it for the cache's lifetime.
    pub cache_time: Option<Duration>,
    /// A disabled subscription exists but never loads; it renders as a
    /// neutral idle state, never as an error.
    pub enabled: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            refetch_interval: None,
            stale_time: Some(Duration::ZERO),
            cache_time: None,
            enabled: true,
        }
    }
}

impl QueryOptions {
    pub fn poll_every(mut self, interval: Duration) -> Self {
        self.refetch_interval = Some(interval);
        self
    }

    pub fn stale_after(mut self, window: Duration) -> Self {
        self.stale_time = Some(window);
        self
    }

    pub fn never_stale(mut self) -> Self {
        self.stale_time = None;
        self
    }

    pub fn drop_after(mut self, retention: Duration) -> Self {
        self.cache_time = Some(retention);
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}
