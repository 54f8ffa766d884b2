//! Hub configuration

/// Preview cache ceiling: first 2 MiB of a session
pub const DEFAULT_PREVIEW_CACHE_LIMIT: usize = 2 * 1024 * 1024;

/// Units a viewer may fall behind before data is dropped for it
pub const DEFAULT_SUBSCRIBER_CAPACITY: usize = 128;

/// Configuration for the live hub
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Maximum bytes of a session kept for late joiners
    pub preview_cache_limit: usize,

    /// Capacity of each subscriber queue, in units
    pub subscriber_capacity: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            preview_cache_limit: DEFAULT_PREVIEW_CACHE_LIMIT,
            subscriber_capacity: DEFAULT_SUBSCRIBER_CAPACITY,
        }
    }
}

impl HubConfig {
    /// Set the preview cache ceiling
    pub fn preview_cache_limit(mut self, limit: usize) -> Self {
        self.preview_cache_limit = limit;
        self
    }

    /// Set the per-subscriber queue capacity (at least 1)
    pub fn subscriber_capacity(mut self, capacity: usize) -> Self {
        self.subscriber_capacity = capacity.max(1);
        self
    }
}
