//! Store configuration.

/// Default upper bound on key length, matching common embedded B+tree stores.
pub const DEFAULT_MAX_KEY_SIZE: usize = 32 * 1024;

/// Configuration for opening a [`crate::Store`].
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Whether to create the store file if it doesn't exist.
    pub create_if_missing: bool,

    /// Whether to sync the commit log on every commit (safer but slower).
    pub sync_on_commit: bool,

    /// Largest key accepted by bucket `put`.
    pub max_key_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            sync_on_commit: true,
            max_key_size: DEFAULT_MAX_KEY_SIZE,
        }
    }
}

impl StoreConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to create the store if missing.
    #[must_use]
    pub const fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Sets whether to sync the log on every commit.
    #[must_use]
    pub const fn sync_on_commit(mut self, value: bool) -> Self {
        self.sync_on_commit = value;
        self
    }

    /// Sets the maximum key size.
    #[must_use]
    pub const fn max_key_size(mut self, size: usize) -> Self {
        self.max_key_size = size;
        self
    }
}
