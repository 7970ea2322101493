//! Query pagination.

/// Pagination applied to index query results.
///
/// Results are first put in query order (reversed if requested), then
/// `skip` entries are dropped, then at most `limit` are kept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// Maximum number of results. `None` is unlimited.
    pub limit: Option<usize>,
    /// Number of leading results to drop.
    pub skip: usize,
    /// Return results in descending order.
    pub reverse: bool,
}

impl QueryOptions {
    /// Creates options that return everything in ascending order.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            limit: None,
            skip: 0,
            reverse: false,
        }
    }

    /// Sets the result limit.
    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets how many results to skip.
    #[must_use]
    pub const fn skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    /// Sets descending order.
    #[must_use]
    pub const fn reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    /// Applies the options to a result list in ascending order.
    #[must_use]
    pub fn apply<T>(&self, mut items: Vec<T>) -> Vec<T> {
        if self.reverse {
            items.reverse();
        }
        let limit = self.limit.unwrap_or(usize::MAX);
        items.into_iter().skip(self.skip).take(limit).collect()
    }
}

/// Applies optional pagination.
pub(crate) fn paginate<T>(items: Vec<T>, opts: Option<&QueryOptions>) -> Vec<T> {
    match opts {
        Some(opts) => opts.apply(items),
        None => items,
    }
}
