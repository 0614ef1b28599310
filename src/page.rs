//! Pagination container.

use serde::Serialize;

/// Page number used when the requested one is below 1.
pub const DEFAULT_PAGE: i64 = 1;
/// Page size used when the requested one is below 1.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// One page of results.
///
/// Created by the caller with the requested page number (1-based) and size,
/// then filled by the paginated selects: `total` after the count step,
/// `records` after the bounded fetch. The fill also writes back the clamped
/// page number and size, so the helpers below agree with the configured
/// page size afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<R> {
    pub current: i64,
    pub size: i64,
    pub total: i64,
    pub records: Vec<R>,
}

impl<R> Page<R> {
    pub fn new(current: i64, size: i64) -> Self {
        Self {
            current,
            size,
            total: 0,
            records: Vec::new(),
        }
    }

    /// Page number after clamping (`< 1` becomes 1).
    pub fn page_number(&self) -> i64 {
        if self.current < 1 {
            DEFAULT_PAGE
        } else {
            self.current
        }
    }

    /// Page size after clamping (`< 1` becomes [`DEFAULT_PAGE_SIZE`]).
    pub fn limit(&self) -> u64 {
        self.clamped_size(DEFAULT_PAGE_SIZE)
    }

    /// Rows to skip: `(page - 1) * size`, after clamping.
    pub fn offset(&self) -> u64 {
        self.bounds(DEFAULT_PAGE_SIZE).0
    }

    /// `(offset, limit)` with `fallback_size` used for sizes below 1.
    pub fn bounds(&self, fallback_size: i64) -> (u64, u64) {
        let limit = self.clamped_size(fallback_size);
        let page = self.page_number().unsigned_abs();
        ((page - 1).saturating_mul(limit), limit)
    }

    /// Number of pages needed for `total` rows.
    pub fn pages(&self) -> i64 {
        match u64::try_from(self.total) {
            Ok(total) if total > 0 => total.div_ceil(self.limit()) as i64,
            _ => 0,
        }
    }

    fn clamped_size(&self, fallback_size: i64) -> u64 {
        if self.size < 1 {
            fallback_size.max(1).unsigned_abs()
        } else {
            self.size.unsigned_abs()
        }
    }
}

impl<R> Default for Page<R> {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE, DEFAULT_PAGE_SIZE)
    }
}
