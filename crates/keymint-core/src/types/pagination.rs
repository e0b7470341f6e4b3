//! Pagination types for audit log listing.

use serde::{Deserialize, Serialize};

/// Default number of log entries per page.
const DEFAULT_LIMIT: u32 = 100;
/// Maximum number of log entries per page.
const MAX_LIMIT: u32 = 1000;

/// Limit/offset window for paginated audit log queries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LogPage {
    /// Maximum number of entries to return.
    #[serde(default = "default_limit")]
    pub limit: u32,
    /// Number of entries to skip.
    #[serde(default)]
    pub offset: u32,
}

impl LogPage {
    /// Create a new page window, clamping the limit to the allowed range.
    pub fn new(limit: u32, offset: u32) -> Self {
        Self {
            limit: limit.clamp(1, MAX_LIMIT),
            offset,
        }
    }

    /// Return a copy with the limit clamped to the allowed range.
    ///
    /// Deserialized values bypass `new`, so callers normalize here.
    pub fn clamped(self) -> Self {
        Self::new(self.limit, self.offset)
    }
}

impl Default for LogPage {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_clamped() {
        assert_eq!(LogPage::new(0, 0).limit, 1);
        assert_eq!(LogPage::new(5000, 0).limit, MAX_LIMIT);
        assert_eq!(LogPage::new(50, 10).limit, 50);
    }

    #[test]
    fn test_default_window() {
        let page = LogPage::default();
        assert_eq!(page.limit, DEFAULT_LIMIT);
        assert_eq!(page.offset, 0);
    }
}
