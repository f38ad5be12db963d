//! Paging arithmetic shared by every feed.

use serde::{Deserialize, Serialize};

/// Page size used by every paginated feed.
pub const PAGE_SIZE: u32 = 10;

/// A `skip`/`limit` window onto a server-side list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub skip: u64,
    pub limit: u32,
}

impl PageRequest {
    /// Window for the zero-based `page_index` at [`PAGE_SIZE`].
    pub fn for_page(page_index: u32) -> Self {
        Self::with_size(page_index, PAGE_SIZE)
    }

    pub fn with_size(page_index: u32, page_size: u32) -> Self {
        Self {
            skip: u64::from(page_index) * u64::from(page_size),
            limit: page_size,
        }
    }

    /// First page at [`PAGE_SIZE`].
    pub fn first() -> Self {
        Self::for_page(0)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first()
    }
}
