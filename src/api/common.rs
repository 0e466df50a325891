//! Common API utilities and shared types

use serde::Deserialize;

use crate::models::ListParams;

/// Default page number (1-indexed)
fn default_page() -> u32 {
    1
}

/// Default page size
fn default_size() -> u32 {
    20
}

/// Pagination query parameters; `size` is capped at 100.
#[derive(Debug, Deserialize)]
pub struct PaginationQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_size")]
    pub size: u32,
}

impl PaginationQuery {
    /// Convert into clamped list parameters
    pub fn params(&self) -> ListParams {
        ListParams::new(self.page, self.size)
    }
}
