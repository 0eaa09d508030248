//! Pagination query parameters.

use serde::Deserialize;
use serde_json::json;
use serde_with::{DisplayFromStr, serde_as};

use crate::error::AppError;

/// Pagination query parameters.
///
/// Uses `serde_with` to parse page numbers from query strings as integers.
#[serde_as]
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub page: Option<u32>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub page_size: Option<u32>,
}

impl PaginationParams {
    const DEFAULT_PAGE_SIZE: u32 = 25;
    const MAX_PAGE_SIZE: u32 = 100;

    /// Validates the parameters and returns `(page, page_size)`.
    ///
    /// # Defaults
    ///
    /// - `page`: 1
    /// - `page_size`: 25
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if `page` is 0 or `page_size` is
    /// outside `1..=100`.
    pub fn resolve(&self) -> Result<(i64, i64), AppError> {
        let page = self.page.unwrap_or(1);
        let page_size = self.page_size.unwrap_or(Self::DEFAULT_PAGE_SIZE);

        if page == 0 {
            return Err(AppError::bad_request(
                "Page must be greater than 0",
                json!({ "page": page }),
            ));
        }

        if !(1..=Self::MAX_PAGE_SIZE).contains(&page_size) {
            return Err(AppError::bad_request(
                "Page size must be between 1 and 100",
                json!({ "page_size": page_size }),
            ));
        }

        Ok((i64::from(page), i64::from(page_size)))
    }
}
