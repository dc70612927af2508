// Uniform response envelope
// Every endpoint answers with ServiceResponse, whether it succeeded or failed

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default records per page when only `page` is supplied
const DEFAULT_RECORDS_PER_PAGE: u32 = 10;
/// Upper bound on records per page
const MAX_RECORDS_PER_PAGE: u32 = 100;

/// JSON envelope wrapping every response body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceResponse<T> {
    pub data: Option<T>,
    pub is_success: bool,
    pub message: Option<String>,
    pub code: Option<u16>,
    pub exception_message: Option<serde_json::Value>,
    pub server_date_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub total_amount_records: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub total_amount_pages: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub current_page: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub records_per_page: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub page_index: Option<u32>,
}

impl<T> ServiceResponse<T> {
    fn empty(is_success: bool) -> Self {
        Self {
            data: None,
            is_success,
            message: None,
            code: None,
            exception_message: None,
            server_date_time: Utc::now(),
            total_amount_records: None,
            total_amount_pages: None,
            current_page: None,
            records_per_page: None,
            page_index: None,
        }
    }

    /// Successful envelope with the default message
    pub fn success(data: T) -> Self {
        Self::success_with_message(data, "Success.")
    }

    pub fn success_with_message(data: T, message: impl Into<String>) -> Self {
        let message = message.into();
        tracing::debug!("{}", message);

        Self {
            data: Some(data),
            message: Some(message),
            ..Self::empty(true)
        }
    }

    /// Successful envelope carrying one page of a larger result
    pub fn paginated(data: T, pagination: PaginationResult) -> Self {
        Self {
            total_amount_records: Some(pagination.total_amount_records),
            total_amount_pages: Some(pagination.total_amount_pages),
            current_page: Some(pagination.current_page),
            records_per_page: Some(pagination.records_per_page),
            page_index: Some(pagination.page_index),
            ..Self::success(data)
        }
    }

    /// Failure envelope; `data` is always null
    pub fn failure(
        message: impl Into<String>,
        code: u16,
        exception_message: Option<serde_json::Value>,
    ) -> Self {
        Self {
            message: Some(message.into()),
            code: Some(code),
            exception_message,
            ..Self::empty(false)
        }
    }
}

/// Optional paging query parameters
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    /// 1-indexed page number
    pub page: Option<u32>,
    pub records_per_page: Option<u32>,
}

impl PageRequest {
    /// True when the caller asked for paging at all
    pub fn is_requested(&self) -> bool {
        self.page.is_some() || self.records_per_page.is_some()
    }
}

/// Paging metadata copied into the envelope
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaginationResult {
    pub total_amount_records: f64,
    pub total_amount_pages: f64,
    pub current_page: f64,
    pub records_per_page: f64,
    pub page_index: u32,
}

/// Slice one page out of a full result set
///
/// Pages past the end yield an empty slice with accurate totals.
pub fn paginate<T>(items: Vec<T>, request: &PageRequest) -> (Vec<T>, PaginationResult) {
    let per_page = request
        .records_per_page
        .unwrap_or(DEFAULT_RECORDS_PER_PAGE)
        .clamp(1, MAX_RECORDS_PER_PAGE);
    let page = request.page.unwrap_or(1).max(1);

    let total = items.len();
    let total_pages = total.div_ceil(per_page as usize);
    let offset = (page as usize - 1).saturating_mul(per_page as usize);

    let slice: Vec<T> = items.into_iter().skip(offset).take(per_page as usize).collect();

    let pagination = PaginationResult {
        total_amount_records: total as f64,
        total_amount_pages: total_pages as f64,
        current_page: page as f64,
        records_per_page: per_page as f64,
        page_index: page - 1,
    };

    (slice, pagination)
}
