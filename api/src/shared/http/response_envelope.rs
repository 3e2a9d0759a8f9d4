//! JSON envelope shared by every route: `{ "success", "data"?, "error"? }`.
//!
//! Successful handlers wrap their payload with [`ApiResponse::success`];
//! [`AppError`](crate::error_handler::AppError) and the body-rejection
//! middleware build the failure shape.

use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T>
where
    T: Serialize,
{
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    /// Stable, machine-readable code (e.g. `UNPROCESSABLE_ENTITY`).
    pub code: &'static str,
    pub message: String,
    /// Echoed from `X-Request-Id` so a rejected quote can be found in the logs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<ApiErrorDetail>,
}

/// Points at the offending part of a quote payload.
#[derive(Debug, Default, Serialize)]
pub struct ApiErrorDetail {
    /// Top-level body field, e.g. `lines` or `urls`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ApiErrorDetail {
    fn is_empty(&self) -> bool {
        self.path.is_none() && self.hint.is_none()
    }
}

impl<T> ApiResponse<T>
where
    T: Serialize,
{
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn failure(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError {
                code,
                message: message.into(),
                request_id: None,
                details: Vec::new(),
            }),
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        if let Some(err) = self.error.as_mut() {
            err.request_id = Some(request_id.into());
        }
        self
    }

    /// Attach a detail; details with neither path nor hint are dropped.
    pub fn with_detail(mut self, detail: ApiErrorDetail) -> Self {
        if detail.is_empty() {
            return self;
        }
        if let Some(err) = self.error.as_mut() {
            err.details.push(detail);
        }
        self
    }
}
