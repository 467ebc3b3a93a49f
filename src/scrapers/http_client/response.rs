//! HTTP response wrapper.

use reqwest::{Response, StatusCode};

use super::super::FetchError;

/// HTTP response wrapper.
pub struct HttpResponse {
    pub status: StatusCode,
    pub(crate) response: Response,
}

impl HttpResponse {
    /// Check if the response is successful.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Fail with [`FetchError::Status`] unless the status is 2xx.
    pub fn error_for_status(self) -> Result<Self, FetchError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(FetchError::Status(self.status.as_u16()))
        }
    }

    /// Get response body as text.
    pub async fn text(self) -> Result<String, FetchError> {
        Ok(self.response.text().await?)
    }

    /// Parse the response body as a JSON value.
    ///
    /// The body is parsed loosely so that absent or oddly-typed fields can be
    /// handled by the caller instead of failing the whole payload.
    pub async fn json_value(self) -> Result<serde_json::Value, FetchError> {
        let body = self.response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}
