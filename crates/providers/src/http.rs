//! Shared HTTP response handling for provider clients.

use serde::de::DeserializeOwned;
use tracing::warn;

use crate::error::ProviderError;

/// Ensure the response has a success status code.
///
/// 402 is mapped to [`ProviderError::InsufficientCredit`] so workflows can
/// abort without burning retries; any other non-2xx becomes
/// [`ProviderError::Api`] carrying the status and raw body.
pub(crate) async fn ensure_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<unreadable body>".to_string());
    if status == reqwest::StatusCode::PAYMENT_REQUIRED {
        warn!(status = status.as_u16(), "provider refused request for lack of credit");
        return Err(ProviderError::InsufficientCredit(body));
    }
    warn!(status = status.as_u16(), body = %body, "provider request failed");
    Err(ProviderError::Api {
        status: status.as_u16(),
        body,
    })
}

/// Parse a successful JSON response body into the expected type.
pub(crate) async fn parse_json<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ProviderError> {
    let response = ensure_success(response).await?;
    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}
