use std::time::Duration;

/// Errors from the provider adapter layer.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("provider request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Provider returned a non-2xx status code.
    #[error("provider API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// Provider rejected the request for lack of account credit.
    #[error("insufficient account credit: {0}")]
    InsufficientCredit(String),

    /// Response body did not match the expected shape.
    #[error("failed to decode provider response: {0}")]
    Decode(#[from] serde_json::Error),

    /// An activity-level deadline elapsed before the provider answered.
    #[error("provider call timed out after {after:?}")]
    Timeout { after: Duration },

    /// The adapter was handed parameters for a different provider.
    #[error("unsupported input for this provider: {0}")]
    InvalidInput(String),
}

impl ProviderError {
    /// Permanent errors abort a workflow immediately instead of consuming
    /// polling attempts or start retries.
    ///
    /// 4xx responses are permanent except 408 (request timeout) and
    /// 429 (rate limited), which are worth retrying.
    pub fn is_permanent(&self) -> bool {
        match self {
            ProviderError::Api { status, .. } => {
                (400..500).contains(status) && *status != 408 && *status != 429
            }
            ProviderError::InsufficientCredit(_)
            | ProviderError::Decode(_)
            | ProviderError::InvalidInput(_) => true,
            ProviderError::Request(_) | ProviderError::Timeout { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_are_permanent() {
        let err = ProviderError::Api {
            status: 400,
            body: "malformed request".into(),
        };
        assert!(err.is_permanent());
    }

    #[test]
    fn rate_limit_and_request_timeout_are_transient() {
        for status in [408, 429] {
            let err = ProviderError::Api {
                status,
                body: "slow down".into(),
            };
            assert!(!err.is_permanent(), "status {status} should be retryable");
        }
    }

    #[test]
    fn server_errors_are_transient() {
        let err = ProviderError::Api {
            status: 503,
            body: "unavailable".into(),
        };
        assert!(!err.is_permanent());
    }

    #[test]
    fn credit_exhaustion_is_permanent() {
        assert!(ProviderError::InsufficientCredit("balance 0".into()).is_permanent());
    }

    #[test]
    fn activity_timeout_is_transient() {
        let err = ProviderError::Timeout {
            after: Duration::from_secs(30),
        };
        assert!(!err.is_permanent());
    }
}
