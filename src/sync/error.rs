/// Error types for the translation synchronization engine
///
/// Only provider-side failures are errors. A malformed provider reply degrades
/// to a partial parse, a late completion is discarded, and a selection that
/// cannot be aligned yields no highlight; none of those use this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// The provider answered but the call failed (HTTP error status, unusable body)
    ProviderError(String),
    /// The provider refused the call because of rate limiting
    RateLimited(String),
    /// Transport-level failure talking to the provider
    NetworkError(String),
    /// Missing or invalid configuration (API key, endpoint, settings)
    ConfigError(String),
    /// A language tag failed validation
    InvalidLanguage(String),
}

impl SyncError {
    /// Short message suitable for a transient notice in the UI
    pub fn notice(&self) -> String {
        match self {
            SyncError::RateLimited(_) => "Translation paused: rate limit reached".to_string(),
            SyncError::NetworkError(_) => "Translation unavailable: network error".to_string(),
            _ => "Translation failed".to_string(),
        }
    }
}

impl std::fmt::Display for SyncError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncError::ProviderError(msg) => write!(f, "Provider error: {}", msg),
            SyncError::RateLimited(msg) => write!(f, "Rate limited: {}", msg),
            SyncError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            SyncError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            SyncError::InvalidLanguage(msg) => write!(f, "Invalid language: {}", msg),
        }
    }
}

impl std::error::Error for SyncError {}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        SyncError::NetworkError(err.to_string())
    }
}

/// Result type for engine and provider operations
pub type SyncResult<T> = Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_message() {
        let err = SyncError::ProviderError("500 Internal Server Error".to_string());
        assert_eq!(err.to_string(), "Provider error: 500 Internal Server Error");
    }

    #[test]
    fn test_notice_for_rate_limit() {
        let err = SyncError::RateLimited("slow down".to_string());
        assert!(err.notice().contains("rate limit"));
    }

    #[test]
    fn test_notice_does_not_leak_details() {
        let err = SyncError::ProviderError("key sk-123 rejected".to_string());
        assert!(!err.notice().contains("sk-123"));
    }
}
