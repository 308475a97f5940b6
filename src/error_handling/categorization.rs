//! Error categorization and retry strategies.
//!
//! Maps `anyhow` error chains onto [`FailureKind`] and decides which fetch errors are
//! worth retrying.

use std::time::Duration;
use tokio_retry::strategy::ExponentialBackoff;

use super::types::{FailureKind, FetchError};
use crate::config::{HTTP_STATUS_TOO_MANY_REQUESTS, RETRY_FACTOR};

/// Exponential backoff settings for a retried operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay before the first retry, in milliseconds.
    pub initial_delay_ms: u64,
    /// Retries after the first attempt. Zero disables retrying.
    pub attempts: usize,
}

impl RetryPolicy {
    /// Policy for page fetches (`RETRY_INITIAL_DELAY_MS`, `RETRY_MAX_ATTEMPTS`).
    pub fn fetch_default() -> Self {
        Self {
            initial_delay_ms: crate::config::RETRY_INITIAL_DELAY_MS,
            attempts: crate::config::RETRY_MAX_ATTEMPTS,
        }
    }

    /// Policy for record sink writes.
    pub fn sink_default() -> Self {
        Self {
            initial_delay_ms: crate::config::SINK_RETRY_INITIAL_DELAY_MS,
            attempts: crate::config::SINK_RETRY_MAX_ATTEMPTS,
        }
    }

    /// No retries at all.
    pub fn none() -> Self {
        Self {
            initial_delay_ms: 0,
            attempts: 0,
        }
    }

    /// Delays between attempts, ready for use with `tokio_retry`.
    ///
    /// `ExponentialBackoff::from_millis(base)` yields `base^n * factor`, so the base
    /// is `RETRY_FACTOR` and the factor scales the first delay to `initial_delay_ms`.
    /// Every delay is capped at `RETRY_MAX_DELAY_SECS`.
    pub fn strategy(&self) -> impl Iterator<Item = Duration> {
        ExponentialBackoff::from_millis(RETRY_FACTOR)
            .factor((self.initial_delay_ms / RETRY_FACTOR).max(1))
            .max_delay(Duration::from_secs(crate::config::RETRY_MAX_DELAY_SECS))
            .take(self.attempts)
    }
}

/// Categorizes a `reqwest::Error` into a [`FailureKind`].
pub fn categorize_reqwest_error(error: &reqwest::Error) -> FailureKind {
    if let Some(status) = error.status() {
        return categorize_status(status.as_u16());
    }
    if error.is_timeout() {
        FailureKind::Timeout
    } else if error.is_connect() {
        FailureKind::Connect
    } else if error.is_builder() {
        FailureKind::InvalidTarget
    } else {
        FailureKind::Other
    }
}

/// Categorizes a non-success HTTP status code.
pub fn categorize_status(status: u16) -> FailureKind {
    match status {
        401 | 403 | 999 => FailureKind::Forbidden,
        404 | 410 => FailureKind::NotFound,
        HTTP_STATUS_TOO_MANY_REQUESTS => FailureKind::TooManyRequests,
        500..=599 => FailureKind::ServerError,
        _ => FailureKind::HttpStatus,
    }
}

/// Walks an error chain and returns the most specific [`FailureKind`] found.
///
/// Errors this crate raises itself ([`FetchError`]) and transport errors
/// (`reqwest::Error`) are recognized by downcasting. Anything else is `Other`.
pub fn categorize_error(error: &anyhow::Error) -> FailureKind {
    for cause in error.chain() {
        if let Some(fetch_err) = cause.downcast_ref::<FetchError>() {
            return match fetch_err {
                FetchError::InvalidTarget(_) => FailureKind::InvalidTarget,
                FetchError::BodyTooLarge { .. } => FailureKind::BodyTooLarge,
                FetchError::NoProfileData(_) => FailureKind::NoProfileData,
                FetchError::Timeout(_) => FailureKind::Timeout,
            };
        }
        if let Some(reqwest_err) = cause.downcast_ref::<reqwest::Error>() {
            return categorize_reqwest_error(reqwest_err);
        }
        if cause.downcast_ref::<url::ParseError>().is_some() {
            return FailureKind::InvalidTarget;
        }
    }
    FailureKind::Other
}

/// Determines if a fetch error is worth retrying.
///
/// # Retriable
///
/// - Timeouts, connection failures and request errors
/// - Server errors (5xx) and 429 Too Many Requests
///
/// # Not retriable
///
/// - Other client errors (4xx), which include login walls
/// - Invalid targets, oversized bodies and pages without profile data
/// - Redirect and decode errors
pub(crate) fn is_retriable_error(error: &anyhow::Error) -> bool {
    for cause in error.chain() {
        if cause.downcast_ref::<FetchError>().is_some() {
            return false;
        }
        if cause.downcast_ref::<url::ParseError>().is_some() {
            return false;
        }
        if let Some(reqwest_err) = cause.downcast_ref::<reqwest::Error>() {
            if let Some(status) = reqwest_err.status() {
                let status_code = status.as_u16();
                if status_code == HTTP_STATUS_TOO_MANY_REQUESTS {
                    return true;
                }
                return (500..600).contains(&status_code);
            }
            if reqwest_err.is_redirect() || reqwest_err.is_decode() || reqwest_err.is_builder() {
                return false;
            }
            if reqwest_err.is_timeout() || reqwest_err.is_connect() || reqwest_err.is_request() {
                return true;
            }
        }
    }
    // Unknown errors might be transient
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_retry_strategy_is_bounded() {
        let delays: Vec<_> = RetryPolicy::fetch_default().strategy().collect();
        assert_eq!(delays.len(), crate::config::RETRY_MAX_ATTEMPTS);
        for delay in delays {
            assert!(delay <= Duration::from_secs(crate::config::RETRY_MAX_DELAY_SECS));
        }
    }

    #[test]
    fn test_retry_strategy_grows() {
        let policy = RetryPolicy {
            initial_delay_ms: 200,
            attempts: 3,
        };
        let delays: Vec<_> = policy.strategy().collect();
        assert_eq!(delays.len(), 3);
        assert_eq!(delays[0], Duration::from_millis(200));
        assert!(delays[1] > delays[0]);
        assert!(delays[2] > delays[1]);
    }

    #[test]
    fn test_default_item_timeout_covers_fetch_retries() {
        let policy = RetryPolicy::fetch_default();
        let backoff: Duration = policy.strategy().sum();
        let requests = Duration::from_secs(crate::config::DEFAULT_HTTP_TIMEOUT_SECS)
            * (policy.attempts as u32 + 1);
        assert!(
            requests + backoff < Duration::from_secs(crate::config::DEFAULT_ITEM_TIMEOUT_SECS),
            "fetch retry budget {:?} exceeds the item timeout",
            requests + backoff
        );
    }

    #[test]
    fn test_retry_policy_none() {
        assert_eq!(RetryPolicy::none().strategy().count(), 0);
    }

    #[test]
    fn test_categorize_status() {
        assert_eq!(categorize_status(404), FailureKind::NotFound);
        assert_eq!(categorize_status(410), FailureKind::NotFound);
        assert_eq!(categorize_status(403), FailureKind::Forbidden);
        assert_eq!(categorize_status(401), FailureKind::Forbidden);
        assert_eq!(categorize_status(999), FailureKind::Forbidden);
        assert_eq!(categorize_status(429), FailureKind::TooManyRequests);
        assert_eq!(categorize_status(503), FailureKind::ServerError);
        assert_eq!(categorize_status(418), FailureKind::HttpStatus);
    }

    #[test]
    fn test_categorize_fetch_errors() {
        let err = anyhow::Error::new(FetchError::InvalidTarget("nope".into()));
        assert_eq!(categorize_error(&err), FailureKind::InvalidTarget);

        let err = anyhow::Error::new(FetchError::Timeout(5));
        assert_eq!(categorize_error(&err), FailureKind::Timeout);

        let err = anyhow::Error::new(FetchError::NoProfileData("x".into()))
            .context("Failed to extract profile");
        assert_eq!(categorize_error(&err), FailureKind::NoProfileData);
    }

    #[test]
    fn test_categorize_url_parse_error() {
        let err: anyhow::Error = url::ParseError::EmptyHost.into();
        assert_eq!(categorize_error(&err), FailureKind::InvalidTarget);
    }

    #[test]
    fn test_categorize_unknown_error() {
        let err = anyhow::anyhow!("timeout");
        assert_eq!(categorize_error(&err), FailureKind::Other);
    }

    #[test]
    fn test_fetch_errors_are_not_retriable() {
        let err = anyhow::Error::new(FetchError::BodyTooLarge { size: 10, limit: 1 });
        assert!(!is_retriable_error(&err));
        let err = anyhow::Error::new(FetchError::NoProfileData("x".into()));
        assert!(!is_retriable_error(&err));
    }

    #[test]
    fn test_url_parse_error_is_not_retriable() {
        let err: anyhow::Error = url::ParseError::EmptyHost.into();
        assert!(!is_retriable_error(&err));
    }

    #[test]
    fn test_unknown_error_is_retriable() {
        let err = anyhow::anyhow!("Some unknown error");
        assert!(is_retriable_error(&err));
    }
}
