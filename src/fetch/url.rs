//! Target URL validation and normalization.

use crate::config::MAX_URL_LENGTH;
use crate::error_handling::FetchError;

/// Validates and normalizes a profile target.
///
/// Adds an `https://` prefix if the scheme is missing, then checks that the URL
/// parses, uses http or https and has a host. Targets longer than `MAX_URL_LENGTH`
/// (before or after normalization) are rejected.
///
/// # Errors
///
/// Returns [`FetchError::InvalidTarget`] describing why the target was rejected.
pub fn validate_and_normalize_url(target: &str) -> Result<String, FetchError> {
    let target = target.trim();
    if target.is_empty() {
        return Err(FetchError::InvalidTarget("empty target".to_string()));
    }
    if target.len() > MAX_URL_LENGTH {
        return Err(FetchError::InvalidTarget(format!(
            "target exceeds maximum length ({} > {MAX_URL_LENGTH})",
            target.len()
        )));
    }

    let normalized = if target.contains("://") {
        target.to_string()
    } else {
        format!("https://{target}")
    };
    if normalized.len() > MAX_URL_LENGTH {
        return Err(FetchError::InvalidTarget(format!(
            "normalized target exceeds maximum length ({} > {MAX_URL_LENGTH})",
            normalized.len()
        )));
    }

    let parsed = url::Url::parse(&normalized)
        .map_err(|e| FetchError::InvalidTarget(format!("{target}: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(FetchError::InvalidTarget(format!(
                "unsupported scheme '{scheme}' in {target}"
            )))
        }
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(FetchError::InvalidTarget(format!("{target}: missing host")));
    }

    Ok(parsed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adds_https_prefix() {
        assert_eq!(
            validate_and_normalize_url("www.linkedin.com/in/jane-doe").unwrap(),
            "https://www.linkedin.com/in/jane-doe"
        );
    }

    #[test]
    fn test_preserves_http() {
        assert_eq!(
            validate_and_normalize_url("http://example.com/in/x").unwrap(),
            "http://example.com/in/x"
        );
    }

    #[test]
    fn test_rejects_unsupported_scheme() {
        let err = validate_and_normalize_url("ftp://example.com/in/x").unwrap_err();
        assert!(err.to_string().contains("unsupported scheme 'ftp'"));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(validate_and_normalize_url("https://").is_err());
        assert!(validate_and_normalize_url("   ").is_err());
    }

    #[test]
    fn test_rejects_overlong_target() {
        let long = format!("https://example.com/{}", "a".repeat(MAX_URL_LENGTH));
        let err = validate_and_normalize_url(&long).unwrap_err();
        assert!(err.to_string().contains("maximum length"));
    }
}
