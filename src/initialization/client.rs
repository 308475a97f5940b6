//! HTTP client initialization.

use std::sync::Arc;
use std::time::Duration;

use reqwest::ClientBuilder;

use crate::config::Cli;

/// Maximum redirects followed per request.
const MAX_REDIRECTS: usize = 10;

/// Initializes the HTTP client used for profile requests.
///
/// Creates a `reqwest::Client` configured with:
/// - User-Agent header and request timeout from the CLI
/// - Redirect following (up to `MAX_REDIRECTS` hops)
///
/// # Errors
///
/// Returns a `reqwest::Error` if client creation fails.
pub fn init_client(cli: &Cli) -> Result<Arc<reqwest::Client>, reqwest::Error> {
    build_client(Duration::from_secs(cli.timeout_seconds), &cli.user_agent)
}

/// Builds a client from explicit settings.
pub fn build_client(
    timeout: Duration,
    user_agent: &str,
) -> Result<Arc<reqwest::Client>, reqwest::Error> {
    let client = ClientBuilder::new()
        .timeout(timeout)
        .user_agent(user_agent)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .build()?;
    Ok(Arc::new(client))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_init_client_from_cli_defaults() {
        let cli = Cli::parse_from(["profile_harvest", "input.json"]);
        assert!(init_client(&cli).is_ok());
    }
}
