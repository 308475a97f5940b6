//! Request building.

/// Browser-like request headers sent with every profile request.
///
/// Profile pages often serve a login wall or an empty shell to clients that
/// do not look like a browser. `Accept-Encoding` is left to reqwest.
pub(crate) struct RequestHeaders;

impl RequestHeaders {
    const ACCEPT: &'static str =
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";
    const ACCEPT_LANGUAGE: &'static str = "en-US,en;q=0.9";

    /// Applies the standard headers to a `reqwest::RequestBuilder`.
    pub(crate) fn apply_to_request_builder(
        builder: reqwest::RequestBuilder,
    ) -> reqwest::RequestBuilder {
        builder
            .header(reqwest::header::ACCEPT, Self::ACCEPT)
            .header(reqwest::header::ACCEPT_LANGUAGE, Self::ACCEPT_LANGUAGE)
            .header(reqwest::header::REFERER, "https://www.google.com/")
            .header(
                reqwest::header::HeaderName::from_static("sec-fetch-dest"),
                "document",
            )
            .header(
                reqwest::header::HeaderName::from_static("sec-fetch-mode"),
                "navigate",
            )
            .header(
                reqwest::header::HeaderName::from_static("sec-fetch-site"),
                "cross-site",
            )
            .header(reqwest::header::UPGRADE_INSECURE_REQUESTS, "1")
    }
}
