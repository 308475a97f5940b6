//! CSS selector parsing utilities.

use scraper::Selector;

/// Parses a CSS selector, falling back to one that matches nothing.
///
/// Extraction selectors are constants, so a parse failure is a programming error;
/// it is logged instead of panicking so a bad selector only loses that field.
pub fn parse_selector_with_fallback(selector_str: &str, context: &str) -> Selector {
    Selector::parse(selector_str).unwrap_or_else(|e| {
        log::error!(
            "Failed to parse CSS selector '{}' in {}: {}. Using fallback selector.",
            selector_str,
            context,
            e
        );
        match Selector::parse("*:not(*)") {
            Ok(selector) => selector,
            Err(_) => unreachable!("'*:not(*)' is a valid selector"),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn test_valid_selector() {
        let selector = parse_selector_with_fallback("title", "test");
        let doc = Html::parse_document("<html><head><title>x</title></head></html>");
        assert_eq!(doc.select(&selector).count(), 1);
    }

    #[test]
    fn test_invalid_selector_matches_nothing() {
        let selector = parse_selector_with_fallback("[[[", "test");
        let doc = Html::parse_document("<html><head><title>x</title></head></html>");
        assert_eq!(doc.select(&selector).count(), 0);
    }
}
