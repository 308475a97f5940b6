//! Structured data extraction.
//!
//! Profile pages usually carry the interesting fields twice: as JSON-LD
//! (`<script type="application/ld+json">`) and as Open Graph meta tags.

use std::collections::HashMap;
use std::sync::LazyLock;

use scraper::{Html, Selector};

use crate::utils::parse_selector_with_fallback;

static JSON_LD_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    parse_selector_with_fallback(r#"script[type="application/ld+json"]"#, "JSON-LD extraction")
});

static OPEN_GRAPH_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    parse_selector_with_fallback(r#"meta[property^="og:"]"#, "Open Graph extraction")
});

/// Extracts every JSON-LD object from the document.
///
/// Top-level arrays and `@graph` containers are flattened, so the result is a
/// flat list of nodes. Scripts that fail to parse are skipped.
pub fn extract_json_ld(document: &Html) -> Vec<serde_json::Value> {
    let mut nodes = Vec::new();
    for script in document.select(&JSON_LD_SELECTOR) {
        let text = script.text().collect::<String>();
        match serde_json::from_str::<serde_json::Value>(text.trim()) {
            Ok(value) => flatten_json_ld(value, &mut nodes),
            Err(e) => log::debug!("Skipping malformed JSON-LD block: {e}"),
        }
    }
    nodes
}

fn flatten_json_ld(value: serde_json::Value, out: &mut Vec<serde_json::Value>) {
    match value {
        serde_json::Value::Array(items) => {
            for item in items {
                flatten_json_ld(item, out);
            }
        }
        serde_json::Value::Object(mut map) => {
            if let Some(graph) = map.remove("@graph") {
                flatten_json_ld(graph, out);
            }
            if !map.is_empty() {
                out.push(serde_json::Value::Object(map));
            }
        }
        _ => {}
    }
}

/// Extracts Open Graph tags as `property -> content`, keeping the first value
/// of each property.
pub fn extract_open_graph(document: &Html) -> HashMap<String, String> {
    let mut tags = HashMap::new();
    for element in document.select(&OPEN_GRAPH_SELECTOR) {
        if let (Some(property), Some(content)) = (
            element.value().attr("property"),
            element.value().attr("content"),
        ) {
            let content = content.trim();
            if !content.is_empty() {
                tags.entry(property.to_string())
                    .or_insert_with(|| content.to_string());
            }
        }
    }
    tags
}
