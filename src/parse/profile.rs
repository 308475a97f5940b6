//! Profile page extraction.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use serde::Serialize;
use serde_json::Value;

use super::structured::{extract_json_ld, extract_open_graph};
use crate::error_handling::FetchError;
use crate::utils::parse_selector_with_fallback;

const SLUG_PATTERN: &str = r"/(?:in|company)/([^/?#]+)";

/// Paths a profile request lands on when the site wants a login first.
const LOGIN_WALL_PATHS: &[&str] = &["/authwall", "/login", "/uas/login", "/checkpoint"];

static SLUG_REGEX: LazyLock<Option<Regex>> = LazyLock::new(|| match Regex::new(SLUG_PATTERN) {
    Ok(re) => Some(re),
    Err(e) => {
        log::error!("Failed to compile slug pattern '{SLUG_PATTERN}': {e}");
        None
    }
});

static TITLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| parse_selector_with_fallback("title", "profile title"));

static META_DESCRIPTION_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    parse_selector_with_fallback("meta[name='description']", "profile description")
});

/// The structured payload produced for one successfully fetched profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePage {
    /// The target as it appeared in the request.
    pub profile_url: String,
    /// URL after redirects.
    pub final_url: String,
    pub http_status: u16,
    /// Last path segment of an `/in/<slug>` or `/company/<slug>` URL.
    pub slug: Option<String>,
    pub name: String,
    pub headline: Option<String>,
    pub location: Option<String>,
    pub about: Option<String>,
    pub image_url: Option<String>,
    pub job_title: Option<String>,
    pub works_for: Option<String>,
    pub same_as: Vec<String>,
}

/// Extracts a [`ProfilePage`] from downloaded HTML.
///
/// Fields come from the first JSON-LD `Person` node when there is one, then
/// from Open Graph tags, then from `<title>` and the meta description.
///
/// # Errors
///
/// Returns [`FetchError::NoProfileData`] if the page is a login wall or no
/// name can be found anywhere.
pub fn extract_profile(
    html: &str,
    target: &str,
    final_url: &str,
    status: u16,
) -> Result<ProfilePage, FetchError> {
    if is_login_wall(final_url) {
        return Err(FetchError::NoProfileData(format!(
            "{final_url} (login wall)"
        )));
    }

    let document = Html::parse_document(html);
    let person = extract_json_ld(&document)
        .into_iter()
        .find(|node| has_type(node, "Person"));
    let og = extract_open_graph(&document);

    let mut page = ProfilePage {
        profile_url: target.to_string(),
        final_url: final_url.to_string(),
        http_status: status,
        slug: extract_slug(final_url).or_else(|| extract_slug(target)),
        ..ProfilePage::default()
    };

    if let Some(person) = &person {
        apply_person(&mut page, person);
    }
    apply_open_graph(&mut page, &og);
    apply_fallbacks(&mut page, &document);

    if page.name.is_empty() {
        return Err(FetchError::NoProfileData(final_url.to_string()));
    }
    Ok(page)
}

/// Returns the profile slug of a URL, if it has one.
pub fn extract_slug(url: &str) -> Option<String> {
    let re = SLUG_REGEX.as_ref()?;
    re.captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|slug| !slug.is_empty())
}

fn is_login_wall(final_url: &str) -> bool {
    url::Url::parse(final_url)
        .map(|parsed| {
            LOGIN_WALL_PATHS
                .iter()
                .any(|prefix| parsed.path().starts_with(prefix))
        })
        .unwrap_or(false)
}

fn has_type(node: &Value, wanted: &str) -> bool {
    match node.get("@type") {
        Some(Value::String(t)) => t == wanted,
        Some(Value::Array(types)) => types.iter().any(|t| t.as_str() == Some(wanted)),
        _ => false,
    }
}

fn apply_person(page: &mut ProfilePage, person: &Value) {
    if let Some(name) = first_text(person.get("name")) {
        page.name = name;
    }
    page.job_title = first_text(person.get("jobTitle"));
    page.works_for = person.get("worksFor").and_then(organization_name);
    page.about = first_text(person.get("description"));
    page.image_url = person.get("image").and_then(image_url);
    page.location = person.get("address").and_then(address_text);
    page.same_as = match person.get("sameAs") {
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    };
}

fn apply_open_graph(page: &mut ProfilePage, og: &HashMap<String, String>) {
    if let Some(title) = og.get("og:title") {
        let (name, headline) = split_title(title);
        if page.name.is_empty() {
            page.name = name;
        }
        if page.headline.is_none() {
            page.headline = headline;
        }
    }
    if page.about.is_none() {
        page.about = og.get("og:description").cloned();
    }
    if page.image_url.is_none() {
        page.image_url = og.get("og:image").cloned();
    }
}

fn apply_fallbacks(page: &mut ProfilePage, document: &Html) {
    if page.name.is_empty() || page.headline.is_none() {
        if let Some(title) = document.select(&TITLE_SELECTOR).next() {
            let (name, headline) = split_title(&title.text().collect::<String>());
            if page.name.is_empty() {
                page.name = name;
            }
            if page.headline.is_none() {
                page.headline = headline;
            }
        }
    }
    if page.about.is_none() {
        page.about = document
            .select(&META_DESCRIPTION_SELECTOR)
            .next()
            .and_then(|meta| meta.value().attr("content"))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
    }
    if page.headline.is_none() {
        page.headline = page.job_title.clone();
    }
}

/// Splits `"Jane Doe - Staff Engineer - Acme | Site"` into the name and the
/// rest, dropping the trailing site name.
fn split_title(title: &str) -> (String, Option<String>) {
    let title = title.trim();
    let title = title
        .rsplit_once(" | ")
        .map_or(title, |(head, _site)| head)
        .trim();
    match title.split_once(" - ") {
        Some((name, rest)) => {
            let rest = rest.trim();
            (
                name.trim().to_string(),
                (!rest.is_empty()).then(|| rest.to_string()),
            )
        }
        None => (title.to_string(), None),
    }
}

fn first_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Array(items) => items.iter().find_map(|item| first_text(Some(item))),
        _ => None,
    }
}

fn organization_name(value: &Value) -> Option<String> {
    match value {
        Value::Array(items) => items.iter().find_map(organization_name),
        Value::Object(_) => first_text(value.get("name")),
        other => first_text(Some(other)),
    }
}

fn image_url(value: &Value) -> Option<String> {
    match value {
        Value::Object(_) => first_text(value.get("contentUrl").or_else(|| value.get("url"))),
        other => first_text(Some(other)),
    }
}

fn address_text(value: &Value) -> Option<String> {
    match value {
        Value::Object(_) => {
            let parts: Vec<String> = ["addressLocality", "addressRegion", "addressCountry"]
                .iter()
                .filter_map(|key| first_text(value.get(*key)))
                .collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        other => first_text(Some(other)),
    }
}
