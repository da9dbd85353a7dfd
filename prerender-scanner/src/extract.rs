//! Pattern-based discovery of resource references in HTML and CSS text.

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

/// `href=`, `src=`, `source=` with either quote style, or a CSS `url(...)`.
static ATTRIBUTE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?:href|src|source)=(?:"([^"]*)"|'([^']*)')|url\(\s*(?:"([^"]*)"|'([^']*)'|([^)"'\s]*))"#,
    )
    .expect("hardcoded regex pattern is valid")
});

static SRCSET_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"srcset=(?:"([^"]*)"|'([^']*)')"#).expect("hardcoded regex pattern is valid")
});

/// `url(...)` and `@import "..."` references inside stylesheets.
static CSS_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"url\(\s*(?:"([^"]*)"|'([^']*)'|([^)"'\s]*))|@import\s+(?:"([^"]*)"|'([^']*)')"#,
    )
    .expect("hardcoded regex pattern is valid")
});

const SKIPPED_PREFIXES: &[&str] = &["#", "javascript:", "mailto:", "tel:", "data:"];

/// Collect reference candidates from HTML-ish text, in document order:
/// every srcset entry first, then attribute and `url()` references.
pub fn extract_references(text: &str) -> Vec<String> {
    let mut references = Vec::new();

    for caps in SRCSET_REGEX.captures_iter(text) {
        if let Some(value) = first_group(&caps) {
            references.extend(srcset_candidates(value));
        }
    }

    for caps in ATTRIBUTE_REGEX.captures_iter(text) {
        if let Some(value) = first_group(&caps) {
            push_candidate(&mut references, value);
        }
    }

    references
}

/// Collect reference candidates from a stylesheet.
pub fn extract_css_references(text: &str) -> Vec<String> {
    let mut references = Vec::new();
    for caps in CSS_REGEX.captures_iter(text) {
        if let Some(value) = first_group(&caps) {
            push_candidate(&mut references, value);
        }
    }
    references
}

/// Split a srcset value into the tokens that look like resource URLs.
/// Width and density descriptors (`480w`, `2x`) are dropped.
pub fn srcset_candidates(value: &str) -> Vec<String> {
    value
        .split_whitespace()
        .map(|token| token.trim_end_matches(','))
        .filter(|token| looks_like_resource(token))
        .map(decode_entities)
        .collect()
}

/// Resolve a reference against the URL of the document containing it.
/// Non-fetchable references yield `None`; fragments are removed.
pub fn resolve_reference(base: &Url, reference: &str) -> Option<Url> {
    let reference = reference.trim();
    if reference.is_empty()
        || SKIPPED_PREFIXES
            .iter()
            .any(|prefix| reference.to_ascii_lowercase().starts_with(prefix))
    {
        return None;
    }

    let mut resolved = base.join(reference).ok()?;
    resolved.set_fragment(None);
    Some(resolved)
}

fn looks_like_resource(token: &str) -> bool {
    token.starts_with('/') || token.starts_with('.') || Url::parse(token).is_ok()
}

fn first_group<'t>(caps: &regex::Captures<'t>) -> Option<&'t str> {
    caps.iter()
        .skip(1)
        .flatten()
        .next()
        .map(|m| m.as_str())
}

fn push_candidate(references: &mut Vec<String>, value: &str) {
    let value = value.trim();
    if !value.is_empty() {
        references.push(decode_entities(value));
    }
}

fn decode_entities(value: &str) -> String {
    value.replace("&amp;", "&")
}
