//! # Launch URL Assembly
//!
//! Joins `xml:base` prefixes, resource hrefs and item parameters the way
//! IMS Content Packaging describes it. Shared by the SCORM and AICC
//! parsers.

/// Prefix `href` with any number of `xml:base` values, outermost first.
///
/// Absolute hrefs (with a URL scheme or a leading `/`) ignore the bases.
#[must_use]
pub fn join_base(bases: &[Option<&str>], href: &str) -> String {
    let href = href.trim();
    if is_absolute(href) {
        return href.to_string();
    }
    let mut url = String::new();
    for base in bases.iter().flatten() {
        let base = base.trim();
        if base.is_empty() {
            continue;
        }
        if is_absolute(base) {
            url.clear();
        }
        url.push_str(base);
        if !url.ends_with('/') {
            url.push('/');
        }
    }
    url.push_str(href);
    url
}

/// Append item parameters to a launch URL.
///
/// - blank parameters leave the URL unchanged
/// - a leading `#` is appended verbatim
/// - a leading `?` or `&` is rewritten to fit the URL's existing query
/// - bare parameters are attached as a query (`?` or `&`)
#[must_use]
pub fn append_parameters(url: &str, parameters: Option<&str>) -> String {
    let Some(parameters) = parameters.map(str::trim).filter(|p| !p.is_empty()) else {
        return url.to_string();
    };
    if parameters.starts_with('#') {
        return format!("{}{}", url, parameters);
    }
    let bare = parameters.trim_start_matches(['?', '&']);
    if bare.is_empty() {
        return url.to_string();
    }
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}{}", url, separator, bare)
}

fn is_absolute(value: &str) -> bool {
    value.starts_with('/') || has_scheme(value)
}

fn has_scheme(value: &str) -> bool {
    match value.find("://") {
        Some(index) => value[..index]
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')),
        None => false,
    }
}
