//! Path helpers for the gatekeeper
//!
//! Canonical path computation, `return_to` building, the public path
//! allow-list and the matcher deciding which requests reach the gatekeeper.

use regex::Regex;

/// Split a configured locale off the first path segment.
///
/// Returns the locale (if any) and the remaining canonical path. A bare
/// locale (`/fr`) maps to `/`. Matching is exact and case-sensitive, so
/// `/enterprise` keeps its path.
pub fn strip_locale_prefix<'a>(path: &'a str, locales: &[String]) -> (Option<&'a str>, &'a str) {
    let Some(trimmed) = path.strip_prefix('/') else {
        return (None, path);
    };

    let (candidate, rest) = match trimmed.find('/') {
        Some(pos) => (&trimmed[..pos], &trimmed[pos..]),
        None => (trimmed, ""),
    };

    if candidate.is_empty() || !locales.iter().any(|l| l == candidate) {
        return (None, path);
    }

    if rest.is_empty() { (Some(candidate), "/") } else { (Some(candidate), rest) }
}

/// Intended destination: canonical path without its leading slash plus the
/// query string. Empty for the bare root.
pub fn return_to(canonical_path: &str, query: Option<&str>) -> String {
    let mut destination = canonical_path.strip_prefix('/').unwrap_or(canonical_path).to_string();
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        destination.push('?');
        destination.push_str(query);
    }
    destination
}

/// Append an encoded `return_to` parameter to `target` unless it is empty.
pub fn with_return_to(target: &str, return_to: &str) -> String {
    if return_to.is_empty() {
        return target.to_string();
    }
    let separator = if target.contains('?') { '&' } else { '?' };
    format!("{target}{separator}return_to={}", urlencoding::encode(return_to))
}

fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// A run of whole path segments that may appear anywhere in a path.
///
/// Written as `verify` or `desktop/search`; a trailing slash (`i/`) requires
/// at least one further segment after the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentPattern {
    segments: Vec<String>,
    needs_tail: bool,
}

impl SegmentPattern {
    pub fn parse(pattern: &str) -> Option<Self> {
        let needs_tail = pattern.ends_with('/');
        let segments: Vec<String> = segments(pattern).into_iter().map(str::to_string).collect();
        if segments.is_empty() {
            return None;
        }
        Some(Self { segments, needs_tail })
    }

    pub fn matches(&self, path: &str) -> bool {
        let parts = segments(path);
        let n = self.segments.len();
        if parts.len() < n {
            return false;
        }
        (0..=parts.len() - n).any(|start| {
            let end = start + n;
            parts[start..end].iter().zip(&self.segments).all(|(a, b)| *a == b.as_str())
                && (!self.needs_tail || end < parts.len())
        })
    }
}

/// Paths reachable without a session.
#[derive(Debug, Clone, Default)]
pub struct PublicPaths {
    exact: Vec<String>,
    patterns: Vec<SegmentPattern>,
}

impl PublicPaths {
    pub fn new(exact: &[String], segment_patterns: &[String]) -> Self {
        let patterns = segment_patterns
            .iter()
            .filter_map(|p| {
                let parsed = SegmentPattern::parse(p);
                if parsed.is_none() {
                    tracing::warn!("Ignoring empty public path pattern '{}'", p);
                }
                parsed
            })
            .collect();
        Self { exact: exact.to_vec(), patterns }
    }

    pub fn is_public(&self, canonical_path: &str) -> bool {
        self.exact.iter().any(|p| p == canonical_path)
            || self.patterns.iter().any(|p| p.matches(canonical_path))
    }
}

/// Decides which requests are handed to the gatekeeper at all.
///
/// A path is excluded when it starts with one of the configured prefixes
/// followed by `/` or the end of the path.
#[derive(Debug, Clone)]
pub struct RequestMatcher {
    excluded: Option<Regex>,
}

impl RequestMatcher {
    pub fn new(excluded_prefixes: &[String]) -> Result<Self, regex::Error> {
        let alternatives: Vec<String> = excluded_prefixes
            .iter()
            .map(|p| p.trim_end_matches('/'))
            .filter(|p| !p.is_empty())
            .map(regex::escape)
            .collect();

        if alternatives.is_empty() {
            return Ok(Self { excluded: None });
        }

        let pattern = format!("^(?:{})(?:/|$)", alternatives.join("|"));
        Ok(Self { excluded: Some(Regex::new(&pattern)?) })
    }

    pub fn should_gate(&self, path: &str) -> bool {
        self.excluded.as_ref().is_none_or(|re| !re.is_match(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locales() -> Vec<String> {
        vec!["en".to_string(), "fr".to_string()]
    }

    #[test]
    fn test_strip_locale_prefix() {
        assert_eq!(strip_locale_prefix("/fr/teams/invite/x", &locales()), (Some("fr"), "/teams/invite/x"));
        assert_eq!(strip_locale_prefix("/en", &locales()), (Some("en"), "/"));
        assert_eq!(strip_locale_prefix("/enterprise", &locales()), (None, "/enterprise"));
        assert_eq!(strip_locale_prefix("/login", &locales()), (None, "/login"));
        assert_eq!(strip_locale_prefix("/", &locales()), (None, "/"));
        assert_eq!(strip_locale_prefix("/EN/about", &locales()), (None, "/EN/about"));
    }

    #[test]
    fn test_return_to() {
        assert_eq!(return_to("/settings/members", Some("tab=1")), "settings/members?tab=1");
        assert_eq!(return_to("/inbox", None), "inbox");
        assert_eq!(return_to("/inbox", Some("")), "inbox");
        assert_eq!(return_to("/", None), "");
    }

    #[test]
    fn test_with_return_to_encodes() {
        assert_eq!(with_return_to("/login", ""), "/login");
        assert_eq!(with_return_to("/login", "inbox?a=1&b=2"), "/login?return_to=inbox%3Fa%3D1%26b%3D2");
        assert_eq!(with_return_to("/login?x=1", "inbox"), "/login?x=1&return_to=inbox");
    }

    #[test]
    fn test_segment_pattern_with_tail() {
        let pattern = SegmentPattern::parse("i/").unwrap();
        assert!(pattern.matches("/i/abc"));
        assert!(pattern.matches("/share/i/abc"));
        assert!(!pattern.matches("/i"));
        assert!(!pattern.matches("/wiki/abc"));
    }

    #[test]
    fn test_segment_pattern_multi_segment() {
        let pattern = SegmentPattern::parse("desktop/search").unwrap();
        assert!(pattern.matches("/desktop/search"));
        assert!(pattern.matches("/desktop/search/results"));
        assert!(!pattern.matches("/desktop/searching"));
        assert!(!pattern.matches("/desktop"));
        assert!(SegmentPattern::parse("/").is_none());
    }

    #[test]
    fn test_public_paths_reject_substring_lookalikes() {
        let public = PublicPaths::new(
            &["/login".to_string()],
            &["i/".to_string(), "verify".to_string(), "all-done".to_string()],
        );
        assert!(public.is_public("/login"));
        assert!(public.is_public("/verify"));
        assert!(public.is_public("/mfa/verify"));
        assert!(public.is_public("/all-done"));
        assert!(!public.is_public("/login/extra"));
        assert!(!public.is_public("/not-verify-related"));
        assert!(!public.is_public("/verify-later"));
        assert!(!public.is_public("/tracker/all-done-ish"));
    }

    #[test]
    fn test_request_matcher() {
        let matcher = RequestMatcher::new(&[
            "/_next/static".to_string(),
            "/favicon.ico".to_string(),
            "/api".to_string(),
        ])
        .unwrap();
        assert!(!matcher.should_gate("/_next/static/chunk.js"));
        assert!(!matcher.should_gate("/favicon.ico"));
        assert!(!matcher.should_gate("/api"));
        assert!(!matcher.should_gate("/api/v1/users"));
        assert!(matcher.should_gate("/apiary"));
        assert!(matcher.should_gate("/favicon.icon"));
        assert!(matcher.should_gate("/"));
    }

    #[test]
    fn test_empty_matcher_gates_everything() {
        let matcher = RequestMatcher::new(&[]).unwrap();
        assert!(matcher.should_gate("/api"));
    }
}
