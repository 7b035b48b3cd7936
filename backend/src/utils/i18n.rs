//! Internationalization utilities for the edge
//!
//! Locale normalization, Accept-Language negotiation against the configured
//! locale list, and the per-request resolved locale.

/// Catalog fallback locale, used when a request carries no resolved locale.
pub const DEFAULT_LOCALE: &str = "en";

/// Locale chosen for the current request.
///
/// Inserted into request extensions by the gate middleware so handlers can
/// render localized messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLocale(pub String);

/// Normalize a language tag to its lowercase primary subtag.
/// Accepts: "en", "en-US", "en_US", "EN", " fr-CA ", etc.
pub fn normalize_locale(locale: &str) -> String {
    let locale = locale.trim().to_lowercase();
    locale
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Parse an Accept-Language header into (tag, quality) pairs, highest quality
/// first. Equal qualities keep header order.
pub fn parse_accept_language(header: &str) -> Vec<(String, f32)> {
    let mut langs: Vec<(String, f32)> = header
        .split(',')
        .filter_map(|part| {
            let part = part.trim();
            if part.is_empty() {
                return None;
            }

            let mut segments = part.split(';');
            let lang = segments.next()?.trim().to_lowercase();
            if lang.is_empty() {
                return None;
            }

            let quality = segments
                .find_map(|s| s.trim().strip_prefix("q=").and_then(|q| q.trim().parse::<f32>().ok()))
                .unwrap_or(1.0)
                .clamp(0.0, 1.0);

            Some((lang, quality))
        })
        .collect();

    langs.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    langs
}

/// Pick the best supported locale from an Accept-Language header value.
///
/// Exact tags win over primary-subtag matches of the same entry; `q=0`
/// entries are never selected.
pub fn negotiate_locale(header_value: Option<&str>, supported: &[String]) -> Option<String> {
    let header = header_value?;
    for (tag, quality) in parse_accept_language(header) {
        if quality <= 0.0 {
            continue;
        }
        if let Some(found) = supported.iter().find(|s| s.eq_ignore_ascii_case(&tag)) {
            return Some(found.clone());
        }
        let primary = normalize_locale(&tag);
        if let Some(found) = supported.iter().find(|s| s.eq_ignore_ascii_case(&primary)) {
            return Some(found.clone());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn supported() -> Vec<String> {
        vec!["en".to_string(), "fr".to_string()]
    }

    #[test]
    fn test_normalize_locale() {
        assert_eq!(normalize_locale("en"), "en");
        assert_eq!(normalize_locale("en-US"), "en");
        assert_eq!(normalize_locale("en_US"), "en");
        assert_eq!(normalize_locale(" FR-ca "), "fr");
        assert_eq!(normalize_locale(""), "");
    }

    #[test]
    fn test_parse_accept_language_sorts_by_quality() {
        let parsed = parse_accept_language("fr;q=0.9, en;q=1.0, de;q=0.5");
        let tags: Vec<&str> = parsed.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(tags, vec!["en", "fr", "de"]);
    }

    #[test]
    fn test_parse_accept_language_clamps_quality() {
        let parsed = parse_accept_language("en;q=1.5, fr;q=-1");
        assert_eq!(parsed[0], ("en".to_string(), 1.0));
        assert_eq!(parsed[1], ("fr".to_string(), 0.0));
    }

    #[test]
    fn test_negotiate_locale_falls_back_to_primary_subtag() {
        assert_eq!(negotiate_locale(Some("de, fr-CA;q=0.8"), &supported()), Some("fr".to_string()));
    }

    #[test]
    fn test_negotiate_locale_skips_zero_quality() {
        assert_eq!(negotiate_locale(Some("fr;q=0, en;q=0.1"), &supported()), Some("en".to_string()));
    }

    #[test]
    fn test_negotiate_locale_none_when_unsupported_or_missing() {
        assert_eq!(negotiate_locale(Some("ja, zh;q=0.9"), &supported()), None);
        assert_eq!(negotiate_locale(None, &supported()), None);
    }
}
