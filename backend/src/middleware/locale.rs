//! Locale rewriting
//!
//! Maps each request onto a locale-qualified route of the application. The
//! application serves routes under `/{locale}/...`; whether the locale is
//! visible in public URLs depends on the configured [`UrlMappingStrategy`].

use async_trait::async_trait;
use axum::http::{HeaderName, Uri, header::ACCEPT_LANGUAGE};

use crate::config::{I18nConfig, UrlMappingStrategy};
use crate::models::{EdgeResponse, RequestHead};
use crate::utils::cookies::{self, CookieOptions};
use crate::utils::paths::strip_locale_prefix;
use crate::utils::{ApiError, ApiResult, negotiate_locale};

/// Request header carrying the resolved locale to the application.
pub const LOCALE_HEADER: HeaderName = HeaderName::from_static("x-locale");

const LOCALE_COOKIE_MAX_AGE_SECS: i64 = 60 * 60 * 24 * 365;

#[async_trait]
pub trait LocaleRewriter: Send + Sync {
    /// Produce the locale-qualified response for `request`.
    async fn rewrite(&self, request: &RequestHead) -> ApiResult<EdgeResponse>;
}

/// Locale rewriter driven by the first path segment.
pub struct PrefixLocaleRewriter {
    locales: Vec<String>,
    default_locale: String,
    strategy: UrlMappingStrategy,
    cookie_name: String,
    cookie_options: CookieOptions,
}

impl PrefixLocaleRewriter {
    pub fn new(config: &I18nConfig, cookie_options: CookieOptions) -> Self {
        Self {
            locales: config.locales.clone(),
            default_locale: config.default_locale.clone(),
            strategy: config.url_mapping_strategy,
            cookie_name: config.locale_cookie.clone(),
            cookie_options: CookieOptions { http_only: false, ..cookie_options },
        }
    }

    /// Locale for an unprefixed request: cookie, then Accept-Language, then default.
    fn resolve_locale(&self, request: &RequestHead) -> String {
        if let Some(locale) = cookies::get_cookie(&request.headers, &self.cookie_name)
            && self.locales.contains(&locale)
        {
            return locale;
        }

        let accept_language = request.headers.get(ACCEPT_LANGUAGE).and_then(|v| v.to_str().ok());
        negotiate_locale(accept_language, &self.locales).unwrap_or_else(|| self.default_locale.clone())
    }

    fn localized_target(locale: &str, path: &str, query: Option<&str>) -> String {
        let mut target = if path == "/" { format!("/{locale}") } else { format!("/{locale}{path}") };
        append_query(&mut target, query);
        target
    }
}

fn append_query(target: &mut String, query: Option<&str>) {
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        target.push('?');
        target.push_str(query);
    }
}

fn parse_uri(target: &str) -> ApiResult<Uri> {
    target.parse().map_err(|e| ApiError::invalid_uri(format!("{}: {}", target, e)))
}

#[async_trait]
impl LocaleRewriter for PrefixLocaleRewriter {
    async fn rewrite(&self, request: &RequestHead) -> ApiResult<EdgeResponse> {
        self.localize(request).map_err(|e| ApiError::locale_rewrite(e.to_string()))
    }
}

impl PrefixLocaleRewriter {
    fn localize(&self, request: &RequestHead) -> ApiResult<EdgeResponse> {
        let path = request.path();
        let query = request.query();
        let (prefix, rest) = strip_locale_prefix(path, &self.locales);

        let (mut response, locale) = match (prefix, self.strategy) {
            (Some(locale), UrlMappingStrategy::RewriteDefault) if locale == self.default_locale => {
                let mut target = rest.to_string();
                append_query(&mut target, query);
                (EdgeResponse::redirect(target), locale.to_string())
            },
            (Some(locale), _) => (EdgeResponse::next(), locale.to_string()),
            (None, UrlMappingStrategy::Redirect) => {
                let locale = self.resolve_locale(request);
                (EdgeResponse::redirect(Self::localized_target(&locale, path, query)), locale)
            },
            (None, UrlMappingStrategy::Rewrite) => {
                let locale = self.resolve_locale(request);
                let uri = parse_uri(&Self::localized_target(&locale, path, query))?;
                (EdgeResponse::rewrite(uri), locale)
            },
            (None, UrlMappingStrategy::RewriteDefault) => {
                let locale = self.default_locale.clone();
                let uri = parse_uri(&Self::localized_target(&locale, path, query))?;
                (EdgeResponse::rewrite(uri), locale)
            },
        };

        tracing::debug!(path = %path, locale = %locale, action = ?response.action, "locale rewrite");

        response.set_request_header(LOCALE_HEADER, &locale)?;
        response.append_set_cookie(&cookies::set_cookie(
            &self.cookie_name,
            &locale,
            LOCALE_COOKIE_MAX_AGE_SECS,
            &self.cookie_options,
        ))?;
        response.locale = Some(locale);
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, HeaderValue, Method, header::COOKIE};

    fn rewriter(strategy: UrlMappingStrategy) -> PrefixLocaleRewriter {
        let config = I18nConfig {
            locales: vec!["en".to_string(), "fr".to_string()],
            default_locale: "en".to_string(),
            url_mapping_strategy: strategy,
            locale_cookie: "locale".to_string(),
        };
        PrefixLocaleRewriter::new(&config, CookieOptions::default())
    }

    fn head(uri: &'static str, headers: &[(axum::http::HeaderName, &'static str)]) -> RequestHead {
        let mut map = HeaderMap::new();
        for (name, value) in headers {
            map.insert(name.clone(), HeaderValue::from_static(value));
        }
        RequestHead::new(Method::GET, Uri::from_static(uri), map)
    }

    #[tokio::test]
    async fn test_rewrite_injects_default_locale() {
        let response = rewriter(UrlMappingStrategy::Rewrite)
            .rewrite(&head("/inbox?filter=unread", &[]))
            .await
            .unwrap();

        assert_eq!(response.rewrite_uri().unwrap(), "/en/inbox?filter=unread");
        assert_eq!(response.locale.as_deref(), Some("en"));
        assert_eq!(response.request_headers.get(LOCALE_HEADER).unwrap(), "en");
        assert!(response.set_cookies()[0].starts_with("locale=en; Path=/;"));
        assert!(!response.set_cookies()[0].contains("HttpOnly"));
    }

    #[tokio::test]
    async fn test_rewrite_prefers_cookie_over_accept_language() {
        let request = head("/", &[(COOKIE, "locale=fr"), (ACCEPT_LANGUAGE, "en")]);
        let response = rewriter(UrlMappingStrategy::Rewrite).rewrite(&request).await.unwrap();
        assert_eq!(response.rewrite_uri().unwrap(), "/fr");
    }

    #[tokio::test]
    async fn test_rewrite_uses_accept_language() {
        let request = head("/settings", &[(ACCEPT_LANGUAGE, "de, fr-FR;q=0.8")]);
        let response = rewriter(UrlMappingStrategy::Rewrite).rewrite(&request).await.unwrap();
        assert_eq!(response.rewrite_uri().unwrap(), "/fr/settings");
    }

    #[tokio::test]
    async fn test_prefixed_request_passes_through() {
        let response =
            rewriter(UrlMappingStrategy::Rewrite).rewrite(&head("/fr/inbox", &[])).await.unwrap();
        assert_eq!(response.rewrite_uri(), None);
        assert!(!response.is_redirect());
        assert_eq!(response.locale.as_deref(), Some("fr"));
    }

    #[tokio::test]
    async fn test_rewrite_default_redirects_explicit_default_prefix() {
        let r = rewriter(UrlMappingStrategy::RewriteDefault);

        let response = r.rewrite(&head("/en/inbox?x=1", &[])).await.unwrap();
        assert_eq!(response.location(), Some("/inbox?x=1"));

        let response = r.rewrite(&head("/inbox", &[(COOKIE, "locale=fr")])).await.unwrap();
        assert_eq!(response.rewrite_uri().unwrap(), "/en/inbox");

        let response = r.rewrite(&head("/fr/inbox", &[])).await.unwrap();
        assert!(!response.is_redirect());
    }

    #[tokio::test]
    async fn test_redirect_strategy_redirects_unprefixed() {
        let request = head("/inbox?x=1", &[(ACCEPT_LANGUAGE, "fr")]);
        let response = rewriter(UrlMappingStrategy::Redirect).rewrite(&request).await.unwrap();
        assert_eq!(response.location(), Some("/fr/inbox?x=1"));
        assert_eq!(response.set_cookies().len(), 1);
    }

    #[tokio::test]
    async fn test_unrenderable_cookie_is_a_rewrite_failure() {
        let config = I18nConfig {
            locales: vec!["en".to_string()],
            default_locale: "en".to_string(),
            url_mapping_strategy: UrlMappingStrategy::Rewrite,
            locale_cookie: "locale".to_string(),
        };
        let options = CookieOptions { path: "/\n".to_string(), ..CookieOptions::default() };
        let result = PrefixLocaleRewriter::new(&config, options).rewrite(&head("/inbox", &[])).await;
        assert!(matches!(result, Err(ApiError::LocaleRewrite(_))));
    }

    #[tokio::test]
    async fn test_unknown_cookie_locale_is_ignored() {
        let request = head("/", &[(COOKIE, "locale=xx")]);
        let response = rewriter(UrlMappingStrategy::Rewrite).rewrite(&request).await.unwrap();
        assert_eq!(response.rewrite_uri().unwrap(), "/en");
    }
}
