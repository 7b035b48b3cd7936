//! Cookie header helpers.

use axum::http::{HeaderMap, header};

/// Attributes rendered on every Set-Cookie issued by the edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieOptions {
    pub path: String,
    pub http_only: bool,
    pub secure: bool,
    pub same_site: String,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self { path: "/".to_string(), http_only: true, secure: false, same_site: "Lax".to_string() }
    }
}

/// Read a cookie value from the request's Cookie headers.
pub fn get_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

/// Rebuild a Cookie header with `name` set to `value`, or removed when `value`
/// is `None`. Other cookies keep their order.
pub fn rewrite_cookie_header(headers: &HeaderMap, name: &str, value: Option<&str>) -> String {
    let mut pairs: Vec<String> = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .filter(|pair| pair.split_once('=').map(|(k, _)| k) != Some(name))
        .map(str::to_string)
        .collect();

    if let Some(value) = value {
        pairs.push(format!("{name}={value}"));
    }
    pairs.join("; ")
}

/// Render a Set-Cookie value.
pub fn set_cookie(name: &str, value: &str, max_age_secs: i64, options: &CookieOptions) -> String {
    let mut cookie = format!("{name}={value}; Path={}; Max-Age={max_age_secs}", options.path);
    if options.http_only {
        cookie.push_str("; HttpOnly");
    }
    if options.secure {
        cookie.push_str("; Secure");
    }
    if !options.same_site.is_empty() {
        cookie.push_str("; SameSite=");
        cookie.push_str(&options.same_site);
    }
    cookie
}

/// Render a Set-Cookie value that deletes the cookie.
pub fn clear_cookie(name: &str, options: &CookieOptions) -> String {
    set_cookie(name, "", 0, options)
}
