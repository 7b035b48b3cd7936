use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, Request, Uri, header};

use crate::utils::{ApiError, ApiResult};

/// The parts of an inbound request the gatekeeper and its collaborators read.
#[derive(Debug, Clone)]
pub struct RequestHead {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
}

impl RequestHead {
    pub fn new(method: Method, uri: Uri, headers: HeaderMap) -> Self {
        Self { method, uri, headers }
    }

    pub fn from_request<B>(req: &Request<B>) -> Self {
        Self::new(req.method().clone(), req.uri().clone(), req.headers().clone())
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }

    pub fn query(&self) -> Option<&str> {
        self.uri.query()
    }

    /// View of this request with `overrides` applied, see [`apply_header_overrides`].
    pub fn with_request_headers(&self, overrides: &HeaderMap) -> Self {
        let mut head = self.clone();
        apply_header_overrides(&mut head.headers, overrides);
        head
    }
}

/// Replace same-named headers in `target` with `overrides`. An override whose
/// only value is empty removes the header.
pub fn apply_header_overrides(target: &mut HeaderMap, overrides: &HeaderMap) {
    for name in overrides.keys() {
        target.remove(name);
        for value in overrides.get_all(name).iter().filter(|v| !v.is_empty()) {
            target.append(name.clone(), value.clone());
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EdgeAction {
    /// Continue to the application, optionally at an internally rewritten URI.
    Next { rewrite: Option<Uri> },
    /// Answer with a temporary redirect.
    Redirect { location: String },
}

/// Outcome of the edge for one request.
///
/// `request_headers` are set on the forwarded request; `headers` are appended
/// to whatever response the client finally receives.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeResponse {
    pub action: EdgeAction,
    pub request_headers: HeaderMap,
    pub headers: HeaderMap,
    pub locale: Option<String>,
}

impl EdgeResponse {
    /// Plain pass-through.
    pub fn next() -> Self {
        Self::with_action(EdgeAction::Next { rewrite: None })
    }

    pub fn rewrite(uri: Uri) -> Self {
        Self::with_action(EdgeAction::Next { rewrite: Some(uri) })
    }

    pub fn redirect(location: impl Into<String>) -> Self {
        Self::with_action(EdgeAction::Redirect { location: location.into() })
    }

    fn with_action(action: EdgeAction) -> Self {
        Self { action, request_headers: HeaderMap::new(), headers: HeaderMap::new(), locale: None }
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self.action, EdgeAction::Redirect { .. })
    }

    pub fn location(&self) -> Option<&str> {
        match &self.action {
            EdgeAction::Redirect { location } => Some(location),
            EdgeAction::Next { .. } => None,
        }
    }

    pub fn rewrite_uri(&self) -> Option<&Uri> {
        match &self.action {
            EdgeAction::Next { rewrite } => rewrite.as_ref(),
            EdgeAction::Redirect { .. } => None,
        }
    }

    pub fn append_set_cookie(&mut self, cookie: &str) -> ApiResult<()> {
        let value = HeaderValue::from_str(cookie)
            .map_err(|e| ApiError::internal_error(format!("invalid Set-Cookie value: {}", e)))?;
        self.headers.append(header::SET_COOKIE, value);
        Ok(())
    }

    pub fn set_request_header(&mut self, name: HeaderName, value: &str) -> ApiResult<()> {
        let value = HeaderValue::from_str(value)
            .map_err(|e| ApiError::internal_error(format!("invalid {} header: {}", name, e)))?;
        self.request_headers.insert(name, value);
        Ok(())
    }

    pub fn set_cookies(&self) -> Vec<&str> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect()
    }
}
