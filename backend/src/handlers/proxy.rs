use std::sync::Arc;

use axum::{
    body::{Body, to_bytes},
    extract::{Request, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::AppState;
use crate::utils::{ApiError, ApiResult, DEFAULT_LOCALE, ResolvedLocale};

const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

const HOP_BY_HOP_HEADERS: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

fn is_forwardable(name: &str) -> bool {
    !HOP_BY_HOP_HEADERS.contains(&name) && name != "host" && name != "content-length"
}

/// Build the upstream URL for a path-and-query, keeping the base path.
pub fn upstream_url(base: &reqwest::Url, path_and_query: &str) -> ApiResult<reqwest::Url> {
    let target = format!("{}{}", base.as_str().trim_end_matches('/'), path_and_query);
    reqwest::Url::parse(&target).map_err(|e| ApiError::invalid_uri(format!("{}: {}", target, e)))
}

/// Forward a gated request to the upstream application.
pub async fn forward(State(state): State<Arc<AppState>>, req: Request) -> Response {
    let locale = req
        .extensions()
        .get::<ResolvedLocale>()
        .map(|l| l.0.clone())
        .unwrap_or_else(|| DEFAULT_LOCALE.to_string());
    let method = req.method().clone();
    let uri = req.uri().clone();

    match forward_request(&state, req).await {
        Ok(response) => response,
        Err(err) => {
            tracing::warn!("Proxy {} {} failed: {}", method, uri, err);
            err.into_localized_response(&locale)
        },
    }
}

async fn forward_request(state: &AppState, req: Request) -> ApiResult<Response> {
    let (parts, body) = req.into_parts();
    let path_and_query = parts.uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    let url = upstream_url(&state.upstream, path_and_query)?;

    let method = reqwest::Method::from_bytes(parts.method.as_str().as_bytes())
        .map_err(|e| ApiError::internal_error(format!("Unsupported method: {}", e)))?;
    let body = to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to read request body: {}", e)))?;

    let mut builder = state.http_client.request(method, url);
    for (name, value) in parts.headers.iter() {
        if is_forwardable(name.as_str()) {
            builder = builder.header(name.as_str(), value.as_bytes());
        }
    }
    if let Some(host) = parts.headers.get(header::HOST) {
        builder = builder.header("x-forwarded-host", host.as_bytes());
    }

    let upstream = builder.body(body).send().await.map_err(|e| {
        if e.is_timeout() { ApiError::UpstreamTimeout } else { ApiError::upstream_unavailable(e.to_string()) }
    })?;

    let status = StatusCode::from_u16(upstream.status().as_u16())
        .map_err(|e| ApiError::upstream_unavailable(format!("invalid status: {}", e)))?;

    let mut headers = HeaderMap::new();
    for (name, value) in upstream.headers().iter() {
        if !is_forwardable(name.as_str()) {
            continue;
        }
        if let (Ok(name), Ok(value)) =
            (HeaderName::from_bytes(name.as_str().as_bytes()), HeaderValue::from_bytes(value.as_bytes()))
        {
            headers.append(name, value);
        }
    }

    let bytes = upstream
        .bytes()
        .await
        .map_err(|e| ApiError::upstream_unavailable(format!("Failed to read upstream body: {}", e)))?;

    let mut response = (status, Body::from(bytes)).into_response();
    response.headers_mut().extend(headers);
    Ok(response)
}
