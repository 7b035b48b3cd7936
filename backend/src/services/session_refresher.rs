use async_trait::async_trait;
use axum::http::header::COOKIE;
use chrono::Utc;

use crate::models::{EdgeResponse, RequestHead};
use crate::utils::cookies::{self, CookieOptions};
use crate::utils::{ApiError, ApiResult, JwtUtil};

#[async_trait]
pub trait SessionRefresher: Send + Sync {
    /// Attach refreshed session cookies to `response`.
    async fn refresh(&self, request: &RequestHead, response: EdgeResponse) -> ApiResult<EdgeResponse>;
}

/// Sliding-expiry refresher for the access-token cookie.
pub struct JwtSessionRefresher {
    jwt_util: JwtUtil,
    cookie_name: String,
    cookie_options: CookieOptions,
    refresh_window_secs: i64,
}

impl JwtSessionRefresher {
    pub fn new(
        jwt_util: JwtUtil,
        cookie_name: impl Into<String>,
        cookie_options: CookieOptions,
        refresh_window_secs: u64,
    ) -> Self {
        Self {
            jwt_util,
            cookie_name: cookie_name.into(),
            cookie_options,
            refresh_window_secs: i64::try_from(refresh_window_secs).unwrap_or(i64::MAX),
        }
    }

    fn forward_cookie(
        &self,
        request: &RequestHead,
        response: &mut EdgeResponse,
        value: Option<&str>,
    ) -> ApiResult<()> {
        // An empty Cookie override removes the header from the forwarded request.
        let header = cookies::rewrite_cookie_header(&request.headers, &self.cookie_name, value);
        response.set_request_header(COOKIE, &header)
    }
}

#[async_trait]
impl SessionRefresher for JwtSessionRefresher {
    async fn refresh(
        &self,
        request: &RequestHead,
        response: EdgeResponse,
    ) -> ApiResult<EdgeResponse> {
        self.refresh_cookie(request, response)
            .map_err(|e| ApiError::session_refresh(e.to_string()))
    }
}

impl JwtSessionRefresher {
    fn refresh_cookie(
        &self,
        request: &RequestHead,
        mut response: EdgeResponse,
    ) -> ApiResult<EdgeResponse> {
        let Some(token) = cookies::get_cookie(&request.headers, &self.cookie_name) else {
            return Ok(response);
        };

        let claims = match self.jwt_util.verify_token(&token) {
            Ok(claims) => claims,
            Err(err) => {
                tracing::debug!("Clearing unusable session cookie: {}", err);
                response.append_set_cookie(&cookies::clear_cookie(&self.cookie_name, &self.cookie_options))?;
                self.forward_cookie(request, &mut response, None)?;
                return Ok(response);
            },
        };

        let remaining = claims.exp - Utc::now().timestamp();
        if remaining > self.refresh_window_secs {
            return Ok(response);
        }

        let (token, refreshed) = self.jwt_util.issue(&claims)?;
        tracing::debug!(
            "Refreshed session for user {} ({}s remaining, new exp {})",
            refreshed.sub,
            remaining,
            refreshed.exp
        );

        response.append_set_cookie(&cookies::set_cookie(
            &self.cookie_name,
            &token,
            self.jwt_util.ttl_secs(),
            &self.cookie_options,
        ))?;
        self.forward_cookie(request, &mut response, Some(&token))?;
        Ok(response)
    }
}
