use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rust_i18n::t;
use serde::Serialize;
use thiserror::Error;

use super::i18n::DEFAULT_LOCALE;

/// Edge error with enough context to log the failing collaborator.
///
/// The gatekeeper never surfaces these to clients: it logs them and passes the
/// request through. Only the upstream proxy renders them as responses.
#[derive(Error, Debug)]
pub enum ApiError {
    // Authentication errors 1xxx
    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    // Collaborator errors 2xxx
    #[error("Locale rewrite failed: {0}")]
    LocaleRewrite(String),

    #[error("Session refresh failed: {0}")]
    SessionRefresh(String),

    #[error("Auth store query failed: {0}")]
    AuthStore(String),

    // Input errors 4xxx
    #[error("Invalid URI: {0}")]
    InvalidUri(String),

    // System errors 5xxx
    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Upstream unavailable: {message}")]
    UpstreamUnavailable { message: String },

    #[error("Upstream timeout")]
    UpstreamTimeout,
}

impl ApiError {
    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::InvalidToken(message.into())
    }

    pub fn locale_rewrite(message: impl Into<String>) -> Self {
        Self::LocaleRewrite(message.into())
    }

    pub fn session_refresh(message: impl Into<String>) -> Self {
        Self::SessionRefresh(message.into())
    }

    pub fn auth_store(message: impl Into<String>) -> Self {
        Self::AuthStore(message.into())
    }

    pub fn invalid_uri(message: impl Into<String>) -> Self {
        Self::InvalidUri(message.into())
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::InternalError(message.into())
    }

    pub fn upstream_unavailable(message: impl Into<String>) -> Self {
        Self::UpstreamUnavailable { message: message.into() }
    }

    pub fn error_code(&self) -> i32 {
        match self {
            // Authentication errors 1xxx
            Self::TokenExpired => 1001,
            Self::InvalidToken(_) => 1002,

            // Collaborator errors 2xxx
            Self::LocaleRewrite(_) => 2001,
            Self::SessionRefresh(_) => 2002,
            Self::AuthStore(_) => 2003,

            // Input errors 4xxx
            Self::InvalidUri(_) => 4001,

            // System errors 5xxx
            Self::InternalError(_) => 5001,
            Self::UpstreamUnavailable { .. } => 5002,
            Self::UpstreamTimeout => 5003,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self.error_code() {
            1001..=1999 => StatusCode::UNAUTHORIZED,
            4001..=4999 => StatusCode::BAD_REQUEST,
            5002 => StatusCode::BAD_GATEWAY,
            5003 => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message rendered in the given locale, falling back to the catalog default.
    pub fn localized_message(&self, locale: &str) -> String {
        match self {
            Self::TokenExpired => t!("auth.token_expired", locale = locale).to_string(),
            Self::InvalidToken(_) => t!("auth.invalid_token", locale = locale).to_string(),
            Self::LocaleRewrite(_) | Self::SessionRefresh(_) | Self::AuthStore(_) => {
                t!("edge.collaborator_failed", locale = locale).to_string()
            },
            Self::InvalidUri(uri) => t!("edge.invalid_uri", locale = locale, uri = uri).to_string(),
            Self::InternalError(msg) => {
                t!("internal.error", locale = locale, message = msg).to_string()
            },
            Self::UpstreamUnavailable { .. } => {
                t!("proxy.upstream_unavailable", locale = locale).to_string()
            },
            Self::UpstreamTimeout => t!("proxy.upstream_timeout", locale = locale).to_string(),
        }
    }

    /// Build a response whose message is localized for the request's locale.
    pub fn into_localized_response(self, locale: &str) -> Response {
        let status = self.status_code();
        let body = ApiErrorResponse { code: self.error_code(), message: self.localized_message(locale) };
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct ApiErrorResponse {
    pub code: i32,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.into_localized_response(DEFAULT_LOCALE)
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
