//! Edge gate for the dashboard: locale routing, session refresh and
//! authentication redirects in front of the upstream application.

rust_i18n::i18n!("locales", fallback = "en");

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

#[cfg(test)]
mod tests;

use std::sync::Arc;
use std::time::Duration;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::middleware::{GateState, PrefixLocaleRewriter, gate_middleware};
use crate::services::{GatePolicy, Gatekeeper, JwtAuthStore, JwtSessionRefresher};
use crate::utils::cookies::CookieOptions;
use crate::utils::{JwtUtil, RequestMatcher};

pub struct AppState {
    pub http_client: reqwest::Client,
    pub upstream: reqwest::Url,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self, anyhow::Error> {
        let upstream = reqwest::Url::parse(&config.upstream.url)?;
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.upstream.timeout_secs))
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self { http_client, upstream })
    }
}

/// Wire the default collaborators from configuration.
pub fn build_gate_state(config: &Config) -> Result<GateState, anyhow::Error> {
    let cookie_options = CookieOptions { secure: config.auth.cookie_secure, ..CookieOptions::default() };
    let jwt_util = JwtUtil::new(&config.auth.jwt_secret, config.auth.session_ttl_secs);

    let locale_rewriter = Arc::new(PrefixLocaleRewriter::new(&config.i18n, cookie_options.clone()));
    let session_refresher = Arc::new(JwtSessionRefresher::new(
        jwt_util.clone(),
        config.auth.access_token_cookie.clone(),
        cookie_options,
        config.auth.refresh_window_secs,
    ));
    let auth_store = Arc::new(JwtAuthStore::new(jwt_util, config.auth.access_token_cookie.clone()));
    let policy = GatePolicy::new(&config.gate, &config.i18n);

    let gatekeeper = Gatekeeper::new(locale_rewriter, session_refresher, auth_store, policy);
    let matcher = RequestMatcher::new(&config.gate.excluded_prefixes)?;

    Ok(GateState { gatekeeper: Arc::new(gatekeeper), matcher: Arc::new(matcher) })
}

/// Wrap `router` with the gate middleware.
pub fn apply_gate(router: Router, gate: GateState) -> Router {
    router.layer(axum::middleware::from_fn_with_state(gate, gate_middleware))
}

pub fn build_router(state: Arc<AppState>, gate: GateState) -> Router {
    let router = Router::new()
        .route("/health", get(handlers::health::health))
        .fallback(handlers::proxy::forward)
        .with_state(state);

    apply_gate(router, gate).layer(TraceLayer::new_for_http())
}
