// Common test utilities and fakes

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{HeaderMap, HeaderValue, Method, Uri, header::COOKIE};
use chrono::Utc;

use crate::config::{Config, GateConfig};
use crate::middleware::LocaleRewriter;
use crate::models::{AssuranceLevel, AssuranceLevels, EdgeResponse, RequestHead, Session, SessionClaims};
use crate::services::{AuthStore, GatePolicy, Gatekeeper, SessionRefresher};
use crate::utils::{ApiError, ApiResult, JwtUtil};

pub const TEST_SECRET: &str = "test-secret";
pub const TOKEN_COOKIE: &str = "edge-access-token";

pub fn test_locales() -> Vec<String> {
    vec!["en".to_string(), "fr".to_string()]
}

/// Default configuration with an extra locale and a known secret.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.i18n.locales = test_locales();
    config.auth.jwt_secret = TEST_SECRET.to_string();
    config
}

/// Build a request head for `uri` with optional Cookie header.
pub fn head(uri: &str, cookie: Option<&str>) -> RequestHead {
    let mut headers = HeaderMap::new();
    if let Some(cookie) = cookie {
        headers.insert(COOKIE, HeaderValue::from_str(cookie).expect("valid cookie header"));
    }
    let uri: Uri = uri.parse().expect("valid test uri");
    RequestHead::new(Method::GET, uri, headers)
}

pub fn claims(aal: AssuranceLevel, mfa_enrolled: bool, exp_offset: i64) -> SessionClaims {
    let now = Utc::now().timestamp();
    SessionClaims {
        sub: "user-1".to_string(),
        email: Some("member@example.com".to_string()),
        iat: now,
        exp: now + exp_offset,
        aal,
        mfa_enrolled,
    }
}

pub fn session() -> Session {
    Session::from_claims("token", claims(AssuranceLevel::Aal1, false, 3600)).expect("valid expiry")
}

/// Signed access token as the session cookie would carry it.
pub fn mint_token(aal: AssuranceLevel, mfa_enrolled: bool, exp_offset: i64) -> String {
    JwtUtil::new(TEST_SECRET, 3600)
        .encode(&claims(aal, mfa_enrolled, exp_offset))
        .expect("Failed to sign test token")
}

/// Locale rewriter that passes everything through under "en".
pub struct FakeLocaleRewriter {
    pub fail: bool,
}

#[async_trait]
impl LocaleRewriter for FakeLocaleRewriter {
    async fn rewrite(&self, _request: &RequestHead) -> ApiResult<EdgeResponse> {
        if self.fail {
            return Err(ApiError::locale_rewrite("catalog unavailable"));
        }
        let mut response = EdgeResponse::next();
        response.append_set_cookie("locale=en")?;
        response.locale = Some("en".to_string());
        Ok(response)
    }
}

/// Session refresher that marks the response as refreshed.
pub struct FakeSessionRefresher {
    pub fail: bool,
}

#[async_trait]
impl SessionRefresher for FakeSessionRefresher {
    async fn refresh(&self, _request: &RequestHead, mut response: EdgeResponse) -> ApiResult<EdgeResponse> {
        if self.fail {
            return Err(ApiError::session_refresh("token endpoint unreachable"));
        }
        response.append_set_cookie("session=refreshed")?;
        Ok(response)
    }
}

#[derive(Default)]
pub struct FakeAuthStore {
    pub session: Option<Session>,
    pub levels: Option<AssuranceLevels>,
    pub fail_session: bool,
    pub fail_levels: bool,
}

impl FakeAuthStore {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn signed_in(current: AssuranceLevel, next: AssuranceLevel) -> Self {
        Self {
            session: Some(session()),
            levels: Some(AssuranceLevels::new(current, next)),
            ..Self::default()
        }
    }
}

#[async_trait]
impl AuthStore for FakeAuthStore {
    async fn session(&self, _request: &RequestHead) -> ApiResult<Option<Session>> {
        if self.fail_session {
            return Err(ApiError::auth_store("session lookup failed"));
        }
        Ok(self.session.clone())
    }

    async fn assurance_levels(
        &self,
        _request: &RequestHead,
        _session: &Session,
    ) -> ApiResult<Option<AssuranceLevels>> {
        if self.fail_levels {
            return Err(ApiError::auth_store("factor lookup failed"));
        }
        Ok(self.levels)
    }
}

pub fn test_policy() -> GatePolicy {
    GatePolicy::new(&GateConfig::default(), &test_config().i18n)
}

/// Gatekeeper with healthy rewriter/refresher fakes and the given store.
pub fn gatekeeper(store: FakeAuthStore) -> Gatekeeper {
    gatekeeper_with(FakeLocaleRewriter { fail: false }, FakeSessionRefresher { fail: false }, store)
}

pub fn gatekeeper_with(
    rewriter: FakeLocaleRewriter,
    refresher: FakeSessionRefresher,
    store: FakeAuthStore,
) -> Gatekeeper {
    Gatekeeper::new(Arc::new(rewriter), Arc::new(refresher), Arc::new(store), test_policy())
}

/// The pass-through response produced by the healthy fakes.
pub fn refreshed_passthrough() -> EdgeResponse {
    let mut response = EdgeResponse::next();
    response.append_set_cookie("locale=en").expect("valid cookie");
    response.append_set_cookie("session=refreshed").expect("valid cookie");
    response.locale = Some("en".to_string());
    response
}
