use async_trait::async_trait;

use crate::models::{AssuranceLevel, AssuranceLevels, RequestHead, Session};
use crate::utils::{ApiError, ApiResult, JwtUtil, cookies};

#[async_trait]
pub trait AuthStore: Send + Sync {
    /// Current session for the request, if any.
    async fn session(&self, request: &RequestHead) -> ApiResult<Option<Session>>;

    /// Assurance levels for an established session.
    async fn assurance_levels(
        &self,
        request: &RequestHead,
        session: &Session,
    ) -> ApiResult<Option<AssuranceLevels>>;
}

/// Auth store backed by the signed access-token cookie.
#[derive(Clone)]
pub struct JwtAuthStore {
    jwt_util: JwtUtil,
    cookie_name: String,
}

impl JwtAuthStore {
    pub fn new(jwt_util: JwtUtil, cookie_name: impl Into<String>) -> Self {
        Self { jwt_util, cookie_name: cookie_name.into() }
    }
}

#[async_trait]
impl AuthStore for JwtAuthStore {
    async fn session(&self, request: &RequestHead) -> ApiResult<Option<Session>> {
        let Some(token) = cookies::get_cookie(&request.headers, &self.cookie_name) else {
            return Ok(None);
        };

        let claims = match self.jwt_util.verify_token(&token) {
            Ok(claims) => claims,
            Err(ApiError::TokenExpired | ApiError::InvalidToken(_)) => return Ok(None),
            Err(err) => return Err(ApiError::auth_store(err.to_string())),
        };

        let exp = claims.exp;
        Session::from_claims(token, claims)
            .map(Some)
            .ok_or_else(|| ApiError::auth_store(format!("session expiry out of range: {}", exp)))
    }

    async fn assurance_levels(
        &self,
        _request: &RequestHead,
        session: &Session,
    ) -> ApiResult<Option<AssuranceLevels>> {
        let current = session.claims.aal;
        let next = if session.claims.mfa_enrolled { AssuranceLevel::Aal2 } else { current };
        Ok(Some(AssuranceLevels::new(current, next)))
    }
}
