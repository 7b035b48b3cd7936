use chrono::Utc;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};

use crate::models::SessionClaims;
use crate::utils::{ApiError, ApiResult};

/// Signs and verifies session access tokens (HS256).
#[derive(Clone)]
pub struct JwtUtil {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_secs: i64,
}

impl JwtUtil {
    pub fn new(secret: &str, ttl_secs: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs: i64::try_from(ttl_secs).unwrap_or(i64::MAX),
        }
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    /// Sign `claims` as-is.
    pub fn encode(&self, claims: &SessionClaims) -> ApiResult<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| ApiError::internal_error(format!("Failed to sign token: {}", e)))
    }

    /// Issue a new token for `claims` valid for the configured TTL from now.
    pub fn issue(&self, claims: &SessionClaims) -> ApiResult<(String, SessionClaims)> {
        let now = Utc::now().timestamp();
        let claims = SessionClaims { iat: now, exp: now.saturating_add(self.ttl_secs), ..claims.clone() };
        let token = self.encode(&claims)?;
        Ok((token, claims))
    }

    pub fn verify_token(&self, token: &str) -> ApiResult<SessionClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => ApiError::TokenExpired,
                _ => ApiError::invalid_token(e.to_string()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AssuranceLevel;

    fn claims(exp_offset: i64) -> SessionClaims {
        let now = Utc::now().timestamp();
        SessionClaims {
            sub: "user-1".to_string(),
            email: Some("ada@example.com".to_string()),
            iat: now,
            exp: now + exp_offset,
            aal: AssuranceLevel::Aal1,
            mfa_enrolled: false,
        }
    }

    #[test]
    fn test_issue_and_verify() {
        let jwt = JwtUtil::new("secret", 3600);
        let (token, issued) = jwt.issue(&claims(10)).unwrap();
        assert!(issued.exp >= Utc::now().timestamp() + 3590);

        let verified = jwt.verify_token(&token).unwrap();
        assert_eq!(verified, issued);
    }

    #[test]
    fn test_expired_token() {
        let jwt = JwtUtil::new("secret", 3600);
        let token = jwt.encode(&claims(-120)).unwrap();
        assert!(matches!(jwt.verify_token(&token), Err(ApiError::TokenExpired)));
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let token = JwtUtil::new("secret", 3600).encode(&claims(600)).unwrap();
        let other = JwtUtil::new("other", 3600);
        assert!(matches!(other.verify_token(&token), Err(ApiError::InvalidToken(_))));
        assert!(matches!(other.verify_token("not-a-jwt"), Err(ApiError::InvalidToken(_))));
    }
}
