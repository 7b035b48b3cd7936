//! Request gatekeeper
//!
//! Runs once per gated request: locale rewrite, session refresh, then the
//! login, invite canonicalization and second-factor redirects, in that order.
//! Collaborator failures never reach the client; the request is passed
//! through untouched instead.

use std::sync::Arc;

use crate::config::{GateConfig, I18nConfig, UrlMappingStrategy};
use crate::middleware::locale::LocaleRewriter;
use crate::models::{EdgeResponse, RequestHead};
use crate::services::auth_store::AuthStore;
use crate::services::session_refresher::SessionRefresher;
use crate::utils::paths::{self, PublicPaths};
use crate::utils::ApiResult;

/// Redirect rules applied after the session is known.
#[derive(Debug, Clone)]
pub struct GatePolicy {
    pub locales: Vec<String>,
    pub login_path: String,
    pub mfa_verify_path: String,
    pub public_paths: PublicPaths,
    pub team_paths: Vec<String>,
    pub invite_prefix: String,
    /// Redirect localized invite links to their unprefixed form. Off when
    /// public URLs must carry the locale, where the prefixed form is canonical.
    pub canonicalize_invites: bool,
}

impl GatePolicy {
    pub fn new(config: &GateConfig, i18n: &I18nConfig) -> Self {
        Self {
            locales: i18n.locales.clone(),
            login_path: config.login_path.clone(),
            mfa_verify_path: config.mfa_verify_path.clone(),
            public_paths: PublicPaths::new(&config.public_paths, &config.public_segments),
            team_paths: config.team_paths.clone(),
            invite_prefix: config.invite_prefix.clone(),
            canonicalize_invites: i18n.url_mapping_strategy != UrlMappingStrategy::Redirect,
        }
    }
}

pub struct Gatekeeper {
    locale_rewriter: Arc<dyn LocaleRewriter>,
    session_refresher: Arc<dyn SessionRefresher>,
    auth_store: Arc<dyn AuthStore>,
    policy: GatePolicy,
}

impl Gatekeeper {
    pub fn new(
        locale_rewriter: Arc<dyn LocaleRewriter>,
        session_refresher: Arc<dyn SessionRefresher>,
        auth_store: Arc<dyn AuthStore>,
        policy: GatePolicy,
    ) -> Self {
        Self { locale_rewriter, session_refresher, auth_store, policy }
    }

    /// Decide the edge response for `request`. Never fails.
    pub async fn handle(&self, request: &RequestHead) -> EdgeResponse {
        match self.try_handle(request).await {
            Ok(response) => response,
            Err(err) => {
                tracing::error!(
                    method = %request.method,
                    uri = %request.uri,
                    code = err.error_code(),
                    "Gatekeeper error, passing request through: {}",
                    err
                );
                EdgeResponse::next()
            },
        }
    }

    async fn try_handle(&self, request: &RequestHead) -> ApiResult<EdgeResponse> {
        let rewritten = self.locale_rewriter.rewrite(request).await?;
        let response = self.session_refresher.refresh(request, rewritten).await?;

        // Auth queries see the refreshed cookies.
        let request = request.with_request_headers(&response.request_headers);

        let (locale_prefix, canonical_path) =
            paths::strip_locale_prefix(request.path(), &self.policy.locales);
        let return_to = paths::return_to(canonical_path, request.query());

        let Some(session) = self.auth_store.session(&request).await? else {
            if self.policy.public_paths.is_public(canonical_path) {
                return Ok(response);
            }
            tracing::debug!("No session for {}, redirecting to login", canonical_path);
            return Ok(EdgeResponse::redirect(paths::with_return_to(
                &self.policy.login_path,
                &return_to,
            )));
        };

        if self.policy.canonicalize_invites
            && locale_prefix.is_some()
            && !self.policy.team_paths.iter().any(|p| p == canonical_path)
            && canonical_path.starts_with(&self.policy.invite_prefix)
        {
            tracing::debug!("Canonicalizing invite path {}", canonical_path);
            return Ok(EdgeResponse::redirect(canonical_path));
        }

        let levels = self.auth_store.assurance_levels(&request, &session).await?;
        if let Some(levels) = levels
            && levels.requires_step_up()
            && canonical_path != self.policy.mfa_verify_path
        {
            tracing::debug!(
                "User {} at {} must reach {}, redirecting to MFA verification",
                session.user_id,
                levels.current,
                levels.next
            );
            return Ok(EdgeResponse::redirect(paths::with_return_to(
                &self.policy.mfa_verify_path,
                &return_to,
            )));
        }

        Ok(response)
    }
}
