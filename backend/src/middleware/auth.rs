use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::models::{EdgeAction, RequestHead, apply_header_overrides};
use crate::services::Gatekeeper;
use crate::utils::{RequestMatcher, ResolvedLocale};

#[derive(Clone)]
pub struct GateState {
    pub gatekeeper: Arc<Gatekeeper>,
    pub matcher: Arc<RequestMatcher>,
}

/// Edge gate middleware.
/// 1. Skip paths the matcher excludes (assets, API, health)
/// 2. Ask the gatekeeper for the edge response
/// 3. Redirect, or forward the (possibly rewritten) request
/// 4. Append the edge's Set-Cookie headers to whatever is returned
pub async fn gate_middleware(State(state): State<GateState>, mut req: Request, next: Next) -> Response {
    if !state.matcher.should_gate(req.uri().path()) {
        return next.run(req).await;
    }

    let head = RequestHead::from_request(&req);
    let edge = state.gatekeeper.handle(&head).await;

    tracing::debug!("Gate {} {} -> {:?}", head.method, head.uri, edge.action);

    let mut response = match &edge.action {
        EdgeAction::Redirect { location } => Redirect::temporary(location).into_response(),
        EdgeAction::Next { rewrite } => {
            if let Some(uri) = rewrite {
                *req.uri_mut() = uri.clone();
            }
            apply_header_overrides(req.headers_mut(), &edge.request_headers);
            if let Some(locale) = &edge.locale {
                req.extensions_mut().insert(ResolvedLocale(locale.clone()));
            }
            next.run(req).await
        },
    };

    for (name, value) in edge.headers.iter() {
        response.headers_mut().append(name.clone(), value.clone());
    }

    response
}
