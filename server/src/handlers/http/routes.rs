use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;

use anyhow::{Context, Result};
use bytes::Bytes;
use http_body_util::{BodyExt, combinators::BoxBody};
use hyper::{Method, Request, Response, StatusCode};
use tracing::warn;

use shared::types::jwt::JwtClaims;

use crate::AppState;
use crate::handlers::http::utils::{deliver_error_json, get_header_value};
use crate::handlers::http::{auth, profile};
use crate::token::{self, CredentialError};

// ---------------------------------------------------------------------------
// Handler type aliases
// ---------------------------------------------------------------------------
//
// Two security tiers:
//
//   RouteHandler  — no auth.  Receives (req, state).
//                   Use for: /register, /authenticate, /health.
//
//   AuthHandler   — credential signature + expiry verified by the router.
//                   Receives (req, state, claims).
//                   Use for: everything operating on the logged-in account.

type RouteHandler = Box<
    dyn Fn(
            Request<hyper::body::Incoming>,
            AppState,
        )
            -> Pin<Box<dyn Future<Output = Result<Response<BoxBody<Bytes, Infallible>>>> + Send>>
        + Send
        + Sync,
>;

type AuthHandler = Box<
    dyn Fn(
            Request<hyper::body::Incoming>,
            AppState,
            JwtClaims,
        )
            -> Pin<Box<dyn Future<Output = Result<Response<BoxBody<Bytes, Infallible>>>> + Send>>
        + Send
        + Sync,
>;

// ---------------------------------------------------------------------------
// RouteKind
// ---------------------------------------------------------------------------

enum RouteKind {
    /// No authentication check.
    Open(RouteHandler),

    /// Credential-guarded: the router verifies the Authorization header and
    /// hands the decoded `JwtClaims` to the handler.  Rejections never reach
    /// the handler, or storage.
    Auth(AuthHandler),
}

// ---------------------------------------------------------------------------
// Route
// ---------------------------------------------------------------------------

struct Route {
    method: Method,
    path: String,
    kind: RouteKind,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub struct Router {
    routes: Vec<Route>,
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("routes_count", &self.routes.len())
            .finish()
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    // ── Open (no auth) ────────────────────────────────────────────────────────

    /// GET with no authentication — use for health checks.
    pub fn get<F, Fut>(mut self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<hyper::body::Incoming>, AppState) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<BoxBody<Bytes, Infallible>>>> + Send + 'static,
    {
        self.routes.push(Route {
            method: Method::GET,
            path: path.to_string(),
            kind: RouteKind::Open(Box::new(move |req, state| Box::pin(handler(req, state)))),
        });
        self
    }

    /// POST with no authentication — use only for register / authenticate.
    pub fn post<F, Fut>(mut self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<hyper::body::Incoming>, AppState) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<BoxBody<Bytes, Infallible>>>> + Send + 'static,
    {
        self.routes.push(Route {
            method: Method::POST,
            path: path.to_string(),
            kind: RouteKind::Open(Box::new(move |req, state| Box::pin(handler(req, state)))),
        });
        self
    }

    // ── Credential auth ───────────────────────────────────────────────────────
    //
    // The router verifies the presented credential before the handler is
    // called.  Handlers receive `JwtClaims` and must NOT re-verify the
    // Authorization header themselves; the work is already done.

    /// GET guarded by credential auth.
    pub fn get_auth<F, Fut>(mut self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<hyper::body::Incoming>, AppState, JwtClaims) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<BoxBody<Bytes, Infallible>>>> + Send + 'static,
    {
        self.routes.push(Route {
            method: Method::GET,
            path: path.to_string(),
            kind: RouteKind::Auth(Box::new(move |req, state, claims| {
                Box::pin(handler(req, state, claims))
            })),
        });
        self
    }

    /// PUT guarded by credential auth.
    pub fn put_auth<F, Fut>(mut self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<hyper::body::Incoming>, AppState, JwtClaims) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<BoxBody<Bytes, Infallible>>>> + Send + 'static,
    {
        self.routes.push(Route {
            method: Method::PUT,
            path: path.to_string(),
            kind: RouteKind::Auth(Box::new(move |req, state, claims| {
                Box::pin(handler(req, state, claims))
            })),
        });
        self
    }

    // ── Dispatch ──────────────────────────────────────────────────────────────

    pub async fn route(
        &self,
        req: Request<hyper::body::Incoming>,
        state: AppState,
    ) -> Result<Response<BoxBody<Bytes, Infallible>>> {
        let method = req.method().clone();
        let path = req.uri().path().to_string();

        for route in &self.routes {
            if route.method != method || !Self::path_matches(&route.path, &path) {
                continue;
            }

            return match &route.kind {
                RouteKind::Open(h) => h(req, state).await,

                RouteKind::Auth(h) => {
                    let header =
                        get_header_value(req.headers(), "authorization").unwrap_or_default();
                    match token::verify_credential(&state.keys, &header) {
                        Ok(claims) => h(req, state, claims).await,
                        Err(reason) => {
                            warn!("Auth rejected {} {}: {}", method, path, reason);
                            credential_rejection(&reason)
                        }
                    }
                }
            };
        }

        deliver_error_json("NOT_FOUND", "Endpoint not found", StatusCode::NOT_FOUND)
            .context("Failed to deliver 404 response")
    }

    // ── Path matching ─────────────────────────────────────────────────────────

    pub fn path_matches(route_path: &str, request_path: &str) -> bool {
        // Strip query string from incoming request path before comparing.
        let clean = request_path.split('?').next().unwrap_or(request_path);
        route_path == clean
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Map a credential rejection to its client-facing 401.
///
/// Expired is reported under its own code: a client holding a stale token
/// needs to re-authenticate, not debug a signature problem.
fn credential_rejection(err: &CredentialError) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    let code = match err {
        CredentialError::Malformed => "MALFORMED_CREDENTIAL",
        CredentialError::InvalidSignature => "INVALID_TOKEN",
        CredentialError::Expired => "TOKEN_EXPIRED",
    };

    deliver_error_json(code, &err.to_string(), StatusCode::UNAUTHORIZED)
        .context("Failed to deliver 401 response")
}

// ---------------------------------------------------------------------------
// API router
//
// Auth tier is enforced here at the routing level; handlers MUST NOT repeat
// the credential check.  The contract is:
//
//   .get(...)       → Open  — handler gets (req, state)
//   .post(...)      → Open  — register / authenticate only
//   .get_auth(...)  → Auth  — handler gets (req, state, claims)
//   .put_auth(...)  → Auth  — same
// ---------------------------------------------------------------------------

pub fn build_api_router() -> Router {
    Router::new()
        // ── Public: no auth ──────────────────────────────────────────────────
        .get("/health", |_req, _state| async move {
            Ok(Response::builder()
                .status(StatusCode::OK)
                .header("content-type", "application/json")
                .body(
                    http_body_util::Full::new(Bytes::from(r#"{"status":"success","health":"ok"}"#))
                        .boxed(),
                )
                .unwrap())
        })
        .post("/register", |req, state| async move {
            auth::handle_register(req, state)
                .await
                .context("Register failed")
        })
        .post("/authenticate", |req, state| async move {
            auth::handle_authenticate(req, state)
                .await
                .context("Authenticate failed")
        })
        // ── Credential auth: verified before the handler runs ────────────────
        .get_auth("/profile", |req, state, claims| async move {
            profile::handle_get_profile(req, state, claims)
                .await
                .context("Profile get failed")
        })
        .put_auth("/profile", |req, state, claims| async move {
            profile::handle_update_profile(req, state, claims)
                .await
                .context("Profile update failed")
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_path_matches() {
        assert!(Router::path_matches("/profile", "/profile"));
    }

    #[test]
    fn different_paths_do_not_match() {
        assert!(!Router::path_matches("/profile", "/register"));
    }

    #[test]
    fn trailing_slash_does_not_match_without_slash() {
        assert!(!Router::path_matches("/profile", "/profile/"));
    }

    #[test]
    fn query_string_stripped_before_match() {
        assert!(Router::path_matches("/profile", "/profile?verbose=1"));
    }

    #[test]
    fn router_new_has_no_routes() {
        let r = Router::new();
        assert!(r.routes.is_empty());
    }

    #[tokio::test]
    async fn router_post_adds_open_route() {
        let r = Router::new().post("/register", |_req, _state| async move {
            Ok(Response::builder()
                .status(StatusCode::OK)
                .body(http_body_util::Full::new(Bytes::from("ok")).boxed())
                .unwrap())
        });
        assert_eq!(r.routes.len(), 1);
        assert_eq!(r.routes[0].path, "/register");
        assert!(matches!(r.routes[0].kind, RouteKind::Open(_)));
    }

    #[tokio::test]
    async fn router_get_auth_adds_auth_route() {
        let r = Router::new().get_auth("/profile", |_req, _state, _claims| async move {
            Ok(Response::builder()
                .status(StatusCode::OK)
                .body(http_body_util::Full::new(Bytes::from("ok")).boxed())
                .unwrap())
        });
        assert_eq!(r.routes.len(), 1);
        assert!(matches!(r.routes[0].kind, RouteKind::Auth(_)));
    }

    #[tokio::test]
    async fn router_put_auth_adds_auth_route() {
        let r = Router::new().put_auth("/profile", |_req, _state, _claims| async move {
            Ok(Response::builder()
                .status(StatusCode::OK)
                .body(http_body_util::Full::new(Bytes::from("ok")).boxed())
                .unwrap())
        });
        assert_eq!(r.routes.len(), 1);
        assert!(matches!(r.routes[0].kind, RouteKind::Auth(_)));
    }

    #[test]
    fn api_router_registers_all_endpoints() {
        let r = build_api_router();
        assert_eq!(r.routes.len(), 5);
    }

    #[test]
    fn credential_rejection_codes_are_distinct() {
        let malformed = credential_rejection(&CredentialError::Malformed).unwrap();
        let expired = credential_rejection(&CredentialError::Expired).unwrap();
        assert_eq!(malformed.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(expired.status(), StatusCode::UNAUTHORIZED);
    }
}
