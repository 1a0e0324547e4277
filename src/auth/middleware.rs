//! Authentication Middleware
//!
//! Axum middleware for token validation and user authentication.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

use crate::auth::{
    jwt::{TokenService, VerifyToken},
    models::AuthUser,
};
use crate::error::ApiError;

/// Name of the cookie set at login.
pub const AUTH_COOKIE: &str = "user-token";

/// Authentication middleware that validates tokens and injects user info
pub struct AuthMiddleware;

impl AuthMiddleware {
    /// Middleware function for validating tokens
    pub async fn validate_token(
        State(token_service): State<Arc<TokenService>>,
        mut req: Request,
        next: Next,
    ) -> Result<Response, ApiError> {
        let auth_user = match authenticate(req.headers(), token_service.as_ref()) {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!("[AuthMiddleware] Rejected {} {}", req.method(), req.uri().path());
                return Err(e);
            }
        };
        tracing::debug!("[AuthMiddleware] AuthUser injected: id={}, email={}", auth_user.id, auth_user.email);

        // Insert the user into request extensions for downstream handlers
        req.extensions_mut().insert(auth_user);

        Ok(next.run(req).await)
    }
}

/// Resolve the caller's identity from request headers.
///
/// The cookie wins over the header whenever it is present. Every failure
/// collapses into [`ApiError::Unauthenticated`].
pub fn authenticate<V>(headers: &HeaderMap, verifier: &V) -> Result<AuthUser, ApiError>
where
    V: VerifyToken + ?Sized,
{
    let Some(token) = extract_token(headers) else {
        tracing::debug!("[AuthMiddleware] No token in cookie or Authorization header");
        return Err(ApiError::Unauthenticated);
    };

    let claims = verifier.verify(&token).map_err(|_| ApiError::Unauthenticated)?;
    Ok(AuthUser::from(claims))
}

/// Pull the raw token out of the `user-token` cookie, falling back to a bearer header.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(AUTH_COOKIE).filter(|c| !c.value().is_empty()) {
        return Some(cookie.value().to_string());
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token)
        .map(str::to_string)
}

/// Accepts exactly `Bearer <token>`: two parts separated by a single space.
fn bearer_token(value: &str) -> Option<&str> {
    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Some(token),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{Claims, InvalidToken, test_clock::ManualClock};
    use axum::{
        Extension, Json, Router,
        body::{Body, to_bytes},
        http::{HeaderValue, Request, StatusCode},
        middleware::from_fn_with_state,
        routing::get,
    };
    use chrono::{Duration, Utc};
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    /// Verifier that records how often it was asked.
    struct CountingVerifier {
        inner: TokenService,
        calls: AtomicUsize,
    }

    impl VerifyToken for CountingVerifier {
        fn verify(&self, token: &str) -> Result<Claims, InvalidToken> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.verify(token)
        }
    }

    fn counting() -> CountingVerifier {
        CountingVerifier {
            inner: TokenService::new("test_secret", Duration::hours(1)).unwrap(),
            calls: AtomicUsize::new(0),
        }
    }

    fn headers(pairs: Vec<(header::HeaderName, String)>) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name, HeaderValue::from_str(&value).unwrap());
        }
        map
    }

    #[test]
    fn test_bearer_shapes() {
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("Token abc123"), None);
        assert_eq!(bearer_token("bearer abc"), None);
        assert_eq!(bearer_token("Bearer"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("Bearer  abc"), None);
        assert_eq!(bearer_token("Bearer abc def"), None);
    }

    #[test]
    fn test_no_token_skips_verification() {
        let verifier = counting();

        let result = authenticate(&HeaderMap::new(), &verifier);

        assert!(matches!(result, Err(ApiError::Unauthenticated)));
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_wrong_scheme_is_no_token() {
        let verifier = counting();
        let map = headers(vec![(header::AUTHORIZATION, "Token abc123".to_string())]);

        let result = authenticate(&map, &verifier);

        assert!(matches!(result, Err(ApiError::Unauthenticated)));
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_header_and_cookie_resolve_identically() {
        let verifier = counting();
        let token = verifier.inner.issue("a@x.com", "u1").unwrap();

        let via_header = authenticate(
            &headers(vec![(header::AUTHORIZATION, format!("Bearer {token}"))]),
            &verifier,
        )
        .unwrap();
        let via_cookie = authenticate(
            &headers(vec![(header::COOKIE, format!("{AUTH_COOKIE}={token}"))]),
            &verifier,
        )
        .unwrap();

        assert_eq!(via_header, via_cookie);
        assert_eq!(via_header, AuthUser { id: "u1".into(), email: "a@x.com".into() });
    }

    #[test]
    fn test_cookie_among_others_is_found() {
        let verifier = counting();
        let token = verifier.inner.issue("a@x.com", "u1").unwrap();
        let map = headers(vec![(header::COOKIE, format!("theme=dark; {AUTH_COOKIE}={token}; lang=en"))]);

        assert_eq!(authenticate(&map, &verifier).unwrap().id, "u1");
    }

    #[test]
    fn test_cookie_takes_precedence_over_header() {
        let verifier = counting();
        let good = verifier.inner.issue("a@x.com", "u1").unwrap();
        let map = headers(vec![
            (header::COOKIE, format!("{AUTH_COOKIE}=not-a-token")),
            (header::AUTHORIZATION, format!("Bearer {good}")),
        ]);

        let result = authenticate(&map, &verifier);

        assert!(matches!(result, Err(ApiError::Unauthenticated)));
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_empty_cookie_falls_back_to_header() {
        let verifier = counting();
        let good = verifier.inner.issue("a@x.com", "u1").unwrap();
        let map = headers(vec![
            (header::COOKIE, format!("{AUTH_COOKIE}=")),
            (header::AUTHORIZATION, format!("Bearer {good}")),
        ]);

        assert_eq!(authenticate(&map, &verifier).unwrap().email, "a@x.com");
    }

    async fn whoami(Extension(user): Extension<AuthUser>) -> Json<AuthUser> {
        Json(user)
    }

    fn app(service: Arc<TokenService>) -> Router {
        Router::new()
            .route("/whoami", get(whoami))
            .route_layer(from_fn_with_state(service, AuthMiddleware::validate_token))
    }

    async fn call(app: Router, header: Option<(header::HeaderName, String)>) -> (StatusCode, Value) {
        let mut builder = Request::builder().uri("/whoami");
        if let Some((name, value)) = header {
            builder = builder.header(name, value);
        }
        let response = app.oneshot(builder.body(Body::empty()).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_middleware_attaches_identity() {
        let service = Arc::new(TokenService::new("test_secret", Duration::hours(1)).unwrap());
        let token = service.issue("a@x.com", "u1").unwrap();

        let (status, body) = call(
            app(service.clone()),
            Some((header::AUTHORIZATION, format!("Bearer {token}"))),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], "u1");
        assert_eq!(body["email"], "a@x.com");
    }

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<parking_lot::Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_rejection_log_omits_query_string() {
        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let service = Arc::new(TokenService::new("test_secret", Duration::hours(1)).unwrap());
        let request = Request::builder()
            .uri("/whoami?token=leaked-credential")
            .body(Body::empty())
            .unwrap();
        let response = app(service).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let output = String::from_utf8(logs.0.lock().clone()).unwrap();
        assert!(output.contains("Rejected GET /whoami"), "{output}");
        assert!(!output.contains("leaked-credential"), "{output}");
    }

    #[tokio::test]
    async fn test_missing_and_expired_are_indistinguishable() {
        let clock = ManualClock::new(Utc::now());
        let service = Arc::new(
            TokenService::new("test_secret", Duration::hours(1))
                .unwrap()
                .with_clock(clock.clone()),
        );
        let token = service.issue("a@x.com", "u1").unwrap();
        clock.advance(Duration::hours(2));

        let missing = call(app(service.clone()), None).await;
        let expired = call(
            app(service.clone()),
            Some((header::COOKIE, format!("{AUTH_COOKIE}={token}"))),
        )
        .await;
        let forged = call(
            app(service.clone()),
            Some((header::AUTHORIZATION, "Bearer abc.def.ghi".to_string())),
        )
        .await;

        assert_eq!(missing.0, StatusCode::UNAUTHORIZED);
        assert_eq!(missing, expired);
        assert_eq!(missing, forged);
    }
}
