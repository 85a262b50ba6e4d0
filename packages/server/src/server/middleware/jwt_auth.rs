use axum::{middleware::Next, response::Response};
use tracing::debug;
use uuid::Uuid;

use crate::domains::auth::Claims;
use crate::domains::users::User;
use crate::server::app::AppState;

/// Authenticated user information resolved from a JWT
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
}

/// JWT authentication middleware
///
/// Extracts the bearer token from the Authorization header, verifies it and
/// resolves the user row, then adds AuthUser to request extensions. If there
/// is no token, an invalid token, or the account no longer exists, the
/// request continues without AuthUser (public access); handlers that need
/// authentication reject it there.
pub async fn jwt_auth_middleware(
    state: AppState,
    mut request: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    // Verify the token synchronously so the `!Send` `&Request` borrow does
    // not cross the database await inside `resolve_auth_user`.
    let auth_user = match verify_claims(&request, &state) {
        Some(claims) => resolve_auth_user(claims, &state).await,
        None => None,
    };

    if let Some(user) = auth_user {
        debug!("Authenticated user: {} <{}>", user.user_id, user.email);
        request.extensions_mut().insert(user);
    } else {
        debug!("No valid authentication token");
    }

    next.run(request).await
}

/// Extract and verify the JWT from the request headers. Synchronous: it
/// performs no I/O, so the `!Send` `&Request` borrow never crosses an await.
fn verify_claims(
    request: &axum::http::Request<axum::body::Body>,
    state: &AppState,
) -> Option<Claims> {
    let token = bearer_token(request)?;
    state.jwt_service.verify_token(token).ok()
}

/// Resolve verified claims to a live user row so tokens for deleted accounts
/// do not act.
async fn resolve_auth_user(claims: Claims, state: &AppState) -> Option<AuthUser> {
    let user = User::find_by_id(claims.user_id, &state.db_pool)
        .await
        .ok()
        .flatten()?;

    Some(AuthUser {
        user_id: user.id,
        name: user.name,
        email: user.email,
    })
}

/// Pull the token out of the Authorization header (with or without the
/// "Bearer " prefix)
fn bearer_token(request: &axum::http::Request<axum::body::Body>) -> Option<&str> {
    let auth_header = request.headers().get("authorization")?;
    let auth_str = auth_header.to_str().ok()?;

    Some(auth_str.strip_prefix("Bearer ").unwrap_or(auth_str))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_with_auth(value: &str) -> axum::http::Request<axum::body::Body> {
        axum::http::Request::builder()
            .header("authorization", value)
            .body(axum::body::Body::empty())
            .unwrap()
    }

    #[test]
    fn test_bearer_token_with_prefix() {
        let request = request_with_auth("Bearer abc.def.ghi");
        assert_eq!(bearer_token(&request), Some("abc.def.ghi"));
    }

    #[test]
    fn test_bearer_token_without_prefix() {
        let request = request_with_auth("abc.def.ghi");
        assert_eq!(bearer_token(&request), Some("abc.def.ghi"));
    }

    #[test]
    fn test_no_auth_header() {
        let request = axum::http::Request::builder()
            .body(axum::body::Body::empty())
            .unwrap();
        assert_eq!(bearer_token(&request), None);
    }
}
