use actix_web::HttpRequest;
use uuid::Uuid;

use crate::auth::token::TokenService;
use crate::errors::AppError;

/// Identity resolved from a bearer token for the current request.
#[derive(Debug, Clone)]
pub struct AuthIdentity {
    pub user_id: Uuid,
    pub email: String,
}

/// Resolves a raw `Authorization` header value into an identity. Missing,
/// malformed, expired and badly signed tokens all resolve to `None`.
pub fn resolve_identity(header: Option<&str>, tokens: &TokenService) -> Option<AuthIdentity> {
    let raw = header?.trim();
    let token = raw.strip_prefix("Bearer ").unwrap_or(raw);
    let claims = tokens.verify(token)?;
    let user_id = Uuid::parse_str(&claims.sub).ok()?;
    Some(AuthIdentity {
        user_id,
        email: claims.email,
    })
}

/// Per-operation guard: every protected operation calls this before
/// touching the store.
pub fn require_auth(req: &HttpRequest, tokens: &TokenService) -> Result<AuthIdentity, AppError> {
    let header = req
        .headers()
        .get("Authorization")
        .and_then(|value| value.to_str().ok());
    resolve_identity(header, tokens)
        .ok_or_else(|| AppError::Unauthorized("Missing or invalid token".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn bearer_prefix_is_optional() {
        let tokens = TokenService::new("test-secret");
        let user_id = Uuid::new_v4();
        let token = tokens.issue(user_id, "a@x.com").unwrap();

        let with_prefix = format!("Bearer {}", token);
        let identity = resolve_identity(Some(&with_prefix), &tokens).unwrap();
        assert_eq!(identity.user_id, user_id);
        assert_eq!(identity.email, "a@x.com");

        let bare = resolve_identity(Some(&token), &tokens).unwrap();
        assert_eq!(bare.user_id, user_id);
    }

    #[test]
    fn anonymous_on_missing_or_malformed_header() {
        let tokens = TokenService::new("test-secret");

        assert!(resolve_identity(None, &tokens).is_none());
        assert!(resolve_identity(Some(""), &tokens).is_none());
        assert!(resolve_identity(Some("Bearer "), &tokens).is_none());
        assert!(resolve_identity(Some("Bearer garbage"), &tokens).is_none());
    }

    #[actix_web::test]
    async fn require_auth_rejects_anonymous_requests() {
        let tokens = TokenService::new("test-secret");

        let req = TestRequest::default().to_http_request();
        let err = require_auth(&req, &tokens).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));

        let req = TestRequest::default()
            .insert_header(("Authorization", "Bearer nope"))
            .to_http_request();
        assert!(require_auth(&req, &tokens).is_err());

        let token = tokens.issue(Uuid::new_v4(), "a@x.com").unwrap();
        let req = TestRequest::default()
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_http_request();
        assert!(require_auth(&req, &tokens).is_ok());
    }
}
