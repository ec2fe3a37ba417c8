use actix_web::HttpRequest;

use crate::auth::service::AuthService;
use crate::db::models::PublicUser;
use crate::error::{AppError, AuthError};

/// Pulls the bearer credential out of the Authorization header.
pub fn bearer_token(req: &HttpRequest) -> Result<&str, AppError> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| AuthError::Unauthorized.into())
}

/// Request guard: bearer token in, resolved user out. Any handler that
/// needs an authenticated caller composes with this first.
pub async fn authenticate_request(
    req: &HttpRequest,
    auth_service: &AuthService,
) -> Result<PublicUser, AppError> {
    let token = bearer_token(req)?;
    auth_service.current_user(token).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_bearer_token_extraction() {
        let req = TestRequest::default()
            .insert_header(("Authorization", "Bearer abc.def.ghi"))
            .to_http_request();
        assert_eq!(bearer_token(&req).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_missing_header_is_unauthorized() {
        let req = TestRequest::default().to_http_request();
        assert!(matches!(
            bearer_token(&req),
            Err(AppError::AuthError(AuthError::Unauthorized))
        ));
    }

    #[test]
    fn test_wrong_scheme_is_unauthorized() {
        let req = TestRequest::default()
            .insert_header(("Authorization", "Basic dXNlcjpwdw=="))
            .to_http_request();
        assert!(bearer_token(&req).is_err());
    }
}
