use crate::auth::auth::AuthUser;
use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::error::AppError;
use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, ResponseError,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    web::Data,
};
use tracing::debug;

fn bearer_token(req: &ServiceRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn reject(req: ServiceRequest, err: AppError) -> ServiceResponse<BoxBody> {
    req.into_response(err.error_response())
}

/// Decodes the bearer token and attaches `AuthUser` to the request.
pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let config = req
        .app_data::<Data<Config>>()
        .ok_or_else(|| AppError::Unhandled("App config missing".to_string()))?;

    let token = match bearer_token(&req) {
        Some(t) => t,
        None => {
            let err = AppError::Unauthenticated("Unauthorized: No token provided.".to_string());
            return Ok(reject(req, err));
        }
    };

    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) => c,
        Err(e) => {
            debug!(error = %e, "JWT verification failed");
            let err = AppError::Forbidden("Forbidden: Invalid or expired token.".to_string());
            return Ok(reject(req, err));
        }
    };

    req.extensions_mut().insert(AuthUser::from(claims));

    next.call(req).await
}

/// Admin-only gate. Must run after `auth_middleware`.
pub async fn require_admin(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let verdict = match req.extensions().get::<AuthUser>() {
        Some(user) => user.require_admin(),
        None => Err(AppError::Unauthenticated(
            "Unauthorized: No token provided.".to_string(),
        )),
    };

    match verdict {
        Ok(()) => next.call(req).await,
        Err(err) => Ok(reject(req, err)),
    }
}
