//! Credential verification and token issuance, kept free of I/O so the
//! login handler only has to fetch the user row.

use tracing::{error, info};

use crate::{
    auth::{jwt::generate_access_token, password::verify_password},
    config::Config,
    error::AppError,
    model::user::{User, UserView},
    models::LoginResponse,
};

/// Unknown usernames and wrong passwords fail identically.
pub fn verify_credentials(user: Option<User>, password: &str) -> Result<User, AppError> {
    let Some(user) = user else {
        info!("Invalid credentials: user not found");
        return Err(AppError::InvalidCredentials);
    };

    if let Err(e) = verify_password(password, &user.password_hash) {
        if matches!(e, argon2::password_hash::Error::Password) {
            info!(user_id = user.id, "Invalid credentials: password mismatch");
        } else {
            error!(user_id = user.id, error = %e, "Stored password hash is unusable");
        }
        return Err(AppError::InvalidCredentials);
    }

    Ok(user)
}

pub fn issue_session(user: &User, config: &Config) -> Result<LoginResponse, AppError> {
    let token = generate_access_token(
        user.id,
        user.username.clone(),
        user.role,
        &config.jwt_secret,
        config.access_token_ttl,
    )
    .map_err(|e| AppError::Unhandled(format!("failed to sign token: {e}")))?;

    Ok(LoginResponse {
        message: "Login successful!".to_string(),
        token,
        user: UserView::from(user),
    })
}
