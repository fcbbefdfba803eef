use crate::{
    auth::service::{issue_session, verify_credentials},
    config::Config,
    error::AppError,
    models::{LoginReqDto, LoginResponse},
    services::users,
};
use actix_web::{HttpResponse, web};
use sqlx::MySqlPool;
use tracing::{debug, info, instrument};

/// Login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Username or password missing", body = Object, example = json!({
            "message": "Username and password are required."
        })),
        (status = 401, description = "Invalid credentials", body = Object, example = json!({
            "message": "Invalid username or password."
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(pool, config, user),
    fields(username = %user.username)
)]
pub async fn login(
    user: web::Json<LoginReqDto>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    info!("Login request received");

    if user.username.trim().is_empty() || user.password.is_empty() {
        info!("Validation failed: empty username or password");
        return Err(AppError::InvalidInput(
            "Username and password are required.".to_string(),
        ));
    }

    debug!("Fetching user from database");
    let db_user = users::find_by_username(pool.get_ref(), &user.username).await?;

    let db_user = verify_credentials(db_user, &user.password)?;
    let session = issue_session(&db_user, &config)?;

    info!(user_id = db_user.id, role = %db_user.role, "Login successful");

    Ok(HttpResponse::Ok().json(session))
}
