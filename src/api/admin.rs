use crate::{
    auth::{auth::AuthUser, password::hash_password},
    error::AppError,
    model::{attendance::AttendanceWithUser, user::UserPublic},
    services::{
        attendance as ledger,
        users::{self, CreateEmployee, UpdateEmployee},
    },
};
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{info, instrument};
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceFilter {
    /// Restrict to one user; omitted, empty or `all` lists everyone
    pub user_id: Option<String>,
}

/// Create Employee
#[utoipa::path(
    post,
    path = "/api/admin/users",
    request_body = CreateEmployee,
    responses(
        (status = 201, description = "Employee created successfully", body = Object, example = json!({
            "message": "Employee created successfully",
            "userId": 5
        })),
        (status = 400, description = "Missing fields or password too short", body = Object, example = json!({
            "message": "Password must be at least 6 characters long."
        })),
        (status = 409, description = "Username already exists", body = Object, example = json!({
            "message": "Username 'alice' already exists."
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Admin",
    security(
        ("bearer_auth" = [])
    )
)]
#[instrument(name = "admin_create_employee", skip_all, fields(admin_id = auth.user_id))]
pub async fn create_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateEmployee>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;
    let employee = payload.validate()?;

    let hashed = hash_password(&employee.password)
        .map_err(|e| AppError::Unhandled(format!("failed to hash password: {e}")))?;

    let user_id = users::insert_user(
        pool.get_ref(),
        &employee.username,
        &hashed,
        &employee.full_name,
        employee.role,
    )
    .await?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Employee created successfully",
        "userId": user_id
    })))
}

/// List Employees
#[utoipa::path(
    get,
    path = "/api/admin/users",
    responses(
        (status = 200, description = "All users ordered by full name", body = Vec<UserPublic>)
    ),
    tag = "Admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_employees(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;

    let users = users::list_users(pool.get_ref()).await?;
    Ok(HttpResponse::Ok().json(users))
}

/// Update Employee
#[utoipa::path(
    put,
    path = "/api/admin/users/{user_id}",
    params(
        ("user_id", Path, description = "User ID")
    ),
    request_body = UpdateEmployee,
    responses(
        (status = 200, description = "Employee updated successfully", body = Object, example = json!({
            "message": "User Alice A (ID: 5) updated successfully."
        })),
        (status = 400, description = "Missing fields"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Username already exists")
    ),
    tag = "Admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<UpdateEmployee>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;
    let user_id = path.into_inner();
    let changes = body.validate()?;

    users::update_user(pool.get_ref(), user_id, &changes).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": format!("User {} (ID: {}) updated successfully.", changes.full_name, user_id)
    })))
}

/// Delete Employee
#[utoipa::path(
    delete,
    path = "/api/admin/users/{user_id}",
    params(
        ("user_id", Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Successfully deleted", body = Object, example = json!({
            "message": "User with ID 5 and all their attendance records have been deleted."
        })),
        (status = 400, description = "Admins cannot delete their own account"),
        (status = 404, description = "User not found", body = Object, example = json!({
            "message": "User with ID 5 not found."
        }))
    ),
    tag = "Admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;
    let user_id = path.into_inner();
    users::ensure_not_self(user_id, auth.user_id)?;

    users::delete_user(pool.get_ref(), user_id).await?;
    info!(user_id, admin_id = auth.user_id, "Employee deleted with attendance history");

    Ok(HttpResponse::Ok().json(json!({
        "message": format!("User with ID {user_id} and all their attendance records have been deleted.")
    })))
}

/// All attendance records
#[utoipa::path(
    get,
    path = "/api/admin/attendance/all",
    params(AttendanceFilter),
    responses(
        (status = 200, description = "Ledger rows with user display fields", body = Vec<AttendanceWithUser>),
        (status = 400, description = "Invalid userId filter")
    ),
    tag = "Admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn all_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<AttendanceFilter>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;
    let user_id = ledger::parse_user_filter(query.user_id.as_deref())?;

    let records = ledger::all_records(pool.get_ref(), user_id).await?;
    Ok(HttpResponse::Ok().json(records))
}
