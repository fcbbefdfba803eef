use crate::{
    auth::auth::AuthUser,
    error::AppError,
    model::attendance::{AttendanceRecord, AttendanceSummary, MarkStatus, TodayStatus},
    services::attendance as ledger,
};
use actix_web::{HttpResponse, web};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct MarkStatusReq {
    #[schema(example = "2024-01-01", format = "date", value_type = String)]
    pub date: Option<String>,
    /// Present, Absent or Clear
    #[schema(example = "Absent")]
    pub status: Option<String>,
}

impl MarkStatusReq {
    fn parse(&self) -> Result<(NaiveDate, MarkStatus), AppError> {
        let (Some(date), Some(status)) = (
            self.date.as_deref().filter(|d| !d.is_empty()),
            self.status.as_deref().filter(|s| !s.is_empty()),
        ) else {
            return Err(AppError::InvalidInput(
                "Date and status are required.".to_string(),
            ));
        };

        let status = MarkStatus::parse(status)?;
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| {
            AppError::InvalidInput(format!("Invalid date '{date}', expected YYYY-MM-DD."))
        })?;

        Ok((date, status))
    }
}

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/check-in",
    responses(
        (status = 201, description = "Checked in successfully", body = Object, example = json!({
            "message": "Checked in successfully",
            "recordId": 12,
            "checkInTime": "2024-01-01T09:00:00"
        })),
        (status = 400, description = "Already checked in today", body = Object, example = json!({
            "message": "You have already checked in for today."
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_in(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, AppError> {
    let checked_in = ledger::check_in(pool.get_ref(), auth.user_id, Utc::now().naive_utc()).await?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Checked in successfully",
        "recordId": checked_in.record_id,
        "checkInTime": checked_in.check_in_time,
    })))
}

/// Check-out endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/check-out",
    responses(
        (status = 200, description = "Checked out successfully", body = Object, example = json!({
            "message": "Checked out successfully",
            "checkOutTime": "2024-01-01T17:00:00"
        })),
        (status = 400, description = "No active check-in found for today", body = Object, example = json!({
            "message": "No active check-in found for today to check out, or already checked out."
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_out(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, AppError> {
    let check_out_time =
        ledger::check_out(pool.get_ref(), auth.user_id, Utc::now().naive_utc()).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Checked out successfully",
        "checkOutTime": check_out_time,
    })))
}

/// Today's status
#[utoipa::path(
    get,
    path = "/api/attendance/status/today",
    responses(
        (status = 200, description = "Today's record, all fields null when unmarked", body = TodayStatus),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn status_today(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, AppError> {
    let today = Utc::now().date_naive();
    let status = ledger::status_today(pool.get_ref(), auth.user_id, today).await?;
    Ok(HttpResponse::Ok().json(status))
}

/// Own attendance records, newest date first
#[utoipa::path(
    get,
    path = "/api/attendance/my-records",
    responses(
        (status = 200, description = "Caller's records", body = Vec<AttendanceRecord>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn my_records(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, AppError> {
    let records = ledger::records_for_user(pool.get_ref(), auth.user_id).await?;
    Ok(HttpResponse::Ok().json(records))
}

/// Own attendance summary
#[utoipa::path(
    get,
    path = "/api/attendance/my-summary",
    responses(
        (status = 200, description = "Aggregate counts", body = AttendanceSummary),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn my_summary(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, AppError> {
    let summary = ledger::summary_for_user(pool.get_ref(), auth.user_id).await?;
    Ok(HttpResponse::Ok().json(summary))
}

/// Manually mark or clear a day
#[utoipa::path(
    post,
    path = "/api/attendance/mark-status",
    request_body = MarkStatusReq,
    responses(
        (status = 200, description = "Existing entry updated or cleared", body = Object, example = json!({
            "message": "Attendance for 2024-01-01 marked as Present."
        })),
        (status = 201, description = "New entry created", body = Object, example = json!({
            "message": "Attendance for 2024-01-01 marked as Absent."
        })),
        (status = 400, description = "Missing, invalid or future input"),
        (status = 403, description = "Holiday cannot be marked", body = Object, example = json!({
            "message": "Marking Holiday status is not permitted via this endpoint."
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn mark_status(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    body: web::Json<MarkStatusReq>,
) -> Result<HttpResponse, AppError> {
    let (date, status) = body.parse()?;
    let today = Utc::now().date_naive();
    let outcome = ledger::mark_status(pool.get_ref(), auth.user_id, date, status, today).await?;

    let body = json!({ "message": outcome.message() });
    if outcome.created() {
        Ok(HttpResponse::Created().json(body))
    } else {
        Ok(HttpResponse::Ok().json(body))
    }
}
