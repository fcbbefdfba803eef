use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

use crate::error::AppError;

/// Classification of a day. `Holiday` is only ever read, never written by a
/// client-facing path.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
pub enum AttendanceStatus {
    Present,
    Absent,
    Holiday,
}

impl TryFrom<String> for AttendanceStatus {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow, ToSchema)]
pub struct AttendanceRecord {
    pub record_id: u64,
    pub user_id: u64,
    #[schema(example = "2024-01-01", value_type = String, format = "date")]
    pub attendance_date: NaiveDate,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub check_in_time: Option<NaiveDateTime>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub check_out_time: Option<NaiveDateTime>,
    #[sqlx(try_from = "String")]
    pub status: AttendanceStatus,
}

/// Ledger row joined with the owner's display fields (admin view).
#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct AttendanceWithUser {
    pub record_id: u64,
    pub user_id: u64,
    pub full_name: String,
    pub username: String,
    #[schema(example = "2024-01-01", value_type = String, format = "date")]
    pub attendance_date: NaiveDate,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub check_in_time: Option<NaiveDateTime>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub check_out_time: Option<NaiveDateTime>,
    #[sqlx(try_from = "String")]
    pub status: AttendanceStatus,
}

/// What a user may ask for through the manual marking path.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum MarkStatus {
    Present,
    Absent,
    Clear,
}

impl MarkStatus {
    pub fn parse(value: &str) -> Result<Self, AppError> {
        match value {
            "Present" => Ok(MarkStatus::Present),
            "Absent" => Ok(MarkStatus::Absent),
            "Clear" => Ok(MarkStatus::Clear),
            "Holiday" => Err(AppError::Forbidden(
                "Marking Holiday status is not permitted via this endpoint.".to_string(),
            )),
            other => Err(AppError::InvalidInput(format!(
                "Invalid status '{other}'. Expected Present, Absent or Clear."
            ))),
        }
    }
}

/// Today's record as seen by its owner; all fields null when unmarked.
#[derive(Debug, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TodayStatus {
    #[schema(value_type = Option<String>, format = "date-time")]
    pub check_in_time: Option<NaiveDateTime>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub check_out_time: Option<NaiveDateTime>,
    pub status: Option<AttendanceStatus>,
}

impl From<Option<AttendanceRecord>> for TodayStatus {
    fn from(record: Option<AttendanceRecord>) -> Self {
        match record {
            Some(r) => Self {
                check_in_time: r.check_in_time,
                check_out_time: r.check_out_time,
                status: Some(r.status),
            },
            None => Self::default(),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSummary {
    pub days_with_activity: u64,
    pub days_present: u64,
    pub days_absent: u64,
    pub days_holiday: u64,
}
