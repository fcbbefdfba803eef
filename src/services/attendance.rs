//! Attendance ledger and the per-day state machine.
//!
//! Every write path keeps at most one row per (user, date); the unique index
//! `uq_attendance_user_date` backs that up when two requests race.
//!
//! ```text
//!   Unmarked --check_in--> CheckedIn --check_out--> Completed
//!      |                                               |
//!      +--mark Present--> MarkedPresent                |
//!      +--mark Absent---> Absent <----mark Absent------+
//!   any marked state --mark Clear--> Unmarked
//! ```

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveDateTime};
use sqlx::MySqlPool;
use tracing::{debug, info, warn};

use crate::{
    error::AppError,
    model::attendance::{
        AttendanceRecord, AttendanceStatus, AttendanceSummary, AttendanceWithUser, MarkStatus,
        TodayStatus,
    },
    utils::db_utils::is_unique_violation,
};

const RECORD_COLUMNS: &str =
    "record_id, user_id, attendance_date, check_in_time, check_out_time, status";

/// State of one user's day.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DayState {
    Unmarked,
    CheckedIn,
    Completed,
    /// `Present` set by hand, no timestamps.
    MarkedPresent,
    Absent,
    Holiday,
}

impl DayState {
    pub fn of(record: Option<&AttendanceRecord>) -> Self {
        let Some(record) = record else {
            return DayState::Unmarked;
        };

        match (record.status, record.check_in_time, record.check_out_time) {
            (AttendanceStatus::Holiday, _, _) => DayState::Holiday,
            (AttendanceStatus::Absent, _, _) => DayState::Absent,
            (AttendanceStatus::Present, Some(_), None) => DayState::CheckedIn,
            (AttendanceStatus::Present, Some(_), Some(_)) => DayState::Completed,
            (AttendanceStatus::Present, None, _) => DayState::MarkedPresent,
        }
    }

    /// Only an untouched day can be checked into.
    pub fn check_in(self) -> Result<(), AppError> {
        match self {
            DayState::Unmarked => Ok(()),
            DayState::CheckedIn
            | DayState::Completed
            | DayState::MarkedPresent
            | DayState::Absent
            | DayState::Holiday => Err(AppError::AlreadyCheckedIn),
        }
    }

    pub fn check_out(self) -> Result<(), AppError> {
        match self {
            DayState::CheckedIn => Ok(()),
            DayState::Unmarked
            | DayState::Completed
            | DayState::MarkedPresent
            | DayState::Absent
            | DayState::Holiday => Err(AppError::NoActiveCheckIn),
        }
    }
}

/// The single statement a manual mark turns into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkPlan {
    Insert(AttendanceStatus),
    Update {
        record_id: u64,
        status: AttendanceStatus,
        clear_times: bool,
    },
    Delete(u64),
    Noop,
}

pub fn plan_mark(existing: Option<&AttendanceRecord>, mark: MarkStatus) -> MarkPlan {
    match (existing, mark) {
        (Some(record), MarkStatus::Clear) => MarkPlan::Delete(record.record_id),
        (None, MarkStatus::Clear) => MarkPlan::Noop,
        // Absent demotes a worked day: its timestamps go.
        (Some(record), MarkStatus::Absent) => MarkPlan::Update {
            record_id: record.record_id,
            status: AttendanceStatus::Absent,
            clear_times: true,
        },
        (Some(record), MarkStatus::Present) => MarkPlan::Update {
            record_id: record.record_id,
            status: AttendanceStatus::Present,
            clear_times: false,
        },
        (None, MarkStatus::Absent) => MarkPlan::Insert(AttendanceStatus::Absent),
        (None, MarkStatus::Present) => MarkPlan::Insert(AttendanceStatus::Present),
    }
}

/// Marks are for today or the past.
pub fn validate_mark_date(date: NaiveDate, today: NaiveDate) -> Result<(), AppError> {
    if date > today {
        return Err(AppError::InvalidInput(format!(
            "Cannot mark attendance for a future date ({date})."
        )));
    }
    Ok(())
}

pub fn summarize(records: &[AttendanceRecord]) -> AttendanceSummary {
    let dates: BTreeSet<NaiveDate> = records.iter().map(|r| r.attendance_date).collect();
    let count = |status: AttendanceStatus| records.iter().filter(|r| r.status == status).count() as u64;

    AttendanceSummary {
        days_with_activity: dates.len() as u64,
        days_present: count(AttendanceStatus::Present),
        days_absent: count(AttendanceStatus::Absent),
        days_holiday: count(AttendanceStatus::Holiday),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckIn {
    pub record_id: u64,
    pub check_in_time: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkOutcome {
    Cleared(NaiveDate),
    NothingToClear(NaiveDate),
    Updated(NaiveDate, AttendanceStatus),
    Inserted(NaiveDate, AttendanceStatus),
}

impl MarkOutcome {
    pub fn message(&self) -> String {
        match self {
            MarkOutcome::Cleared(date) => format!("Attendance entry for {date} cleared."),
            MarkOutcome::NothingToClear(date) => format!("No entry found for {date} to clear."),
            MarkOutcome::Updated(date, status) | MarkOutcome::Inserted(date, status) => {
                format!("Attendance for {date} marked as {status}.")
            }
        }
    }

    pub fn created(&self) -> bool {
        matches!(self, MarkOutcome::Inserted(..))
    }
}

/// The record for `date`, latest check-in first if more than one exists.
pub async fn find_for_date(
    pool: &MySqlPool,
    user_id: u64,
    date: NaiveDate,
) -> Result<Option<AttendanceRecord>, AppError> {
    let sql = format!(
        "SELECT {RECORD_COLUMNS} FROM attendance_records \
         WHERE user_id = ? AND attendance_date = ? \
         ORDER BY check_in_time DESC LIMIT 1"
    );
    let record = sqlx::query_as::<_, AttendanceRecord>(&sql)
        .bind(user_id)
        .bind(date)
        .fetch_optional(pool)
        .await?;

    Ok(record)
}

pub async fn check_in(
    pool: &MySqlPool,
    user_id: u64,
    now: NaiveDateTime,
) -> Result<CheckIn, AppError> {
    let today = now.date();
    let existing = find_for_date(pool, user_id, today).await?;
    DayState::of(existing.as_ref()).check_in()?;

    let result = sqlx::query(
        r#"
        INSERT INTO attendance_records (user_id, attendance_date, check_in_time, status)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(today)
    .bind(now)
    .bind(AttendanceStatus::Present.to_string())
    .execute(pool)
    .await
    .map_err(|e| {
        // lost a race with a concurrent request for the same day
        if is_unique_violation(&e) {
            AppError::AlreadyCheckedIn
        } else {
            AppError::from(e)
        }
    })?;

    let record_id = result.last_insert_id();
    info!(user_id, record_id, %today, "Checked in");

    Ok(CheckIn {
        record_id,
        check_in_time: now,
    })
}

pub async fn check_out(
    pool: &MySqlPool,
    user_id: u64,
    now: NaiveDateTime,
) -> Result<NaiveDateTime, AppError> {
    let today = now.date();
    let existing = find_for_date(pool, user_id, today).await?;
    DayState::of(existing.as_ref()).check_out()?;
    let Some(record) = existing else {
        return Err(AppError::NoActiveCheckIn);
    };

    let result = sqlx::query(
        r#"
        UPDATE attendance_records
        SET check_out_time = ?
        WHERE record_id = ?
        AND check_out_time IS NULL
        AND check_in_time IS NOT NULL
        "#,
    )
    .bind(now)
    .bind(record.record_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NoActiveCheckIn);
    }

    info!(user_id, record_id = record.record_id, %today, "Checked out");
    Ok(now)
}

pub async fn mark_status(
    pool: &MySqlPool,
    user_id: u64,
    date: NaiveDate,
    mark: MarkStatus,
    today: NaiveDate,
) -> Result<MarkOutcome, AppError> {
    validate_mark_date(date, today)?;

    // A second pass only happens when an insert lost a race; the row that
    // won is then updated instead.
    for attempt in 0..2 {
        let existing = find_for_date(pool, user_id, date).await?;
        let plan = plan_mark(existing.as_ref(), mark);
        debug!(user_id, %date, ?plan, attempt, "Applying mark");

        match apply_plan(pool, user_id, date, &plan).await {
            Ok(outcome) => {
                info!(user_id, %date, ?outcome, "Attendance marked");
                return Ok(outcome);
            }
            Err(e) if attempt == 0 && is_unique_violation(&e) => {
                warn!(user_id, %date, "Concurrent insert for the same day, retrying as update");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(AppError::Unhandled(format!(
        "mark for user {user_id} on {date} kept conflicting"
    )))
}

async fn apply_plan(
    pool: &MySqlPool,
    user_id: u64,
    date: NaiveDate,
    plan: &MarkPlan,
) -> Result<MarkOutcome, sqlx::Error> {
    let outcome = match *plan {
        MarkPlan::Noop => MarkOutcome::NothingToClear(date),
        MarkPlan::Delete(record_id) => {
            sqlx::query("DELETE FROM attendance_records WHERE record_id = ?")
                .bind(record_id)
                .execute(pool)
                .await?;
            MarkOutcome::Cleared(date)
        }
        MarkPlan::Update {
            record_id,
            status,
            clear_times: true,
        } => {
            sqlx::query(
                "UPDATE attendance_records \
                 SET status = ?, check_in_time = NULL, check_out_time = NULL \
                 WHERE record_id = ?",
            )
            .bind(status.to_string())
            .bind(record_id)
            .execute(pool)
            .await?;
            MarkOutcome::Updated(date, status)
        }
        MarkPlan::Update {
            record_id,
            status,
            clear_times: false,
        } => {
            sqlx::query("UPDATE attendance_records SET status = ? WHERE record_id = ?")
                .bind(status.to_string())
                .bind(record_id)
                .execute(pool)
                .await?;
            MarkOutcome::Updated(date, status)
        }
        MarkPlan::Insert(status) => {
            sqlx::query(
                r#"
                INSERT INTO attendance_records
                    (user_id, attendance_date, status, check_in_time, check_out_time)
                VALUES (?, ?, ?, NULL, NULL)
                "#,
            )
            .bind(user_id)
            .bind(date)
            .bind(status.to_string())
            .execute(pool)
            .await?;
            MarkOutcome::Inserted(date, status)
        }
    };

    Ok(outcome)
}

pub async fn status_today(
    pool: &MySqlPool,
    user_id: u64,
    today: NaiveDate,
) -> Result<TodayStatus, AppError> {
    Ok(TodayStatus::from(find_for_date(pool, user_id, today).await?))
}

/// Newest date first.
pub async fn records_for_user(
    pool: &MySqlPool,
    user_id: u64,
) -> Result<Vec<AttendanceRecord>, AppError> {
    let sql = format!(
        "SELECT {RECORD_COLUMNS} FROM attendance_records \
         WHERE user_id = ? ORDER BY attendance_date DESC"
    );
    let records = sqlx::query_as::<_, AttendanceRecord>(&sql)
        .bind(user_id)
        .fetch_all(pool)
        .await?;

    Ok(records)
}

pub async fn summary_for_user(
    pool: &MySqlPool,
    user_id: u64,
) -> Result<AttendanceSummary, AppError> {
    let records = records_for_user(pool, user_id).await?;
    Ok(summarize(&records))
}

/// Parses the admin `userId` filter; absent, blank and `all` mean everyone.
pub fn parse_user_filter(raw: Option<&str>) -> Result<Option<u64>, AppError> {
    match raw.map(str::trim) {
        None | Some("") | Some("all") => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| AppError::InvalidInput(format!("Invalid userId filter '{value}'."))),
    }
}

pub async fn all_records(
    pool: &MySqlPool,
    user_id: Option<u64>,
) -> Result<Vec<AttendanceWithUser>, AppError> {
    let mut sql = String::from(
        r#"
        SELECT ar.record_id, ar.user_id, u.full_name, u.username, ar.attendance_date,
               ar.check_in_time, ar.check_out_time, ar.status
        FROM attendance_records ar
        JOIN users u ON ar.user_id = u.id
        "#,
    );
    if user_id.is_some() {
        sql.push_str(" WHERE ar.user_id = ?");
    }
    sql.push_str(" ORDER BY ar.attendance_date DESC, ar.check_in_time DESC, u.full_name ASC");

    let mut query = sqlx::query_as::<_, AttendanceWithUser>(&sql);
    if let Some(id) = user_id {
        query = query.bind(id);
    }

    let records = query.fetch_all(pool).await?;
    debug!(count = records.len(), ?user_id, "Fetched ledger");
    Ok(records)
}
