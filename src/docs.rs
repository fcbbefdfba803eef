use crate::api::attendance::MarkStatusReq;
use crate::model::attendance::{
    AttendanceRecord, AttendanceStatus, AttendanceSummary, AttendanceWithUser, TodayStatus,
};
use crate::model::role::Role;
use crate::model::user::{UserPublic, UserView};
use crate::models::{LoginReqDto, LoginResponse};
use crate::services::users::{CreateEmployee, UpdateEmployee};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance Tracker API",
        version = "1.0.0",
        description = r#"
## Employee Attendance Tracker

Backend for a single-page attendance app.

### 🔹 Key Features
- **Attendance**
  - Daily check-in and check-out
  - Mark a past day Present or Absent, or clear it
  - Own history and summary counts
- **Admin**
  - Create, update, list and delete employee accounts
  - Browse every attendance record, optionally per employee
- **Profile**
  - Upload a profile picture

### 🔐 Security
Everything except login is protected with a **JWT Bearer** token valid for one hour.
Admin endpoints additionally require the `admin` role.

### 📦 Response Format
- JSON responses; errors are `{"message": "..."}`

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::auth::handlers::login,

        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::status_today,
        crate::api::attendance::my_records,
        crate::api::attendance::my_summary,
        crate::api::attendance::mark_status,

        crate::api::admin::create_employee,
        crate::api::admin::list_employees,
        crate::api::admin::update_employee,
        crate::api::admin::delete_employee,
        crate::api::admin::all_attendance,

        crate::api::profile::update_picture
    ),
    components(
        schemas(
            LoginReqDto,
            LoginResponse,
            UserView,
            UserPublic,
            Role,
            CreateEmployee,
            UpdateEmployee,
            AttendanceStatus,
            AttendanceRecord,
            AttendanceWithUser,
            AttendanceSummary,
            TodayStatus,
            MarkStatusReq
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Login"),
        (name = "Attendance", description = "Own attendance APIs"),
        (name = "Admin", description = "Employee and ledger administration APIs"),
        (name = "Profile", description = "Profile picture APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
