use crate::api::attendance::{
    AttendanceListResponse, AttendanceQuery, AttendanceResponse, ClassifyRequest,
    ClassifyResponse, EvaluateRequest, EvaluationResponse, PunchResponse, RecalculateRequest,
    VerdictResponse,
};
use crate::api::calendar::{CalendarEntryResponse, CalendarQuery, CreateCalendarEntry};
use crate::api::employee::{CreateEmployee, UpdateEmployeeSchedule};
use crate::api::schedule::{ScheduleRequest, ScheduleResponse};
use crate::engine::{AttendanceCode, CalendarEntryType, DayKind};
use crate::model::employee::Employee;
use crate::model::work_schedule::ScheduleRules;
use crate::service::attendance::{RecalculationFailure, RecalculationSummary};
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
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
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRM Attendance API",
        version = "1.0.0",
        description = r#"
## Attendance Classification

Turns daily check-in/check-out punches into attendance verdicts using each
employee's work schedule and the organisation's work calendar.

### 🔹 Key Features
- **Attendance**
  - Check-in and check-out; every punch is classified straight away
  - Classification preview without storing anything
  - Single-day evaluation and bounded batch recalculation
- **Schedules**
  - Fixed (start/end, night shifts allowed) or flexible (total hours)
  - Per-weekday working days and a flex allowance in minutes
- **Work Calendar**
  - Holidays, non-working days and short days, optionally recurring every year
- **Employees**
  - Schedule assignment and employee-level flexible hours

### 🔤 Attendance Codes
`P` present, `A` absent, `L` late, `E` early departure, `O` overtime,
`EA` early arrival, `LE` late and early departure, `W` working (checked in).

### 🔐 Security
Every endpoint is protected using **JWT Bearer authentication**.
Schedules, calendar and evaluation are restricted to **HR**, **Admin** or
**System** roles; employees only see their own attendance.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::classify_preview,
        crate::api::attendance::evaluate,
        crate::api::attendance::recalculate_range,
        crate::api::attendance::list_attendance,
        crate::api::attendance::get_attendance,

        crate::api::schedule::create_schedule,
        crate::api::schedule::list_schedules,
        crate::api::schedule::get_schedule,
        crate::api::schedule::update_schedule,
        crate::api::schedule::delete_schedule,

        crate::api::calendar::create_entry,
        crate::api::calendar::list_entries,
        crate::api::calendar::delete_entry,

        crate::api::employee::create_employee,
        crate::api::employee::get_employee,
        crate::api::employee::update_employee_schedule
    ),
    components(
        schemas(
            AttendanceCode,
            DayKind,
            CalendarEntryType,
            VerdictResponse,
            AttendanceResponse,
            AttendanceListResponse,
            AttendanceQuery,
            PunchResponse,
            ClassifyRequest,
            ClassifyResponse,
            EvaluateRequest,
            EvaluationResponse,
            RecalculateRequest,
            RecalculationSummary,
            RecalculationFailure,
            ScheduleRules,
            ScheduleRequest,
            ScheduleResponse,
            CreateCalendarEntry,
            CalendarQuery,
            CalendarEntryResponse,
            CreateEmployee,
            UpdateEmployeeSchedule,
            Employee
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Attendance", description = "Punches, classification and recalculation APIs"),
        (name = "Schedule", description = "Work schedule management APIs"),
        (name = "Calendar", description = "Work calendar management APIs"),
        (name = "Employee", description = "Employee schedule settings APIs"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;

        for path in [
            "/api/v1/attendance/check-in",
            "/api/v1/attendance/classify",
            "/api/v1/attendance/recalculate",
            "/api/v1/schedule/{schedule_id}",
            "/api/v1/calendar",
            "/api/v1/employee/{employee_id}/schedule",
        ] {
            assert!(paths.contains_key(path), "missing {path}");
        }
    }
}
