use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "employee_code": "EMP-001",
        "first_name": "John",
        "last_name": "Doe",
        "email": "john.doe@company.com",
        "phone": "+8801712345678",
        "department_id": 10,
        "hire_date": "2024-01-01",
        "status": "active",
        "is_flexible_hours": false,
        "required_work_hours_per_day": 8.0,
        "work_schedule_id": 2
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "EMP-001")]
    pub employee_code: String,

    #[schema(example = "John")]
    pub first_name: String,

    #[schema(example = "Doe")]
    pub last_name: String,

    #[schema(example = "john.doe@company.com")]
    pub email: String,

    #[schema(example = "+8801712345678", nullable = true)]
    pub phone: Option<String>,

    #[schema(example = 10)]
    pub department_id: u64,

    #[schema(
        example = "2024-01-01",
        value_type = String,
        format = "date"
    )]
    pub hire_date: NaiveDate,

    #[schema(example = "active")]
    pub status: String,

    /// Judge this employee on total hours only, whatever the schedule says
    #[schema(example = false)]
    pub is_flexible_hours: bool,

    /// Used only when `is_flexible_hours` is set
    #[schema(example = 8.0)]
    pub required_work_hours_per_day: f64,

    /// Falls back to the department default schedule when absent
    #[schema(example = 2, nullable = true)]
    pub work_schedule_id: Option<u64>,
}

impl Employee {
    /// Required daily hours when this employee is judged on total hours only.
    pub fn flexible_hours(&self) -> Option<f64> {
        self.is_flexible_hours
            .then_some(self.required_work_hours_per_day)
    }
}
