//! Attendance classification engine.
//!
//! Everything in here is pure: no I/O, no logging, no shared state.

pub mod calendar;
pub mod classifier;
pub mod error;
pub mod presentation;
pub mod schedule;
pub mod status;

pub use calendar::{CalendarEntryType, CalendarSnapshot, DayKind, HolidayCalendar};
pub use classifier::{AttendanceVerdict, ClassificationInput, EvaluationMode, classify};
pub use error::EngineError;
pub use presentation::{DefaultFormatter, PresentationFormatter};
pub use schedule::{
    ScheduleMode, SchedulePolicy, WorkingDays, adjusted_expected_hours, is_working_day,
};
pub use status::AttendanceCode;
