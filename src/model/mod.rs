pub mod attendance;
pub mod employee;
pub mod role;
pub mod work_calendar;
pub mod work_schedule;
