//! Shared reads and writes against MySQL.

pub mod attendance;
pub mod calendar;
pub mod employee;
pub mod schedule;
