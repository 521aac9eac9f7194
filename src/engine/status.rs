use derive_more::Display;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, EnumIter, EnumString};
use utoipa::ToSchema;

use super::classifier::AttendanceVerdict;

/// Attendance at or below this many hours shows as a half day when late or leaving early.
pub const HALF_DAY_MAX_HOURS: i64 = 4;

/// Short persisted classification of a day.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    AsRefStr,
    EnumString,
    EnumIter,
    ToSchema,
)]
pub enum AttendanceCode {
    #[serde(rename = "P")]
    #[strum(serialize = "P")]
    Present,
    #[serde(rename = "A")]
    #[strum(serialize = "A")]
    Absent,
    #[serde(rename = "L")]
    #[strum(serialize = "L")]
    Late,
    #[serde(rename = "E")]
    #[strum(serialize = "E")]
    EarlyDeparture,
    #[serde(rename = "O")]
    #[strum(serialize = "O")]
    Overtime,
    #[serde(rename = "EA")]
    #[strum(serialize = "EA")]
    EarlyArrival,
    #[serde(rename = "LE")]
    #[strum(serialize = "LE")]
    LateAndEarlyDeparture,
    #[serde(rename = "W")]
    #[strum(serialize = "W")]
    Working,
}

/// Human readable status, derived from a verdict and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum DisplayStatus {
    #[display(fmt = "Late & Left Early")]
    LateAndLeftEarly,
    #[display(fmt = "Half Day")]
    HalfDay,
    #[display(fmt = "Late")]
    Late,
    #[display(fmt = "Left Early")]
    LeftEarly,
    #[display(fmt = "Early Arrival")]
    EarlyArrival,
    #[display(fmt = "Overtime")]
    Overtime,
    #[display(fmt = "Complete")]
    Complete,
    #[display(fmt = "Checked In")]
    CheckedIn,
    #[display(fmt = "Not Started")]
    NotStarted,
}

/// Status text for a verdict. A short late or early day reads as a half day
/// whichever flag caused it; the verdict itself is left untouched.
pub fn display_status(verdict: &AttendanceVerdict) -> DisplayStatus {
    let short_day_worked = verdict
        .work_duration
        .map(|d| d.num_seconds() <= HALF_DAY_MAX_HOURS * 3600)
        .unwrap_or(false);

    if (verdict.is_late_arrival || verdict.is_early_departure) && short_day_worked {
        DisplayStatus::HalfDay
    } else if verdict.is_late_arrival && verdict.is_early_departure {
        DisplayStatus::LateAndLeftEarly
    } else if verdict.is_late_arrival {
        DisplayStatus::Late
    } else if verdict.is_early_departure {
        DisplayStatus::LeftEarly
    } else if verdict.is_early_arrival {
        DisplayStatus::EarlyArrival
    } else if verdict.is_overtime {
        DisplayStatus::Overtime
    } else if verdict.is_complete {
        DisplayStatus::Complete
    } else if verdict.attendance_code == AttendanceCode::Working {
        DisplayStatus::CheckedIn
    } else {
        DisplayStatus::NotStarted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn codes_parse_back_from_their_short_form() {
        for code in AttendanceCode::iter() {
            assert_eq!(AttendanceCode::from_str(code.as_ref()).unwrap(), code);
        }
        assert_eq!(AttendanceCode::LateAndEarlyDeparture.as_ref(), "LE");
        assert!(AttendanceCode::from_str("X").is_err());
    }

    #[test]
    fn codes_serialize_as_short_form() {
        let json = serde_json::to_string(&AttendanceCode::EarlyArrival).unwrap();
        assert_eq!(json, "\"EA\"");
    }

    #[test]
    fn display_text() {
        assert_eq!(DisplayStatus::LateAndLeftEarly.to_string(), "Late & Left Early");
        assert_eq!(DisplayStatus::NotStarted.to_string(), "Not Started");
    }
}
