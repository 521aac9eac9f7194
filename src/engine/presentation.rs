use chrono::Duration;

use super::classifier::AttendanceVerdict;
use super::status::AttendanceCode;

/// Turns verdict values into text for API consumers.
pub trait PresentationFormatter {
    fn status(&self, verdict: &AttendanceVerdict) -> String;
    fn duration(&self, duration: Option<Duration>) -> String;
    fn minutes(&self, minutes: Option<i64>) -> String;
    fn code_label(&self, code: AttendanceCode) -> &'static str;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFormatter;

impl PresentationFormatter for DefaultFormatter {
    fn status(&self, verdict: &AttendanceVerdict) -> String {
        verdict.display_status().to_string()
    }

    fn duration(&self, duration: Option<Duration>) -> String {
        match duration {
            Some(d) => {
                let total = d.num_minutes();
                format!("{}h {:02}m", total / 60, total % 60)
            }
            None => "-".to_string(),
        }
    }

    fn minutes(&self, minutes: Option<i64>) -> String {
        minutes.map(|m| format!("{m}m")).unwrap_or_default()
    }

    fn code_label(&self, code: AttendanceCode) -> &'static str {
        match code {
            AttendanceCode::Present => "Present",
            AttendanceCode::Absent => "Absent",
            AttendanceCode::Late => "Late",
            AttendanceCode::EarlyDeparture => "Early Departure",
            AttendanceCode::Overtime => "Overtime",
            AttendanceCode::EarlyArrival => "Early Arrival",
            AttendanceCode::LateAndEarlyDeparture => "Late & Early Departure",
            AttendanceCode::Working => "Working",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_durations_and_minutes() {
        let f = DefaultFormatter;
        assert_eq!(f.duration(Some(Duration::minutes(460))), "7h 40m");
        assert_eq!(f.duration(Some(Duration::minutes(65))), "1h 05m");
        assert_eq!(f.duration(None), "-");
        assert_eq!(f.minutes(Some(36)), "36m");
        assert_eq!(f.minutes(None), "");
        assert_eq!(f.code_label(AttendanceCode::LateAndEarlyDeparture), "Late & Early Departure");
    }
}
