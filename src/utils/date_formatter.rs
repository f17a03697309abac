//! Time-axis label formatting.

use chrono::{DateTime, Utc};

use crate::data_types::TimeUnit;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmartDateFormat {
    Year,          // 2024
    MonthYear,     // Jan 2024
    DayMonth,      // 12 Jan
    HourMin,       // 10:30
    HourMinSec,    // 10:30:15
    SecondsMillis, // 15.250
}

/// Picks the coarsest format that still tells neighbouring ticks apart
/// for a visible range of `visible_range_sec` seconds.
pub fn determine_date_format(visible_range_sec: f64) -> SmartDateFormat {
    const MINUTE: f64 = 60.0;
    const HOUR: f64 = 3600.0;
    const DAY: f64 = 24.0 * HOUR;
    const MONTH: f64 = 30.0 * DAY;
    const YEAR: f64 = 365.0 * DAY;

    match visible_range_sec {
        r if r > YEAR * 2.0 => SmartDateFormat::Year,
        r if r > MONTH * 2.0 => SmartDateFormat::MonthYear,
        r if r > DAY * 1.5 => SmartDateFormat::DayMonth,
        r if r > MINUTE * 5.0 => SmartDateFormat::HourMin,
        r if r > 5.0 => SmartDateFormat::HourMinSec,
        _ => SmartDateFormat::SecondsMillis,
    }
}

/// Formats a UTC timestamp expressed in `unit`. Out-of-range values fall back to plain numbers.
pub fn format_timestamp(value: f64, format: SmartDateFormat, unit: TimeUnit) -> String {
    let seconds = value / unit.per_second();
    let whole = seconds.floor();
    let nanos = ((seconds - whole) * 1e9).round().clamp(0.0, 999_999_999.0) as u32;

    let Some(dt) = DateTime::<Utc>::from_timestamp(whole as i64, nanos) else {
        return format!("{:.2}", value);
    };

    match format {
        SmartDateFormat::Year => dt.format("%Y").to_string(),
        SmartDateFormat::MonthYear => dt.format("%b %Y").to_string(),
        SmartDateFormat::DayMonth => dt.format("%d %b").to_string(),
        SmartDateFormat::HourMin => dt.format("%H:%M").to_string(),
        SmartDateFormat::HourMinSec => dt.format("%H:%M:%S").to_string(),
        SmartDateFormat::SecondsMillis => dt.format("%S%.3f").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_follows_range() {
        assert_eq!(determine_date_format(3.0 * 365.0 * 86_400.0), SmartDateFormat::Year);
        assert_eq!(determine_date_format(3_600.0), SmartDateFormat::HourMin);
        assert_eq!(determine_date_format(1.0), SmartDateFormat::SecondsMillis);
    }

    #[test]
    fn milliseconds_are_scaled() {
        // 2024-01-12T10:30:15Z
        let ms = 1_705_055_415_000.0;
        assert_eq!(
            format_timestamp(ms, SmartDateFormat::HourMinSec, TimeUnit::Milliseconds),
            "10:30:15"
        );
        assert_eq!(
            format_timestamp(ms, SmartDateFormat::DayMonth, TimeUnit::Milliseconds),
            "12 Jan"
        );
    }
}
