//! Display formatting for hour quantities and month keys
//!
//! Rounding here is display-only; aggregate totals are never mutated.

use chrono::NaiveDate;

/// Format fractional hours as `"Hh"` or `"HhMM"`.
///
/// Rounds to the nearest minute before splitting, so `1.999` becomes `"2h"`.
/// Negative and non-finite inputs render as `"0h"`.
pub fn format_hours(hours: f64) -> String {
    if !hours.is_finite() || hours <= 0.0 {
        return "0h".to_string();
    }

    let total_minutes = (hours * 60.0).round() as u64;
    let h = total_minutes / 60;
    let m = total_minutes % 60;

    if m == 0 {
        format!("{}h", h)
    } else {
        format!("{}h{:02}", h, m)
    }
}

/// Format hours with two decimal places (e.g., 2.5 -> "2.50")
pub fn format_hours_decimal(hours: f64) -> String {
    format!("{:.2}", hours)
}

/// Round to two decimal places, the precision the session log stores
pub fn round2(value: f64) -> f64 {
    ((value + f64::EPSILON) * 100.0).round() / 100.0
}

/// Human-readable month label: `"2025-01"` -> `"January 2025"`.
/// Keys that are not `YYYY-MM` are returned unchanged.
pub fn month_label(month_key: &str) -> String {
    NaiveDate::parse_from_str(&format!("{}-01", month_key), "%Y-%m-%d")
        .map(|d| d.format("%B %Y").to_string())
        .unwrap_or_else(|_| month_key.to_string())
}

/// Percentage of `goal` reached, rounded and capped at 100
pub fn progress_percent(total_hours: f64, goal_hours: f64) -> u32 {
    if goal_hours <= 0.0 || !total_hours.is_finite() || total_hours <= 0.0 {
        return 0;
    }
    ((total_hours / goal_hours) * 100.0).round().min(100.0) as u32
}

/// Horizontal text bar scaled against `max` (e.g., "█████░░░░░")
pub fn format_bar(value: f64, max: f64, width: usize) -> String {
    if width == 0 {
        return String::new();
    }
    let ratio = if max > 0.0 {
        (value / max).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let filled = (ratio * width as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========== format_hours() tests ==========

    #[test]
    fn test_format_hours_whole() {
        assert_eq!(format_hours(1.0), "1h");
        assert_eq!(format_hours(12.0), "12h");
    }

    #[test]
    fn test_format_hours_with_minutes() {
        assert_eq!(format_hours(1.75), "1h45");
        assert_eq!(format_hours(0.5), "0h30");
        assert_eq!(format_hours(2.1), "2h06");
    }

    #[test]
    fn test_format_hours_zero() {
        assert_eq!(format_hours(0.0), "0h");
    }

    #[test]
    fn test_format_hours_rounds_through_minute_boundary() {
        assert_eq!(format_hours(1.999), "2h");
        assert_eq!(format_hours(1.992), "2h");
    }

    #[test]
    fn test_format_hours_rounds_not_truncates() {
        // 0.991h = 59.46 min -> 59
        assert_eq!(format_hours(0.991), "0h59");
        // 0.0092h = 0.552 min -> 1
        assert_eq!(format_hours(0.0092), "0h01");
    }

    #[test]
    fn test_format_hours_invalid_input() {
        assert_eq!(format_hours(-1.5), "0h");
        assert_eq!(format_hours(f64::NAN), "0h");
        assert_eq!(format_hours(f64::INFINITY), "0h");
    }

    // ========== other helpers ==========

    #[test]
    fn test_format_hours_decimal() {
        assert_eq!(format_hours_decimal(2.5), "2.50");
        assert_eq!(format_hours_decimal(0.0), "0.00");
        assert_eq!(format_hours_decimal(1.005), "1.00");
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(0.75), 0.75);
        assert_eq!(round2(1.2345), 1.23);
        assert_eq!(round2(2751.0 / 3600.0), 0.76);
    }

    #[test]
    fn test_month_label() {
        assert_eq!(month_label("2025-01"), "January 2025");
        assert_eq!(month_label("2024-12"), "December 2024");
    }

    #[test]
    fn test_month_label_invalid_passthrough() {
        assert_eq!(month_label("garbage"), "garbage");
        assert_eq!(month_label("2025-13"), "2025-13");
    }

    #[test]
    fn test_progress_percent() {
        assert_eq!(progress_percent(250.0, 1000.0), 25);
        assert_eq!(progress_percent(1500.0, 1000.0), 100);
        assert_eq!(progress_percent(0.0, 1000.0), 0);
        assert_eq!(progress_percent(10.0, 0.0), 0);
    }

    #[test]
    fn test_format_bar() {
        assert_eq!(format_bar(5.0, 10.0, 10), "█████░░░░░");
        assert_eq!(format_bar(20.0, 10.0, 4), "████");
        assert_eq!(format_bar(1.0, 0.0, 3), "░░░");
        assert_eq!(format_bar(1.0, 1.0, 0), "");
    }
}
