//! Goal period boundaries.

use chrono::{Datelike, Duration, NaiveDate};

use crate::models::PeriodType;

/// First day of the period containing `today`.
///
/// Daily periods start today, weekly periods on the Monday of the current
/// week, monthly periods on the first of the current month.
pub fn period_start(period: PeriodType, today: NaiveDate) -> NaiveDate {
    match period {
        PeriodType::Daily => today,
        PeriodType::Weekly => {
            today - Duration::days(i64::from(today.weekday().num_days_from_monday()))
        }
        PeriodType::Monthly => today.with_day(1).unwrap_or(today),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_daily_is_today() {
        assert_eq!(period_start(PeriodType::Daily, date(2024, 3, 14)), date(2024, 3, 14));
    }

    #[test]
    fn test_weekly_starts_monday() {
        // 2024-03-14 is a Thursday.
        assert_eq!(period_start(PeriodType::Weekly, date(2024, 3, 14)), date(2024, 3, 11));
        assert_eq!(period_start(PeriodType::Weekly, date(2024, 3, 11)), date(2024, 3, 11));
        // Sunday belongs to the week that started six days earlier.
        assert_eq!(period_start(PeriodType::Weekly, date(2024, 3, 17)), date(2024, 3, 11));
    }

    #[test]
    fn test_weekly_crosses_month_and_year() {
        // 2025-01-01 is a Wednesday.
        assert_eq!(period_start(PeriodType::Weekly, date(2025, 1, 1)), date(2024, 12, 30));
    }

    #[test]
    fn test_monthly_starts_first() {
        assert_eq!(period_start(PeriodType::Monthly, date(2024, 2, 29)), date(2024, 2, 1));
        assert_eq!(period_start(PeriodType::Monthly, date(2024, 2, 1)), date(2024, 2, 1));
    }
}
