//! Holiday effect features.
//!
//! Each distinct holiday name contributes one feature column and therefore
//! one fitted coefficient. A row's feature value is the number of configured
//! windows of that name whose date range contains the row's calendar date,
//! so overlapping windows of the same name stack their effects.

use crate::config::HolidayWindow;
use chrono::{DateTime, Duration, Utc};

/// Distinct holiday names in sorted order, one per coefficient.
pub fn holiday_names(holidays: &[HolidayWindow]) -> Vec<String> {
    let mut names: Vec<String> = holidays.iter().map(|h| h.name.clone()).collect();
    names.sort();
    names.dedup();
    names
}

/// Indicator columns for the given holiday names, in the order of `names`.
pub fn holiday_columns(
    timestamps: &[DateTime<Utc>],
    holidays: &[HolidayWindow],
    names: &[String],
) -> Vec<Vec<f64>> {
    names
        .iter()
        .map(|name| {
            let windows: Vec<(chrono::NaiveDate, chrono::NaiveDate)> = holidays
                .iter()
                .filter(|h| &h.name == name)
                .map(|h| {
                    (
                        h.date - Duration::days(h.days_before as i64),
                        h.date + Duration::days(h.days_after as i64),
                    )
                })
                .collect();
            timestamps
                .iter()
                .map(|ts| {
                    let date = ts.date_naive();
                    windows
                        .iter()
                        .filter(|(lo, hi)| date >= *lo && date <= *hi)
                        .count() as f64
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    fn days_from(year: i32, month: u32, day: u32, n: usize) -> Vec<DateTime<Utc>> {
        let base = Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap();
        (0..n).map(|i| base + Duration::days(i as i64)).collect()
    }

    #[test]
    fn names_are_sorted_and_deduped() {
        let holidays = vec![
            HolidayWindow::new("launch", NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()),
            HolidayWindow::new("christmas", NaiveDate::from_ymd_opt(2024, 12, 25).unwrap()),
            HolidayWindow::new("christmas", NaiveDate::from_ymd_opt(2025, 12, 25).unwrap()),
        ];
        assert_eq!(holiday_names(&holidays), vec!["christmas", "launch"]);
    }

    #[test]
    fn window_covers_surrounding_days() {
        let holidays = vec![
            HolidayWindow::new("launch", NaiveDate::from_ymd_opt(2024, 1, 3).unwrap())
                .with_window(1, 2),
        ];
        let names = holiday_names(&holidays);
        let timestamps = days_from(2024, 1, 1, 7);
        let columns = holiday_columns(&timestamps, &holidays, &names);

        // Jan 2 through Jan 5 inclusive.
        assert_eq!(columns[0], vec![0.0, 1.0, 1.0, 1.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn overlapping_windows_of_one_name_stack() {
        let holidays = vec![
            HolidayWindow::new("sale", NaiveDate::from_ymd_opt(2024, 1, 2).unwrap())
                .with_window(0, 2),
            HolidayWindow::new("sale", NaiveDate::from_ymd_opt(2024, 1, 4).unwrap())
                .with_window(1, 0),
        ];
        let names = holiday_names(&holidays);
        let timestamps = days_from(2024, 1, 1, 5);
        let columns = holiday_columns(&timestamps, &holidays, &names);

        // Jan 3 and 4 are covered by both windows.
        assert_eq!(columns[0], vec![0.0, 1.0, 2.0, 2.0, 0.0]);
    }

    #[test]
    fn recurring_dates_share_a_column() {
        let holidays = vec![
            HolidayWindow::new("christmas", NaiveDate::from_ymd_opt(2023, 12, 25).unwrap()),
            HolidayWindow::new("christmas", NaiveDate::from_ymd_opt(2024, 12, 25).unwrap()),
        ];
        let names = holiday_names(&holidays);
        let timestamps = vec![
            Utc.with_ymd_and_hms(2023, 12, 25, 8, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 12, 25, 8, 0, 0).unwrap(),
        ];
        let columns = holiday_columns(&timestamps, &holidays, &names);
        assert_eq!(columns.len(), 1);
        assert_eq!(columns[0], vec![1.0, 0.0, 1.0]);
    }
}
