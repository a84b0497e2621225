//! Year-over-year mean for a calendar day.

use chrono::{Datelike, NaiveDate};

use crate::error::AverageError;
use crate::types::{DailySeries, TemperatureRange};

/// Mean min/max over every sample sharing `target`'s month and day.
///
/// The year of each sample is ignored. Max and min are averaged
/// independently: a missing max does not drop that day's min, and the
/// reverse. No rounding is applied.
pub fn average_for_date(
    series: &DailySeries,
    target: NaiveDate,
) -> Result<TemperatureRange, AverageError> {
    let (max_sum, max_n, min_sum, min_n) = series
        .samples()
        .filter(|s| s.matches_month_day(target))
        .fold((0.0, 0usize, 0.0, 0usize), |(max_sum, max_n, min_sum, min_n), s| {
            let (max_sum, max_n) = match s.max {
                Some(v) => (max_sum + v, max_n + 1),
                None => (max_sum, max_n),
            };
            let (min_sum, min_n) = match s.min {
                Some(v) => (min_sum + v, min_n + 1),
                None => (min_sum, min_n),
            };
            (max_sum, max_n, min_sum, min_n)
        });

    if max_n == 0 || min_n == 0 {
        tracing::debug!("No historical samples for {}", target.format("%m-%d"));
        return Err(AverageError::NoMatch {
            month: target.month(),
            day: target.day(),
        });
    }

    Ok(TemperatureRange {
        min: min_sum / min_n as f64,
        max: max_sum / max_n as f64,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use crate::types::DATE_FORMAT;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    fn series(days: &[(&str, Option<f64>, Option<f64>)]) -> DailySeries {
        DailySeries::new(
            days.iter().map(|(d, _, _)| date(d)).collect(),
            days.iter().map(|(_, max, _)| *max).collect(),
            days.iter().map(|(_, _, min)| *min).collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_average_two_years() {
        let s = series(&[
            ("2020-06-01", Some(10.0), Some(2.0)),
            ("2021-06-01", Some(20.0), Some(4.0)),
        ]);
        let avg = average_for_date(&s, date("2024-06-01")).unwrap();
        assert_eq!(avg, TemperatureRange { min: 3.0, max: 15.0 });
    }

    #[test]
    fn test_non_matching_days_are_ignored() {
        let s = series(&[
            ("2020-05-31", Some(100.0), Some(100.0)),
            ("2020-06-01", Some(12.5), Some(1.5)),
            ("2020-06-02", Some(-100.0), Some(-100.0)),
        ]);
        let avg = average_for_date(&s, date("2031-06-01")).unwrap();
        assert_eq!(avg, TemperatureRange { min: 1.5, max: 12.5 });
    }

    #[test]
    fn test_no_match() {
        let s = series(&[("2020-06-02", Some(10.0), Some(2.0))]);
        let err = average_for_date(&s, date("2024-06-01")).unwrap_err();
        assert_eq!(err, AverageError::NoMatch { month: 6, day: 1 });
    }

    #[test]
    fn test_empty_series_is_no_match() {
        let err = average_for_date(&DailySeries::default(), date("2024-06-01")).unwrap_err();
        assert!(matches!(err, AverageError::NoMatch { .. }));
    }

    #[test]
    fn test_missing_values_are_skipped() {
        let s = series(&[
            ("2019-12-25", None, Some(-3.0)),
            ("2020-12-25", Some(4.0), Some(-1.0)),
        ]);
        let avg = average_for_date(&s, date("2026-12-25")).unwrap();
        assert_eq!(avg, TemperatureRange { min: -2.0, max: 4.0 });

        let only_gaps = series(&[("2020-12-25", None, None)]);
        assert!(average_for_date(&only_gaps, date("2026-12-25")).is_err());
    }

    #[test]
    fn test_missing_max_keeps_that_days_min() {
        let s = series(&[
            ("2020-06-01", None, Some(2.0)),
            ("2021-06-01", Some(10.0), Some(4.0)),
        ]);
        let avg = average_for_date(&s, date("2024-06-01")).unwrap();
        assert_eq!(avg, TemperatureRange { min: 3.0, max: 10.0 });
    }

    #[test]
    fn test_column_without_any_value_is_no_match() {
        let s = series(&[
            ("2020-06-01", None, Some(2.0)),
            ("2021-06-01", None, Some(4.0)),
        ]);
        let err = average_for_date(&s, date("2024-06-01")).unwrap_err();
        assert_eq!(err, AverageError::NoMatch { month: 6, day: 1 });
    }

    #[test]
    fn test_leap_day_only_matches_leap_years() {
        let s = series(&[
            ("2020-02-28", Some(5.0), Some(0.0)),
            ("2020-02-29", Some(7.0), Some(1.0)),
            ("2024-02-29", Some(9.0), Some(3.0)),
        ]);
        let avg = average_for_date(&s, date("2028-02-29")).unwrap();
        assert_eq!(avg, TemperatureRange { min: 2.0, max: 8.0 });
    }
}
