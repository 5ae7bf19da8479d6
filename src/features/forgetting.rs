use chrono::{DateTime, Utc};

use crate::types::{DEFAULT_FORGETTING_PARAM, MIN_CORRECT_FOR_FORGETTING, MS_PER_DAY};

/// Mean spacing between successful reviews, in weeks.
///
/// `correct_times` are the timestamps of the card's correct reviews in any
/// order. Too few of them yields the default parameter.
pub fn forgetting_param(correct_times: &[DateTime<Utc>]) -> f64 {
    if correct_times.len() < MIN_CORRECT_FOR_FORGETTING {
        return DEFAULT_FORGETTING_PARAM;
    }

    let mut times = correct_times.to_vec();
    times.sort();

    let intervals: Vec<f64> = times
        .windows(2)
        .map(|pair| (pair[1] - pair[0]).num_milliseconds() as f64 / MS_PER_DAY)
        .collect();

    if intervals.is_empty() {
        return DEFAULT_FORGETTING_PARAM;
    }

    let mean_days = intervals.iter().sum::<f64>() / intervals.len() as f64;
    mean_days / 7.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap() + Duration::days(n)
    }

    #[test]
    fn test_weekly_spacing() {
        let param = forgetting_param(&[day(0), day(7), day(14)]);
        assert!((param - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_unsorted_input() {
        let param = forgetting_param(&[day(14), day(0), day(7)]);
        assert!((param - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_fractional_days() {
        let half = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let param = forgetting_param(&[day(0), half]);
        assert!((param - 0.5 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_too_few_correct() {
        assert_eq!(forgetting_param(&[]), DEFAULT_FORGETTING_PARAM);
        assert_eq!(forgetting_param(&[day(3)]), DEFAULT_FORGETTING_PARAM);
    }
}
