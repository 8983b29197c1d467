//! Latency statistics reduction.
//!
//! An empty sequence is not an error here: min/max/mean come back as
//! `None` and the caller renders "undefined". Count-based metrics are
//! zero for empty input.

use serde::Serialize;

/// Summary of one latency sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LatencySummary {
    pub count: usize,
    pub min: Option<i64>,
    pub max: Option<i64>,
    /// Arithmetic mean rounded to the nearest integer.
    pub mean: Option<i64>,
    /// Number of negative latencies, a sign of clock skew between the
    /// capture points.
    pub negative: usize,
}

impl LatencySummary {
    pub fn from_values(values: &[i64]) -> Self {
        let negative = values.iter().filter(|&&v| v < 0).count();
        if values.is_empty() {
            return Self {
                count: 0,
                min: None,
                max: None,
                mean: None,
                negative,
            };
        }

        let sum: i64 = values.iter().sum();
        Self {
            count: values.len(),
            min: values.iter().min().copied(),
            max: values.iter().max().copied(),
            mean: Some((sum as f64 / values.len() as f64).round() as i64),
            negative,
        }
    }
}

/// Median of the values, averaging the two central elements for even
/// lengths.
pub fn median(values: &[i64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid] as f64)
    } else {
        Some((sorted[mid - 1] + sorted[mid]) as f64 / 2.0)
    }
}

/// Population standard deviation.
pub fn pstdev(values: &[i64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mean = values.iter().sum::<i64>() as f64 / values.len() as f64;
    let variance = values
        .iter()
        .map(|&v| {
            let d = v as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / values.len() as f64;
    Some(variance.sqrt())
}

/// Intervals between consecutive nanosecond timestamps, rounded to
/// microseconds. Used for publisher frame-to-frame jitter.
pub fn intervals_us(timestamps_ns: &[i64]) -> Vec<i64> {
    timestamps_ns
        .windows(2)
        .map(|w| ((w[1] - w[0]) as f64 / 1000.0).round() as i64)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sequence_is_undefined() {
        let s = LatencySummary::from_values(&[]);
        assert_eq!(s.count, 0);
        assert_eq!(s.min, None);
        assert_eq!(s.max, None);
        assert_eq!(s.mean, None);
        assert_eq!(s.negative, 0);
    }

    #[test]
    fn summary_of_plain_values() {
        let s = LatencySummary::from_values(&[5, 8, -2, 11]);
        assert_eq!(s.count, 4);
        assert_eq!(s.min, Some(-2));
        assert_eq!(s.max, Some(11));
        assert_eq!(s.mean, Some(6)); // 22 / 4 = 5.5 rounds up
        assert_eq!(s.negative, 1);
    }

    #[test]
    fn mean_rounds_to_nearest() {
        assert_eq!(LatencySummary::from_values(&[1, 2]).mean, Some(2));
        assert_eq!(LatencySummary::from_values(&[1, 1, 2]).mean, Some(1));
    }

    #[test]
    fn median_odd_and_even() {
        assert_eq!(median(&[3, 1, 2]), Some(2.0));
        assert_eq!(median(&[4, 1, 2, 3]), Some(2.5));
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn pstdev_known_value() {
        // statistics.pstdev([2, 4, 4, 4, 5, 5, 7, 9]) == 2.0
        let sd = pstdev(&[2, 4, 4, 4, 5, 5, 7, 9]).unwrap();
        assert!((sd - 2.0).abs() < 1e-9);
        assert_eq!(pstdev(&[]), None);
    }

    #[test]
    fn intervals_round_to_micros() {
        let ts = [0, 1_000_000, 2_500_400, 2_500_900];
        assert_eq!(intervals_us(&ts), vec![1000, 1500, 1]);
    }
}
