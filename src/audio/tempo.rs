/// Tempo used when there are too few beats to measure anything.
pub const DEFAULT_BPM: u32 = 120;

const MIN_BPM: f64 = 60.0;
const MAX_BPM: f64 = 200.0;
const MIN_BEATS: usize = 4;

/// Estimates tempo from the spacing of detected beats.
///
/// The median interval is used rather than the mean so a single missed or
/// spurious beat does not drag the estimate. The result is folded by
/// octaves into `[60, 200)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TempoEstimator;

impl TempoEstimator {
    pub fn new() -> Self {
        Self
    }

    pub fn estimate(&self, beats: &[f64]) -> u32 {
        if beats.len() < MIN_BEATS {
            return DEFAULT_BPM;
        }

        let mut intervals: Vec<f64> = beats.windows(2).map(|w| w[1] - w[0]).collect();
        intervals.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let median = median_of_sorted(&intervals);
        if !median.is_finite() || median <= 0.0 {
            return DEFAULT_BPM;
        }

        let bpm = octave_correct(60.0 / median).round();
        // Rounding can land exactly on the upper bound
        octave_correct(bpm).round() as u32
    }
}

fn median_of_sorted(values: &[f64]) -> f64 {
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

fn octave_correct(mut bpm: f64) -> f64 {
    while bpm < MIN_BPM {
        bpm *= 2.0;
    }
    while bpm >= MAX_BPM {
        bpm /= 2.0;
    }
    bpm
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(interval: f64, count: usize) -> Vec<f64> {
        (0..count).map(|i| i as f64 * interval).collect()
    }

    #[test]
    fn test_too_few_beats() {
        let estimator = TempoEstimator::new();
        assert_eq!(estimator.estimate(&[]), 120);
        assert_eq!(estimator.estimate(&[0.0, 0.5, 1.0]), 120);
    }

    #[test]
    fn test_regular_grid() {
        let estimator = TempoEstimator::new();
        assert_eq!(estimator.estimate(&grid(0.5, 16)), 120);
        assert_eq!(estimator.estimate(&grid(0.6, 16)), 100);
    }

    #[test]
    fn test_median_ignores_outlier() {
        let mut beats = grid(0.5, 10);
        // one missed beat doubles a single interval
        beats.remove(5);
        assert_eq!(TempoEstimator::new().estimate(&beats), 120);
    }

    #[test]
    fn test_slow_tempo_doubled() {
        // 2s spacing = 30 BPM -> 60
        assert_eq!(TempoEstimator::new().estimate(&grid(2.0, 6)), 60);
        // 1.4s spacing ~ 42.9 BPM -> 85.7
        assert_eq!(TempoEstimator::new().estimate(&grid(1.4, 6)), 86);
    }

    #[test]
    fn test_fast_tempo_halved() {
        // 0.2s spacing = 300 BPM -> 150
        assert_eq!(TempoEstimator::new().estimate(&grid(0.2, 8)), 150);
        // exactly 200 is outside the range
        assert_eq!(TempoEstimator::new().estimate(&grid(0.3, 8)), 100);
    }

    #[test]
    fn test_rounding_to_upper_bound() {
        // 199.7 BPM rounds to 200, which must fold to 100
        let interval = 60.0 / 199.7;
        assert_eq!(TempoEstimator::new().estimate(&grid(interval, 8)), 100);
    }

    #[test]
    fn test_always_in_range() {
        let estimator = TempoEstimator::new();
        for step in 1..400 {
            let interval = step as f64 * 0.01;
            let bpm = estimator.estimate(&grid(interval, 6));
            assert!((60..200).contains(&bpm), "interval {} gave {}", interval, bpm);
        }
    }

    #[test]
    fn test_degenerate_intervals() {
        assert_eq!(TempoEstimator::new().estimate(&[1.0, 1.0, 1.0, 1.0]), 120);
    }
}
