use std::collections::VecDeque;

use log::debug;

use super::filter::LowPassFilter;
use super::DecodedAudio;
use crate::config::DetectorConfig;

/// Offline energy beat detector.
///
/// The signal is low-passed, cut into non-overlapping windows and each
/// window's mean-square energy is compared against an adaptive threshold
/// derived from the recent history. Hysteresis keeps one sustained
/// transient from producing a burst of beats.
pub struct BeatDetector {
    config: DetectorConfig,
}

impl BeatDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn detect(&self, audio: &DecodedAudio) -> Vec<f64> {
        self.detect_samples(&audio.samples, audio.sample_rate)
    }

    /// Returns ascending beat timestamps in seconds.
    pub fn detect_samples(&self, samples: &[f32], sample_rate: u32) -> Vec<f64> {
        if sample_rate == 0 || samples.is_empty() {
            return Vec::new();
        }

        let window_len = ((self.config.window_seconds * sample_rate as f32).round() as usize).max(1);
        if samples.len() < window_len {
            return Vec::new();
        }

        let filtered = LowPassFilter::new(sample_rate, self.config.low_pass_hz).process_buffer(samples);

        let history_size = self.config.history_len.max(1);
        let mut history: VecDeque<f32> = VecDeque::with_capacity(history_size);
        let mut in_peak = false;
        let mut beats = Vec::new();

        for (index, window) in filtered.chunks_exact(window_len).enumerate() {
            let energy = window.iter().map(|x| x * x).sum::<f32>() / window_len as f32;
            let threshold = self.threshold(&history);

            if !in_peak && energy > threshold {
                in_peak = true;
                beats.push((index * window_len) as f64 / sample_rate as f64);
            } else if in_peak && energy < threshold * self.config.release_factor {
                in_peak = false;
            }

            history.push_back(energy);
            if history.len() > history_size {
                history.pop_front();
            }
        }

        debug!(
            "Detected {} beats over {} windows of {} samples",
            beats.len(),
            filtered.len() / window_len,
            window_len
        );

        beats
    }

    fn threshold(&self, history: &VecDeque<f32>) -> f32 {
        if history.is_empty() {
            return self.config.min_threshold;
        }

        let average = history.iter().sum::<f32>() / history.len() as f32;
        (average * self.config.threshold_factor).max(self.config.min_threshold)
    }
}

impl Default for BeatDetector {
    fn default() -> Self {
        Self::new(DetectorConfig::default())
    }
}
