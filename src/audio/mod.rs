pub mod beat_detector;
pub mod decoder;
pub mod descriptors;
pub mod filter;
pub mod playback;
pub mod tempo;

pub use beat_detector::BeatDetector;
pub use decoder::{AudioDecoder, FileDecoder, SoundSource};
pub use descriptors::{AudioDescriptors, Confidence, DescriptorAnalyzer, HeuristicDescriptors};
pub use filter::LowPassFilter;
pub use playback::{AudioPlayback, PlaybackClock, PlaybackTimer, PlayedSamples, PositionTracked};
pub use tempo::TempoEstimator;

/// Mono PCM produced by a decoder, immutable once built.
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl DecodedAudio {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Down-mix interleaved frames to mono by averaging the channels.
    pub fn from_interleaved(interleaved: &[f32], channels: u16, sample_rate: u32) -> Self {
        let channels = channels.max(1) as usize;
        let samples = interleaved
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect();

        Self::new(samples, sample_rate)
    }

    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stereo_downmix() {
        let audio = DecodedAudio::from_interleaved(&[1.0, 0.0, 0.5, 0.5, -1.0, 1.0], 2, 4);
        assert_eq!(audio.samples, vec![0.5, 0.5, 0.0]);
        assert_eq!(audio.duration_seconds(), 0.75);
    }

    #[test]
    fn test_downmix_drops_partial_frame() {
        let audio = DecodedAudio::from_interleaved(&[0.2, 0.4, 0.6], 2, 44100);
        assert_eq!(audio.samples.len(), 1);
    }

    #[test]
    fn test_zero_rate_duration() {
        assert_eq!(DecodedAudio::new(vec![0.0; 10], 0).duration_seconds(), 0.0);
    }
}
