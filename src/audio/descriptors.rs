use rand::Rng;
use serde::{Deserialize, Serialize};

use super::DecodedAudio;
use crate::config::DescriptorConfig;

const TEMPO_FLOOR: f32 = 60.0;
const TEMPO_CEILING: f32 = 200.0;

/// How far a descriptor value can be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    /// Derived from measured signal properties
    Measured,
    /// Energy-scaled guesswork, no spectral analysis behind it
    Low,
}

/// Placeholder descriptors.
///
/// These are NOT derived from spectral analysis. Each one is a random draw
/// scaled by overall energy, so two runs over the same audio disagree.
/// Treat them as decoration only; nothing in the engine depends on them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeuristicDescriptors {
    pub acousticness: f32,
    pub instrumentalness: f32,
    pub liveness: f32,
    pub confidence: Confidence,
}

/// Perceptual summary of a decoded track.
///
/// `energy`, `valence` and `danceability` come from the signal and beat
/// grid. Everything under `heuristic` is low confidence (see
/// [`HeuristicDescriptors`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioDescriptors {
    pub tempo: u32,
    pub energy: f32,
    pub valence: f32,
    pub danceability: f32,
    pub confidence: Confidence,
    pub heuristic: HeuristicDescriptors,
}

pub struct DescriptorAnalyzer {
    config: DescriptorConfig,
}

impl DescriptorAnalyzer {
    pub fn new(config: DescriptorConfig) -> Self {
        Self { config }
    }

    pub fn analyze(&self, audio: &DecodedAudio, beats: &[f64], tempo: u32) -> AudioDescriptors {
        self.analyze_with_rng(audio, beats, tempo, &mut rand::thread_rng())
    }

    /// Same as [`analyze`](Self::analyze) with a caller-supplied RNG for the
    /// heuristic fields. Measured fields do not touch the RNG.
    pub fn analyze_with_rng<R: Rng + ?Sized>(
        &self,
        audio: &DecodedAudio,
        beats: &[f64],
        tempo: u32,
        rng: &mut R,
    ) -> AudioDescriptors {
        let energy = self.energy(&audio.samples);
        let tempo_f = tempo as f32;

        let normalized_tempo = ((tempo_f - TEMPO_FLOOR) / (TEMPO_CEILING - TEMPO_FLOOR)).clamp(0.0, 1.0);
        let valence = (0.5 + 0.3 * energy + 0.2 * normalized_tempo).clamp(0.0, 1.0);

        let regularity = rhythm_regularity(beats);
        let ideal = self.config.ideal_tempo;
        let tempo_closeness = (1.0 - (tempo_f - ideal).abs() / ideal).clamp(0.0, 1.0);
        let danceability = (0.3 * regularity + 0.4 * energy + 0.3 * tempo_closeness).clamp(0.0, 1.0);

        let heuristic = HeuristicDescriptors {
            acousticness: ((1.0 - energy) * rng.gen::<f32>()).clamp(0.0, 1.0),
            instrumentalness: ((0.5 + 0.5 * rng.gen::<f32>()) * (1.0 - 0.5 * energy)).clamp(0.0, 1.0),
            liveness: (0.1 + 0.3 * energy * rng.gen::<f32>()).clamp(0.0, 1.0),
            confidence: Confidence::Low,
        };

        AudioDescriptors {
            tempo,
            energy,
            valence,
            danceability,
            confidence: Confidence::Measured,
            heuristic,
        }
    }

    fn energy(&self, samples: &[f32]) -> f32 {
        if samples.is_empty() {
            return 0.0;
        }

        let mean_square = samples.iter().map(|x| x * x).sum::<f32>() / samples.len() as f32;
        (mean_square * self.config.energy_scale).clamp(0.0, 1.0)
    }
}

impl Default for DescriptorAnalyzer {
    fn default() -> Self {
        Self::new(DescriptorConfig::default())
    }
}

/// `1 - coefficient of variation` of the beat intervals, in `[0, 1]`.
fn rhythm_regularity(beats: &[f64]) -> f32 {
    let intervals: Vec<f64> = beats.windows(2).map(|w| w[1] - w[0]).collect();
    if intervals.len() < 2 {
        return 0.0;
    }

    let mean = intervals.iter().sum::<f64>() / intervals.len() as f64;
    if mean <= 0.0 {
        return 0.0;
    }

    let variance = intervals.iter().map(|&x| (x - mean).powi(2)).sum::<f64>() / intervals.len() as f64;
    let cv = variance.sqrt() / mean;

    (1.0 - cv).clamp(0.0, 1.0) as f32
}
