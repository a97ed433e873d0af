use log::{debug, info, warn};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use super::element::ElementEntry;
use super::sync_point::{SyncAction, SyncParams, SyncPoint};
use crate::audio::{
    AudioDecoder, AudioDescriptors, BeatDetector, DecodedAudio, DescriptorAnalyzer, SoundSource,
    TempoEstimator,
};
use crate::config::{EngineConfig, GeneratorConfig};
use crate::error::Result;

/// Why a generation produced no sync points without being a hard failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmptyReason {
    NoElements,
    NoBeats,
    DecodeFailed(String),
}

/// Everything learned about a track on the way to its sync points.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackAnalysis {
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub beats: Vec<f64>,
    pub tempo: u32,
    pub descriptors: AudioDescriptors,
}

#[derive(Debug, Clone)]
pub enum GenerationOutcome {
    Points {
        points: Vec<SyncPoint>,
        analysis: TrackAnalysis,
    },
    Empty {
        reason: EmptyReason,
        analysis: Option<TrackAnalysis>,
    },
}

impl GenerationOutcome {
    pub fn points(&self) -> &[SyncPoint] {
        match self {
            GenerationOutcome::Points { points, .. } => points,
            GenerationOutcome::Empty { .. } => &[],
        }
    }

    pub fn into_points(self) -> Vec<SyncPoint> {
        match self {
            GenerationOutcome::Points { points, .. } => points,
            GenerationOutcome::Empty { .. } => Vec::new(),
        }
    }

    pub fn analysis(&self) -> Option<&TrackAnalysis> {
        match self {
            GenerationOutcome::Points { analysis, .. } => Some(analysis),
            GenerationOutcome::Empty { analysis, .. } => analysis.as_ref(),
        }
    }

    pub fn empty_reason(&self) -> Option<&EmptyReason> {
        match self {
            GenerationOutcome::Points { .. } => None,
            GenerationOutcome::Empty { reason, .. } => Some(reason),
        }
    }
}

/// Turns a sound and an element list into a sync-point timeline.
pub struct SyncPointGenerator {
    detector: BeatDetector,
    tempo: TempoEstimator,
    descriptors: DescriptorAnalyzer,
    config: GeneratorConfig,
}

impl SyncPointGenerator {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            detector: BeatDetector::new(config.detector.clone()),
            tempo: TempoEstimator::new(),
            descriptors: DescriptorAnalyzer::new(config.descriptors.clone()),
            config: config.generator.clone(),
        }
    }

    /// Decode `source`, detect beats and spread them over `elements`.
    ///
    /// An unusable source reference fails before any decoding is attempted.
    /// A decode failure, an empty element list or a beatless track all come
    /// back as [`GenerationOutcome::Empty`] with the reason attached.
    pub async fn generate<D>(
        &self,
        decoder: &D,
        source: &SoundSource,
        elements: &[ElementEntry],
    ) -> Result<GenerationOutcome>
    where
        D: AudioDecoder + ?Sized,
    {
        let location = source.resolve()?;

        if elements.is_empty() {
            info!("No elements to sync for sound '{}'", source.id);
            return Ok(GenerationOutcome::Empty {
                reason: EmptyReason::NoElements,
                analysis: None,
            });
        }

        let audio = match decoder.decode(location).await {
            Ok(audio) => audio,
            Err(e) => {
                warn!("Decoding '{}' failed: {:#}", location, e);
                return Ok(GenerationOutcome::Empty {
                    reason: EmptyReason::DecodeFailed(format!("{:#}", e)),
                    analysis: None,
                });
            }
        };

        Ok(self.generate_from_audio(&audio, elements))
    }

    /// Same as [`generate`](Self::generate) for audio that is already decoded.
    pub fn generate_from_audio(&self, audio: &DecodedAudio, elements: &[ElementEntry]) -> GenerationOutcome {
        if elements.is_empty() {
            return GenerationOutcome::Empty {
                reason: EmptyReason::NoElements,
                analysis: None,
            };
        }

        let analysis = self.analyze(audio);
        if analysis.beats.is_empty() {
            info!("No beats detected, nothing to sync");
            return GenerationOutcome::Empty {
                reason: EmptyReason::NoBeats,
                analysis: Some(analysis),
            };
        }

        let points = self.assign(&analysis.beats, elements, batch_stamp());
        info!(
            "Generated {} sync points over {} elements at {} BPM",
            points.len(),
            elements.len(),
            analysis.tempo
        );

        GenerationOutcome::Points { points, analysis }
    }

    pub fn analyze(&self, audio: &DecodedAudio) -> TrackAnalysis {
        let beats = self.detector.detect(audio);
        let tempo = self.tempo.estimate(&beats);
        let descriptors = self.descriptors.analyze(audio, &beats, tempo);

        debug!(
            "Analysis: {} beats, tempo {}, energy {:.3}",
            beats.len(),
            tempo,
            descriptors.energy
        );

        TrackAnalysis {
            duration_seconds: audio.duration_seconds(),
            sample_rate: audio.sample_rate,
            beats,
            tempo,
            descriptors,
        }
    }

    /// Map beats onto elements round-robin. Deterministic for fixed inputs
    /// apart from the `batch` component of the ids.
    pub fn assign(&self, beats: &[f64], elements: &[ElementEntry], batch: u128) -> Vec<SyncPoint> {
        if elements.is_empty() {
            return Vec::new();
        }

        beats
            .iter()
            .enumerate()
            .map(|(i, &timestamp)| {
                let element = &elements[i % elements.len()];
                let intensity = if i % 4 == 0 {
                    self.config.strong_intensity
                } else {
                    self.config.weak_intensity
                };

                SyncPoint {
                    id: format!("sync-{}-{}", batch, i),
                    timestamp,
                    element_id: element.id.clone(),
                    element_type: element.resolved_kind(),
                    action: SyncAction::for_beat(i),
                    params: SyncParams {
                        intensity,
                        duration: self.config.default_duration,
                    },
                }
            })
            .collect()
    }
}

impl Default for SyncPointGenerator {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

static LAST_BATCH: AtomicU64 = AtomicU64::new(0);

/// Millisecond timestamp for id prefixes, bumped past the previous batch so
/// two generations in the same millisecond never share ids.
fn batch_stamp() -> u128 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default();

    let previous = LAST_BATCH
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(now.max(last + 1)))
        .unwrap_or_else(|last| last);
    now.max(previous + 1) as u128
}
