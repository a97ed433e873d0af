//! Editing-session ownership of the sync timeline.
//!
//! A [`SyncSession`] ties together the current sound, the generation state
//! machine and the [`SyncScheduler`]. Generation is split in three steps so
//! the caller can keep using the session while decoding is in flight:
//!
//! 1. [`SyncSession::begin_generation`] snapshots the sound and element set
//!    and hands back a [`GenerationRequest`];
//! 2. [`GenerationRequest::run`] does the async decode and analysis;
//! 3. [`SyncSession::complete_generation`] commits the result, unless the
//!    sound (or element set) changed in the meantime, in which case the
//!    result is dropped as stale.

use log::{debug, info, warn};
use std::sync::Arc;

use super::element::{ElementEntry, ElementRegistry};
use super::generator::{EmptyReason, GenerationOutcome, SyncPointGenerator, TrackAnalysis};
use super::scheduler::{AnimationApplier, SyncScheduler};
use super::sync_point::{SyncPoint, SyncPointId};
use crate::audio::{AudioDecoder, PlaybackClock, SoundSource};
use crate::config::EngineConfig;
use crate::error::SyncError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationStatus {
    Idle,
    Generating,
    Ready,
    Failed(String),
}

/// What `complete_generation` did with a result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Points stored; the count is attached
    Applied(usize),
    /// Nothing to sync, but not an error
    Empty(EmptyReason),
    /// Source or decode failure; existing points were cleared
    Failed(String),
    /// The result no longer matches the session and was discarded
    Stale,
    /// Another generation was already in flight, nothing was started
    Busy,
}

/// A generation captured at `begin_generation` time.
pub struct GenerationRequest {
    token: u64,
    sound: SoundSource,
    elements: Vec<ElementEntry>,
    generator: Arc<SyncPointGenerator>,
}

impl GenerationRequest {
    pub fn sound(&self) -> &SoundSource {
        &self.sound
    }

    pub fn elements(&self) -> &[ElementEntry] {
        &self.elements
    }

    pub async fn run<D>(self, decoder: &D) -> GenerationResult
    where
        D: AudioDecoder + ?Sized,
    {
        let outcome = self
            .generator
            .generate(decoder, &self.sound, &self.elements)
            .await;

        GenerationResult {
            token: self.token,
            sound_identity: self.sound.identity(),
            outcome,
        }
    }
}

/// Tagged result of a finished generation, ready to be committed.
pub struct GenerationResult {
    token: u64,
    sound_identity: String,
    outcome: Result<GenerationOutcome, SyncError>,
}

impl GenerationResult {
    pub fn outcome(&self) -> &Result<GenerationOutcome, SyncError> {
        &self.outcome
    }
}

pub struct SyncSession {
    config: EngineConfig,
    generator: Arc<SyncPointGenerator>,
    scheduler: SyncScheduler,
    sound: Option<SoundSource>,
    status: GenerationStatus,
    next_token: u64,
    in_flight: Option<u64>,
    analysis: Option<TrackAnalysis>,
}

impl SyncSession {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            generator: Arc::new(SyncPointGenerator::new(&config)),
            scheduler: SyncScheduler::new(&config.scheduler),
            config,
            sound: None,
            status: GenerationStatus::Idle,
            next_token: 0,
            in_flight: None,
            analysis: None,
        }
    }

    pub fn status(&self) -> &GenerationStatus {
        &self.status
    }

    pub fn sound(&self) -> Option<&SoundSource> {
        self.sound.as_ref()
    }

    pub fn sync_points(&self) -> &[SyncPoint] {
        self.scheduler.sync_points()
    }

    /// Tempo, beats and descriptors from the last committed generation.
    pub fn analysis(&self) -> Option<&TrackAnalysis> {
        self.analysis.as_ref()
    }

    pub fn scheduler(&self) -> &SyncScheduler {
        &self.scheduler
    }

    pub fn set_auto_generate(&mut self, enabled: bool) {
        self.config.auto_generate = enabled;
    }

    /// Select a new sound (or none). A different sound invalidates any
    /// in-flight generation and the current timeline.
    pub fn set_sound(&mut self, sound: Option<SoundSource>) {
        let old = self.sound.as_ref().map(SoundSource::identity);
        let new = sound.as_ref().map(SoundSource::identity);
        self.sound = sound;

        if old != new {
            debug!("Sound changed: {:?} -> {:?}", old, new);
            self.reset_timeline();
        }
    }

    /// The element set changed in a way that invalidates the timeline.
    pub fn invalidate_elements(&mut self) {
        debug!("Element set invalidated");
        self.reset_timeline();
    }

    fn reset_timeline(&mut self) {
        self.in_flight = None;
        self.analysis = None;
        self.scheduler.clear();
        self.status = GenerationStatus::Idle;
    }

    /// Start a generation for the current sound over a snapshot of `registry`.
    ///
    /// Returns `None` while another generation is in flight, and when no
    /// sound is selected (which also puts the session in `Failed`).
    pub fn begin_generation<R>(&mut self, registry: &R) -> Option<GenerationRequest>
    where
        R: ElementRegistry + ?Sized,
    {
        if self.status == GenerationStatus::Generating {
            debug!("Generation already in flight, not starting another");
            return None;
        }

        let Some(sound) = self.sound.clone() else {
            warn!("Cannot generate sync points without a sound");
            self.fail(SyncError::InvalidSoundSource.to_string());
            return None;
        };

        self.next_token += 1;
        self.in_flight = Some(self.next_token);
        self.status = GenerationStatus::Generating;

        let elements = registry.snapshot();
        info!(
            "Generating sync points for '{}' over {} elements",
            sound.id,
            elements.len()
        );

        Some(GenerationRequest {
            token: self.next_token,
            sound,
            elements,
            generator: Arc::clone(&self.generator),
        })
    }

    /// Commit a finished generation if it still belongs to this session.
    pub fn complete_generation(&mut self, result: GenerationResult) -> CommitOutcome {
        let current_identity = self.sound.as_ref().map(SoundSource::identity);
        if self.in_flight != Some(result.token) || current_identity.as_deref() != Some(result.sound_identity.as_str()) {
            info!("Discarding stale generation for {}", result.sound_identity);
            return CommitOutcome::Stale;
        }
        self.in_flight = None;

        match result.outcome {
            Err(e) => {
                warn!("Sync point generation failed: {}", e);
                self.fail(e.to_string());
                CommitOutcome::Failed(e.to_string())
            }
            Ok(GenerationOutcome::Empty {
                reason: EmptyReason::DecodeFailed(message),
                ..
            }) => {
                self.fail(message.clone());
                CommitOutcome::Failed(message)
            }
            Ok(GenerationOutcome::Empty { reason, analysis }) => {
                self.scheduler.clear();
                self.analysis = analysis;
                self.status = GenerationStatus::Ready;
                CommitOutcome::Empty(reason)
            }
            Ok(GenerationOutcome::Points { points, analysis }) => {
                let count = points.len();
                self.scheduler.set_sync_points(points);
                self.analysis = Some(analysis);
                self.status = GenerationStatus::Ready;
                CommitOutcome::Applied(count)
            }
        }
    }

    /// Begin, run and commit in one go. Returns `Busy` without touching the
    /// session if a generation is already in flight.
    pub async fn generate<R, D>(&mut self, registry: &R, decoder: &D) -> CommitOutcome
    where
        R: ElementRegistry + ?Sized,
        D: AudioDecoder + ?Sized,
    {
        match self.begin_generation(registry) {
            Some(request) => {
                let result = request.run(decoder).await;
                self.complete_generation(result)
            }
            None => match &self.status {
                GenerationStatus::Failed(message) => CommitOutcome::Failed(message.clone()),
                _ => CommitOutcome::Busy,
            },
        }
    }

    /// Start an automatic generation if the session is waiting for one.
    ///
    /// Only fires from `Idle`: once a generation has run for the current
    /// sound and element set (even one that produced nothing), the session
    /// sits in `Ready` or `Failed` and this returns `None` until the sound or
    /// elements change.
    pub fn poll_auto_generation<R>(&mut self, registry: &R) -> Option<GenerationRequest>
    where
        R: ElementRegistry + ?Sized,
    {
        if !self.config.auto_generate
            || self.status != GenerationStatus::Idle
            || self.sound.is_none()
            || !self.scheduler.sync_points().is_empty()
            || registry.snapshot().is_empty()
        {
            return None;
        }

        debug!("Auto-generating sync points");
        self.begin_generation(registry)
    }

    /// Drop the timeline; nothing fires until a new generation completes.
    pub fn clear(&mut self) {
        self.scheduler.clear();
    }

    pub fn tick<C, R, A>(&mut self, clock: &C, registry: &R, animator: &mut A) -> Vec<SyncPointId>
    where
        C: PlaybackClock + ?Sized,
        R: ElementRegistry + ?Sized,
        A: AnimationApplier + ?Sized,
    {
        self.scheduler.tick(clock, registry, animator)
    }

    /// Cancel cooldowns and forget any in-flight generation.
    pub fn shutdown(&mut self) {
        self.scheduler.shutdown();
        self.in_flight = None;
        self.analysis = None;
        self.status = GenerationStatus::Idle;
    }

    fn fail(&mut self, message: String) {
        self.scheduler.clear();
        self.analysis = None;
        self.status = GenerationStatus::Failed(message);
    }
}

impl Default for SyncSession {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
