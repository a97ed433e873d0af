//! Beat detection and audio-visual synchronization.
//!
//! The crate decodes a sound, finds its beats with an energy-threshold
//! detector, estimates tempo and a handful of track descriptors, and turns
//! the beats into a timeline of [`SyncPoint`]s spread round-robin over a set
//! of visual elements. During playback a [`SyncScheduler`] polls the clock
//! and hands [`AnimationDescriptor`]s to the host whenever a point comes due.
//!
//! ```no_run
//! use beat_sync::{EngineConfig, FileDecoder, SoundSource, StaticRegistry, SyncSession};
//!
//! # async fn demo() {
//! let mut session = SyncSession::new(EngineConfig::default());
//! session.set_sound(Some(SoundSource::new("intro", "intro.mp3")));
//!
//! let registry = StaticRegistry::from_ids(["title-text", "hero-image", "bg-main"]);
//! let outcome = session.generate(&registry, &FileDecoder::new()).await;
//! println!("{:?}: {} points", outcome, session.sync_points().len());
//! # }
//! ```

pub mod audio;
pub mod config;
pub mod error;
pub mod sync;

pub use audio::{
    AudioDecoder, AudioDescriptors, AudioPlayback, BeatDetector, DecodedAudio, DescriptorAnalyzer,
    FileDecoder, PlaybackClock, PlaybackTimer, SoundSource, TempoEstimator,
};
pub use config::EngineConfig;
pub use error::{Result, SyncError};
pub use sync::{
    AnimationApplier, AnimationDescriptor, CommitOutcome, ElementEntry, ElementKind,
    ElementRegistry, GenerationOutcome, GenerationStatus, StaticRegistry, SyncAction, SyncPoint,
    SyncPointGenerator, SyncScheduler, SyncSession,
};
