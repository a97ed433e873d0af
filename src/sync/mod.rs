pub mod element;
pub mod generator;
pub mod scheduler;
pub mod session;
pub mod sync_point;

pub use element::{ElementEntry, ElementKind, ElementRegistry, StaticRegistry};
pub use generator::{EmptyReason, GenerationOutcome, SyncPointGenerator, TrackAnalysis};
pub use scheduler::{AnimationApplier, CooldownHandle, SyncScheduler};
pub use session::{CommitOutcome, GenerationRequest, GenerationResult, GenerationStatus, SyncSession};
pub use sync_point::{AnimationDescriptor, SyncAction, SyncParams, SyncPoint, SyncPointId};
