use log::debug;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use super::element::ElementRegistry;
use super::sync_point::{AnimationDescriptor, SyncPoint, SyncPointId};
use crate::audio::PlaybackClock;
use crate::config::SchedulerConfig;

/// Receives the animations the scheduler decides to fire.
pub trait AnimationApplier {
    /// Preferred entry point when the element's section is known.
    fn apply_in_section(&mut self, section_id: &str, element_id: &str, descriptor: &AnimationDescriptor);

    fn apply(&mut self, element_id: &str, descriptor: &AnimationDescriptor);
}

/// Blocks a fired sync point until `expires_at`.
///
/// Measured on the monotonic clock, not on playback time, so seeking back
/// over a point does not shorten its cooldown.
#[derive(Debug, Clone, Copy)]
pub struct CooldownHandle {
    expires_at: Instant,
}

impl CooldownHandle {
    fn new(now: Instant, cooldown: Duration) -> Self {
        Self {
            expires_at: now + cooldown,
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    pub fn remaining(&self, now: Instant) -> Duration {
        self.expires_at.saturating_duration_since(now)
    }
}

/// Matches the playback clock against the sync-point timeline and fires due
/// points through an [`AnimationApplier`].
///
/// All state lives here and only changes through `tick`, `set_sync_points`,
/// `clear` and `shutdown`.
pub struct SyncScheduler {
    sync_points: Vec<SyncPoint>,
    active: HashMap<SyncPointId, CooldownHandle>,
    tolerance: f64,
    cooldown: Duration,
    intensity_multiplier: f32,
}

impl SyncScheduler {
    pub fn new(config: &SchedulerConfig) -> Self {
        Self {
            sync_points: Vec::new(),
            active: HashMap::new(),
            tolerance: config.tolerance_seconds,
            cooldown: Duration::from_millis(config.cooldown_ms),
            intensity_multiplier: config.intensity_multiplier,
        }
    }

    /// Replace the timeline. Points are kept in timestamp order.
    pub fn set_sync_points(&mut self, mut points: Vec<SyncPoint>) {
        points.sort_by(|a, b| {
            a.timestamp
                .partial_cmp(&b.timestamp)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        self.sync_points = points;
    }

    pub fn sync_points(&self) -> &[SyncPoint] {
        &self.sync_points
    }

    /// Drop the timeline. Running cooldowns are left to lapse on their own.
    pub fn clear(&mut self) {
        self.sync_points.clear();
    }

    /// Cancel every cooldown and drop the timeline.
    pub fn shutdown(&mut self) {
        if !self.active.is_empty() {
            debug!("Cancelling {} pending cooldowns", self.active.len());
        }
        self.active.clear();
        self.sync_points.clear();
    }

    pub fn set_intensity_multiplier(&mut self, multiplier: f32) {
        self.intensity_multiplier = multiplier.max(0.0);
    }

    pub fn intensity_multiplier(&self) -> f32 {
        self.intensity_multiplier
    }

    pub fn is_cooling_down(&self, id: &str) -> bool {
        self.active.contains_key(id)
    }

    /// Time left before `id` can fire again, `None` if it is not blocked.
    pub fn cooldown_remaining(&self, id: &str, now: Instant) -> Option<Duration> {
        self.active
            .get(id)
            .filter(|handle| !handle.is_expired(now))
            .map(|handle| handle.remaining(now))
    }

    pub fn active_cooldowns(&self) -> usize {
        self.active.len()
    }

    pub fn tick<C, R, A>(&mut self, clock: &C, registry: &R, animator: &mut A) -> Vec<SyncPointId>
    where
        C: PlaybackClock + ?Sized,
        R: ElementRegistry + ?Sized,
        A: AnimationApplier + ?Sized,
    {
        self.tick_at(Instant::now(), clock, registry, animator)
    }

    /// One scheduling step at monotonic time `now`. Returns the ids fired,
    /// in timestamp order.
    pub fn tick_at<C, R, A>(
        &mut self,
        now: Instant,
        clock: &C,
        registry: &R,
        animator: &mut A,
    ) -> Vec<SyncPointId>
    where
        C: PlaybackClock + ?Sized,
        R: ElementRegistry + ?Sized,
        A: AnimationApplier + ?Sized,
    {
        // Lapsed cooldowns re-arm their points
        self.active.retain(|_, handle| !handle.is_expired(now));

        if !clock.is_playing() || self.sync_points.is_empty() {
            return Vec::new();
        }

        let current_time = clock.current_time();
        let window_start = current_time - self.tolerance;
        let window_end = current_time + self.tolerance;
        let first = self.sync_points.partition_point(|p| p.timestamp <= window_start);

        let mut fired = Vec::new();
        for point in self.sync_points[first..]
            .iter()
            .take_while(|p| p.timestamp < window_end)
        {
            if self.active.contains_key(&point.id) {
                continue;
            }

            if !registry.contains(&point.element_id) {
                debug!(
                    "Skipping sync point {}: element '{}' no longer exists",
                    point.id, point.element_id
                );
                continue;
            }

            self.active
                .insert(point.id.clone(), CooldownHandle::new(now, self.cooldown));

            let descriptor = AnimationDescriptor::from_sync_point(point, self.intensity_multiplier);
            match registry.section_of(&point.element_id) {
                Some(section_id) => animator.apply_in_section(section_id, &point.element_id, &descriptor),
                None => animator.apply(&point.element_id, &descriptor),
            }

            debug!(
                "Fired {} ({}) on '{}' at {:.3}s",
                point.id,
                point.action.as_str(),
                point.element_id,
                current_time
            );
            fired.push(point.id.clone());
        }

        fired
    }
}

impl Default for SyncScheduler {
    fn default() -> Self {
        Self::new(&SchedulerConfig::default())
    }
}
