mod common;

use std::time::{Duration, Instant};

use beat_sync::config::SchedulerConfig;
use beat_sync::{ElementEntry, StaticRegistry, SyncPointGenerator, SyncScheduler};
use common::{click_audio, ManualClock, RecordingAnimator};

fn scheduler_with_clicks(ids: &[&str]) -> SyncScheduler {
    let elements: Vec<ElementEntry> = ids.iter().map(|id| ElementEntry::new(*id)).collect();
    let points = SyncPointGenerator::default()
        .generate_from_audio(&click_audio(8, 1), &elements)
        .into_points();

    let mut scheduler = SyncScheduler::default();
    scheduler.set_sync_points(points);
    scheduler
}

#[test]
fn test_playthrough_fires_each_point_once() {
    let mut scheduler = scheduler_with_clicks(&["a", "b"]);
    let registry = StaticRegistry::from_ids(["a", "b"]);
    let mut animator = RecordingAnimator::default();
    let start = Instant::now();

    // 60 fps over 6 seconds of track time
    for frame in 0..360 {
        let t = frame as f64 / 60.0;
        let now = start + Duration::from_secs_f64(t);
        scheduler.tick_at(now, &ManualClock::at(t), &registry, &mut animator);
    }

    assert_eq!(animator.applied.len(), 8);
    let targets: Vec<&str> = animator.applied.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(targets, vec!["a", "b", "a", "b", "a", "b", "a", "b"]);
    assert_eq!(animator.applied[0].1.kind, "highlight");
    assert_eq!(animator.applied[4].1.kind, "transform");
}

#[test]
fn test_seek_back_does_not_bypass_cooldown() {
    let mut scheduler = scheduler_with_clicks(&["a"]);
    let registry = StaticRegistry::from_ids(["a"]);
    let mut animator = RecordingAnimator::default();
    let start = Instant::now();
    let beat = scheduler.sync_points()[1].timestamp;

    assert_eq!(
        scheduler.tick_at(start, &ManualClock::at(beat), &registry, &mut animator).len(),
        1
    );

    // user scrubs forward then straight back onto the same beat
    let later = start + Duration::from_millis(100);
    scheduler.tick_at(later, &ManualClock::at(beat + 3.0), &registry, &mut animator);
    let back = start + Duration::from_millis(200);
    assert!(scheduler
        .tick_at(back, &ManualClock::at(beat), &registry, &mut animator)
        .is_empty());

    let rearmed = start + Duration::from_millis(500);
    assert_eq!(
        scheduler.tick_at(rearmed, &ManualClock::at(beat), &registry, &mut animator).len(),
        1
    );
}

#[test]
fn test_clear_stops_all_triggers() {
    let mut scheduler = scheduler_with_clicks(&["a"]);
    let registry = StaticRegistry::from_ids(["a"]);
    let mut animator = RecordingAnimator::default();
    let beats: Vec<f64> = scheduler.sync_points().iter().map(|p| p.timestamp).collect();

    scheduler.clear();

    let start = Instant::now();
    for (i, beat) in beats.iter().enumerate() {
        let now = start + Duration::from_secs(i as u64);
        assert!(scheduler
            .tick_at(now, &ManualClock::at(*beat), &registry, &mut animator)
            .is_empty());
    }
    assert!(animator.applied.is_empty());
}

#[test]
fn test_removed_element_is_skipped() {
    let mut scheduler = scheduler_with_clicks(&["a", "b"]);
    let mut registry = StaticRegistry::from_ids(["a", "b"]);
    let mut animator = RecordingAnimator::default();
    let second = scheduler.sync_points()[1].clone();

    registry.remove("b");
    let fired = scheduler.tick_at(
        Instant::now(),
        &ManualClock::at(second.timestamp),
        &registry,
        &mut animator,
    );

    assert!(fired.is_empty());
    assert!(!scheduler.is_cooling_down(&second.id));

    registry.insert(ElementEntry::new("b"));
    let fired = scheduler.tick_at(
        Instant::now(),
        &ManualClock::at(second.timestamp),
        &registry,
        &mut animator,
    );
    assert_eq!(fired, vec![second.id]);
}

#[test]
fn test_configured_tolerance_and_cooldown() {
    let config = SchedulerConfig {
        tolerance_seconds: 0.2,
        cooldown_ms: 50,
        intensity_multiplier: 2.0,
    };
    let mut scheduler = SyncScheduler::new(&config);
    let points = SyncPointGenerator::default()
        .generate_from_audio(&click_audio(3, 1), &[ElementEntry::new("a")])
        .into_points();
    let beat = points[1].timestamp;
    scheduler.set_sync_points(points);

    let registry = StaticRegistry::from_ids(["a"]);
    let mut animator = RecordingAnimator::default();
    let start = Instant::now();

    assert_eq!(
        scheduler.tick_at(start, &ManualClock::at(beat - 0.15), &registry, &mut animator).len(),
        1
    );
    let intensity = animator.applied[0].1.intensity().unwrap();
    assert!((intensity - 1.4).abs() < 1e-6);

    let rearmed = start + Duration::from_millis(50);
    assert_eq!(
        scheduler.tick_at(rearmed, &ManualClock::at(beat), &registry, &mut animator).len(),
        1
    );
}

#[test]
fn test_paused_playback_fires_nothing() {
    let mut scheduler = scheduler_with_clicks(&["a"]);
    let registry = StaticRegistry::from_ids(["a"]);
    let mut animator = RecordingAnimator::default();
    let clock = ManualClock {
        playing: false,
        time: scheduler.sync_points()[0].timestamp,
    };

    assert!(scheduler.tick(&clock, &registry, &mut animator).is_empty());
}
