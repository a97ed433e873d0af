mod common;

use beat_sync::sync::EmptyReason;
use beat_sync::{
    CommitOutcome, EngineConfig, GenerationStatus, SoundSource, StaticRegistry, SyncSession,
};
use common::{click_audio, silent_audio, ManualClock, MockDecoder, RecordingAnimator};

fn auto_session() -> SyncSession {
    let mut config = EngineConfig::default();
    config.auto_generate = true;
    SyncSession::new(config)
}

#[tokio::test]
async fn test_generate_commits_points() {
    let mut session = SyncSession::default();
    session.set_sound(Some(SoundSource::new("song", "song.wav")));
    let registry = StaticRegistry::from_ids(["a", "b", "c"]);
    let decoder = MockDecoder::new(click_audio(6, 1));

    let outcome = session.generate(&registry, &decoder).await;

    assert_eq!(outcome, CommitOutcome::Applied(6));
    assert_eq!(session.status(), &GenerationStatus::Ready);
    assert_eq!(session.sync_points().len(), 6);
    assert_eq!(session.analysis().unwrap().tempo, 86);
}

#[tokio::test]
async fn test_result_for_previous_sound_is_discarded() {
    let mut session = SyncSession::default();
    session.set_sound(Some(SoundSource::new("first", "first.wav")));
    let registry = StaticRegistry::from_ids(["a"]);
    let decoder = MockDecoder::new(click_audio(6, 1));

    let request = session.begin_generation(&registry).unwrap();
    session.set_sound(Some(SoundSource::new("second", "second.wav")));
    let result = request.run(&decoder).await;
    let finished = result.outcome().as_ref().unwrap();
    assert_eq!(finished.points().len(), 6);

    assert_eq!(session.complete_generation(result), CommitOutcome::Stale);
    assert!(session.sync_points().is_empty());
    assert_eq!(session.status(), &GenerationStatus::Idle);
}

#[tokio::test]
async fn test_superseded_generation_is_discarded() {
    let mut session = SyncSession::default();
    session.set_sound(Some(SoundSource::new("song", "song.wav")));
    let registry = StaticRegistry::from_ids(["a"]);
    let decoder = MockDecoder::new(click_audio(6, 1));

    let old = session.begin_generation(&registry).unwrap();
    session.invalidate_elements();
    let new = session.begin_generation(&StaticRegistry::from_ids(["x", "y"])).unwrap();

    let old_result = old.run(&decoder).await;
    let new_result = new.run(&decoder).await;

    assert_eq!(session.complete_generation(old_result), CommitOutcome::Stale);
    assert_eq!(session.complete_generation(new_result), CommitOutcome::Applied(6));
    assert!(session
        .sync_points()
        .iter()
        .all(|p| p.element_id == "x" || p.element_id == "y"));
}

#[tokio::test]
async fn test_failed_decode_clears_points() {
    let mut session = SyncSession::default();
    session.set_sound(Some(SoundSource::new("song", "song.wav")));
    let registry = StaticRegistry::from_ids(["a"]);

    session.generate(&registry, &MockDecoder::new(click_audio(4, 1))).await;
    assert_eq!(session.sync_points().len(), 4);

    let outcome = session.generate(&registry, &MockDecoder::failing()).await;
    assert!(matches!(outcome, CommitOutcome::Failed(_)));
    assert!(matches!(session.status(), GenerationStatus::Failed(_)));
    assert!(session.sync_points().is_empty());
}

#[tokio::test]
async fn test_invalid_source_fails_without_decoding() {
    let mut session = SyncSession::default();
    session.set_sound(Some(SoundSource {
        id: "empty".to_string(),
        url: Some(String::new()),
        fallback_url: None,
    }));
    let decoder = MockDecoder::new(click_audio(4, 1));

    let outcome = session.generate(&StaticRegistry::from_ids(["a"]), &decoder).await;

    assert!(matches!(outcome, CommitOutcome::Failed(_)));
    assert_eq!(decoder.calls(), 0);
}

#[tokio::test]
async fn test_auto_generation_runs_once_for_silent_track() {
    let mut session = auto_session();
    session.set_sound(Some(SoundSource::new("quiet", "quiet.wav")));
    let registry = StaticRegistry::from_ids(["a"]);
    let decoder = MockDecoder::new(silent_audio(4));

    let request = session.poll_auto_generation(&registry).unwrap();
    let outcome = session.complete_generation(request.run(&decoder).await);
    assert_eq!(outcome, CommitOutcome::Empty(EmptyReason::NoBeats));

    // Points are still empty, but the session must not loop
    for _ in 0..10 {
        assert!(session.poll_auto_generation(&registry).is_none());
    }
    assert_eq!(decoder.calls(), 1);
}

#[tokio::test]
async fn test_auto_generation_does_not_retry_failures() {
    let mut session = auto_session();
    session.set_sound(Some(SoundSource::new("broken", "broken.mp3")));
    let registry = StaticRegistry::from_ids(["a"]);

    let request = session.poll_auto_generation(&registry).unwrap();
    session.complete_generation(request.run(&MockDecoder::failing()).await);

    assert!(matches!(session.status(), GenerationStatus::Failed(_)));
    assert!(session.poll_auto_generation(&registry).is_none());

    // a new sound is a fresh start
    session.set_sound(Some(SoundSource::new("fixed", "fixed.mp3")));
    assert!(session.poll_auto_generation(&registry).is_some());
}

#[tokio::test]
async fn test_element_invalidation_rearms_auto_generation() {
    let mut session = auto_session();
    session.set_sound(Some(SoundSource::new("song", "song.wav")));
    let registry = StaticRegistry::from_ids(["a"]);
    let decoder = MockDecoder::new(click_audio(4, 1));

    let request = session.poll_auto_generation(&registry).unwrap();
    session.complete_generation(request.run(&decoder).await);
    assert_eq!(session.sync_points().len(), 4);
    assert!(session.poll_auto_generation(&registry).is_none());

    session.invalidate_elements();
    assert!(session.sync_points().is_empty());
    assert!(session.poll_auto_generation(&registry).is_some());
}

#[tokio::test]
async fn test_clear_then_tick_fires_nothing() {
    let mut session = SyncSession::default();
    session.set_sound(Some(SoundSource::new("song", "song.wav")));
    let registry = StaticRegistry::from_ids(["a"]);
    session
        .generate(&registry, &MockDecoder::new(click_audio(4, 1)))
        .await;
    let first = session.sync_points()[0].timestamp;

    session.clear();

    let mut animator = RecordingAnimator::default();
    assert!(session
        .tick(&ManualClock::at(first), &registry, &mut animator)
        .is_empty());
    assert!(animator.applied.is_empty());
}

#[tokio::test]
async fn test_generation_runs_on_spawned_task() {
    let mut session = SyncSession::default();
    session.set_sound(Some(SoundSource::new("song", "song.wav")));
    let registry = StaticRegistry::from_ids(["a", "b"]);

    let request = session.begin_generation(&registry).unwrap();
    let decoder = MockDecoder::new(click_audio(5, 1));
    let result = tokio::spawn(async move { request.run(&decoder).await })
        .await
        .unwrap();

    assert_eq!(session.complete_generation(result), CommitOutcome::Applied(5));
}

#[tokio::test]
async fn test_generate_while_in_flight_is_busy() {
    let mut session = SyncSession::default();
    session.set_sound(Some(SoundSource::new("song", "song.wav")));
    let registry = StaticRegistry::from_ids(["a"]);
    let decoder = MockDecoder::new(click_audio(4, 1));

    let pending = session.begin_generation(&registry).unwrap();
    assert_eq!(pending.elements().len(), 1);

    assert_eq!(session.generate(&registry, &decoder).await, CommitOutcome::Busy);
    assert_eq!(session.status(), &GenerationStatus::Generating);
    assert_eq!(decoder.calls(), 0);

    // the outstanding request still lands
    let result = pending.run(&decoder).await;
    assert_eq!(session.complete_generation(result), CommitOutcome::Applied(4));
}
