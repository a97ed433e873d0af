#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::f32::consts::PI;
use std::sync::atomic::{AtomicUsize, Ordering};

use beat_sync::{AnimationApplier, AnimationDescriptor, AudioDecoder, DecodedAudio, PlaybackClock};

pub const RATE: u32 = 8000;
/// One detector window at the default 0.35 s
pub const WINDOW: usize = 2800;

/// `pulses` windows of 60 Hz tone, each followed by `gap` silent windows.
pub fn click_track(pulses: usize, gap: usize) -> Vec<f32> {
    let mut samples = Vec::new();
    for _ in 0..pulses {
        samples.extend((0..WINDOW).map(|i| 0.9 * (2.0 * PI * 60.0 * i as f32 / RATE as f32).sin()));
        samples.extend(std::iter::repeat(0.0).take(WINDOW * gap));
    }
    samples
}

pub fn click_audio(pulses: usize, gap: usize) -> DecodedAudio {
    DecodedAudio::new(click_track(pulses, gap), RATE)
}

pub fn silent_audio(seconds: usize) -> DecodedAudio {
    DecodedAudio::new(vec![0.0; RATE as usize * seconds], RATE)
}

/// Decoder that hands back canned audio and counts how often it was asked.
pub struct MockDecoder {
    audio: Option<DecodedAudio>,
    calls: AtomicUsize,
}

impl MockDecoder {
    pub fn new(audio: DecodedAudio) -> Self {
        Self {
            audio: Some(audio),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            audio: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AudioDecoder for MockDecoder {
    async fn decode(&self, location: &str) -> Result<DecodedAudio> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.audio
            .clone()
            .ok_or_else(|| anyhow!("cannot decode {}", location))
    }
}

/// Clock whose position the test sets by hand.
pub struct ManualClock {
    pub playing: bool,
    pub time: f64,
}

impl ManualClock {
    pub fn at(time: f64) -> Self {
        Self { playing: true, time }
    }
}

impl PlaybackClock for ManualClock {
    fn is_playing(&self) -> bool {
        self.playing
    }

    fn current_time(&self) -> f64 {
        self.time
    }
}

#[derive(Default)]
pub struct RecordingAnimator {
    pub applied: Vec<(String, AnimationDescriptor)>,
}

impl AnimationApplier for RecordingAnimator {
    fn apply_in_section(&mut self, _section_id: &str, element_id: &str, descriptor: &AnimationDescriptor) {
        self.applied.push((element_id.to_string(), descriptor.clone()));
    }

    fn apply(&mut self, element_id: &str, descriptor: &AnimationDescriptor) {
        self.applied.push((element_id.to_string(), descriptor.clone()));
    }
}
