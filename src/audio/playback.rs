use anyhow::Result;
use log::info;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sample, Sink, Source};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Read-only view of the playback position.
///
/// The engine never mutates playback; it only asks where the transport is.
pub trait PlaybackClock {
    fn is_playing(&self) -> bool;

    /// Seconds from the start of the track.
    fn current_time(&self) -> f64;
}

/// Wall-clock transport: tracks position from `Instant` deltas while playing.
#[derive(Debug, Clone, Default)]
pub struct PlaybackTimer {
    started_at: Option<Instant>,
    offset: f64,
}

impl PlaybackTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn play(&mut self) {
        if self.started_at.is_none() {
            self.started_at = Some(Instant::now());
        }
    }

    pub fn pause(&mut self) {
        if let Some(started_at) = self.started_at.take() {
            self.offset += started_at.elapsed().as_secs_f64();
        }
    }

    pub fn seek(&mut self, seconds: f64) {
        self.offset = seconds.max(0.0);
        if self.started_at.is_some() {
            self.started_at = Some(Instant::now());
        }
    }

    pub fn stop(&mut self) {
        self.started_at = None;
        self.offset = 0.0;
    }
}

impl PlaybackClock for PlaybackTimer {
    fn is_playing(&self) -> bool {
        self.started_at.is_some()
    }

    fn current_time(&self) -> f64 {
        self.offset
            + self
                .started_at
                .map_or(0.0, |started_at| started_at.elapsed().as_secs_f64())
    }
}

/// Shared count of samples the output device has pulled from a source.
#[derive(Debug, Clone)]
pub struct PlayedSamples {
    count: Arc<AtomicU64>,
    channels: u16,
    sample_rate: u32,
}

impl PlayedSamples {
    fn new(channels: u16, sample_rate: u32) -> Self {
        Self {
            count: Arc::new(AtomicU64::new(0)),
            channels: channels.max(1),
            sample_rate: sample_rate.max(1),
        }
    }

    pub fn seconds(&self) -> f64 {
        let frames = self.count.load(Ordering::Relaxed) / self.channels as u64;
        frames as f64 / self.sample_rate as f64
    }
}

/// Source adapter that counts every sample handed to the mixer.
pub struct PositionTracked<S> {
    inner: S,
    played: PlayedSamples,
}

impl<S> PositionTracked<S>
where
    S: Source,
    S::Item: Sample,
{
    pub fn new(inner: S) -> Self {
        let played = PlayedSamples::new(inner.channels(), inner.sample_rate());
        Self { inner, played }
    }

    pub fn played(&self) -> PlayedSamples {
        self.played.clone()
    }
}

impl<S> Iterator for PositionTracked<S>
where
    S: Source,
    S::Item: Sample,
{
    type Item = S::Item;

    fn next(&mut self) -> Option<Self::Item> {
        let sample = self.inner.next()?;
        self.played.count.fetch_add(1, Ordering::Relaxed);
        Some(sample)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<S> Source for PositionTracked<S>
where
    S: Source,
    S::Item: Sample,
{
    fn current_frame_len(&self) -> Option<usize> {
        self.inner.current_frame_len()
    }

    fn channels(&self) -> u16 {
        self.inner.channels()
    }

    fn sample_rate(&self) -> u32 {
        self.inner.sample_rate()
    }

    fn total_duration(&self) -> Option<Duration> {
        self.inner.total_duration()
    }
}

/// Audible playback through the default output device.
///
/// The position is the number of samples the device has consumed, so it
/// stays with the audio across underruns and stalls. It runs ahead of what
/// is audible by the output buffer, typically a few milliseconds.
pub struct AudioPlayback {
    #[allow(dead_code)]
    stream: OutputStream,
    stream_handle: OutputStreamHandle,
    sink: Option<Sink>,
    played: Option<PlayedSamples>,
}

impl AudioPlayback {
    pub fn new() -> Result<Self> {
        let (stream, stream_handle) = OutputStream::try_default()?;

        Ok(Self {
            stream,
            stream_handle,
            sink: None,
            played: None,
        })
    }

    pub fn load_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let file = BufReader::new(File::open(&path)?);
        let source = PositionTracked::new(Decoder::new(file)?);
        let played = source.played();
        let sink = Sink::try_new(&self.stream_handle)?;
        sink.append(source);
        sink.pause();

        info!("Loaded audio file for playback: {:?}", path.as_ref());
        self.sink = Some(sink);
        self.played = Some(played);

        Ok(())
    }

    pub fn play(&mut self) {
        if let Some(sink) = &self.sink {
            sink.play();
            info!("Audio playback started");
        }
    }

    pub fn pause(&mut self) {
        if let Some(sink) = &self.sink {
            sink.pause();
            info!("Audio playback paused");
        }
    }

    pub fn stop(&mut self) {
        if let Some(sink) = &self.sink {
            sink.stop();
            info!("Audio playback stopped");
        }
        self.sink = None;
        self.played = None;
    }

    pub fn set_volume(&self, volume: f32) {
        if let Some(sink) = &self.sink {
            sink.set_volume(volume.clamp(0.0, 1.0));
        }
    }

    pub fn is_finished(&self) -> bool {
        self.sink.as_ref().map_or(true, |sink| sink.empty())
    }
}

impl PlaybackClock for AudioPlayback {
    fn is_playing(&self) -> bool {
        self.sink.as_ref().map_or(false, |sink| !sink.is_paused() && !sink.empty())
    }

    fn current_time(&self) -> f64 {
        self.played.as_ref().map_or(0.0, PlayedSamples::seconds)
    }
}
