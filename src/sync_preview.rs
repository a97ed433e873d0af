use anyhow::{bail, Result};
use clap::Parser;
use log::{info, warn};
use std::time::Duration;

use beat_sync::{
    AnimationApplier, AnimationDescriptor, AudioPlayback, CommitOutcome, EngineConfig, FileDecoder,
    PlaybackClock, PlaybackTimer, SoundSource, StaticRegistry, SyncSession,
};

#[derive(Parser)]
#[command(name = "sync-preview")]
#[command(about = "Play a sync timeline against the clock and log every animation it fires")]
struct Args {
    /// Audio file to preview
    #[arg()]
    input_file: String,

    /// Comma-separated element ids to distribute beats over
    #[arg(short, long, value_delimiter = ',', default_value = "title-text,hero-image,bg-main")]
    elements: Vec<String>,

    /// Engine configuration (JSON)
    #[arg(short, long)]
    config: Option<String>,

    /// Play the audio through the default output device
    #[arg(long)]
    play: bool,

    /// Playback volume when --play is set
    #[arg(long, default_value = "0.5")]
    volume: f32,

    /// Global intensity multiplier for fired animations
    #[arg(long)]
    intensity: Option<f32>,

    /// Scheduler ticks per second
    #[arg(long, default_value = "60")]
    fps: u32,
}

/// Either a silent wall-clock transport or real audio output.
enum Transport {
    Silent(PlaybackTimer),
    Audible(AudioPlayback),
}

impl Transport {
    fn play(&mut self) {
        match self {
            Transport::Silent(timer) => timer.play(),
            Transport::Audible(playback) => playback.play(),
        }
    }

    fn stop(&mut self) {
        match self {
            Transport::Silent(timer) => timer.stop(),
            Transport::Audible(playback) => playback.stop(),
        }
    }

    fn finished(&self, duration: f64) -> bool {
        match self {
            Transport::Silent(timer) => timer.current_time() > duration,
            Transport::Audible(playback) => playback.is_finished(),
        }
    }
}

impl PlaybackClock for Transport {
    fn is_playing(&self) -> bool {
        match self {
            Transport::Silent(timer) => timer.is_playing(),
            Transport::Audible(playback) => playback.is_playing(),
        }
    }

    fn current_time(&self) -> f64 {
        match self {
            Transport::Silent(timer) => timer.current_time(),
            Transport::Audible(playback) => playback.current_time(),
        }
    }
}

#[derive(Default)]
struct LoggingAnimator {
    fired: usize,
}

impl LoggingAnimator {
    fn log(&mut self, target: &str, descriptor: &AnimationDescriptor) {
        self.fired += 1;
        info!(
            "🥁 {:<10} {:<24} intensity {:.2} ({}, {:.2}s)",
            descriptor.kind,
            target,
            descriptor.intensity().unwrap_or_default(),
            descriptor.easing,
            descriptor.duration
        );
    }
}

impl AnimationApplier for LoggingAnimator {
    fn apply_in_section(&mut self, section_id: &str, element_id: &str, descriptor: &AnimationDescriptor) {
        self.log(&format!("{}/{}", section_id, element_id), descriptor);
    }

    fn apply(&mut self, element_id: &str, descriptor: &AnimationDescriptor) {
        self.log(element_id, descriptor);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if let Some(intensity) = args.intensity {
        config.scheduler.intensity_multiplier = intensity;
    }
    config.auto_generate = true;
    config.validate()?;

    let registry = StaticRegistry::from_ids(args.elements.iter().map(|e| e.trim()).filter(|e| !e.is_empty()));
    let mut session = SyncSession::new(config);
    session.set_sound(Some(SoundSource::new("preview", args.input_file.as_str())));

    info!("🎵 Preparing sync preview for {}", args.input_file);

    let Some(request) = session.poll_auto_generation(&registry) else {
        bail!("Nothing to generate: check the element list and input file");
    };
    info!("Analyzing for {} elements", request.elements().len());
    let decoder = FileDecoder::new();
    let result = tokio::spawn(async move { request.run(&decoder).await }).await?;

    match session.complete_generation(result) {
        CommitOutcome::Applied(count) => info!("✅ {} sync points ready", count),
        CommitOutcome::Empty(reason) => {
            warn!("Nothing to preview: {:?}", reason);
            return Ok(());
        }
        CommitOutcome::Failed(message) => bail!("Sync point generation failed: {}", message),
        CommitOutcome::Stale => bail!("Generation was superseded"),
        CommitOutcome::Busy => bail!("A generation is already running"),
    }

    let duration = session.analysis().map_or(0.0, |a| a.duration_seconds);
    if let Some(analysis) = session.analysis() {
        info!("Tempo {} BPM over {:.2}s", analysis.tempo, duration);
    }

    let mut transport = if args.play {
        let mut playback = AudioPlayback::new()?;
        playback.load_file(&args.input_file)?;
        playback.set_volume(args.volume);
        Transport::Audible(playback)
    } else {
        Transport::Silent(PlaybackTimer::new())
    };

    let mut animator = LoggingAnimator::default();
    let mut ticker = tokio::time::interval(Duration::from_secs_f64(1.0 / args.fps.max(1) as f64));

    transport.play();
    info!("▶️  Preview started");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                session.tick(&transport, &registry, &mut animator);
                if transport.finished(duration) {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    transport.stop();
    session.shutdown();
    info!("⏹️  Preview finished, {} animations fired", animator.fired);

    Ok(())
}
