use anyhow::{bail, Result};
use clap::Parser;
use log::{info, warn};
use serde::Serialize;

use beat_sync::audio::AudioDescriptors;
use beat_sync::{
    CommitOutcome, EngineConfig, FileDecoder, SoundSource, StaticRegistry, SyncPoint, SyncSession,
};

#[derive(Parser)]
#[command(name = "beat-sync")]
#[command(about = "Detect beats in an audio file and build an element sync timeline")]
struct Args {
    /// Audio file to analyze (MP3, WAV, M4A, OGG, etc.)
    #[arg()]
    input_file: String,

    /// Comma-separated element ids to distribute beats over
    #[arg(short, long, value_delimiter = ',', default_value = "title-text,hero-image,bg-main")]
    elements: Vec<String>,

    /// Engine configuration (JSON)
    #[arg(short, long)]
    config: Option<String>,

    /// Write the timeline here instead of stdout
    #[arg(short, long)]
    output: Option<String>,

    /// Write the effective configuration to this path and exit
    #[arg(long)]
    dump_config: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SyncReport<'a> {
    file: &'a str,
    duration: f64,
    tempo: u32,
    descriptors: &'a AudioDescriptors,
    beats: &'a [f64],
    sync_points: &'a [SyncPoint],
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => {
            info!("Loading config from {}", path);
            EngineConfig::load(path)?
        }
        None => EngineConfig::default(),
    };
    config.validate()?;

    if let Some(path) = &args.dump_config {
        config.save(path)?;
        info!("Configuration written to {}", path);
        return Ok(());
    }

    info!("🎵 Beat sync: {}", args.input_file);
    info!("Elements: {}", args.elements.join(", "));

    let registry = StaticRegistry::from_ids(args.elements.iter().map(|e| e.trim()).filter(|e| !e.is_empty()));
    let mut session = SyncSession::new(config);
    session.set_sound(Some(SoundSource::new("input", args.input_file.as_str())));

    match session.generate(&registry, &FileDecoder::new()).await {
        CommitOutcome::Applied(count) => info!("✅ {} sync points generated", count),
        CommitOutcome::Empty(reason) => warn!("No sync points generated: {:?}", reason),
        CommitOutcome::Failed(message) => bail!("Sync point generation failed: {}", message),
        CommitOutcome::Stale => bail!("Generation was superseded"),
        CommitOutcome::Busy => bail!("A generation is already running"),
    }

    let Some(analysis) = session.analysis() else {
        bail!("No analysis available for {}", args.input_file);
    };

    info!("Duration: {:.2} seconds", analysis.duration_seconds);
    info!("Beats detected: {}", analysis.beats.len());
    info!("Tempo: {} BPM", analysis.tempo);
    info!(
        "Energy {:.3}, valence {:.3}, danceability {:.3}",
        analysis.descriptors.energy, analysis.descriptors.valence, analysis.descriptors.danceability
    );

    let report = SyncReport {
        file: &args.input_file,
        duration: analysis.duration_seconds,
        tempo: analysis.tempo,
        descriptors: &analysis.descriptors,
        beats: &analysis.beats,
        sync_points: session.sync_points(),
    };
    let json = serde_json::to_string_pretty(&report)?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, json)?;
            info!("Timeline saved to {}", path);
        }
        None => println!("{}", json),
    }

    Ok(())
}
