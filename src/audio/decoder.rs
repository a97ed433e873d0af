use anyhow::Result;
use async_trait::async_trait;
use log::info;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use super::DecodedAudio;
use crate::error::SyncError;

/// Reference to the sound selected in the editing session.
///
/// Either `url` or `fallback_url` must be set; `url` wins when both are.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoundSource {
    pub id: String,
    pub url: Option<String>,
    pub fallback_url: Option<String>,
}

impl SoundSource {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: Some(url.into()),
            fallback_url: None,
        }
    }

    pub fn with_fallback(mut self, fallback_url: impl Into<String>) -> Self {
        self.fallback_url = Some(fallback_url.into());
        self
    }

    /// The location to decode from, or `InvalidSoundSource` if none is usable.
    pub fn resolve(&self) -> Result<&str, SyncError> {
        [self.url.as_deref(), self.fallback_url.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|location| !location.is_empty())
            .ok_or(SyncError::InvalidSoundSource)
    }

    /// Identity used to tell whether a finished generation still belongs to
    /// the current sound.
    pub fn identity(&self) -> String {
        match self.resolve() {
            Ok(location) => format!("{}@{}", self.id, location),
            Err(_) => self.id.clone(),
        }
    }
}

/// Turns a resolved sound location into mono PCM.
#[async_trait]
pub trait AudioDecoder: Send + Sync {
    async fn decode(&self, location: &str) -> Result<DecodedAudio>;
}

/// Decodes local files with rodio's symphonia backend (WAV, MP3, OGG, M4A, ...).
#[derive(Debug, Default, Clone, Copy)]
pub struct FileDecoder;

impl FileDecoder {
    pub fn new() -> Self {
        Self
    }

    fn load_audio_file<P: AsRef<Path>>(path: P) -> Result<DecodedAudio> {
        use rodio::{Decoder, Source};

        let file = BufReader::new(File::open(&path)?);
        let source = Decoder::new(file)?;

        let sample_rate = source.sample_rate();
        let channels = source.channels();
        let samples: Vec<i16> = source.convert_samples().collect();

        let interleaved: Vec<f32> = samples.iter().map(|&s| s as f32 / 32768.0).collect();
        let audio = DecodedAudio::from_interleaved(&interleaved, channels, sample_rate);

        info!(
            "Decoded {:?}: {} Hz, {} channels, {:.2}s",
            path.as_ref(),
            sample_rate,
            channels,
            audio.duration_seconds()
        );

        Ok(audio)
    }
}

#[async_trait]
impl AudioDecoder for FileDecoder {
    async fn decode(&self, location: &str) -> Result<DecodedAudio> {
        if location.starts_with("http://") || location.starts_with("https://") {
            return Err(SyncError::Decode(format!("remote sources are not supported: {}", location)).into());
        }

        let path = location.strip_prefix("file://").unwrap_or(location).to_string();
        let audio = tokio::task::spawn_blocking(move || Self::load_audio_file(path)).await??;
        Ok(audio)
    }
}
