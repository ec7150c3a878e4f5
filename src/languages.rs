//! Transcript language listing.

use serde::{Deserialize, Serialize};

use crate::video_id::VideoId;

/// Whether a transcript was written by a person or generated automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptKind {
    Manual,
    Generated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptLanguage {
    pub code: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TranscriptKind,
}

impl TranscriptLanguage {
    pub fn new(code: impl Into<String>, name: impl Into<String>, kind: TranscriptKind) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            kind,
        }
    }
}

/// Provider metadata for one available transcript.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptionTrack {
    pub language_code: String,
    pub language: String,
    /// `None` when the provider did not say how the track was produced.
    pub is_generated: Option<bool>,
    pub is_translatable: bool,
}

/// All transcripts a provider reports for one video, in provider order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptCatalog {
    pub video_id: VideoId,
    pub tracks: Vec<CaptionTrack>,
}

impl TranscriptCatalog {
    pub fn new(video_id: VideoId, tracks: Vec<CaptionTrack>) -> Self {
        Self { video_id, tracks }
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Split into (manual, generated) groups when every track is classified.
    pub fn grouped(&self) -> Option<(Vec<&CaptionTrack>, Vec<&CaptionTrack>)> {
        let mut manual = Vec::new();
        let mut generated = Vec::new();

        for track in &self.tracks {
            match track.is_generated? {
                true => generated.push(track),
                false => manual.push(track),
            }
        }

        Some((manual, generated))
    }
}

/// Map a catalog to language records: manual tracks first, then generated.
///
/// If the catalog cannot be grouped, every track is reported as generated in
/// provider order. Duplicate language codes are kept.
pub fn list_languages(catalog: &TranscriptCatalog) -> Vec<TranscriptLanguage> {
    let to_language = |track: &CaptionTrack, kind| {
        TranscriptLanguage::new(track.language_code.clone(), track.language.clone(), kind)
    };

    match catalog.grouped() {
        Some((manual, generated)) => manual
            .into_iter()
            .map(|t| to_language(t, TranscriptKind::Manual))
            .chain(generated.into_iter().map(|t| to_language(t, TranscriptKind::Generated)))
            .collect(),
        None => {
            tracing::debug!(
                video_id = %catalog.video_id,
                "Transcript catalog has unclassified tracks, tagging all as generated"
            );
            catalog
                .tracks
                .iter()
                .map(|t| to_language(t, TranscriptKind::Generated))
                .collect()
        }
    }
}

/// Languages offered when the provider cannot enumerate tracks but a
/// transcript is known to exist.
pub fn common_languages() -> Vec<TranscriptLanguage> {
    [
        ("en", "English (Auto-detect)"),
        ("es", "Spanish"),
        ("fr", "French"),
        ("de", "German"),
    ]
    .into_iter()
    .map(|(code, name)| TranscriptLanguage::new(code, name, TranscriptKind::Generated))
    .collect()
}
