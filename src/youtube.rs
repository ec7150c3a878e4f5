//! YouTube captions over the InnerTube player API.

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, warn};

use crate::captions::CaptionEntry;
use crate::languages::{CaptionTrack, TranscriptCatalog};
use crate::provider::{CaptionProvider, ProviderError, ProviderResult};
use crate::video_id::VideoId;

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

const DEFAULT_LANGUAGE: &str = "en";

static API_KEY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""INNERTUBE_API_KEY"\s*:\s*"([^"]+)""#).expect("valid api key pattern")
});

static API_KEY_FALLBACK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"innertubeApiKey\s*[=:]\s*"([^"]+)""#).expect("valid api key pattern")
});

#[derive(Debug, Deserialize)]
struct PlayerResponse {
    #[serde(rename = "playabilityStatus")]
    playability_status: Option<PlayabilityStatus>,
    captions: Option<CaptionsData>,
}

#[derive(Debug, Deserialize)]
struct PlayabilityStatus {
    status: String,
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CaptionsData {
    #[serde(rename = "playerCaptionsTracklistRenderer")]
    player_captions_tracklist_renderer: Option<CaptionTracklistRenderer>,
}

#[derive(Debug, Deserialize)]
struct CaptionTracklistRenderer {
    #[serde(rename = "captionTracks")]
    caption_tracks: Option<Vec<RawTrack>>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawTrack {
    #[serde(rename = "baseUrl")]
    base_url: String,
    #[serde(rename = "languageCode")]
    language_code: String,
    name: Option<TrackName>,
    kind: Option<String>,
    #[serde(rename = "isTranslatable", default)]
    is_translatable: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct TrackName {
    #[serde(rename = "simpleText")]
    simple_text: Option<String>,
    runs: Option<Vec<TextRun>>,
}

#[derive(Debug, Clone, Deserialize)]
struct TextRun {
    text: String,
}

impl RawTrack {
    fn is_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }

    fn display_name(&self) -> String {
        self.name
            .as_ref()
            .and_then(|name| {
                name.simple_text.clone().or_else(|| {
                    name.runs
                        .as_ref()
                        .map(|runs| runs.iter().map(|r| r.text.as_str()).collect::<String>())
                })
            })
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| self.language_code.clone())
    }

    fn caption_url(&self) -> String {
        self.base_url.replace("&fmt=srv3", "")
    }

    fn to_track(&self) -> CaptionTrack {
        CaptionTrack {
            language_code: self.language_code.clone(),
            language: self.display_name(),
            is_generated: Some(self.is_generated()),
            is_translatable: self.is_translatable,
        }
    }
}

/// Captions provider backed by YouTube's web player API.
#[derive(Clone)]
pub struct InnerTubeProvider {
    client: reqwest::Client,
}

impl InnerTubeProvider {
    pub fn new(timeout: Duration) -> ProviderResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }

    async fn caption_tracks(&self, video_id: &VideoId) -> ProviderResult<Vec<RawTrack>> {
        let watch_url = video_id.watch_url();
        debug!(video_id = %video_id, "Fetching watch page");

        let page_html = self
            .client
            .get(&watch_url)
            .header("Accept-Language", "en-US")
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        if page_html.contains("class=\"g-recaptcha\"") {
            return Err(ProviderError::Failure(
                "YouTube is blocking requests from this address".to_string(),
            ));
        }

        let api_key = extract_api_key(&page_html)?;
        let player_url = format!(
            "https://www.youtube.com/youtubei/v1/player?key={}&prettyPrint=false",
            api_key
        );

        let body = serde_json::json!({
            "context": {
                "client": {
                    "hl": "en",
                    "gl": "US",
                    "clientName": "WEB",
                    "clientVersion": "2.20241126.01.00"
                }
            },
            "videoId": video_id.as_str()
        });

        let response: PlayerResponse = self
            .client
            .post(&player_url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        tracks_from_player_response(response)
    }
}

#[async_trait]
impl CaptionProvider for InnerTubeProvider {
    async fn fetch_captions(
        &self,
        video_id: &VideoId,
        language: Option<&str>,
    ) -> ProviderResult<Vec<CaptionEntry>> {
        let tracks = self.caption_tracks(video_id).await?;
        let track = select_track(&tracks, language)?;
        debug!(
            video_id = %video_id,
            language = %track.language_code,
            generated = track.is_generated(),
            "Fetching caption track"
        );

        let caption_xml = self
            .client
            .get(track.caption_url())
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        parse_caption_xml(&caption_xml)
    }

    async fn list_transcripts(&self, video_id: &VideoId) -> ProviderResult<TranscriptCatalog> {
        let tracks = self.caption_tracks(video_id).await?;
        Ok(TranscriptCatalog::new(
            video_id.clone(),
            tracks.iter().map(RawTrack::to_track).collect(),
        ))
    }
}

fn extract_api_key(html: &str) -> ProviderResult<String> {
    API_KEY_PATTERN
        .captures(html)
        .or_else(|| API_KEY_FALLBACK_PATTERN.captures(html))
        .map(|caps| caps[1].to_string())
        .ok_or_else(|| {
            ProviderError::Failure("could not extract InnerTube API key from watch page".to_string())
        })
}

fn tracks_from_player_response(response: PlayerResponse) -> ProviderResult<Vec<RawTrack>> {
    let tracks = response
        .captions
        .and_then(|c| c.player_captions_tracklist_renderer)
        .and_then(|r| r.caption_tracks)
        .unwrap_or_default();

    if !tracks.is_empty() {
        return Ok(tracks);
    }

    match response.playability_status {
        Some(status) if status.status != "OK" => {
            let reason = status.reason.unwrap_or_else(|| status.status.clone());
            if reason.contains("not a bot") {
                warn!(reason = %reason, "YouTube requested bot verification");
                return Err(ProviderError::Failure(reason));
            }
            Err(ProviderError::VideoUnavailable(reason))
        }
        _ => Err(ProviderError::TranscriptsDisabled),
    }
}

/// Pick the track to download.
///
/// A requested language prefers a manual track over a generated one. Without
/// a request, English is used when present, otherwise the first track.
fn select_track<'a>(tracks: &'a [RawTrack], language: Option<&str>) -> ProviderResult<&'a RawTrack> {
    match language {
        Some(code) => find_track(tracks, code).ok_or_else(|| ProviderError::NoTranscriptFound {
            requested: Some(code.to_string()),
        }),
        None => find_track(tracks, DEFAULT_LANGUAGE)
            .or_else(|| tracks.first())
            .ok_or(ProviderError::NoTranscriptFound { requested: None }),
    }
}

fn find_track<'a>(tracks: &'a [RawTrack], code: &str) -> Option<&'a RawTrack> {
    tracks
        .iter()
        .find(|t| t.language_code == code && !t.is_generated())
        .or_else(|| tracks.iter().find(|t| t.language_code == code))
}

fn parse_caption_xml(xml: &str) -> ProviderResult<Vec<CaptionEntry>> {
    use quick_xml::events::Event;
    use quick_xml::Reader;

    let mut reader = Reader::from_str(xml);
    let mut entries = Vec::new();
    let mut current: Option<(f64, f64)> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"text" => {
                let mut start = None;
                let mut duration = 0.0;
                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"start" => start = String::from_utf8_lossy(&attr.value).parse::<f64>().ok(),
                        b"dur" => {
                            duration = String::from_utf8_lossy(&attr.value)
                                .parse::<f64>()
                                .unwrap_or(0.0)
                        }
                        _ => {}
                    }
                }
                current = start.map(|s| (s, duration));
            }
            Ok(Event::Text(ref e)) => {
                if let Some((start, duration)) = current.take() {
                    let raw_text = e.unescape().unwrap_or_default().to_string();
                    let text = html_escape::decode_html_entities(&raw_text).trim().to_string();
                    if !text.is_empty() {
                        entries.push(CaptionEntry { start, duration, text });
                    }
                }
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"text" => current = None,
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ProviderError::Failure(format!("error parsing caption XML: {}", e)))
            }
            _ => {}
        }
    }

    Ok(entries)
}
