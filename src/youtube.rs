use std::future::Future;

use log::{debug, info};
use regex::Regex;
use serde::Deserialize;

use crate::{Segment, TrackKind, Transcript, TranscriptError, extract_video_id};

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

const DEFAULT_BASE_URL: &str = "https://www.youtube.com";

/// Speech-recognition tracks carry `"kind": "asr"` in the player response
const GENERATED_KIND: &str = "asr";

#[derive(Debug, Deserialize)]
struct InnerTubePlayerResponse {
    captions: Option<CaptionsData>,
}

#[derive(Debug, Deserialize)]
struct CaptionsData {
    #[serde(rename = "playerCaptionsTracklistRenderer")]
    player_captions_tracklist_renderer: Option<CaptionTracklistRenderer>,
}

#[derive(Debug, Deserialize)]
struct CaptionTracklistRenderer {
    #[serde(rename = "captionTracks")]
    caption_tracks: Option<Vec<CaptionTrack>>,
}

/// One caption track advertised for a video
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CaptionTrack {
    #[serde(rename = "baseUrl")]
    pub base_url: String,
    #[serde(rename = "languageCode")]
    pub language_code: String,
    #[serde(default)]
    pub kind: Option<String>,
}

impl CaptionTrack {
    pub fn track_kind(&self) -> TrackKind {
        match self.kind.as_deref() {
            Some(GENERATED_KIND) => TrackKind::Generated,
            _ => TrackKind::Manual,
        }
    }
}

/// Backend that lists and downloads caption tracks for a video ID
pub trait CaptionSource {
    fn list_tracks(&self, video_id: &str) -> impl Future<Output = Result<Vec<CaptionTrack>, TranscriptError>> + Send;

    fn fetch_track(&self, track: &CaptionTrack) -> impl Future<Output = Result<Vec<Segment>, TranscriptError>> + Send;
}

/// Caption source backed by YouTube's InnerTube player API
#[derive(Debug, Clone)]
pub struct InnerTube {
    client: reqwest::Client,
    base_url: String,
}

impl InnerTube {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.into(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

impl CaptionSource for InnerTube {
    async fn list_tracks(&self, video_id: &str) -> Result<Vec<CaptionTrack>, TranscriptError> {
        // Step 1: Fetch the watch page to get the InnerTube API key
        let watch_url = format!("{}/watch?v={video_id}", self.base_url);
        debug!("Fetching watch page: {watch_url}");

        let page_html = self
            .client
            .get(&watch_url)
            .header("User-Agent", USER_AGENT)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let api_key = extract_api_key(&page_html)?;
        debug!("Extracted InnerTube API key: {api_key}");

        // Step 2: Call InnerTube player endpoint
        let player_url = format!(
            "{}/youtubei/v1/player?key={api_key}&prettyPrint=false",
            self.base_url
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
            "videoId": video_id
        });

        let resp: InnerTubePlayerResponse = self
            .client
            .post(&player_url)
            .header("User-Agent", USER_AGENT)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(resp
            .captions
            .and_then(|c| c.player_captions_tracklist_renderer)
            .and_then(|r| r.caption_tracks)
            .unwrap_or_default())
    }

    async fn fetch_track(&self, track: &CaptionTrack) -> Result<Vec<Segment>, TranscriptError> {
        let caption_xml = self
            .client
            .get(&track.base_url)
            .header("User-Agent", USER_AGENT)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        parse_caption_xml(&caption_xml)
    }
}

/// Resolves a video URL to its preferred caption track
#[derive(Debug)]
pub struct TranscriptFetcher<C> {
    source: C,
    languages: Vec<String>,
    fallback_languages: Vec<String>,
}

impl<C: CaptionSource> TranscriptFetcher<C> {
    /// `languages` are tried against manually-created tracks in order,
    /// then `fallback_languages` against auto-generated ones.
    pub fn new(source: C, languages: Vec<String>, fallback_languages: Vec<String>) -> Self {
        Self {
            source,
            languages,
            fallback_languages,
        }
    }

    /// Fetch the transcript for a video URL.
    ///
    /// Fails without touching the network when the URL carries no video ID.
    pub async fn fetch(&self, url: &str) -> Result<Transcript, TranscriptError> {
        let video_id = extract_video_id(url).ok_or_else(|| TranscriptError::InvalidUrl(url.to_string()))?;
        info!("Video ID: {video_id}");

        let tracks = self.source.list_tracks(&video_id).await?;
        if tracks.is_empty() {
            return Err(TranscriptError::NoCaptions(video_id));
        }

        let track = select_track(&tracks, &self.languages, &self.fallback_languages)
            .ok_or_else(|| TranscriptError::NoMatchingTrack(video_id.clone()))?;
        debug!(
            "Using caption track: lang={} kind={}",
            track.language_code,
            track.track_kind()
        );

        let segments = self.source.fetch_track(track).await?;

        Ok(Transcript {
            video_id,
            language: track.language_code.clone(),
            kind: track.track_kind(),
            segments,
        })
    }
}

/// Pick the first manual track matching `languages`, else the first generated track matching `fallback`.
pub fn select_track<'a>(
    tracks: &'a [CaptionTrack],
    languages: &[String],
    fallback: &[String],
) -> Option<&'a CaptionTrack> {
    let find = move |lang: &String, kind: TrackKind| {
        tracks
            .iter()
            .find(|t| t.track_kind() == kind && t.language_code == *lang)
    };

    languages
        .iter()
        .find_map(|lang| find(lang, TrackKind::Manual))
        .or_else(|| fallback.iter().find_map(|lang| find(lang, TrackKind::Generated)))
}

fn extract_api_key(html: &str) -> Result<String, TranscriptError> {
    let re = Regex::new(r#""INNERTUBE_API_KEY"\s*:\s*"([^"]+)""#)?;
    if let Some(caps) = re.captures(html) {
        return Ok(caps[1].to_string());
    }

    // Fallback: try the newer pattern
    let re2 = Regex::new(r#"innertubeApiKey\s*[=:]\s*"([^"]+)""#)?;
    if let Some(caps) = re2.captures(html) {
        return Ok(caps[1].to_string());
    }

    Err(TranscriptError::MissingApiKey)
}

fn parse_caption_xml(xml: &str) -> Result<Vec<Segment>, TranscriptError> {
    use quick_xml::Reader;
    use quick_xml::events::Event;

    let markup = Regex::new(r"<[^>]*>")?;
    let mut reader = Reader::from_str(xml);
    let mut segments = Vec::new();
    let mut current_start: Option<f64> = None;
    let mut current_dur: Option<f64> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"text" => {
                let mut start = None;
                let mut dur = None;
                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"start" => {
                            start = String::from_utf8_lossy(&attr.value).parse::<f64>().ok();
                        }
                        b"dur" => {
                            dur = String::from_utf8_lossy(&attr.value).parse::<f64>().ok();
                        }
                        _ => {}
                    }
                }
                current_start = start;
                current_dur = dur;
            }
            Ok(Event::Text(ref e)) => {
                if let (Some(start), Some(dur)) = (current_start.take(), current_dur.take()) {
                    let raw_text = e.unescape().unwrap_or_default().to_string();
                    let decoded = html_escape::decode_html_entities(&raw_text);
                    let text = markup.replace_all(&decoded, "").trim().to_string();
                    if !text.is_empty() {
                        segments.push(Segment {
                            text,
                            start,
                            duration: dur,
                        });
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(TranscriptError::Xml(e.to_string())),
            _ => {}
        }
    }

    Ok(segments)
}
