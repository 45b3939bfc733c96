pub mod config;
pub mod error;
pub mod server;
pub mod summarize;
pub mod youtube;

use log::debug;
use reqwest::Url;
use serde::Serialize;

pub use error::{SummaryError, TranscriptError};

/// Host fragment of full watch-page URLs (www., m., music. ...)
const WATCH_DOMAIN: &str = "youtube.com";

/// Host of short share links
const SHORT_DOMAIN: &str = "youtu.be";

/// A single captioned segment
#[derive(Debug, Clone, Serialize)]
pub struct Segment {
    pub text: String,
    pub start: f64,
    pub duration: f64,
}

/// Whether a caption track was uploaded by a person or generated by speech recognition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrackKind {
    Manual,
    Generated,
}

/// Complete transcript for a video
#[derive(Debug, Clone, Serialize)]
pub struct Transcript {
    pub video_id: String,
    pub language: String,
    pub kind: TrackKind,
    pub segments: Vec<Segment>,
}

impl Transcript {
    /// Plain text of the transcript, one segment per line in chronological order
    pub fn text(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl std::fmt::Display for TrackKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackKind::Manual => write!(f, "manual"),
            TrackKind::Generated => write!(f, "auto-generated"),
        }
    }
}

/// Extract the video ID from a watch URL (`youtube.com/watch?v=ID`) or a short link (`youtu.be/ID`).
///
/// Unparseable URLs and unknown hosts yield `None`.
pub fn extract_video_id(input: &str) -> Option<String> {
    let video_id = match Url::parse(input.trim()) {
        Ok(url) => video_id_from_url(&url),
        Err(e) => {
            debug!("Video ID extraction error for {input:?}: {e}");
            None
        }
    };
    debug!("Video ID for {input:?}: {video_id:?}");
    video_id
}

fn video_id_from_url(url: &Url) -> Option<String> {
    let host = url.host_str()?;

    if host.contains(WATCH_DOMAIN) {
        return url
            .query_pairs()
            .find(|(key, value)| key == "v" && !value.is_empty())
            .map(|(_, value)| value.into_owned());
    }

    if host.trim_start_matches("www.") == SHORT_DOMAIN {
        let id = url.path().trim_start_matches('/');
        return (!id.is_empty()).then(|| id.to_string());
    }

    None
}
