use std::sync::{Arc, Mutex};
use ytsum::youtube::{CaptionSource, CaptionTrack};
use ytsum::{Segment, TranscriptError};

#[derive(Clone)]
pub struct MockCaptions {
    pub tracks: Vec<CaptionTrack>,
    pub segments: Vec<Segment>,
    pub list_calls: Arc<Mutex<Vec<String>>>,
    pub fetch_calls: Arc<Mutex<Vec<CaptionTrack>>>,
    pub unavailable: bool,
}

pub fn track(lang: &str, generated: bool) -> CaptionTrack {
    CaptionTrack {
        base_url: format!("https://captions.test/{lang}"),
        language_code: lang.to_string(),
        kind: generated.then(|| "asr".to_string()),
    }
}

impl MockCaptions {
    /// One manual English track whose entries are `lines`
    pub fn with_lines(lines: &[&str]) -> Self {
        Self::with_tracks(vec![track("en", false)], lines)
    }

    pub fn with_tracks(tracks: Vec<CaptionTrack>, lines: &[&str]) -> Self {
        let segments = lines
            .iter()
            .enumerate()
            .map(|(i, line)| Segment {
                text: line.to_string(),
                start: i as f64,
                duration: 1.0,
            })
            .collect();
        Self {
            tracks,
            segments,
            list_calls: Arc::new(Mutex::new(Vec::new())),
            fetch_calls: Arc::new(Mutex::new(Vec::new())),
            unavailable: false,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::with_tracks(Vec::new(), &[])
        }
    }
}

impl CaptionSource for MockCaptions {
    async fn list_tracks(&self, video_id: &str) -> Result<Vec<CaptionTrack>, TranscriptError> {
        self.list_calls.lock().unwrap().push(video_id.to_string());
        if self.unavailable {
            return Err(TranscriptError::NoCaptions(video_id.to_string()));
        }
        Ok(self.tracks.clone())
    }

    async fn fetch_track(&self, track: &CaptionTrack) -> Result<Vec<Segment>, TranscriptError> {
        self.fetch_calls.lock().unwrap().push(track.clone());
        Ok(self.segments.clone())
    }
}
