use thiserror::Error;

/// Reasons a transcript could not be produced for a URL
#[derive(Error, Debug)]
pub enum TranscriptError {
    #[error("could not extract a video id from {0}")]
    InvalidUrl(String),

    #[error("HTTP error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("could not extract InnerTube API key from watch page")]
    MissingApiKey,

    #[error("no captions available for video {0}")]
    NoCaptions(String),

    #[error("no caption track in a preferred language for video {0}")]
    NoMatchingTrack(String),

    #[error("error parsing caption XML: {0}")]
    Xml(String),

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Reasons the completion backend did not return a summary
#[derive(Error, Debug)]
pub enum SummaryError {
    #[error("HTTP error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("unexpected completion response format")]
    EmptyResponse,
}
