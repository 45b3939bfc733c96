use std::collections::HashMap;

use axum::Router;
use axum::extract::{Json, Query};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use ytsum::summarize::{CompletionBackend, GroqClient, Summarizer};
use ytsum::youtube::{CaptionSource, InnerTube, TranscriptFetcher};
use ytsum::{SummaryError, TrackKind};

const API_KEY: &str = "gsk_test";
const INNERTUBE_KEY: &str = "AIzaSyTestKey";

/// Serve `build(base_url)` on an ephemeral local port and return the base URL
async fn spawn_stub(build: impl FnOnce(String) -> Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let app = build(base.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    base
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        == Some(format!("Bearer {API_KEY}").as_str())
}

/// Chat-completions stub that answers with `status` and `body` once the request checks out
fn completions_stub(status: StatusCode, body: Value) -> impl FnOnce(String) -> Router {
    move |_base| {
        Router::new().route(
            "/chat/completions",
            post(move |headers: HeaderMap, Json(request): Json<Value>| {
                let body = body.clone();
                async move {
                    if !authorized(&headers) {
                        return (StatusCode::UNAUTHORIZED, "missing bearer token").into_response();
                    }
                    if request["model"] != "llama-3.3-70b-versatile"
                        || request["max_tokens"] != 1024
                        || request["messages"][0]["role"] != "system"
                    {
                        return (StatusCode::BAD_REQUEST, "unexpected request body").into_response();
                    }
                    (status, Json(body)).into_response()
                }
            }),
        )
    }
}

fn groq(base: &str) -> Summarizer<GroqClient> {
    let client = GroqClient::new(reqwest::Client::new(), API_KEY).with_base_url(base);
    Summarizer::new(client, "llama-3.3-70b-versatile")
}

// ─── Groq chat completions ───────────────────────────────────────────────────

#[tokio::test]
async fn test_groq_returns_first_choice() {
    let body = json!({
        "id": "cmpl-1",
        "choices": [
            {"index": 0, "message": {"role": "assistant", "content": "A short summary."}},
            {"index": 1, "message": {"role": "assistant", "content": "Another one."}}
        ]
    });
    let base = spawn_stub(completions_stub(StatusCode::OK, body)).await;

    let summary = groq(&base).summarize("hello world").await.unwrap();
    assert_eq!(summary, "A short summary.");
}

#[tokio::test]
async fn test_groq_rate_limit_is_api_error() {
    let base = spawn_stub(completions_stub(StatusCode::TOO_MANY_REQUESTS, json!("quota"))).await;

    let err = groq(&base).summarize("hello world").await.unwrap_err();
    match err {
        SummaryError::Api { status, message } => {
            assert_eq!(status, 429);
            assert!(message.contains("quota"));
        }
        other => panic!("expected API error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_groq_empty_choices_is_error() {
    let base = spawn_stub(completions_stub(StatusCode::OK, json!({"choices": []}))).await;

    let err = groq(&base).summarize("hello world").await.unwrap_err();
    assert!(matches!(err, SummaryError::EmptyResponse));
}

#[tokio::test]
async fn test_groq_sends_bearer_token() {
    let base = spawn_stub(completions_stub(StatusCode::OK, json!({"choices": []}))).await;

    let client = GroqClient::new(reqwest::Client::new(), "wrong-key").with_base_url(&base);
    let request = groq(&base).build_request("hello");
    let err = client.complete(&request).await.unwrap_err();
    assert!(matches!(err, SummaryError::Api { status: 401, .. }));
}

// ─── InnerTube captions ──────────────────────────────────────────────────────

const CAPTION_XML: &str = r#"<?xml version="1.0" encoding="utf-8" ?>
<transcript>
    <text start="0.0" dur="1.5">hello world</text>
    <text start="1.5" dur="2.0">it&amp;#39;s a test</text>
</transcript>"#;

/// Watch page, player endpoint and timed-text endpoint for video `abc123`
fn youtube_stub(base: String) -> Router {
    let watch = get(|Query(query): Query<HashMap<String, String>>| async move {
        if query.get("v").map(String::as_str) != Some("abc123") {
            return (StatusCode::NOT_FOUND, "unknown video").into_response();
        }
        format!(r#"<html><script>ytcfg.set({{"INNERTUBE_API_KEY":"{INNERTUBE_KEY}"}});</script></html>"#)
            .into_response()
    });

    let player = post(
        move |Query(query): Query<HashMap<String, String>>, Json(request): Json<Value>| {
            let base = base.clone();
            async move {
                if query.get("key").map(String::as_str) != Some(INNERTUBE_KEY) || request["videoId"] != "abc123" {
                    return StatusCode::FORBIDDEN.into_response();
                }
                Json(json!({
                    "captions": {
                        "playerCaptionsTracklistRenderer": {
                            "captionTracks": [
                                {"baseUrl": format!("{base}/api/timedtext?lang=en&kind=asr"), "languageCode": "en", "kind": "asr"},
                                {"baseUrl": format!("{base}/api/timedtext?lang=en-GB"), "languageCode": "en-GB"}
                            ]
                        }
                    }
                }))
                .into_response()
            }
        },
    );

    let timedtext = get(|Query(query): Query<HashMap<String, String>>| async move {
        let response: Response = match query.get("lang").map(String::as_str) {
            Some("en-GB") => CAPTION_XML.into_response(),
            _ => "<transcript><text start=\"0\" dur=\"1\">wrong track</text></transcript>".into_response(),
        };
        response
    });

    Router::new()
        .route("/watch", watch)
        .route("/youtubei/v1/player", player)
        .route("/api/timedtext", timedtext)
}

fn innertube(base: &str) -> InnerTube {
    InnerTube::new(reqwest::Client::new()).with_base_url(base)
}

#[tokio::test]
async fn test_innertube_lists_tracks() {
    let base = spawn_stub(youtube_stub).await;

    let tracks = innertube(&base).list_tracks("abc123").await.unwrap();
    assert_eq!(tracks.len(), 2);
    assert_eq!(tracks[0].language_code, "en");
    assert_eq!(tracks[0].track_kind(), TrackKind::Generated);
    assert_eq!(tracks[1].language_code, "en-GB");
    assert_eq!(tracks[1].track_kind(), TrackKind::Manual);
    assert_eq!(tracks[1].base_url, format!("{base}/api/timedtext?lang=en-GB"));
}

#[tokio::test]
async fn test_innertube_unknown_video_is_error() {
    let base = spawn_stub(youtube_stub).await;

    assert!(innertube(&base).list_tracks("missing").await.is_err());
}

#[tokio::test]
async fn test_innertube_fetches_segments() {
    let base = spawn_stub(youtube_stub).await;
    let source = innertube(&base);

    let tracks = source.list_tracks("abc123").await.unwrap();
    let segments = source.fetch_track(&tracks[1]).await.unwrap();
    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0].text, "hello world");
    assert_eq!(segments[1].text, "it's a test");
    assert!((segments[1].start - 1.5).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_fetcher_over_innertube() {
    let base = spawn_stub(youtube_stub).await;
    let fetcher = TranscriptFetcher::new(
        innertube(&base),
        vec!["en".to_string(), "en-GB".to_string()],
        vec!["en".to_string()],
    );

    let transcript = fetcher.fetch("https://youtu.be/abc123").await.unwrap();
    assert_eq!(transcript.video_id, "abc123");
    assert_eq!(transcript.language, "en-GB");
    assert_eq!(transcript.kind, TrackKind::Manual);
    assert_eq!(transcript.text(), "hello world\nit's a test");
}
