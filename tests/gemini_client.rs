#![cfg(feature = "gemini")]

use genstudio::{
    AspectRatio, GeminiClient, GenStudioError, GenerationClient, JobError, JobErrorKind,
    VideoOperation,
};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const OPERATION: &str = "models/veo-3.1-fast-generate-preview/operations/op-123";

fn client(server: &MockServer) -> GeminiClient {
    GeminiClient::builder()
        .api_key("test-key")
        .base_url(server.uri())
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_generate_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
        .and(header("x-goog-api-key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": {"parts": [{"text": "Hola, "}, {"text": "mundo"}]}
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let text = client(&server)
        .generate_text("Translate: hello, world", "gemini-2.5-flash")
        .await
        .unwrap();
    assert_eq!(text, "Hola, mundo");
}

#[tokio::test]
async fn test_blocked_prompt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .generate_text("something", "gemini-2.5-flash")
        .await
        .unwrap_err();
    assert!(matches!(err, GenStudioError::ContentBlocked(_)));
}

#[tokio::test]
async fn test_generate_image() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/imagen-4.0-generate-001:predict"))
        .and(body_partial_json(json!({
            "parameters": {"sampleCount": 1, "aspectRatio": "9:16"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "predictions": [{"bytesBase64Encoded": "iVBORw0KGgo=", "mimeType": "image/png"}]
        })))
        .mount(&server)
        .await;

    let image = client(&server)
        .generate_image("a robot", AspectRatio::Portrait)
        .await
        .unwrap();
    assert_eq!(image, "iVBORw0KGgo=");
}

#[tokio::test]
async fn test_generate_speech_with_voice() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-flash-preview-tts:generateContent"))
        .and(body_partial_json(json!({
            "generationConfig": {
                "responseModalities": ["AUDIO"],
                "speechConfig": {"voiceConfig": {"prebuiltVoiceConfig": {"voiceName": "Kore"}}}
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": {"parts": [{"inlineData": {"mimeType": "audio/L16;rate=24000", "data": "AAEC"}}]}
            }]
        })))
        .mount(&server)
        .await;

    let audio = client(&server)
        .generate_speech("hola", Some("Kore"))
        .await
        .unwrap();
    assert_eq!(audio.as_deref(), Some("AAEC"));
}

#[tokio::test]
async fn test_generate_speech_without_audio() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-flash-preview-tts:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": []}}]
        })))
        .mount(&server)
        .await;

    let audio = client(&server).generate_speech("hola", None).await.unwrap();
    assert!(audio.is_none());
}

#[tokio::test]
async fn test_video_from_image_submits_long_running_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/veo-3.1-generate-preview:predictLongRunning"))
        .and(body_partial_json(json!({
            "parameters": {"aspectRatio": "16:9", "numberOfVideos": 1}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "models/veo-3.1-generate-preview/operations/op-9"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let operation = client(&server)
        .generate_video_from_image("talks", "iVBORw0KGgo=", "image/png", AspectRatio::Square, true)
        .await
        .unwrap();
    assert_eq!(operation.name, "models/veo-3.1-generate-preview/operations/op-9");
    assert!(!operation.done);
    assert!(operation.result_uri().is_none());
}

#[tokio::test]
async fn test_poll_finished_operation() {
    let server = MockServer::start().await;
    let uri = format!("{}/v1beta/files/abc:download?alt=media", server.uri());
    Mock::given(method("GET"))
        .and(path(format!("/v1beta/{OPERATION}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": OPERATION,
            "done": true,
            "response": {
                "generateVideoResponse": {
                    "generatedSamples": [{"video": {"uri": uri}}]
                }
            }
        })))
        .mount(&server)
        .await;

    let polled = client(&server)
        .poll_video_operation(&VideoOperation::pending(OPERATION))
        .await
        .unwrap();
    assert!(polled.done);
    assert_eq!(polled.result_uri(), Some(uri.as_str()));
}

#[tokio::test]
async fn test_poll_finished_without_samples() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/v1beta/{OPERATION}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": OPERATION,
            "done": true,
            "response": {"generateVideoResponse": {}}
        })))
        .mount(&server)
        .await;

    let polled = client(&server)
        .poll_video_operation(&VideoOperation::pending(OPERATION))
        .await
        .unwrap();
    assert!(polled.done);
    assert!(polled.result_uri().is_none());
}

#[tokio::test]
async fn test_not_found_classifies_as_credential() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/v1beta/{OPERATION}")))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"code": 404, "message": "Requested entity was not found.", "status": "NOT_FOUND"}
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .poll_video_operation(&VideoOperation::pending(OPERATION))
        .await
        .unwrap_err();
    assert!(err.is_entity_not_found());
    assert_eq!(JobError::classify(&err).kind, JobErrorKind::Credential);
}

#[tokio::test]
async fn test_operation_error_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/v1beta/{OPERATION}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": OPERATION,
            "done": true,
            "error": {"code": 5, "message": "Requested entity was not found."}
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .poll_video_operation(&VideoOperation::pending(OPERATION))
        .await
        .unwrap_err();
    assert!(err.is_entity_not_found());
}

#[tokio::test]
async fn test_server_error_classifies_as_transport() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": {"code": 500, "message": "Internal error encountered."}
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .generate_text("hello", "gemini-2.5-flash")
        .await
        .unwrap_err();
    match &err {
        GenStudioError::Api { status, message } => {
            assert_eq!(*status, 500);
            assert_eq!(message, "Internal error encountered.");
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(JobError::classify(&err).kind, JobErrorKind::Transport);
}

#[tokio::test]
async fn test_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/imagen-4.0-generate-001:predict"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
        .mount(&server)
        .await;

    let err = client(&server)
        .generate_image("a robot", AspectRatio::Square)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        GenStudioError::RateLimited {
            retry_after: Some(delay)
        } if delay == Duration::from_secs(7)
    ));
}

#[tokio::test]
async fn test_unknown_model_classifies_as_transport() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/imagen-4.0-generate-001:predict"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {
                "code": 404,
                "message": "models/imagen-typo is not found for API version v1beta",
                "status": "NOT_FOUND"
            }
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .generate_image("a robot", AspectRatio::Square)
        .await
        .unwrap_err();
    assert!(matches!(err, GenStudioError::Api { status: 404, .. }));
    assert!(!err.is_entity_not_found());
    assert_eq!(JobError::classify(&err).kind, JobErrorKind::Transport);
}

#[tokio::test]
async fn test_download_video_appends_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1beta/files/abc:download"))
        .and(query_param("alt", "media"))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"mp4-bytes".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let uri = format!("{}/v1beta/files/abc:download?alt=media", server.uri());
    let bytes = client(&server).download_video(&uri).await.unwrap();
    assert_eq!(bytes, b"mp4-bytes");
}
