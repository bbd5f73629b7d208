use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;

use super::{Transcriber, TranscriptionError, TranscriptionRequest};

/// Speech-to-text via an OpenAI-compatible `/audio/transcriptions` endpoint
pub struct OpenAiTranscriber {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

impl OpenAiTranscriber {
    pub fn new(base_url: &str, model: &str, api_key: Option<String>) -> Result<Self, TranscriptionError> {
        let api_key = api_key.ok_or(TranscriptionError::MissingApiKey)?;

        Ok(Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/audio/transcriptions", self.base_url)
    }

    async fn build_form(&self, request: &TranscriptionRequest) -> Result<Form, TranscriptionError> {
        let content = tokio::fs::read(&request.media_path).await?;
        let file_name = request
            .media_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "media.mp4".to_string());

        let mut form = Form::new()
            .part("file", Part::bytes(content).file_name(file_name))
            .text("model", self.model.clone())
            .text("response_format", "json");

        if let Some(language) = &request.language {
            form = form.text("language", language.clone());
        }

        Ok(form)
    }
}

#[async_trait]
impl Transcriber for OpenAiTranscriber {
    async fn transcribe(&self, request: &TranscriptionRequest) -> Result<String, TranscriptionError> {
        let form = self.build_form(request).await?;

        tracing::debug!(
            "Posting {} to {} (model: {}, language: {:?})",
            request.media_path.display(),
            self.endpoint(),
            self.model,
            request.language
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|parsed| parsed.error.message)
                .unwrap_or(body);
            return Err(TranscriptionError::Api { status, message });
        }

        let parsed: TranscriptionResponse = serde_json::from_str(&body)
            .map_err(|err| TranscriptionError::InvalidResponse(err.to_string()))?;

        Ok(parsed.text)
    }

    fn name(&self) -> &'static str {
        "OpenAI Whisper"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MockResponse, MockServer};
    use reqwest::StatusCode;

    fn request_for(dir: &tempfile::TempDir, language: Option<&str>) -> TranscriptionRequest {
        let media_path = dir.path().join("media_abc.mp3");
        fs_err::write(&media_path, b"ID3 fake audio").unwrap();
        TranscriptionRequest {
            media_path,
            language: language.map(str::to_string),
        }
    }

    #[test]
    fn test_missing_api_key() {
        let result = OpenAiTranscriber::new("https://api.openai.com/v1", "whisper-1", None);
        assert!(matches!(result, Err(TranscriptionError::MissingApiKey)));
    }

    #[tokio::test]
    async fn test_posts_multipart_and_returns_text() {
        let server = MockServer::start(
            MockResponse::ok(r#"{"text":"hello world"}"#).header("Content-Type", "application/json"),
        )
        .await;
        let dir = tempfile::tempdir().unwrap();
        let transcriber =
            OpenAiTranscriber::new(&server.url("/v1/"), "whisper-1", Some("sk-test".to_string())).unwrap();

        let text = transcriber.transcribe(&request_for(&dir, Some("fr"))).await.unwrap();
        assert_eq!(text, "hello world");

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        let recorded = &requests[0];
        assert_eq!(recorded.method, axum::http::Method::POST);
        assert_eq!(recorded.path, "/v1/audio/transcriptions");
        assert_eq!(recorded.header("authorization").as_deref(), Some("Bearer sk-test"));

        let body = String::from_utf8_lossy(&recorded.body);
        assert!(body.contains("name=\"model\""));
        assert!(body.contains("whisper-1"));
        assert!(body.contains("filename=\"media_abc.mp3\""));
        assert!(body.contains("ID3 fake audio"));
        assert!(body.contains("name=\"language\""));
    }

    #[tokio::test]
    async fn test_language_is_omitted_without_hint() {
        let server = MockServer::start(MockResponse::ok(r#"{"text":"bonjour"}"#)).await;
        let dir = tempfile::tempdir().unwrap();
        let transcriber =
            OpenAiTranscriber::new(&server.url("/v1"), "whisper-1", Some("sk-test".to_string())).unwrap();

        transcriber.transcribe(&request_for(&dir, None)).await.unwrap();

        let body = String::from_utf8_lossy(&server.requests()[0].body).into_owned();
        assert!(!body.contains("name=\"language\""));
    }

    #[tokio::test]
    async fn test_api_error_message_is_surfaced() {
        let server = MockServer::start(MockResponse::status(
            401,
            r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#,
        ))
        .await;
        let dir = tempfile::tempdir().unwrap();
        let transcriber =
            OpenAiTranscriber::new(&server.url("/v1"), "whisper-1", Some("bad".to_string())).unwrap();

        match transcriber.transcribe(&request_for(&dir, None)).await {
            Err(TranscriptionError::Api { status, message }) => {
                assert_eq!(status, StatusCode::UNAUTHORIZED);
                assert_eq!(message, "Incorrect API key provided");
            }
            other => panic!("expected API error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unexpected_body_is_invalid_response() {
        let server = MockServer::start(MockResponse::ok("<html>oops</html>")).await;
        let dir = tempfile::tempdir().unwrap();
        let transcriber =
            OpenAiTranscriber::new(&server.url("/v1"), "whisper-1", Some("sk".to_string())).unwrap();

        let result = transcriber.transcribe(&request_for(&dir, None)).await;
        assert!(matches!(result, Err(TranscriptionError::InvalidResponse(_))));
    }
}
