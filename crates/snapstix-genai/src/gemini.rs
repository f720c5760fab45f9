//! Gemini `generateContent` client for sticker images.

use crate::error::GenerationError;
use crate::generator::ImageGenerator;
use crate::prompt::PromptBuilder;
use async_trait::async_trait;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use snapstix_config::GenerationConfig;
use snapstix_protocol::{DEFAULT_IMAGE_MIME, EncodedImage};

/// HTTP client for the Gemini image model.
#[derive(Clone)]
pub struct GeminiImageClient {
    http: reqwest::Client,
    api_base_url: String,
    model: String,
    api_key: String,
    prompt: PromptBuilder,
}

impl std::fmt::Debug for GeminiImageClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiImageClient")
            .field("api_base_url", &self.api_base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl GeminiImageClient {
    /// Build a client with an explicit API key.
    pub fn new(api_key: impl Into<String>, config: &GenerationConfig) -> Result<Self, GenerationError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(GenerationError::MissingApiKey(config.api_key_env.clone()));
        }
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|err| GenerationError::UpstreamFailure(err.to_string()))?;
        info!(
            "initialized gemini image client (model={}, timeout_set={})",
            config.model,
            config.request_timeout_secs.is_some()
        );
        Ok(Self {
            http,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            prompt: PromptBuilder::from_config(config.prompt_template.as_deref()),
        })
    }

    /// Build a client reading the API key from the configured env var.
    pub fn from_env(config: &GenerationConfig) -> Result<Self, GenerationError> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| GenerationError::MissingApiKey(config.api_key_env.clone()))?;
        Self::new(api_key, config)
    }

    /// Full `generateContent` endpoint for the configured model.
    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base_url, self.model
        )
    }
}

#[async_trait]
impl ImageGenerator for GeminiImageClient {
    async fn generate(
        &self,
        source_image: &str,
        theme: &str,
        expression: &str,
    ) -> Result<String, GenerationError> {
        let source = EncodedImage::parse_data_url(source_image)?;
        let prompt = self.prompt.render(theme, expression);
        info!(
            "brewing sticker (expression={}, theme_len={})",
            expression,
            theme.len()
        );
        let request = GenerateContentRequest {
            contents: RequestContent {
                parts: vec![
                    RequestPart::Inline {
                        inline_data: InlineDataRef {
                            mime_type: &source.mime_type,
                            data: &source.data,
                        },
                    },
                    RequestPart::Text { text: &prompt },
                ],
            },
        };

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|err| upstream(expression, err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|body| body.error.message)
                .unwrap_or_else(|_| format!("request failed with status {status}"));
            return Err(upstream(expression, message));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|err| upstream(expression, err.to_string()))?;
        let image = extract_image(body).inspect_err(|err| {
            warn!("gemini returned no image (expression={expression}, error={err})");
        })?;
        debug!(
            "sticker image received (expression={}, mime={}, bytes_b64={})",
            expression,
            image.mime_type,
            image.data.len()
        );
        Ok(image.to_data_url())
    }
}

/// Log and wrap an upstream failure.
fn upstream(expression: &str, message: String) -> GenerationError {
    warn!("gemini request failed (expression={expression}, error={message})");
    GenerationError::UpstreamFailure(message)
}

/// Pick the first inline image part from the first candidate.
fn extract_image(response: GenerateContentResponse) -> Result<EncodedImage, GenerationError> {
    let Some(parts) = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts)
    else {
        return Err(GenerationError::EmptyResponse(
            "empty response from image model".to_string(),
        ));
    };
    let Some(inline) = parts
        .into_iter()
        .filter_map(|part| part.inline_data)
        .find(|inline| !inline.data.is_empty())
    else {
        return Err(GenerationError::EmptyResponse(
            "model did not return an image part".to_string(),
        ));
    };
    let mime_type = inline
        .mime_type
        .filter(|mime| mime.starts_with("image/"))
        .unwrap_or_else(|| DEFAULT_IMAGE_MIME.to_string());
    let data_url = format!("data:{mime_type};base64,{}", inline.data);
    EncodedImage::parse_data_url(&data_url).map_err(|_| {
        GenerationError::EmptyResponse("model returned malformed image data".to_string())
    })
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: RequestContent<'a>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestPart<'a> {
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: InlineDataRef<'a>,
    },
    Text {
        text: &'a str,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineDataRef<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Deserialize, Default)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Option<Vec<ResponsePart>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    #[serde(default)]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(default)]
    data: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> GenerateContentResponse {
        serde_json::from_value(value).expect("response")
    }

    #[test]
    fn request_serializes_inline_data_then_text() {
        let request = GenerateContentRequest {
            contents: RequestContent {
                parts: vec![
                    RequestPart::Inline {
                        inline_data: InlineDataRef {
                            mime_type: "image/png",
                            data: "AA==",
                        },
                    },
                    RequestPart::Text { text: "prompt" },
                ],
            },
        };
        assert_eq!(
            serde_json::to_value(&request).expect("serialize"),
            json!({
                "contents": {
                    "parts": [
                        { "inlineData": { "mimeType": "image/png", "data": "AA==" } },
                        { "text": "prompt" }
                    ]
                }
            })
        );
    }

    #[test]
    fn extracts_first_inline_part() {
        let response = parse(json!({
            "candidates": [{ "content": { "parts": [
                { "text": "here you go" },
                { "inlineData": { "mimeType": "image/webp", "data": "aGVsbG8=" } },
                { "inlineData": { "mimeType": "image/png", "data": "AA==" } }
            ] } }]
        }));
        let image = extract_image(response).expect("image");
        assert_eq!(image.to_data_url(), "data:image/webp;base64,aGVsbG8=");
    }

    #[test]
    fn missing_mime_defaults_to_png() {
        let response = parse(json!({
            "candidates": [{ "content": { "parts": [{ "inlineData": { "data": "AA==" } }] } }]
        }));
        assert_eq!(extract_image(response).expect("image").mime_type, "image/png");
    }

    #[test]
    fn no_candidates_is_empty_response() {
        let err = extract_image(parse(json!({}))).unwrap_err();
        assert_eq!(
            err,
            GenerationError::EmptyResponse("empty response from image model".to_string())
        );
        let err = extract_image(parse(json!({ "candidates": [{}] }))).unwrap_err();
        assert!(matches!(err, GenerationError::EmptyResponse(_)));
    }

    #[test]
    fn text_only_parts_is_empty_response() {
        let response = parse(json!({
            "candidates": [{ "content": { "parts": [{ "text": "I can't help with that" }] } }]
        }));
        assert_eq!(
            extract_image(response).unwrap_err(),
            GenerationError::EmptyResponse("model did not return an image part".to_string())
        );
    }

    #[test]
    fn rejects_blank_api_key() {
        let err = GeminiImageClient::new("  ", &GenerationConfig::default()).unwrap_err();
        assert_eq!(
            err,
            GenerationError::MissingApiKey("GEMINI_API_KEY".to_string())
        );
    }
}
