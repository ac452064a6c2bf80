use async_trait::async_trait;
use base64::{prelude::BASE64_STANDARD, Engine};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::application::ports::VisionLanguagePort;
use crate::config::VlmConfig;
use crate::domain::errors::{DomainError, DomainResult};

const TEMPERATURE: f32 = 0.1;

/// Cliente del modelo multimodal GLM-4V (API de chat compatible con OpenAI).
pub struct ZhipuVlm {
    client: reqwest::Client,
    cfg: VlmConfig,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: Vec<ContentPart<'a>>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    ImageUrl { image_url: ImageUrl },
    Text { text: &'a str },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

impl ZhipuVlm {
    pub fn new(client: reqwest::Client, cfg: VlmConfig) -> Self {
        Self { client, cfg }
    }

    pub fn is_configured(&self) -> bool {
        !self.cfg.api_key.is_empty()
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.cfg.base_url.trim_end_matches('/'))
    }
}

/// Un único mensaje de usuario: imagen (base64 sin prefijo) + texto.
fn build_request<'a>(model: &'a str, image: &[u8], prompt: &'a str, max_tokens: Option<u32>) -> ChatRequest<'a> {
    ChatRequest {
        model,
        messages: vec![ChatMessage {
            role: "user",
            content: vec![
                ContentPart::ImageUrl {
                    image_url: ImageUrl { url: BASE64_STANDARD.encode(image) },
                },
                ContentPart::Text { text: prompt },
            ],
        }],
        temperature: TEMPERATURE,
        max_tokens,
    }
}

#[async_trait]
impl VisionLanguagePort for ZhipuVlm {
    async fn complete(&self, image: &[u8], prompt: &str, max_tokens: Option<u32>) -> DomainResult<String> {
        if !self.is_configured() {
            return Err(DomainError::Unavailable("未配置 ZHIPU_API_KEY".into()));
        }

        let body = build_request(&self.cfg.model, image, prompt, max_tokens);
        let res = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.cfg.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!("❌ Error de red con el VLM: {e}");
                DomainError::Upstream(format!("VLM: {e}"))
            })?;

        let status = res.status();
        if !status.is_success() {
            let detail = res.text().await.unwrap_or_default();
            error!("❌ El VLM respondió {status}: {detail}");
            return Err(DomainError::Upstream(format!("VLM respondió {status}")));
        }

        let parsed: ChatResponse = res
            .json()
            .await
            .map_err(|e| DomainError::Upstream(format!("respuesta del VLM ilegible: {e}")))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| DomainError::Upstream("el VLM no devolvió ninguna opción".into()))?;

        info!("🧠 VLM {}: {} caracteres", self.cfg.model, content.chars().count());
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_has_image_then_text() {
        let body = serde_json::to_value(build_request("glm-4v-flash", b"abc", "读图", Some(1024))).unwrap();
        assert_eq!(body["model"], "glm-4v-flash");
        assert_eq!(body["max_tokens"], 1024);
        let content = &body["messages"][0]["content"];
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(content[0]["type"], "image_url");
        assert_eq!(content[0]["image_url"]["url"], "YWJj");
        assert_eq!(content[1]["type"], "text");
        assert_eq!(content[1]["text"], "读图");
    }

    #[test]
    fn max_tokens_is_omitted_when_unset() {
        let body = serde_json::to_value(build_request("m", b"", "p", None)).unwrap();
        assert!(body.get("max_tokens").is_none());
    }

    #[tokio::test]
    async fn missing_key_is_unavailable() {
        let vlm = ZhipuVlm::new(
            reqwest::Client::new(),
            VlmConfig { api_key: String::new(), base_url: "http://127.0.0.1:9".into(), model: "m".into() },
        );
        assert!(!vlm.is_configured());
        let err = vlm.complete(b"", "p", None).await.unwrap_err();
        assert!(matches!(err, DomainError::Unavailable(_)));
    }

    #[test]
    fn endpoint_trims_trailing_slash() {
        let vlm = ZhipuVlm::new(
            reqwest::Client::new(),
            VlmConfig { api_key: "k".into(), base_url: "https://example.test/v4/".into(), model: "m".into() },
        );
        assert_eq!(vlm.endpoint(), "https://example.test/v4/chat/completions");
    }
}
