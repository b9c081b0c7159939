use crate::config::ProviderConfig;
use crate::error::{ExtractError, Result};
use crate::providers::chat::{build_client, complete, vision_message};
use crate::providers::LlmProvider;
use async_trait::async_trait;
use log::info;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai";
const DEFAULT_MODEL: &str = "llama-3.2-11b-vision-preview";

pub struct GroqProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
}

impl GroqProvider {
    /// Create a new Groq provider from configuration
    pub fn new(config: &ProviderConfig, timeout: Option<Duration>) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("GROQ_API_KEY").ok())
            .ok_or_else(|| {
                ExtractError::ProviderNotConfigured(
                    "GROQ_API_KEY not found in config or environment".to_string(),
                )
            })?;

        Ok(GroqProvider {
            client: build_client(timeout)?,
            api_key,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: config
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: config.temperature.unwrap_or(0.3),
            max_tokens: config.max_tokens.unwrap_or(1024),
            top_p: config.top_p.unwrap_or(1.0),
        })
    }

    #[doc(hidden)]
    pub fn with_base_url(api_key: String, base_url: String, model: String) -> Self {
        GroqProvider {
            client: Client::new(),
            api_key,
            base_url,
            model,
            temperature: 0.3,
            max_tokens: 1024,
            top_p: 1.0,
        }
    }
}

#[async_trait]
impl LlmProvider for GroqProvider {
    fn provider_name(&self) -> &str {
        "groq"
    }

    async fn extract(&self, image_url: &str, prompt: &str) -> Result<String> {
        info!("Sending request to Groq API...");
        let payload = json!({
            "messages": [vision_message(prompt, image_url)],
            "model": self.model,
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
            "top_p": self.top_p,
            "stream": false,
            "stop": null
        });

        complete(
            &self.client,
            "Groq",
            &format!("{}/v1/chat/completions", self.base_url),
            &self.api_key,
            &payload,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    #[tokio::test]
    async fn test_extract_sends_sampling_parameters() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer gsk_test")
            .match_body(Matcher::PartialJson(json!({
                "model": "llama-3.2-11b-vision-preview",
                "max_tokens": 1024,
                "stream": false,
                "stop": null
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"choices": [{"message": {"content": "Here you go: [{\"name\": \"Pastel\"}]"}}]}"#,
            )
            .create_async()
            .await;

        let provider = GroqProvider::with_base_url(
            "gsk_test".to_string(),
            server.url(),
            DEFAULT_MODEL.to_string(),
        );

        let result = provider
            .extract("https://img.test/menu.png", "read the menu")
            .await
            .unwrap();
        assert_eq!(result, r#"Here you go: [{"name": "Pastel"}]"#);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_extract_server_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(503)
            .with_body("model overloaded")
            .create_async()
            .await;

        let provider = GroqProvider::with_base_url(
            "gsk_test".to_string(),
            server.url(),
            DEFAULT_MODEL.to_string(),
        );

        let err = provider.extract("https://img.test/x.png", "p").await.unwrap_err();
        assert_eq!(err.to_string(), "Groq API error (503): model overloaded");
    }

    #[test]
    fn test_new_applies_overrides() {
        let config = ProviderConfig {
            api_key: Some("gsk_test".to_string()),
            model: Some("llama-3.2-90b-vision-preview".to_string()),
            temperature: Some(0.1),
            ..Default::default()
        };
        let provider = GroqProvider::new(&config, Some(Duration::from_secs(5))).unwrap();
        assert_eq!(provider.provider_name(), "groq");
        assert_eq!(provider.model, "llama-3.2-90b-vision-preview");
        assert_eq!(provider.temperature, 0.1);
        assert_eq!(provider.max_tokens, 1024);
        assert_eq!(provider.base_url, DEFAULT_BASE_URL);
    }
}
