//! Illustration generation with a deterministic placeholder fallback.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::time::Instant;
use tracing::warn;

use crate::models::{ImageResponse, ImageStyle};
use crate::{Config, Error, Result};

/// Anything that can turn a prompt into an image URL.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct ImagesRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u32,
    size: &'a str,
    quality: &'a str,
}

/// OpenAI-compatible `/images/generations` client.
pub struct OpenAiImageClient {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAiImageClient {
    pub fn new(http_client: reqwest::Client, config: &Config, api_key: Option<String>) -> Self {
        Self {
            http_client,
            endpoint: format!("{}/images/generations", config.openai_api_base),
            api_key,
            model: config.openai_image_model.clone(),
        }
    }
}

#[async_trait]
impl ImageGenerator for OpenAiImageClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::Config("OpenAI API key not configured".to_string()))?;

        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&ImagesRequest {
                model: &self.model,
                prompt,
                n: 1,
                size: "1024x1024",
                quality: "standard",
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let payload: Value = response.json().await.unwrap_or_default();
            let message = payload
                .pointer("/error/message")
                .and_then(Value::as_str)
                .unwrap_or("image generation failed");
            return Err(Error::Upstream(format!("{}: {}", status, message)));
        }

        let payload: Value = response.json().await?;
        payload
            .pointer("/data/0/url")
            .and_then(Value::as_str)
            .filter(|url| !url.is_empty())
            .map(str::to_string)
            .ok_or_else(|| Error::Upstream("image response carried no url".to_string()))
    }
}

/// Full prompt sent to the image model.
pub fn styled_prompt(prompt: &str, style: ImageStyle) -> String {
    format!(
        "{}, {}, high quality, product concept illustration",
        prompt.trim(),
        style.prompt_phrase()
    )
}

/// Stable placeholder image for a prompt.
pub fn placeholder_image_url(full_prompt: &str) -> String {
    let digest = Sha256::digest(full_prompt.as_bytes());
    let seed = hex::encode(digest);
    format!("https://picsum.photos/seed/{}/1024/1024", &seed[..16])
}

/// Generates illustrations, never failing the overall flow.
pub struct ImageService<I> {
    generator: I,
}

impl<I: ImageGenerator> ImageService<I> {
    pub fn new(generator: I) -> Self {
        Self { generator }
    }

    pub async fn illustrate(&self, prompt: &str, style: ImageStyle) -> ImageResponse {
        let started = Instant::now();
        let full_prompt = styled_prompt(prompt, style);

        let (image_url, fallback) = match self.generator.generate(&full_prompt).await {
            Ok(url) => (url, false),
            Err(e) => {
                warn!(error = %e, "Image generation failed, using placeholder");
                (placeholder_image_url(&full_prompt), true)
            }
        };

        ImageResponse {
            image_url,
            duration: started.elapsed().as_millis() as u64,
            fallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Option<&'static str>);

    #[async_trait]
    impl ImageGenerator for Fixed {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            self.0
                .map(str::to_string)
                .ok_or_else(|| Error::Upstream("503".to_string()))
        }
    }

    #[test]
    fn test_styled_prompt() {
        assert_eq!(
            styled_prompt(" 专注宠物 ", ImageStyle::Tech),
            "专注宠物, futuristic technology style, digital art, neon accents, dark background, high quality, product concept illustration"
        );
    }

    #[test]
    fn test_placeholder_is_deterministic() {
        let a = placeholder_image_url("FocusPet");
        assert_eq!(a, placeholder_image_url("FocusPet"));
        assert_ne!(a, placeholder_image_url("CalmCat"));
        assert!(a.starts_with("https://picsum.photos/seed/"));
        assert!(a.ends_with("/1024/1024"));
    }

    #[tokio::test]
    async fn test_illustrate_success() {
        let service = ImageService::new(Fixed(Some("https://img.example.com/1.png")));
        let response = service.illustrate("FocusPet app", ImageStyle::Warm).await;
        assert_eq!(response.image_url, "https://img.example.com/1.png");
        assert!(!response.fallback);
    }

    #[tokio::test]
    async fn test_illustrate_falls_back() {
        let service = ImageService::new(Fixed(None));
        let response = service.illustrate("FocusPet app", ImageStyle::Minimal).await;
        assert!(response.fallback);
        assert_eq!(
            response.image_url,
            placeholder_image_url(&styled_prompt("FocusPet app", ImageStyle::Minimal))
        );
    }
}
