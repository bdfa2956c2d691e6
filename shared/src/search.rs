//! Tavily web search client.

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::models::SearchHit;
use crate::{Config, Error, Result};

const SNIPPET_CHARS: usize = 200;
const PRESELECTED: usize = 3;

#[derive(Debug, Serialize)]
struct TavilyRequest<'a> {
    api_key: &'a str,
    query: String,
    max_results: u32,
    include_answer: bool,
    include_raw_content: bool,
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Debug, Default, Deserialize)]
struct TavilyResult {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    source: Option<String>,
}

/// Client for the search collaborator.
pub struct SearchClient {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl SearchClient {
    pub fn new(http_client: reqwest::Client, config: &Config, api_key: String) -> Self {
        Self {
            http_client,
            endpoint: config.tavily_api_url.clone(),
            api_key,
        }
    }

    /// Search the web for market material about `keyword`.
    pub async fn search(&self, keyword: &str, limit: u32) -> Result<Vec<SearchHit>> {
        let body = TavilyRequest {
            api_key: &self.api_key,
            query: format!("{} 趋势 机会 市场 产品", keyword.trim()),
            max_results: limit,
            include_answer: false,
            include_raw_content: false,
        };

        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Upstream(format!("search failed: {}", status)));
        }

        let payload: TavilyResponse = response.json().await?;
        Ok(to_hits(payload.results))
    }
}

fn to_hits(results: Vec<TavilyResult>) -> Vec<SearchHit> {
    results
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let url = item.url.unwrap_or_default();
            let source = item
                .source
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| source_label(&url));

            SearchHit {
                id: format!("result-{}", index + 1),
                title: item
                    .title
                    .filter(|t| !t.trim().is_empty())
                    .unwrap_or_else(|| "无标题".to_string()),
                snippet: item
                    .content
                    .map(|c| c.chars().take(SNIPPET_CHARS).collect())
                    .unwrap_or_default(),
                url,
                source,
                selected: index < PRESELECTED,
            }
        })
        .collect()
}

/// Host of `url` without a leading `www.`, or 未知来源 when it cannot be parsed.
pub fn source_label(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(|h| h.trim_start_matches("www.").to_string()))
        .unwrap_or_else(|| "未知来源".to_string())
}
