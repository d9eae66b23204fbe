use std::time::Duration;

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use tracing::debug;

use construction_report::fetch::auth::UrlParam;
use construction_report::fetch::{BasicClient, HttpClient, post_json};

use crate::services::extraction_api::{Document, ExtractionRequest, TableExtractor};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

const SAFETY_CATEGORIES: &[&str] = &[
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    safety_settings: Vec<SafetySetting>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text { text: &'a str },
    Inline { inline_data: InlineData },
}

#[derive(Serialize)]
struct InlineData {
    mime_type: &'static str,
    data: String,
}

#[derive(Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

pub struct GeminiClient<C> {
    http: C,
    base_url: String,
    model: String,
}

impl GeminiClient<UrlParam<BasicClient>> {
    /// Client against the public endpoint, keyed through the `key` query parameter.
    pub fn new(api_key: &str, model: &str) -> Result<Self> {
        let http = BasicClient::with_timeout(Duration::from_secs(120))?;
        Ok(Self::with_client(
            UrlParam::new(http, "key", api_key),
            DEFAULT_BASE_URL,
            model,
        ))
    }
}

impl<C: HttpClient> GeminiClient<C> {
    pub fn with_client(http: C, base_url: &str, model: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }
}

fn document_part(document: &Document) -> Result<Part<'_>> {
    match document {
        Document::Text(text) => Ok(Part::Text { text }),
        Document::Pdf(bytes) => {
            if !bytes.starts_with(b"%PDF") {
                bail!("document is not a PDF");
            }
            Ok(Part::Inline {
                inline_data: InlineData {
                    mime_type: "application/pdf",
                    data: STANDARD.encode(bytes),
                },
            })
        }
    }
}

fn response_text(response: GenerateResponse) -> Result<String> {
    let block_reason = response.prompt_feedback.and_then(|f| f.block_reason);
    if let Some(reason) = block_reason {
        bail!("request blocked: {reason}");
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("response has no candidates"))?;

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        let reason = candidate.finish_reason.as_deref().unwrap_or("UNKNOWN");
        bail!("empty response (finish reason: {reason})");
    }
    Ok(text)
}

#[async_trait]
impl<C: HttpClient> TableExtractor for GeminiClient<C> {
    #[tracing::instrument(skip(self, request), fields(task = ?request.task, model = %self.model))]
    async fn extract(&self, request: ExtractionRequest) -> Result<String> {
        let prompt = request.prompt();
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part::Text { text: &prompt }, document_part(&request.document)?],
            }],
            safety_settings: SAFETY_CATEGORIES
                .iter()
                .map(|&category| SafetySetting {
                    category,
                    threshold: "BLOCK_NONE",
                })
                .collect(),
        };

        let response = post_json(&self.http, &self.endpoint(), &body)
            .await
            .map_err(|e| anyhow!("Failed to send extraction request: {}", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("API returned status {}: {}", status, body));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| anyhow!("Failed to parse response: {}", e))?;

        let text = response_text(parsed)?;
        debug!(chars = text.len(), "Extraction response received");
        Ok(text)
    }
}
