//! # Gemini collaborator
//!
//! Google Gemini client backing both AI collaborators: next-session
//! suggestions and PDF plan parsing. Requests ask for a JSON response
//! constrained by a response schema.
//!
//! The API key is read from `GEMINI_API_KEY` or the `gemini_api_key` config key.

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, error, instrument};

use crate::advisor::{Advisor, PlanDraft, PlanParser, SuggestionDraft, drafts_from_json};
use crate::models::{UserProfile, Workout};
use crate::prompt;

pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const API_KEY_HEADER: &str = "x-goog-api-key";
const SUGGESTION_TEMPERATURE: f32 = 0.7;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

fn suggestion_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "exerciseId": { "type": "NUMBER", "description": "The unique ID of the exercise." },
                "exerciseName": { "type": "STRING", "description": "The name of the exercise." },
                "suggestedWeight": { "type": "NUMBER", "description": "Suggested weight in kg for the next session." },
                "message": { "type": "STRING", "description": "A short, motivating note about this exercise." }
            },
            "required": ["exerciseId", "exerciseName", "suggestedWeight", "message"]
        }
    })
}

fn plan_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "name": { "type": "STRING", "description": "Name of the workout day, e.g. 'Push Day'." },
                "exercises": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "name": { "type": "STRING" },
                            "sets": { "type": "NUMBER" },
                            "reps": { "type": "NUMBER" }
                        },
                        "required": ["name", "sets", "reps"]
                    }
                }
            },
            "required": ["name", "exercises"]
        }
    })
}

pub struct GeminiClient {
    api_key: String,
    client: Client,
    model: String,
    base_url: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            client: Client::new(),
            model: DEFAULT_MODEL.to_owned(),
            base_url: API_BASE_URL.to_owned(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// The key travels in a header so it never appears in the URL or in
    /// transport errors.
    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    /// Send one user turn and return the model's JSON text.
    #[instrument(skip_all, fields(model = %self.model))]
    async fn generate_json(
        &self,
        parts: Vec<Part>,
        schema: Value,
        temperature: Option<f32>,
    ) -> Result<String> {
        let request = GenerateRequest {
            contents: vec![Content {
                role: Some("user".to_owned()),
                parts,
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: schema,
                temperature,
            },
        };

        debug!("sending request to Gemini");
        let response = self
            .client
            .post(self.url())
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(reqwest::Error::without_url)
            .context("Gemini request failed")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(reqwest::Error::without_url)
            .context("reading Gemini response")?;
        if !status.is_success() {
            error!(status = %status, "Gemini API error");
            bail!("Gemini returned {status}: {body}");
        }

        extract_text(&body)
    }
}

fn extract_text(body: &str) -> Result<String> {
    let parsed: GenerateResponse =
        serde_json::from_str(body).context("parsing Gemini response envelope")?;
    if let Some(err) = parsed.error {
        bail!("Gemini API error: {}", err.message);
    }

    parsed
        .candidates
        .into_iter()
        .flatten()
        .filter_map(|c| c.content)
        .flat_map(|c| c.parts)
        .find_map(|p| match p {
            Part::Text { text } => Some(text),
            Part::InlineData { .. } => None,
        })
        .ok_or_else(|| anyhow!("Gemini response has no text part"))
}

#[async_trait]
impl Advisor for GeminiClient {
    async fn suggest(
        &self,
        workout: &Workout,
        profile: Option<&UserProfile>,
    ) -> Result<Vec<SuggestionDraft>> {
        let text = prompt::suggestion_prompt(workout, profile);
        let json = self
            .generate_json(
                vec![Part::Text { text }],
                suggestion_schema(),
                Some(SUGGESTION_TEMPERATURE),
            )
            .await?;
        drafts_from_json(&json)
    }
}

#[async_trait]
impl PlanParser for GeminiClient {
    async fn parse_plan(&self, document: &[u8]) -> Result<Vec<PlanDraft>> {
        let parts = vec![
            Part::Text {
                text: prompt::PLAN_PROMPT.to_owned(),
            },
            Part::InlineData {
                inline_data: InlineData {
                    mime_type: "application/pdf".to_owned(),
                    data: STANDARD.encode(document),
                },
            },
        ];
        let json = self.generate_json(parts, plan_schema(), None).await?;
        drafts_from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_first_text_part() {
        let body = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"[]"}]}}]}"#;
        assert_eq!(extract_text(body).unwrap(), "[]");
    }

    #[test]
    fn api_errors_surface() {
        let body = r#"{"error":{"code":400,"message":"API key not valid"}}"#;
        let err = extract_text(body).unwrap_err();
        assert!(err.to_string().contains("API key not valid"));
        assert!(extract_text(r#"{"candidates":[]}"#).is_err());
    }

    #[test]
    fn inline_pdf_serialises_in_camel_case() {
        let part = Part::InlineData {
            inline_data: InlineData {
                mime_type: "application/pdf".into(),
                data: STANDARD.encode(b"%PDF"),
            },
        };
        let v = serde_json::to_value(&part).unwrap();
        assert_eq!(v["inlineData"]["mimeType"], "application/pdf");
        assert_eq!(v["inlineData"]["data"], "JVBERg==");
    }

    #[test]
    fn debug_hides_api_key() {
        let c = GeminiClient::new("secret-key");
        assert!(!format!("{c:?}").contains("secret-key"));
        assert!(!c.url().contains("secret-key"));
    }

    #[tokio::test]
    async fn transport_errors_do_not_leak_api_key() {
        let c = GeminiClient::new("SECRET123").with_base_url("http://127.0.0.1:1/v1beta");
        let workout = Workout::new("Day A", Vec::new());
        let err = c.suggest(&workout, None).await.unwrap_err();

        let text = format!("{err:#} {err:?}");
        assert!(text.contains("Gemini request failed"));
        assert!(!text.contains("SECRET123"));
    }
}
