use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StatementError};
use crate::llm::types::*;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: &'a [Content],
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<&'a serde_json::Value>,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    parts: Option<Vec<ResponsePart>>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: GEMINI_BASE_URL.to_string(),
        }
    }

    /// Reads `GEMINI_API_KEY` (or `API_KEY`). A missing key is a configuration error.
    pub fn from_env() -> Result<Self> {
        let config = crate::config::AnalyzerConfig::from_env();
        Ok(Self::new(config.require_api_key()?))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn generate_content(&self, request: &GenerationRequest) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, request.model, self.api_key
        );

        let payload = build_payload(request);

        let res = self.client.post(&url).json(&payload).send().await?;
        let status = res.status();

        if !status.is_success() {
            let err_text = res.text().await?;
            return Err(StatementError::AnalysisService(format!(
                "Gemini API Error (status {}): {}",
                status, err_text
            )));
        }

        let body: GenerateContentResponse = res.json().await?;

        let text = body
            .candidates
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.content)
            .and_then(|c| c.parts)
            .ok_or_else(|| StatementError::AnalysisService("No candidates returned".to_string()))?
            .into_iter()
            .filter_map(|p| p.text)
            .collect::<String>();

        debug!("Gemini returned {} characters", text.len());
        Ok(text)
    }
}

fn build_payload(request: &GenerationRequest) -> GenerateContentRequest<'_> {
    let system_instruction = request.system_instruction.as_ref().map(|text| Content {
        role: "user".to_string(),
        parts: vec![Part::Text { text: text.clone() }],
    });

    let generation_config =
        if request.response_mime_type.is_some() || request.response_schema.is_some() {
            Some(GenerationConfig {
                response_mime_type: request.response_mime_type.as_deref(),
                response_schema: request.response_schema.as_ref(),
            })
        } else {
            None
        };

    GenerateContentRequest {
        contents: &request.contents,
        system_instruction,
        generation_config,
    }
}

impl GenerativeModel for GeminiClient {
    fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    async fn generate(&self, request: GenerationRequest) -> Result<String> {
        self.generate_content(&request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let request = GenerationRequest::new("gemini-2.5-flash", vec![Content::user("hi")])
            .with_system_instruction("be brief")
            .with_json_schema(serde_json::json!({ "type": "object" }));

        let json = serde_json::to_value(build_payload(&request)).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "be brief");
        assert_eq!(json["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(json["generationConfig"]["responseSchema"]["type"], "object");
    }

    #[test]
    fn test_plain_request_omits_optional_fields() {
        let request = GenerationRequest::new("gemini-2.5-flash", vec![Content::user("hi")]);
        let json = serde_json::to_value(build_payload(&request)).unwrap();
        assert!(json.get("systemInstruction").is_none());
        assert!(json.get("generationConfig").is_none());
    }

    #[test]
    fn test_empty_key_is_not_configured() {
        assert!(!GeminiClient::new("  ").is_configured());
        assert!(GeminiClient::new("key").is_configured());
    }
}
