use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;

use crate::error::Result;
use crate::schema::ImagePayload;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

impl From<&ImagePayload> for Part {
    fn from(payload: &ImagePayload) -> Self {
        Part::InlineData {
            inline_data: InlineData {
                mime_type: payload.mime_type.clone(),
                data: payload.data.clone(),
            },
        }
    }
}

impl Content {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            parts: vec![Part::Text { text: text.into() }],
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: "model".to_string(),
            parts: vec![Part::Text { text: text.into() }],
        }
    }

    /// A user turn carrying an instruction followed by images, in order.
    pub fn user_with_images(text: impl Into<String>, images: &[ImagePayload]) -> Self {
        let mut parts = vec![Part::Text { text: text.into() }];
        parts.extend(images.iter().map(Part::from));
        Self {
            role: "user".to_string(),
            parts,
        }
    }

    pub fn image_count(&self) -> usize {
        self.parts
            .iter()
            .filter(|p| matches!(p, Part::InlineData { .. }))
            .count()
    }
}

/// Everything needed for one `generateContent` call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub model: String,
    pub system_instruction: Option<String>,
    pub contents: Vec<Content>,
    pub response_mime_type: Option<String>,
    pub response_schema: Option<serde_json::Value>,
}

impl GenerationRequest {
    pub fn new(model: impl Into<String>, contents: Vec<Content>) -> Self {
        Self {
            model: model.into(),
            system_instruction: None,
            contents,
            response_mime_type: None,
            response_schema: None,
        }
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    /// Requests JSON output constrained to `schema`.
    pub fn with_json_schema(mut self, schema: serde_json::Value) -> Self {
        self.response_mime_type = Some("application/json".to_string());
        self.response_schema = Some(schema);
        self
    }
}

/// The external generative model. Implemented over HTTP by `GeminiClient`;
/// tests substitute scripted models.
pub trait GenerativeModel {
    /// Whether credentials are present. Checked before any AI-backed work starts.
    fn is_configured(&self) -> bool {
        true
    }

    /// Returns the text of the first candidate.
    fn generate(&self, request: GenerationRequest) -> impl Future<Output = Result<String>> + Send;
}

impl<M: GenerativeModel + Send + Sync> GenerativeModel for Arc<M> {
    fn is_configured(&self) -> bool {
        (**self).is_configured()
    }

    fn generate(&self, request: GenerationRequest) -> impl Future<Output = Result<String>> + Send {
        (**self).generate(request)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProgressStage {
    Preparing,
    Analyzing,
    Finalizing,
}

/// One progress update for an import batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub processed_count: usize,
    pub total: usize,
    pub stage: ProgressStage,
    pub message: String,
}

impl Progress {
    pub fn preparing(processed_count: usize, total: usize, file_name: &str) -> Self {
        Self {
            processed_count,
            total,
            stage: ProgressStage::Preparing,
            message: format!("Preparing {}...", file_name),
        }
    }

    pub fn analyzing(total: usize) -> Self {
        Self {
            processed_count: total,
            total,
            stage: ProgressStage::Analyzing,
            message: "Analyzing with Gemini...".to_string(),
        }
    }

    pub fn finalizing(total: usize) -> Self {
        Self {
            processed_count: total,
            total,
            stage: ProgressStage::Finalizing,
            message: "Finalizing results...".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Model,
            text: text.into(),
        }
    }
}
