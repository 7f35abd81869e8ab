use log::{error, info};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::auth::FaceVerifier;
use crate::config::DEFAULT_MODEL_NAME;
use crate::error::{Result, StatementError};
use crate::llm::prompts::FACE_MATCH_PROMPT;
use crate::llm::types::*;
use crate::llm::utils::{clean_json_output, gemini_schema};
use crate::schema::ImagePayload;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FaceMatchResponse {
    #[serde(rename = "match")]
    #[schemars(description = "True only if both images show the same person.")]
    pub is_match: bool,
}

/// Delegates face comparison to the model.
pub struct FaceMatcher<M: GenerativeModel> {
    model: M,
    model_name: String,
}

impl<M: GenerativeModel> FaceMatcher<M> {
    pub fn new(model: M) -> Self {
        Self {
            model,
            model_name: DEFAULT_MODEL_NAME.to_string(),
        }
    }

    pub fn with_model_name(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = model_name.into();
        self
    }

    async fn request_match(&self, reference: &ImagePayload, live: &ImagePayload) -> Result<bool> {
        if !self.model.is_configured() {
            return Err(StatementError::Configuration(
                "GEMINI_API_KEY environment variable not set".to_string(),
            ));
        }

        let request = GenerationRequest::new(
            self.model_name.clone(),
            vec![Content::user_with_images(
                FACE_MATCH_PROMPT,
                &[reference.clone(), live.clone()],
            )],
        )
        .with_json_schema(gemini_schema::<FaceMatchResponse>()?);

        let raw = self.model.generate(request).await?;
        let response: FaceMatchResponse = serde_json::from_str(clean_json_output(&raw))
            .map_err(|e| StatementError::MalformedResponse(e.to_string()))?;
        Ok(response.is_match)
    }
}

impl<M: GenerativeModel + Sync> FaceVerifier for FaceMatcher<M> {
    async fn compare(&self, reference: &ImagePayload, live: &ImagePayload) -> Result<bool> {
        match self.request_match(reference, live).await {
            Ok(is_match) => {
                info!("Face comparison returned match={}", is_match);
                Ok(is_match)
            }
            Err(e) => {
                error!("Face verification failed: {}", e);
                Err(StatementError::FaceVerification(e.to_string()))
            }
        }
    }
}
