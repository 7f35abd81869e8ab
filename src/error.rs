use thiserror::Error;

#[derive(Error, Debug)]
pub enum StatementError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Unsupported file type '{mime_type}' for {name}")]
    UnsupportedFile { name: String, mime_type: String },

    #[error("No valid files to process. Please upload supported file types (PDF, PNG, JPG).")]
    NoValidInput,

    #[error("Analysis service error: {0}")]
    AnalysisService(String),

    #[error("Could not process the statement. The AI response was not in the expected format: {0}")]
    MalformedResponse(String),

    #[error("Face verification failed: {0}")]
    FaceVerification(String),

    #[error("Stored ledger snapshot is unreadable: {0}")]
    PersistenceCorruption(String),

    #[error("Failed to render document {name}: {details}")]
    DocumentRender { name: String, details: String },

    #[error("Invalid entry: {0}")]
    InvalidEntry(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

#[cfg(feature = "gemini")]
impl From<reqwest::Error> for StatementError {
    fn from(err: reqwest::Error) -> Self {
        StatementError::AnalysisService(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StatementError>;
