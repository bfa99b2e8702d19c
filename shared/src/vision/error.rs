use serde_json::Value;
use thiserror::Error;

/// The vision model's reply broke the data contract
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ContractError {
    #[error("Failed to parse JSON response: {reason}")]
    Parse { reason: String, raw: String },

    #[error("Response JSON is not an object")]
    NotAnObject,

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid {field} value: {value}")]
    InvalidField { field: &'static str, value: Value },
}

/// Coarse failure class, for logs and metrics only
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Input,
    Service,
    Contract,
}

/// Every way one analysis can fail. All of them end in a failed record.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("Image file not found: {0}")]
    ImageNotFound(String),

    #[error("Error reading image: {0}")]
    ImageUnreadable(String),

    #[error("Error opening image: {0}")]
    ImageDecode(String),

    #[error("Vision service error: {0}")]
    Service(String),

    #[error("Empty response from vision service")]
    EmptyResponse,

    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl AnalysisError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AnalysisError::ImageNotFound(_)
            | AnalysisError::ImageUnreadable(_)
            | AnalysisError::ImageDecode(_) => ErrorKind::Input,
            AnalysisError::Service(_) | AnalysisError::EmptyResponse => ErrorKind::Service,
            AnalysisError::Contract(_) => ErrorKind::Contract,
        }
    }
}
