//! Vision request adapter and response validator.

pub mod analyzer;
pub mod error;
pub mod gemini;
pub mod preprocess;
pub mod prompt;
pub mod validator;

pub use analyzer::RoadAnalyzer;
pub use error::{AnalysisError, ContractError, ErrorKind};
pub use gemini::{GeminiClient, VisionModel};
pub use preprocess::{prepare_image, PreparedImage};
pub use validator::validate;
