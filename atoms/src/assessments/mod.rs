// Re-export model types and service functions
pub mod model;
pub mod service;
pub mod http;

pub use model::{
    AnalysisResult, AnalysisStatus, Assessment, AssessmentView, Severity, TransitionError,
};
pub use service::*;
pub use http::*;
