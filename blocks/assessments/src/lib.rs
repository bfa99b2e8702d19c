pub mod lifecycle;
pub mod upload;
