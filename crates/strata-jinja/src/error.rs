//! Error types for strata-jinja

use thiserror::Error;

/// Jinja templating errors
#[derive(Error, Debug)]
pub enum JinjaError {
    /// Template render error (J001)
    #[error("[J001] Template error: {0}")]
    RenderError(String),

    /// Undefined value referenced by a template (J002)
    #[error("[J002] Undefined value: {0}. Define it in the data: section of strata.yml")]
    Undefined(String),

    /// Include of a partial that was never registered (J003)
    #[error("[J003] Unknown partial: {0}")]
    UnknownPartial(String),
}

/// Result type alias for JinjaError
pub type JinjaResult<T> = Result<T, JinjaError>;

impl From<minijinja::Error> for JinjaError {
    fn from(err: minijinja::Error) -> Self {
        match err.kind() {
            minijinja::ErrorKind::UndefinedError => JinjaError::Undefined(err.to_string()),
            minijinja::ErrorKind::TemplateNotFound => JinjaError::UnknownPartial(err.to_string()),
            _ => JinjaError::RenderError(err.to_string()),
        }
    }
}
