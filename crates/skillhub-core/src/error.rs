use thiserror::Error;

#[derive(Debug, Error)]
pub enum SkillhubError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Method not found: {method}")]
    MethodNotFound { method: String },
}

impl SkillhubError {
    /// Short error code string sent to clients in RPC response frames.
    pub fn code(&self) -> &'static str {
        match self {
            SkillhubError::Config(_) => "CONFIG_ERROR",
            SkillhubError::InvalidParams(_) => "INVALID_PARAMS",
            SkillhubError::MethodNotFound { .. } => "METHOD_NOT_FOUND",
        }
    }
}

pub type Result<T> = std::result::Result<T, SkillhubError>;
