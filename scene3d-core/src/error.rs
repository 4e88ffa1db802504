/// Errors raised by the scene core
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SceneError {
    /// A pop was issued against an empty matrix stack
    #[error("matrix stack underflow: pop on empty stack")]
    StackUnderflow,

    #[error("mesh object drawn before its buffer was initialized")]
    NotUploaded,

    #[error("mesh object buffer already initialized")]
    AlreadyUploaded,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to parse configuration: {0}")]
    ConfigParse(String),
}

pub type Result<T> = std::result::Result<T, SceneError>;
