//! Error handling for substrate.
//!
//! - [`SubstrateError`]: the error enum for all operations
//! - [`ErrorCode`]: standardized codes for machine parsing
//! - [`StructuredError`]: serializable error with suggestion and context

mod codes;

use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use codes::ErrorCode;

/// Main error type for substrate operations.
#[derive(Error, Debug)]
pub enum SubstrateError {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Config not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("Config validation failed:\n  {}", .0.join("\n  "))]
    ConfigValidation(Vec<String>),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Skill not found: {}", .0.display())]
    SkillNotFound(PathBuf),

    #[error("Skill missing SKILL.md: {}", .0.display())]
    InvalidSkill(PathBuf),

    #[error("No files found in skill: {}", .0.display())]
    EmptyBundle(PathBuf),

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Operation requires approval: {0}")]
    ApprovalRequired(String),

    #[error("Relay error: {0}")]
    Relay(String),

    #[error("Command failed: {0}")]
    Command(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl SubstrateError {
    /// Get the error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Git(_) => ErrorCode::GitError,
            Self::Io(_) | Self::Walk(_) => ErrorCode::IoError,
            Self::Json(_) | Self::Yaml(_) => ErrorCode::SerializationError,
            Self::ConfigNotFound(_) => ErrorCode::ConfigNotFound,
            Self::ConfigValidation(_) => ErrorCode::ConfigMissingRequired,
            Self::Config(_) => ErrorCode::ConfigInvalid,
            Self::SkillNotFound(_) => ErrorCode::SkillNotFound,
            Self::InvalidSkill(_) => ErrorCode::SkillInvalid,
            Self::EmptyBundle(_) => ErrorCode::BundleEmpty,
            Self::Archive(_) => ErrorCode::BundleInvalid,
            Self::ValidationFailed(_) => ErrorCode::ValidationFailed,
            Self::ApprovalRequired(_) => ErrorCode::ApprovalRequired,
            Self::Relay(_) => ErrorCode::GitRemoteError,
            Self::Command(_) => ErrorCode::ExternalToolFailed,
            Self::NotFound(_) => ErrorCode::NotFound,
        }
    }

    /// Get context information for this error as JSON.
    #[must_use]
    pub fn context(&self) -> Option<Value> {
        match self {
            Self::ConfigNotFound(path)
            | Self::SkillNotFound(path)
            | Self::InvalidSkill(path)
            | Self::EmptyBundle(path) => {
                Some(serde_json::json!({ "path": path.display().to_string() }))
            }
            Self::ConfigValidation(missing) => Some(serde_json::json!({ "errors": missing })),
            _ => None,
        }
    }

    /// Convert this error to a structured error.
    #[must_use]
    pub fn to_structured(&self) -> StructuredError {
        StructuredError::from_error(self)
    }
}

/// A structured error with machine-readable code, suggestion, and context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// The error code (e.g., "SKILL_NOT_FOUND")
    pub code: ErrorCode,

    /// The numeric error code (e.g., 101)
    pub numeric_code: u16,

    /// Human-readable error message
    pub message: String,

    /// Actionable suggestion for recovery
    pub suggestion: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,

    pub recoverable: bool,

    /// Error category (e.g., "skill", "config")
    pub category: String,
}

impl StructuredError {
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            numeric_code: code.numeric(),
            suggestion: code.suggestion().to_string(),
            context: None,
            recoverable: code.is_recoverable(),
            category: code.category().to_string(),
            code,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn from_error(err: &SubstrateError) -> Self {
        let mut structured = Self::new(err.code(), err.to_string());
        structured.context = err.context();
        structured
    }
}

impl std::fmt::Display for StructuredError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl From<&SubstrateError> for StructuredError {
    fn from(err: &SubstrateError) -> Self {
        Self::from_error(err)
    }
}

/// Result type alias using SubstrateError.
pub type Result<T> = std::result::Result<T, SubstrateError>;
