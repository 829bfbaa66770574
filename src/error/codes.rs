//! Standardized error codes for machine-parseable output.
//!
//! Error codes follow a numeric taxonomy:
//! - 1xx: Skill and bundle errors
//! - 3xx: Config errors
//! - 6xx: Storage errors
//! - 7xx: Git / relay errors
//! - 8xx: Validation errors
//! - 9xx: Internal errors

use serde::{Deserialize, Serialize};

/// Standardized error codes for JSON output.
///
/// Each variant maps to a numeric code (e.g., `SkillNotFound` -> E101).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ========================================
    // Skill / bundle errors (1xx)
    // ========================================
    /// E101: Skill directory does not exist
    SkillNotFound,
    /// E102: Skill directory exists but lacks SKILL.md
    SkillInvalid,
    /// E103: Nothing left to bundle after junk filtering
    BundleEmpty,
    /// E104: Archive could not be read or written
    BundleInvalid,

    // ========================================
    // Config errors (3xx)
    // ========================================
    /// E301: Config file not found
    ConfigNotFound,
    /// E302: Config file has invalid syntax or values
    ConfigInvalid,
    /// E304: Required config value is missing
    ConfigMissingRequired,

    // ========================================
    // Storage errors (6xx)
    // ========================================
    /// E605: JSON/YAML encoding failed
    SerializationError,

    // ========================================
    // Git errors (7xx)
    // ========================================
    /// E703: Relay clone or push failed
    GitRemoteError,
    /// E704: Local git operation failed
    GitError,

    // ========================================
    // Validation errors (8xx)
    // ========================================
    /// E801: Validation failed
    ValidationFailed,
    /// E802: Operation needs explicit approval
    ApprovalRequired,

    // ========================================
    // Internal errors (9xx)
    // ========================================
    /// E901: Unexpected internal error
    InternalError,
    /// E905: Resource not found
    NotFound,
    /// E906: IO operation failed
    IoError,
    /// E907: External tool (gh, git) failed
    ExternalToolFailed,
}

impl ErrorCode {
    /// Get the numeric code.
    #[must_use]
    pub const fn numeric(&self) -> u16 {
        match self {
            Self::SkillNotFound => 101,
            Self::SkillInvalid => 102,
            Self::BundleEmpty => 103,
            Self::BundleInvalid => 104,

            Self::ConfigNotFound => 301,
            Self::ConfigInvalid => 302,
            Self::ConfigMissingRequired => 304,

            Self::SerializationError => 605,

            Self::GitRemoteError => 703,
            Self::GitError => 704,

            Self::ValidationFailed => 801,
            Self::ApprovalRequired => 802,

            Self::InternalError => 901,
            Self::NotFound => 905,
            Self::IoError => 906,
            Self::ExternalToolFailed => 907,
        }
    }

    /// Get the error code as a formatted string (e.g., "E101").
    #[must_use]
    pub fn code_string(&self) -> String {
        format!("E{}", self.numeric())
    }

    /// Get the default suggestion for this error code.
    #[must_use]
    pub const fn suggestion(&self) -> &'static str {
        match self {
            Self::SkillNotFound => "Run `substrate bundle list` to see discoverable skills",
            Self::SkillInvalid => "Every skill directory needs a SKILL.md descriptor at its root",
            Self::BundleEmpty => "The skill only contains ignored files (.git, __pycache__, node_modules, .DS_Store, *.pyc)",
            Self::BundleInvalid => "Re-create the bundle with `substrate bundle create <skill>`",

            Self::ConfigNotFound => "Run `substrate setup init --identity <name> --partner <name> --repo <owner/repo>`, or pass --config <path>",
            Self::ConfigInvalid => "Check YAML syntax in substrate.yaml",
            Self::ConfigMissingRequired => "Set identity.name, partner.name and substrate.repo in substrate.yaml",

            Self::SerializationError => "The data format may be corrupted. Check input data for validity",

            Self::GitRemoteError => "Check the relay repository URL and credentials (GITHUB_TOKEN or SSH keys)",
            Self::GitError => "Check the relay clone with `git status`",

            Self::ValidationFailed => "Review the validation errors and fix each issue",
            Self::ApprovalRequired => "Re-run with --yes to approve the plan",

            Self::InternalError => "An unexpected error occurred. Please report this issue with full error output",
            Self::NotFound => "The requested resource was not found. Check the path or identifier",
            Self::IoError => "File operation failed. Check path exists and permissions are correct",
            Self::ExternalToolFailed => "Run `substrate setup check` to verify git and gh are installed",
        }
    }

    /// Check if this error is potentially recoverable by the user.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::InternalError | Self::SerializationError)
    }

    /// Get the error category name.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self.numeric() / 100 {
            1 => "skill",
            3 => "config",
            6 => "storage",
            7 => "git",
            8 => "validation",
            9 => "internal",
            _ => "unknown",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code_string())
    }
}
