//! Error taxonomy for bug list verification.
//!
//! Everything here is fatal: it stops the run. Rule verdicts that disagree
//! with a vector's label are not errors; they are failing
//! [`CheckOutcome`](crate::CheckOutcome)s collected by the driver.

use solc_fetch::FetchError;

/// Broad class of a fatal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Bug database or vector document is inconsistent.
    Configuration,
    /// Acquiring or running the compiler, or reading its output, failed.
    ToolInvocation,
}

/// Verification errors.
#[derive(Debug, thiserror::Error)]
pub enum BuglistError {
    #[error("duplicate bug name: {name}")]
    DuplicateName { name: String },

    #[error("unknown bug name: {name}")]
    UnknownBug { name: String },

    #[error("malformed test vector section at line {line}: {reason}")]
    MalformedSection { line: usize, reason: String },

    #[error("bug {name} has more than one test vector section (second at line {line})")]
    DuplicateSection { name: String, line: usize },

    #[error("bug {bug}: invalid regex-source: {source}")]
    InvalidPattern {
        bug: String,
        #[source]
        source: regex::Error,
    },

    #[error("bug {bug}: json-path must contain at least one step")]
    EmptyPath { bug: String },

    #[error("bug {bug}: json-path check requires an introduced version")]
    MissingIntroduced { bug: String },

    #[error("invalid bug database: {0}")]
    Database(#[from] serde_json::Error),

    #[error("bug {bug}: compiler {version} unavailable: {source}")]
    Fetch {
        bug: String,
        version: String,
        #[source]
        source: FetchError,
    },

    #[error("bug {bug}: compiler invocation failed for {snippet}: {reason}")]
    ToolInvocation {
        bug: String,
        snippet: String,
        reason: String,
    },

    #[error("bug {bug}: unreadable AST output for {snippet}: {reason}")]
    MalformedAst {
        bug: String,
        snippet: String,
        reason: String,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl BuglistError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::DuplicateName { .. }
            | Self::UnknownBug { .. }
            | Self::MalformedSection { .. }
            | Self::DuplicateSection { .. }
            | Self::InvalidPattern { .. }
            | Self::EmptyPath { .. }
            | Self::MissingIntroduced { .. }
            | Self::Database(_) => ErrorClass::Configuration,
            Self::Fetch { .. }
            | Self::ToolInvocation { .. }
            | Self::MalformedAst { .. }
            | Self::Io(_) => ErrorClass::ToolInvocation,
        }
    }
}

/// Result type for verification operations.
pub type Result<T> = std::result::Result<T, BuglistError>;
