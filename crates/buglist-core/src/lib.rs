//! Buglist Core - detection rule verification
//!
//! Checks that every detection rule in the compiler bug list classifies its
//! hand-written test vectors correctly:
//! - `regex-source` rules are matched against the raw snippet text
//! - `json-path` rules are evaluated on the AST produced by the compiler
//!   release that introduced the bug
//!
//! Rule verdicts that disagree with a vector's label are collected into a
//! [`VerificationReport`]; configuration and compiler failures abort the run.

pub mod config;
pub mod driver;
pub mod error;
pub mod outcome;
pub mod pattern;
pub mod registry;
pub mod report;
pub mod structural;
pub mod telemetry;
pub mod vectors;

pub use config::CheckerConfig;
pub use driver::Verifier;
pub use error::{BuglistError, ErrorClass, Result};
pub use outcome::{CheckOutcome, Label, RuleKind};
pub use pattern::PatternRule;
pub use registry::{BugRecord, BugRegistry, RawBugEntry, RawCheck, RuleSet};
pub use report::{write_report_json, ReportSummary, VerificationReport};
pub use structural::{PathStep, StructuralRule};
pub use telemetry::init_tracing;
pub use vectors::{VectorCorpus, VectorSection, VectorSet, DELIMITER};

pub use solc_fetch::{CompilerHandle, CompilerProvider, FetchConfig, FixedProvider, ReleaseProvider};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
