use crate::outcome::CheckOutcome;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Counts persisted alongside the outcomes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportSummary {
    pub bugs_checked: usize,
    pub total_outcomes: usize,
    pub passed: usize,
    pub mismatches: usize,
    pub success: bool,
}

/// Result of one verification run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VerificationReport {
    pub generated_at: DateTime<Utc>,
    pub summary: ReportSummary,
    pub outcomes: Vec<CheckOutcome>,
}

impl VerificationReport {
    pub fn new(bugs_checked: usize, outcomes: Vec<CheckOutcome>) -> Self {
        let passed = outcomes.iter().filter(|o| o.passed()).count();
        let mismatches = outcomes.len() - passed;
        Self {
            generated_at: Utc::now(),
            summary: ReportSummary {
                bugs_checked,
                total_outcomes: outcomes.len(),
                passed,
                mismatches,
                success: mismatches == 0,
            },
            outcomes,
        }
    }

    /// True when every rule behaved as its vectors declare.
    pub fn is_success(&self) -> bool {
        self.summary.success
    }

    pub fn mismatches(&self) -> impl Iterator<Item = &CheckOutcome> {
        self.outcomes.iter().filter(|o| !o.passed())
    }

    /// One-line human summary.
    pub fn summary_line(&self) -> String {
        let s = &self.summary;
        if s.success {
            format!(
                "all rules behave as declared: {} bug(s), {} vector check(s)",
                s.bugs_checked, s.total_outcomes
            )
        } else {
            format!(
                "{} of {} vector check(s) disagree with their labels across {} bug(s)",
                s.mismatches, s.total_outcomes, s.bugs_checked
            )
        }
    }
}

/// Write the report as pretty JSON.
pub fn write_report_json(path: &Path, report: &VerificationReport) -> Result<()> {
    let content = serde_json::to_string_pretty(report).context("serialize verification report")?;
    std::fs::write(path, content).with_context(|| format!("write {:?}", path))?;
    Ok(())
}
