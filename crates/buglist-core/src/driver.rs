//! Verification driver: runs every applicable rule over every vector section.

use crate::config::CheckerConfig;
use crate::error::Result;
use crate::outcome::CheckOutcome;
use crate::registry::BugRegistry;
use crate::report::VerificationReport;
use crate::vectors::{VectorCorpus, VectorSection};
use solc_fetch::CompilerProvider;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Ties the registry, the vector corpus and the checkers together.
pub struct Verifier {
    registry: BugRegistry,
    provider: Arc<dyn CompilerProvider>,
    config: CheckerConfig,
}

impl Verifier {
    pub fn new(
        registry: BugRegistry,
        provider: Arc<dyn CompilerProvider>,
        config: CheckerConfig,
    ) -> Self {
        Self {
            registry,
            provider,
            config,
        }
    }

    pub fn registry(&self) -> &BugRegistry {
        &self.registry
    }

    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    /// Run the rules of one section's bug over its vectors.
    ///
    /// The pattern rule and the structural rule run independently; a bug with
    /// neither produces no outcomes.
    pub async fn verify_section(&self, section: &VectorSection<'_>) -> Result<Vec<CheckOutcome>> {
        let record = section.record;
        let vectors = &section.vectors;
        let mut outcomes = Vec::new();

        if let Some(rule) = &record.rules.pattern {
            outcomes.extend(rule.check(&record.name, &vectors.buggy, &vectors.fine));
        }

        if let Some(rule) = &record.rules.structural {
            let structural = rule
                .check(
                    &record.name,
                    &vectors.buggy,
                    &vectors.fine,
                    self.provider.as_ref(),
                    &self.config,
                )
                .await?;
            outcomes.extend(structural);
        }

        if record.rules.is_empty() {
            debug!(bug = %record.name, "Bug has no regex-source or json-path rule; nothing to check");
        }
        Ok(outcomes)
    }

    /// Verify every section of `corpus`.
    ///
    /// Mismatches are collected into the report. Configuration and compiler
    /// errors stop the run at once.
    pub async fn run(&self, corpus: &VectorCorpus) -> Result<VerificationReport> {
        let start = Instant::now();
        let mut outcomes = Vec::new();
        let mut bugs_checked = 0usize;

        for section in corpus.sections(&self.registry) {
            let section = section?;
            info!(
                "Testing {} with {} buggy and {} fine instances",
                section.record.name,
                section.vectors.buggy.len(),
                section.vectors.fine.len()
            );

            let section_outcomes = self.verify_section(&section).await?;
            for mismatch in section_outcomes.iter().filter(|o| !o.passed()) {
                warn!(
                    bug = %mismatch.bug_name,
                    rule = %mismatch.rule,
                    snippet = mismatch.snippet_index,
                    expected = %mismatch.expected,
                    actual = mismatch.actual,
                    reason = mismatch.mismatch_reason().unwrap_or_default(),
                    "Rule verdict disagrees with vector label"
                );
            }
            outcomes.extend(section_outcomes);
            bugs_checked += 1;
        }

        let report = VerificationReport::new(bugs_checked, outcomes);
        info!(
            bugs = report.summary.bugs_checked,
            checks = report.summary.total_outcomes,
            mismatches = report.summary.mismatches,
            duration_ms = start.elapsed().as_millis() as u64,
            "Verification finished"
        );
        Ok(report)
    }
}
