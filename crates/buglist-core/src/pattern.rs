//! Regex detection rules over raw source text.

use crate::error::{BuglistError, Result};
use crate::outcome::{CheckOutcome, Label, RuleKind};
use regex::Regex;

/// A compiled `regex-source` rule.
#[derive(Debug, Clone)]
pub struct PatternRule {
    regex: Regex,
}

impl PatternRule {
    /// Compile `source` for `bug`. Flags such as `(?m)` or `(?i)` are honoured
    /// when the pattern sets them; otherwise matching is case-sensitive and
    /// `^`/`$` anchor to the whole snippet.
    pub fn new(bug: &str, source: &str) -> Result<Self> {
        let regex = Regex::new(source).map_err(|source| BuglistError::InvalidPattern {
            bug: bug.to_string(),
            source,
        })?;
        Ok(Self { regex })
    }

    pub fn source(&self) -> &str {
        self.regex.as_str()
    }

    /// Whether the rule flags `snippet` (substring search).
    pub fn flags(&self, snippet: &str) -> bool {
        self.regex.is_match(snippet)
    }

    /// Run the rule over both vector lists, one outcome per snippet.
    pub fn check(&self, bug: &str, buggy: &[String], fine: &[String]) -> Vec<CheckOutcome> {
        let labeled = buggy
            .iter()
            .enumerate()
            .map(|(i, s)| (Label::Buggy, i, s))
            .chain(fine.iter().enumerate().map(|(i, s)| (Label::Fine, i, s)));

        labeled
            .map(|(expected, snippet_index, snippet)| CheckOutcome {
                bug_name: bug.to_string(),
                rule: RuleKind::Pattern,
                snippet_index,
                expected,
                actual: self.flags(snippet),
                detail: snippet.clone(),
            })
            .collect()
    }
}
