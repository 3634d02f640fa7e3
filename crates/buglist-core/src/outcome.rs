//! Per-snippet check results.

use serde::{Deserialize, Serialize};

/// Label a test vector carries in the vector document.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    Buggy,
    Fine,
}

impl Label {
    pub fn is_buggy(self) -> bool {
        matches!(self, Label::Buggy)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Label::Buggy => "buggy",
            Label::Fine => "fine",
        }
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which checker produced an outcome.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Pattern,
    Structural,
}

impl std::fmt::Display for RuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleKind::Pattern => f.write_str("regex-source"),
            RuleKind::Structural => f.write_str("json-path"),
        }
    }
}

/// Verdict of one rule on one snippet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckOutcome {
    pub bug_name: String,
    pub rule: RuleKind,
    /// Position within the snippet's own list (buggy and fine count separately).
    pub snippet_index: usize,
    pub expected: Label,
    /// Whether the rule flagged the snippet.
    pub actual: bool,
    /// The snippet, plus the query for structural rules.
    pub detail: String,
}

impl CheckOutcome {
    pub fn passed(&self) -> bool {
        self.actual == self.expected.is_buggy()
    }

    /// Short description of what went wrong; `None` when the outcome passed.
    pub fn mismatch_reason(&self) -> Option<&'static str> {
        match (self.passed(), self.expected) {
            (true, _) => None,
            (false, Label::Buggy) => Some("buggy source not flagged"),
            (false, Label::Fine) => Some("fine source falsely flagged"),
        }
    }
}

impl std::fmt::Display for CheckOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "bug {} [{}] {} #{}: expected {}, rule {}",
            self.bug_name,
            self.rule,
            self.expected,
            self.snippet_index,
            if self.expected.is_buggy() { "match" } else { "no match" },
            if self.actual { "matched" } else { "did not match" },
        )?;
        if let Some(reason) = self.mismatch_reason() {
            write!(f, " ({reason}):\n{}", self.detail)?;
        }
        Ok(())
    }
}
