//! Bug registry: the bug database indexed by name.

use crate::error::{BuglistError, Result};
use crate::pattern::PatternRule;
use crate::structural::{PathStep, StructuralRule};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// One entry of the bug database as stored on disk.
///
/// Fields the verifier does not use are ignored.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RawBugEntry {
    pub name: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub introduced: Option<String>,
    #[serde(default)]
    pub fixed: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub check: RawCheck,
}

/// The `check` mapping of a database entry.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct RawCheck {
    #[serde(rename = "regex-source", default)]
    pub regex_source: Option<String>,
    #[serde(rename = "json-path", default)]
    pub json_path: Option<Vec<PathStep>>,
}

/// Detection rules a bug carries. Either, both or neither may be present.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    pub pattern: Option<PatternRule>,
    pub structural: Option<StructuralRule>,
}

impl RuleSet {
    pub fn is_empty(&self) -> bool {
        self.pattern.is_none() && self.structural.is_none()
    }
}

/// A loaded, validated bug record.
#[derive(Debug, Clone)]
pub struct BugRecord {
    pub name: String,
    pub summary: Option<String>,
    pub introduced: Option<String>,
    pub fixed: Option<String>,
    pub severity: Option<String>,
    pub rules: RuleSet,
}

impl BugRecord {
    fn from_raw(raw: RawBugEntry) -> Result<Self> {
        let pattern = raw
            .check
            .regex_source
            .as_deref()
            .map(|source| PatternRule::new(&raw.name, source))
            .transpose()?;

        let structural = match raw.check.json_path {
            Some(steps) => {
                let version = raw
                    .introduced
                    .clone()
                    .ok_or_else(|| BuglistError::MissingIntroduced {
                        bug: raw.name.clone(),
                    })?;
                Some(StructuralRule::new(&raw.name, steps, version)?)
            }
            None => None,
        };

        Ok(Self {
            name: raw.name,
            summary: raw.summary,
            introduced: raw.introduced,
            fixed: raw.fixed,
            severity: raw.severity,
            rules: RuleSet {
                pattern,
                structural,
            },
        })
    }
}

/// Bug records indexed by unique name, kept in database order.
#[derive(Debug, Clone, Default)]
pub struct BugRegistry {
    records: Vec<BugRecord>,
    by_name: HashMap<String, usize>,
}

impl BugRegistry {
    /// Validate and index raw entries. Fails on the first duplicate name or
    /// invalid rule.
    pub fn load(entries: impl IntoIterator<Item = RawBugEntry>) -> Result<Self> {
        let mut registry = Self::default();
        for raw in entries {
            if registry.by_name.contains_key(&raw.name) {
                return Err(BuglistError::DuplicateName { name: raw.name });
            }
            let record = BugRecord::from_raw(raw)?;
            registry
                .by_name
                .insert(record.name.clone(), registry.records.len());
            registry.records.push(record);
        }
        Ok(registry)
    }

    /// Parse a JSON array of bug entries.
    pub fn from_json(text: &str) -> Result<Self> {
        let entries: Vec<RawBugEntry> = serde_json::from_str(text)?;
        Self::load(entries)
    }

    /// Read and load a bug database file.
    pub fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn lookup(&self, name: &str) -> Result<&BugRecord> {
        self.by_name
            .get(name)
            .map(|&idx| &self.records[idx])
            .ok_or_else(|| BuglistError::UnknownBug {
                name: name.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BugRecord> {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATABASE: &str = r#"[
        {
            "name": "X",
            "summary": "Runs of three or more a",
            "introduced": "0.1.0",
            "fixed": "0.4.25",
            "severity": "low",
            "check": {"regex-source": "a{3,}"}
        },
        {
            "name": "Y",
            "introduced": "0.4.0",
            "check": {"json-path": [{"name": "foo", "type": "uint"}]}
        },
        {
            "name": "Both",
            "introduced": "0.4.0",
            "check": {
                "regex-source": "foo",
                "json-path": [{"name": "FunctionCall"}, {"name": "Identifier"}]
            }
        },
        {
            "name": "NoCheck",
            "link": "https://example.invalid/advisory",
            "check": {}
        }
    ]"#;

    #[test]
    fn loads_rules_by_key() {
        let registry = BugRegistry::from_json(DATABASE).unwrap();
        assert_eq!(registry.len(), 4);

        let x = registry.lookup("X").unwrap();
        assert_eq!(x.rules.pattern.as_ref().unwrap().source(), "a{3,}");
        assert!(x.rules.structural.is_none());
        assert_eq!(x.severity.as_deref(), Some("low"));

        let y = registry.lookup("Y").unwrap();
        assert!(y.rules.pattern.is_none());
        let rule = y.rules.structural.as_ref().unwrap();
        assert_eq!(rule.compiler_version(), "0.4.0");
        assert_eq!(rule.steps()[0].type_prefix.as_deref(), Some("uint"));

        let both = registry.lookup("Both").unwrap();
        assert!(both.rules.pattern.is_some());
        assert_eq!(both.rules.structural.as_ref().unwrap().steps().len(), 2);

        assert!(registry.lookup("NoCheck").unwrap().rules.is_empty());
    }

    #[test]
    fn preserves_database_order() {
        let registry = BugRegistry::from_json(DATABASE).unwrap();
        let names: Vec<_> = registry.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["X", "Y", "Both", "NoCheck"]);
    }

    #[test]
    fn duplicate_name_rejected() {
        let db = r#"[
            {"name": "X", "check": {"regex-source": "a"}},
            {"name": "X", "check": {"regex-source": "b"}}
        ]"#;
        let err = BugRegistry::from_json(db).unwrap_err();
        assert!(matches!(err, BuglistError::DuplicateName { ref name } if name == "X"));
    }

    #[test]
    fn unknown_lookup_fails() {
        let registry = BugRegistry::from_json(DATABASE).unwrap();
        let err = registry.lookup("Z").unwrap_err();
        assert!(matches!(err, BuglistError::UnknownBug { ref name } if name == "Z"));
    }

    #[test]
    fn invalid_regex_rejected_at_load() {
        let db = r#"[{"name": "Bad", "check": {"regex-source": "(unclosed"}}]"#;
        let err = BugRegistry::from_json(db).unwrap_err();
        assert!(matches!(err, BuglistError::InvalidPattern { ref bug, .. } if bug == "Bad"));
    }

    #[test]
    fn empty_path_rejected_at_load() {
        let db = r#"[{"name": "E", "introduced": "0.4.0", "check": {"json-path": []}}]"#;
        let err = BugRegistry::from_json(db).unwrap_err();
        assert!(matches!(err, BuglistError::EmptyPath { .. }));
    }

    #[test]
    fn structural_rule_needs_introduced_version() {
        let db = r#"[{"name": "V", "check": {"json-path": [{"name": "foo"}]}}]"#;
        let err = BugRegistry::from_json(db).unwrap_err();
        assert!(matches!(err, BuglistError::MissingIntroduced { .. }));
    }

    #[test]
    fn malformed_json_is_a_database_error() {
        let err = BugRegistry::from_json("{not json").unwrap_err();
        assert!(matches!(err, BuglistError::Database(_)));
    }
}
