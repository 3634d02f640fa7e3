//! AST path detection rules.
//!
//! A `json-path` rule is a chain of steps. The first step searches the whole
//! AST; every further step searches only below the nodes the previous step
//! matched. A snippet is flagged when the last step matches anything.

pub mod ast;
pub mod compile;

use crate::config::CheckerConfig;
use crate::error::{BuglistError, Result};
use crate::outcome::{CheckOutcome, Label, RuleKind};
use compile::{compile_to_ast, SnippetId};
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use solc_fetch::CompilerProvider;
use tracing::{debug, info};

/// One step of a `json-path` rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PathStep {
    /// Required value of the node's `name` field.
    pub name: String,
    /// Required prefix of the node's `attributes.type`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_prefix: Option<String>,
}

/// A validated `json-path` rule bound to the compiler release it needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuralRule {
    steps: Vec<PathStep>,
    compiler_version: String,
}

impl StructuralRule {
    pub fn new(bug: &str, steps: Vec<PathStep>, compiler_version: impl Into<String>) -> Result<Self> {
        if steps.is_empty() {
            return Err(BuglistError::EmptyPath {
                bug: bug.to_string(),
            });
        }
        Ok(Self {
            steps,
            compiler_version: compiler_version.into(),
        })
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    /// Version of the compiler the snippets are built with (the bug's
    /// `introduced` release).
    pub fn compiler_version(&self) -> &str {
        &self.compiler_version
    }

    /// The rule written as a JSONPath filter chain, for diagnostics.
    pub fn query(&self) -> String {
        let mut query = String::from("$");
        for step in &self.steps {
            query.push_str(&format!("..[?(@.name === '{}'", step.name));
            if let Some(prefix) = &step.type_prefix {
                query.push_str(&format!(" && @.attributes.type.startsWith('{prefix}')"));
            }
            query.push_str(")]");
        }
        query
    }

    /// Whether the AST contains a node satisfying the full step chain.
    pub fn flags(&self, ast: &Value) -> bool {
        !ast::query(ast, &self.steps).is_empty()
    }

    /// Compile every snippet with the rule's compiler and compare verdicts to
    /// labels.
    ///
    /// Verdict mismatches come back as failing outcomes. Compiler acquisition
    /// or invocation failures abort the whole check with an error.
    pub async fn check(
        &self,
        bug: &str,
        buggy: &[String],
        fine: &[String],
        provider: &dyn CompilerProvider,
        config: &CheckerConfig,
    ) -> Result<Vec<CheckOutcome>> {
        if buggy.is_empty() && fine.is_empty() {
            return Ok(Vec::new());
        }

        let compiler = provider
            .compiler_for(&self.compiler_version)
            .await
            .map_err(|source| BuglistError::Fetch {
                bug: bug.to_string(),
                version: self.compiler_version.clone(),
                source,
            })?;
        let query = self.query();
        info!(bug, compiler = %compiler, query = %query, "Running json-path check");

        let labeled = buggy
            .iter()
            .enumerate()
            .map(|(i, s)| (Label::Buggy, i, s))
            .chain(fine.iter().enumerate().map(|(i, s)| (Label::Fine, i, s)));

        let compiler = &compiler;
        let query = query.as_str();
        stream::iter(labeled)
            .map(move |(expected, index, snippet)| async move {
                let id = SnippetId {
                    label: expected,
                    index,
                };
                let ast = compile_to_ast(compiler, bug, id, snippet, config).await?;
                let actual = self.flags(&ast);
                debug!(bug, snippet = %id, matched = actual, "Evaluated json-path");
                Ok::<_, BuglistError>(CheckOutcome {
                    bug_name: bug.to_string(),
                    rule: RuleKind::Structural,
                    snippet_index: index,
                    expected,
                    actual,
                    detail: format!("{snippet}\nquery: {query}"),
                })
            })
            .buffered(config.max_concurrent_compiles.max(1))
            .try_collect()
            .await
    }
}
