//! Compiling one snippet to an AST.
//!
//! Each snippet gets its own scratch directory holding `<id>.sol` and the
//! captured `<id>.ast.json`. The directory is a [`TempDir`], so it is removed
//! when this function returns or its future is dropped, whichever path
//! got there.

use super::ast::extract_json_object;
use crate::config::CheckerConfig;
use crate::error::{BuglistError, Result};
use crate::outcome::Label;
use serde_json::Value;
use solc_fetch::CompilerHandle;
use std::process::Stdio;
use std::time::Instant;
use tempfile::TempDir;
use tokio::process::Command;
use tracing::debug;

/// Index-qualified snippet name, unique within one bug's check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SnippetId {
    pub label: Label,
    pub index: usize,
}

impl std::fmt::Display for SnippetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.label, self.index)
    }
}

fn scratch_dir(bug: &str, config: &CheckerConfig) -> std::io::Result<TempDir> {
    let slug: String = bug
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    let prefix = format!("buglist-{slug}-");
    let mut builder = tempfile::Builder::new();
    builder.prefix(&prefix);
    match &config.scratch_dir {
        Some(parent) => builder.tempdir_in(parent),
        None => builder.tempdir(),
    }
}

/// Run `<compiler> --ast-json <snippet file>` and parse the AST it prints.
pub async fn compile_to_ast(
    compiler: &CompilerHandle,
    bug: &str,
    id: SnippetId,
    snippet: &str,
    config: &CheckerConfig,
) -> Result<Value> {
    let tool_error = |reason: String| BuglistError::ToolInvocation {
        bug: bug.to_string(),
        snippet: id.to_string(),
        reason,
    };

    let dir = scratch_dir(bug, config)?;
    let source_path = dir.path().join(format!("{id}.sol"));
    let ast_path = dir.path().join(format!("{id}.ast.json"));
    tokio::fs::write(&source_path, snippet).await?;
    let ast_file = std::fs::File::create(&ast_path)?;

    let start = Instant::now();
    let child = Command::new(&compiler.path)
        .arg("--ast-json")
        .arg(&source_path)
        .stdin(Stdio::null())
        .stdout(Stdio::from(ast_file))
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| tool_error(format!("failed to start compiler {compiler}: {e}")))?;

    let output = tokio::time::timeout(config.compiler_timeout, child.wait_with_output())
        .await
        .map_err(|_| {
            tool_error(format!(
                "compiler {compiler} timed out after {:?}",
                config.compiler_timeout
            ))
        })?
        .map_err(|e| tool_error(format!("failed waiting for compiler {compiler}: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(tool_error(format!(
            "compiler {compiler} exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    let raw = tokio::fs::read(&ast_path).await?;
    let raw = String::from_utf8_lossy(&raw);
    debug!(
        bug,
        snippet = %id,
        bytes = raw.len(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Compiled snippet"
    );
    if raw.trim().is_empty() {
        return Err(tool_error(format!("compiler {compiler} produced no output")));
    }

    let malformed = |reason: String| BuglistError::MalformedAst {
        bug: bug.to_string(),
        snippet: id.to_string(),
        reason,
    };
    let json = extract_json_object(&raw)
        .ok_or_else(|| malformed("no balanced JSON object in compiler output".to_string()))?;
    serde_json::from_str(json).map_err(|e| malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snippet_ids_are_label_qualified() {
        let buggy = SnippetId {
            label: Label::Buggy,
            index: 0,
        };
        let fine = SnippetId {
            label: Label::Fine,
            index: 0,
        };
        assert_eq!(buggy.to_string(), "buggy-0");
        assert_eq!(fine.to_string(), "fine-0");
        assert_ne!(buggy.to_string(), fine.to_string());
    }

    #[test]
    fn scratch_dirs_are_unique_and_removed_on_drop() {
        let parent = tempfile::tempdir().unwrap();
        let config = CheckerConfig::default().with_scratch_dir(parent.path());

        let a = scratch_dir("Weird Name/../x", &config).unwrap();
        let b = scratch_dir("Weird Name/../x", &config).unwrap();
        assert_ne!(a.path(), b.path());
        assert_eq!(a.path().parent(), Some(parent.path()));
        assert!(a
            .path()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("buglist-Weird_Name____x-"));

        drop(a);
        drop(b);
        assert_eq!(std::fs::read_dir(parent.path()).unwrap().count(), 0);
    }
}
