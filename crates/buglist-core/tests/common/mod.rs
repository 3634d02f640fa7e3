//! Shared fixtures: a fake compiler script and a provider that records
//! which versions were requested.

#![allow(dead_code)]

use async_trait::async_trait;
use buglist_core::{CheckerConfig, CompilerHandle, CompilerProvider};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use std::time::Duration;

/// Stands in for `solc --ast-json`. Behaviour is keyed on markers in the
/// source file so one script serves every test in a binary.
const FAKE_SOLC: &str = r#"#!/bin/sh
[ "$1" = "--ast-json" ] || { echo "usage: $0 --ast-json FILE" >&2; exit 64; }
src="$2"
if grep -q 'FAIL_COMPILE' "$src"; then echo "Error: simulated compiler failure" >&2; exit 1; fi
if grep -q 'HANG' "$src"; then exec sleep 30; fi
if grep -q 'NO_OUTPUT' "$src"; then exit 0; fi
if grep -q 'GARBAGE' "$src"; then echo "JSON AST:"; echo "{ not json"; exit 0; fi
echo "JSON AST:"
echo ""
echo "======= $src ======="
if grep -q 'uint256 foo' "$src"; then
  echo '{"name":"SourceUnit","children":[{"name":"ContractDefinition","attributes":{"name":"C"},"children":[{"name":"foo","attributes":{"type":"uint256"}}]}]}'
else
  echo '{"name":"SourceUnit","children":[{"name":"ContractDefinition","attributes":{"name":"C"},"children":[{"name":"bar","attributes":{"type":"uint256"}}]}]}'
fi
"#;

static FAKE_SOLC_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Path to the fake compiler, written once per test binary.
pub fn fake_compiler() -> &'static Path {
    FAKE_SOLC_PATH.get_or_init(|| {
        use std::os::unix::fs::PermissionsExt;

        let dir = Path::new(env!("CARGO_TARGET_TMPDIR")).join(format!(
            "fake-solc-{}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("solc");
        std::fs::write(&path, FAKE_SOLC).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    })
}

/// Checker config writing scratch files under `dir` so tests can assert
/// that nothing is left behind.
pub fn scratch_config(dir: &Path) -> CheckerConfig {
    CheckerConfig::default()
        .with_scratch_dir(dir)
        .with_compiler_timeout(Duration::from_secs(20))
}

pub fn leftover_entries(dir: &Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}

/// Hands out the fake compiler and remembers requested versions.
pub struct RecordingProvider {
    path: PathBuf,
    pub requested: Mutex<Vec<String>>,
}

impl RecordingProvider {
    pub fn new() -> Self {
        Self {
            path: fake_compiler().to_path_buf(),
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompilerProvider for RecordingProvider {
    async fn compiler_for(&self, version: &str) -> solc_fetch::Result<CompilerHandle> {
        self.requested.lock().unwrap().push(version.to_string());
        Ok(CompilerHandle::new(version, &self.path))
    }
}

pub fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
