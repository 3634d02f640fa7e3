//! Checker configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Default wall-clock limit for one compiler invocation.
pub const DEFAULT_COMPILER_TIMEOUT_SECS: u64 = 60;

/// Default number of snippets compiled at once.
pub const DEFAULT_MAX_CONCURRENT_COMPILES: usize = 4;

/// Controls for the structural checker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckerConfig {
    /// Limit for a single `--ast-json` run; exceeding it is fatal.
    pub compiler_timeout: Duration,
    /// Snippets of one bug compiled in parallel (at least 1).
    pub max_concurrent_compiles: usize,
    /// Parent directory for per-snippet scratch directories.
    /// `None` uses the system temp directory.
    pub scratch_dir: Option<PathBuf>,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            compiler_timeout: Duration::from_secs(DEFAULT_COMPILER_TIMEOUT_SECS),
            max_concurrent_compiles: DEFAULT_MAX_CONCURRENT_COMPILES,
            scratch_dir: None,
        }
    }
}

impl CheckerConfig {
    /// Defaults overridden by `BUGLIST_COMPILER_TIMEOUT` (seconds),
    /// `BUGLIST_JOBS` and `BUGLIST_SCRATCH_DIR` when set and well-formed.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(secs) = env_parse::<u64>("BUGLIST_COMPILER_TIMEOUT") {
            config.compiler_timeout = Duration::from_secs(secs);
        }
        if let Some(jobs) = env_parse::<usize>("BUGLIST_JOBS") {
            config = config.with_max_concurrent_compiles(jobs);
        }
        if let Ok(dir) = std::env::var("BUGLIST_SCRATCH_DIR") {
            config.scratch_dir = Some(PathBuf::from(dir));
        }
        config
    }

    pub fn with_compiler_timeout(mut self, timeout: Duration) -> Self {
        self.compiler_timeout = timeout;
        self
    }

    pub fn with_max_concurrent_compiles(mut self, jobs: usize) -> Self {
        self.max_concurrent_compiles = jobs.max(1);
        self
    }

    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok()?.trim().parse().ok()
}
