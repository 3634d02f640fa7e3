//! buglist-verify - checks the compiler bug list against its test vectors
//!
//! Loads `bugs.json` and the labeled vector document, runs every
//! `regex-source` and `json-path` rule over the vectors and exits non-zero
//! when any rule disagrees with a label or the run could not complete.

use anyhow::{Context, Result};
use buglist_core::{
    init_tracing, write_report_json, BugRegistry, CheckerConfig, VectorCorpus, VerificationReport,
    Verifier,
};
use clap::Parser;
use solc_fetch::release::DEFAULT_RELEASE_URL;
use solc_fetch::{CompilerProvider, FetchConfig, FixedProvider, ReleaseProvider};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};

#[derive(Parser, Debug)]
#[command(name = "buglist-verify")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Verify bug list detection rules against labeled test vectors", long_about = None)]
struct Cli {
    /// Bug database (JSON array of bug entries)
    #[arg(long, env = "BUGLIST_BUGS", default_value = "docs/bugs.json")]
    bugs: PathBuf,

    /// Labeled test-vector document
    #[arg(
        long,
        env = "BUGLIST_VECTORS",
        default_value = "test/buglist_test_vectors.md"
    )]
    vectors: PathBuf,

    /// Use this compiler for every version instead of downloading releases
    #[arg(long, env = "BUGLIST_SOLC")]
    solc: Option<PathBuf>,

    /// Where downloaded compiler releases are cached
    #[arg(long, env = "BUGLIST_SOLC_CACHE", default_value = ".buglist/solc")]
    cache_dir: PathBuf,

    /// Release download root
    #[arg(long, env = "BUGLIST_SOLC_RELEASE_URL", default_value = DEFAULT_RELEASE_URL)]
    release_url: String,

    /// Seconds a single compiler invocation may run
    #[arg(long, env = "BUGLIST_COMPILER_TIMEOUT", default_value_t = 60)]
    timeout_secs: u64,

    /// Compiler invocations run concurrently per bug
    #[arg(short, long, env = "BUGLIST_JOBS", default_value_t = 4)]
    jobs: usize,

    /// Write the full verification report as JSON
    #[arg(long)]
    report: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn checker_config(&self) -> CheckerConfig {
        CheckerConfig::from_env()
            .with_compiler_timeout(Duration::from_secs(self.timeout_secs))
            .with_max_concurrent_compiles(self.jobs)
    }

    fn provider(&self) -> Result<Arc<dyn CompilerProvider>> {
        match &self.solc {
            Some(path) => {
                info!(solc = %path.display(), "Using fixed compiler for every version");
                Ok(Arc::new(FixedProvider::new(path)))
            }
            None => {
                let config = FetchConfig::new(&self.release_url, &self.cache_dir);
                let provider =
                    ReleaseProvider::new(config).context("Failed to set up release downloads")?;
                Ok(Arc::new(provider))
            }
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(cli.json, level);

    match run(&cli).await {
        Ok(report) if report.is_success() => {
            println!("{}", report.summary_line());
            ExitCode::SUCCESS
        }
        Ok(report) => {
            for mismatch in report.mismatches() {
                eprintln!("MISMATCH {mismatch}");
            }
            println!("{}", report.summary_line());
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Load inputs, verify, and write the report if one was requested.
async fn run(cli: &Cli) -> Result<VerificationReport> {
    let registry = BugRegistry::read(&cli.bugs)
        .with_context(|| format!("Failed to load bug database {}", cli.bugs.display()))?;
    let corpus = VectorCorpus::read(&cli.vectors)
        .with_context(|| format!("Failed to read test vectors {}", cli.vectors.display()))?;
    info!(
        bugs = registry.len(),
        database = %cli.bugs.display(),
        vectors = %cli.vectors.display(),
        "Loaded bug database"
    );

    let verifier = Verifier::new(registry, cli.provider()?, cli.checker_config());
    let report = verifier.run(&corpus).await?;

    if let Some(path) = &cli.report {
        write_report_json(path, &report)?;
        info!(path = %path.display(), "Wrote verification report");
    }
    Ok(report)
}
