use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::path::PathBuf;

use crate::config::run::RunConfiguration;
use crate::config::settings::{StaticConfig, DEFAULT_CONFIG_FILE};
use crate::docker::client::{ContainerRuntime, DockerClient};
use crate::docker::lifecycle::{self, LaunchOutcome};
use crate::report::{self, FormattedReport};
use crate::utils::paths;

/// Languages the analysis image knows how to build a database for
pub const SUPPORTED_LANGUAGES: &[&str] = &[
    "python",
    "javascript",
    "typescript",
    "cpp",
    "c",
    "csharp",
    "java",
    "go",
    "ruby",
];

const SUPPORTED_JAVA_VERSIONS: &[&str] = &["8", "11"];

#[derive(Parser, Debug)]
#[command(name = "codeql-agent")]
#[command(author = "CodeQL Agent Team")]
#[command(version)]
#[command(about = "Run CodeQL inside Docker and print the vulnerability report", long_about = None)]
pub struct Cli {
    /// Path to target source-code directory
    #[arg(long, value_name = "DIR")]
    pub sourcecode: Option<PathBuf>,

    /// Build commands for compiled languages. Omit for Python and JavaScript
    /// to let CodeQL's autobuilder detect the build system.
    /// Ex: --commands "mvn clean install"
    #[arg(long)]
    pub commands: Option<String>,

    /// Run only part of the pipeline. Ex: --action create-database-only
    #[arg(long)]
    pub action: Option<String>,

    /// Project language: python, javascript, typescript, cpp, c, csharp, java, go, ruby
    #[arg(long)]
    pub language: Option<String>,

    /// Query suite to run. Defaults to <language>-security-extended.qls
    #[arg(long)]
    pub qs: Option<String>,

    /// Owner of the results folder
    #[arg(long)]
    pub userid: Option<String>,

    /// Group owner of the results folder
    #[arg(long)]
    pub groupid: Option<String>,

    /// Threads used to build the database and evaluate queries (0 = one per core)
    #[arg(long)]
    pub threads: Option<String>,

    /// Overwrite an existing database (value defaults to --overwrite)
    #[arg(long = "overwrite_flag", num_args = 0..=1, default_missing_value = "--overwrite")]
    pub overwrite_flag: Option<String>,

    /// Save intermediate results to the disk cache (value defaults to --save-cache)
    #[arg(long = "save_cache_flag", num_args = 0..=1, default_missing_value = "--save-cache")]
    pub save_cache_flag: Option<String>,

    /// Java version used inside the container: 8 or 11
    #[arg(long = "java_version")]
    pub java_version: Option<String>,

    /// Deployment settings (image, container name, mount targets)
    #[arg(long, env = "CODEQL_AGENT_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Skip the container run and only print an existing report
    #[arg(long)]
    pub report_only: bool,

    /// Enable verbose output, including container logs
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        tracing::debug!("codeql-agent {}", env!("CARGO_PKG_VERSION"));

        let Some(sourcecode) = self.sourcecode.as_deref() else {
            anyhow::bail!("--sourcecode parameter is required!");
        };
        let source = paths::resolve_source_dir(sourcecode)?;

        let formatted = if self.report_only {
            report::load_and_format(&source, &mut std::io::stdout().lock())?
        } else {
            self.warn_on_unusual_options();
            let settings = StaticConfig::load(&self.config)?;
            let run = self.run_configuration(source);
            paths::ensure_results_dir(&run.source)?;

            let client = DockerClient::new().await?;
            analyze(&run, &settings, &client, self.verbose, &mut std::io::stdout().lock()).await?
        };
        print_summary(&formatted);

        Ok(())
    }

    /// Per-invocation settings passed to the container
    pub fn run_configuration(&self, source: PathBuf) -> RunConfiguration {
        RunConfiguration {
            source,
            action: self.action.clone(),
            language: self.language.clone(),
            query_suite: self.qs.clone(),
            user_id: self.userid.clone(),
            group_id: self.groupid.clone(),
            threads: self.threads.clone(),
            overwrite_flag: self.overwrite_flag.clone(),
            save_cache_flag: self.save_cache_flag.clone(),
            java_version: self.java_version.clone(),
            command: self.commands.clone(),
        }
    }

    fn warn_on_unusual_options(&self) {
        if let Some(language) = &self.language {
            if !SUPPORTED_LANGUAGES.contains(&language.as_str()) {
                tracing::warn!(
                    "Language {} may not be supported. Supported languages are: {}.",
                    language,
                    SUPPORTED_LANGUAGES.join(", ")
                );
            }
        }
        if let Some(version) = &self.java_version {
            if !SUPPORTED_JAVA_VERSIONS.contains(&version.as_str()) {
                tracing::warn!("Java version {} is not supported. It must be 8 or 11.", version);
            }
        }
    }
}

/// Run the analysis container, then render the report it left behind
async fn analyze<W: Write>(
    run: &RunConfiguration,
    settings: &StaticConfig,
    runtime: &dyn ContainerRuntime,
    verbose: bool,
    out: &mut W,
) -> Result<FormattedReport> {
    scan(run, settings, runtime, verbose).await?;
    report::load_and_format(&run.source, out)
}

/// Run the analysis container for `run`
async fn scan(
    run: &RunConfiguration,
    settings: &StaticConfig,
    runtime: &dyn ContainerRuntime,
    verbose: bool,
) -> Result<()> {
    let spinner = if verbose {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
        pb.set_message(format!("Analyzing {}...", run.source.display()));
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    };

    let outcome = lifecycle::launch(run, settings, runtime).await;
    spinner.finish_and_clear();

    match outcome {
        LaunchOutcome::Completed { name, exit_code } => {
            tracing::debug!("Container {} finished with exit code {}", name, exit_code);
            Ok(())
        }
        LaunchOutcome::Failed { name, reason, pruned } => {
            if !pruned {
                tracing::warn!("Stopped containers were not pruned; run `docker container prune` to clean up");
            }
            anyhow::bail!("Analysis container {} did not run: {}", name, reason)
        }
    }
}

fn print_summary(formatted: &FormattedReport) {
    let total = formatted.blocks.len();
    if total == 0 {
        println!("{} No vulnerabilities reported", "✓".green().bold());
        return;
    }

    let breakdown: Vec<String> = formatted
        .summary
        .iter()
        .map(|(rank, count)| format!("{} {}", count, rank.label()))
        .collect();

    println!(
        "{} {} vulnerabilities reported ({})",
        "!".yellow().bold(),
        total,
        breakdown.join(", ")
    );
}
