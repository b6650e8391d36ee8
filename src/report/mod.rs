pub mod model;
pub mod render;

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::run::results_dir_for;
use crate::error::ReportError;
use model::{Severity, VulnerabilityReport};

/// File name the analysis container writes into the results directory
pub const REPORT_FILE_NAME: &str = "gl-sast-report.json";

/// `<source>/codeql-agent-results/gl-sast-report.json`
pub fn report_path(source: &Path) -> PathBuf {
    results_dir_for(source).join(REPORT_FILE_NAME)
}

/// Read and validate the report. Every finding must carry at least one
/// identifier; otherwise the whole report is rejected.
pub fn load_report(path: &Path) -> Result<VulnerabilityReport, ReportError> {
    let content = std::fs::read_to_string(path).map_err(|source| ReportError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let report: VulnerabilityReport =
        serde_json::from_str(content.trim()).map_err(|source| ReportError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    if let Some(index) = report
        .vulnerabilities
        .iter()
        .position(|finding| finding.identifiers.is_empty())
    {
        return Err(ReportError::MalformedFinding {
            index,
            reason: "no identifiers",
        });
    }

    Ok(report)
}

/// Rendered findings plus per-severity counts
#[derive(Debug, Clone)]
pub struct FormattedReport {
    /// One block per finding, in report order
    pub blocks: Vec<String>,
    pub summary: BTreeMap<SeverityRank, usize>,
}

/// Load the report for `source`, write each rendered finding to `out` as it
/// is produced, and return all rendered blocks in report order.
///
/// Blocks carry ANSI color codes only when `colored` has output enabled. It
/// turns them off when stdout is not a terminal or `CLICOLOR=0` is set, so
/// piped output and the returned blocks are plain text in that case.
pub fn load_and_format<W: Write>(source: &Path, out: &mut W) -> anyhow::Result<FormattedReport> {
    let path = report_path(source);
    tracing::debug!("Reading report {}", path.display());

    let report = load_report(&path)?;

    let mut blocks = Vec::with_capacity(report.vulnerabilities.len());
    for finding in &report.vulnerabilities {
        let block = render::render_finding(finding);
        writeln!(out, "{}", block)?;
        blocks.push(block);
    }
    out.flush()?;

    Ok(FormattedReport {
        blocks,
        summary: summarize(&report),
    })
}

/// Count findings per severity, most severe first
pub fn summarize(report: &VulnerabilityReport) -> BTreeMap<SeverityRank, usize> {
    let mut counts = BTreeMap::new();
    for finding in &report.vulnerabilities {
        *counts.entry(SeverityRank::of(&finding.severity)).or_insert(0) += 1;
    }
    counts
}

/// Orderable severity bucket used by the summary line
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SeverityRank {
    Critical,
    High,
    Medium,
    Low,
    Unknown,
}

impl SeverityRank {
    pub fn of(severity: &Severity) -> Self {
        match severity {
            Severity::Critical => Self::Critical,
            Severity::High => Self::High,
            Severity::Medium => Self::Medium,
            Severity::Low => Self::Low,
            Severity::Other(_) | Severity::Missing => Self::Unknown,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Unknown => "unknown",
        }
    }
}
