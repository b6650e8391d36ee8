use colored::{ColoredString, Colorize};

use super::model::{Finding, Severity};

/// Apply the severity palette: Critical/High red, Medium yellow, rest plain
pub fn paint_level(level: &Severity) -> ColoredString {
    let text = level.to_string();
    match level {
        Severity::Critical | Severity::High => text.red(),
        Severity::Medium => text.yellow(),
        _ => text.normal(),
    }
}

/// Render one finding as a console block.
///
/// Findings are validated before rendering, so `identifiers` is non-empty;
/// an empty list renders a blank identifier line.
pub fn render_finding(finding: &Finding) -> String {
    let identifier = finding
        .identifiers
        .first()
        .map(|ident| ident.name.as_str())
        .unwrap_or_default();

    format!(
        "\t\t{}\n\
         [*] Message: {}\n\
         [*] Description: {}\n\
         [*] Severity: {}\n\
         [*] Confidence: {}\n\
         [*] Location (file:startline:endline): {}\n\
         [*] Identifiers: {}\n",
        finding.message.bold(),
        finding.message,
        finding.description,
        paint_level(&finding.severity),
        paint_level(&finding.confidence),
        finding.location,
        identifier,
    )
}
