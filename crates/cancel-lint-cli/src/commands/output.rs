//! Shared output formatting for lint results.

use anyhow::Result;
use cancel_lint_core::{line_column, Compilation, DiagnosticReport, LintResult, Suppression};
use miette::{NamedSource, Report};
use serde::Serialize;
use std::path::Path;

use crate::OutputFormat;

/// Analysis of one compilation file, ready to print.
#[derive(Debug)]
pub struct CompilationReport<'a> {
    /// File the compilation was read from.
    pub source: &'a Path,
    /// The analyzed compilation.
    pub compilation: &'a Compilation,
    /// Diagnostics and suppressions.
    pub result: LintResult,
    /// Title of the preferred fix, parallel to `result.diagnostics`.
    pub hints: Vec<Option<String>>,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    source: &'a Path,
    #[serde(flatten)]
    result: &'a LintResult,
}

/// Print lint results in the specified format.
pub fn print(reports: &[CompilationReport<'_>], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => print_text(reports),
        OutputFormat::Json => return print_json(reports),
        OutputFormat::Compact => print_compact(reports),
    }
    Ok(())
}

fn print_text(reports: &[CompilationReport<'_>]) {
    let (mut errors, mut warnings, mut infos, mut suppressed, mut documents) = (0, 0, 0, 0, 0);

    for report in reports {
        for (i, diagnostic) in report.result.diagnostics.iter().enumerate() {
            let mut rendered = DiagnosticReport::from(diagnostic);
            if let Some(Some(hint)) = report.hints.get(i) {
                rendered = rendered.with_help(format!("fix available: {hint}"));
            }
            let source = report
                .compilation
                .document(diagnostic.location.document)
                .map(|d| NamedSource::new(d.path.display().to_string(), d.text.clone()));
            let rendered = match source {
                Some(source) => Report::new(rendered).with_source_code(source),
                None => Report::new(rendered),
            };
            println!("{}: {rendered:?}", diagnostic.severity);
        }

        for suppression in &report.result.suppressions {
            println!("{}", describe_suppression(report.compilation, suppression));
        }

        let (e, w, i) = report.result.count_by_severity();
        errors += e;
        warnings += w;
        infos += i;
        suppressed += report.result.suppressions.len();
        documents += report.result.documents_checked;
    }

    let summary_color = if errors > 0 {
        "\x1b[31m"
    } else if warnings > 0 {
        "\x1b[33m"
    } else {
        "\x1b[32m"
    };

    println!(
        "{summary_color}Found {errors} error(s), {warnings} warning(s), {infos} info(s), \
         {suppressed} suppression(s) in {documents} document(s)\x1b[0m"
    );
}

/// One line describing a suppressed external diagnostic.
pub fn describe_suppression(compilation: &Compilation, suppression: &Suppression) -> String {
    let external = &suppression.diagnostic;
    let place = compilation.document(external.document).map_or_else(
        || format!("document #{}", external.document.0),
        |d| {
            let (line, column) = line_column(&d.text, external.span.start);
            format!("{}:{line}:{column}", d.path.display())
        },
    );
    format!(
        "{place}: suppressed [{}] by {}: {}",
        suppression.suppressed_id, suppression.id, suppression.justification
    )
}

fn print_json(reports: &[CompilationReport<'_>]) -> Result<()> {
    let json: Vec<JsonReport<'_>> = reports
        .iter()
        .map(|r| JsonReport {
            source: r.source,
            result: &r.result,
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

fn print_compact(reports: &[CompilationReport<'_>]) {
    for report in reports {
        for diagnostic in &report.result.diagnostics {
            println!("{diagnostic}");
        }
    }
}
