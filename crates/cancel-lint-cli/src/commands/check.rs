//! Check command implementation.

use anyhow::{Context, Result};
use cancel_lint_core::{Analyzer, FileContext};
use cancel_lint_rules::{preferred, EditGenerator};
use std::path::Path;

use super::output::{self, CompilationReport};
use super::{build_analyzer, load_inputs, Input};
use crate::OutputFormat;

/// Runs the check command.
pub fn run(path: &Path, format: OutputFormat, explicit_config: Option<&Path>) -> Result<()> {
    let analyzer = build_analyzer(path, explicit_config)?;
    let inputs = load_inputs(path)?;

    tracing::info!(
        "Analyzing {} compilation(s) under {} with {} rules",
        inputs.len(),
        path.display(),
        analyzer.rule_count()
    );

    let reports = analyze(&analyzer, &inputs)?;
    output::print(&reports, format)?;

    // Exit with error code if there are errors
    if reports.iter().any(|r| r.result.has_errors()) {
        std::process::exit(1);
    }

    Ok(())
}

/// Analyzes every input and looks up the preferred fix for each diagnostic.
pub fn analyze<'a>(analyzer: &Analyzer, inputs: &'a [Input]) -> Result<Vec<CompilationReport<'a>>> {
    let generator = EditGenerator::new();

    inputs
        .iter()
        .map(|input| -> Result<CompilationReport<'a>> {
            let compilation = &input.compilation;
            let result = analyzer
                .analyze(compilation)
                .with_context(|| format!("Analysis failed for {}", input.source.display()))?;
            let ctx = analyzer.context(compilation)?;

            let hints = result
                .diagnostics
                .iter()
                .map(|d| {
                    let document = compilation.document(d.location.document)?;
                    let file = FileContext::new(&ctx, d.location.document, document);
                    let offers = generator.offers(&file, d);
                    preferred(&offers).map(|o| o.title.clone())
                })
                .collect();

            Ok(CompilationReport {
                source: &input.source,
                compilation,
                result,
                hints,
            })
        })
        .collect()
}
