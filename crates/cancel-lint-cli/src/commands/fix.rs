//! Fix command implementation.

use anyhow::{Context, Result};
use cancel_lint_core::edit::{apply_batch, Collision, CollisionReason};
use cancel_lint_core::{Analyzer, CancellationFlag, Diagnostic, DocumentId, FileContext};
use cancel_lint_rules::{preferred, EditGenerator};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::{build_analyzer, document_path, load_inputs, Input};

/// Fixed text of one document.
#[derive(Debug)]
pub struct DocumentFix {
    /// Where the document lives on disk.
    pub path: PathBuf,
    /// Document text with every accepted fix applied.
    pub text: String,
    /// Titles of the fixes applied.
    pub applied: Vec<String>,
    /// Fixes skipped because they collided.
    pub collisions: Vec<Collision>,
}

/// Runs the fix command.
pub fn run(path: &Path, codes: Option<String>, write: bool, explicit_config: Option<&Path>) -> Result<()> {
    let analyzer = build_analyzer(path, explicit_config)?;
    let inputs = load_inputs(path)?;
    let codes: Option<Vec<String>> = codes.map(|c| {
        c.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    });

    let (mut applied, mut skipped, mut documents) = (0, 0, 0);
    for input in &inputs {
        for fixed in plan(&analyzer, input, codes.as_deref())? {
            applied += fixed.applied.len();
            skipped += fixed.collisions.len();
            documents += 1;

            if write {
                std::fs::write(&fixed.path, &fixed.text)
                    .with_context(|| format!("Failed to write {}", fixed.path.display()))?;
                println!("Fixed {} ({} fix(es))", fixed.path.display(), fixed.applied.len());
            } else {
                println!("── {} ──", fixed.path.display());
                println!("{}", fixed.text);
            }
        }
    }

    println!("Applied {applied} fix(es), skipped {skipped} in {documents} document(s)");
    Ok(())
}

/// Computes the fixed text of every document in `input` that has a fixable
/// diagnostic, optionally limited to the given rule codes.
pub fn plan(analyzer: &Analyzer, input: &Input, codes: Option<&[String]>) -> Result<Vec<DocumentFix>> {
    let compilation = &input.compilation;
    let result = analyzer
        .analyze(compilation)
        .with_context(|| format!("Analysis failed for {}", input.source.display()))?;
    let ctx = analyzer.context(compilation)?;
    let generator = EditGenerator::new();
    let cancel = CancellationFlag::new();

    let mut by_document: BTreeMap<DocumentId, Vec<&Diagnostic>> = BTreeMap::new();
    for diagnostic in &result.diagnostics {
        if codes.map_or(true, |codes| codes.iter().any(|c| *c == diagnostic.code)) {
            by_document
                .entry(diagnostic.location.document)
                .or_default()
                .push(diagnostic);
        }
    }

    let mut fixed = Vec::new();
    for (id, diagnostics) in by_document {
        let Some(document) = compilation.document(id) else {
            continue;
        };
        let file = FileContext::new(&ctx, id, document);

        let mut fixes = Vec::new();
        for diagnostic in diagnostics {
            let offers = generator.offers(&file, diagnostic);
            let Some(offer) = preferred(&offers) else {
                continue;
            };
            match generator.materialize(&file, offer, &cancel) {
                Ok(fix) => fixes.push(fix),
                Err(e) => tracing::warn!("Skipping '{}' for {}: {}", offer.title, diagnostic, e),
            }
        }
        if fixes.is_empty() {
            continue;
        }

        let outcome = apply_batch(&document.text, &fixes)?;
        let path = document_path(input, &document.path);
        for collision in &outcome.collisions {
            match &collision.reason {
                CollisionReason::Overlap { accepted, .. } => tracing::warn!(
                    "{}: '{}' collides with '{}', not applied",
                    path.display(),
                    collision.title,
                    accepted
                ),
                CollisionReason::Invalid { message } => tracing::warn!(
                    "{}: '{}' is invalid: {}",
                    path.display(),
                    collision.title,
                    message
                ),
            }
        }
        fixed.push(DocumentFix {
            path,
            text: outcome.text,
            applied: outcome.applied,
            collisions: outcome.collisions,
        });
    }
    Ok(fixed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing;
    use cancel_lint_core::Config;
    use std::fs;
    use tempfile::TempDir;

    fn analyzer() -> Analyzer {
        cancel_lint_rules::analyzer_builder()
            .config(Config::default())
            .build()
            .unwrap()
    }

    #[test]
    fn plan_passes_the_enclosing_token() {
        let input = Input {
            source: PathBuf::from("/work/build.json"),
            compilation: testing::compilation("Worker.cs"),
        };

        let fixed = plan(&analyzer(), &input, None).unwrap();
        assert_eq!(fixed.len(), 1);
        assert_eq!(fixed[0].path, PathBuf::from("/work/Worker.cs"));
        assert_eq!(
            fixed[0].text,
            "async Task RunAsync(CancellationToken cancellationToken) { await Task.Delay(100, cancellationToken); }"
        );
        assert_eq!(fixed[0].applied.len(), 1);
        assert!(fixed[0].collisions.is_empty());
    }

    #[test]
    fn plan_honors_code_filter() {
        let input = Input {
            source: PathBuf::from("build.json"),
            compilation: testing::compilation("Worker.cs"),
        };

        let only_declarations = ["CT001".to_string()];
        assert!(plan(&analyzer(), &input, Some(&only_declarations[..])).unwrap().is_empty());

        let only_calls = ["CT004".to_string()];
        assert_eq!(plan(&analyzer(), &input, Some(&only_calls[..])).unwrap().len(), 1);
    }

    #[test]
    fn run_writes_documents_next_to_the_compilation() {
        let tmp = TempDir::new().unwrap();
        let compilation = testing::compilation("Worker.cs");
        fs::write(tmp.path().join("build.json"), compilation.to_json().unwrap()).unwrap();
        fs::write(tmp.path().join("Worker.cs"), &compilation.documents[0].text).unwrap();

        run(tmp.path(), None, true, None).unwrap();

        let written = fs::read_to_string(tmp.path().join("Worker.cs")).unwrap();
        assert!(written.contains("Task.Delay(100, cancellationToken)"));
    }
}
