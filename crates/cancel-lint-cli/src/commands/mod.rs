//! Subcommands and the input handling they share.

pub mod check;
pub mod fix;
pub mod init;
pub mod list_rules;
pub mod output;

use anyhow::{bail, Context, Result};
use cancel_lint_core::{Analyzer, Compilation};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config_resolver;

/// A compilation read from disk.
#[derive(Debug)]
pub struct Input {
    /// File the compilation was read from.
    pub source: PathBuf,
    /// The validated compilation.
    pub compilation: Compilation,
}

/// Lists the compilation files under `path`.
///
/// A file is taken as is; a directory is walked for `*.json` files in a
/// stable order, skipping hidden directories.
pub fn discover(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        bail!("{} does not exist", path.display());
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(path)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));
    for entry in walker {
        let entry = entry.with_context(|| format!("Failed to walk {}", path.display()))?;
        if entry.file_type().is_file() && entry.path().extension().is_some_and(|ext| ext == "json") {
            files.push(entry.into_path());
        }
    }
    tracing::debug!("Found {} compilation file(s) under {}", files.len(), path.display());
    Ok(files)
}

/// Reads and validates every compilation under `path`.
pub fn load_inputs(path: &Path) -> Result<Vec<Input>> {
    discover(path)?
        .into_iter()
        .map(|source| {
            let content = std::fs::read_to_string(&source)
                .with_context(|| format!("Failed to read {}", source.display()))?;
            let compilation = Compilation::from_json(&content)
                .with_context(|| format!("Invalid compilation in {}", source.display()))?;
            Ok(Input { source, compilation })
        })
        .collect()
}

/// Builds an analyzer with every rule registered and the resolved configuration.
pub fn build_analyzer(path: &Path, explicit_config: Option<&Path>) -> Result<Analyzer> {
    let source = config_resolver::resolve(path, explicit_config);
    let config = config_resolver::load(&source)?;
    cancel_lint_rules::analyzer_builder()
        .config(config)
        .build()
        .context("Failed to build analyzer")
}

/// Resolves a document path against the directory of its compilation file.
pub fn document_path(input: &Input, document: &Path) -> PathBuf {
    if document.is_absolute() {
        return document.to_path_buf();
    }
    input
        .source
        .parent()
        .map_or_else(|| document.to_path_buf(), |dir| dir.join(document))
}

#[cfg(test)]
pub(crate) mod testing {
    use cancel_lint_core::model::{CompilationBuilder, DocumentBuilder, MethodSymbol, ParameterSymbol};
    use cancel_lint_core::Compilation;

    /// One document with a call that leaves its optional token unbound.
    pub fn compilation(path: &str) -> Compilation {
        let mut b = CompilationBuilder::with_system_types();
        let task = b.type_id("System.Threading.Tasks.Task").unwrap();
        let ct = b.type_id("System.Threading.CancellationToken").unwrap();
        let int = b.type_id("System.Int32").unwrap();
        let class = b.class("Worker");
        let delay = b.add_method(
            MethodSymbol::new("Delay", task, Some(task))
                .param(ParameterSymbol::new("millisecondsDelay", int))
                .param(ParameterSymbol::optional("cancellationToken", ct)),
        );
        let run = b.add_method(
            MethodSymbol::new("RunAsync", class, Some(task))
                .asynchronous()
                .param(ParameterSymbol::new("cancellationToken", ct)),
        );
        let mut doc = DocumentBuilder::new(
            path,
            "async Task RunAsync(CancellationToken cancellationToken) { await Task.Delay(100); }",
        );
        doc.declare(Some(run), "RunAsync");
        let _ = doc.invoke("Task.Delay", Some(delay)).index();
        b.add_document(doc.build().unwrap());
        b.build().unwrap()
    }
}
