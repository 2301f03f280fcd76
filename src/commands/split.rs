use crate::batch::{BatchResult, BatchSplitter, SourceDocument};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use walkdir::WalkDir;

/// Expand directories into the PDF files below them, sorted by name.
pub fn collect_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for input in inputs {
        if input.is_dir() {
            for entry in WalkDir::new(input).sort_by_file_name() {
                let entry = entry.with_context(|| format!("Failed to walk {}", input.display()))?;
                if entry.file_type().is_file() && is_pdf(entry.path()) {
                    paths.push(entry.into_path());
                }
            }
        } else {
            paths.push(input.clone());
        }
    }

    Ok(paths)
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// Read, split and, if anything was produced, write the archive to `output`.
///
/// An input that cannot be read is reported as a failed document and the rest
/// of the batch still runs.
pub fn execute<Q: AsRef<Path>>(
    inputs: &[PathBuf],
    splitter: &BatchSplitter,
    output: Q,
) -> Result<BatchResult> {
    let output = output.as_ref();
    let paths = collect_inputs(inputs)?;
    if paths.is_empty() {
        anyhow::bail!("No PDF files found");
    }

    let sources: Vec<SourceDocument> = paths
        .iter()
        .map(|path| {
            let name = path.display().to_string();
            match std::fs::read(path) {
                Ok(bytes) => SourceDocument::new(name, bytes),
                Err(e) => SourceDocument::unreadable(name, format!("Failed to read PDF: {}", e)),
            }
        })
        .collect();

    let result = splitter.run(&sources)?;

    if !result.is_empty() {
        std::fs::write(output, &result.archive)
            .with_context(|| format!("Failed to write archive: {}", output.display()))?;
    }

    Ok(result)
}

pub fn run<Q: AsRef<Path>>(
    inputs: &[PathBuf],
    depth: u32,
    output: Q,
    json: bool,
    cancel: Arc<AtomicBool>,
) -> Result<()> {
    let output = output.as_ref();
    let splitter = BatchSplitter::new(depth).with_cancel(cancel);
    let result = execute(inputs, &splitter, output)?;
    let archive_path = (!result.is_empty()).then(|| output.display().to_string());

    if json {
        println!("{}", serde_json::to_string_pretty(&result.summary(archive_path))?);
    } else {
        for doc in &result.documents {
            match &doc.failure {
                Some(failure) => println!("{}: skipped ({})", doc.name, failure.message),
                None => {
                    println!("{}: {} chapter(s)", doc.name, doc.chapters.len());
                    for chapter in &doc.chapters {
                        println!(
                            "  {} (p. {}-{}, {} page(s))",
                            chapter.path, chapter.first_page, chapter.last_page, chapter.page_count
                        );
                    }
                    for skipped in &doc.skipped {
                        println!(
                            "  bookmark {} ({}) skipped: {}",
                            skipped.ordinal, skipped.title, skipped.reason
                        );
                    }
                }
            }
        }
    }

    if result.is_empty() {
        anyhow::bail!("No chapters produced at depth {}", depth);
    }

    if !json {
        println!(
            "\nSplit {} of {} document(s) into {} chapter(s) in {}{}",
            result.success_count,
            result.total_count,
            result.chapter_count(),
            output.display(),
            if result.is_partial_failure() { " (some documents failed)" } else { "" }
        );
    }

    Ok(())
}
