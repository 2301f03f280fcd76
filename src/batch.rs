//! Drives the outline split over a batch of source documents.
//!
//! Every document runs the full pipeline on its own: parse, select bookmarks
//! at the requested depth, resolve them to pages, compute ranges, slice and
//! name chapters. A document that fails is reported and skipped; only a
//! failure to write the archive stops the batch.

use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::archive::{ArchiveAssembler, ArchiveEntry};
use crate::error::{BatchError, BookmarkError, DocumentError, ErrorKind};
use crate::naming::{chapter_file_name, entry_path, source_directories};
use crate::page_range::{compute_ranges, PageRange};
use crate::pdf::outline::collect;
use crate::pdf::{DestinationResolver, PdfDocument};

/// Raw bytes of one input, with the name used for reporting and for its
/// archive directory.
///
/// An input that could not be read carries the read error instead of bytes
/// and is reported as a parse failure.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub name: String,
    pub bytes: Result<Vec<u8>, String>,
}

impl SourceDocument {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        SourceDocument {
            name: name.into(),
            bytes: Ok(bytes),
        }
    }

    pub fn unreadable(name: impl Into<String>, message: impl Into<String>) -> Self {
        SourceDocument {
            name: name.into(),
            bytes: Err(message.into()),
        }
    }
}

/// A chapter produced from one document, ready to be archived.
#[derive(Debug, Clone)]
pub struct Chapter {
    pub ordinal: usize,
    pub title: String,
    pub file_name: String,
    pub range: PageRange,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChapterReport {
    pub path: String,
    pub ordinal: usize,
    pub title: String,
    /// 1-based, inclusive
    pub first_page: usize,
    pub last_page: usize,
    pub page_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedBookmark {
    pub ordinal: usize,
    pub title: String,
    pub kind: ErrorKind,
    pub reason: String,
}

impl From<&BookmarkError> for SkippedBookmark {
    fn from(err: &BookmarkError) -> Self {
        SkippedBookmark {
            ordinal: err.ordinal,
            title: err.title.clone(),
            kind: err.kind(),
            reason: err.reason.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentFailure {
    pub kind: ErrorKind,
    pub message: String,
}

/// Outcome of one source document.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentReport {
    pub name: String,
    pub chapters: Vec<ChapterReport>,
    pub skipped: Vec<SkippedBookmark>,
    pub failure: Option<DocumentFailure>,
}

impl DocumentReport {
    pub fn succeeded(&self) -> bool {
        self.failure.is_none() && !self.chapters.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct BatchResult {
    pub documents: Vec<DocumentReport>,
    pub success_count: usize,
    pub total_count: usize,
    pub archive: Vec<u8>,
}

impl BatchResult {
    /// No chapter was produced from any document.
    pub fn is_empty(&self) -> bool {
        self.documents.iter().all(|doc| doc.chapters.is_empty())
    }

    pub fn is_partial_failure(&self) -> bool {
        self.success_count < self.total_count
    }

    pub fn chapter_count(&self) -> usize {
        self.documents.iter().map(|doc| doc.chapters.len()).sum()
    }

    /// Serializable view of the run, without the archive bytes.
    pub fn summary(&self, archive_path: Option<String>) -> BatchSummary<'_> {
        BatchSummary {
            archive: archive_path,
            chapter_count: self.chapter_count(),
            success_count: self.success_count,
            total_count: self.total_count,
            is_empty: self.is_empty(),
            documents: &self.documents,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BatchSummary<'a> {
    pub archive: Option<String>,
    pub chapter_count: usize,
    pub success_count: usize,
    pub total_count: usize,
    pub is_empty: bool,
    pub documents: &'a [DocumentReport],
}

/// What one document produced before archiving.
#[derive(Debug)]
pub struct DocumentSplit {
    pub chapters: Vec<Chapter>,
    pub skipped: Vec<BookmarkError>,
}

pub struct BatchSplitter {
    depth: u32,
    cancel: Option<Arc<AtomicBool>>,
}

impl BatchSplitter {
    pub fn new(depth: u32) -> Self {
        BatchSplitter { depth, cancel: None }
    }

    /// Stop before the next document once `flag` is set.
    pub fn with_cancel(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn run(&self, sources: &[SourceDocument]) -> Result<BatchResult, BatchError> {
        self.run_into(sources, ArchiveAssembler::new())
    }

    fn run_into(
        &self,
        sources: &[SourceDocument],
        mut archive: ArchiveAssembler,
    ) -> Result<BatchResult, BatchError> {
        if self.depth == 0 {
            return Err(BatchError::InvalidDepth(self.depth));
        }

        let directories = if sources.len() > 1 {
            let names: Vec<&str> = sources.iter().map(|s| s.name.as_str()).collect();
            Some(source_directories(&names))
        } else {
            None
        };

        let mut documents = Vec::with_capacity(sources.len());

        for (index, source) in sources.iter().enumerate() {
            if self.is_cancelled() {
                return Err(BatchError::Cancelled {
                    processed: index,
                    total: sources.len(),
                });
            }

            info!(document = %source.name, depth = self.depth, "splitting");
            let directory = directories.as_ref().map(|dirs| dirs[index].as_str());

            let report = match split_document(source, self.depth) {
                Ok(split) => {
                    let mut chapters = Vec::with_capacity(split.chapters.len());
                    for chapter in split.chapters {
                        let path = entry_path(directory, &chapter.file_name);
                        chapters.push(ChapterReport {
                            path: path.clone(),
                            ordinal: chapter.ordinal,
                            title: chapter.title,
                            first_page: chapter.range.start + 1,
                            last_page: chapter.range.end + 1,
                            page_count: chapter.range.page_count(),
                        });
                        archive.add(ArchiveEntry {
                            path,
                            bytes: chapter.bytes,
                        })?;
                    }
                    info!(document = %source.name, chapters = chapters.len(), "done");
                    DocumentReport {
                        name: source.name.clone(),
                        chapters,
                        skipped: split.skipped.iter().map(SkippedBookmark::from).collect(),
                        failure: None,
                    }
                }
                Err(err) => {
                    warn!(document = %source.name, error = %err, "document skipped");
                    DocumentReport {
                        name: source.name.clone(),
                        chapters: Vec::new(),
                        skipped: Vec::new(),
                        failure: Some(DocumentFailure {
                            kind: err.kind(),
                            message: err.to_string(),
                        }),
                    }
                }
            };
            documents.push(report);
        }

        info!(entries = archive.entry_count(), "writing archive");
        let success_count = documents.iter().filter(|doc| doc.succeeded()).count();
        Ok(BatchResult {
            total_count: documents.len(),
            success_count,
            documents,
            archive: archive.finalize()?,
        })
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

struct ResolvedBookmark {
    ordinal: usize,
    title: String,
    page: usize,
}

/// Split one document into chapters at `depth`.
///
/// Chapters are returned in page order and are only returned once every
/// range sliced cleanly, so a failed document contributes nothing.
pub fn split_document(
    source: &SourceDocument,
    depth: u32,
) -> Result<DocumentSplit, DocumentError> {
    let name = source.name.as_str();
    let bytes = source.bytes.as_ref().map_err(|message| DocumentError::Parse {
        document: name.to_string(),
        message: message.clone(),
    })?;
    let pdf = PdfDocument::from_bytes(name, bytes).map_err(|e| DocumentError::Parse {
        document: name.to_string(),
        message: format!("{:#}", e),
    })?;

    let tree = pdf
        .outline()
        .map_err(|e| DocumentError::Parse {
            document: name.to_string(),
            message: format!("{:#}", e),
        })?
        .ok_or_else(|| DocumentError::NoOutline {
            document: name.to_string(),
        })?;

    let selected = collect(&tree, depth);
    if selected.is_empty() {
        return Err(DocumentError::EmptyAtDepth {
            document: name.to_string(),
            depth,
        });
    }

    let resolver = DestinationResolver::new(&pdf);
    let mut resolved = Vec::with_capacity(selected.len());
    let mut skipped = Vec::new();

    for (i, leaf) in selected.iter().enumerate() {
        let ordinal = i + 1;
        match resolver.resolve(&leaf.destination) {
            Ok(page) => resolved.push(ResolvedBookmark {
                ordinal,
                title: leaf.title.clone(),
                page,
            }),
            Err(reason) => {
                let err = BookmarkError {
                    document: name.to_string(),
                    ordinal,
                    title: leaf.title.clone(),
                    reason,
                };
                warn!("{}", err);
                skipped.push(err);
            }
        }
    }

    if resolved.is_empty() {
        return Err(DocumentError::NoResolvableBookmarks {
            document: name.to_string(),
            depth,
            selected: selected.len(),
        });
    }

    // Ranges assume ascending pages; sort stably so equal pages keep outline order
    if resolved.windows(2).any(|pair| pair[0].page > pair[1].page) {
        warn!(document = %name, "bookmarks are out of page order, sorting by page");
        resolved.sort_by_key(|bookmark| bookmark.page);
    }

    let starts: Vec<usize> = resolved.iter().map(|bookmark| bookmark.page).collect();
    let ranges = compute_ranges(&starts, pdf.page_count());

    let mut chapters = Vec::with_capacity(resolved.len());
    for (bookmark, range) in resolved.into_iter().zip(ranges) {
        debug!(
            document = %name,
            ordinal = bookmark.ordinal,
            first = range.start + 1,
            last = range.end + 1,
            "slicing chapter"
        );
        let bytes = pdf.slice(range).map_err(|e| DocumentError::Slice {
            document: name.to_string(),
            ordinal: bookmark.ordinal,
            title: bookmark.title.clone(),
            message: format!("{:#}", e),
        })?;
        chapters.push(Chapter {
            file_name: chapter_file_name(bookmark.ordinal, &bookmark.title),
            ordinal: bookmark.ordinal,
            title: bookmark.title,
            range,
            bytes,
        });
    }

    Ok(DocumentSplit { chapters, skipped })
}
