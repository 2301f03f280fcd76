use crate::pdf::outline::{flatten, max_depth};
use crate::pdf::{DestinationResolver, PdfDocument};
use anyhow::Result;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct TocRow {
    pub depth: u32,
    pub title: String,
    /// 1-based; `None` when the bookmark does not resolve to a page
    pub page: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct TocListing {
    pub rows: Vec<TocRow>,
    pub max_depth: u32,
}

/// Outline rows in document order, or `None` when the PDF has no outline.
pub fn outline_listing(doc: &PdfDocument) -> Result<Option<TocListing>> {
    let tree = match doc.outline()? {
        Some(tree) => tree,
        None => return Ok(None),
    };

    let resolver = DestinationResolver::new(doc);
    let rows = flatten(&tree)
        .into_iter()
        .map(|entry| TocRow {
            depth: entry.depth,
            title: entry.leaf.title.clone(),
            page: resolver.resolve(&entry.leaf.destination).ok().map(|p| p + 1),
        })
        .collect();

    Ok(Some(TocListing {
        rows,
        max_depth: max_depth(&tree),
    }))
}

pub fn run<P: AsRef<Path>>(path: P) -> Result<()> {
    let doc = PdfDocument::open(&path)?;
    println!("File: {}", doc.name);

    let listing = match outline_listing(&doc)? {
        Some(listing) => listing,
        None => {
            println!("No table of contents found.");
            return Ok(());
        }
    };

    if listing.rows.is_empty() {
        println!("Table of contents is empty.");
        return Ok(());
    }

    for row in &listing.rows {
        let indent = "  ".repeat(row.depth as usize - 1);
        let page_str = row.page.map(|p| format!(" (p. {})", p)).unwrap_or_default();
        println!("{}[{}] {}{}", indent, row.depth, row.title, page_str);
    }

    println!("\nSplit depths 1-{} available.", listing.max_depth);

    Ok(())
}
