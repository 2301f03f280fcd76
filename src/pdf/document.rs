use anyhow::{Context, Result};
use lopdf::{Document, Object, ObjectId};
use std::path::Path;

use crate::page_range::PageRange;
use crate::pdf::outline::{parse_outline, OutlineNode};

pub struct PdfDocument {
    pub doc: Document,
    pub name: String,
}

impl PdfDocument {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let name = path.as_ref().display().to_string();
        let doc = Document::load(&path).with_context(|| format!("Failed to open PDF: {}", name))?;
        Ok(PdfDocument { doc, name })
    }

    /// Parse a PDF held in memory. `name` identifies it in errors and logs.
    pub fn from_bytes(name: impl Into<String>, bytes: &[u8]) -> Result<Self> {
        let name = name.into();
        let doc = Document::load_mem(bytes)
            .with_context(|| format!("Failed to parse PDF: {}", name))?;
        Ok(PdfDocument { doc, name })
    }

    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// Page object IDs in page order; position in the vector is the 0-based index
    pub fn page_ids(&self) -> Vec<ObjectId> {
        // get_pages is a BTreeMap keyed by 1-based page number
        self.doc.get_pages().into_values().collect()
    }

    /// The outline tree, or `None` when the catalog carries no `/Outlines` at all.
    pub fn outline(&self) -> Result<Option<Vec<OutlineNode>>> {
        parse_outline(&self.doc)
    }

    /// Build a standalone PDF holding pages `range.start..=range.end`.
    ///
    /// Works on a clone: the other pages are deleted, the outline is dropped
    /// (its destinations would point at deleted pages) and orphaned objects
    /// are pruned before serializing.
    pub fn slice(&self, range: PageRange) -> Result<Vec<u8>> {
        let total = self.page_count();
        if range.start > range.end || range.end >= total {
            anyhow::bail!(
                "Pages {}-{} are out of range (1-{})",
                range.start + 1,
                range.end + 1,
                total
            );
        }

        let mut new_doc = self.doc.clone();

        // delete_pages takes 1-based page numbers
        let pages_to_delete: Vec<u32> = (0..total)
            .filter(|index| !range.contains(*index))
            .map(|index| index as u32 + 1)
            .collect();
        if !pages_to_delete.is_empty() {
            new_doc.delete_pages(&pages_to_delete);
        }

        let root_id = new_doc.trailer.get(b"Root").and_then(Object::as_reference).ok();
        if let Some(root_id) = root_id {
            if let Ok(catalog) = new_doc.get_dictionary_mut(root_id) {
                catalog.remove(b"Outlines");
                catalog.remove(b"PageMode");
            }
        }

        new_doc.prune_objects();

        let mut buffer = Vec::new();
        new_doc
            .save_to(&mut buffer)
            .with_context(|| {
                format!("Failed to serialize pages {}-{}", range.start + 1, range.end + 1)
            })?;
        Ok(buffer)
    }
}

/// Resolve an object that is either an inline dictionary or a reference to one.
pub(crate) fn as_dictionary<'a>(
    doc: &'a Document,
    obj: &'a Object,
) -> Option<&'a lopdf::Dictionary> {
    match obj {
        Object::Dictionary(dict) => Some(dict),
        Object::Reference(id) => doc.get_dictionary(*id).ok(),
        _ => None,
    }
}

pub(crate) fn decode_pdf_string(bytes: &[u8]) -> String {
    // Check for UTF-16 BOM
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        // UTF-16 BE
        let u16_chars: Vec<u16> = bytes[2..]
            .chunks(2)
            .filter_map(|chunk| {
                if chunk.len() == 2 {
                    Some(u16::from_be_bytes([chunk[0], chunk[1]]))
                } else {
                    None
                }
            })
            .collect();
        String::from_utf16_lossy(&u16_chars)
    } else if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
        // PDF 2.0 UTF-8 with BOM
        String::from_utf8_lossy(&bytes[3..]).into_owned()
    } else {
        // PDFDocEncoding / Latin-1 (simplified)
        bytes.iter().map(|&b| b as char).collect()
    }
}
