use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

use crate::pdf::document::as_dictionary;
use crate::pdf::outline::{destination_from_object, Destination};
use crate::pdf::PdfDocument;

/// Why a destination could not be mapped to a page.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Unresolvable {
    #[error("bookmark has no destination")]
    Missing,

    #[error("destination points to object {0:?}, which is not a page")]
    UnknownPage(ObjectId),

    #[error("page number {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: i64, total: usize },

    #[error("named destination {0:?} not found")]
    UnknownName(String),

    #[error("reference to missing object {0:?}")]
    Dangling(ObjectId),

    #[error("circular reference through object {0:?}")]
    Circular(ObjectId),

    #[error("named destination {0:?} refers back to itself")]
    CircularName(String),

    #[error("unsupported destination: {0}")]
    Unsupported(String),
}

#[derive(Default)]
struct Visited {
    objects: HashSet<ObjectId>,
    names: HashSet<Vec<u8>>,
}

/// Maps outline destinations to 0-based page indices of one document.
pub struct DestinationResolver<'a> {
    doc: &'a Document,
    page_index: HashMap<ObjectId, usize>,
    total_pages: usize,
}

impl<'a> DestinationResolver<'a> {
    pub fn new(pdf: &'a PdfDocument) -> Self {
        let page_index: HashMap<ObjectId, usize> = pdf
            .page_ids()
            .into_iter()
            .enumerate()
            .map(|(index, id)| (id, index))
            .collect();
        DestinationResolver {
            doc: &pdf.doc,
            total_pages: page_index.len(),
            page_index,
        }
    }

    pub fn resolve(&self, destination: &Destination) -> Result<usize, Unresolvable> {
        self.resolve_with(destination, &mut Visited::default())
    }

    fn resolve_with(
        &self,
        destination: &Destination,
        visited: &mut Visited,
    ) -> Result<usize, Unresolvable> {
        match destination {
            Destination::Page(id) => self
                .page_index
                .get(id)
                .copied()
                .ok_or(Unresolvable::UnknownPage(*id)),
            Destination::PageNumber(n) => usize::try_from(*n)
                .ok()
                .filter(|index| *index < self.total_pages)
                .ok_or(Unresolvable::PageOutOfRange {
                    page: *n,
                    total: self.total_pages,
                }),
            Destination::Named(name) => {
                let display = String::from_utf8_lossy(name).into_owned();
                if !visited.names.insert(name.clone()) {
                    return Err(Unresolvable::CircularName(display));
                }
                let target = self
                    .lookup_name(name)?
                    .ok_or(Unresolvable::UnknownName(display))?;
                self.resolve_with(&target, visited)
            }
            Destination::Indirect(id) => {
                let obj = self.follow(*id, &mut visited.objects)?;
                self.resolve_with(&destination_from_value(obj), visited)
            }
            Destination::Missing => Err(Unresolvable::Missing),
            Destination::Unsupported(what) => Err(Unresolvable::Unsupported(what.clone())),
        }
    }

    /// Fetch an indirect object, refusing to visit the same object twice.
    fn follow(
        &self,
        id: ObjectId,
        visited: &mut HashSet<ObjectId>,
    ) -> Result<&'a Object, Unresolvable> {
        if !visited.insert(id) {
            return Err(Unresolvable::Circular(id));
        }
        // Read the object table directly; get_object would silently chase
        // reference chains past the visited check
        self.doc.objects.get(&id).ok_or(Unresolvable::Dangling(id))
    }

    fn lookup_name(&self, name: &[u8]) -> Result<Option<Destination>, Unresolvable> {
        let catalog = match self.doc.catalog() {
            Ok(c) => c,
            Err(_) => return Ok(None),
        };

        // Names/Dests name tree (PDF 1.2+)
        if let Some(names) = catalog.get(b"Names").ok().and_then(|o| as_dictionary(self.doc, o)) {
            if let Ok(root) = names.get(b"Dests") {
                // Tree nodes get their own visited set; a second lookup in the
                // same chain walks the same nodes legitimately
                let mut tree_nodes = HashSet::new();
                if let Some(found) = self.search_name_tree(root, name, &mut tree_nodes)? {
                    return Ok(Some(destination_from_value(found)));
                }
            }
        }

        // Dests dictionary (older style)
        if let Some(dests) = catalog.get(b"Dests").ok().and_then(|o| as_dictionary(self.doc, o)) {
            if let Ok(found) = dests.get(name) {
                return Ok(Some(destination_from_value(found)));
            }
        }

        Ok(None)
    }

    fn search_name_tree(
        &self,
        node: &'a Object,
        name: &[u8],
        visited: &mut HashSet<ObjectId>,
    ) -> Result<Option<&'a Object>, Unresolvable> {
        let dict: &Dictionary = match node {
            Object::Reference(id) => match self.follow(*id, visited)? {
                Object::Dictionary(d) => d,
                _ => return Ok(None),
            },
            Object::Dictionary(d) => d,
            _ => return Ok(None),
        };

        // Check Names array (leaf node)
        if let Ok(Object::Array(names)) = dict.get(b"Names") {
            for chunk in names.chunks(2) {
                if let [Object::String(key, _), value] = chunk {
                    if key.as_slice() == name {
                        return Ok(Some(value));
                    }
                }
            }
        }

        // Check Kids array (intermediate node)
        if let Ok(Object::Array(kids)) = dict.get(b"Kids") {
            for kid in kids {
                if let Some(found) = self.search_name_tree(kid, name, visited)? {
                    return Ok(Some(found));
                }
            }
        }

        Ok(None)
    }
}

/// Like `destination_from_object`, but also unwraps the `<< /D [...] >>`
/// form that named destinations are allowed to take.
fn destination_from_value(obj: &Object) -> Destination {
    match obj {
        Object::Dictionary(dict) => match dict.get(b"D") {
            Ok(inner) => destination_from_object(inner),
            Err(_) => Destination::Missing,
        },
        Object::Stream(_) => Destination::Unsupported("stream destination".to_string()),
        other => destination_from_object(other),
    }
}
