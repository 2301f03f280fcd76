//! In-memory PDF fixtures for unit tests.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};

/// One outline item: title, 0-based target page and nested items.
///
/// A page at or past the page count is written as a bare page number,
/// which makes the bookmark unresolvable.
pub struct Mark {
    pub title: String,
    pub page: usize,
    pub children: Vec<Mark>,
}

pub fn mark(title: &str, page: usize, children: Vec<Mark>) -> Mark {
    Mark {
        title: title.to_string(),
        page,
        children,
    }
}

/// Build a PDF with `num_pages` pages whose content shows "Page N".
///
/// `outline: None` writes no `/Outlines` entry; `Some(vec![])` writes an
/// outline dictionary without items.
pub fn build_pdf(num_pages: usize, outline: Option<Vec<Mark>>) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let mut page_ids = Vec::new();
    for i in 0..num_pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(12)]),
                Operation::new("Td", vec![Object::Integer(100), Object::Integer(700)]),
                Operation::new(
                    "Tj",
                    vec![Object::String(
                        format!("Page {}", i + 1).into_bytes(),
                        StringFormat::Literal,
                    )],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode().unwrap()));

        let page = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(612),
                    Object::Integer(792),
                ]),
            ),
            ("Contents", Object::Reference(content_id)),
        ]);
        page_ids.push(doc.add_object(page));
    }

    let pages = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(num_pages as i64)),
        (
            "Kids",
            Object::Array(page_ids.iter().map(|id| Object::Reference(*id)).collect()),
        ),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let mut catalog = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]);

    if let Some(marks) = outline {
        let outlines_id = doc.new_object_id();
        let mut outlines =
            Dictionary::from_iter(vec![("Type", Object::Name(b"Outlines".to_vec()))]);
        if let Some((first, last)) = add_outline_items(&mut doc, outlines_id, &marks, &page_ids) {
            outlines.set("First", Object::Reference(first));
            outlines.set("Last", Object::Reference(last));
        }
        outlines.set("Count", Object::Integer(marks.len() as i64));
        doc.objects.insert(outlines_id, Object::Dictionary(outlines));
        catalog.set("Outlines", Object::Reference(outlines_id));
    }

    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

fn add_outline_items(
    doc: &mut Document,
    parent: ObjectId,
    marks: &[Mark],
    page_ids: &[ObjectId],
) -> Option<(ObjectId, ObjectId)> {
    if marks.is_empty() {
        return None;
    }

    let ids: Vec<ObjectId> = marks.iter().map(|_| doc.new_object_id()).collect();
    for (i, m) in marks.iter().enumerate() {
        let target = match page_ids.get(m.page) {
            Some(id) => Object::Reference(*id),
            None => Object::Integer(m.page as i64),
        };

        let mut item = Dictionary::from_iter(vec![
            (
                "Title",
                Object::String(m.title.as_bytes().to_vec(), StringFormat::Literal),
            ),
            ("Parent", Object::Reference(parent)),
            (
                "Dest",
                Object::Array(vec![target, Object::Name(b"Fit".to_vec())]),
            ),
        ]);
        if i > 0 {
            item.set("Prev", Object::Reference(ids[i - 1]));
        }
        if i + 1 < ids.len() {
            item.set("Next", Object::Reference(ids[i + 1]));
        }
        if let Some((first, last)) = add_outline_items(doc, ids[i], &m.children, page_ids) {
            item.set("First", Object::Reference(first));
            item.set("Last", Object::Reference(last));
            item.set("Count", Object::Integer(m.children.len() as i64));
        }
        doc.objects.insert(ids[i], Object::Dictionary(item));
    }

    Some((ids[0], ids[ids.len() - 1]))
}

/// The "Page N" text drawn on a fixture page.
pub fn page_marker(doc: &Document, page_id: ObjectId) -> String {
    let bytes = doc.get_page_content(page_id).unwrap();
    let content = Content::decode(&bytes).unwrap();
    content
        .operations
        .iter()
        .find(|op| op.operator == "Tj")
        .and_then(|op| match op.operands.first() {
            Some(Object::String(text, _)) => Some(String::from_utf8_lossy(text).into_owned()),
            _ => None,
        })
        .unwrap_or_default()
}
