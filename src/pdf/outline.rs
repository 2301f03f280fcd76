use anyhow::{Context, Result};
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::HashSet;

use crate::pdf::document::{as_dictionary, decode_pdf_string};

/// Where an outline item points, before it is mapped to a page.
#[derive(Debug, Clone, PartialEq)]
pub enum Destination {
    /// `[pageRef /XYZ ...]`
    Page(ObjectId),
    /// `[pageNumber /Fit ...]`, 0-based as written in the file
    PageNumber(i64),
    /// Key into the named destination tree or the legacy `/Dests` dictionary
    Named(Vec<u8>),
    /// Indirect object holding any of the above
    Indirect(ObjectId),
    Missing,
    Unsupported(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutlineLeaf {
    pub title: String,
    pub destination: Destination,
}

/// One node of the outline tree.
///
/// A `Group` holds the children of the `Leaf` right before it and sits one
/// level deeper than that leaf.
#[derive(Debug, Clone, PartialEq)]
pub enum OutlineNode {
    Leaf(OutlineLeaf),
    Group(Vec<OutlineNode>),
}

/// Read the outline out of the document catalog.
///
/// Returns `None` when the catalog has no `/Outlines` entry, and an empty
/// vector when the outline dictionary exists but holds no items.
pub fn parse_outline(doc: &Document) -> Result<Option<Vec<OutlineNode>>> {
    let catalog = doc
        .catalog()
        .with_context(|| "Failed to get document catalog")?;

    let outlines = match catalog.get(b"Outlines") {
        Ok(obj) => obj,
        Err(_) => return Ok(None),
    };

    // A present but unreadable /Outlines still counts as "has an outline"
    let outlines = match as_dictionary(doc, outlines) {
        Some(d) => d,
        None => return Ok(Some(Vec::new())),
    };

    let first_ref = match outlines.get(b"First") {
        Ok(Object::Reference(r)) => *r,
        _ => return Ok(Some(Vec::new())),
    };

    let mut visited = HashSet::new();
    Ok(Some(parse_outline_items(doc, first_ref, &mut visited)))
}

fn parse_outline_items(
    doc: &Document,
    first_id: ObjectId,
    visited: &mut HashSet<ObjectId>,
) -> Vec<OutlineNode> {
    let mut nodes = Vec::new();
    let mut current_id = Some(first_id);

    while let Some(id) = current_id {
        // A revisited item means /Next or /First loops back on itself
        if !visited.insert(id) {
            break;
        }

        let dict = match doc.get_dictionary(id) {
            Ok(d) => d,
            Err(_) => break,
        };

        let title = match dict.get(b"Title") {
            Ok(Object::Reference(title_id)) => doc.get_object(*title_id).ok(),
            Ok(obj) => Some(obj),
            Err(_) => None,
        };
        let title = match title {
            Some(Object::String(bytes, _)) => decode_pdf_string(bytes),
            _ => String::new(),
        };

        nodes.push(OutlineNode::Leaf(OutlineLeaf {
            title,
            destination: item_destination(doc, dict),
        }));

        if let Ok(Object::Reference(child_ref)) = dict.get(b"First") {
            let children = parse_outline_items(doc, *child_ref, visited);
            if !children.is_empty() {
                nodes.push(OutlineNode::Group(children));
            }
        }

        current_id = match dict.get(b"Next") {
            Ok(Object::Reference(r)) => Some(*r),
            _ => None,
        };
    }

    nodes
}

fn item_destination(doc: &Document, dict: &Dictionary) -> Destination {
    // Try Dest first (direct destination)
    if let Ok(dest) = dict.get(b"Dest") {
        return destination_from_object(dest);
    }

    let action = match dict.get(b"A") {
        Ok(obj) => obj,
        Err(_) => return Destination::Missing,
    };
    let action = match as_dictionary(doc, action) {
        Some(d) => d,
        None => return Destination::Unsupported("malformed action".to_string()),
    };

    match action.get(b"S") {
        Ok(Object::Name(kind)) if kind == b"GoTo" => match action.get(b"D") {
            Ok(dest) => destination_from_object(dest),
            Err(_) => Destination::Missing,
        },
        Ok(Object::Name(kind)) => {
            Destination::Unsupported(format!("{} action", String::from_utf8_lossy(kind)))
        }
        _ => Destination::Unsupported("action without type".to_string()),
    }
}

/// Classify a raw `/Dest` or `/D` value without following references.
pub(crate) fn destination_from_object(obj: &Object) -> Destination {
    match obj {
        Object::Array(arr) => match arr.first() {
            Some(Object::Reference(page_ref)) => Destination::Page(*page_ref),
            Some(Object::Integer(n)) => Destination::PageNumber(*n),
            _ => Destination::Unsupported("destination array without a page".to_string()),
        },
        Object::String(name, _) | Object::Name(name) => Destination::Named(name.clone()),
        Object::Reference(r) => Destination::Indirect(*r),
        Object::Null => Destination::Missing,
        Object::Dictionary(_) | Object::Stream(_) => {
            Destination::Unsupported("destination dictionary outside a name tree".to_string())
        }
        _ => Destination::Unsupported("unrecognized destination".to_string()),
    }
}

/// Leaves at `target_depth`, in depth-first document order.
///
/// Depth starts at 1 for the top level of the outline.
pub fn collect(nodes: &[OutlineNode], target_depth: u32) -> Vec<&OutlineLeaf> {
    collect_at(nodes, 1, target_depth, Vec::new())
}

fn collect_at<'a>(
    nodes: &'a [OutlineNode],
    depth: u32,
    target_depth: u32,
    mut selected: Vec<&'a OutlineLeaf>,
) -> Vec<&'a OutlineLeaf> {
    for node in nodes {
        match node {
            OutlineNode::Leaf(leaf) if depth == target_depth => selected.push(leaf),
            OutlineNode::Leaf(_) => {}
            OutlineNode::Group(children) if depth < target_depth => {
                selected = collect_at(children, depth + 1, target_depth, selected);
            }
            OutlineNode::Group(_) => {}
        }
    }
    selected
}

/// Deepest level that holds a leaf; 0 for an empty outline.
pub fn max_depth(nodes: &[OutlineNode]) -> u32 {
    nodes
        .iter()
        .map(|node| match node {
            OutlineNode::Leaf(_) => 1,
            OutlineNode::Group(children) => match max_depth(children) {
                0 => 0,
                d => d + 1,
            },
        })
        .max()
        .unwrap_or(0)
}

#[derive(Debug, Clone)]
pub struct FlatOutlineEntry<'a> {
    pub depth: u32,
    pub leaf: &'a OutlineLeaf,
}

/// Flatten the tree into pre-order rows with their depth
pub fn flatten(nodes: &[OutlineNode]) -> Vec<FlatOutlineEntry<'_>> {
    flatten_at(nodes, 1, Vec::new())
}

fn flatten_at<'a>(
    nodes: &'a [OutlineNode],
    depth: u32,
    mut rows: Vec<FlatOutlineEntry<'a>>,
) -> Vec<FlatOutlineEntry<'a>> {
    for node in nodes {
        match node {
            OutlineNode::Leaf(leaf) => rows.push(FlatOutlineEntry { depth, leaf }),
            OutlineNode::Group(children) => rows = flatten_at(children, depth + 1, rows),
        }
    }
    rows
}
