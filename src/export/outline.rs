//! Bookmark/outline tree builder.
//!
//! Turns the document's flat bookmark list into the linked outline-item
//! object tree. Nesting comes from each bookmark's depth; depths are
//! clamped (a jump deeper than one level attaches to the deepest open
//! item) so minor document-model inconsistencies never drop a bookmark.

use std::collections::HashMap;

use log::debug;

use crate::doc::Bookmark;
use crate::error::ExportResult;
use crate::pdf::{Dictionary, Object, ObjectId, PdfWriter};

/// Output page an outline destination points at
pub(crate) struct OutlineTarget {
    pub page_id: ObjectId,
    /// Page height, used as the destination's top coordinate
    pub height: f64,
}

struct Node<'b> {
    bookmark: &'b Bookmark,
    parent: Option<usize>,
    first: Option<usize>,
    last: Option<usize>,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Write the outline-item objects and the outline root; returns the root
/// id, or `None` when no exported page is targeted by any bookmark
pub(crate) fn write_outline(
    writer: &mut PdfWriter,
    bookmarks: &[Bookmark],
    targets: &HashMap<usize, OutlineTarget>,
) -> ExportResult<Option<ObjectId>> {
    // Bookmarks pointing outside the exported page set cannot be
    // referenced and are skipped
    let items: Vec<&Bookmark> = bookmarks
        .iter()
        .filter(|b| targets.contains_key(&b.page))
        .collect();
    if items.is_empty() {
        return Ok(None);
    }
    debug!("writing outline tree with {} items", items.len());

    let nodes = link_nodes(&items);

    let ids: Vec<ObjectId> = items.iter().map(|_| writer.alloc()).collect();
    let root_id = writer.alloc();

    for (i, node) in nodes.iter().enumerate() {
        let target = &targets[&node.bookmark.page];

        let mut dict = Dictionary::new();
        dict.set("Title", Object::String(node.bookmark.title.clone().into_bytes()));
        dict.set_reference(
            "Parent",
            node.parent.map(|p| ids[p]).unwrap_or(root_id),
        );
        if let Some(prev) = node.prev {
            dict.set_reference("Prev", ids[prev]);
        }
        if let Some(next) = node.next {
            dict.set_reference("Next", ids[next]);
        }
        if let Some(first) = node.first {
            dict.set_reference("First", ids[first]);
        }
        if let Some(last) = node.last {
            dict.set_reference("Last", ids[last]);
        }
        dict.set(
            "Dest",
            Object::Array(vec![
                Object::Reference(target.page_id),
                Object::Name("XYZ".into()),
                Object::Number(0.0),
                Object::Number(target.height),
                Object::Null,
            ]),
        );
        dict.set("Count", Object::Number(0.0));

        writer.write_object(ids[i], &Object::Dictionary(dict));
    }

    let first_top = 0;
    let last_top = {
        let mut i = 0;
        while let Some(next) = nodes[i].next {
            i = next;
        }
        i
    };

    let mut root = Dictionary::new();
    root.set_name("Type", "Outlines");
    root.set_reference("First", ids[first_top]);
    root.set_reference("Last", ids[last_top]);
    writer.write_object(root_id, &Object::Dictionary(root));

    Ok(Some(root_id))
}

/// Thread the parent/first/last/prev/next links with an explicit depth
/// stack: `stack[d]` is the most recent item open at depth `d`
fn link_nodes<'b>(items: &[&'b Bookmark]) -> Vec<Node<'b>> {
    let mut nodes: Vec<Node<'b>> = items
        .iter()
        .map(|b| Node {
            bookmark: b,
            parent: None,
            first: None,
            last: None,
            prev: None,
            next: None,
        })
        .collect();

    let mut stack: Vec<usize> = Vec::new();
    for i in 0..nodes.len() {
        // Depth can grow by at most one level at a time
        let depth = nodes[i].bookmark.depth.min(stack.len());

        if depth < stack.len() {
            // Sibling of the item currently open at this depth
            let prev = stack[depth];
            nodes[prev].next = Some(i);
            nodes[i].prev = Some(prev);
            stack.truncate(depth);
        }

        if let Some(&parent) = stack.last() {
            nodes[i].parent = Some(parent);
            if nodes[parent].first.is_none() {
                nodes[parent].first = Some(i);
            }
            nodes[parent].last = Some(i);
        }

        stack.push(i);
    }

    nodes
}
