//! Page/Resource composer.
//!
//! Produces the content streams, resource dictionary and page object for
//! one output page, choosing between the synthetic and imported strategy
//! based on the page's background classification.

use log::warn;

use crate::doc::{BackgroundKind, PageSource, RenderedAnnotations};
use crate::error::{ExportError, ExportResult};
use crate::pdf::{Dictionary, Object, ObjectId, PdfWriter, Stream};
use crate::source::{SourceGraph, SourceObject, SourcePageHandle, SourceStream};
use super::remap::RemapContext;

/// Compose one output page and return its object id.
///
/// For imported pages the source content is written first and annotations
/// last, so the original page paints below and annotations on top.
pub(crate) fn compose_page(
    writer: &mut PdfWriter,
    doc_index: usize,
    page: &dyn PageSource,
    annotations: RenderedAnnotations,
    parent: ObjectId,
) -> ExportResult<ObjectId> {
    let page_id = writer.alloc();

    let mut categories: Vec<(String, Dictionary)> = Vec::new();
    let mut contents: Vec<ObjectId> = Vec::new();

    if page.background() == BackgroundKind::ImportedPdf {
        let handle = page
            .source_page()
            .ok_or(ExportError::MissingSourcePage(doc_index))?;
        copy_source_page(writer, doc_index, handle, &mut categories, &mut contents)?;
    }

    append_annotations(writer, doc_index, annotations, &mut categories, &mut contents);

    let (width, height) = page.size();
    let mut page_dict = Dictionary::new();
    page_dict.set_name("Type", "Page");
    page_dict.set_reference("Parent", parent);
    page_dict.set("MediaBox", media_box(width, height));
    page_dict.set("Resources", Object::Dictionary(build_resources(categories)));
    page_dict.set(
        "Contents",
        Object::Array(contents.into_iter().map(Object::Reference).collect()),
    );
    writer.write_object(page_id, &Object::Dictionary(page_dict));

    Ok(page_id)
}

/// `[0 0 width height]`
pub(crate) fn media_box(width: f64, height: f64) -> Object {
    Object::Array(vec![
        Object::Number(0.0),
        Object::Number(0.0),
        Object::Number(width),
        Object::Number(height),
    ])
}

/// Copy the source page's resources and content streams, renumbering
/// every indirect reference. The per-page remap context is created and
/// drained here; it never outlives this call.
fn copy_source_page(
    writer: &mut PdfWriter,
    doc_index: usize,
    handle: SourcePageHandle<'_>,
    categories: &mut Vec<(String, Dictionary)>,
    contents: &mut Vec<ObjectId>,
) -> ExportResult<()> {
    let graph = handle.graph();
    let mut remap = RemapContext::new(graph, doc_index);

    if let Some(resources) = handle.resources() {
        copy_resources(writer, doc_index, graph, &mut remap, resources, categories)?;
    }

    for stream in collect_content_streams(graph, handle.contents(), doc_index)? {
        let id = copy_content_stream(writer, doc_index, &mut remap, stream)?;
        contents.push(id);
    }

    remap.flush(writer)?;
    Ok(())
}

/// Walk the source resource dictionary category by category.
///
/// `/ProcSet` is not copied; the composer writes its own. Non-dictionary
/// categories are skipped with a warning, as the original page still
/// renders without them.
fn copy_resources(
    writer: &mut PdfWriter,
    doc_index: usize,
    graph: &SourceGraph,
    remap: &mut RemapContext<'_>,
    resources: &SourceObject,
    categories: &mut Vec<(String, Dictionary)>,
) -> ExportResult<()> {
    let resolved = graph.resolve_direct(resources).ok_or_else(|| {
        ExportError::resources(doc_index, "resource dictionary reference does not resolve")
    })?;
    let entries = resolved
        .as_dict()
        .ok_or_else(|| ExportError::resources(doc_index, "resource entry is not a dictionary"))?;

    for (category, value) in entries {
        if category == "ProcSet" {
            continue;
        }

        let Some(cat_entries) = graph.resolve_direct(value).and_then(SourceObject::as_dict)
        else {
            warn!(
                "page {}: resource category /{} is not a dictionary, skipping",
                doc_index, category
            );
            continue;
        };

        let dict = category_dict(categories, category);
        for (name, entry) in cat_entries {
            let converted = remap.convert(writer, entry)?;
            dict.set(name.clone(), converted);
        }
    }
    Ok(())
}

/// Resolve the page's `/Contents` entry into the streams it names, in
/// paint order
fn collect_content_streams<'g>(
    graph: &'g SourceGraph,
    contents: &'g SourceObject,
    doc_index: usize,
) -> ExportResult<Vec<&'g SourceStream>> {
    let one = |obj: &'g SourceObject| -> ExportResult<&'g SourceStream> {
        graph
            .resolve_direct(obj)
            .and_then(SourceObject::as_stream)
            .ok_or_else(|| {
                ExportError::decode(doc_index, "contents entry is not a stream")
            })
    };

    // /Contents itself may be a reference to the stream or to the array
    let resolved = graph.resolve_direct(contents).ok_or_else(|| {
        ExportError::decode(doc_index, "contents reference does not resolve")
    })?;
    match resolved {
        SourceObject::Array(items) => items.iter().map(one).collect(),
        other => Ok(vec![one(other)?]),
    }
}

/// Write one source content stream under a fresh object number.
///
/// Deflate-encoded bodies are validated (a corrupt source PDF must fail
/// the export, not produce a broken page) and then copied verbatim; plain
/// bodies are re-encoded with deflate. Any other filter on page content is
/// fatal.
fn copy_content_stream(
    writer: &mut PdfWriter,
    doc_index: usize,
    remap: &mut RemapContext<'_>,
    stream: &SourceStream,
) -> ExportResult<ObjectId> {
    let out = if stream.is_unfiltered() {
        Stream::deflate(Dictionary::new(), &stream.data)
    } else if stream.filter_name() == Some("FlateDecode") {
        Stream::inflate(&stream.data)
            .map_err(|e| ExportError::decode(doc_index, e.to_string()))?;

        let mut dict = Dictionary::new();
        for (key, value) in &stream.dict {
            if key == "Length" || key == "Filter" {
                continue;
            }
            dict.set(key.clone(), remap.convert(writer, value)?);
        }
        Stream::raw_deflated(dict, stream.data.clone())
    } else {
        let filter = match stream.dict_get("Filter") {
            Some(SourceObject::Name(n)) => n.clone(),
            other => format!("{:?}", other),
        };
        return Err(ExportError::UnsupportedFilter {
            page: doc_index,
            filter,
        });
    };

    Ok(writer.write_new_object(&Object::Stream(out)))
}

/// Merge the annotation resources into the page's categories, renaming on
/// collision, and append the annotation content stream last.
///
/// Renames are rewritten inside the annotation stream only; source
/// streams are never touched.
fn append_annotations(
    writer: &mut PdfWriter,
    doc_index: usize,
    annotations: RenderedAnnotations,
    categories: &mut Vec<(String, Dictionary)>,
    contents: &mut Vec<ObjectId>,
) {
    let mut renames: Vec<(String, String)> = Vec::new();

    for resource in &annotations.resources {
        let dict = category_dict(categories, &resource.category);

        let mut final_name = resource.name.clone();
        if dict.contains_key(&final_name) {
            final_name = free_name(dict, &resource.name);
            warn!(
                "page {}: /{} resource name /{} collides with the source page, renamed to /{}",
                doc_index, resource.category, resource.name, final_name
            );
            renames.push((resource.name.clone(), final_name.clone()));
        }

        let id = writer.write_new_object(&resource.object);
        dict.set_reference(final_name, id);
    }

    let content = if renames.is_empty() {
        annotations.content
    } else {
        rewrite_names(&annotations.content, &renames)
    };

    let stream = Stream::deflate(Dictionary::new(), &content);
    contents.push(writer.write_new_object(&Object::Stream(stream)));
}

/// Find or create the dictionary for one resource category
fn category_dict<'c>(
    categories: &'c mut Vec<(String, Dictionary)>,
    category: &str,
) -> &'c mut Dictionary {
    if let Some(pos) = categories.iter().position(|(c, _)| c == category) {
        return &mut categories[pos].1;
    }
    categories.push((category.to_string(), Dictionary::new()));
    &mut categories.last_mut().unwrap().1
}

/// Smallest free `<name>x<n>` in the category
fn free_name(dict: &Dictionary, name: &str) -> String {
    let mut n = 1;
    loop {
        let candidate = format!("{}x{}", name, n);
        if !dict.contains_key(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Assemble the final `/Resources` dictionary: default `/ProcSet` plus
/// the merged categories
fn build_resources(categories: Vec<(String, Dictionary)>) -> Dictionary {
    let mut resources = Dictionary::new();
    resources.set(
        "ProcSet",
        Object::Array(
            ["PDF", "Text", "ImageB", "ImageC", "ImageI"]
                .into_iter()
                .map(|n| Object::Name(n.to_string()))
                .collect(),
        ),
    );
    for (category, dict) in categories {
        resources.set(category, Object::Dictionary(dict));
    }
    resources
}

/// Replace renamed resource name tokens in a content stream.
///
/// Scans outside literal strings only (parenthesis depth with backslash
/// escapes) and matches whole name tokens, so `/Im0` is not rewritten
/// inside `/Im01` or inside string data.
pub(crate) fn rewrite_names(content: &[u8], renames: &[(String, String)]) -> Vec<u8> {
    let mut out = Vec::with_capacity(content.len());
    let mut depth = 0usize;
    let mut last = 0u8;
    let mut i = 0;

    while i < content.len() {
        let c = content[i];
        if c == b'(' && last != b'\\' {
            depth += 1;
        } else if c == b')' && last != b'\\' {
            depth = depth.saturating_sub(1);
        } else if c == b'/' && depth == 0 {
            let start = i + 1;
            let mut end = start;
            while end < content.len() && is_regular(content[end]) {
                end += 1;
            }
            let token = &content[start..end];
            if let Some((_, new)) = renames.iter().find(|(old, _)| old.as_bytes() == token) {
                out.push(b'/');
                out.extend_from_slice(new.as_bytes());
                last = *token.last().unwrap_or(&b'/');
                i = end;
                continue;
            }
        }
        out.push(c);
        last = c;
        i += 1;
    }
    out
}

/// PDF "regular" character: neither whitespace nor a delimiter
fn is_regular(c: u8) -> bool {
    !matches!(
        c,
        b'\0' | b'\t' | b'\n' | b'\x0c' | b'\r' | b' '
            | b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rename(content: &[u8], old: &str, new: &str) -> Vec<u8> {
        rewrite_names(content, &[(old.to_string(), new.to_string())])
    }

    #[test]
    fn test_rewrite_whole_tokens_only() {
        let out = rename(b"/Im0 Do /Im01 Do /Im0 Do", "Im0", "Im0x1");
        assert_eq!(out, b"/Im0x1 Do /Im01 Do /Im0x1 Do".to_vec());
    }

    #[test]
    fn test_rewrite_skips_literal_strings() {
        let out = rename(b"(/Im0 inside) Tj /Im0 Do", "Im0", "Im0x1");
        assert_eq!(out, b"(/Im0 inside) Tj /Im0x1 Do".to_vec());
    }

    #[test]
    fn test_rewrite_handles_escaped_parens() {
        let out = rename(b"(a\\) still string /Im0) /Im0 Do", "Im0", "Q1");
        assert_eq!(out, b"(a\\) still string /Im0) /Q1 Do".to_vec());
    }

    #[test]
    fn test_rewrite_at_end_of_stream() {
        let out = rename(b"q /Im0", "Im0", "Im0x1");
        assert_eq!(out, b"q /Im0x1".to_vec());
    }

    #[test]
    fn test_contents_reference_to_array_is_resolved() {
        let mut graph = SourceGraph::new();
        graph.insert(
            5,
            SourceObject::Stream(SourceStream {
                dict: vec![],
                data: b"q Q".to_vec(),
            }),
        );
        graph.insert(6, SourceObject::Array(vec![SourceObject::Reference(5)]));

        let contents = SourceObject::Reference(6);
        let streams = collect_content_streams(&graph, &contents, 0).unwrap();
        assert_eq!(streams.len(), 1);
        assert_eq!(streams[0].data, b"q Q".to_vec());
    }

    #[test]
    fn test_unresolved_contents_reference_is_fatal() {
        let graph = SourceGraph::new();
        let contents = SourceObject::Reference(9);
        let err = collect_content_streams(&graph, &contents, 2).unwrap_err();
        assert!(matches!(err, ExportError::ContentDecode { page: 2, .. }));
    }

    #[test]
    fn test_free_name_skips_taken_suffixes() {
        let mut dict = Dictionary::new();
        dict.set_reference("Im0", crate::pdf::ObjectId::new(1));
        dict.set_reference("Im0x1", crate::pdf::ObjectId::new(2));
        assert_eq!(free_name(&dict, "Im0"), "Im0x2");
    }

    #[test]
    fn test_build_resources_has_default_procset() {
        let resources = build_resources(Vec::new());
        let mut out = Vec::new();
        resources.write_to(&mut out);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "<<\n/ProcSet [/PDF /Text /ImageB /ImageC /ImageI]\n>>"
        );
    }
}
