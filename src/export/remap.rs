//! Renumbering of objects copied from a source PDF.
//!
//! The source document's object numbers are never trusted to be free of
//! collisions with newly synthesized objects, so every copied object gets
//! a fresh number from the output allocator. The remapping table lives for
//! exactly one page's composition.

use std::collections::{HashMap, VecDeque};

use log::trace;

use crate::error::{ExportError, ExportResult};
use crate::pdf::{Dictionary, Object, ObjectId, PdfWriter, Stream};
use crate::source::{SourceGraph, SourceObject, SourceStream};

/// Per-page `source object number -> output object id` table plus the
/// queue of copied objects still to be written
pub(crate) struct RemapContext<'a> {
    graph: &'a SourceGraph,
    page: usize,
    map: HashMap<u32, ObjectId>,
    pending: VecDeque<(ObjectId, u32)>,
}

impl<'a> RemapContext<'a> {
    /// Create a context for one page's composition
    pub fn new(graph: &'a SourceGraph, page: usize) -> Self {
        Self {
            graph,
            page,
            map: HashMap::new(),
            pending: VecDeque::new(),
        }
    }

    /// Output id for a source object number, allocating and queueing the
    /// copy on first sight
    pub fn remap(&mut self, writer: &mut PdfWriter, source_num: u32) -> ObjectId {
        if let Some(&id) = self.map.get(&source_num) {
            return id;
        }
        let id = writer.alloc();
        trace!(
            "page {}: source object {} renumbered to {}",
            self.page,
            source_num,
            id
        );
        self.map.insert(source_num, id);
        self.pending.push_back((id, source_num));
        id
    }

    /// Deep-convert a source object into the output object model,
    /// renumbering every reference it contains
    pub fn convert(
        &mut self,
        writer: &mut PdfWriter,
        obj: &SourceObject,
    ) -> ExportResult<Object> {
        Ok(match obj {
            SourceObject::Null => Object::Null,
            SourceObject::Boolean(b) => Object::Boolean(*b),
            SourceObject::Number(n) => Object::Number(*n),
            SourceObject::String(s) => Object::String(s.clone()),
            SourceObject::Name(n) => Object::Name(n.clone()),
            SourceObject::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(self.convert(writer, item)?);
                }
                Object::Array(out)
            }
            SourceObject::Dictionary(entries) => {
                Object::Dictionary(self.convert_dict(writer, entries)?)
            }
            SourceObject::Stream(stream) => Object::Stream(self.convert_stream(writer, stream)?),
            SourceObject::Reference(num) => {
                if self.graph.resolve(*num).is_none() {
                    return Err(ExportError::UnresolvedReference {
                        page: self.page,
                        object: *num,
                    });
                }
                Object::Reference(self.remap(writer, *num))
            }
        })
    }

    /// Convert dictionary entries, dropping the source's `/Length` (it is
    /// recomputed for streams and meaningless elsewhere)
    fn convert_dict(
        &mut self,
        writer: &mut PdfWriter,
        entries: &[(String, SourceObject)],
    ) -> ExportResult<Dictionary> {
        let mut dict = Dictionary::new();
        for (key, value) in entries {
            if key == "Length" {
                continue;
            }
            dict.set(key.clone(), self.convert(writer, value)?);
        }
        Ok(dict)
    }

    /// Copy a source stream byte-for-byte.
    ///
    /// The body is never transcoded here: the source's `/Filter` and
    /// `/DecodeParms` entries travel with it and `/Length` is recomputed
    /// from the copied body. Page content streams go through the stricter
    /// policy in the composer instead.
    fn convert_stream(
        &mut self,
        writer: &mut PdfWriter,
        stream: &SourceStream,
    ) -> ExportResult<Stream> {
        let dict = self.convert_dict(writer, &stream.dict)?;
        Ok(Stream::plain(dict, stream.data.clone()))
    }

    /// Write every queued copied object.
    ///
    /// Copied objects can reference further source objects, which enqueue
    /// themselves during conversion, so this loops until the queue drains.
    pub fn flush(&mut self, writer: &mut PdfWriter) -> ExportResult<usize> {
        let mut written = 0;
        while let Some((id, source_num)) = self.pending.pop_front() {
            let source = self
                .graph
                .resolve(source_num)
                .ok_or(ExportError::UnresolvedReference {
                    page: self.page,
                    object: source_num,
                })?;
            let converted = self.convert(writer, source)?;
            writer.write_object(id, &converted);
            written += 1;
        }
        trace!("page {}: copied {} source objects", self.page, written);
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn graph_with_chain() -> SourceGraph {
        // 10 -> dict referencing 11 -> number
        let mut graph = SourceGraph::new();
        graph.insert(
            10,
            SourceObject::Dictionary(vec![(
                "Next".into(),
                SourceObject::Reference(11),
            )]),
        );
        graph.insert(11, SourceObject::Number(7.0));
        graph
    }

    #[test]
    fn test_remap_is_stable_within_page() {
        let graph = graph_with_chain();
        let mut writer = PdfWriter::new();
        let mut ctx = RemapContext::new(&graph, 0);

        let a = ctx.remap(&mut writer, 10);
        let b = ctx.remap(&mut writer, 10);
        assert_eq!(a, b);

        let c = ctx.remap(&mut writer, 11);
        assert_ne!(a, c);
    }

    #[test]
    fn test_flush_follows_reference_chains() {
        let graph = graph_with_chain();
        let mut writer = PdfWriter::new();
        let mut ctx = RemapContext::new(&graph, 0);

        ctx.remap(&mut writer, 10);
        let written = ctx.flush(&mut writer).unwrap();
        // 10 itself plus 11, discovered while converting 10
        assert_eq!(written, 2);
        assert_eq!(ctx.pending.len(), 0);
    }

    #[test]
    fn test_unresolved_reference_is_fatal() {
        let graph = SourceGraph::new();
        let mut writer = PdfWriter::new();
        let mut ctx = RemapContext::new(&graph, 4);

        let err = ctx
            .convert(&mut writer, &SourceObject::Reference(77))
            .unwrap_err();
        assert!(matches!(
            err,
            ExportError::UnresolvedReference { page: 4, object: 77 }
        ));
    }

    #[test]
    fn test_stream_copy_preserves_filter_and_recomputes_length() {
        let graph = SourceGraph::new();
        let mut writer = PdfWriter::new();
        let mut ctx = RemapContext::new(&graph, 0);

        let stream = SourceStream {
            dict: vec![
                ("Length".into(), SourceObject::Number(999.0)),
                ("Filter".into(), SourceObject::Name("DCTDecode".into())),
            ],
            data: vec![1, 2, 3, 4],
        };
        let converted = ctx
            .convert(&mut writer, &SourceObject::Stream(stream))
            .unwrap();

        let mut out = Vec::new();
        converted.write_to(&mut out);
        let text = String::from_utf8_lossy(&out);
        assert!(text.contains("/Filter /DCTDecode"));
        // wrong source Length dropped, real body length computed
        assert!(text.contains("/Length 4"));
        assert!(!text.contains("/Length 999"));
    }
}
