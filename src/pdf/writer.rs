//! Indirect object allocation and append-only output writing

use log::{debug, trace};

use crate::error::ExportResult;
use super::{Object, ObjectId, XRefTable};

/// PDF header: version comment plus a high-bit binary marker line so
/// transfer tools treat the file as binary
const HEADER: &[u8] = b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n";

/// Issues strictly increasing object numbers, never reused
#[derive(Debug)]
pub struct Allocator {
    next: u32,
}

impl Allocator {
    /// Create new allocator; object 0 is the free-list head and is never
    /// issued
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Issue the next object number
    pub fn next(&mut self) -> ObjectId {
        let id = ObjectId::new(self.next);
        self.next += 1;
        id
    }

    /// Total object count so far, including object 0
    pub fn count(&self) -> u32 {
        self.next
    }
}

impl Default for Allocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Append-only writer for the output PDF.
///
/// Owns the output buffer, the allocator and the xref table; every object
/// is written exactly once and its start offset recorded.
#[derive(Debug)]
pub struct PdfWriter {
    buf: Vec<u8>,
    alloc: Allocator,
    xref: XRefTable,
}

impl PdfWriter {
    /// Create a writer with the PDF header already emitted
    pub fn new() -> Self {
        let mut writer = Self {
            buf: Vec::with_capacity(16 * 1024),
            alloc: Allocator::new(),
            xref: XRefTable::new(),
        };
        writer.buf.extend_from_slice(HEADER);
        writer
    }

    /// Issue the next object number without writing anything.
    ///
    /// Used when an object's number must be known before its content can
    /// be produced (page tree root, forward page references).
    pub fn alloc(&mut self) -> ObjectId {
        self.alloc.next()
    }

    /// Current output length, which is the offset the next write lands at
    pub fn offset(&self) -> u64 {
        self.buf.len() as u64
    }

    /// Total object count including the free-list head
    pub fn object_count(&self) -> u32 {
        self.alloc.count()
    }

    /// Cross-reference table built so far
    pub fn xref(&self) -> &XRefTable {
        &self.xref
    }

    /// Allocate a number and write the object under it
    pub fn write_new_object(&mut self, obj: &Object) -> ObjectId {
        let id = self.alloc.next();
        self.write_object(id, obj);
        id
    }

    /// Write one indirect object and record its offset.
    ///
    /// Appends `<id> 0 obj\n<body>\nendobj\n`; the returned offset points
    /// at the start of the object header, exactly as the xref table needs.
    pub fn write_object(&mut self, id: ObjectId, obj: &Object) -> u64 {
        let offset = self.offset();
        trace!("writing object {} at offset {}", id, offset);
        self.xref.record(id, offset);

        self.buf
            .extend_from_slice(format!("{} 0 obj\n", id).as_bytes());
        obj.write_to(&mut self.buf);
        self.buf.extend_from_slice(b"\nendobj\n");
        offset
    }

    /// Append the xref table, trailer and end marker, consuming the
    /// writer and returning the complete file image
    pub fn finish(mut self, root: ObjectId, info: ObjectId) -> ExportResult<Vec<u8>> {
        let xref_start = self.offset();
        debug!(
            "finalizing xref: {} objects, table at offset {}",
            self.object_count(),
            xref_start
        );
        let tail = self
            .xref
            .finalize(self.alloc.count(), root, info, xref_start)?;
        self.buf.extend_from_slice(&tail);
        Ok(self.buf)
    }
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_allocator_is_sequential() {
        let mut alloc = Allocator::new();
        assert_eq!(alloc.next().number(), 1);
        assert_eq!(alloc.next().number(), 2);
        assert_eq!(alloc.next().number(), 3);
        assert_eq!(alloc.count(), 4);
    }

    #[test]
    fn test_offsets_match_object_headers() {
        let mut writer = PdfWriter::new();
        let a = writer.write_new_object(&Object::Number(1.0));
        let b = writer.write_new_object(&Object::Name("Second".into()));

        let off_a = writer.xref().offset_of(a).unwrap();
        let off_b = writer.xref().offset_of(b).unwrap();
        assert!(off_a < off_b);

        let buf = writer.finish(b, a).unwrap();
        assert!(buf[off_a as usize..].starts_with(b"1 0 obj\n"));
        assert!(buf[off_b as usize..].starts_with(b"2 0 obj\n"));
    }

    #[test]
    fn test_header_and_eof() {
        let mut writer = PdfWriter::new();
        let id = writer.write_new_object(&Object::Null);
        let buf = writer.finish(id, id).unwrap();

        assert!(buf.starts_with(b"%PDF-1.4\n"));
        assert!(buf.ends_with(b"%%EOF\n"));
    }

    #[test]
    fn test_reserved_id_written_late() {
        let mut writer = PdfWriter::new();
        let reserved = writer.alloc();
        let first = writer.write_new_object(&Object::Boolean(true));
        writer.write_object(reserved, &Object::Name("Late".into()));

        let off_reserved = writer.xref().offset_of(reserved).unwrap();
        let off_first = writer.xref().offset_of(first).unwrap();
        // Written later, so it sits later in the file despite the lower id
        assert!(off_reserved > off_first);

        let buf = writer.finish(first, first).unwrap();
        assert!(buf[off_reserved as usize..].starts_with(b"1 0 obj\n"));
    }
}
