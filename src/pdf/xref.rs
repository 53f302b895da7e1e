//! Cross-reference table builder
//!
//! Accumulates `object number -> byte offset` pairs while objects are
//! written and serializes the classical fixed-width xref table plus
//! trailer at the end of the export.

use std::collections::BTreeMap;
use std::fmt::Write;

use log::trace;

use crate::error::{ExportError, ExportResult};
use super::ObjectId;

/// Cross-reference table under construction
#[derive(Debug, Default)]
pub struct XRefTable {
    entries: BTreeMap<u32, u64>,
}

impl XRefTable {
    /// Create new xref table
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Record the byte offset of a written object.
    ///
    /// Recording the same id twice with a different offset indicates a
    /// writer/allocator bug and panics.
    pub fn record(&mut self, id: ObjectId, offset: u64) {
        trace!("xref: object {} at offset {}", id, offset);
        if let Some(&existing) = self.entries.get(&id.number()) {
            assert_eq!(
                existing, offset,
                "object {} recorded twice with different offsets ({} vs {})",
                id, existing, offset
            );
            return;
        }
        self.entries.insert(id.number(), offset);
    }

    /// Number of recorded objects (excluding the free-list head)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Byte offset of a recorded object
    pub fn offset_of(&self, id: ObjectId) -> Option<u64> {
        self.entries.get(&id.number()).copied()
    }

    /// Serialize the xref section, trailer and file end marker.
    ///
    /// `size` is the total object count including object 0; every object
    /// number in `1..size` must have been recorded, otherwise the output
    /// would contain a dangling reference.
    pub fn finalize(
        &self,
        size: u32,
        root: ObjectId,
        info: ObjectId,
        xref_start: u64,
    ) -> ExportResult<Vec<u8>> {
        for num in 1..size {
            if !self.entries.contains_key(&num) {
                return Err(ExportError::DanglingReference(num));
            }
        }

        let mut out = String::new();
        // Writing to a String cannot fail
        writeln!(out, "xref").unwrap();
        writeln!(out, "0 {}", size).unwrap();
        writeln!(out, "0000000000 65535 f ").unwrap();
        for offset in self.entries.values() {
            writeln!(out, "{:010} 00000 n ", offset).unwrap();
        }
        writeln!(out, "trailer").unwrap();
        writeln!(out, "<<").unwrap();
        writeln!(out, "/Size {}", size).unwrap();
        writeln!(out, "/Root {} 0 R", root).unwrap();
        writeln!(out, "/Info {} 0 R", info).unwrap();
        writeln!(out, ">>").unwrap();
        writeln!(out, "startxref").unwrap();
        writeln!(out, "{}", xref_start).unwrap();
        writeln!(out, "%%EOF").unwrap();

        Ok(out.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_finalize_format() {
        let mut xref = XRefTable::new();
        xref.record(ObjectId::new(1), 15);
        xref.record(ObjectId::new(2), 234);
        xref.record(ObjectId::new(3), 1009);

        let out = xref.finalize(4, ObjectId::new(3), ObjectId::new(2), 2000).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "xref\n\
             0 4\n\
             0000000000 65535 f \n\
             0000000015 00000 n \n\
             0000000234 00000 n \n\
             0000001009 00000 n \n\
             trailer\n\
             <<\n\
             /Size 4\n\
             /Root 3 0 R\n\
             /Info 2 0 R\n\
             >>\n\
             startxref\n\
             2000\n\
             %%EOF\n"
        );
    }

    #[test]
    fn test_entries_are_fixed_width() {
        let mut xref = XRefTable::new();
        xref.record(ObjectId::new(1), 7);
        let out = xref.finalize(2, ObjectId::new(1), ObjectId::new(1), 99).unwrap();
        let text = String::from_utf8(out).unwrap();

        for line in text.lines().skip(2).take(2) {
            // 20 bytes including the line terminator
            assert_eq!(line.len(), 19);
        }
    }

    #[test]
    fn test_missing_entry_is_dangling_reference() {
        let mut xref = XRefTable::new();
        xref.record(ObjectId::new(1), 15);
        xref.record(ObjectId::new(3), 300);

        let err = xref
            .finalize(4, ObjectId::new(3), ObjectId::new(1), 500)
            .unwrap_err();
        assert!(matches!(err, ExportError::DanglingReference(2)));
    }

    #[test]
    fn test_duplicate_record_same_offset_is_ok() {
        let mut xref = XRefTable::new();
        xref.record(ObjectId::new(1), 15);
        xref.record(ObjectId::new(1), 15);
        assert_eq!(xref.len(), 1);
    }

    #[test]
    #[should_panic(expected = "recorded twice")]
    fn test_duplicate_record_different_offset_panics() {
        let mut xref = XRefTable::new();
        xref.record(ObjectId::new(1), 15);
        xref.record(ObjectId::new(1), 16);
    }
}
