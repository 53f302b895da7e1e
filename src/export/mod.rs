//! Export orchestrator.
//!
//! Drives the whole pipeline: renders and composes each page in document
//! order, writes the page tree, outline, info and catalog objects,
//! finalizes the cross-reference table, and publishes the finished file
//! atomically. Runs on whatever worker thread the job infrastructure
//! provides; the engine itself has no internal parallelism.

mod compose;
mod outline;
mod remap;

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

use log::{debug, warn};
use tempfile::NamedTempFile;

use crate::doc::{DocumentSource, PageRange, ProgressSink, RenderBackend};
use crate::error::{ExportError, ExportResult};
use crate::pdf::{Dictionary, Object, ObjectId, PdfWriter};
use compose::compose_page;
use outline::{write_outline, OutlineTarget};

/// Orchestrator state; `Done` and `Failed` are terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportState {
    Idle,
    /// Writing page `i` of the export set
    Writing(usize),
    WritingCatalog,
    WritingXRef,
    Done,
    Failed,
}

/// PDF export engine over one document snapshot.
///
/// Holds the document behind a shared borrow for the whole export, so the
/// in-memory document cannot be mutated mid-export and is untouched
/// regardless of the outcome. One instance performs one export.
pub struct PdfExport<'a> {
    doc: &'a dyn DocumentSource,
    renderer: &'a dyn RenderBackend,
    progress: Option<&'a dyn ProgressSink>,
    state: ExportState,
}

impl<'a> PdfExport<'a> {
    /// Create an export over a document snapshot and a render backend
    pub fn new(doc: &'a dyn DocumentSource, renderer: &'a dyn RenderBackend) -> Self {
        Self {
            doc,
            renderer,
            progress: None,
            state: ExportState::Idle,
        }
    }

    /// Attach a progress sink
    pub fn with_progress(mut self, progress: &'a dyn ProgressSink) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Current orchestrator state
    pub fn state(&self) -> ExportState {
        self.state
    }

    /// Export the whole document to `destination`
    pub fn create_pdf(&mut self, destination: &Path) -> ExportResult<()> {
        let count = self.doc.page_count();
        self.create_pdf_range(destination, &[PageRange::new(0, count)])
    }

    /// Export the pages selected by `ranges`, in document order.
    ///
    /// On failure no partial file is left at the destination and the
    /// error is also reported through the progress sink.
    pub fn create_pdf_range(
        &mut self,
        destination: &Path,
        ranges: &[PageRange],
    ) -> ExportResult<()> {
        assert_eq!(
            self.state,
            ExportState::Idle,
            "a PdfExport instance performs exactly one export"
        );

        match self.run(destination, ranges) {
            Ok(()) => {
                self.state = ExportState::Done;
                debug!("export finished: {}", destination.display());
                Ok(())
            }
            Err(err) => {
                self.state = ExportState::Failed;
                warn!("export failed: {}", err);
                if let Some(progress) = self.progress {
                    progress.report_error(&err.to_string());
                }
                Err(err)
            }
        }
    }

    fn run(&mut self, destination: &Path, ranges: &[PageRange]) -> ExportResult<()> {
        let pages = self.collect_pages(ranges)?;
        debug!("exporting {} pages", pages.len());
        if let Some(progress) = self.progress {
            progress.set_total(pages.len());
        }

        let mut writer = PdfWriter::new();
        // Reserved up front so every page can reference its parent;
        // written once all pages exist
        let pages_root = writer.alloc();

        let mut page_ids: Vec<ObjectId> = Vec::with_capacity(pages.len());
        let mut targets: HashMap<usize, OutlineTarget> = HashMap::new();

        for (i, &doc_index) in pages.iter().enumerate() {
            self.state = ExportState::Writing(i);
            debug!("writing page {} of {} (document page {})", i + 1, pages.len(), doc_index);

            let page = self
                .doc
                .page(doc_index)
                .ok_or(ExportError::PageOutOfRange(doc_index))?;
            let annotations = self
                .renderer
                .render_annotations(doc_index)
                .map_err(|msg| ExportError::render(doc_index, msg))?;

            let page_id = compose_page(&mut writer, doc_index, page, annotations, pages_root)?;
            page_ids.push(page_id);
            targets.insert(
                doc_index,
                OutlineTarget {
                    page_id,
                    height: page.size().1,
                },
            );

            if let Some(progress) = self.progress {
                progress.set_current(i + 1);
            }
        }

        self.state = ExportState::WritingCatalog;
        self.write_page_tree(&mut writer, pages_root, &pages, &page_ids)?;
        let outline_root = write_outline(&mut writer, &self.doc.bookmarks(), &targets)?;
        let info_id = self.write_info(&mut writer);
        let catalog_id = self.write_catalog(&mut writer, pages_root, page_ids[0], outline_root);

        self.state = ExportState::WritingXRef;
        let bytes = writer.finish(catalog_id, info_id)?;

        publish(destination, &bytes)
    }

    /// Flatten the ranges into document page indices, validating bounds
    fn collect_pages(&self, ranges: &[PageRange]) -> ExportResult<Vec<usize>> {
        let count = self.doc.page_count();
        let mut pages = Vec::new();
        for range in ranges {
            for index in range.first..range.last {
                if index >= count {
                    return Err(ExportError::PageOutOfRange(index));
                }
                pages.push(index);
            }
        }
        if pages.is_empty() {
            return Err(ExportError::NoPages);
        }
        Ok(pages)
    }

    /// `/Type /Pages` root with the ordered kids array
    fn write_page_tree(
        &self,
        writer: &mut PdfWriter,
        pages_root: ObjectId,
        pages: &[usize],
        page_ids: &[ObjectId],
    ) -> ExportResult<()> {
        let first = self
            .doc
            .page(pages[0])
            .ok_or(ExportError::PageOutOfRange(pages[0]))?;
        let (width, height) = first.size();

        let mut dict = Dictionary::new();
        dict.set_name("Type", "Pages");
        dict.set(
            "Kids",
            Object::Array(page_ids.iter().copied().map(Object::Reference).collect()),
        );
        dict.set("Count", Object::Number(page_ids.len() as f64));
        dict.set("MediaBox", compose::media_box(width, height));
        writer.write_object(pages_root, &Object::Dictionary(dict));
        Ok(())
    }

    /// Document information dictionary
    fn write_info(&self, writer: &mut PdfWriter) -> ObjectId {
        let mut dict = Dictionary::new();
        dict.set(
            "Producer",
            Object::String(
                format!("pdf-export {}", env!("CARGO_PKG_VERSION")).into_bytes(),
            ),
        );
        if let Some(title) = self.doc.title() {
            dict.set("Title", Object::String(title.into_bytes()));
        }
        writer.write_new_object(&Object::Dictionary(dict))
    }

    /// Document catalog with viewer preferences
    fn write_catalog(
        &self,
        writer: &mut PdfWriter,
        pages_root: ObjectId,
        first_page: ObjectId,
        outline_root: Option<ObjectId>,
    ) -> ObjectId {
        let mut dict = Dictionary::new();
        dict.set_name("Type", "Catalog");
        dict.set_reference("Pages", pages_root);
        dict.set(
            "OpenAction",
            Object::Array(vec![
                Object::Reference(first_page),
                Object::Name("FitH".into()),
                Object::Null,
            ]),
        );
        dict.set_name("PageLayout", "OneColumn");
        if let Some(outlines) = outline_root {
            dict.set_reference("Outlines", outlines);
            dict.set_name("PageMode", "UseOutlines");
        }
        writer.write_new_object(&Object::Dictionary(dict))
    }
}

/// Write the finished file next to the destination and move it into
/// place; a failed export never leaves bytes at the destination path
fn publish(destination: &Path, bytes: &[u8]) -> ExportResult<()> {
    let dir = match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.persist(destination).map_err(|e| ExportError::Io(e.error))?;
    Ok(())
}
