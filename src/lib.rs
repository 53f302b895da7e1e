//! PDF export engine for a page-annotation editor.
//!
//! Serializes an in-memory document into a single PDF file by
//! hand-assembling low-level PDF objects, a cross-reference table and a
//! trailer, splicing freshly rendered annotation content together with
//! pages copied from an imported source PDF.
//!
//! The document model, the vector render backend, the source-PDF parser
//! and the job/progress infrastructure are external collaborators; they
//! plug in through the traits in [`doc`] and the object graph in
//! [`source`].
//!
//! ```no_run
//! use pdf_export::{DocumentSource, PdfExport, RenderBackend};
//! # fn demo(doc: &dyn DocumentSource, renderer: &dyn RenderBackend) -> pdf_export::ExportResult<()> {
//! let mut export = PdfExport::new(doc, renderer);
//! export.create_pdf(std::path::Path::new("notes.pdf"))?;
//! # Ok(())
//! # }
//! ```

mod doc;
mod error;
mod export;
mod pdf;
mod source;

pub use doc::{
    AnnotationResource, BackgroundKind, Bookmark, DocumentSource, PageRange, PageSource,
    ProgressSink, RenderBackend, RenderedAnnotations,
};
pub use error::{ExportError, ExportResult};
pub use export::{ExportState, PdfExport};
pub use pdf::{Dictionary, Object, ObjectId, Stream, StreamEncoding};
pub use source::{SourceGraph, SourceObject, SourcePageHandle, SourceStream};
