//! Collaborator interfaces consumed by the export engine: the document
//! model, the annotation render backend and the progress sink.
//!
//! The engine holds the document behind a shared borrow for the whole
//! export; the borrow is the read snapshot, so no structural mutation can
//! happen mid-export.

use crate::pdf::Object;
use crate::source::SourcePageHandle;

/// Background classification of one document page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackgroundKind {
    /// No imported backing; the page consists only of annotation content
    Synthetic,
    /// Backed by a page imported from a source PDF
    ImportedPdf,
}

/// One entry of the document's flat bookmark list
#[derive(Debug, Clone)]
pub struct Bookmark {
    /// Bookmark title
    pub title: String,
    /// Document index of the target page
    pub page: usize,
    /// Nesting depth, 0 for top-level entries
    pub depth: usize,
}

/// Half-open range of document page indices to export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    /// First page index, inclusive
    pub first: usize,
    /// End page index, exclusive
    pub last: usize,
}

impl PageRange {
    /// Create a range covering `first..last`
    pub fn new(first: usize, last: usize) -> Self {
        Self { first, last }
    }

    /// Number of pages in the range
    pub fn len(&self) -> usize {
        self.last.saturating_sub(self.first)
    }

    /// Check if the range selects no pages
    pub fn is_empty(&self) -> bool {
        self.last <= self.first
    }
}

/// Read-only access to one document page
pub trait PageSource {
    /// Page size in PDF points (width, height)
    fn size(&self) -> (f64, f64);

    /// Background classification
    fn background(&self) -> BackgroundKind;

    /// Handle into the imported source PDF; present exactly when the
    /// background is [`BackgroundKind::ImportedPdf`]
    fn source_page(&self) -> Option<SourcePageHandle<'_>>;
}

/// Read-only snapshot of the document being exported
pub trait DocumentSource {
    /// Number of pages
    fn page_count(&self) -> usize;

    /// Access one page
    fn page(&self, index: usize) -> Option<&dyn PageSource>;

    /// The document's flat bookmark list, in document order
    fn bookmarks(&self) -> Vec<Bookmark> {
        Vec::new()
    }

    /// Document title for the information dictionary
    fn title(&self) -> Option<String> {
        None
    }
}

/// One resource required by a rendered annotation stream
#[derive(Debug, Clone)]
pub struct AnnotationResource {
    /// Resource category, e.g. `Font`, `XObject`, `ExtGState`
    pub category: String,
    /// Name the content stream uses, e.g. `Im0`
    pub name: String,
    /// The resource object to embed
    pub object: Object,
}

/// Annotation content for one page as produced by the render backend
#[derive(Debug, Clone, Default)]
pub struct RenderedAnnotations {
    /// Content stream operators (unencoded)
    pub content: Vec<u8>,
    /// Resources the operators refer to by name
    pub resources: Vec<AnnotationResource>,
}

/// Vector rendering backend that paints a page's annotations into a PDF
/// content stream
pub trait RenderBackend {
    /// Render one page's annotations; treated as a black-box blocking call
    fn render_annotations(&self, page_index: usize) -> Result<RenderedAnnotations, String>;
}

/// Receives progress and error notifications, marshalled back to the UI
/// by the job infrastructure
pub trait ProgressSink {
    /// Total number of pages about to be written
    fn set_total(&self, total: usize);

    /// Pages written so far
    fn set_current(&self, current: usize);

    /// Single human-readable failure notification
    fn report_error(&self, message: &str);
}
