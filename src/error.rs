//! Error types for the PDF export engine

use std::io;
use thiserror::Error;

/// Main error type for PDF export operations
#[derive(Error, Debug)]
pub enum ExportError {
    /// Document has no pages to export
    #[error("No pages to export")]
    NoPages,

    /// Page index outside the document
    #[error("Page {0} does not exist in the document")]
    PageOutOfRange(usize),

    /// Imported page is missing its source PDF backing
    #[error("Page {0} has a PDF background but no source page handle")]
    MissingSourcePage(usize),

    /// Source content stream carries a filter the engine cannot copy
    #[error("Unsupported content stream filter on page {page}: {filter}")]
    UnsupportedFilter {
        page: usize,
        filter: String,
    },

    /// Source content stream could not be decoded (corrupt source PDF)
    #[error("Cannot decode content stream on page {page}: {message}")]
    ContentDecode {
        page: usize,
        message: String,
    },

    /// Reference into the source object graph does not resolve
    #[error("Unresolved source object {object} referenced on page {page}")]
    UnresolvedReference {
        page: usize,
        object: u32,
    },

    /// Source resource dictionary has an unexpected shape
    #[error("Malformed resource dictionary on page {page}: {message}")]
    MalformedResources {
        page: usize,
        message: String,
    },

    /// Render backend failed to produce the annotation stream
    #[error("Rendering annotations for page {page} failed: {message}")]
    Render {
        page: usize,
        message: String,
    },

    /// Object was referenced but never written
    #[error("Dangling reference: object {0} has no cross-reference entry")]
    DanglingReference(u32),

    /// IO error on the output sink
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for PDF export operations
pub type ExportResult<T> = Result<T, ExportError>;

impl ExportError {
    /// Create a content decode error
    pub fn decode(page: usize, msg: impl Into<String>) -> Self {
        Self::ContentDecode {
            page,
            message: msg.into(),
        }
    }

    /// Create a malformed resources error
    pub fn resources(page: usize, msg: impl Into<String>) -> Self {
        Self::MalformedResources {
            page,
            message: msg.into(),
        }
    }

    /// Create a render error
    pub fn render(page: usize, msg: impl Into<String>) -> Self {
        Self::Render {
            page,
            message: msg.into(),
        }
    }

    /// Check if error originates in the imported source PDF
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedFilter { .. }
                | Self::ContentDecode { .. }
                | Self::UnresolvedReference { .. }
                | Self::MalformedResources { .. }
        )
    }

    /// Check if error is an IO failure on the output sink
    pub fn is_io_error(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}
