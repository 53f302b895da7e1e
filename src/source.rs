//! Read-only view of an imported source PDF's object graph.
//!
//! The external parsing library populates a [`SourceGraph`] and hands out
//! [`SourcePageHandle`]s; the export engine borrows a handle for the
//! duration of one page's composition and never stores it. The source
//! document's object numbers live in their own numbering universe and are
//! remapped before anything is written to the output.

use std::collections::HashMap;

/// One object in the source PDF's graph
#[derive(Debug, Clone)]
pub enum SourceObject {
    /// Null object
    Null,
    /// Boolean value
    Boolean(bool),
    /// Numeric value
    Number(f64),
    /// String value
    String(Vec<u8>),
    /// Name object
    Name(String),
    /// Array object
    Array(Vec<SourceObject>),
    /// Dictionary object (insertion order as parsed)
    Dictionary(Vec<(String, SourceObject)>),
    /// Stream object
    Stream(SourceStream),
    /// Reference into the source numbering universe
    Reference(u32),
}

impl SourceObject {
    /// View as dictionary entries
    pub fn as_dict(&self) -> Option<&[(String, SourceObject)]> {
        match self {
            SourceObject::Dictionary(entries) => Some(entries),
            _ => None,
        }
    }

    /// View as stream
    pub fn as_stream(&self) -> Option<&SourceStream> {
        match self {
            SourceObject::Stream(s) => Some(s),
            _ => None,
        }
    }
}

/// Stream object from the source PDF.
///
/// `data` holds the body exactly as stored in the source file, still
/// encoded; the dictionary keeps the source's `/Filter`/`/DecodeParms`
/// entries so the body can be copied without transcoding.
#[derive(Debug, Clone)]
pub struct SourceStream {
    /// Stream dictionary entries
    pub dict: Vec<(String, SourceObject)>,
    /// Encoded body bytes
    pub data: Vec<u8>,
}

impl SourceStream {
    /// Look up a dictionary entry
    pub fn dict_get(&self, key: &str) -> Option<&SourceObject> {
        self.dict.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Name of the stream's filter, if it has exactly one named filter
    pub fn filter_name(&self) -> Option<&str> {
        match self.dict_get("Filter") {
            Some(SourceObject::Name(n)) => Some(n),
            _ => None,
        }
    }

    /// Check whether the stream is unfiltered
    pub fn is_unfiltered(&self) -> bool {
        self.dict_get("Filter").is_none()
    }
}

/// Object graph of one imported source PDF
#[derive(Debug, Default)]
pub struct SourceGraph {
    objects: HashMap<u32, SourceObject>,
}

impl SourceGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self {
            objects: HashMap::new(),
        }
    }

    /// Insert an object under its source object number
    pub fn insert(&mut self, number: u32, object: SourceObject) {
        self.objects.insert(number, object);
    }

    /// Resolve a source object number
    pub fn resolve(&self, number: u32) -> Option<&SourceObject> {
        self.objects.get(&number)
    }

    /// Follow a reference one level; non-references are returned as-is
    pub fn resolve_direct<'a>(&'a self, obj: &'a SourceObject) -> Option<&'a SourceObject> {
        match obj {
            SourceObject::Reference(n) => self.resolve(*n),
            other => Some(other),
        }
    }
}

/// Borrowed view of one page inside an imported source PDF.
///
/// Valid only for the duration of one page's composition; the composer
/// must not retain it.
#[derive(Clone, Copy)]
pub struct SourcePageHandle<'a> {
    graph: &'a SourceGraph,
    resources: Option<&'a SourceObject>,
    contents: &'a SourceObject,
}

impl<'a> SourcePageHandle<'a> {
    /// Create a handle over a page's resource dictionary and contents
    /// entry, both living in (or referring into) `graph`
    pub fn new(
        graph: &'a SourceGraph,
        resources: Option<&'a SourceObject>,
        contents: &'a SourceObject,
    ) -> Self {
        Self {
            graph,
            resources,
            contents,
        }
    }

    /// The graph the handle's objects refer into
    pub fn graph(&self) -> &'a SourceGraph {
        self.graph
    }

    /// The page's resource dictionary entry, if any
    pub fn resources(&self) -> Option<&'a SourceObject> {
        self.resources
    }

    /// The page's `/Contents` entry: a stream, a reference, or an array
    pub fn contents(&self) -> &'a SourceObject {
        self.contents
    }
}
