//! Low-level PDF primitives: object model, streams, allocation, output
//! writing and the cross-reference table

mod dict;
mod object;
mod stream;
mod writer;
mod xref;

pub use dict::Dictionary;
pub use object::{Object, ObjectId};
pub use stream::{Stream, StreamEncoding};
pub use writer::{Allocator, PdfWriter};
pub use xref::XRefTable;
