//! PDF object types and serialization

use std::fmt;

use super::{Dictionary, Stream};

/// Identifier of an indirect object in the output file.
///
/// Issued only by [`Allocator`](super::Allocator); strictly increasing,
/// never reused within one export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(u32);

impl ObjectId {
    pub(crate) fn new(n: u32) -> Self {
        Self(n)
    }

    /// Raw object number
    pub fn number(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// PDF object types
#[derive(Debug, Clone)]
pub enum Object {
    /// Null object
    Null,
    /// Boolean value
    Boolean(bool),
    /// Numeric value
    Number(f64),
    /// String value (written as a literal string, escaped)
    String(Vec<u8>),
    /// Name object
    Name(String),
    /// Array object
    Array(Vec<Object>),
    /// Dictionary object
    Dictionary(Dictionary),
    /// Stream object
    Stream(Stream),
    /// Indirect reference (generation is always 0 in the output)
    Reference(ObjectId),
}

impl Object {
    /// Serialize the object body to bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.write_to(&mut out);
        out
    }

    /// Write the object body to output
    pub fn write_to(&self, output: &mut Vec<u8>) {
        match self {
            Object::Null => output.extend_from_slice(b"null"),
            Object::Boolean(b) => {
                output.extend_from_slice(if *b { b"true" } else { b"false" })
            }
            Object::Number(n) => Self::write_number(*n, output),
            Object::String(s) => Self::write_string(s, output),
            Object::Name(n) => Self::write_name(n, output),
            Object::Array(items) => {
                output.extend_from_slice(b"[");
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        output.extend_from_slice(b" ");
                    }
                    item.write_to(output);
                }
                output.extend_from_slice(b"]");
            }
            Object::Dictionary(d) => d.write_to(output),
            Object::Stream(s) => s.write_to(output),
            Object::Reference(id) => {
                output.extend_from_slice(format!("{} 0 R", id).as_bytes())
            }
        }
    }

    /// Write a number in decimal, without a trailing fraction for
    /// integral values
    fn write_number(n: f64, output: &mut Vec<u8>) {
        if n == n.trunc() && n.abs() < 1e15 {
            output.extend_from_slice(format!("{}", n as i64).as_bytes());
        } else {
            output.extend_from_slice(format!("{}", n).as_bytes());
        }
    }

    /// Write a literal string, escaping parentheses, backslashes and
    /// control characters
    fn write_string(s: &[u8], output: &mut Vec<u8>) {
        output.push(b'(');
        for &c in s {
            match c {
                b'(' | b')' | b'\\' => {
                    output.push(b'\\');
                    output.push(c);
                }
                b'\n' => output.extend_from_slice(b"\\n"),
                b'\r' => output.extend_from_slice(b"\\r"),
                b'\t' => output.extend_from_slice(b"\\t"),
                c if c < 0x20 => {
                    output.extend_from_slice(format!("\\{:03o}", c).as_bytes())
                }
                c => output.push(c),
            }
        }
        output.push(b')');
    }

    /// Write a name, escaping delimiter and non-regular characters with
    /// `#xx` sequences
    pub(crate) fn write_name(name: &str, output: &mut Vec<u8>) {
        output.push(b'/');
        for &c in name.as_bytes() {
            match c {
                b'#' | b'/' | b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}'
                | b'%' => {
                    output.extend_from_slice(format!("#{:02X}", c).as_bytes())
                }
                c if c <= 0x20 || c > 0x7e => {
                    output.extend_from_slice(format!("#{:02X}", c).as_bytes())
                }
                c => output.push(c),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn serialized(obj: Object) -> String {
        String::from_utf8(obj.to_bytes()).unwrap()
    }

    #[test]
    fn test_primitives() {
        assert_eq!(serialized(Object::Null), "null");
        assert_eq!(serialized(Object::Boolean(true)), "true");
        assert_eq!(serialized(Object::Boolean(false)), "false");
        assert_eq!(serialized(Object::Number(42.0)), "42");
        assert_eq!(serialized(Object::Number(-7.0)), "-7");
        assert_eq!(serialized(Object::Number(0.5)), "0.5");
        assert_eq!(serialized(Object::Name("Im0".into())), "/Im0");
        assert_eq!(serialized(Object::Reference(ObjectId::new(12))), "12 0 R");
    }

    #[test]
    fn test_string_escaping() {
        assert_eq!(
            serialized(Object::String(b"a(b)c\\d".to_vec())),
            "(a\\(b\\)c\\\\d)"
        );
        assert_eq!(
            serialized(Object::String(b"line\nbreak".to_vec())),
            "(line\\nbreak)"
        );
        assert_eq!(serialized(Object::String(b"\x01".to_vec())), "(\\001)");
    }

    #[test]
    fn test_name_sanitization() {
        assert_eq!(serialized(Object::Name("A B".into())), "/A#20B");
        assert_eq!(serialized(Object::Name("F#1".into())), "/F#231");
        assert_eq!(serialized(Object::Name("a(b)".into())), "/a#28b#29");
    }

    #[test]
    fn test_array() {
        let arr = Object::Array(vec![
            Object::Number(0.0),
            Object::Number(0.0),
            Object::Number(612.0),
            Object::Number(792.0),
        ]);
        assert_eq!(serialized(arr), "[0 0 612 792]");
    }

    #[test]
    fn test_nested_structures() {
        let mut inner = Dictionary::new();
        inner.set_name("Type", "XObject");
        let arr = Object::Array(vec![
            Object::Dictionary(inner),
            Object::Reference(ObjectId::new(3)),
        ]);
        assert_eq!(serialized(arr), "[<<\n/Type /XObject\n>> 3 0 R]");
    }
}
