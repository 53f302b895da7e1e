//! PDF stream object implementation
//!
//! A `Stream` always holds the *encoded* body; `/Length` is computed from
//! that body at serialization time, never hand-entered. `/Filter
//! /FlateDecode` is present exactly when the body is deflate-encoded.

use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use log::trace;

use super::{Dictionary, Object};

/// Encoding of a stream body as written to the output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEncoding {
    /// Body bytes written verbatim, no filter entry
    Plain,
    /// Body bytes are zlib/deflate data, `/Filter /FlateDecode` emitted
    Deflated,
}

/// PDF stream object
#[derive(Debug, Clone)]
pub struct Stream {
    /// Stream dictionary, without `/Length` (computed) and without
    /// `/Filter` when the encoding supplies it
    dict: Dictionary,
    /// Encoded stream body
    data: Vec<u8>,
    /// Body encoding
    encoding: StreamEncoding,
}

impl Stream {
    /// Create a stream whose body is written verbatim
    pub fn plain(dict: Dictionary, data: Vec<u8>) -> Self {
        Self {
            dict,
            data,
            encoding: StreamEncoding::Plain,
        }
    }

    /// Create a deflate-encoded stream from raw bytes
    pub fn deflate(dict: Dictionary, raw: &[u8]) -> Self {
        trace!("Deflating stream body of {} bytes", raw.len());
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        // Writing to a Vec cannot fail
        encoder.write_all(raw).expect("zlib encode into Vec");
        let data = encoder.finish().expect("zlib finish into Vec");
        Self {
            dict,
            data,
            encoding: StreamEncoding::Deflated,
        }
    }

    /// Create a stream from a body that is already deflate-encoded,
    /// copied verbatim
    pub fn raw_deflated(dict: Dictionary, data: Vec<u8>) -> Self {
        Self {
            dict,
            data,
            encoding: StreamEncoding::Deflated,
        }
    }

    /// Decode a deflate-encoded body
    pub fn inflate(data: &[u8]) -> std::io::Result<Vec<u8>> {
        let mut decoder = ZlibDecoder::new(data);
        let mut out = Vec::new();
        decoder.read_to_end(&mut out)?;
        Ok(out)
    }

    /// Length of the encoded body
    pub fn encoded_len(&self) -> usize {
        self.data.len()
    }

    /// Body encoding
    pub fn encoding(&self) -> StreamEncoding {
        self.encoding
    }

    /// Stream dictionary (without the computed entries)
    pub fn dict(&self) -> &Dictionary {
        &self.dict
    }

    /// Write the stream to output: dictionary with computed `/Length`,
    /// then `stream\n<body>\nendstream`
    pub fn write_to(&self, output: &mut Vec<u8>) {
        let mut dict = self.dict.clone();
        dict.set("Length", Object::Number(self.data.len() as f64));
        if self.encoding == StreamEncoding::Deflated {
            dict.set_name("Filter", "FlateDecode");
        }

        dict.write_to(output);
        output.extend_from_slice(b"\nstream\n");
        output.extend_from_slice(&self.data);
        output.extend_from_slice(b"\nendstream");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_plain_stream_serialization() {
        let stream = Stream::plain(Dictionary::new(), b"BT /F1 12 Tf ET".to_vec());
        let mut out = Vec::new();
        stream.write_to(&mut out);

        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "<<\n/Length 15\n>>\nstream\nBT /F1 12 Tf ET\nendstream"
        );
    }

    #[test]
    fn test_deflate_round_trip() {
        let raw = b"q 1 0 0 1 0 0 cm /Im0 Do Q".repeat(8);
        let stream = Stream::deflate(Dictionary::new(), &raw);
        assert_eq!(stream.encoding(), StreamEncoding::Deflated);

        let decoded = Stream::inflate(&stream.data).unwrap();
        assert_eq!(decoded, raw);
    }

    #[test]
    fn test_length_matches_encoded_body() {
        let raw = b"0 0 100 100 re f";
        let stream = Stream::deflate(Dictionary::new(), raw);
        let encoded_len = stream.encoded_len();

        let mut out = Vec::new();
        stream.write_to(&mut out);
        let text = String::from_utf8_lossy(&out);

        assert!(text.contains(&format!("/Length {}", encoded_len)));
        assert!(text.contains("/Filter /FlateDecode"));

        // /Length bytes after "stream\n" must land exactly on "\nendstream"
        let body_start = out
            .windows(7)
            .position(|w| w == b"stream\n")
            .map(|p| p + 7)
            .unwrap();
        let body_end = body_start + encoded_len;
        assert_eq!(&out[body_end..body_end + 10], b"\nendstream");
    }

    #[test]
    fn test_raw_deflated_copies_verbatim() {
        let raw = b"original content";
        let encoded = {
            let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
            enc.write_all(raw).unwrap();
            enc.finish().unwrap()
        };

        let stream = Stream::raw_deflated(Dictionary::new(), encoded.clone());
        assert_eq!(stream.data, encoded);
        assert_eq!(Stream::inflate(&stream.data).unwrap(), raw);
    }

    #[test]
    fn test_inflate_rejects_garbage() {
        assert!(Stream::inflate(b"not zlib data at all").is_err());
    }
}
