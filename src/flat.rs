/*
 * Copyright (C) 2025 taylor.fish <contact@taylor.fish>
 *
 * This file is part of Base62x.
 *
 * Base62x is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as published
 * by the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Base62x is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with Base62x. If not, see <https://www.gnu.org/licenses/>.
 */

//! The flat-buffer transcoding engine.
//!
//! [`FlatCodec`] stages everything — the tag, both lookup tables, the
//! raw input, and the generated output — in one contiguous buffer with
//! a fixed-offset reserved header, and grows that buffer in whole
//! pages as inputs get larger. Repeated calls of similar size then run
//! without any allocation at all.

use super::decode::DecodeError;
use super::table::{SymbolTable, Tag, INVALID};
use super::{InvalidTag, Transcoder};
use super::{BYTES_PER_CHUNK, DIRECT_SYMBOLS, SYMBOLS_PER_CHUNK};

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

/// 128-entry character → value table.
const DEC_TABLE: usize = 0x00;
/// 61-entry value → character table.
const ENC_TABLE: usize = 0x80;
/// The tag byte.
const TAG: usize = 0xff;
/// Start of the working area; everything below is the reserved header.
const RESERVED: usize = 0x100;

/// Buffer growth granule.
const PAGE_SIZE: usize = 1 << 16;

/// A Base62x transcoder backed by one flat, page-granular buffer.
///
/// The buffer only ever grows; a codec that has processed its largest
/// input performs no further allocation in the transform itself. Calls
/// reuse the same staging offsets, so each instance supports one
/// in-flight call at a time — which is exactly what `&mut self`
/// enforces. Callers that share an instance across threads need their
/// own instance per thread or external mutual exclusion.
pub struct FlatCodec {
    buf: Vec<u8>,
}

impl FlatCodec {
    /// Creates a flat codec for the given tag character.
    pub fn new(tag: char) -> Result<Self, InvalidTag> {
        Tag::new(tag).map(Self::with_tag)
    }

    /// Creates a flat codec from an already-validated [`Tag`].
    pub fn with_tag(tag: Tag) -> Self {
        let table = SymbolTable::new(tag);
        let mut buf = vec![0; PAGE_SIZE];
        buf[DEC_TABLE..DEC_TABLE + 128]
            .copy_from_slice(table.reverse_bytes());
        buf[ENC_TABLE..ENC_TABLE + 61]
            .copy_from_slice(table.forward_bytes());
        buf[TAG] = table.tag_byte();
        Self {
            buf,
        }
    }

    /// The tag character this codec escapes with.
    pub fn tag(&self) -> char {
        char::from(self.buf[TAG])
    }

    /// Current size of the backing buffer, header included.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Grows the buffer to hold at least `required` bytes, in whole
    /// pages. Capacity never shrinks for the lifetime of the codec.
    fn reserve(&mut self, required: usize) {
        let pages =
            required / PAGE_SIZE + (required % PAGE_SIZE != 0) as usize;
        let len = pages * PAGE_SIZE;
        if len > self.buf.len() {
            self.buf.resize(len, 0);
        }
    }

    pub fn encode_bytes(&mut self, input: &[u8]) -> String {
        // Worst case every symbol is a two-character escape (8/3 of
        // the input length); 4x rounds that up without recomputation
        // edge cases.
        self.reserve(RESERVED + input.len() * 4);
        self.buf[RESERVED..RESERVED + input.len()].copy_from_slice(input);
        let out_len = encode_in(&mut self.buf, input.len());
        let out = &self.buf[RESERVED + input.len()..][..out_len];

        #[cfg(debug_assertions)]
        core::str::from_utf8(out)
            .expect("[debug] encoded data is not valid utf-8 -- this is UB!");

        // SAFETY: the encoder emits only alphabet characters and
        // escape digits, all ASCII.
        unsafe { String::from_utf8_unchecked(out.to_vec()) }
    }

    pub fn decode_bytes(
        &mut self,
        input: &str,
    ) -> Result<Vec<u8>, DecodeError> {
        // Decoded output is at most 3/4 of the input length, so 2x is
        // always sufficient headroom.
        self.reserve(RESERVED + input.len() * 2);
        self.buf[RESERVED..RESERVED + input.len()]
            .copy_from_slice(input.as_bytes());
        match decode_in(&mut self.buf, input.len()) {
            Ok(out_len) => {
                Ok(self.buf[RESERVED + input.len()..][..out_len].to_vec())
            }
            Err(e) => Err(e.locate(input)),
        }
    }

    pub fn encode_str(&mut self, input: &str) -> String {
        self.encode_bytes(input.as_bytes())
    }

    pub fn decode_str(
        &mut self,
        input: &str,
    ) -> Result<String, super::decode::DecodeStringError> {
        use super::decode::DecodeStringError;
        let bytes =
            self.decode_bytes(input).map_err(DecodeStringError::Decode)?;
        String::from_utf8(bytes).map_err(DecodeStringError::InvalidUtf8)
    }
}

impl Default for FlatCodec {
    fn default() -> Self {
        Self::with_tag(Tag::default())
    }
}

impl Transcoder for FlatCodec {
    fn encode_bytes(&mut self, input: &[u8]) -> String {
        FlatCodec::encode_bytes(self, input)
    }

    fn decode_bytes(&mut self, input: &str) -> Result<Vec<u8>, DecodeError> {
        FlatCodec::decode_bytes(self, input)
    }
}

/// A decode failure at a byte offset into the staged input; converted
/// to a [`DecodeError`] once the offending character is recovered from
/// the original `str`.
enum RawError {
    BadChar(usize),
    BadEscape(usize),
    TruncatedEscape,
    BadLength,
}

impl RawError {
    fn locate(self, input: &str) -> DecodeError {
        match self {
            Self::BadChar(pos) => DecodeError::BadChar(char_at(input, pos)),
            Self::BadEscape(pos) => {
                DecodeError::BadEscape(char_at(input, pos))
            }
            Self::TruncatedEscape => DecodeError::TruncatedEscape,
            Self::BadLength => DecodeError::BadLength,
        }
    }
}

fn char_at(input: &str, pos: usize) -> char {
    // Errors are always reported at the first byte of the offending
    // character, which is a char boundary.
    input[pos..].chars().next().unwrap()
}

fn put_symbol(buf: &mut [u8], out: usize, tag: u8, value: u8) -> usize {
    if value < DIRECT_SYMBOLS {
        buf[out] = buf[ENC_TABLE + usize::from(value)];
        out + 1
    } else {
        buf[out] = tag;
        buf[out + 1] = b'1' + (value - DIRECT_SYMBOLS);
        out + 2
    }
}

/// Encodes `len` staged input bytes, writing the symbols right after
/// them; returns the number of characters written. Reads the tag and
/// the forward table out of the header.
fn encode_in(buf: &mut [u8], len: usize) -> usize {
    let tag = buf[TAG];
    let mut out = RESERVED + len;
    let mut i = 0;
    while i < len {
        let a = buf[RESERVED + i];
        match len - i {
            1 => {
                out = put_symbol(buf, out, tag, a >> 2);
                out = put_symbol(buf, out, tag, a & 0x03);
            }
            2 => {
                let b = buf[RESERVED + i + 1];
                out = put_symbol(buf, out, tag, a >> 2);
                out =
                    put_symbol(buf, out, tag, ((a & 0x03) << 4) | (b >> 4));
                out = put_symbol(buf, out, tag, b & 0x0f);
            }
            _ => {
                let b = buf[RESERVED + i + 1];
                let c = buf[RESERVED + i + 2];
                out = put_symbol(buf, out, tag, a >> 2);
                out =
                    put_symbol(buf, out, tag, ((a & 0x03) << 4) | (b >> 4));
                out =
                    put_symbol(buf, out, tag, ((b & 0x0f) << 2) | (c >> 6));
                out = put_symbol(buf, out, tag, c & 0x3f);
            }
        }
        i += BYTES_PER_CHUNK;
    }
    out - RESERVED - len
}

/// Decodes `len` staged input characters, writing the bytes right
/// after them; returns the number of bytes written, or the failure and
/// where it happened.
fn decode_in(buf: &mut [u8], len: usize) -> Result<usize, RawError> {
    let tag = buf[TAG];
    let mut out = RESERVED + len;
    let mut i = 0;
    while i < len {
        let mut group = [0_u8; SYMBOLS_PER_CHUNK];
        let mut n = 0;
        while n < SYMBOLS_PER_CHUNK && i < len {
            let c = buf[RESERVED + i];
            group[n] = if c == tag {
                if i + 1 >= len {
                    return Err(RawError::TruncatedEscape);
                }
                i += 1;
                let d = buf[RESERVED + i];
                if !(b'1'..=b'3').contains(&d) {
                    return Err(RawError::BadEscape(i));
                }
                DIRECT_SYMBOLS + (d - b'1')
            } else {
                let v = if c < 128 {
                    buf[DEC_TABLE + usize::from(c)]
                } else {
                    INVALID
                };
                if v == INVALID {
                    return Err(RawError::BadChar(i));
                }
                v
            };
            n += 1;
            i += 1;
        }
        let [b0, b1, b2, b3] = group;
        match n {
            4 => {
                buf[out] = (b0 << 2) | (b1 >> 4);
                buf[out + 1] = ((b1 & 0x0f) << 4) | (b2 >> 2);
                buf[out + 2] = ((b2 & 0x03) << 6) | b3;
                out += 3;
            }
            3 => {
                buf[out] = (b0 << 2) | (b1 >> 4);
                buf[out + 1] = ((b1 & 0x0f) << 4) | b2;
                out += 2;
            }
            2 => {
                buf[out] = (b0 << 2) | b1;
                out += 1;
            }
            // One leftover symbol holds at most 6 bits; no byte
            // sequence encodes to it.
            _ => return Err(RawError::BadLength),
        }
    }
    Ok(out - RESERVED - len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_known_vectors() {
        let mut codec = FlatCodec::default();
        assert_eq!(codec.encode_bytes(b"A"), "G1");
        assert_eq!(codec.encode_bytes(b"AB"), "GK2");
        assert_eq!(codec.encode_bytes(b"ABCDEFGH"), "GK93H4L6Hq8");
        assert_eq!(codec.decode_bytes("G1").unwrap(), b"A");
        assert_eq!(codec.decode_bytes("GK2").unwrap(), b"AB");
        assert_eq!(codec.decode_bytes("GK93H4L6Hq8").unwrap(), b"ABCDEFGH");
    }

    #[test]
    fn empty_input() {
        let mut codec = FlatCodec::default();
        assert_eq!(codec.encode_bytes(b""), "");
        assert_eq!(codec.decode_bytes("").unwrap(), b"");
    }

    #[test]
    fn reports_malformed_input() {
        let mut codec = FlatCodec::default();
        assert!(matches!(
            codec.decode_bytes("_"),
            Err(DecodeError::BadChar('_')),
        ));
        assert!(matches!(
            codec.decode_bytes("héllo"),
            Err(DecodeError::BadChar('é')),
        ));
        assert!(matches!(
            codec.decode_bytes("x4"),
            Err(DecodeError::BadEscape('4')),
        ));
        assert!(matches!(
            codec.decode_bytes("G1x"),
            Err(DecodeError::TruncatedEscape),
        ));
        assert!(matches!(
            codec.decode_bytes("G"),
            Err(DecodeError::BadLength),
        ));
        assert!(matches!(
            codec.decode_bytes("x1"),
            Err(DecodeError::BadLength),
        ));
    }

    #[test]
    fn survives_errors() {
        let mut codec = FlatCodec::default();
        assert!(codec.decode_bytes("_").is_err());
        assert_eq!(codec.decode_bytes("G1").unwrap(), b"A");
        assert_eq!(codec.encode_bytes(b"A"), "G1");
    }

    #[test]
    fn grows_in_pages_and_never_shrinks() {
        let mut codec = FlatCodec::default();
        assert_eq!(codec.capacity(), PAGE_SIZE);

        let big = vec![0xa5u8; 100_000];
        let encoded = codec.encode_bytes(&big);
        let grown = codec.capacity();
        // RESERVED + 4 * 100_000 rounded up to whole pages.
        assert_eq!(grown, (RESERVED + 400_000 + PAGE_SIZE - 1)
            / PAGE_SIZE
            * PAGE_SIZE);
        assert_eq!(grown % PAGE_SIZE, 0);

        // Smaller follow-up calls keep the grown buffer.
        codec.encode_bytes(b"tiny");
        assert_eq!(codec.capacity(), grown);

        assert_eq!(codec.decode_bytes(&encoded).unwrap(), big);
        assert_eq!(codec.capacity(), grown);
    }

    #[test]
    fn header_layout_is_stable() {
        let codec = FlatCodec::new('c').unwrap();
        assert_eq!(codec.tag(), 'c');
        assert_eq!(codec.buf[TAG], b'c');
        // '0' is value 0 for any tag other than '0' itself.
        assert_eq!(codec.buf[ENC_TABLE], b'0');
        assert_eq!(codec.buf[DEC_TABLE + usize::from(b'0')], 0);
        // The tag never decodes as a direct symbol.
        assert_eq!(codec.buf[DEC_TABLE + usize::from(b'c')], INVALID);
    }
}
