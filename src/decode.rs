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

//! Functions and types for decoding Base62x data.

use super::iter::{Flatten, InspectSource, Source};
use super::table::SymbolTable;
use super::{SixBit, SYMBOLS_PER_CHUNK};

use core::array;
use core::fmt::{self, Display, Formatter};
use core::iter::{FusedIterator, Take};
use core::str::Chars;

#[cfg(feature = "alloc")]
use alloc::{string::FromUtf8Error, string::String, vec::Vec};

/// An error encountered while decoding Base62x text.
#[non_exhaustive]
#[derive(Debug)]
pub enum DecodeError {
    /// Encountered a character that is no symbol in this table.
    BadChar(char),
    /// The tag was followed by something other than '1', '2', or '3'.
    BadEscape(char),
    /// The input ended immediately after a tag character.
    TruncatedEscape,
    /// The input ended with a group of exactly one symbol, which no
    /// byte sequence encodes to.
    BadLength,
}

use DecodeError as Error;

/// Alias of <code>[Result]\<T, [DecodeError]></code>.
pub type DecodeResult<T> = Result<T, DecodeError>;

impl Display for DecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            Self::BadChar(c) => write!(f, "bad character: {:?}", c),
            Self::BadEscape(c) => {
                write!(f, "bad character after tag: {:?}", c)
            }
            Self::TruncatedEscape => {
                write!(f, "missing character after tag")
            }
            Self::BadLength => write!(f, "bad input length"),
        }
    }
}

#[cfg(feature = "std")]
#[cfg_attr(feature = "doc_cfg", doc(cfg(feature = "std")))]
impl std::error::Error for DecodeError {}

/// An error encountered while decoding Base62x text into a UTF-8
/// string.
#[cfg(feature = "alloc")]
#[cfg_attr(feature = "doc_cfg", doc(cfg(feature = "alloc")))]
#[derive(Debug)]
pub enum DecodeStringError {
    /// The decoded bytes were not valid UTF-8.
    InvalidUtf8(FromUtf8Error),
    /// A different decoding error occurred.
    Decode(DecodeError),
}

#[cfg(feature = "alloc")]
impl Display for DecodeStringError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            Self::InvalidUtf8(e) => write!(f, "{}", e),
            Self::Decode(e) => write!(f, "{}", e),
        }
    }
}

#[cfg(feature = "std")]
#[cfg_attr(feature = "doc_cfg", doc(cfg(feature = "std")))]
impl std::error::Error for DecodeStringError {}

struct CharsToSixBits<'a, I> {
    table: &'a SymbolTable,
    iter: I,
}

impl<'a, I> CharsToSixBits<'a, I> {
    pub fn new(table: &'a SymbolTable, iter: I) -> Self {
        Self {
            table,
            iter,
        }
    }
}

impl<'a, I: InspectSource> InspectSource for CharsToSixBits<'a, I> {
    type Iter = I::Iter;

    fn source(&self) -> &Self::Iter {
        self.iter.source()
    }
}

impl<'a, I> Iterator for CharsToSixBits<'a, I>
where
    I: Iterator<Item = char>,
{
    type Item = DecodeResult<SixBit>;

    fn next(&mut self) -> Option<Self::Item> {
        let c = self.iter.next()?;
        Some(if c == self.table.tag() {
            // An escape spans two characters; pulling the digit here is
            // what makes a group boundary fall on characters consumed,
            // not on symbols seen.
            match self.iter.next() {
                None => Err(Error::TruncatedEscape),
                Some(d) => {
                    self.table.escape_value(d).ok_or(Error::BadEscape(d))
                }
            }
        } else {
            self.table.value(c).ok_or(Error::BadChar(c))
        })
    }
}

impl<'a, I: Iterator<Item = char>> FusedIterator for CharsToSixBits<'a, I> {}

struct SixBitsToUnflatBytes<I>(I);

impl<I> SixBitsToUnflatBytes<I> {
    pub fn new(iter: I) -> Self {
        Self(iter)
    }
}

impl<I: InspectSource> InspectSource for SixBitsToUnflatBytes<I> {
    type Iter = I::Iter;

    fn source(&self) -> &Self::Iter {
        self.0.source()
    }
}

type SixBitsToUnflatBytesItem = Take<array::IntoIter<DecodeResult<u8>, 3>>;

impl<I> Iterator for SixBitsToUnflatBytes<I>
where
    I: Iterator<Item = DecodeResult<SixBit>>,
{
    type Item = SixBitsToUnflatBytesItem;

    fn next(&mut self) -> Option<Self::Item> {
        let mut values = [const_sixbit!(0); SYMBOLS_PER_CHUNK];
        let mut len = 0;
        self.0
            .by_ref()
            .enumerate()
            .take(SYMBOLS_PER_CHUNK)
            .try_for_each(|(i, d)| {
                d.map(|d| {
                    values[i] = d;
                    len += 1;
                })
            })
            .and(match len {
                0 => Ok(None),
                // A lone symbol holds at most 6 bits; no trailing byte
                // group emits fewer than two symbols.
                1 => Err(Error::BadLength),
                _ => Ok(Some(())),
            })
            .map(|opt| {
                opt.map(|_| {
                    let [b0, b1, b2, b3] = values.map(u8::from);
                    match len {
                        2 => [(b0 << 2) | b1, 0, 0],
                        3 => [
                            (b0 << 2) | (b1 >> 4),
                            ((b1 & 0x0f) << 4) | b2,
                            0,
                        ],
                        _ => [
                            (b0 << 2) | (b1 >> 4),
                            ((b1 & 0x0f) << 4) | (b2 >> 2),
                            ((b2 & 0x03) << 6) | b3,
                        ],
                    }
                })
            })
            .transpose()
            .map(|res| {
                res.map_or_else(
                    |e| {
                        let arr = [Err(e), Ok(0), Ok(0)];
                        IntoIterator::into_iter(arr).take(1)
                    },
                    |arr| {
                        IntoIterator::into_iter(arr.map(Ok)).take(len - 1)
                    },
                )
            })
    }
}

impl<I: Iterator<Item = DecodeResult<SixBit>>> FusedIterator
    for SixBitsToUnflatBytes<I>
{
}

/// Iterator returned by [`decode_chars`].
#[allow(clippy::type_complexity)]
pub struct CharDecoder<'a, I>(
    Flatten<
        SixBitsToUnflatBytes<CharsToSixBits<'a, Source<I>>>,
        SixBitsToUnflatBytesItem,
    >,
);

impl<'a, I> CharDecoder<'a, I> {
    pub(crate) fn new(table: &'a SymbolTable, iter: I) -> Self {
        Self(Flatten::new(SixBitsToUnflatBytes::new(CharsToSixBits::new(
            table,
            Source(iter),
        ))))
    }
}

impl<'a, I> InspectSource for CharDecoder<'a, I> {
    type Iter = I;

    fn source(&self) -> &Self::Iter {
        self.0.source()
    }
}

impl<'a, I> Iterator for CharDecoder<'a, I>
where
    I: Iterator<Item = char>,
{
    type Item = DecodeResult<u8>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next()
    }

    fn fold<B, F>(self, init: B, f: F) -> B
    where
        F: FnMut(B, Self::Item) -> B,
    {
        self.0.fold(init, f)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let (_, upper) = self.source().size_hint();
        // An error cuts its group down to a single item, so no lower
        // bound survives arbitrary input; each char contributes at
        // most one item.
        (0, upper)
    }
}

impl<'a, I: Iterator<Item = char>> FusedIterator for CharDecoder<'a, I> {}

/// Iterator returned by [`decode_str`].
pub struct StrDecoder<'a>(CharDecoder<'a, Chars<'a>>);

impl<'a> StrDecoder<'a> {
    pub(crate) fn new(table: &'a SymbolTable, s: &'a str) -> Self {
        Self(CharDecoder::new(table, s.chars()))
    }
}

impl<'a> Iterator for StrDecoder<'a> {
    type Item = DecodeResult<u8>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next()
    }

    fn fold<B, F>(self, init: B, f: F) -> B
    where
        F: FnMut(B, Self::Item) -> B,
    {
        self.0.fold(init, f)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.0.source().as_str().len();
        (0, Some(len))
    }
}

impl<'a> FusedIterator for StrDecoder<'a> {}

/// Decodes a sequence of Base62x chars.
pub fn decode_chars<'a, I>(
    table: &'a SymbolTable,
    chars: I,
) -> CharDecoder<'a, I::IntoIter>
where
    I: IntoIterator<Item = char>,
{
    CharDecoder::new(table, chars.into_iter())
}

/// Decodes a Base62x `str`.
pub fn decode_str<'a>(table: &'a SymbolTable, s: &'a str) -> StrDecoder<'a> {
    StrDecoder::new(table, s)
}

/// Takes a decoder and stores the contents in a [`Vec`].
///
/// This is equivalent to calling [`decoder.collect()`](Iterator::collect):
/// the first error aborts the collection, so either every byte decodes
/// or none are returned.
#[cfg(feature = "alloc")]
#[cfg_attr(feature = "doc_cfg", doc(cfg(feature = "alloc")))]
pub fn decode_to_vec<D, E>(decoder: D) -> Result<Vec<u8>, E>
where
    D: Iterator<Item = Result<u8, E>>,
{
    decoder.collect()
}

/// Decodes Base62x text whose decoded bytes are expected to be UTF-8.
#[cfg(feature = "alloc")]
#[cfg_attr(feature = "doc_cfg", doc(cfg(feature = "alloc")))]
pub fn decode_to_string(
    table: &SymbolTable,
    s: &str,
) -> Result<String, DecodeStringError> {
    let bytes =
        decode_to_vec(decode_str(table, s)).map_err(DecodeStringError::Decode)?;
    String::from_utf8(bytes).map_err(DecodeStringError::InvalidUtf8)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(s: &str) -> Result<Vec<u8>, DecodeError> {
        decode_to_vec(decode_str(&SymbolTable::default(), s))
    }

    #[test]
    fn empty_input() {
        assert_eq!(decode("").unwrap(), b"");
    }

    #[test]
    fn known_vectors() {
        assert_eq!(decode("G1").unwrap(), b"A");
        assert_eq!(decode("GK2").unwrap(), b"AB");
        assert_eq!(decode("GK93H4L6Hq8").unwrap(), b"ABCDEFGH");
    }

    #[test]
    fn escapes_count_as_one_symbol() {
        // Eight characters, but only four symbols: one full group.
        assert_eq!(decode("x3x3x3x3").unwrap(), [0xff, 0xff, 0xff]);
    }

    #[test]
    fn rejects_unknown_chars() {
        assert!(matches!(decode("_"), Err(DecodeError::BadChar('_'))));
        assert!(matches!(decode("GK_2"), Err(DecodeError::BadChar('_'))));
        assert!(matches!(decode("héllo"), Err(DecodeError::BadChar('é'))));
    }

    #[test]
    fn rejects_bad_escapes() {
        assert!(matches!(decode("x4"), Err(DecodeError::BadEscape('4'))));
        assert!(matches!(decode("xx"), Err(DecodeError::BadEscape('x'))));
        assert!(matches!(decode("G1x"), Err(DecodeError::TruncatedEscape)));
        assert!(matches!(decode("x"), Err(DecodeError::TruncatedEscape)));
    }

    #[test]
    fn rejects_lone_trailing_symbol() {
        assert!(matches!(decode("G"), Err(DecodeError::BadLength)));
        assert!(matches!(decode("GK93H"), Err(DecodeError::BadLength)));
        // A lone escape is still a lone symbol.
        assert!(matches!(decode("x1"), Err(DecodeError::BadLength)));
        // Two symbols are fine.
        assert!(decode("GK").is_ok());
    }

    #[test]
    fn decode_is_all_or_nothing() {
        // The first group is valid; the error must still suppress all
        // output.
        assert!(decode("GK93_").is_err());
    }

    #[test]
    fn decodes_into_utf8_strings() {
        let table = SymbolTable::default();
        assert_eq!(decode_to_string(&table, "GK93H4L6Hq8").unwrap(), "ABCDEFGH");
        assert!(matches!(
            decode_to_string(&table, "x33"),
            Err(DecodeStringError::InvalidUtf8(_)),
        ));
        assert!(matches!(
            decode_to_string(&table, "_"),
            Err(DecodeStringError::Decode(DecodeError::BadChar('_'))),
        ));
    }
}
