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

use super::iter::{Flatten, InspectSource, Source};
use super::table::SymbolTable;
use super::SixBit;
use super::{BYTES_PER_CHUNK, SYMBOLS_PER_CHUNK};

use core::array;
use core::iter::{Fuse, FusedIterator, Take};

#[cfg(feature = "alloc")]
use alloc::string::String;

struct BytesToSixBits<I>(I);

impl<I> BytesToSixBits<I> {
    pub fn new(iter: I) -> Self {
        Self(iter)
    }
}

impl<I: InspectSource> InspectSource for BytesToSixBits<I> {
    type Iter = I::Iter;

    fn source(&self) -> &Self::Iter {
        self.0.source()
    }
}

type BytesToSixBitsItem = Take<array::IntoIter<SixBit, 4>>;

impl<I> Iterator for BytesToSixBits<I>
where
    I: FusedIterator<Item = u8>,
{
    type Item = BytesToSixBitsItem;

    fn next(&mut self) -> Option<Self::Item> {
        let mut bytes = [0_u8; BYTES_PER_CHUNK];
        let mut num_bytes = 0;
        self.0.by_ref().take(BYTES_PER_CHUNK).for_each(|b| {
            bytes[num_bytes] = b;
            num_bytes += 1;
        });

        if num_bytes == 0 {
            return None;
        }

        let [a, b, c] = bytes;
        let raw = match num_bytes {
            1 => [a >> 2, a & 0x03, 0, 0],
            2 => [a >> 2, ((a & 0x03) << 4) | (b >> 4), b & 0x0f, 0],
            _ => [
                a >> 2,
                ((a & 0x03) << 4) | (b >> 4),
                ((b & 0x0f) << 2) | (c >> 6),
                c & 0x3f,
            ],
        };

        let mut values = [const_sixbit!(0); SYMBOLS_PER_CHUNK];
        values.iter_mut().zip(raw.iter()).for_each(|(d, &v)| {
            // SAFETY: every packing expression above masks its result
            // down to 6 bits.
            *d = unsafe { SixBit::new_unchecked(v) };
        });

        // `num_bytes` input bytes always regroup into `num_bytes + 1`
        // six-bit values.
        Some(IntoIterator::into_iter(values).take(num_bytes + 1))
    }
}

impl<I: FusedIterator<Item = u8>> FusedIterator for BytesToSixBits<I> {}

struct SixBitsToUnflatChars<'a, I> {
    table: &'a SymbolTable,
    iter: I,
}

impl<'a, I> SixBitsToUnflatChars<'a, I> {
    pub fn new(table: &'a SymbolTable, iter: I) -> Self {
        Self {
            table,
            iter,
        }
    }
}

impl<'a, I: InspectSource> InspectSource for SixBitsToUnflatChars<'a, I> {
    type Iter = I::Iter;

    fn source(&self) -> &Self::Iter {
        self.iter.source()
    }
}

type SixBitsToUnflatCharsItem = Take<array::IntoIter<char, 2>>;

impl<'a, I> Iterator for SixBitsToUnflatChars<'a, I>
where
    I: FusedIterator<Item = SixBit>,
{
    type Item = SixBitsToUnflatCharsItem;

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next().map(|v| self.table.symbol(v).chars())
    }
}

impl<'a, I: FusedIterator<Item = SixBit>> FusedIterator
    for SixBitsToUnflatChars<'a, I>
{
}

/// Iterator returned by [`encode_to_chars`].
#[allow(clippy::type_complexity)]
pub struct CharEncoder<'a, I>(
    Flatten<
        SixBitsToUnflatChars<
            'a,
            Flatten<BytesToSixBits<Source<Fuse<I>>>, BytesToSixBitsItem>,
        >,
        SixBitsToUnflatCharsItem,
    >,
);

impl<'a, I: Iterator> CharEncoder<'a, I> {
    pub(crate) fn new(table: &'a SymbolTable, iter: I) -> Self {
        Self(Flatten::new(SixBitsToUnflatChars::new(
            table,
            Flatten::new(BytesToSixBits::new(Source(iter.fuse()))),
        )))
    }
}

impl<'a, I> InspectSource for CharEncoder<'a, I> {
    type Iter = Fuse<I>;

    fn source(&self) -> &Self::Iter {
        self.0.source()
    }
}

impl<'a, I> Iterator for CharEncoder<'a, I>
where
    I: Iterator<Item = u8>,
{
    type Item = char;

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
        let (lower, upper) = self.source().size_hint();
        (
            // Every `n` input bytes yield at least ceil(n * 4/3)
            // symbols of one char each.
            lower
                .checked_mul(SYMBOLS_PER_CHUNK)
                .and_then(|n| n.checked_add(BYTES_PER_CHUNK - 1))
                .map_or(lower, |n| n / BYTES_PER_CHUNK),
            upper
                .and_then(|n| n.checked_mul(SYMBOLS_PER_CHUNK))
                .and_then(|n| n.checked_add(BYTES_PER_CHUNK - 1))
                .map(|n| n / BYTES_PER_CHUNK)
                .and_then(|n| {
                    // Every symbol could be a two-char escape.
                    n.checked_mul(2)
                }),
        )
    }
}

impl<'a, I: Iterator<Item = u8>> FusedIterator for CharEncoder<'a, I> {}

/// Encodes a sequence of bytes into Base62x chars.
///
/// Encoding is total: any byte sequence encodes, and empty input
/// produces an empty iterator.
pub fn encode_to_chars<'a, I>(
    table: &'a SymbolTable,
    bytes: I,
) -> CharEncoder<'a, I::IntoIter>
where
    I: IntoIterator<Item = u8>,
{
    CharEncoder::new(table, bytes.into_iter())
}

/// Encodes a sequence of bytes into a Base62x `String`.
#[cfg(feature = "alloc")]
#[cfg_attr(feature = "doc_cfg", doc(cfg(feature = "alloc")))]
pub fn encode_to_string<I>(table: &SymbolTable, bytes: I) -> String
where
    I: IntoIterator<Item = u8>,
{
    encode_to_chars(table, bytes).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(bytes: &[u8]) -> String {
        encode_to_string(&SymbolTable::default(), bytes.iter().copied())
    }

    #[test]
    fn empty_input() {
        assert_eq!(encode(b""), "");
    }

    #[test]
    fn one_byte_tail() {
        assert_eq!(encode(b"A"), "G1");
    }

    #[test]
    fn two_byte_tail() {
        assert_eq!(encode(b"AB"), "GK2");
    }

    #[test]
    fn full_chunks_and_tail() {
        assert_eq!(encode(b"ABCDEFGH"), "GK93H4L6Hq8");
    }

    #[test]
    fn high_values_escape() {
        assert_eq!(encode(&[0xff, 0xff, 0xff]), "x3x3x3x3");
    }

    #[test]
    fn length_stays_in_policy() {
        for len in 0..48 {
            for fill in [0x00u8, 0x41, 0xff] {
                let input = vec![fill; len];
                let out = encode(&input);
                let min = (len * 4 + 2) / 3;
                let max = (len * 8 + 2) / 3;
                assert!(
                    out.len() >= min && out.len() <= max,
                    "len {} fill {:#x}: encoded to {} chars",
                    len,
                    fill,
                    out.len(),
                );
            }
        }
    }

    #[test]
    fn size_hint_brackets_actual() {
        for len in [0, 1, 2, 3, 7, 32] {
            let input = vec![0xffu8; len];
            let encoder = encode_to_chars(
                &SymbolTable::default(),
                input.iter().copied(),
            );
            let (lower, upper) = encoder.size_hint();
            let actual = encoder.count();
            assert!(lower <= actual);
            assert!(upper.unwrap() >= actual);
        }
    }
}
