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

//! The tag character and the symbol tables derived from it.

use super::{DIRECT_SYMBOLS, SixBit};
use core::convert::TryFrom;
use core::fmt::{self, Display, Formatter};
use core::str::FromStr;

/// The 62 alphabet characters, in the order values are assigned.
const ALPHABET: &[u8; 62] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Marker for reverse-table entries that map to no 6-bit value.
pub(crate) const INVALID: u8 = 0xff;

/// The tag character used when none is specified.
pub const DEFAULT_TAG: char = 'x';

/// An error encountered while validating a tag character.
#[non_exhaustive]
#[derive(Debug)]
pub enum InvalidTag {
    /// The character is not part of the 62-character alphabet.
    BadChar(char),
    /// The tag was not exactly one character.
    BadLength,
}

impl Display for InvalidTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            Self::BadChar(c) => {
                write!(f, "tag must be an ASCII alphanumeric character: {:?}", c)
            }
            Self::BadLength => write!(f, "tag must be exactly one character"),
        }
    }
}

#[cfg(feature = "std")]
#[cfg_attr(feature = "doc_cfg", doc(cfg(feature = "std")))]
impl std::error::Error for InvalidTag {}

/// A validated tag character: exactly one ASCII alphanumeric.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Tag(u8);

impl Tag {
    pub fn new(c: char) -> Result<Self, InvalidTag> {
        if c.is_ascii_alphanumeric() {
            Ok(Self(c as u8))
        } else {
            Err(InvalidTag::BadChar(c))
        }
    }

    pub fn get(self) -> char {
        char::from(self.0)
    }

    pub(crate) fn byte(self) -> u8 {
        self.0
    }
}

impl Default for Tag {
    fn default() -> Self {
        Self(DEFAULT_TAG as u8)
    }
}

impl Display for Tag {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{}", self.get())
    }
}

impl FromStr for Tag {
    type Err = InvalidTag;

    fn from_str(s: &str) -> Result<Self, InvalidTag> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::new(c),
            _ => Err(InvalidTag::BadLength),
        }
    }
}

/// One unit of encoded output.
///
/// Both fields are ASCII. A `Direct` symbol spans one character; an
/// `Escaped` symbol spans two (the tag, then `'1'`, `'2'`, or `'3'`),
/// which is what keeps the encoded form self-terminating: the decoder
/// counts characters consumed, not symbols.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Symbol {
    Direct(u8),
    Escaped(u8, u8),
}

impl Symbol {
    /// How many characters this symbol spans in encoded text.
    pub fn width(self) -> usize {
        match self {
            Self::Direct(_) => 1,
            Self::Escaped(..) => 2,
        }
    }

    pub(crate) fn chars(
        self,
    ) -> core::iter::Take<core::array::IntoIter<char, 2>> {
        let (chars, len) = match self {
            Self::Direct(c) => ([char::from(c), '\0'], 1),
            Self::Escaped(tag, digit) => {
                ([char::from(tag), char::from(digit)], 2)
            }
        };
        IntoIterator::into_iter(chars).take(len)
    }
}

/// The value↔symbol mappings for one tag character.
///
/// Construction is deterministic: the alphabet is walked in order with
/// the tag skipped, assigning values 0–60 to the 61 remaining
/// characters; values 61–63 become the escapes `tag+'1'` through
/// `tag+'3'`. The same tag always produces identical tables.
pub struct SymbolTable {
    tag: u8,
    forward: [u8; 61],
    reverse: [u8; 128],
}

impl SymbolTable {
    pub fn new(tag: Tag) -> Self {
        let tag = tag.byte();
        let mut forward = [0; 61];
        let mut reverse = [INVALID; 128];
        let mut i = 0;
        for &c in ALPHABET.iter() {
            if c == tag {
                continue;
            }
            forward[i] = c;
            reverse[usize::from(c)] = i as u8;
            i += 1;
        }
        Self {
            tag,
            forward,
            reverse,
        }
    }

    /// The tag character this table escapes with.
    pub fn tag(&self) -> char {
        char::from(self.tag)
    }

    /// Renders a 6-bit value as its symbol.
    pub fn symbol(&self, value: SixBit) -> Symbol {
        let v = u8::from(value);
        if v < DIRECT_SYMBOLS {
            Symbol::Direct(self.forward[usize::from(v)])
        } else {
            Symbol::Escaped(self.tag, b'1' + (v - DIRECT_SYMBOLS))
        }
    }

    /// Looks up a direct (single-character) symbol. The tag character
    /// itself is never a direct symbol and yields `None`.
    pub fn value(&self, c: char) -> Option<SixBit> {
        let i = usize::try_from(u32::from(c)).ok().filter(|&i| i < 128)?;
        // Entries not in the table hold `INVALID`, which is out of
        // `SixBit` range and rejected here.
        SixBit::new(self.reverse[i])
    }

    /// Completes an escape: maps the character following the tag to
    /// one of the values 61–63.
    pub fn escape_value(&self, digit: char) -> Option<SixBit> {
        match digit {
            '1' | '2' | '3' => {
                SixBit::new(DIRECT_SYMBOLS + (digit as u8 - b'1'))
            }
            _ => None,
        }
    }

    pub(crate) fn tag_byte(&self) -> u8 {
        self.tag
    }

    pub(crate) fn forward_bytes(&self) -> &[u8; 61] {
        &self.forward
    }

    pub(crate) fn reverse_bytes(&self) -> &[u8; 128] {
        &self.reverse
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new(Tag::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sixbit(v: u8) -> SixBit {
        SixBit::new(v).unwrap()
    }

    #[test]
    fn accepts_alphanumeric_tags() {
        for c in ['x', 'X', '1', 'a', 'c', 'Z', '9', '0'] {
            assert!(Tag::new(c).is_ok(), "tag {:?} should be valid", c);
        }
    }

    #[test]
    fn rejects_bad_tag_chars() {
        for c in [' ', '~', '!', '_', '\n'] {
            assert!(
                matches!(Tag::new(c), Err(InvalidTag::BadChar(_))),
                "tag {:?} should be invalid",
                c,
            );
        }
    }

    #[test]
    fn rejects_bad_tag_strings() {
        for s in ["", " x", "x ", "xy"] {
            assert!(
                matches!(Tag::from_str(s), Err(InvalidTag::BadLength)),
                "tag {:?} should be invalid",
                s,
            );
        }
        assert!(matches!(Tag::from_str("~"), Err(InvalidTag::BadChar('~'))));
        assert_eq!(Tag::from_str("c").unwrap().get(), 'c');
    }

    #[test]
    fn tables_are_inverse() {
        let table = SymbolTable::new(Tag::new('x').unwrap());
        for v in 0..61 {
            match table.symbol(sixbit(v)) {
                Symbol::Direct(c) => {
                    let back = table.value(char::from(c)).unwrap();
                    assert_eq!(u8::from(back), v);
                }
                s => panic!("value {} should be direct, got {:?}", v, s),
            }
        }
        for v in 61..64 {
            match table.symbol(sixbit(v)) {
                Symbol::Escaped(tag, digit) => {
                    assert_eq!(tag, b'x');
                    let back =
                        table.escape_value(char::from(digit)).unwrap();
                    assert_eq!(u8::from(back), v);
                }
                s => panic!("value {} should be escaped, got {:?}", v, s),
            }
        }
    }

    #[test]
    fn symbols_are_distinct() {
        let table = SymbolTable::default();
        let mut seen = std::collections::BTreeSet::new();
        for v in 0..64 {
            let rendered: String =
                table.symbol(sixbit(v)).chars().collect();
            assert!(seen.insert(rendered));
        }
        assert_eq!(seen.len(), 64);
    }

    #[test]
    fn tag_is_never_direct() {
        for tag in ['x', '0', 'Z'] {
            let table = SymbolTable::new(Tag::new(tag).unwrap());
            assert!(table.value(tag).is_none());
            for v in 0..61 {
                assert_ne!(
                    table.symbol(sixbit(v)),
                    Symbol::Direct(tag as u8),
                );
            }
        }
    }

    #[test]
    fn same_tag_same_tables() {
        let a = SymbolTable::new(Tag::new('Q').unwrap());
        let b = SymbolTable::new(Tag::new('Q').unwrap());
        assert_eq!(a.forward_bytes(), b.forward_bytes());
        assert_eq!(&a.reverse_bytes()[..], &b.reverse_bytes()[..]);
        assert_eq!(a.tag_byte(), b.tag_byte());
    }

    #[test]
    fn escape_digits_are_bounded() {
        let table = SymbolTable::default();
        assert!(table.escape_value('0').is_none());
        assert!(table.escape_value('4').is_none());
        assert!(table.escape_value('x').is_none());
        assert_eq!(u8::from(table.escape_value('1').unwrap()), 61);
        assert_eq!(u8::from(table.escape_value('3').unwrap()), 63);
    }
}
