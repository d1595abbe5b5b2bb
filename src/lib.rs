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

#![cfg_attr(not(feature = "std"), no_std)]
#![cfg_attr(feature = "doc_cfg", feature(doc_cfg))]

pub mod decode;
pub mod encode;
#[cfg(feature = "alloc")]
#[cfg_attr(feature = "doc_cfg", doc(cfg(feature = "alloc")))]
pub mod flat;
mod iter;
pub mod table;

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "alloc")]
use alloc::{string::String, vec::Vec};

const BYTES_PER_CHUNK: usize = 3;
const SYMBOLS_PER_CHUNK: usize = 4;

/// Number of 6-bit values rendered as plain alphabet characters. The three
/// values above this are rendered as tag escapes.
const DIRECT_SYMBOLS: u8 = 61;

#[macro_use]
mod sixbit {
    /// A 6-bit value, as produced by regrouping the input bit stream.
    #[derive(Clone, Copy)]
    pub struct SixBit(u8);

    #[macro_export]
    macro_rules! const_sixbit {
        ($n:expr) => {{
            use crate::sixbit::SixBit;
            const SIX_BIT: SixBit = SixBit::__const($n);
            SIX_BIT
        }};
    }

    impl SixBit {
        pub fn new(x: u8) -> Option<Self> {
            (x < 64).then(|| Self(x))
        }

        /// # Safety
        ///
        /// `x` must be less than 64.
        pub unsafe fn new_unchecked(x: u8) -> Self {
            debug_assert!(x < 64);
            Self(x)
        }

        #[doc(hidden)]
        pub const fn __const(n: u8) -> Self {
            const BOUNDS_CHECK: [u8; 1] = [0];
            Self(n + BOUNDS_CHECK[(n >= 64) as usize])
        }
    }

    impl From<SixBit> for u8 {
        fn from(d: SixBit) -> u8 {
            d.0
        }
    }
}

use sixbit::SixBit;

pub use table::DEFAULT_TAG;
pub use table::InvalidTag;
pub use table::Symbol;
pub use table::SymbolTable;
pub use table::Tag;

pub use encode::encode_to_chars;
#[cfg(feature = "alloc")]
pub use encode::encode_to_string;

pub use decode::decode_chars;
pub use decode::decode_str;
#[cfg(feature = "alloc")]
pub use decode::decode_to_string;
#[cfg(feature = "alloc")]
pub use decode::decode_to_vec;
pub use decode::DecodeError;

#[cfg(feature = "alloc")]
pub use flat::FlatCodec;

/// The operations shared by both transcoding backends.
///
/// [`Codec`] transforms through growable standard containers;
/// [`FlatCodec`] stages everything in one flat, page-granular buffer. Code
/// written against this trait works with either.
///
/// Methods take `&mut self` because [`FlatCodec`] resizes and reuses its
/// buffer across calls; [`Codec`] is stateless and additionally offers the
/// same operations through `&self` inherent methods.
#[cfg(feature = "alloc")]
#[cfg_attr(feature = "doc_cfg", doc(cfg(feature = "alloc")))]
pub trait Transcoder {
    /// Encodes a byte sequence. Never fails; empty input yields an empty
    /// string.
    fn encode_bytes(&mut self, input: &[u8]) -> String;

    /// Decodes encoded text back into the original bytes.
    fn decode_bytes(&mut self, input: &str) -> Result<Vec<u8>, DecodeError>;

    /// Encodes the UTF-8 representation of a string.
    fn encode_str(&mut self, input: &str) -> String {
        self.encode_bytes(input.as_bytes())
    }

    /// Decodes encoded text that is expected to hold UTF-8.
    fn decode_str(
        &mut self,
        input: &str,
    ) -> Result<String, decode::DecodeStringError> {
        use decode::DecodeStringError;
        let bytes =
            self.decode_bytes(input).map_err(DecodeStringError::Decode)?;
        String::from_utf8(bytes).map_err(DecodeStringError::InvalidUtf8)
    }
}

/// A Base62x transcoder backed by the iterator engine.
///
/// Construction builds both symbol tables for the chosen tag; the tables
/// are immutable afterward, so a `Codec` may be shared freely between
/// encode and decode call sites.
#[cfg(feature = "alloc")]
#[cfg_attr(feature = "doc_cfg", doc(cfg(feature = "alloc")))]
pub struct Codec {
    table: SymbolTable,
}

#[cfg(feature = "alloc")]
impl Codec {
    /// Creates a codec for the given tag character.
    pub fn new(tag: char) -> Result<Self, InvalidTag> {
        Tag::new(tag).map(Self::with_tag)
    }

    /// Creates a codec from an already-validated [`Tag`].
    pub fn with_tag(tag: Tag) -> Self {
        Self {
            table: SymbolTable::new(tag),
        }
    }

    /// The tag character this codec escapes with.
    pub fn tag(&self) -> char {
        self.table.tag()
    }

    /// The symbol table, for use with the iterator-level functions.
    pub fn table(&self) -> &SymbolTable {
        &self.table
    }

    pub fn encode_bytes(&self, input: &[u8]) -> String {
        encode_to_string(&self.table, input.iter().copied())
    }

    pub fn encode_str(&self, input: &str) -> String {
        self.encode_bytes(input.as_bytes())
    }

    pub fn decode_bytes(&self, input: &str) -> Result<Vec<u8>, DecodeError> {
        decode_to_vec(decode_str(&self.table, input))
    }

    pub fn decode_str(
        &self,
        input: &str,
    ) -> Result<String, decode::DecodeStringError> {
        decode_to_string(&self.table, input)
    }
}

#[cfg(feature = "alloc")]
impl Default for Codec {
    fn default() -> Self {
        Self::with_tag(Tag::default())
    }
}

#[cfg(feature = "alloc")]
impl Transcoder for Codec {
    fn encode_bytes(&mut self, input: &[u8]) -> String {
        Codec::encode_bytes(self, input)
    }

    fn decode_bytes(&mut self, input: &str) -> Result<Vec<u8>, DecodeError> {
        Codec::decode_bytes(self, input)
    }
}
