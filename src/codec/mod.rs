/* This file is part of dbft-core
 *
 * Copyright (C) 2024-2026 dbft-core Contributors
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as
 * published by the Free Software Foundation, either version 3 of the
 * License, or (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

//! Wire codec (§2.2, §6): length-prefixed little-endian records.
//!
//! The teacher ships its own `darkfi-serial` derive crate providing
//! `SerialEncodable`/`SerialDecodable`; that crate's source was not part of
//! this retrieval, so the same contract — a pair of traits implemented by
//! hand for each wire struct, LE integers, length-prefixed collections — is
//! reproduced here without a derive macro (see `DESIGN.md`).

use std::io::{self, Read, Write};

use crate::crypto::hash::{Hash, HASH_SIZE};

pub trait Encodable {
    /// Writes `self` to `w`, returning the number of bytes written.
    fn encode<W: Write>(&self, w: &mut W) -> io::Result<usize>;

    fn encode_to_vec(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.encode(&mut buf).expect("writing to a Vec<u8> cannot fail");
        buf
    }
}

pub trait Decodable: Sized {
    /// Reads an instance of `Self` from `r`. Must fail (rather than read
    /// past the logical end of a record) on a truncated buffer — this is
    /// exercised by the round-trip property in §8 item 7.
    fn decode<R: Read>(r: &mut R) -> io::Result<Self>;
}

macro_rules! impl_int {
    ($t:ty, $len:expr) => {
        impl Encodable for $t {
            fn encode<W: Write>(&self, w: &mut W) -> io::Result<usize> {
                w.write_all(&self.to_le_bytes())?;
                Ok($len)
            }
        }

        impl Decodable for $t {
            fn decode<R: Read>(r: &mut R) -> io::Result<Self> {
                let mut buf = [0u8; $len];
                r.read_exact(&mut buf)?;
                Ok(<$t>::from_le_bytes(buf))
            }
        }
    };
}

impl_int!(u8, 1);
impl_int!(u16, 2);
impl_int!(u32, 4);
impl_int!(u64, 8);
impl_int!(i64, 8);

impl Encodable for bool {
    fn encode<W: Write>(&self, w: &mut W) -> io::Result<usize> {
        (*self as u8).encode(w)
    }
}

impl Decodable for bool {
    fn decode<R: Read>(r: &mut R) -> io::Result<Self> {
        Ok(u8::decode(r)? != 0)
    }
}

impl Encodable for Hash {
    fn encode<W: Write>(&self, w: &mut W) -> io::Result<usize> {
        w.write_all(&self.0)?;
        Ok(HASH_SIZE)
    }
}

impl Decodable for Hash {
    fn decode<R: Read>(r: &mut R) -> io::Result<Self> {
        let mut buf = [0u8; HASH_SIZE];
        r.read_exact(&mut buf)?;
        Ok(Hash(buf))
    }
}

impl<const N: usize> Encodable for [u8; N] {
    fn encode<W: Write>(&self, w: &mut W) -> io::Result<usize> {
        w.write_all(self)?;
        Ok(N)
    }
}

impl<const N: usize> Decodable for [u8; N] {
    fn decode<R: Read>(r: &mut R) -> io::Result<Self> {
        let mut buf = [0u8; N];
        r.read_exact(&mut buf)?;
        Ok(buf)
    }
}

/// Length-prefixed (`u32` LE count) vector of encodable elements.
impl<T: Encodable> Encodable for Vec<T> {
    fn encode<W: Write>(&self, w: &mut W) -> io::Result<usize> {
        let mut n = (self.len() as u32).encode(w)?;
        for item in self {
            n += item.encode(w)?;
        }
        Ok(n)
    }
}

impl<T: Decodable> Decodable for Vec<T> {
    fn decode<R: Read>(r: &mut R) -> io::Result<Self> {
        let len = u32::decode(r)? as usize;
        // A generous ceiling well above any legitimate record (§4.3 caps
        // batches at 1500 requests) — guards against a truncated/malicious
        // length prefix driving an unbounded allocation.
        if len > 10_000_000 {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "declared collection length too large"))
        }
        let mut out = Vec::with_capacity(len.min(1024));
        for _ in 0..len {
            out.push(T::decode(r)?);
        }
        Ok(out)
    }
}

impl Encodable for String {
    fn encode<W: Write>(&self, w: &mut W) -> io::Result<usize> {
        self.as_bytes().to_vec().encode(w)
    }
}

impl Decodable for String {
    fn decode<R: Read>(r: &mut R) -> io::Result<Self> {
        let bytes = Vec::<u8>::decode(r)?;
        String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

/// Serializes an [`Encodable`] value, then deserializes a prefix of the
/// resulting bytes with [`Decodable`]. Used by §8 item 7's round-trip
/// property: an exact buffer must decode to an equal value, and any
/// truncation must return an error rather than a wrong answer.
pub fn roundtrip<T: Encodable + Decodable + PartialEq>(value: &T) -> bool {
    let bytes = value.encode_to_vec();
    let mut cursor = io::Cursor::new(&bytes[..]);
    match T::decode(&mut cursor) {
        Ok(decoded) => decoded == *value,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_roundtrip() {
        assert!(roundtrip(&42u32));
        assert!(roundtrip(&0xdead_beef_cafe_u64));
    }

    #[test]
    fn truncated_buffer_errors() {
        let bytes = 12345u64.encode_to_vec();
        let mut cursor = io::Cursor::new(&bytes[..bytes.len() - 1]);
        assert!(u64::decode(&mut cursor).is_err());
    }

    #[test]
    fn vec_roundtrip() {
        let v = vec![1u32, 2, 3, 4, 5];
        assert!(roundtrip(&v));
    }
}
