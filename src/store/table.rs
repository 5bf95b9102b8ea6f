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

//! A typed view over one `sled::Tree`, grounded on DarkFi's `sled-overlay`
//! usage in `blockchain/`: every persisted table is "keys are raw bytes,
//! values are whatever [`Encodable`]/[`Decodable`] codec record this layer
//! agreed on", so one generic wrapper serves all twenty tables in §6's
//! persisted-tables list instead of twenty bespoke structs.

use std::marker::PhantomData;

use crate::codec::{Decodable, Encodable};
use crate::error::{Error, Result};

/// A table keyed and valued by [`Encodable`]/[`Decodable`] types. Callers
/// build keys themselves (see [`crate::store::keys`]) since several tables
/// use compound keys (e.g. `(epoch, account)` for `rewards`).
pub struct Table<V> {
    tree: sled::Tree,
    _value: PhantomData<V>,
}

impl<V: Encodable + Decodable> Table<V> {
    pub fn new(tree: sled::Tree) -> Self {
        Table { tree, _value: PhantomData }
    }

    pub fn get(&self, key: &[u8]) -> Result<Option<V>> {
        match self.tree.get(key)? {
            Some(bytes) => {
                let mut cursor = std::io::Cursor::new(bytes.as_ref());
                let value = V::decode(&mut cursor).map_err(|e| Error::Codec(e.to_string()))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    pub fn contains(&self, key: &[u8]) -> Result<bool> {
        Ok(self.tree.contains_key(key)?)
    }

    pub fn insert(&self, key: &[u8], value: &V) -> Result<()> {
        self.tree.insert(key, value.encode_to_vec())?;
        Ok(())
    }

    pub fn remove(&self, key: &[u8]) -> Result<()> {
        self.tree.remove(key)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Iterates `(key, value)` pairs in key order, skipping any entry whose
    /// value fails to decode rather than aborting the whole scan — a
    /// corrupt single record should not make the rest of the table
    /// unreadable.
    pub fn iter(&self) -> impl Iterator<Item = (sled::IVec, V)> + '_ {
        self.tree.iter().filter_map(|entry| {
            let (key, bytes) = entry.ok()?;
            let mut cursor = std::io::Cursor::new(bytes.as_ref());
            let value = V::decode(&mut cursor).ok()?;
            Some((key, value))
        })
    }

    /// Iterates keys with the given prefix, e.g. all `rewards` entries for
    /// one epoch.
    pub fn scan_prefix(&self, prefix: &[u8]) -> impl Iterator<Item = (sled::IVec, V)> + '_ {
        self.tree.scan_prefix(prefix).filter_map(|entry| {
            let (key, bytes) = entry.ok()?;
            let mut cursor = std::io::Cursor::new(bytes.as_ref());
            let value = V::decode(&mut cursor).ok()?;
            Some((key, value))
        })
    }
}
