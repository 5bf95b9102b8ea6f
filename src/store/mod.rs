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

//! The embedded block store (§5, §6), grounded on DarkFi's `sled-overlay`
//! usage for `blockchain/`: one `sled::Db` opened from a data directory,
//! one named tree per logical table in §6's persisted-tables list.
//!
//! `BlockStore` itself only owns tree handles and the global write lock;
//! it does not know the Rust type stored in each tree. Higher modules
//! (`staking`, `archival`, `consensus::request`, `validator`) wrap the tree
//! they need with a [`table::Table`] parameterised by their own domain
//! type. This keeps the store decoupled from every module that persists
//! through it, mirroring the original's `PersistenceManager` without
//! reproducing its "knows every record type" coupling (§9 REDESIGN FLAGS).

pub mod keys;
pub mod table;

pub use table::Table;

use std::path::Path;
use std::sync::Mutex;

use crate::error::Result;

macro_rules! tree_accessors {
    ($($name:ident => $tree_name:literal),* $(,)?) => {
        $(
            pub fn $name(&self) -> sled::Tree {
                self.db.open_tree($tree_name).expect("opening a named tree does not fail once the db is open")
            }
        )*
    };
}

/// Owns the `sled::Db` and serialises write transactions (§5 *Shared
/// resource policy*: "Write transactions are serialised globally; read
/// transactions are concurrent").
pub struct BlockStore {
    db: sled::Db,
    write_lock: Mutex<()>,
}

impl BlockStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = sled::open(path)?;
        Ok(BlockStore { db, write_lock: Mutex::new(()) })
    }

    /// In-memory store for tests — no file handle, discarded on drop.
    pub fn temporary() -> Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(BlockStore { db, write_lock: Mutex::new(()) })
    }

    tree_accessors! {
        accounts => "accounts",
        request_blocks => "request_blocks",
        request_block_tips => "request_block_tips",
        micro_blocks => "micro_blocks",
        micro_block_tip => "micro_block_tip",
        epoch_blocks => "epoch_blocks",
        epoch_tip => "epoch_tip",
        receives => "receives",
        staking => "staking",
        thawing => "thawing",
        liabilities => "liabilities",
        secondary_liabilities => "secondary_liabilities",
        voting_power => "voting_power",
        voting_power_fallback => "voting_power_fallback",
        candidacy => "candidacy",
        representatives => "representatives",
        rewards => "rewards",
        global_rewards => "global_rewards",
        token_accounts => "token_accounts",
        controllers => "controllers",
    }

    /// Acquires the global write lock. Every consensus commit takes exactly
    /// one of these per block (§5): the guard is held only long enough to
    /// apply one block's worth of table updates.
    pub fn begin_write(&self) -> WriteTxn<'_> {
        let guard = self.write_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        WriteTxn { store: self, _guard: guard }
    }

    /// Durably persists everything written so far. sled applies each
    /// `insert` immediately to its in-memory tree; `flush` is what makes a
    /// crash after this point not lose the write.
    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }
}

/// The single in-flight write transaction permitted at a time (§5: "the
/// 2-phase commit round has no queue: at most one in-flight round per
/// consensus instance", and writes across instances share one store-wide
/// lock). Holding a `WriteTxn` borrows the store exclusively for writes;
/// concurrent reads proceed unaffected since sled's reads never block on
/// this lock.
pub struct WriteTxn<'a> {
    store: &'a BlockStore,
    _guard: std::sync::MutexGuard<'a, ()>,
}

impl<'a> WriteTxn<'a> {
    pub fn store(&self) -> &'a BlockStore {
        self.store
    }

    /// Ends the transaction by flushing to disk. Dropping a `WriteTxn`
    /// without calling this still releases the lock — sled's own durability
    /// guarantees on `insert` mean no writes are lost, only their
    /// commit-to-disk point is delayed until the next `flush`.
    pub fn commit(self) -> Result<()> {
        self.store.flush()
    }
}
