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

//! `dbft-core`: the consensus and bootstrap core of a delegated-BFT
//! blockchain node with a fixed committee of 32 delegates per epoch (§1).
//!
//! Module map, leaves first (§2 "Dependency order"):
//! - [`crypto`] — hashes, aggregated BLS-style signatures, ECIES, AES-GCM.
//! - [`codec`] — the length-prefixed little-endian wire format.
//! - [`store`] — the embedded transactional block store.
//! - [`validator`] — signs/verifies per-delegate and aggregated messages.
//! - [`net`] — wire message types and the `NetIO`/`TimerHost`/`Bootstrap`/
//!   `Websocket` collaborator traits.
//! - [`account`] — per-account ledger records (§3 Data model).
//! - [`consensus`] — the primary/backup state machine, per consensus type,
//!   and Request-consensus specifics (batching, re-proposal subsets).
//! - [`archival`] — MicroBlock / EpochBlock construction and validation.
//! - [`staking`] — staking, liabilities, voting power and rewards.
//! - [`bootstrap`] — the Puller state machine for catch-up.

pub mod account;
pub mod archival;
pub mod bootstrap;
pub mod codec;
pub mod consensus;
pub mod crypto;
pub mod error;
pub mod net;
pub mod staking;
pub mod store;
pub mod validator;

pub use error::{Error, Result};
