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

//! Bootstrap catch-up (§4.6), grounded on
//! `original_source/logos/bootstrap/bootstrap.cpp` and
//! `original_source/logos/bootstrap/puller.cpp`. [`puller`] holds the pure
//! `Epoch → Micro → Batch → Done` state machine; the thread that owns a
//! socket pool and drives it lives in `bin/dbftd`, wired through
//! [`crate::net::traits::Bootstrap`].

pub mod puller;

pub use puller::{BlockCache, PullOutcome, Puller, PullState, PendingPull};
