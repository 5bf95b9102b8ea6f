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

//! Byte-key builders for [`Table`](crate::store::table::Table)s that use
//! compound keys. Plain single-hash keys just use `Hash::as_bytes`
//! directly; these helpers exist for the handful of tables keyed by more
//! than one field.

use crate::crypto::Hash;

/// `epoch_number || account` — used by `rewards[epoch]`, sorted so a
/// prefix scan over `epoch_prefix` yields one epoch's entries contiguously.
pub fn epoch_account(epoch: u32, account: &Hash) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + 32);
    out.extend_from_slice(&epoch.to_be_bytes());
    out.extend_from_slice(account.as_bytes());
    out
}

/// Prefix matching every key written by [`epoch_account`] for `epoch`.
pub fn epoch_prefix(epoch: u32) -> [u8; 4] {
    epoch.to_be_bytes()
}

/// `source || target` — used by `secondary_liabilities` and
/// `liabilities` to enforce "at most one secondary liability per source
/// account" (`CanCreateSecondaryLiability`): this key format makes a
/// source's existing secondary liabilities a contiguous prefix scan.
pub fn source_target(source: &Hash, target: &Hash) -> Vec<u8> {
    let mut out = Vec::with_capacity(64);
    out.extend_from_slice(source.as_bytes());
    out.extend_from_slice(target.as_bytes());
    out
}

pub fn source_prefix(source: &Hash) -> [u8; 32] {
    *source.as_bytes()
}

/// `epoch_number || delegate_id` — used to key per-epoch, per-delegate
/// request-block tips (`request_block_tips[32]`) in a single tree rather
/// than 32 separate trees.
pub fn epoch_delegate(epoch: u32, delegate_id: u8) -> [u8; 5] {
    let mut out = [0u8; 5];
    out[..4].copy_from_slice(&epoch.to_be_bytes());
    out[4] = delegate_id;
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_account_keys_sort_by_epoch_then_account() {
        let a = epoch_account(1, &Hash([0xff; 32]));
        let b = epoch_account(2, &Hash([0x00; 32]));
        assert!(a < b, "epoch 1 key must sort before epoch 2 regardless of account bytes");
    }

    #[test]
    fn epoch_prefix_matches_epoch_account_prefix() {
        let key = epoch_account(7, &Hash([3u8; 32]));
        assert!(key.starts_with(&epoch_prefix(7)));
    }
}
