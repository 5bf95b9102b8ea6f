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

//! Liability manager (§4.5.2), grounded on
//! `original_source/logos/staking/liability_manager.cpp`. Liabilities are
//! indexed by a content-addressed `H(target, source, expiration_epoch)`
//! key via [`crate::store::keys::source_target`]; this module only holds
//! the pure invariant checks and pruning, leaving the tree I/O to whatever
//! wraps it with a [`crate::store::Table`].

use crate::account::Liability;
use crate::crypto::hash::{Hash, Hasher};

/// Content-addressed key for one liability record, `H(target, source,
/// expiration_epoch)`.
pub fn liability_key(target: &Hash, source: &Hash, expiration_epoch: u32) -> Hash {
    let mut hasher = Hasher::new();
    hasher.update_hash(target);
    hasher.update_hash(source);
    hasher.update_u32(expiration_epoch);
    hasher.finalize()
}

/// Whether a new secondary liability naming `target` may be created given
/// `source`'s existing unexpired secondary liabilities: all active
/// secondary liabilities for one source must share the same target
/// (§4.5.2 invariant).
pub fn can_create_secondary_liability(existing_unexpired: &[Liability], target: Hash) -> bool {
    existing_unexpired.iter().all(|l| l.target_rep == target)
}

/// Drops liabilities whose `expiration_epoch` has passed (lazy pruning on
/// access, §4.5.2).
pub fn prune_expired(liabilities: Vec<Liability>, current_epoch: u32) -> Vec<Liability> {
    liabilities.into_iter().filter(|l| l.expiration_epoch > current_epoch).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(n: u8) -> Hash {
        Hash([n; 32])
    }

    #[test]
    fn same_target_secondary_liabilities_are_allowed() {
        let existing = vec![Liability { amount: 10, target_rep: target(1), expiration_epoch: 50 }];
        assert!(can_create_secondary_liability(&existing, target(1)));
    }

    #[test]
    fn different_target_is_rejected_while_unexpired_liability_exists() {
        let existing = vec![Liability { amount: 10, target_rep: target(1), expiration_epoch: 50 }];
        assert!(!can_create_secondary_liability(&existing, target(2)));
    }

    #[test]
    fn no_existing_liabilities_allows_any_target() {
        assert!(can_create_secondary_liability(&[], target(9)));
    }

    #[test]
    fn pruning_drops_only_expired_entries() {
        let liabilities = vec![
            Liability { amount: 1, target_rep: target(1), expiration_epoch: 10 },
            Liability { amount: 2, target_rep: target(1), expiration_epoch: 30 },
        ];
        let remaining = prune_expired(liabilities, 20);
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].expiration_epoch, 30);
    }

    #[test]
    fn key_is_sensitive_to_every_field() {
        let a = liability_key(&target(1), &target(2), 5);
        let b = liability_key(&target(1), &target(2), 6);
        let c = liability_key(&target(2), &target(1), 5);
        assert_ne!(a, b);
        assert_ne!(a, c);
    }
}
