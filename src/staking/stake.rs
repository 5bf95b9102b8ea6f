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

//! `Stake`/thaw bookkeeping (§4.5.1), grounded on
//! `original_source/logos/staking/staking_manager.cpp`'s `Stake` handler.

use crate::account::{StakedFunds, ThawingFunds};
use crate::crypto::Hash;

/// Epochs a released stake sits in thawing before it rejoins the
/// account's available balance.
pub const THAWING_PERIOD: u32 = 42;

/// Coalesces `amount` into `thawing` under `(target, expiration_epoch)`,
/// summing into an existing entry rather than appending a duplicate.
pub fn merge_thaw(mut thawing: Vec<ThawingFunds>, target: Hash, amount: u128, expiration_epoch: u32) -> Vec<ThawingFunds> {
    if amount == 0 {
        return thawing
    }
    if let Some(existing) =
        thawing.iter_mut().find(|t| t.target_rep == target && t.expiration_epoch == expiration_epoch)
    {
        existing.amount += amount;
    } else {
        thawing.push(ThawingFunds { amount, target_rep: target, expiration_epoch });
    }
    thawing
}

/// Applies a `Stake(new_target, new_amount)` request in epoch `e` (§4.5.1,
/// §8 scenario S4) to an account's current staked funds and thawing list,
/// returning the updated pair.
pub fn apply_stake(
    current: Option<StakedFunds>,
    thawing: Vec<ThawingFunds>,
    new_target: Hash,
    new_amount: u128,
    epoch: u32,
) -> (StakedFunds, Vec<ThawingFunds>) {
    let expiration = epoch + THAWING_PERIOD;
    match current {
        None => (StakedFunds { amount: new_amount, target_rep: new_target, expiration_epoch: None }, thawing),
        Some(cur) if cur.target_rep != new_target => {
            let thawing = merge_thaw(thawing, cur.target_rep, cur.amount, expiration);
            (StakedFunds { amount: new_amount, target_rep: new_target, expiration_epoch: None }, thawing)
        }
        Some(cur) if new_amount > cur.amount => {
            (StakedFunds { amount: new_amount, target_rep: new_target, expiration_epoch: None }, thawing)
        }
        Some(cur) if new_amount < cur.amount => {
            let diff = cur.amount - new_amount;
            let thawing = merge_thaw(thawing, cur.target_rep, diff, expiration);
            (StakedFunds { amount: new_amount, target_rep: new_target, expiration_epoch: None }, thawing)
        }
        Some(cur) => (cur, thawing),
    }
}

/// Drops thawing entries whose `expiration_epoch` has passed, returning
/// the remaining entries and the total amount that matured back to the
/// account's available balance.
pub fn prune_expired_thawing(thawing: Vec<ThawingFunds>, current_epoch: u32) -> (Vec<ThawingFunds>, u128) {
    let mut matured = 0u128;
    let remaining = thawing
        .into_iter()
        .filter(|t| {
            if t.expiration_epoch <= current_epoch {
                matured += t.amount;
                false
            } else {
                true
            }
        })
        .collect();
    (remaining, matured)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(n: u8) -> Hash {
        Hash([n; 32])
    }

    /// §8 scenario S4.
    #[test]
    fn staking_thaw_merge_scenario() {
        let t = target(1);

        let (current, thawing) = apply_stake(None, Vec::new(), t, 50, 100);
        assert_eq!(current, StakedFunds { amount: 50, target_rep: t, expiration_epoch: None });
        assert!(thawing.is_empty());

        let (current, thawing) = apply_stake(Some(current), thawing, t, 150, 100);
        assert_eq!(current.amount, 150);
        assert!(thawing.is_empty());

        let (current, thawing) = apply_stake(Some(current), thawing, t, 100, 100);
        assert_eq!(current.amount, 100);
        assert_eq!(thawing, vec![ThawingFunds { amount: 50, target_rep: t, expiration_epoch: 142 }]);

        let (current, thawing) = apply_stake(Some(current), thawing, t, 75, 100);
        assert_eq!(current.amount, 75);
        assert_eq!(thawing, vec![ThawingFunds { amount: 75, target_rep: t, expiration_epoch: 142 }]);
    }

    #[test]
    fn changing_target_thaws_the_whole_previous_stake() {
        let a = target(1);
        let b = target(2);

        let (current, thawing) = apply_stake(None, Vec::new(), a, 200, 10);
        let (current, thawing) = apply_stake(Some(current), thawing, b, 50, 10);

        assert_eq!(current, StakedFunds { amount: 50, target_rep: b, expiration_epoch: None });
        assert_eq!(thawing, vec![ThawingFunds { amount: 200, target_rep: a, expiration_epoch: 52 }]);
    }

    #[test]
    fn prune_expired_removes_matured_entries_only() {
        let thawing = vec![
            ThawingFunds { amount: 10, target_rep: target(1), expiration_epoch: 100 },
            ThawingFunds { amount: 20, target_rep: target(2), expiration_epoch: 200 },
        ];
        let (remaining, matured) = prune_expired_thawing(thawing, 150);
        assert_eq!(matured, 10);
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].expiration_epoch, 200);
    }
}
