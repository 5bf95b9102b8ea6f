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

//! Delegate committee election, grounded on
//! `original_source/logos/epoch/epoch_voting_manager.cpp`. The
//! distilled spec left this out; it is supplemented here since
//! [`super::voting_power`] and the archival epoch block's delegate set
//! (§4.4.3) are meaningless without a selection rule to feed them.

use crate::crypto::hash::Hash;
use crate::net::NUM_DELEGATES;

/// A delegate hopeful, carrying enough state to decide both eligibility
/// and ranking.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub account: Hash,
    pub stake: u64,
    pub renounced: bool,
}

/// Collects the accounts that sat on any of the last three epochs'
/// committees, most recent first, without duplicates.
fn recent_incumbents(recent_committees: &[Vec<Hash>]) -> Vec<Hash> {
    let mut seen = Vec::new();
    for committee in recent_committees.iter().take(3) {
        for account in committee {
            if !seen.contains(account) {
                seen.push(*account);
            }
        }
    }
    seen
}

/// Selects the committee for the next epoch: the bottom 8 stakers (by
/// current stake) of the current committee are replaced by the
/// highest-stake eligible candidates who are not already incumbents from
/// the last three epochs, then the final 32 are sorted ascending by
/// stake. Returns `current_committee` unchanged when
/// `epoch_transition_enabled` is false.
pub fn select_next_epoch_delegates(
    recent_committees: &[Vec<Hash>],
    candidates: &[Candidate],
    epoch_transition_enabled: bool,
    current_committee: &[Hash],
    stake_of: &dyn Fn(&Hash) -> u64,
) -> Vec<Hash> {
    if !epoch_transition_enabled {
        return current_committee.to_vec()
    }

    let mut ranked: Vec<(Hash, u64)> =
        current_committee.iter().map(|a| (*a, stake_of(a))).collect();
    ranked.sort_by_key(|(_, stake)| *stake);

    let replace_count = ranked.len().min(8);
    let retained: Vec<Hash> = ranked[replace_count..].iter().map(|(a, _)| *a).collect();

    let incumbents = recent_incumbents(recent_committees);
    let mut pool: Vec<Candidate> = candidates
        .iter()
        .filter(|c| !c.renounced && !incumbents.contains(&c.account) && !retained.contains(&c.account))
        .copied()
        .collect();
    pool.sort_by(|a, b| b.stake.cmp(&a.stake));

    let mut next: Vec<Hash> = retained;
    for candidate in pool.into_iter().take(replace_count) {
        next.push(candidate.account);
    }

    next.sort_by_key(|a| stake_of(a));
    next.truncate(NUM_DELEGATES);
    next
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acc(n: u8) -> Hash {
        Hash([n; 32])
    }

    #[test]
    fn unchanged_when_transition_disabled() {
        let committee = vec![acc(1), acc(2)];
        let result =
            select_next_epoch_delegates(&[], &[], false, &committee, &|_| 0);
        assert_eq!(result, committee);
    }

    #[test]
    fn replaces_bottom_stakers_with_higher_stake_outsiders() {
        let committee: Vec<Hash> = (1..=10u8).map(acc).collect();
        let stakes = |h: &Hash| h.0[0] as u64 * 10;

        let candidates = vec![
            Candidate { account: acc(100), stake: 500, renounced: false },
            Candidate { account: acc(101), stake: 400, renounced: false },
        ];

        let next =
            select_next_epoch_delegates(&[], &candidates, true, &committee, &stakes);

        assert!(next.contains(&acc(100)));
        assert!(next.contains(&acc(101)));
        assert!(!next.contains(&acc(1)));
        assert!(!next.contains(&acc(2)));

        for pair in next.windows(2) {
            assert!(stakes(&pair[0]) <= stakes(&pair[1]));
        }
    }

    #[test]
    fn incumbents_from_recent_epochs_are_not_reselected() {
        let committee: Vec<Hash> = (1..=10u8).map(acc).collect();
        let stakes = |h: &Hash| h.0[0] as u64 * 10;

        let recent = vec![vec![acc(200)]];
        let candidates = vec![Candidate { account: acc(200), stake: 999, renounced: false }];

        let next =
            select_next_epoch_delegates(&recent, &candidates, true, &committee, &stakes);
        assert!(!next.contains(&acc(200)));
    }

    #[test]
    fn renounced_candidates_are_ineligible() {
        let committee: Vec<Hash> = (1..=10u8).map(acc).collect();
        let stakes = |h: &Hash| h.0[0] as u64 * 10;

        let candidates = vec![Candidate { account: acc(200), stake: 999, renounced: true }];

        let next =
            select_next_epoch_delegates(&[], &candidates, true, &committee, &stakes);
        assert!(!next.contains(&acc(200)));
    }
}
