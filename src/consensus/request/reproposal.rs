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

//! Re-proposal subset generation (§4.3.2), grounded on
//! `original_source/logos/unit_test/subset_reproposal.cpp`'s
//! `RequestConsensusManager::GenerateSubsets`: after a rejected round, group
//! requests by the exact set of delegates that would have accepted them,
//! collapse nested support sets into their superset, then keep whichever
//! merged groups reach quorum on their own.

use std::collections::BTreeSet;

use crate::consensus::types::{quorum_threshold, QuorumWeights};

/// One candidate re-proposal: the delegates that support it, and the
/// indices (into the original batch) of the requests it covers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReproposalSubset {
    pub support: BTreeSet<u8>,
    pub request_indices: BTreeSet<usize>,
}

fn weight_of(support: &BTreeSet<u8>, weights: &dyn QuorumWeights) -> u64 {
    support.iter().map(|&id| weights.weight_of(id)).sum()
}

/// `supports[i]` is the set of delegates whose rejection response marked
/// request `i` as individually acceptable. `prepare_vote`/`prepare_stake`
/// are the weight already locked in from delegates who accepted the whole
/// batch outright (so a subset only needs to make up the remainder).
///
/// Vote-weight and stake-weight are tracked separately in the original
/// (a delegate's voting weight and staked weight can differ); this crate's
/// [`QuorumWeights`] models a single weight per delegate, so `vote_weights`
/// and `stake_weights` may be the same provider when the two coincide.
pub fn generate_subsets(
    prepare_vote: u64,
    prepare_stake: u64,
    supports: &[BTreeSet<u8>],
    vote_weights: &dyn QuorumWeights,
    stake_weights: &dyn QuorumWeights,
) -> Vec<ReproposalSubset> {
    if supports.is_empty() {
        return Vec::new()
    }

    // Group indices by identical support set.
    let mut groups: Vec<ReproposalSubset> = Vec::new();
    for (index, support) in supports.iter().enumerate() {
        if let Some(group) = groups.iter_mut().find(|g| &g.support == support) {
            group.request_indices.insert(index);
        } else {
            groups.push(ReproposalSubset {
                support: support.clone(),
                request_indices: BTreeSet::from([index]),
            });
        }
    }

    // Merge any group whose support set is a strict subset of another's
    // into that superset, repeating until no more merges apply (support
    // sets only grow, so this always terminates).
    loop {
        let mut merged = false;
        'outer: for i in 0..groups.len() {
            for j in 0..groups.len() {
                if i == j {
                    continue
                }
                if groups[i].support.is_subset(&groups[j].support) && groups[i].support != groups[j].support {
                    let indices = std::mem::take(&mut groups[i].request_indices);
                    groups[j].request_indices.extend(indices);
                    groups.remove(i);
                    merged = true;
                    break 'outer
                }
            }
        }
        if !merged {
            break
        }
    }

    let vote_total = vote_weights.total_weight();
    let stake_total = stake_weights.total_weight();

    let mut subsets: Vec<ReproposalSubset> = groups
        .into_iter()
        .filter(|g| {
            let vote = prepare_vote + weight_of(&g.support, vote_weights);
            let stake = prepare_stake + weight_of(&g.support, stake_weights);
            vote >= quorum_threshold(vote_total) && stake >= quorum_threshold(stake_total)
        })
        .collect();

    // Lexicographic tie-break on the ordered delegate-id sequence.
    subsets.sort_by(|a, b| {
        let a_seq: Vec<u8> = a.support.iter().copied().collect();
        let b_seq: Vec<u8> = b.support.iter().copied().collect();
        a_seq.cmp(&b_seq)
    });

    subsets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::types::UnitWeights;

    fn set(ids: &[u8]) -> BTreeSet<u8> {
        ids.iter().copied().collect()
    }

    /// Mirrors `Subset_Reproposal.Test_1`: two disjoint groups of 8
    /// delegates each, both individually reaching the (trivial, zero)
    /// quorum, ordered by ascending delegate id.
    #[test]
    fn two_disjoint_groups_become_two_subsets() {
        let group3: Vec<u8> = (16..24).collect();
        let group4: Vec<u8> = (24..32).collect();

        let supports: Vec<BTreeSet<u8>> = vec![
            set(&group3), set(&group3), set(&group3),
            set(&group4), set(&group4), set(&group4),
        ];

        let weights = UnitWeights { num_delegates: 0 };
        let subsets = generate_subsets(0, 0, &supports, &weights, &weights);

        assert_eq!(subsets.len(), 2);
        assert_eq!(subsets[0].support, set(&group3));
        assert_eq!(subsets[0].request_indices, BTreeSet::from([0, 1, 2]));
        assert_eq!(subsets[1].support, set(&group4));
        assert_eq!(subsets[1].request_indices, BTreeSet::from([3, 4, 5]));
    }

    /// Mirrors `Subset_Reproposal.Test_2`: overlapping-but-neither-subset
    /// groups stay separate rather than merging.
    #[test]
    fn overlapping_groups_stay_separate_when_neither_is_a_subset() {
        let group_a: Vec<u8> = (0..24).collect();
        let group_b: Vec<u8> = (8..32).collect();

        let mut supports = Vec::new();
        for i in 0..1000usize {
            supports.push(if i < 500 { set(&group_a) } else { set(&group_b) });
        }

        let weights = UnitWeights { num_delegates: 0 };
        let subsets = generate_subsets(0, 0, &supports, &weights, &weights);

        assert_eq!(subsets.len(), 2);
        assert_eq!(subsets[0].support, set(&group_a));
        assert_eq!(subsets[0].request_indices, (0..500).collect());
        assert_eq!(subsets[1].support, set(&group_b));
        assert_eq!(subsets[1].request_indices, (500..1000).collect());
    }

    /// Mirrors `Subset_Reproposal.Test_3`: a chain of strictly nested
    /// support sets collapses into a single group carrying every index.
    #[test]
    fn nested_support_sets_collapse_into_the_superset() {
        let mut group: Vec<u8> = (0..21).collect();
        let mut supports = Vec::new();
        for i in 0..21u8 {
            supports.push(group.iter().copied().collect());
            group.push(21 + i);
        }

        let weights = UnitWeights { num_delegates: 0 };
        let subsets = generate_subsets(0, 0, &supports, &weights, &weights);

        assert_eq!(subsets.len(), 1);
        assert_eq!(subsets[0].request_indices, (0..21).collect());
        // The surviving support set is the final (largest) one in the chain.
        assert_eq!(subsets[0].support.len(), 21 + 20);
    }

    /// Mirrors `Subset_Reproposal.Test_4`: no candidate requests yields no
    /// subsets.
    #[test]
    fn empty_input_yields_no_subsets() {
        let weights = UnitWeights { num_delegates: 0 };
        let subsets = generate_subsets(0, 0, &[], &weights, &weights);
        assert!(subsets.is_empty());
    }

    #[test]
    fn group_below_quorum_is_dropped() {
        let weights = UnitWeights { num_delegates: 32 };
        let small_group: Vec<u8> = (0..5).collect();
        let supports = vec![set(&small_group)];
        let subsets = generate_subsets(0, 0, &supports, &weights, &weights);
        assert!(subsets.is_empty());
    }
}
