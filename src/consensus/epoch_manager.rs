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

//! Owns one [`RoundState`] per consensus type for the current epoch
//! (§4.2), grounded on `original_source/logos/consensus/epoch_manager.hpp`'s
//! `EpochManager` — there the class owns a `RequestConsensusManager`,
//! `MicroBlockConsensusManager` and `EpochConsensusManager` plus the
//! network IO manager for one epoch's committee. Here the three
//! consensus-type instances share the same `PrimaryDriver`/`BackupDriver`
//! machinery, parameterised by [`ConsensusType`] rather than subclassed.

use std::collections::HashMap;

use crate::net::{ConsensusType, NUM_DELEGATES};

use super::state::RoundState;
use super::types::Role;

/// Round-robin proposer selection: delegate `sequence mod NUM_DELEGATES`
/// proposes slot `sequence`. A backup whose fallback timer (§4.2.2,
/// §4.2.3) fires steps in as the next delegate in rotation, which is why
/// `MAX_CLOCK_DRIFT_MS` scales with `primary_delegate_id + 1` — later
/// proposers in the rotation are inherently later clock-wise too.
pub fn expected_primary(sequence: u32) -> u8 {
    (sequence % NUM_DELEGATES as u32) as u8
}

pub fn role_for(local_delegate_id: u8, sequence: u32) -> Role {
    if expected_primary(sequence) == local_delegate_id {
        Role::Primary
    } else {
        Role::Backup
    }
}

/// One epoch's three parallel consensus pipelines (§2 "three parallel
/// pipelines": Request, MicroBlock, Epoch).
pub struct EpochManager {
    pub epoch_number: u32,
    pub local_delegate_id: Option<u8>,
    rounds: HashMap<ConsensusType, RoundState>,
}

impl EpochManager {
    pub fn new(epoch_number: u32, local_delegate_id: Option<u8>) -> Self {
        let mut rounds = HashMap::new();
        for consensus_type in ConsensusType::ALL {
            rounds.insert(consensus_type, RoundState::new(epoch_number, 0));
        }
        EpochManager { epoch_number, local_delegate_id, rounds }
    }

    pub fn round(&self, consensus_type: ConsensusType) -> &RoundState {
        self.rounds.get(&consensus_type).expect("every ConsensusType::ALL variant is pre-populated")
    }

    pub fn round_mut(&mut self, consensus_type: ConsensusType) -> &mut RoundState {
        self.rounds.get_mut(&consensus_type).expect("every ConsensusType::ALL variant is pre-populated")
    }

    /// This node's role for `consensus_type`'s current sequence, or `None`
    /// if the node isn't a delegate this epoch (an observer / wallet-only
    /// node that only consumes `PostCommittedBlock`).
    pub fn role(&self, consensus_type: ConsensusType) -> Option<Role> {
        let sequence = self.round(consensus_type).sequence;
        self.local_delegate_id.map(|id| role_for(id, sequence))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_cycles_through_all_delegates() {
        for seq in 0..64u32 {
            let expected = expected_primary(seq);
            assert_eq!(expected, (seq % NUM_DELEGATES as u32) as u8);
        }
    }

    #[test]
    fn role_matches_rotation() {
        assert_eq!(role_for(0, 0), Role::Primary);
        assert_eq!(role_for(1, 0), Role::Backup);
    }

    #[test]
    fn manager_tracks_one_round_per_consensus_type() {
        let manager = EpochManager::new(3, Some(0));
        assert_eq!(manager.round(ConsensusType::Request).epoch_number, 3);
        assert_eq!(manager.round(ConsensusType::MicroBlock).epoch_number, 3);
        assert_eq!(manager.role(ConsensusType::Request), Some(Role::Primary));
    }
}
