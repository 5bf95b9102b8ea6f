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

//! One round's accumulating state (§4.2): the original keeps this as
//! mutable fields scattered across `PrimaryDelegate`; here it is a single
//! owned `RoundState` object a task holds exclusively, matching the "per
//! instance state object owned by a single task" redesign in §9.

use std::collections::HashMap;

use crate::crypto::bls::Signature;
use crate::crypto::Hash;
use crate::error::RejectionReason;

use super::types::ConsensusState;

/// One `(consensus_type, epoch, sequence)` round in progress.
pub struct RoundState {
    pub state: ConsensusState,
    pub epoch_number: u32,
    pub sequence: u32,
    /// Hash of the pre-prepare this round is voting on, once known.
    pub round_hash: Option<Hash>,
    prepares: HashMap<u8, Signature>,
    commits: HashMap<u8, Signature>,
    rejections: HashMap<u8, (RejectionReason, Vec<bool>)>,
    pub reproposal_round: u32,
}

impl RoundState {
    pub fn new(epoch_number: u32, sequence: u32) -> Self {
        RoundState {
            state: ConsensusState::Void,
            epoch_number,
            sequence,
            round_hash: None,
            prepares: HashMap::new(),
            commits: HashMap::new(),
            rejections: HashMap::new(),
            reproposal_round: 0,
        }
    }

    pub fn begin_pre_prepare(&mut self, round_hash: Hash) {
        self.state = ConsensusState::PrePrepare;
        self.round_hash = Some(round_hash);
        self.prepares.clear();
        self.commits.clear();
        self.rejections.clear();
    }

    /// Records a `Prepare`, ignoring a delegate that has already voted
    /// (§4.2.1 step 2: "ignore duplicates").
    pub fn add_prepare(&mut self, delegate_id: u8, sig: Signature) -> bool {
        self.prepares.insert(delegate_id, sig).is_none()
    }

    pub fn add_commit(&mut self, delegate_id: u8, sig: Signature) -> bool {
        self.commits.insert(delegate_id, sig).is_none()
    }

    pub fn add_rejection(&mut self, delegate_id: u8, reason: RejectionReason, rejection_map: Vec<bool>) -> bool {
        self.rejections.insert(delegate_id, (reason, rejection_map)).is_none()
    }

    pub fn prepare_bitmap_and_sigs(&self) -> Vec<(u8, Signature)> {
        self.prepares.iter().map(|(id, sig)| (*id, *sig)).collect()
    }

    pub fn commit_bitmap_and_sigs(&self) -> Vec<(u8, Signature)> {
        self.commits.iter().map(|(id, sig)| (*id, *sig)).collect()
    }

    pub fn accepted_bitmap(&self) -> u64 {
        self.prepares.keys().fold(0u64, |acc, id| acc | (1u64 << id))
    }

    pub fn rejected_bitmap(&self) -> u64 {
        self.rejections.keys().fold(0u64, |acc, id| acc | (1u64 << id))
    }

    pub fn rejections(&self) -> &HashMap<u8, (RejectionReason, Vec<bool>)> {
        &self.rejections
    }

    pub fn enter_post_prepare(&mut self) {
        self.state = ConsensusState::PostPrepare;
    }

    pub fn enter_post_commit(&mut self) {
        self.state = ConsensusState::PostCommit;
    }

    /// Returns to `Void` for the next sequence, carrying the reproposal
    /// round counter forward only if the caller asks for it (a successful
    /// commit resets it; a failed round increments it).
    pub fn reset_for_next_round(&mut self, next_epoch: u32, next_sequence: u32, reset_backoff: bool) {
        self.state = ConsensusState::Void;
        self.epoch_number = next_epoch;
        self.sequence = next_sequence;
        self.round_hash = None;
        self.prepares.clear();
        self.commits.clear();
        self.rejections.clear();
        self.reproposal_round = if reset_backoff { 0 } else { self.reproposal_round + 1 };
    }
}
