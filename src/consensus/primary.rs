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

//! The primary delegate's side of a round (§4.2.1), grounded on
//! `original_source/logos/consensus/primary_delegate.hpp` and on the
//! `proposal_task` shape of `bin/darkfid2/src/consensus.rs` (propose,
//! broadcast, wait for votes, apply). Transport and timers are injected
//! (`NetIO`, `Timer`) rather than owned, per §9 REDESIGN FLAGS.

use crate::codec::Encodable;
use crate::crypto::bls::Signature;
use crate::crypto::Hash;
use crate::error::{ConsensusError, Error, ProtocolError, RejectionReason, Result};
use crate::net::{AggregatedSignature, ConsensusType, MessageHeader, MessageType, NetIO};
use crate::validator::MessageValidator;

use super::state::RoundState;
use super::types::{bitmap_reaches_quorum, quorum_still_reachable, QuorumWeights};

/// Drives one primary-side round. Stateless beyond its injected
/// collaborators — all round-local mutable state lives in the
/// [`RoundState`] the caller passes to each method.
pub struct PrimaryDriver<'a> {
    pub validator: &'a MessageValidator,
    pub netio: &'a dyn NetIO,
    pub weights: &'a dyn QuorumWeights,
}

impl<'a> PrimaryDriver<'a> {
    /// Broadcasts a freshly built pre-prepare and enters `PrePrepare`
    /// (§4.2.1 step 1).
    pub async fn propose(
        &self,
        round: &mut RoundState,
        consensus_type: ConsensusType,
        primary_delegate_id: u8,
        round_hash: Hash,
        payload: Vec<u8>,
    ) -> Result<()> {
        round.begin_pre_prepare(round_hash);
        let header = MessageHeader::new(MessageType::PrePrepare, consensus_type, primary_delegate_id, payload.len() as u32);
        self.netio.broadcast(consensus_type, header, payload).await
    }

    /// Records an inbound `Prepare` (§4.2.1 step 2). Returns `true` once
    /// this vote brings the round to quorum.
    pub fn receive_prepare(&self, round: &mut RoundState, delegate_id: u8, hash: Hash, sig: Signature) -> Result<bool> {
        let expected = round.round_hash.ok_or(Error::Protocol(ProtocolError::UnexpectedMessage))?;
        if hash != expected {
            return Err(Error::Protocol(ProtocolError::UnexpectedMessage))
        }
        if !self.validator.verify(&hash, &sig, delegate_id)? {
            return Err(Error::Protocol(ProtocolError::BadSignature))
        }
        round.add_prepare(delegate_id, sig);
        Ok(bitmap_reaches_quorum(round.accepted_bitmap(), self.weights))
    }

    /// Records an inbound `Rejection` (§4.2.1 step 5).
    pub fn receive_rejection(
        &self,
        round: &mut RoundState,
        delegate_id: u8,
        reason: RejectionReason,
        rejection_map: Vec<bool>,
    ) {
        round.add_rejection(delegate_id, reason, rejection_map);
    }

    /// Whether enough delegates have rejected (or gone silent, once their
    /// individual timers are accounted for by the caller) that quorum can
    /// no longer be reached this round — the primary should call
    /// `OnPrePrepareRejected` equivalent behaviour instead of waiting out
    /// `PRIMARY_TIMEOUT`.
    pub fn is_rejected(&self, round: &RoundState) -> bool {
        !quorum_still_reachable(round.accepted_bitmap(), round.rejected_bitmap(), self.weights)
    }

    /// Aggregates collected prepares into `PostPrepare`, broadcasts it, and
    /// advances the round state (§4.2.1 step 3).
    pub async fn finalize_post_prepare(
        &self,
        round: &mut RoundState,
        consensus_type: ConsensusType,
        primary_delegate_id: u8,
    ) -> Result<AggregatedSignature> {
        let sigs = round.prepare_bitmap_and_sigs();
        let (bitmap, agg_sig) = self.validator.aggregate_sign(&sigs)?;
        let agg = AggregatedSignature { participation_map: bitmap, agg_sig };
        round.enter_post_prepare();

        let payload = agg.encode_to_vec();
        let header =
            MessageHeader::new(MessageType::PostPrepare, consensus_type, primary_delegate_id, payload.len() as u32);
        self.netio.broadcast(consensus_type, header, payload).await?;
        Ok(agg)
    }

    pub fn receive_commit(&self, round: &mut RoundState, delegate_id: u8, hash: Hash, sig: Signature) -> Result<bool> {
        let expected = round.round_hash.ok_or(Error::Protocol(ProtocolError::UnexpectedMessage))?;
        if hash != expected {
            return Err(Error::Protocol(ProtocolError::UnexpectedMessage))
        }
        if !self.validator.verify(&hash, &sig, delegate_id)? {
            return Err(Error::Protocol(ProtocolError::BadSignature))
        }
        round.add_commit(delegate_id, sig);
        Ok(bitmap_reaches_quorum(round.accepted_bitmap_for_commits(), self.weights))
    }

    /// Aggregates collected commits into `PostCommit` and broadcasts it
    /// (§4.2.1 step 4). The caller is responsible for applying the block
    /// and resetting `round` for the next sequence afterwards.
    pub async fn finalize_post_commit(
        &self,
        round: &mut RoundState,
        consensus_type: ConsensusType,
        primary_delegate_id: u8,
    ) -> Result<AggregatedSignature> {
        let sigs = round.commit_bitmap_and_sigs();
        let (bitmap, agg_sig) = self.validator.aggregate_sign(&sigs)?;
        let agg = AggregatedSignature { participation_map: bitmap, agg_sig };
        round.enter_post_commit();

        let payload = agg.encode_to_vec();
        let header =
            MessageHeader::new(MessageType::PostCommit, consensus_type, primary_delegate_id, payload.len() as u32);
        self.netio.broadcast(consensus_type, header, payload).await?;
        Ok(agg)
    }

    /// Whether `bitmap` alone (ignoring who has rejected) already reaches
    /// quorum — used both for prepares and for commits.
    pub fn bitmap_has_quorum(&self, bitmap: u64) -> bool {
        bitmap_reaches_quorum(bitmap, self.weights)
    }
}

impl RoundState {
    /// Bitmap of delegates who have sent a `Commit` this round. Exposed
    /// here rather than in `state.rs` since only the primary driver reads
    /// commit quorum directly — backups just react to `PostCommit`.
    pub fn accepted_bitmap_for_commits(&self) -> u64 {
        self.commit_bitmap_and_sigs().iter().fold(0u64, |acc, (id, _)| acc | (1u64 << id))
    }
}

/// Maps a consensus-level rejection reason into the `ConsensusError`
/// surfaced to callers that want a typed error rather than the wire enum
/// (e.g. when deciding whether to log-and-continue vs abort a batch).
pub fn rejection_to_consensus_error(reason: RejectionReason) -> Option<ConsensusError> {
    match reason {
        RejectionReason::ClockDrift => Some(ConsensusError::ClockDrift),
        RejectionReason::NewEpoch => Some(ConsensusError::NewEpoch),
        RejectionReason::InvalidPrimaryIndex => Some(ConsensusError::InvalidPrimaryIndex),
        _ => None,
    }
}
