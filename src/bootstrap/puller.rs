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

//! The bootstrap pull state machine (§4.6.2-§4.6.3), grounded on
//! `original_source/logos/bootstrap/puller.cpp`. `Puller` is pure: it
//! knows nothing about sockets, only about which chain segments remain to
//! be fetched given a local and a peer [`TipSet`]. The thread that
//! actually dials peers feeds `Puller` responses and drains
//! `waiting_pulls` onto the wire.

use std::collections::VecDeque;

use crate::crypto::Hash;
use crate::net::tip::{Tip, TipSet};
use crate::net::{ConsensusType, PullRequest, PullStatus, NUM_DELEGATES};

/// Where the state machine currently stands (§4.6.2).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PullState {
    Epoch,
    Micro,
    Batch,
    Done,
}

/// One outstanding request, tracked until its response names `target` or
/// reports `LastBlock` (§4.6.3). `target_tip` additionally carries the
/// full `(epoch, sequence)` of the target, not just its digest, so
/// [`Puller::advance_tip`] can advance `local.bsb[delegate_index]` to an
/// accurate tip once a `Request`-type pull completes — the wire
/// `PullRequest`/`PullResponse` only ever carry digests (§6), but the
/// full tip is available locally at the moment the pull is created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingPull {
    pub consensus_type: ConsensusType,
    pub prev_hash: Hash,
    pub target_hash: Hash,
    pub target_tip: Option<Tip>,
    pub delegate_index: Option<u8>,
}

/// A `PullRequest` queued locally, paired with the bookkeeping
/// (`delegate_index`, full `target_tip`) needed to advance the right
/// chain tip once the pull completes — kept out of the wire type itself.
#[derive(Clone, Debug, PartialEq, Eq)]
struct QueuedPull {
    request: PullRequest,
    target_tip: Option<Tip>,
    delegate_index: Option<u8>,
}

/// Validates and applies a pulled block, abstracting over whatever owns
/// the actual store (mirrors [`crate::archival::microblock::RequestChainReader`]'s
/// narrow-collaborator shape). `accept` returns the block's own
/// `(previous, hash)` pair iff the block was accepted; `microblock_tips`
/// extracts the 32 delegate tips carried by a just-accepted microblock, if
/// `block_bytes` decodes to one.
pub trait BlockCache {
    fn accept(&mut self, consensus_type: ConsensusType, block_bytes: &[u8]) -> Option<(Hash, Hash)>;
    fn microblock_tips(&self, block_bytes: &[u8]) -> Option<[Tip; NUM_DELEGATES]>;
}

/// Result of feeding one `PullResponse` through [`Puller::handle_response`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PullOutcome {
    /// The pull is still open; more blocks are expected.
    Continue,
    /// The pull reached its target or the peer reported `LastBlock`;
    /// `create_more_pulls` has already run.
    PullComplete,
    /// `block.previous` didn't match the pull's `prev_hash`, or the block
    /// cache rejected the block outright — the sender should be
    /// disconnected (§4.6.3, mirrors the original's `DisconnectSender`).
    DisconnectSender,
    /// The pull named in the response is not currently outstanding
    /// (stale or duplicate response); ignored.
    UnknownPull,
}

/// The pure bootstrap pull state machine (§4.6.2).
pub struct Puller {
    state: PullState,
    working_epoch: u32,
    local: TipSet,
    peer: TipSet,
    waiting_pulls: VecDeque<QueuedPull>,
    ongoing_pulls: Vec<PendingPull>,
}

impl Puller {
    /// Initialises the state machine from a local/peer tip-set pair and
    /// immediately drives it as far as it can go without network I/O
    /// (§8 invariant 6, §8 scenario S3).
    pub fn init(local: TipSet, peer: TipSet) -> Self {
        let working_epoch = local.eb.epoch + 1;
        let mut puller = Puller {
            state: PullState::Epoch,
            working_epoch,
            local,
            peer,
            waiting_pulls: VecDeque::new(),
            ongoing_pulls: Vec::new(),
        };
        puller.drive(None);
        puller
    }

    pub fn state(&self) -> PullState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state == PullState::Done
    }

    pub fn num_waiting_pulls(&self) -> usize {
        self.waiting_pulls.len()
    }

    pub fn num_ongoing_pulls(&self) -> usize {
        self.ongoing_pulls.len()
    }

    /// Pops the next request the caller should actually send over the
    /// wire, moving it from `waiting_pulls` to `ongoing_pulls`.
    pub fn next_pull(&mut self) -> Option<PullRequest> {
        let queued = self.waiting_pulls.pop_front()?;
        self.ongoing_pulls.push(PendingPull {
            consensus_type: queued.request.consensus_type,
            prev_hash: queued.request.previous,
            target_hash: queued.request.target,
            target_tip: queued.target_tip,
            delegate_index: queued.delegate_index,
        });
        Some(queued.request)
    }

    /// Advances `Epoch`/`Micro`/`Batch` as far as possible given the
    /// current tips, enqueuing pulls as it goes. `just_received` carries
    /// the microblock tips of a just-accepted microblock when driving
    /// forward from a `Batch`-entering response (§4.6.2's "if the
    /// just-received microblock exists" clause); `None` on the initial
    /// call and whenever no fresh microblock informs this step.
    fn drive(&mut self, just_received_micro_tips: Option<[Tip; NUM_DELEGATES]>) {
        loop {
            match self.state {
                PullState::Epoch => {
                    if self.peer.eb.is_ahead_of(&self.local.eb) {
                        self.waiting_pulls.push_back(QueuedPull {
                            request: PullRequest {
                                consensus_type: ConsensusType::Epoch,
                                previous: self.local.eb.digest,
                                target: Hash::ZERO,
                            },
                            target_tip: None,
                            delegate_index: None,
                        });
                        return
                    }
                    self.state = PullState::Micro;
                }
                PullState::Micro => {
                    if self.peer.mb.is_ahead_of(&self.local.mb) {
                        self.waiting_pulls.push_back(QueuedPull {
                            request: PullRequest {
                                consensus_type: ConsensusType::MicroBlock,
                                previous: self.local.mb.digest,
                                target: Hash::ZERO,
                            },
                            target_tip: None,
                            delegate_index: None,
                        });
                        return
                    }
                    self.state = PullState::Batch;
                }
                PullState::Batch => {
                    let before = self.waiting_pulls.len();
                    if let Some(tips) = just_received_micro_tips {
                        for i in 0..NUM_DELEGATES {
                            if tips[i].is_ahead_of(&self.local.bsb[i]) {
                                self.waiting_pulls.push_back(QueuedPull {
                                    request: PullRequest {
                                        consensus_type: ConsensusType::Request,
                                        previous: self.local.bsb[i].digest,
                                        target: tips[i].digest,
                                    },
                                    target_tip: Some(tips[i]),
                                    delegate_index: Some(i as u8),
                                });
                            }
                        }
                    } else {
                        for i in 0..NUM_DELEGATES {
                            if self.peer.bsb[i].is_ahead_of(&self.local.bsb[i]) {
                                self.waiting_pulls.push_back(QueuedPull {
                                    request: PullRequest {
                                        consensus_type: ConsensusType::Request,
                                        previous: self.local.bsb[i].digest,
                                        target: self.peer.bsb[i].digest,
                                    },
                                    target_tip: Some(self.peer.bsb[i]),
                                    delegate_index: Some(i as u8),
                                });
                            }
                        }
                    }

                    if self.waiting_pulls.len() > before {
                        return
                    }

                    if !self.ongoing_pulls.is_empty() {
                        return
                    }

                    if self.peer.latest_epoch_number() >= self.working_epoch {
                        self.working_epoch += 1;
                        self.state = PullState::Epoch;
                        continue
                    }

                    self.state = PullState::Done;
                    return
                }
                PullState::Done => return,
            }
        }
    }

    /// Feeds a `PullResponse`'s decoded block back into the state machine
    /// (§4.6.3). `block_previous`/`block_hash` are the block's own
    /// canonical fields, already parsed by the caller out of
    /// `response.block`.
    pub fn handle_response(
        &mut self,
        cache: &mut dyn BlockCache,
        consensus_type: ConsensusType,
        status: PullStatus,
        block_bytes: &[u8],
        block_previous: Hash,
        block_hash: Hash,
    ) -> PullOutcome {
        let Some(pos) = self.ongoing_pulls.iter().position(|p| {
            p.consensus_type == consensus_type && (status == PullStatus::NoBlock || p.prev_hash == block_previous)
        }) else {
            return PullOutcome::UnknownPull
        };

        if status == PullStatus::NoBlock {
            let pull = self.ongoing_pulls.remove(pos);
            let digest = pull.target_hash;
            self.advance_tip(&pull, digest);
            self.drive(None);
            return PullOutcome::PullComplete
        }

        if block_previous != self.ongoing_pulls[pos].prev_hash {
            return PullOutcome::DisconnectSender
        }

        let Some((_, accepted_hash)) = cache.accept(consensus_type, block_bytes) else {
            return PullOutcome::DisconnectSender
        };

        let pull = &self.ongoing_pulls[pos];
        let reached_target = accepted_hash == pull.target_hash || status == PullStatus::LastBlock;

        if !reached_target {
            self.ongoing_pulls[pos].prev_hash = accepted_hash;
            return PullOutcome::Continue
        }

        let pull = self.ongoing_pulls.remove(pos);
        self.advance_tip(&pull, block_hash);

        let micro_tips = cache.microblock_tips(block_bytes);
        self.drive(micro_tips);
        PullOutcome::PullComplete
    }

    /// Advances the local tip a just-completed pull was fetching towards.
    /// `digest` is the hash the pull actually concluded on (the accepted
    /// block's own hash, or `pull.target_hash` for a `NoBlock` response).
    /// Epoch/Micro advance by exactly one sequence per completed pull;
    /// Request advances `local.bsb[delegate_index]` straight to the full
    /// `target_tip` recorded when the pull was queued, since one pull can
    /// walk several request blocks before reaching its target (§4.6.3).
    fn advance_tip(&mut self, pull: &PendingPull, digest: Hash) {
        match pull.consensus_type {
            ConsensusType::Epoch => {
                self.local.eb = Tip::new(self.local.eb.epoch, self.local.eb.sequence + 1, digest)
            }
            ConsensusType::MicroBlock => {
                self.local.mb = Tip::new(self.local.mb.epoch, self.local.mb.sequence + 1, digest)
            }
            ConsensusType::Request => {
                if let (Some(index), Some(target_tip)) = (pull.delegate_index, pull.target_tip) {
                    self.local.bsb[index as usize] = target_tip;
                }
            }
            ConsensusType::Any => {}
        }
    }

    /// Reinserts a pull at the front of the waiting queue for retry
    /// against a different peer, on transport failure (§4.6.3).
    pub fn requeue_for_retry(&mut self, consensus_type: ConsensusType, prev_hash: Hash) {
        if let Some(pos) =
            self.ongoing_pulls.iter().position(|p| p.consensus_type == consensus_type && p.prev_hash == prev_hash)
        {
            let pull = self.ongoing_pulls.remove(pos);
            self.waiting_pulls.push_front(QueuedPull {
                request: PullRequest {
                    consensus_type: pull.consensus_type,
                    previous: pull.prev_hash,
                    target: pull.target_hash,
                },
                target_tip: pull.target_tip,
                delegate_index: pull.delegate_index,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digest(n: u8) -> Hash {
        Hash([n; 32])
    }

    /// §8 scenario S3.
    #[test]
    fn pull_tip_set_behind_across_delegates() {
        let mut local = TipSet::default();
        local.eb = Tip::new(1, 1, digest(3));
        local.mb = Tip::new(2, 1, digest(4));

        let mut peer = local.clone();
        for i in 0..NUM_DELEGATES {
            peer.bsb[i] = Tip::new(2, 1, digest(10));
        }

        let puller = Puller::init(local, peer);
        assert_eq!(puller.num_waiting_pulls(), 32);
    }

    #[test]
    fn already_caught_up_goes_straight_to_done() {
        let tips = TipSet::default();
        let puller = Puller::init(tips.clone(), tips);
        assert!(puller.is_done());
        assert_eq!(puller.num_waiting_pulls(), 0);
    }

    #[test]
    fn epoch_behind_enqueues_single_epoch_pull_first() {
        let mut local = TipSet::default();
        let mut peer = TipSet::default();
        peer.eb = Tip::new(5, 0, digest(1));

        let puller = Puller::init(local.clone(), peer.clone());
        assert_eq!(puller.num_waiting_pulls(), 1);

        local.eb = peer.eb;
        let puller = Puller::init(local, peer);
        assert!(puller.is_done());
    }

    struct FakeCache;
    impl BlockCache for FakeCache {
        fn accept(&mut self, _consensus_type: ConsensusType, _block_bytes: &[u8]) -> Option<(Hash, Hash)> {
            Some((Hash::ZERO, digest(99)))
        }
        fn microblock_tips(&self, _block_bytes: &[u8]) -> Option<[Tip; NUM_DELEGATES]> {
            None
        }
    }

    #[test]
    fn completing_a_request_pull_advances_the_delegate_tip_and_reaches_done() {
        let local = TipSet::default();
        let mut peer = TipSet::default();
        peer.bsb[0] = Tip::new(2, 1, digest(10));

        let mut puller = Puller::init(local, peer);
        assert_eq!(puller.num_waiting_pulls(), 1);
        assert_eq!(puller.state(), PullState::Batch);

        let req = puller.next_pull().unwrap();
        assert_eq!(req.consensus_type, ConsensusType::Request);
        assert_eq!(req.target, digest(10));

        let mut cache = FakeCache;
        let outcome = puller.handle_response(
            &mut cache,
            ConsensusType::Request,
            PullStatus::LastBlock,
            b"block",
            req.previous,
            digest(10),
        );
        assert_eq!(outcome, PullOutcome::PullComplete);

        // The local delegate-0 tip must now equal the peer's — not still
        // zero, and the state machine must not re-enqueue the very same
        // pull it just completed.
        assert_eq!(puller.local.bsb[0], Tip::new(2, 1, digest(10)));
        assert_eq!(puller.num_waiting_pulls(), 0);
        assert!(puller.is_done());
    }

    #[test]
    fn mismatched_previous_disconnects_sender() {
        let mut local = TipSet::default();
        let mut peer = TipSet::default();
        peer.mb = Tip::new(0, 1, digest(2));
        local.eb = peer.eb;

        let mut puller = Puller::init(local, peer);
        assert_eq!(puller.num_waiting_pulls(), 1);
        puller.next_pull();

        let mut cache = FakeCache;
        let outcome = puller.handle_response(
            &mut cache,
            ConsensusType::MicroBlock,
            PullStatus::LastBlock,
            b"block",
            digest(123),
            digest(2),
        );
        assert_eq!(outcome, PullOutcome::DisconnectSender);
    }

    #[test]
    fn reaching_target_completes_pull_and_advances_state() {
        let mut local = TipSet::default();
        let mut peer = TipSet::default();
        peer.mb = Tip::new(0, 1, digest(2));
        local.eb = peer.eb;

        let mut puller = Puller::init(local, peer);
        let req = puller.next_pull().unwrap();
        assert_eq!(req.consensus_type, ConsensusType::MicroBlock);

        let mut cache = FakeCache;
        let outcome = puller.handle_response(
            &mut cache,
            ConsensusType::MicroBlock,
            PullStatus::LastBlock,
            b"block",
            req.previous,
            digest(2),
        );
        assert_eq!(outcome, PullOutcome::PullComplete);
        assert_eq!(puller.num_ongoing_pulls(), 0);
    }
}
