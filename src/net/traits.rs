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

//! Narrow collaborator interfaces (§9 REDESIGN FLAGS): `NetIO`, `TimerHost`,
//! `Bootstrap`, `Websocket`. The original ties these concerns together
//! inside one "node owns everything" object graph; here each is an
//! injectable trait, implemented for real by `bin/dbftd` and by fakes in
//! tests. `BlockStore` lives in [`crate::store`] since every module that
//! needs persistence needs it, not just the network-facing ones.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::crypto::Hash;
use crate::error::Result;
use crate::net::{ConsensusType, MessageHeader, PullRequest, PullResponse, TipSet};

/// Outbound messaging, abstracting over the actual TCP/websocket transport
/// (out of scope per §1). A consensus instance only ever needs to
/// broadcast to its 31 peers or address one delegate directly; it never
/// touches a socket.
#[async_trait]
pub trait NetIO: Send + Sync {
    /// Sends a framed message to every other delegate in `consensus_type`'s
    /// committee.
    async fn broadcast(&self, consensus_type: ConsensusType, header: MessageHeader, payload: Vec<u8>) -> Result<()>;

    /// Sends a framed message to one delegate by committee index.
    async fn send_to(&self, delegate_id: u8, header: MessageHeader, payload: Vec<u8>) -> Result<()>;
}

/// A single cancellable timer (§5 *Cancellation*): `cancel` may race with
/// the timer already having fired, so `wait` re-reads the flag after
/// sleeping rather than trusting that cancellation always arrives in time.
#[derive(Clone)]
pub struct Timer {
    cancel_flag: Arc<AtomicBool>,
    delay_ms: u64,
}

impl Timer {
    pub fn new(delay_ms: u64) -> Self {
        Timer { cancel_flag: Arc::new(AtomicBool::new(false)), delay_ms }
    }

    pub fn cancel(&self) {
        self.cancel_flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_flag.load(Ordering::SeqCst)
    }

    /// Sleeps for the configured delay, then returns whether `cancel` was
    /// called (by the time this returns true, the caller must treat the
    /// timer as a no-op rather than act on its firing).
    pub async fn wait(&self) -> bool {
        smol::Timer::after(Duration::from_millis(self.delay_ms)).await;
        self.is_cancelled()
    }
}

/// Starts timers. Implemented trivially by [`SystemTimerHost`]; tests can
/// substitute a fake that fires immediately or records scheduled delays
/// without sleeping.
pub trait TimerHost: Send + Sync {
    fn start(&self, delay_ms: u64) -> Timer;
}

#[derive(Clone, Copy, Default)]
pub struct SystemTimerHost;

impl TimerHost for SystemTimerHost {
    fn start(&self, delay_ms: u64) -> Timer {
        Timer::new(delay_ms)
    }
}

/// The bootstrap subsystem as seen by the rest of the node: report the
/// locally known [`TipSet`], answer a peer's pull, and run to completion
/// or be told to stop (§4.6, §5).
#[async_trait]
pub trait Bootstrap: Send + Sync {
    fn local_tip_set(&self) -> TipSet;

    async fn answer_pull(&self, request: PullRequest) -> Result<PullResponse>;

    /// True once every chain named in the working tip set has caught up
    /// to its target (`Puller::AllDone`).
    fn is_done(&self) -> bool;

    fn stop(&self);
}

/// Push notifications toward wallet/RPC subscribers (§6 `TxAcceptor`
/// surface, out of scope for the wire format itself but needed so the
/// consensus layer doesn't reach into an RPC server directly).
#[async_trait]
pub trait Websocket: Send + Sync {
    async fn notify_committed(&self, consensus_type: ConsensusType, hash: Hash);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_is_observed_after_construction() {
        let timer = SystemTimerHost.start(50);
        assert!(!timer.is_cancelled());
        timer.cancel();
        assert!(timer.is_cancelled());
    }
}
