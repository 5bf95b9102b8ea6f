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

//! Crate-wide error and result types, following the §7 error taxonomy.

use std::sync::PoisonError;

pub type Result<T> = std::result::Result<T, Error>;

/// Rejection reasons a backup can attach to a [`crate::net::Rejection`]
/// message. Exhaustive per spec §4.2.2 — never alias two of these.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[repr(u8)]
pub enum RejectionReason {
    Void = 0,
    ClockDrift = 1,
    ContainsInvalidRequest = 2,
    BadSignature = 3,
    InvalidPreviousHash = 4,
    WrongSequenceNumber = 5,
    InvalidEpoch = 6,
    NewEpoch = 7,
    InvalidPrimaryIndex = 8,
}

impl RejectionReason {
    pub fn from_u8(v: u8) -> Option<RejectionReason> {
        use RejectionReason::*;
        Some(match v {
            0 => Void,
            1 => ClockDrift,
            2 => ContainsInvalidRequest,
            3 => BadSignature,
            4 => InvalidPreviousHash,
            5 => WrongSequenceNumber,
            6 => InvalidEpoch,
            7 => NewEpoch,
            8 => InvalidPrimaryIndex,
            _ => return None,
        })
    }
}

/// Validation-layer failures (§7 *Validation*). These surface to the
/// proposer as part of a `Rejection`, never panic the process.
#[derive(Clone, Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("gap in previous-hash chain")]
    GapPrevious,
    #[error("fork detected: previous_hash does not match local tip")]
    Fork,
    #[error("insufficient balance for request")]
    InsufficientBalance,
    #[error("hash older than the account head")]
    OldHash,
    #[error("sequence number does not match account.head_sequence + 1")]
    BadSequence,
    #[error("account or feature not yet active")]
    NotYetActive,
    #[error("invalid token operation: {0}")]
    InvalidToken(String),
    #[error("signature does not verify")]
    BadSignature,
    #[error("fee below MIN_TRANSACTION_FEE")]
    FeeTooLow,
    #[error("zero-amount or zero-destination transaction")]
    ZeroAmount,
    #[error("governance request malformed: {0}")]
    BadGovernanceRequest(String),
}

#[derive(Clone, Copy, Debug, thiserror::Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("signature failed to deserialize or verify")]
    BadSignature,
    #[error("malformed message header")]
    BadHeader,
    #[error("message type not expected in this context")]
    UnexpectedMessage,
    #[error("payload_size field does not match actual payload length")]
    BadPayloadSize,
}

#[derive(Clone, Copy, Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConsensusError {
    #[error("timestamp outside MAX_CLOCK_DRIFT_MS window")]
    ClockDrift,
    #[error("pre-prepare arrived during an epoch transition")]
    NewEpoch,
    #[error("primary_delegate_id does not match the expected proposer index")]
    InvalidPrimaryIndex,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("consensus error: {0}")]
    Consensus(#[from] ConsensusError),

    #[error("missing block referenced by previous_hash: {0}")]
    MissingBlock(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("a background lock was poisoned")]
    LockPoisoned,

    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Codec(String),

    #[error("{0}")]
    Other(String),
}

impl<T> From<PoisonError<T>> for Error {
    fn from(_: PoisonError<T>) -> Self {
        Error::LockPoisoned
    }
}

/// Marks an error as FATAL per §7: log it at FATAL severity and abort the
/// process. Mirrors the original's `trace_and_halt()` — recovery is
/// operator-initiated, so there is no in-process retry path.
pub fn trace_and_halt(err: &Error) -> ! {
    log::error!(target: "fatal::trace_and_halt", "unrecoverable storage error: {err}");
    std::process::abort()
}
