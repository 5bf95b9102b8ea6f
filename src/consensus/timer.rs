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

//! Round timeouts and back-off schedules (§4.2.3). Cancellation itself is
//! `crate::net::Timer`'s job (the cancel-flag race is handled there); this
//! module only computes the *durations*.

use rand::Rng;

/// Default primary round timeout for Request consensus (§4.2.1 step 1).
pub const PRIMARY_TIMEOUT_MS: u64 = 60_000;
pub const POST_PREPARE_TIMEOUT_MS: u64 = 30_000;
pub const COMMIT_TIMEOUT_MS: u64 = 30_000;
pub const PREPARE_TIMEOUT_MS: u64 = 30_000;

/// A backup tolerates up to `MAX_CLOCK_DRIFT_MS * (primary_id + 1)` of
/// clock skew from the delegate proposing slot `primary_id` — secondary
/// (fallback) proposers get progressively more slack since they are
/// stepping in after an earlier proposer's timeout already elapsed.
pub const MAX_CLOCK_DRIFT_MS: u64 = 20_000;

pub fn clock_drift_allowance_ms(primary_delegate_id: u8) -> u64 {
    MAX_CLOCK_DRIFT_MS * (primary_delegate_id as u64 + 1)
}

/// Exponential back-off for a primary's own re-proposal after a failed
/// round, capped after three rounds; `round` is 0-indexed (0 = first
/// retry). Round 3 and beyond return `None`, signalling the caller should
/// fall into "idle mode" (see [`idle_mode_interval_ms`]).
pub fn primary_backoff_ms(round: u32) -> Option<u64> {
    if round >= 3 {
        return None
    }
    Some(PRIMARY_TIMEOUT_MS << round)
}

/// After three failed rounds, one delegate proposes every ten minutes
/// while p2p gossip carries the rest of the network (§4.2.3).
pub const IDLE_MODE_INTERVAL_MS: u64 = 10 * 60 * 1000;

pub fn idle_mode_interval_ms() -> u64 {
    IDLE_MODE_INTERVAL_MS
}

/// A backup's delay before promoting its own stored pre-prepare into the
/// primary queue after a `New_Epoch` rejection or a silent primary
/// (§4.2.2, §4.2.3): `MIN + rand_offset(range)`, where `MIN` is at least
/// `MAX_CLOCK_DRIFT_MS` so the fallback round can never race a legitimate
/// epoch transition still in flight.
pub fn reproposal_delay_ms<R: Rng>(rng: &mut R, min_ms: u64, range_ms: u64) -> u64 {
    let min_ms = min_ms.max(MAX_CLOCK_DRIFT_MS);
    if range_ms == 0 {
        min_ms
    } else {
        min_ms + rng.gen_range(0..=range_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    #[test]
    fn backoff_doubles_then_gives_up() {
        assert_eq!(primary_backoff_ms(0), Some(PRIMARY_TIMEOUT_MS));
        assert_eq!(primary_backoff_ms(1), Some(PRIMARY_TIMEOUT_MS * 2));
        assert_eq!(primary_backoff_ms(2), Some(PRIMARY_TIMEOUT_MS * 4));
        assert_eq!(primary_backoff_ms(3), None);
    }

    #[test]
    fn reproposal_delay_respects_floor() {
        let mut rng = OsRng;
        for _ in 0..100 {
            let delay = reproposal_delay_ms(&mut rng, 1_000, 5_000);
            assert!(delay >= MAX_CLOCK_DRIFT_MS);
            assert!(delay <= MAX_CLOCK_DRIFT_MS + 5_000);
        }
    }

    #[test]
    fn drift_allowance_grows_with_delegate_index() {
        assert_eq!(clock_drift_allowance_ms(0), MAX_CLOCK_DRIFT_MS);
        assert_eq!(clock_drift_allowance_ms(1), MAX_CLOCK_DRIFT_MS * 2);
    }
}
