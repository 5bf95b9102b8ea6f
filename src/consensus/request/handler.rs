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

//! Pending-request pool (§4.3.1), grounded on
//! `original_source/logos/consensus/request/request_handler.cpp`'s
//! multi-index container: requests arrive out of order from the network,
//! are de-duplicated by hash, and are cut into batches of at most
//! [`CONSENSUS_BATCH_SIZE`] in first-seen order when a primary proposes.

use std::time::Duration;

use indexmap::IndexMap;

use crate::crypto::Hash;
use crate::net::CONSENSUS_BATCH_SIZE;

use super::block::Request;

/// How long a request sits in the pool before it is dropped unclaimed
/// (§4.3.1 "retain-on-timeout"), mirroring the original's request
/// expiration window.
pub const REQUEST_EXPIRATION: Duration = Duration::from_secs(300);

#[derive(Clone, Debug)]
struct Entry {
    request: Request,
    received_at_ms: u64,
}

/// Pending pool of validated, not-yet-committed requests for one
/// request-block chain. `IndexMap` gives both views the original's
/// `boost::multi_index_container` provided: hash lookup for duplicate
/// suppression, and insertion order for batch building, in one structure.
#[derive(Default)]
pub struct RequestHandler {
    by_hash: IndexMap<Hash, Entry>,
}

impl RequestHandler {
    pub fn new() -> Self {
        RequestHandler { by_hash: IndexMap::new() }
    }

    pub fn len(&self) -> usize {
        self.by_hash.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_hash.is_empty()
    }

    pub fn contains(&self, hash: &Hash) -> bool {
        self.by_hash.contains_key(hash)
    }

    /// Inserts a request keyed by its signing hash. Returns `false` without
    /// modifying the pool if an equal hash is already pending — the
    /// original silently drops exact duplicates rather than erroring.
    pub fn insert(&mut self, hash: Hash, request: Request, received_at_ms: u64) -> bool {
        if self.by_hash.contains_key(&hash) {
            return false
        }
        self.by_hash.insert(hash, Entry { request, received_at_ms });
        true
    }

    pub fn get(&self, hash: &Hash) -> Option<&Request> {
        self.by_hash.get(hash).map(|e| &e.request)
    }

    /// Removes requests committed in a block, called after `PostCommit`
    /// (§4.3.4 "erase-on-commit").
    pub fn remove_committed(&mut self, hashes: &[Hash]) {
        for hash in hashes {
            self.by_hash.shift_remove(hash);
        }
    }

    /// Drops entries older than [`REQUEST_EXPIRATION`] relative to `now_ms`.
    /// Called on the periodic housekeeping tick, not on every batch build —
    /// an expired request that is already inside an in-flight round is left
    /// alone by the caller until that round resolves.
    pub fn expire(&mut self, now_ms: u64) -> Vec<Hash> {
        let cutoff = now_ms.saturating_sub(REQUEST_EXPIRATION.as_millis() as u64);
        let expired: Vec<Hash> =
            self.by_hash.iter().filter(|(_, e)| e.received_at_ms < cutoff).map(|(h, _)| *h).collect();
        for hash in &expired {
            self.by_hash.shift_remove(hash);
        }
        expired
    }

    /// Builds the next batch a primary proposes: up to
    /// [`CONSENSUS_BATCH_SIZE`] pending requests in first-seen order
    /// (§4.3.1). An empty pool yields an empty batch — the primary still
    /// proposes a null request-block to advance the sequence (§4.3.2).
    pub fn next_batch(&self) -> Vec<Request> {
        self.by_hash.values().take(CONSENSUS_BATCH_SIZE).map(|e| e.request.clone()).collect()
    }

    /// Builds a batch restricted to `allowed` hashes, preserving first-seen
    /// order — used when re-proposing the quorum-reachable subset after a
    /// `Rejection` round (§4.3.2).
    pub fn batch_subset(&self, allowed: &[Hash]) -> Vec<Request> {
        let allowed_set: std::collections::HashSet<&Hash> = allowed.iter().collect();
        self.by_hash
            .iter()
            .filter(|(h, _)| allowed_set.contains(h))
            .map(|(_, e)| e.request.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::account_sig::{AccountKeyPair, ACCOUNT_SIG_SIZE};
    use crate::crypto::hash::hash_bytes;

    fn sample(seq: u32) -> (Hash, Request) {
        use super::super::block::{Destination, RequestBody};
        let keypair = AccountKeyPair::generate();
        let mut request = Request {
            origin: keypair.public_key().to_account_hash(),
            previous: Hash::ZERO,
            sequence: seq,
            fee: 10_000_000_000_000_000_000_000,
            timestamp_ms: 1,
            body: RequestBody::Send { destinations: vec![Destination { account: Hash([seq as u8; 32]), amount: 1 }] },
            origin_pubkey: keypair.public_key(),
            signature: crate::crypto::account_sig::AccountSignature::from_bytes(&[0u8; ACCOUNT_SIG_SIZE]).unwrap(),
        };
        let hash = request.signing_hash();
        request.signature = keypair.sign(&hash);
        (hash, request)
    }

    #[test]
    fn duplicate_hash_is_rejected() {
        let mut handler = RequestHandler::new();
        let (hash, request) = sample(1);
        assert!(handler.insert(hash, request.clone(), 100));
        assert!(!handler.insert(hash, request, 100));
        assert_eq!(handler.len(), 1);
    }

    #[test]
    fn batch_preserves_insertion_order() {
        let mut handler = RequestHandler::new();
        let mut hashes = Vec::new();
        for seq in 1..=5 {
            let (hash, request) = sample(seq);
            hashes.push(hash);
            handler.insert(hash, request, 100);
        }
        let batch = handler.next_batch();
        assert_eq!(batch.len(), hashes.len());
        for (seq, req) in (1..=5).zip(batch.iter()) {
            assert_eq!(req.sequence, seq);
        }
    }

    #[test]
    fn expire_drops_only_old_entries() {
        let mut handler = RequestHandler::new();
        let (old_hash, old_req) = sample(1);
        let (fresh_hash, fresh_req) = sample(2);
        handler.insert(old_hash, old_req, 0);
        handler.insert(fresh_hash, fresh_req, 1_000_000);
        let expired = handler.expire(1_000_000 + REQUEST_EXPIRATION.as_millis() as u64);
        assert_eq!(expired, vec![old_hash]);
        assert!(handler.contains(&fresh_hash));
        assert!(!handler.contains(&old_hash));
    }

    #[test]
    fn remove_committed_clears_pool() {
        let mut handler = RequestHandler::new();
        let (hash, request) = sample(1);
        handler.insert(hash, request, 0);
        handler.remove_committed(&[hash]);
        assert!(handler.is_empty());
    }

    #[test]
    fn batch_subset_filters_and_preserves_order() {
        let mut handler = RequestHandler::new();
        let mut hashes = Vec::new();
        for seq in 1..=4 {
            let (hash, request) = sample(seq);
            hashes.push(hash);
            handler.insert(hash, request, 0);
        }
        let subset = handler.batch_subset(&[hashes[0], hashes[2]]);
        assert_eq!(subset.len(), 2);
        assert_eq!(subset[0].sequence, 1);
        assert_eq!(subset[1].sequence, 3);
    }
}
