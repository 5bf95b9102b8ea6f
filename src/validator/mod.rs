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

//! The message validator (§4.1), grounded on
//! `original_source/logos/consensus/message_validator.hpp`. Wraps the
//! local delegate's [`crate::crypto::bls::SecretKey`] and the committee's
//! public keys for one epoch, exposing `sign`/`aggregate_sign`/`verify`/
//! `verify_aggregate` so consensus code never touches curve arithmetic
//! directly. The original's `bls::Exception` catches become `Result`s
//! (§9 REDESIGN FLAGS).

use crate::crypto::bls::{self, PublicKey, SecretKey, Signature};
use crate::crypto::Hash;
use crate::error::{Error, ProtocolError, Result};

/// One epoch's committee keys plus this node's own secret key (if it is a
/// delegate this epoch — an observer node holds `None`).
pub struct MessageValidator {
    secret_key: Option<SecretKey>,
    delegate_id: Option<u8>,
    committee: Vec<PublicKey>,
}

impl MessageValidator {
    pub fn new(committee: Vec<PublicKey>) -> Self {
        MessageValidator { secret_key: None, delegate_id: None, committee }
    }

    pub fn with_delegate_key(mut self, delegate_id: u8, secret_key: SecretKey) -> Self {
        self.secret_key = Some(secret_key);
        self.delegate_id = Some(delegate_id);
        self
    }

    pub fn committee(&self) -> &[PublicKey] {
        &self.committee
    }

    pub fn delegate_id(&self) -> Option<u8> {
        self.delegate_id
    }

    /// Signs `hash` with the local delegate's key (§4.1 `Sign`, single
    /// form). Fails if this validator has no delegate key configured.
    pub fn sign(&self, hash: &Hash) -> Result<Signature> {
        let secret_key =
            self.secret_key.as_ref().ok_or(Error::Protocol(ProtocolError::UnexpectedMessage))?;
        Ok(secret_key.sign(hash))
    }

    /// Verifies a single delegate's signature against that delegate's
    /// committee slot (§4.1 `Validate`, single form).
    pub fn verify(&self, hash: &Hash, sig: &Signature, delegate_id: u8) -> Result<bool> {
        let pubkey = self.committee_key(delegate_id)?;
        Ok(bls::verify(hash, sig, pubkey))
    }

    /// Aggregates a set of `(delegate_id, signature)` pairs collected over
    /// one round into a participation bitmap and combined signature
    /// (§4.1 `Sign`, aggregate form).
    pub fn aggregate_sign(&self, signatures: &[(u8, Signature)]) -> Result<(u64, Signature)> {
        bls::aggregate_sign(signatures)
    }

    /// Verifies an aggregated signature against the full committee
    /// (§4.1 `Validate`, aggregate form). Per §4.1, fails only if the
    /// bitmap is empty — quorum is a consensus-layer concern
    /// (`consensus::types::quorum_threshold`), not something this method
    /// second-guesses.
    pub fn verify_aggregate(&self, hash: &Hash, bitmap: u64, agg_sig: &Signature) -> Result<bool> {
        Ok(bls::verify_aggregate(hash, bitmap, agg_sig, &self.committee))
    }

    fn committee_key(&self, delegate_id: u8) -> Result<&PublicKey> {
        self.committee
            .get(delegate_id as usize)
            .ok_or(Error::Protocol(ProtocolError::UnexpectedMessage))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::hash::hash_bytes;
    use rand::rngs::OsRng;

    fn committee(n: usize) -> (Vec<SecretKey>, Vec<PublicKey>) {
        let pairs: Vec<_> = (0..n).map(|_| SecretKey::random(&mut OsRng)).collect();
        let pubkeys = pairs.iter().map(|sk| sk.public_key()).collect();
        (pairs, pubkeys)
    }

    #[test]
    fn single_sign_and_verify_by_slot() {
        let (secrets, pubkeys) = committee(32);
        let validator = MessageValidator::new(pubkeys).with_delegate_key(5, secrets[5].clone());

        let hash = hash_bytes(b"pre-prepare round 1");
        let sig = validator.sign(&hash).unwrap();
        assert!(validator.verify(&hash, &sig, 5).unwrap());
        assert!(!validator.verify(&hash, &sig, 6).unwrap());
    }

    #[test]
    fn aggregate_verifies_for_any_nonempty_subset() {
        let (secrets, pubkeys) = committee(32);
        let validator = MessageValidator::new(pubkeys);
        let hash = hash_bytes(b"quorum round");

        let quorum: Vec<(u8, Signature)> =
            secrets.iter().enumerate().take(31).map(|(i, sk)| (i as u8, sk.sign(&hash))).collect();
        let (bitmap, agg_sig) = validator.aggregate_sign(&quorum).unwrap();
        assert!(validator.verify_aggregate(&hash, bitmap, &agg_sig).unwrap());

        // A below-quorum subset (e.g. 10 of 32) is still a valid aggregate
        // signature over those 10 delegates — quorum is a consensus-layer
        // policy, not something `verify_aggregate` itself enforces (§4.1).
        let short: Vec<(u8, Signature)> =
            secrets.iter().enumerate().take(10).map(|(i, sk)| (i as u8, sk.sign(&hash))).collect();
        let (short_bitmap, short_agg_sig) = validator.aggregate_sign(&short).unwrap();
        assert!(validator.verify_aggregate(&hash, short_bitmap, &short_agg_sig).unwrap());

        // Flipping a participation bit breaks verification regardless of
        // subset size.
        let flipped = short_bitmap ^ 1;
        assert!(!validator.verify_aggregate(&hash, flipped, &short_agg_sig).unwrap());
    }

    #[test]
    fn empty_bitmap_is_rejected() {
        let (_, pubkeys) = committee(4);
        let validator = MessageValidator::new(pubkeys);
        let hash = hash_bytes(b"x");
        let sig = bls::SecretKey::random(&mut OsRng).sign(&hash);
        assert!(!validator.verify_aggregate(&hash, 0, &sig).unwrap());
    }

    #[test]
    fn signing_without_a_delegate_key_fails() {
        let (_, pubkeys) = committee(4);
        let validator = MessageValidator::new(pubkeys);
        let hash = hash_bytes(b"x");
        assert!(validator.sign(&hash).is_err());
    }
}
