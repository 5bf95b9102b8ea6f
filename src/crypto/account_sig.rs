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

//! Account-level (wallet) signatures, distinct from the aggregated
//! consensus scheme in [`crate::crypto::bls`]. `original_source`'s
//! `byte_arrays.hpp` sizes `ACCOUNT_SIG_SIZE = 64`, matching an Ed25519
//! signature rather than a BN254 curve point — every `Request` (§3, §4.3)
//! is signed by its origin account with this scheme, not the delegate BLS
//! key. Grounded on the teacher's own `ed25519-compact` usage for
//! transaction and contract signatures.

use ed25519_compact::{KeyPair, PublicKey as Ed25519PublicKey, Seed, Signature as Ed25519Signature};

use crate::crypto::Hash;
use crate::error::{Error, ProtocolError, Result};

pub const ACCOUNT_SIG_SIZE: usize = 64;
pub const ACCOUNT_PUB_KEY_SIZE: usize = 32;

#[derive(Clone)]
pub struct AccountKeyPair(KeyPair);

#[derive(Clone, Copy, PartialEq, Eq)]
pub struct AccountPublicKey([u8; ACCOUNT_PUB_KEY_SIZE]);

#[derive(Clone, Copy, PartialEq, Eq)]
pub struct AccountSignature([u8; ACCOUNT_SIG_SIZE]);

impl AccountKeyPair {
    pub fn generate() -> Self {
        AccountKeyPair(KeyPair::from_seed(Seed::generate()))
    }

    pub fn public_key(&self) -> AccountPublicKey {
        let mut out = [0u8; ACCOUNT_PUB_KEY_SIZE];
        out.copy_from_slice(&self.0.pk[..]);
        AccountPublicKey(out)
    }

    pub fn sign(&self, hash: &Hash) -> AccountSignature {
        let sig = self.0.sk.sign(hash.as_bytes(), None);
        let mut out = [0u8; ACCOUNT_SIG_SIZE];
        out.copy_from_slice(&sig[..]);
        AccountSignature(out)
    }
}

impl AccountPublicKey {
    pub fn to_bytes(&self) -> [u8; ACCOUNT_PUB_KEY_SIZE] {
        self.0
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<AccountPublicKey> {
        if bytes.len() != ACCOUNT_PUB_KEY_SIZE {
            return Err(Error::Protocol(ProtocolError::BadSignature))
        }
        let mut out = [0u8; ACCOUNT_PUB_KEY_SIZE];
        out.copy_from_slice(bytes);
        Ok(AccountPublicKey(out))
    }

    /// Derives the account's identifying [`Hash`], matching the original's
    /// use of the public key itself as the account address.
    pub fn to_account_hash(&self) -> Hash {
        Hash::from_slice(&self.0).expect("ed25519 public keys and Hash are both 32 bytes")
    }
}

impl AccountSignature {
    pub fn to_bytes(&self) -> [u8; ACCOUNT_SIG_SIZE] {
        self.0
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<AccountSignature> {
        if bytes.len() != ACCOUNT_SIG_SIZE {
            return Err(Error::Protocol(ProtocolError::BadSignature))
        }
        let mut out = [0u8; ACCOUNT_SIG_SIZE];
        out.copy_from_slice(bytes);
        Ok(AccountSignature(out))
    }
}

pub fn verify(hash: &Hash, sig: &AccountSignature, pubkey: &AccountPublicKey) -> bool {
    let Ok(pk) = Ed25519PublicKey::from_slice(&pubkey.0) else { return false };
    let Ok(sig) = Ed25519Signature::from_slice(&sig.0) else { return false };
    pk.verify(hash.as_bytes(), &sig).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::hash::hash_bytes;

    #[test]
    fn sign_and_verify_roundtrip() {
        let keypair = AccountKeyPair::generate();
        let hash = hash_bytes(b"send 10 units to account X");
        let sig = keypair.sign(&hash);
        assert!(verify(&hash, &sig, &keypair.public_key()));
    }

    #[test]
    fn tampered_hash_fails() {
        let keypair = AccountKeyPair::generate();
        let hash = hash_bytes(b"send 10 units to account X");
        let sig = keypair.sign(&hash);
        let other = hash_bytes(b"send 1000000 units to account Y");
        assert!(!verify(&other, &sig, &keypair.public_key()));
    }

    #[test]
    fn wire_sizes_match_original() {
        let keypair = AccountKeyPair::generate();
        let hash = hash_bytes(b"size check");
        assert_eq!(keypair.sign(&hash).to_bytes().len(), ACCOUNT_SIG_SIZE);
        assert_eq!(keypair.public_key().to_bytes().len(), ACCOUNT_PUB_KEY_SIZE);
    }
}
