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

//! AES-256-GCM "sleeve" for wrapping private keys at rest (§2, §3
//! Supplemented features). Wallet key *storage layout* is out of scope
//! (§1); this module only wraps/unwraps a plaintext key under a
//! passphrase-derived key.

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

pub const KEY_SIZE: usize = 32;
pub const NONCE_SIZE: usize = 12;
pub const TAG_SIZE: usize = 16;

/// Wraps `plaintext` (a BLS or account private key) under `passphrase`,
/// producing `nonce || ciphertext_with_tag`.
pub fn seal(passphrase: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let key = derive_key(passphrase);
    let cipher = Aes256Gcm::new(&key);
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| Error::Other(format!("sleeve seal failed: {e}")))?;

    let mut out = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Reverses [`seal`]. Fails (authentication error) if `passphrase` is wrong
/// or `sealed` was tampered with.
pub fn open(passphrase: &[u8], sealed: &[u8]) -> Result<Vec<u8>> {
    if sealed.len() < NONCE_SIZE + TAG_SIZE {
        return Err(Error::Other("sleeve ciphertext too short".into()))
    }
    let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_SIZE);
    let key = derive_key(passphrase);
    let cipher = Aes256Gcm::new(&key);
    let nonce = Nonce::from_slice(nonce_bytes);

    cipher.decrypt(nonce, ciphertext).map_err(|_| Error::Other("sleeve authentication failed".into()))
}

fn derive_key(passphrase: &[u8]) -> Key<Aes256Gcm> {
    let digest = Sha256::digest(passphrase);
    *Key::<Aes256Gcm>::from_slice(&digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seal_open_roundtrip() {
        let sealed = seal(b"correct horse", b"super secret bls key material").unwrap();
        let opened = open(b"correct horse", &sealed).unwrap();
        assert_eq!(opened, b"super secret bls key material");
    }

    #[test]
    fn wrong_passphrase_fails() {
        let sealed = seal(b"correct horse", b"secret").unwrap();
        assert!(open(b"wrong passphrase", &sealed).is_err());
    }
}
