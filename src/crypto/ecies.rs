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

//! ECIES key wrapping used by `KeyAdvert` messages (§6, §3 Supplemented
//! features), grounded on `original_source/logos/lib/ecies.hpp`: an
//! ephemeral X25519 key exchange, HKDF-SHA256 to derive a symmetric key,
//! then AES-256-GCM to seal the payload.

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use hkdf::Hkdf;
use rand::rngs::OsRng;
use sha2::Sha256;
use x25519_dalek::{EphemeralSecret, PublicKey as X25519PublicKey, StaticSecret};

use crate::error::{Error, Result};

pub const PUBLIC_KEY_SIZE: usize = 32;

/// `ephemeral_pubkey || nonce || ciphertext_with_tag`
pub fn encrypt(recipient_pub: &[u8; PUBLIC_KEY_SIZE], plaintext: &[u8]) -> Result<Vec<u8>> {
    let recipient = X25519PublicKey::from(*recipient_pub);
    let ephemeral = EphemeralSecret::random_from_rng(OsRng);
    let ephemeral_pub = X25519PublicKey::from(&ephemeral);
    let shared = ephemeral.diffie_hellman(&recipient);

    let cipher = Aes256Gcm::new(&derive_key(shared.as_bytes()));
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext =
        cipher.encrypt(&nonce, plaintext).map_err(|e| Error::Other(format!("ecies encrypt failed: {e}")))?;

    let mut out = Vec::with_capacity(PUBLIC_KEY_SIZE + 12 + ciphertext.len());
    out.extend_from_slice(ephemeral_pub.as_bytes());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

pub fn decrypt(recipient_priv: &StaticSecret, sealed: &[u8]) -> Result<Vec<u8>> {
    if sealed.len() < PUBLIC_KEY_SIZE + 12 {
        return Err(Error::Other("ecies ciphertext too short".into()))
    }
    let (ephemeral_pub_bytes, rest) = sealed.split_at(PUBLIC_KEY_SIZE);
    let (nonce_bytes, ciphertext) = rest.split_at(12);

    let mut ephemeral_pub_arr = [0u8; PUBLIC_KEY_SIZE];
    ephemeral_pub_arr.copy_from_slice(ephemeral_pub_bytes);
    let ephemeral_pub = X25519PublicKey::from(ephemeral_pub_arr);

    let shared = recipient_priv.diffie_hellman(&ephemeral_pub);
    let cipher = Aes256Gcm::new(&derive_key(shared.as_bytes()));
    let nonce = Nonce::from_slice(nonce_bytes);

    cipher.decrypt(nonce, ciphertext).map_err(|_| Error::Other("ecies authentication failed".into()))
}

fn derive_key(shared_secret: &[u8]) -> Key<Aes256Gcm> {
    let hk = Hkdf::<Sha256>::new(None, shared_secret);
    let mut okm = [0u8; 32];
    hk.expand(b"dbft-core-ecies-key-advert", &mut okm).expect("32 is a valid HKDF output length");
    *Key::<Aes256Gcm>::from_slice(&okm)
}
