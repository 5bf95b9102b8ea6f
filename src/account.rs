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

//! Account-level persisted records (§3 Data model), grounded on
//! `original_source/logos/lib/account.hpp`'s `account_info` and the
//! staking primitives in `logos/staking/staked_funds.hpp` /
//! `thawing_funds.hpp`.

use std::io::{self, Read, Write};

use crate::codec::{Decodable, Encodable};
use crate::crypto::Hash;

/// Minimum fee a `Send` request must pay, in base units (§4.3.3), matching
/// the original's `MIN_TRANSACTION_FEE = 10^22`.
pub const MIN_TRANSACTION_FEE: u128 = 10_000_000_000_000_000_000_000;

/// Minimum stake required to announce candidacy (§4.3.3), matching the
/// original's `MIN_DELEGATE_STAKE`.
pub const MIN_DELEGATE_STAKE: u64 = 1;

/// Per-account record mutated by applied requests (§3 `AccountInfo`).
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct AccountInfo {
    /// Hash of the most recently applied request on this account's
    /// subchain (the `previous` a new request must reference).
    pub head: Hash,
    pub head_sequence: u32,
    /// Hash of the most recently applied request on this account's
    /// staking subchain (§4.5.1).
    pub staking_head: Hash,
    pub representative: Hash,
    pub balance: u128,
    /// `balance` minus staked, thawing and secondary-liability amounts.
    pub available_balance: u128,
    pub modified_epoch: u32,
    /// Bitmask of token-admin privileges this account holds over tokens it
    /// controls (§4.3.3); bit layout is per-token, indexed via
    /// [`TokenControllerPrivilege`].
    pub controller_privileges: u32,
}

impl AccountInfo {
    pub fn has_privilege(&self, privilege: TokenControllerPrivilege) -> bool {
        self.controller_privileges & (1 << privilege as u32) != 0
    }
}

impl Encodable for AccountInfo {
    fn encode<W: Write>(&self, w: &mut W) -> io::Result<usize> {
        let mut n = self.head.encode(w)?;
        n += self.head_sequence.encode(w)?;
        n += self.staking_head.encode(w)?;
        n += self.representative.encode(w)?;
        n += self.balance.to_le_bytes().encode(w)?;
        n += self.available_balance.to_le_bytes().encode(w)?;
        n += self.modified_epoch.encode(w)?;
        n += self.controller_privileges.encode(w)?;
        Ok(n)
    }
}

impl Decodable for AccountInfo {
    fn decode<R: Read>(r: &mut R) -> io::Result<Self> {
        Ok(AccountInfo {
            head: Hash::decode(r)?,
            head_sequence: u32::decode(r)?,
            staking_head: Hash::decode(r)?,
            representative: Hash::decode(r)?,
            balance: u128::from_le_bytes(<[u8; 16]>::decode(r)?),
            available_balance: u128::from_le_bytes(<[u8; 16]>::decode(r)?),
            modified_epoch: u32::decode(r)?,
            controller_privileges: u32::decode(r)?,
        })
    }
}

/// Bit positions within [`AccountInfo::controller_privileges`] and a
/// token's own setting bitmask — the "signer's controller-privilege bit"
/// and the "token's corresponding setting bit" of §4.3.3.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum TokenControllerPrivilege {
    ChangeController = 0,
    Freeze = 1,
    Revoke = 2,
    UpdateSetting = 3,
}

/// Which per-token settings are mutable by an `UpdateSetting` operation;
/// a bit cleared here is immutable for the token's lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TokenSettings {
    pub mutable_bits: u32,
    pub enabled_bits: u32,
}

impl TokenSettings {
    pub fn is_enabled(&self, bit: u8) -> bool {
        self.enabled_bits & (1 << bit) != 0
    }

    pub fn is_mutable(&self, bit: u8) -> bool {
        self.mutable_bits & (1 << bit) != 0
    }
}

/// Funds locked behind a staking request (§3, §4.5.1): either actively
/// staked to a representative, or thawing out after an unstake.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StakedFunds {
    pub amount: u128,
    pub target_rep: Hash,
    pub expiration_epoch: Option<u32>,
}

impl Encodable for StakedFunds {
    fn encode<W: Write>(&self, w: &mut W) -> io::Result<usize> {
        let mut n = self.amount.to_le_bytes().encode(w)?;
        n += self.target_rep.encode(w)?;
        n += self.expiration_epoch.is_some().encode(w)?;
        n += self.expiration_epoch.unwrap_or(0).encode(w)?;
        Ok(n)
    }
}

impl Decodable for StakedFunds {
    fn decode<R: Read>(r: &mut R) -> io::Result<Self> {
        let amount = u128::from_le_bytes(<[u8; 16]>::decode(r)?);
        let target_rep = Hash::decode(r)?;
        let has_expiration = bool::decode(r)?;
        let expiration_raw = u32::decode(r)?;
        Ok(StakedFunds {
            amount,
            target_rep,
            expiration_epoch: has_expiration.then_some(expiration_raw),
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ThawingFunds {
    pub amount: u128,
    pub target_rep: Hash,
    pub expiration_epoch: u32,
}

impl Encodable for ThawingFunds {
    fn encode<W: Write>(&self, w: &mut W) -> io::Result<usize> {
        let mut n = self.amount.to_le_bytes().encode(w)?;
        n += self.target_rep.encode(w)?;
        n += self.expiration_epoch.encode(w)?;
        Ok(n)
    }
}

impl Decodable for ThawingFunds {
    fn decode<R: Read>(r: &mut R) -> io::Result<Self> {
        Ok(ThawingFunds {
            amount: u128::from_le_bytes(<[u8; 16]>::decode(r)?),
            target_rep: Hash::decode(r)?,
            expiration_epoch: u32::decode(r)?,
        })
    }
}

/// Secondary liability: funds an account owes but has not yet settled
/// (§3), pruned once its expiration epoch passes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Liability {
    pub amount: u128,
    pub target_rep: Hash,
    pub expiration_epoch: u32,
}

impl Encodable for Liability {
    fn encode<W: Write>(&self, w: &mut W) -> io::Result<usize> {
        let mut n = self.amount.to_le_bytes().encode(w)?;
        n += self.target_rep.encode(w)?;
        n += self.expiration_epoch.encode(w)?;
        Ok(n)
    }
}

impl Decodable for Liability {
    fn decode<R: Read>(r: &mut R) -> io::Result<Self> {
        Ok(Liability {
            amount: u128::from_le_bytes(<[u8; 16]>::decode(r)?),
            target_rep: Hash::decode(r)?,
            expiration_epoch: u32::decode(r)?,
        })
    }
}

impl Encodable for u128 {
    fn encode<W: Write>(&self, w: &mut W) -> io::Result<usize> {
        self.to_le_bytes().encode(w)
    }
}

impl Decodable for u128 {
    fn decode<R: Read>(r: &mut R) -> io::Result<Self> {
        Ok(u128::from_le_bytes(<[u8; 16]>::decode(r)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::roundtrip;

    #[test]
    fn account_info_roundtrips() {
        let info = AccountInfo {
            head: Hash([1u8; 32]),
            head_sequence: 9,
            staking_head: Hash::ZERO,
            representative: Hash([2u8; 32]),
            balance: 123_456,
            available_balance: 100_000,
            modified_epoch: 4,
            controller_privileges: 1 << TokenControllerPrivilege::Freeze as u32,
        };
        assert!(roundtrip(&info));
        assert!(info.has_privilege(TokenControllerPrivilege::Freeze));
        assert!(!info.has_privilege(TokenControllerPrivilege::Revoke));
    }

    #[test]
    fn staked_funds_roundtrip_with_and_without_expiration() {
        let with_expiration =
            StakedFunds { amount: 10, target_rep: Hash([3u8; 32]), expiration_epoch: Some(7) };
        assert!(roundtrip(&with_expiration));

        let without_expiration =
            StakedFunds { amount: 10, target_rep: Hash([3u8; 32]), expiration_epoch: None };
        assert!(roundtrip(&without_expiration));
    }

    #[test]
    fn token_settings_respect_mutability() {
        let settings = TokenSettings { mutable_bits: 0b0001, enabled_bits: 0b0011 };
        assert!(settings.is_enabled(0));
        assert!(settings.is_enabled(1));
        assert!(settings.is_mutable(0));
        assert!(!settings.is_mutable(1));
    }
}
