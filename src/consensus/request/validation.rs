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

//! Per-request validation rules (§4.3.3), grounded on
//! `original_source/logos/consensus/persistence/request/request_persistence.hpp`'s
//! `Validate` overloads for each request subtype.

use crate::account::{AccountInfo, TokenControllerPrivilege, TokenSettings, MIN_DELEGATE_STAKE, MIN_TRANSACTION_FEE};
use crate::crypto::account_sig;
use crate::error::ValidationError;

use super::block::{Request, RequestBody, TokenOperation};

/// Read-only view a validator needs of the rest of the ledger: the
/// originating account, and (for token-admin requests) the target token's
/// settings. Implemented over a [`crate::store::BlockStore`] read
/// transaction by the caller; kept as a trait so validation has no direct
/// dependency on the storage layer.
pub trait LedgerView {
    fn account(&self, account: &crate::crypto::Hash) -> Option<AccountInfo>;
    fn token_settings(&self, token: &crate::crypto::Hash) -> Option<TokenSettings>;
    fn is_representative(&self, account: &crate::crypto::Hash) -> bool;
    fn has_active_renouncement(&self, account: &crate::crypto::Hash) -> bool;
}

/// Validates one request against the ledger state it claims to extend.
/// Returns `Ok(())` if the request may be applied; otherwise the specific
/// [`ValidationError`] that should be surfaced in a `Rejection`.
pub fn validate_request(request: &Request, ledger: &dyn LedgerView) -> Result<(), ValidationError> {
    let account = ledger.account(&request.origin).ok_or(ValidationError::NotYetActive)?;

    if request.sequence != account.head_sequence + 1 {
        return Err(ValidationError::BadSequence)
    }
    if request.previous != account.head {
        return Err(ValidationError::Fork)
    }

    let signing_hash = request.signing_hash();
    if !account_sig::verify(&signing_hash, &request.signature, &request.origin_pubkey) {
        return Err(ValidationError::BadSignature)
    }
    if request.origin_pubkey.to_account_hash() != request.origin {
        return Err(ValidationError::BadSignature)
    }

    match &request.body {
        RequestBody::Send { destinations } => validate_send(destinations, request.fee, &account),
        RequestBody::ChangeRep { .. } => Ok(()),
        RequestBody::TokenAdmin { token, op } => validate_token_admin(token, op, &account, ledger),
        RequestBody::Proxy { .. } => Ok(()),
        RequestBody::StartRepresenting => Ok(()),
        RequestBody::AnnounceCandidacy { stake } => validate_announce_candidacy(*stake, &request.origin, ledger),
        RequestBody::RenounceCandidacy => Ok(()),
        RequestBody::ElectionVote { candidates } => validate_election_vote(candidates, &request.origin, ledger),
    }
}

fn validate_send(
    destinations: &[super::block::Destination],
    fee: u64,
    account: &AccountInfo,
) -> Result<(), ValidationError> {
    if destinations.is_empty() || destinations.iter().any(|d| d.amount == 0) {
        return Err(ValidationError::ZeroAmount)
    }
    if (fee as u128) < MIN_TRANSACTION_FEE {
        return Err(ValidationError::FeeTooLow)
    }
    let total: u128 = destinations.iter().map(|d| d.amount as u128).sum::<u128>() + fee as u128;
    if account.available_balance < total {
        return Err(ValidationError::InsufficientBalance)
    }
    Ok(())
}

fn validate_token_admin(
    token: &crate::crypto::Hash,
    op: &TokenOperation,
    account: &AccountInfo,
    ledger: &dyn LedgerView,
) -> Result<(), ValidationError> {
    let settings = ledger
        .token_settings(token)
        .ok_or_else(|| ValidationError::InvalidToken("unknown token".into()))?;

    let (privilege, bit) = match op {
        TokenOperation::ChangeController { .. } => (TokenControllerPrivilege::ChangeController, 0),
        TokenOperation::Freeze | TokenOperation::Unfreeze => (TokenControllerPrivilege::Freeze, 1),
        TokenOperation::Revoke { .. } => (TokenControllerPrivilege::Revoke, 2),
        TokenOperation::UpdateSetting { bit, .. } => (TokenControllerPrivilege::UpdateSetting, *bit),
    };

    if !account.has_privilege(privilege) {
        return Err(ValidationError::InvalidToken("signer lacks controller privilege".into()))
    }
    if !settings.is_enabled(bit) {
        return Err(ValidationError::InvalidToken("operation disabled by token settings".into()))
    }
    if matches!(op, TokenOperation::UpdateSetting { .. }) && !settings.is_mutable(bit) {
        return Err(ValidationError::InvalidToken("setting is immutable".into()))
    }
    Ok(())
}

fn validate_announce_candidacy(
    stake: u64,
    origin: &crate::crypto::Hash,
    ledger: &dyn LedgerView,
) -> Result<(), ValidationError> {
    if stake < MIN_DELEGATE_STAKE {
        return Err(ValidationError::BadGovernanceRequest("stake below MIN_DELEGATE_STAKE".into()))
    }
    if ledger.has_active_renouncement(origin) {
        return Err(ValidationError::BadGovernanceRequest("renouncement already in progress".into()))
    }
    Ok(())
}

fn validate_election_vote(
    candidates: &[crate::crypto::Hash],
    origin: &crate::crypto::Hash,
    ledger: &dyn LedgerView,
) -> Result<(), ValidationError> {
    if !ledger.is_representative(origin) {
        return Err(ValidationError::BadGovernanceRequest("origin is not a representative this epoch".into()))
    }
    if candidates.len() > 8 {
        return Err(ValidationError::BadGovernanceRequest("more than 8 candidates listed".into()))
    }
    if candidates.len() > u8::MAX as usize {
        return Err(ValidationError::BadGovernanceRequest("vote count does not fit in a u8".into()))
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::request::block::Destination;
    use crate::crypto::account_sig::AccountKeyPair;
    use crate::crypto::Hash;
    use std::collections::HashMap;

    struct FakeLedger {
        accounts: HashMap<Hash, AccountInfo>,
        tokens: HashMap<Hash, TokenSettings>,
        representatives: std::collections::HashSet<Hash>,
        renouncements: std::collections::HashSet<Hash>,
    }

    impl LedgerView for FakeLedger {
        fn account(&self, account: &Hash) -> Option<AccountInfo> {
            self.accounts.get(account).cloned()
        }
        fn token_settings(&self, token: &Hash) -> Option<TokenSettings> {
            self.tokens.get(token).copied()
        }
        fn is_representative(&self, account: &Hash) -> bool {
            self.representatives.contains(account)
        }
        fn has_active_renouncement(&self, account: &Hash) -> bool {
            self.renouncements.contains(account)
        }
    }

    fn signed_request(keypair: &AccountKeyPair, body: RequestBody, fee: u64, sequence: u32) -> Request {
        let mut request = Request {
            origin: keypair.public_key().to_account_hash(),
            previous: Hash::ZERO,
            sequence,
            fee,
            timestamp_ms: 1,
            body,
            origin_pubkey: keypair.public_key(),
            signature: account_sig::AccountSignature::from_bytes(&[0u8; 64]).unwrap(),
        };
        let hash = request.signing_hash();
        request.signature = keypair.sign(&hash);
        request
    }

    fn ledger_with(keypair: &AccountKeyPair, balance: u128) -> FakeLedger {
        let mut accounts = HashMap::new();
        accounts.insert(
            keypair.public_key().to_account_hash(),
            AccountInfo {
                head: Hash::ZERO,
                head_sequence: 0,
                staking_head: Hash::ZERO,
                representative: Hash::ZERO,
                balance,
                available_balance: balance,
                modified_epoch: 0,
                controller_privileges: 0,
            },
        );
        FakeLedger {
            accounts,
            tokens: HashMap::new(),
            representatives: Default::default(),
            renouncements: Default::default(),
        }
    }

    #[test]
    fn send_with_sufficient_balance_and_fee_is_valid() {
        let keypair = AccountKeyPair::generate();
        let fee = MIN_TRANSACTION_FEE as u64;
        let ledger = ledger_with(&keypair, 1_000_000_000_000_000_000_000_000);
        let request = signed_request(
            &keypair,
            RequestBody::Send { destinations: vec![Destination { account: Hash([9u8; 32]), amount: 1 }] },
            fee,
            1,
        );
        assert!(validate_request(&request, &ledger).is_ok());
    }

    #[test]
    fn send_below_min_fee_is_rejected() {
        let keypair = AccountKeyPair::generate();
        let ledger = ledger_with(&keypair, 1_000_000_000_000_000_000_000_000);
        let request = signed_request(
            &keypair,
            RequestBody::Send { destinations: vec![Destination { account: Hash([9u8; 32]), amount: 1 }] },
            1,
            1,
        );
        assert_eq!(validate_request(&request, &ledger), Err(ValidationError::FeeTooLow));
    }

    #[test]
    fn send_exceeding_balance_is_rejected() {
        let keypair = AccountKeyPair::generate();
        let fee = MIN_TRANSACTION_FEE as u64;
        let ledger = ledger_with(&keypair, fee as u128);
        let request = signed_request(
            &keypair,
            RequestBody::Send { destinations: vec![Destination { account: Hash([9u8; 32]), amount: 100 }] },
            fee,
            1,
        );
        assert_eq!(validate_request(&request, &ledger), Err(ValidationError::InsufficientBalance));
    }

    #[test]
    fn wrong_sequence_is_rejected() {
        let keypair = AccountKeyPair::generate();
        let fee = MIN_TRANSACTION_FEE as u64;
        let ledger = ledger_with(&keypair, 1_000_000_000_000_000_000_000_000);
        let request = signed_request(
            &keypair,
            RequestBody::Send { destinations: vec![Destination { account: Hash([9u8; 32]), amount: 1 }] },
            fee,
            5,
        );
        assert_eq!(validate_request(&request, &ledger), Err(ValidationError::BadSequence));
    }

    #[test]
    fn election_vote_requires_representative_status() {
        let keypair = AccountKeyPair::generate();
        let ledger = ledger_with(&keypair, 0);
        let request = signed_request(&keypair, RequestBody::ElectionVote { candidates: vec![] }, 0, 1);
        assert_eq!(
            validate_request(&request, &ledger),
            Err(ValidationError::BadGovernanceRequest("origin is not a representative this epoch".into()))
        );
    }

    #[test]
    fn announce_candidacy_requires_minimum_stake() {
        let keypair = AccountKeyPair::generate();
        let ledger = ledger_with(&keypair, 0);
        let request = signed_request(&keypair, RequestBody::AnnounceCandidacy { stake: 0 }, 0, 1);
        assert_eq!(
            validate_request(&request, &ledger),
            Err(ValidationError::BadGovernanceRequest("stake below MIN_DELEGATE_STAKE".into()))
        );
    }
}
