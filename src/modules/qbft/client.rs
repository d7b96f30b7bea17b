// Copyright 2019-2020 ChainX Project Authors. Licensed under GPL-3.0.

//! Light client of a Hyperledger Besu chain running QBFT consensus.
//!
//! A header is accepted when more than two thirds of the trusted validator
//! set and more than two thirds of the header's own validator set sealed its
//! commit hash. The consensus state then stores the storage root of the IBC
//! store contract, proven against the header's state root, so commitments can
//! be proven with storage proofs alone.

use alloy_primitives::{Address, Bytes, Signature, B256, U256};

use super::{
    error::{ClientError, ClientResult},
    header::{EthHeader, Header},
    proof,
    state::{ClientState, ConsensusState, Height},
};

pub const CLIENT_TYPE: &str = "hb-qbft";

const SEAL_LEN: usize = 65;

/// States produced by a successful update.
#[derive(Clone, Debug, PartialEq)]
pub struct UpdateOutput {
    pub prev_height: Height,
    pub height: Height,
    pub client_state: ClientState,
    pub consensus_state: ConsensusState,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct QbftLightClient;

impl QbftLightClient {
    pub fn client_type(&self) -> &'static str {
        CLIENT_TYPE
    }

    /// Checks the initial states and returns the height the client starts at.
    pub fn create_client(
        &self,
        client_state: &ClientState,
        consensus_state: &ConsensusState,
    ) -> ClientResult<Height> {
        client_state.validate()?;
        consensus_state.validate()?;
        debug!(
            "[QbftLightClient|create_client] Height: {}, validators: {}",
            client_state.latest_height,
            consensus_state.validators.len()
        );
        Ok(client_state.latest_height)
    }

    /// Verifies `header` against the consensus state at its trusted height.
    ///
    /// `now` is the host time in unix seconds.
    pub fn update_client(
        &self,
        client_state: &ClientState,
        trusted_consensus_state: &ConsensusState,
        header: &Header,
        now: u64,
    ) -> ClientResult<UpdateOutput> {
        if header.trusted_height.is_zero() {
            return Err(ClientError::ZeroTrustedHeight);
        }

        let eth_header = EthHeader::parse(&header.besu_header_rlp)?;
        let commit_hash = eth_header.commit_hash()?;
        verify_commit_seals_trusting(
            &trusted_consensus_state.validators,
            &header.seals,
            commit_hash,
        )?;
        verify_commit_seals_untrusting(&eth_header.extra.validators, &header.seals, commit_hash)?;

        let root = proof::verify_account_storage(
            eth_header.state_root,
            &client_state.ibc_store_address,
            &header.account_state_proof,
        )?;

        let height = Height::new(client_state.latest_height.revision_number, eth_header.number);
        let mut new_client_state = client_state.clone();
        if client_state.latest_height < height {
            new_client_state.latest_height = height;
        }
        let consensus_state = ConsensusState {
            timestamp: eth_header.timestamp,
            root,
            validators: eth_header.extra.validators,
        };

        if client_state.trusting_period != 0 {
            check_trusting_period(client_state, trusted_consensus_state, &consensus_state, now)?;
        }

        debug!(
            "[QbftLightClient|update_client] {} -> {}, commit hash: {}",
            header.trusted_height, height, commit_hash
        );
        Ok(UpdateOutput {
            prev_height: header.trusted_height,
            height,
            client_state: new_client_state,
            consensus_state,
        })
    }

    pub fn verify_membership(
        &self,
        consensus_state: &ConsensusState,
        path: &str,
        value: &[u8],
        proof: &[u8],
    ) -> ClientResult<()> {
        proof::verify_membership(consensus_state.root, path, value, proof)
    }

    pub fn verify_non_membership(
        &self,
        consensus_state: &ConsensusState,
        path: &str,
        proof: &[u8],
    ) -> ClientResult<()> {
        proof::verify_non_membership(consensus_state.root, path, proof)
    }
}

fn check_trusting_period(
    client_state: &ClientState,
    trusted: &ConsensusState,
    untrusted: &ConsensusState,
    now: u64,
) -> ClientResult<()> {
    let trusting_period_end = trusted
        .timestamp
        .saturating_add(client_state.trusting_period);
    if now >= trusting_period_end {
        return Err(ClientError::OutOfTrustingPeriod {
            now,
            trusting_period_end,
        });
    }
    if untrusted.timestamp > now.saturating_add(client_state.max_clock_drift) {
        return Err(ClientError::HeaderFromFuture {
            now,
            max_clock_drift: client_state.max_clock_drift,
            header_timestamp: untrusted.timestamp,
        });
    }
    Ok(())
}

fn has_quorum(signed: usize, validators: usize) -> bool {
    signed * 3 > validators * 2
}

/// Recovers the validator that produced a 65-byte `[r, s, v]` seal.
pub fn recover_seal_signer(commit_hash: B256, seal: &[u8]) -> ClientResult<Address> {
    if seal.len() != SEAL_LEN {
        return Err(ClientError::InvalidLength {
            field: "seal",
            len: seal.len(),
        });
    }
    let y_parity = match seal[64] {
        0 | 27 => false,
        1 | 28 => true,
        v => return Err(ClientError::SealRecoveryId(v)),
    };
    let signature = Signature::new(
        U256::from_be_slice(&seal[..32]),
        U256::from_be_slice(&seal[32..64]),
        y_parity,
    );
    Ok(signature.recover_address_from_prehash(&commit_hash)?)
}

/// Counts the distinct trusted validators among the seal signers. Seals may
/// come in any order; empty seals are skipped.
pub fn verify_commit_seals_trusting(
    trusted_validators: &[Address],
    seals: &[Bytes],
    commit_hash: B256,
) -> ClientResult<()> {
    let mut marked = vec![false; trusted_validators.len()];
    let mut signed = 0;
    for seal in seals.iter().filter(|seal| !seal.is_empty()) {
        let signer = recover_seal_signer(commit_hash, seal)?;
        if let Some(pos) = trusted_validators.iter().position(|v| *v == signer) {
            if !marked[pos] {
                marked[pos] = true;
                signed += 1;
            }
        }
    }

    if !has_quorum(signed, trusted_validators.len()) {
        return Err(ClientError::InsufficientTrustedSeals {
            signed,
            validators: trusted_validators.len(),
        });
    }
    Ok(())
}

/// Seal `i` must come from validator `i` of the header; empty seals are
/// skipped.
pub fn verify_commit_seals_untrusting(
    untrusted_validators: &[Address],
    seals: &[Bytes],
    commit_hash: B256,
) -> ClientResult<()> {
    if untrusted_validators.len() != seals.len() {
        return Err(ClientError::SealCountMismatch {
            seals: seals.len(),
            validators: untrusted_validators.len(),
        });
    }

    let mut signed = 0;
    for (validator, seal) in untrusted_validators.iter().zip(seals) {
        if seal.is_empty() {
            continue;
        }
        if recover_seal_signer(commit_hash, seal)? == *validator {
            signed += 1;
        }
    }

    if !has_quorum(signed, untrusted_validators.len()) {
        return Err(ClientError::InsufficientUntrustedSeals {
            signed,
            validators: untrusted_validators.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use alloy_primitives::keccak256;

    use super::*;
    use crate::mock;

    const NOW: u64 = mock::HEADER_TIMESTAMP + 1;

    fn update(
        client_state: &ClientState,
        trusted: &ConsensusState,
        header: &Header,
        now: u64,
    ) -> ClientResult<UpdateOutput> {
        QbftLightClient.update_client(client_state, trusted, header, now)
    }

    fn trusted() -> ConsensusState {
        mock::qbft_consensus_state(mock::HEADER_TIMESTAMP - 60)
    }

    #[test]
    fn create_client_checks_both_states() {
        let client = QbftLightClient;
        assert_eq!(client.client_type(), "hb-qbft");
        let height = client
            .create_client(&mock::qbft_client_state(), &trusted())
            .unwrap();
        assert_eq!(height, Height::new(0, 100));

        let mut consensus_state = trusted();
        consensus_state.root = B256::ZERO;
        assert!(matches!(
            client.create_client(&mock::qbft_client_state(), &consensus_state),
            Err(ClientError::ZeroRoot)
        ));
    }

    #[test]
    fn update_then_prove_commitment() {
        let header = mock::qbft_update(120, &mock::qbft_validators());
        let out = update(&mock::qbft_client_state(), &trusted(), &header, NOW).unwrap();

        assert_eq!(out.prev_height, Height::new(0, 100));
        assert_eq!(out.height, Height::new(0, 120));
        assert_eq!(out.client_state.latest_height, Height::new(0, 120));
        assert_eq!(out.consensus_state.timestamp, mock::HEADER_TIMESTAMP);
        assert_eq!(out.consensus_state.validators, mock::qbft_validator_addresses());

        let (storage_root, proof) = mock::commitment_proof(mock::COMMITMENT_PATH, mock::COMMITMENT);
        assert_eq!(out.consensus_state.root, storage_root);
        let client = QbftLightClient;
        client
            .verify_membership(&out.consensus_state, mock::COMMITMENT_PATH, mock::COMMITMENT, &proof)
            .unwrap();
        assert!(matches!(
            client.verify_non_membership(&out.consensus_state, mock::COMMITMENT_PATH, &proof),
            Err(ClientError::CommitmentExists(_))
        ));
    }

    #[test]
    fn older_header_keeps_latest_height() {
        let header = mock::qbft_update(50, &mock::qbft_validators());
        let out = update(&mock::qbft_client_state(), &trusted(), &header, NOW).unwrap();
        assert_eq!(out.height, Height::new(0, 50));
        assert_eq!(out.client_state.latest_height, Height::new(0, 100));
    }

    #[test]
    fn more_than_two_thirds_must_seal() {
        let mut header = mock::qbft_update(120, &mock::qbft_validators());
        header.seals[3] = Bytes::new();
        update(&mock::qbft_client_state(), &trusted(), &header, NOW).unwrap();

        header.seals[2] = Bytes::new();
        match update(&mock::qbft_client_state(), &trusted(), &header, NOW) {
            Err(ClientError::InsufficientTrustedSeals { signed, validators }) => {
                assert_eq!((signed, validators), (2, 4));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn duplicate_seals_count_once() {
        let mut header = mock::qbft_update(120, &mock::qbft_validators());
        header.seals[1] = header.seals[0].clone();
        header.seals[2] = header.seals[0].clone();
        assert!(matches!(
            verify_commit_seals_trusting(
                &mock::qbft_validator_addresses(),
                &header.seals[..3],
                EthHeader::parse(&header.besu_header_rlp).unwrap().commit_hash().unwrap(),
            ),
            Err(ClientError::InsufficientTrustedSeals { signed: 1, .. })
        ));
    }

    #[test]
    fn untrusted_seals_follow_validator_order() {
        let mut header = mock::qbft_update(120, &mock::qbft_validators());
        header.seals.reverse();
        assert!(matches!(
            update(&mock::qbft_client_state(), &trusted(), &header, NOW),
            Err(ClientError::InsufficientUntrustedSeals { signed: 0, validators: 4 })
        ));

        let mut header = mock::qbft_update(120, &mock::qbft_validators());
        header.seals.pop();
        assert!(matches!(
            update(&mock::qbft_client_state(), &trusted(), &header, NOW),
            Err(ClientError::SealCountMismatch { seals: 3, validators: 4 })
        ));
    }

    #[test]
    fn unknown_validator_set_is_not_trusted() {
        let header = mock::qbft_update(120, &mock::qbft_validators());
        let mut trusted = trusted();
        trusted.validators = (10..14u8).map(Address::repeat_byte).collect();
        assert!(matches!(
            update(&mock::qbft_client_state(), &trusted, &header, NOW),
            Err(ClientError::InsufficientTrustedSeals { signed: 0, .. })
        ));
    }

    #[test]
    fn header_must_not_carry_seals() {
        let mut header = mock::qbft_update(120, &mock::qbft_validators());
        let sealed = mock::besu_header(
            120,
            mock::HEADER_TIMESTAMP,
            keccak256(b"state"),
            &mock::qbft_validator_addresses(),
            0,
            &[vec![0u8; 65]],
        );
        header.besu_header_rlp = sealed.into();
        assert!(matches!(
            update(&mock::qbft_client_state(), &trusted(), &header, NOW),
            Err(ClientError::HeaderContainsSeals)
        ));
    }

    #[test]
    fn trusting_period_and_clock_drift() {
        let header = mock::qbft_update(120, &mock::qbft_validators());
        let client_state = mock::qbft_client_state();
        let trusted = trusted();

        let expired = trusted.timestamp + client_state.trusting_period;
        assert!(matches!(
            update(&client_state, &trusted, &header, expired),
            Err(ClientError::OutOfTrustingPeriod { .. })
        ));

        let early = mock::HEADER_TIMESTAMP - client_state.max_clock_drift - 1;
        assert!(matches!(
            update(&client_state, &trusted, &header, early),
            Err(ClientError::HeaderFromFuture { .. })
        ));
        let drifted = mock::HEADER_TIMESTAMP - client_state.max_clock_drift;
        update(&client_state, &trusted, &header, drifted).unwrap();

        let mut unbounded = client_state;
        unbounded.trusting_period = 0;
        update(&unbounded, &trusted, &header, u64::MAX).unwrap();
    }

    #[test]
    fn store_account_must_be_proven() {
        let header = mock::qbft_update(120, &mock::qbft_validators());
        let mut client_state = mock::qbft_client_state();
        client_state.ibc_store_address = Address::repeat_byte(0x42);
        assert!(matches!(
            update(&client_state, &trusted(), &header, NOW),
            Err(ClientError::AccountNotFound { .. })
        ));

        let mut header = header;
        header.trusted_height = Height::default();
        assert!(matches!(
            update(&mock::qbft_client_state(), &trusted(), &header, NOW),
            Err(ClientError::ZeroTrustedHeight)
        ));
    }

    #[test]
    fn malformed_seals_are_rejected() {
        let hash = keccak256(b"commit");
        assert!(matches!(
            recover_seal_signer(hash, &[0u8; 64]),
            Err(ClientError::InvalidLength { field: "seal", len: 64 })
        ));
        let mut seal = [1u8; 65];
        seal[64] = 5;
        assert!(matches!(
            recover_seal_signer(hash, &seal),
            Err(ClientError::SealRecoveryId(5))
        ));
    }
}
