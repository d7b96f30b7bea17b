// Copyright 2019-2020 ChainX Project Authors. Licensed under GPL-3.0.

//! Besu block headers carrying QBFT extra data.

use alloy_primitives::{keccak256, Address, Bytes, B256};
use serde::{Deserialize, Serialize};

use super::{
    error::{ClientError, ClientResult},
    rlp,
    state::Height,
};
use crate::registry::TypeUrl;

const STATE_ROOT_INDEX: usize = 3;
const NUMBER_INDEX: usize = 8;
const TIMESTAMP_INDEX: usize = 11;
const EXTRA_INDEX: usize = 12;

const ADDRESS_LEN: usize = 20;
const HASH_LEN: usize = 32;

/// The fields of a Besu header the light client needs.
#[derive(Clone, Debug, PartialEq)]
pub struct EthHeader {
    rlp: Bytes,
    pub state_root: B256,
    pub number: u64,
    pub timestamp: u64,
    pub extra: QbftExtra,
}

/// `RLP([vanity, [validators], vote, round, [committed_seals]])`
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QbftExtra {
    pub vanity_data: Bytes,
    pub validators: Vec<Address>,
    /// Raw RLP of the vote.
    pub vote: Bytes,
    pub round: u32,
    pub committed_seals: Vec<Bytes>,
}

impl QbftExtra {
    pub fn decode(extra: &[u8]) -> ClientResult<Self> {
        let items = rlp::list_items(extra)?;
        if items.len() != 5 {
            return Err(ClientError::HeaderExtraSize(items.len()));
        }

        let validators = rlp::list_items(items[1])?
            .into_iter()
            .map(|item| {
                let address = rlp::bytes(item)?;
                if address.len() != ADDRESS_LEN {
                    return Err(ClientError::InvalidLength {
                        field: "validator address",
                        len: address.len(),
                    });
                }
                Ok(Address::from_slice(address))
            })
            .collect::<ClientResult<Vec<_>>>()?;
        let committed_seals = rlp::list_items(items[4])?
            .into_iter()
            .map(|item| Ok(Bytes::copy_from_slice(rlp::bytes(item)?)))
            .collect::<ClientResult<Vec<_>>>()?;

        Ok(Self {
            vanity_data: Bytes::copy_from_slice(rlp::bytes(items[0])?),
            validators,
            vote: Bytes::copy_from_slice(items[2]),
            round: rlp::decode(items[3])?,
            committed_seals,
        })
    }
}

impl EthHeader {
    pub fn parse(header_rlp: &[u8]) -> ClientResult<Self> {
        let items = rlp::list_items(header_rlp)?;
        if items.len() <= EXTRA_INDEX {
            return Err(ClientError::HeaderFieldCount(items.len()));
        }

        let state_root = rlp::bytes(items[STATE_ROOT_INDEX])?;
        if state_root.len() != HASH_LEN {
            return Err(ClientError::InvalidLength {
                field: "state root",
                len: state_root.len(),
            });
        }

        Ok(Self {
            rlp: Bytes::copy_from_slice(header_rlp),
            state_root: B256::from_slice(state_root),
            number: rlp::decode(items[NUMBER_INDEX])?,
            timestamp: rlp::decode(items[TIMESTAMP_INDEX])?,
            extra: QbftExtra::decode(rlp::bytes(items[EXTRA_INDEX])?)?,
        })
    }

    /// Hash the validators seal: the header hash with the committed seals
    /// stripped from the extra data and the round kept.
    pub fn commit_hash(&self) -> ClientResult<B256> {
        if !self.extra.committed_seals.is_empty() {
            return Err(ClientError::HeaderContainsSeals);
        }
        Ok(keccak256(&self.rlp))
    }
}

/// Client message updating a QBFT client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Header {
    /// Header RLP without committed seals.
    pub besu_header_rlp: Bytes,
    /// Committed seals, in the order of the header's validators.
    pub seals: Vec<Bytes>,
    pub trusted_height: Height,
    /// EIP-1186 proof of the IBC store account.
    pub account_state_proof: Bytes,
}

impl TypeUrl for Header {
    const TYPE_URL: &'static str = "/ibc.lightclients.qbft.v1.Header";
}
