// Copyright 2019-2020 ChainX Project Authors. Licensed under GPL-3.0.

use std::fmt;

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

use super::error::{ClientError, ClientResult};
use crate::registry::TypeUrl;

#[derive(
    Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
pub struct Height {
    pub revision_number: u64,
    pub revision_height: u64,
}

impl Height {
    pub fn new(revision_number: u64, revision_height: u64) -> Self {
        Self {
            revision_number,
            revision_height,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.revision_number == 0 && self.revision_height == 0
    }
}

impl fmt::Display for Height {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.revision_number, self.revision_height)
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ClientState {
    pub chain_id: U256,
    /// Address of the IBC handler contract whose storage holds the commitments.
    pub ibc_store_address: Address,
    pub latest_height: Height,
    /// Seconds. Zero disables the trusting period check.
    pub trusting_period: u64,
    /// Seconds.
    pub max_clock_drift: u64,
}

impl TypeUrl for ClientState {
    const TYPE_URL: &'static str = "/ibc.lightclients.qbft.v1.ClientState";
}

impl ClientState {
    pub fn validate(&self) -> ClientResult<()> {
        if self.latest_height.is_zero() {
            return Err(ClientError::ZeroHeight);
        }
        if self.ibc_store_address == Address::ZERO {
            return Err(ClientError::ZeroIbcStoreAddress);
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ConsensusState {
    /// Unix seconds of the block.
    pub timestamp: u64,
    /// Storage root of the IBC store account.
    pub root: B256,
    pub validators: Vec<Address>,
}

impl TypeUrl for ConsensusState {
    const TYPE_URL: &'static str = "/ibc.lightclients.qbft.v1.ConsensusState";
}

impl ConsensusState {
    pub fn validate(&self) -> ClientResult<()> {
        if self.root == B256::ZERO {
            return Err(ClientError::ZeroRoot);
        }
        Ok(())
    }
}
