// Copyright 2019-2020 ChainX Project Authors. Licensed under GPL-3.0.

use alloy_primitives::{Address, SignatureError, B256};

pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// Errors of the QBFT light client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("rlp decode error: {0}")]
    Rlp(#[from] alloy_rlp::Error),

    #[error("malformed rlp: {0}")]
    RlpShape(&'static str),

    #[error("invalid {field} length: {len}")]
    InvalidLength { field: &'static str, len: usize },

    #[error("invalid client state: latest height is zero")]
    ZeroHeight,

    #[error("invalid client state: ibc store address is zero")]
    ZeroIbcStoreAddress,

    #[error("invalid consensus state: root is zero")]
    ZeroRoot,

    #[error("invalid header: trusted height is zero")]
    ZeroTrustedHeight,

    #[error("besu header has {0} fields, expected at least 13")]
    HeaderFieldCount(usize),

    #[error("qbft extra data has {0} fields, expected 5")]
    HeaderExtraSize(usize),

    #[error("header extra data contains committed seals")]
    HeaderContainsSeals,

    #[error("invalid seal recovery id: {0}")]
    SealRecoveryId(u8),

    #[error("invalid seal signature: {0}")]
    Signature(#[from] SignatureError),

    #[error("{signed} of {validators} trusted validators signed the header")]
    InsufficientTrustedSeals { signed: usize, validators: usize },

    #[error("{signed} of {validators} header validators signed the header")]
    InsufficientUntrustedSeals { signed: usize, validators: usize },

    #[error("{seals} seals given for {validators} header validators")]
    SealCountMismatch { seals: usize, validators: usize },

    #[error("proof node does not match reference {0}")]
    ProofNodeMismatch(B256),

    #[error("proof ends before reaching the key")]
    ProofIncomplete,

    #[error("trie node has {0} items")]
    InvalidTrieNode(usize),

    #[error("account {address} not found under state root {root}")]
    AccountNotFound { root: B256, address: Address },

    #[error("commitment `{0}` not found")]
    CommitmentNotFound(String),

    #[error("commitment `{0}` does not match the value")]
    CommitmentMismatch(String),

    #[error("commitment `{0}` exists")]
    CommitmentExists(String),

    #[error("out of trusting period: now={now} trusting_period_end={trusting_period_end}")]
    OutOfTrustingPeriod { now: u64, trusting_period_end: u64 },

    #[error(
        "header is from the future: now={now} max_clock_drift={max_clock_drift}s header_timestamp={header_timestamp}"
    )]
    HeaderFromFuture {
        now: u64,
        max_clock_drift: u64,
        header_timestamp: u64,
    },
}
