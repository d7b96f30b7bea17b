// Copyright 2019-2020 ChainX Project Authors. Licensed under GPL-3.0.

use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;

use crate::{
    config::{ChainProverConfig, Path, PathEnd, Strategy},
    modules::{
        ethereum, hd, lcp,
        qbft::{self, proof, ClientState, ConsensusState, Header, Height},
        Fraction,
    },
    registry::{Any, InterfaceRegistry},
};

/// Mnemonic of the default hardhat/anvil development accounts.
pub const DEV_MNEMONIC: &str = "test test test test test test test test test test test junk";
pub const HD_PATH: &str = "m/44'/60'/0'/0/0";
pub const IBC_ADDRESS: &str = "0xaa43d337145e8930d01cb4e60abf6595c692921e";
pub const COMMITMENT_PATH: &str = "commitments/ports/transfer/channels/channel-0/sequences/1";
pub const COMMITMENT: &[u8] = b"packet commitment";

/// Besu block #7528 of a four validator QBFT network, with committed seals.
pub const SEALED_HEADER: &str = "f9033fa00af93e70b1c6d3974a88a42eb70bb61adbd523bfac0c83027ba4637c52746a0fa01dcc4de8dec75d7aab85b567b6ccd41ad312451b948a7413f0a142fd40d4934794ee3353e587cfa91625a1adaef308a726de3803d3a0166ed98eea93ab2b6f6b1a425526994adc2d675bf9a0d77d600ed1e02d8f77dfa056e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421a056e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421b901000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000001821d688347b76080846640618bb90147f90144a00000000000000000000000000000000000000000000000000000000000000000f85494647bfdd19655e51e69d35454ff3a92f8828e630294a5c8416b9d13417b45b45ada76408f39d1e504ef94b92e91f4dcc9d28503be521afa2a8fbf3c1acf6094ee3353e587cfa91625a1adaef308a726de3803d3c001f8c9b841bc7633fd65570f610a595086e9a34e5bf6aacfb67b8f8cd01852e6b285147f046a50577b49378b86723ac9b456ef59ef7ab57cda7139d807f10f58e8cb10c67600b841ad1defc2b0b4a48158cff24778bb5ba4d9f373c171022ab0a42e37bdb0d4025718434d303a8d94df56ef9ad5219be9f27b2f67179a7fb82d3323dde29546f9f701b841e233d3670dd97c715f72b440eeb1ccb1e22c8c23f6ab470c46c99c2d0ee6509f0341a42e0e4569782557e93c3815e8ca4294043595f69a90f73f135de8ecf41e00a063746963616c2062797a616e74696e65206661756c7420746f6c6572616e6365880000000000000000";
/// The same block with the committed seals stripped.
pub const COMMIT_HEADER: &str = "f90273a00af93e70b1c6d3974a88a42eb70bb61adbd523bfac0c83027ba4637c52746a0fa01dcc4de8dec75d7aab85b567b6ccd41ad312451b948a7413f0a142fd40d4934794ee3353e587cfa91625a1adaef308a726de3803d3a0166ed98eea93ab2b6f6b1a425526994adc2d675bf9a0d77d600ed1e02d8f77dfa056e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421a056e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421b901000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000001821d688347b76080846640618bb87cf87aa00000000000000000000000000000000000000000000000000000000000000000f85494647bfdd19655e51e69d35454ff3a92f8828e630294a5c8416b9d13417b45b45ada76408f39d1e504ef94b92e91f4dcc9d28503be521afa2a8fbf3c1acf6094ee3353e587cfa91625a1adaef308a726de3803d3c001c0a063746963616c2062797a616e74696e65206661756c7420746f6c6572616e6365880000000000000000";
pub const HEADER_TIMESTAMP: u64 = 1_715_495_307;
pub const MRENCLAVE: &str = "abababababababababababababababababababababababababababababababab";

pub fn registry() -> InterfaceRegistry {
    let mut registry = InterfaceRegistry::new();
    for module in crate::modules() {
        module.register_interfaces(&mut registry).unwrap();
    }
    registry
}

pub fn hd_signer() -> hd::SignerConfig {
    hd::SignerConfig {
        mnemonic: DEV_MNEMONIC.to_string(),
        path: HD_PATH.to_string(),
    }
}

pub fn qbft_prover() -> qbft::ProverConfig {
    qbft::ProverConfig {
        trusting_period: 14 * 24 * 60 * 60,
        max_clock_drift: 10,
        refresh_threshold_rate: Fraction {
            numerator: 1,
            denominator: 2,
        },
    }
}

pub fn lcp_prover() -> lcp::ProverConfig {
    lcp::ProverConfig {
        origin_prover: Any::pack(&qbft_prover()).unwrap(),
        lcp_service_address: "localhost:50051".to_string(),
        mrenclave: MRENCLAVE.to_string(),
        allowed_quote_statuses: vec!["SW_HARDENING_NEEDED".to_string()],
        allowed_advisory_ids: vec!["INTEL-SA-00219".to_string()],
        key_expiration: 60 * 60 * 24 * 7,
        elc_client_id: String::new(),
        message_aggregation: false,
        message_aggregation_batch_size: 0,
        is_debug_enclave: true,
    }
}

pub fn ethereum_chain(chain_id: &str, eth_chain_id: u64) -> ethereum::ChainConfig {
    ethereum::ChainConfig {
        chain_id: chain_id.to_string(),
        eth_chain_id,
        rpc_addr: "http://127.0.0.1:8545".to_string(),
        signer: Any::pack(&hd_signer()).unwrap(),
        ibc_address: IBC_ADDRESS.to_string(),
        initial_send_checkpoint: 1,
        initial_recv_checkpoint: 1,
        enable_debug_trace: false,
        average_block_time_msec: 2000,
        max_retry_for_inclusion: 3,
        gas_estimate_rate: Fraction {
            numerator: 3,
            denominator: 2,
        },
        max_gas_limit: 10_000_000,
        tx_type: "auto".to_string(),
    }
}

pub fn chain(chain_id: &str, eth_chain_id: u64) -> ChainProverConfig {
    ChainProverConfig {
        chain: Any::pack(&ethereum_chain(chain_id, eth_chain_id)).unwrap(),
        prover: Any::pack(&qbft_prover()).unwrap(),
    }
}

pub fn lcp_chain(chain_id: &str, eth_chain_id: u64) -> ChainProverConfig {
    ChainProverConfig {
        chain: Any::pack(&ethereum_chain(chain_id, eth_chain_id)).unwrap(),
        prover: Any::pack(&lcp_prover()).unwrap(),
    }
}

fn path_end(chain_id: &str) -> PathEnd {
    PathEnd {
        chain_id: chain_id.to_string(),
        client_id: "lcp-client-0".to_string(),
        connection_id: "connection-0".to_string(),
        channel_id: "channel-0".to_string(),
        port_id: "transfer".to_string(),
        order: "unordered".to_string(),
        version: "ics20-1".to_string(),
    }
}

/// `ibc0` -> `ibc1` over an ICS-20 channel.
pub fn path() -> Path {
    Path {
        src: path_end("ibc0"),
        dst: path_end("ibc1"),
        strategy: Strategy::default(),
    }
}

pub fn ibc_address() -> Address {
    IBC_ADDRESS.parse().unwrap()
}

pub fn rlp_bytes(bytes: &[u8]) -> Vec<u8> {
    alloy_rlp::encode(bytes)
}

pub fn rlp_uint(value: u64) -> Vec<u8> {
    alloy_rlp::encode(value)
}

pub fn rlp_list(items: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::new();
    alloy_rlp::Header {
        list: true,
        payload_length: items.iter().map(Vec::len).sum(),
    }
    .encode(&mut out);
    for item in items {
        out.extend_from_slice(item);
    }
    out
}

fn key_nibbles(key: &[u8]) -> Vec<u8> {
    key.iter().flat_map(|byte| vec![byte >> 4, byte & 0x0f]).collect()
}

/// Hex-prefix encoding of a trie path.
pub fn hex_prefix(nibbles: &[u8], leaf: bool) -> Vec<u8> {
    let flag = if leaf { 2 } else { 0 };
    let mut out = Vec::new();
    let rest = if nibbles.len() % 2 == 1 {
        out.push(((flag + 1) << 4) | nibbles[0]);
        &nibbles[1..]
    } else {
        out.push(flag << 4);
        nibbles
    };
    for pair in rest.chunks(2) {
        out.push((pair[0] << 4) | pair[1]);
    }
    out
}

pub fn trie_leaf(nibbles: &[u8], value: &[u8]) -> Vec<u8> {
    rlp_list(&[rlp_bytes(&hex_prefix(nibbles, true)), rlp_bytes(value)])
}

/// A state trie holding only `address`, and the proof of that account.
pub fn account_proof(address: Address, storage_root: B256) -> (B256, Vec<u8>) {
    let account = rlp_list(&[
        rlp_uint(1),
        rlp_uint(0),
        rlp_bytes(storage_root.as_slice()),
        rlp_bytes(keccak256(b"").as_slice()),
    ]);
    let leaf = trie_leaf(&key_nibbles(keccak256(address).as_slice()), &account);
    (keccak256(&leaf), rlp_list(&[leaf]))
}

/// A storage trie holding only the commitment of `path`, and its proof.
pub fn commitment_proof(path: &str, value: &[u8]) -> (B256, Vec<u8>) {
    let key = keccak256(proof::commitment_storage_key(path.as_bytes()));
    let leaf = trie_leaf(&key_nibbles(key.as_slice()), &proof::commitment_value(value));
    (keccak256(&leaf), rlp_list(&[leaf]))
}

/// RLP of a Besu header with QBFT extra data.
pub fn besu_header(
    number: u64,
    timestamp: u64,
    state_root: B256,
    validators: &[Address],
    round: u32,
    seals: &[Vec<u8>],
) -> Vec<u8> {
    let extra = rlp_list(&[
        rlp_bytes(&[0u8; 32]),
        rlp_list(
            &validators
                .iter()
                .map(|validator| rlp_bytes(validator.as_slice()))
                .collect::<Vec<_>>(),
        ),
        rlp_list(&[]),
        rlp_uint(u64::from(round)),
        rlp_list(&seals.iter().map(|seal| rlp_bytes(seal)).collect::<Vec<_>>()),
    ]);
    rlp_list(&[
        rlp_bytes(&[0u8; 32]),
        rlp_bytes(keccak256([0xc0u8]).as_slice()),
        rlp_bytes(&[0u8; 20]),
        rlp_bytes(state_root.as_slice()),
        rlp_bytes(proof::EMPTY_ROOT.as_slice()),
        rlp_bytes(proof::EMPTY_ROOT.as_slice()),
        rlp_bytes(&[0u8; 256]),
        rlp_uint(1),
        rlp_uint(number),
        rlp_uint(30_000_000),
        rlp_uint(0),
        rlp_uint(timestamp),
        rlp_bytes(&extra),
        rlp_bytes(&[0u8; 32]),
        rlp_bytes(&[0u8; 8]),
    ])
}

pub fn qbft_validators() -> Vec<PrivateKeySigner> {
    (1..=4u8)
        .map(|i| PrivateKeySigner::from_bytes(&B256::repeat_byte(i)).unwrap())
        .collect()
}

pub fn qbft_validator_addresses() -> Vec<Address> {
    qbft_validators().iter().map(|signer| signer.address()).collect()
}

pub fn qbft_client_state() -> ClientState {
    ClientState {
        chain_id: U256::from(2018u64),
        ibc_store_address: ibc_address(),
        latest_height: Height::new(0, 100),
        trusting_period: 14 * 24 * 60 * 60,
        max_clock_drift: 10,
    }
}

pub fn qbft_consensus_state(timestamp: u64) -> ConsensusState {
    ConsensusState {
        timestamp,
        root: keccak256(b"trusted storage"),
        validators: qbft_validator_addresses(),
    }
}

/// Header #`number` at `HEADER_TIMESTAMP` from height 0-100, sealed by
/// `signers` in validator order. The account proof makes the commitment of
/// `COMMITMENT_PATH` provable under the new consensus state.
pub fn qbft_update(number: u64, signers: &[PrivateKeySigner]) -> Header {
    let (storage_root, _) = commitment_proof(COMMITMENT_PATH, COMMITMENT);
    let (state_root, account_state_proof) = account_proof(ibc_address(), storage_root);
    let besu_header_rlp = besu_header(
        number,
        HEADER_TIMESTAMP,
        state_root,
        &qbft_validator_addresses(),
        0,
        &[],
    );
    let commit_hash = keccak256(&besu_header_rlp);
    let seals = signers
        .iter()
        .map(|signer| {
            let signature = signer.sign_hash_sync(&commit_hash).unwrap();
            Bytes::from(signature.as_bytes().to_vec())
        })
        .collect();
    Header {
        besu_header_rlp: besu_header_rlp.into(),
        seals,
        trusted_height: Height::new(0, 100),
        account_state_proof: account_state_proof.into(),
    }
}
