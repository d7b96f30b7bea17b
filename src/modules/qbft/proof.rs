// Copyright 2019-2020 ChainX Project Authors. Licensed under GPL-3.0.

//! EIP-1186 Merkle Patricia proofs over the IBC store contract.

use alloy_primitives::{b256, keccak256, Address, B256};

use super::{
    error::{ClientError, ClientResult},
    rlp,
};

/// Base slot of the commitments mapping in the IBC store contract.
pub const COMMITMENT_SLOT: B256 =
    b256!("1ee222554989dda120e26ecacf756fe1235cd8d726706b57517715dde4f0c900");

/// Root of an empty trie, `keccak256(rlp(""))`.
pub const EMPTY_ROOT: B256 =
    b256!("56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421");

const ACCOUNT_FIELDS: usize = 4;
const ACCOUNT_STORAGE_ROOT_INDEX: usize = 2;

/// Storage slot holding the commitment of an IBC path.
pub fn commitment_storage_key(path: &[u8]) -> B256 {
    keccak256([keccak256(path).as_slice(), COMMITMENT_SLOT.as_slice()].concat())
}

/// Storage trie value of a commitment: the RLP of `keccak256(value)` as an
/// integer.
pub fn commitment_value(value: &[u8]) -> Vec<u8> {
    let hash = keccak256(value);
    let start = hash
        .iter()
        .position(|byte| *byte != 0)
        .unwrap_or(hash.len());
    alloy_rlp::encode(&hash[start..])
}

/// Splits an RLP list of trie nodes.
pub fn decode_proof(proof: &[u8]) -> ClientResult<Vec<&[u8]>> {
    let nodes = rlp::list_items(proof)?;
    if nodes.iter().any(|node| !rlp::is_list(node)) {
        return Err(ClientError::RlpShape("proof node is not a list"));
    }
    Ok(nodes)
}

#[derive(Clone, Copy)]
enum NodeRef<'a> {
    Hash(B256),
    Inline(&'a [u8]),
}

fn child_ref(item: &[u8]) -> ClientResult<Option<NodeRef<'_>>> {
    if rlp::is_list(item) {
        return Ok(Some(NodeRef::Inline(item)));
    }
    match rlp::bytes(item)? {
        [] => Ok(None),
        hash if hash.len() == 32 => Ok(Some(NodeRef::Hash(B256::from_slice(hash)))),
        other => Err(ClientError::InvalidLength {
            field: "trie node reference",
            len: other.len(),
        }),
    }
}

fn nibbles(key: &[u8]) -> Vec<u8> {
    let mut nibbles = Vec::with_capacity(key.len() * 2);
    for byte in key {
        nibbles.push(byte >> 4);
        nibbles.push(byte & 0x0f);
    }
    nibbles
}

/// Decodes a hex-prefix encoded path into nibbles and the leaf flag.
fn decode_path(encoded: &[u8]) -> ClientResult<(Vec<u8>, bool)> {
    let (first, rest) = encoded
        .split_first()
        .ok_or(ClientError::RlpShape("empty trie node path"))?;
    let flag = first >> 4;
    if flag > 3 {
        return Err(ClientError::RlpShape("invalid trie node path flag"));
    }

    let mut path = Vec::with_capacity(rest.len() * 2 + 1);
    if flag & 1 == 1 {
        path.push(first & 0x0f);
    }
    path.extend(nibbles(rest));
    Ok((path, flag & 2 == 2))
}

/// Walks `proof` from `root` along `key` and returns the value stored under
/// `key`, or `None` when the proof shows that `key` is absent.
pub fn get_value(root: B256, key: &[u8], proof: &[&[u8]]) -> ClientResult<Option<Vec<u8>>> {
    let key = nibbles(key);
    let mut remaining = key.as_slice();
    let mut nodes = proof.iter();
    let mut next = NodeRef::Hash(root);

    loop {
        let node: &[u8] = match next {
            NodeRef::Hash(hash) => match nodes.next() {
                Some(node) if keccak256(node) == hash => *node,
                Some(_) => return Err(ClientError::ProofNodeMismatch(hash)),
                None if hash == EMPTY_ROOT => return Ok(None),
                None => return Err(ClientError::ProofIncomplete),
            },
            NodeRef::Inline(node) => node,
        };

        let items = rlp::list_items(node)?;
        match items.len() {
            17 => match remaining.split_first() {
                None => {
                    let value = rlp::bytes(items[16])?;
                    return Ok(if value.is_empty() {
                        None
                    } else {
                        Some(value.to_vec())
                    });
                }
                Some((nibble, rest)) => {
                    remaining = rest;
                    next = match child_ref(items[*nibble as usize])? {
                        Some(child) => child,
                        None => return Ok(None),
                    };
                }
            },
            2 => {
                let (path, is_leaf) = decode_path(rlp::bytes(items[0])?)?;
                if is_leaf {
                    return Ok(if path.as_slice() == remaining {
                        Some(rlp::bytes(items[1])?.to_vec())
                    } else {
                        None
                    });
                }
                if !remaining.starts_with(&path) {
                    return Ok(None);
                }
                remaining = &remaining[path.len()..];
                next = child_ref(items[1])?
                    .ok_or(ClientError::RlpShape("extension node without child"))?;
            }
            len => return Err(ClientError::InvalidTrieNode(len)),
        }
    }
}

/// Proves the account at `address` under `state_root` and returns its
/// storage root.
pub fn verify_account_storage(
    state_root: B256,
    address: &Address,
    proof: &[u8],
) -> ClientResult<B256> {
    let proof = decode_proof(proof)?;
    let account = get_value(state_root, keccak256(address).as_slice(), &proof)?.ok_or(
        ClientError::AccountNotFound {
            root: state_root,
            address: *address,
        },
    )?;

    let fields = rlp::list_items(&account)?;
    if fields.len() != ACCOUNT_FIELDS {
        return Err(ClientError::RlpShape(
            "account is not [nonce, balance, storage_root, code_hash]",
        ));
    }
    let storage_root = rlp::bytes(fields[ACCOUNT_STORAGE_ROOT_INDEX])?;
    if storage_root.len() != 32 {
        return Err(ClientError::InvalidLength {
            field: "account storage root",
            len: storage_root.len(),
        });
    }
    Ok(B256::from_slice(storage_root))
}

/// Proves that the commitment of `path` under `root` is `keccak256(value)`.
pub fn verify_membership(root: B256, path: &str, value: &[u8], proof: &[u8]) -> ClientResult<()> {
    let key = keccak256(commitment_storage_key(path.as_bytes()));
    match get_value(root, key.as_slice(), &decode_proof(proof)?)? {
        Some(stored) if stored == commitment_value(value) => Ok(()),
        Some(_) => Err(ClientError::CommitmentMismatch(path.to_string())),
        None => Err(ClientError::CommitmentNotFound(path.to_string())),
    }
}

/// Proves that no commitment of `path` exists under `root`.
pub fn verify_non_membership(root: B256, path: &str, proof: &[u8]) -> ClientResult<()> {
    let key = keccak256(commitment_storage_key(path.as_bytes()));
    match get_value(root, key.as_slice(), &decode_proof(proof)?)? {
        Some(_) => Err(ClientError::CommitmentExists(path.to_string())),
        None => Ok(()),
    }
}
