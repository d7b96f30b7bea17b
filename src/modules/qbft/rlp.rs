// Copyright 2019-2020 ChainX Project Authors. Licensed under GPL-3.0.

//! Borrowing accessors over raw RLP items.

use alloy_rlp::{Decodable, Header};

use super::error::{ClientError, ClientResult};

/// Splits an RLP list into the raw encodings of its items.
pub fn list_items(buf: &[u8]) -> ClientResult<Vec<&[u8]>> {
    let mut payload = buf;
    let header = Header::decode(&mut payload)?;
    if !header.list {
        return Err(ClientError::RlpShape("expected a list"));
    }
    if payload.len() != header.payload_length {
        return Err(ClientError::RlpShape("trailing bytes after list"));
    }

    let mut items = Vec::new();
    while !payload.is_empty() {
        let (item, rest) = split_item(payload)?;
        items.push(item);
        payload = rest;
    }
    Ok(items)
}

/// Payload of an RLP string item.
pub fn bytes(item: &[u8]) -> ClientResult<&[u8]> {
    let mut payload = item;
    let header = Header::decode(&mut payload)?;
    if header.list {
        return Err(ClientError::RlpShape("expected a string"));
    }
    Ok(&payload[..header.payload_length])
}

pub fn decode<T: Decodable>(item: &[u8]) -> ClientResult<T> {
    let mut buf = item;
    Ok(T::decode(&mut buf)?)
}

pub fn is_list(item: &[u8]) -> bool {
    item.first().map_or(false, |byte| *byte >= alloy_rlp::EMPTY_LIST_CODE)
}

fn split_item(buf: &[u8]) -> ClientResult<(&[u8], &[u8])> {
    let mut payload = buf;
    let header = Header::decode(&mut payload)?;
    // `Header::decode` checks that the payload is present
    let len = buf.len() - payload.len() + header.payload_length;
    Ok(buf.split_at(len))
}
