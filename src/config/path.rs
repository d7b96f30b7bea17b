// Copyright 2019-2020 ChainX Project Authors. Licensed under GPL-3.0.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Characters allowed in IBC identifiers besides ASCII alphanumerics.
const IDENTIFIER_SYMBOLS: &[char] = &['.', '_', '+', '-', '#', '[', ']', '<', '>'];

const CLIENT_ID_LEN: (usize, usize) = (9, 64);
const CONNECTION_ID_LEN: (usize, usize) = (10, 64);
const CHANNEL_ID_LEN: (usize, usize) = (8, 64);
const PORT_ID_LEN: (usize, usize) = (2, 128);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Path {
    pub src: PathEnd,
    pub dst: PathEnd,
    #[serde(default)]
    pub strategy: Strategy,
}

/// One side of a relay path. Client, connection and channel ids stay empty
/// until the handshake on that chain has created them.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathEnd {
    pub chain_id: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub connection_id: String,
    #[serde(default)]
    pub channel_id: String,
    pub port_id: String,
    pub order: String,
    pub version: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Strategy {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub src_noack: bool,
    #[serde(default)]
    pub dst_noack: bool,
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy {
            kind: "naive".to_string(),
            src_noack: false,
            dst_noack: false,
        }
    }
}

impl Path {
    pub fn validate(&self, name: &str) -> Result<()> {
        let invalid = |reason: String| Error::InvalidPath {
            name: name.to_string(),
            reason,
        };
        self.src
            .validate()
            .map_err(|reason| invalid(format!("src: {}", reason)))?;
        self.dst
            .validate()
            .map_err(|reason| invalid(format!("dst: {}", reason)))?;
        if self.src.chain_id == self.dst.chain_id {
            return Err(invalid(format!(
                "src and dst refer to the same chain `{}`",
                self.src.chain_id
            )));
        }
        if self.strategy.kind != "naive" {
            return Err(invalid(format!(
                "unknown strategy `{}`",
                self.strategy.kind
            )));
        }
        Ok(())
    }

    /// `<chain>[<port>/<channel>] -> <chain>[<port>/<channel>]`
    pub fn summary(&self) -> String {
        format!("{} -> {}", self.src.summary(), self.dst.summary())
    }
}

impl PathEnd {
    fn validate(&self) -> std::result::Result<(), String> {
        if self.chain_id.is_empty() {
            return Err("chain_id is empty".to_string());
        }
        validate_optional_identifier("client_id", &self.client_id, CLIENT_ID_LEN)?;
        validate_optional_identifier("connection_id", &self.connection_id, CONNECTION_ID_LEN)?;
        validate_optional_identifier("channel_id", &self.channel_id, CHANNEL_ID_LEN)?;
        validate_identifier("port_id", &self.port_id, PORT_ID_LEN)?;
        match self.order.as_str() {
            "ordered" | "unordered" => {}
            order => return Err(format!("unknown channel order `{}`", order)),
        }
        if self.version.is_empty() {
            return Err("version is empty".to_string());
        }
        Ok(())
    }

    fn summary(&self) -> String {
        let channel = if self.channel_id.is_empty() {
            "-"
        } else {
            self.channel_id.as_str()
        };
        format!("{}[{}/{}]", self.chain_id, self.port_id, channel)
    }
}

fn validate_optional_identifier(
    field: &str,
    id: &str,
    bounds: (usize, usize),
) -> std::result::Result<(), String> {
    if id.is_empty() {
        return Ok(());
    }
    validate_identifier(field, id, bounds)
}

fn validate_identifier(
    field: &str,
    id: &str,
    (min, max): (usize, usize),
) -> std::result::Result<(), String> {
    if id.len() < min || id.len() > max {
        return Err(format!(
            "{} `{}` must be between {} and {} characters",
            field, id, min, max
        ));
    }
    if let Some(c) = id
        .chars()
        .find(|c| !c.is_ascii_alphanumeric() && !IDENTIFIER_SYMBOLS.contains(c))
    {
        return Err(format!("{} `{}` contains invalid character `{}`", field, id, c));
    }
    Ok(())
}
