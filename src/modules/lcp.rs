// Copyright 2019-2020 ChainX Project Authors. Licensed under GPL-3.0.

//! Light Client Proxy prover. It wraps the chain's origin prover and has an
//! SGX enclave (identified by its MRENCLAVE) verify the origin prover's
//! messages before they are submitted to the counterparty.

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    module::Module,
    registry::{Any, InterfaceRegistry, ProverConfig as ProverConfigT, TypeUrl},
};

pub const MODULE_NAME: &str = "lcp";

const MRENCLAVE_LEN: usize = 32;
const MIN_AGGREGATION_BATCH_SIZE: u64 = 2;

/// `OK` is always accepted and never needs to be listed.
const QUOTE_STATUSES: &[&str] = &[
    "OK",
    "GROUP_OUT_OF_DATE",
    "CONFIGURATION_NEEDED",
    "SW_HARDENING_NEEDED",
    "CONFIGURATION_AND_SW_HARDENING_NEEDED",
];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProverConfig {
    pub origin_prover: Any,
    pub lcp_service_address: String,
    pub mrenclave: String,
    #[serde(default)]
    pub allowed_quote_statuses: Vec<String>,
    #[serde(default)]
    pub allowed_advisory_ids: Vec<String>,
    /// Seconds.
    pub key_expiration: u64,
    #[serde(default)]
    pub elc_client_id: String,
    #[serde(default)]
    pub message_aggregation: bool,
    #[serde(default)]
    pub message_aggregation_batch_size: u64,
    #[serde(default)]
    pub is_debug_enclave: bool,
}

impl TypeUrl for ProverConfig {
    const TYPE_URL: &'static str = "/relayer.provers.lcp.config.ProverConfig";
}

impl ProverConfig {
    pub fn mrenclave(&self) -> Result<[u8; MRENCLAVE_LEN]> {
        let raw = self.mrenclave.trim_start_matches("0x");
        let bytes = hex::decode(raw).map_err(|err| Error::InvalidConfig {
            type_url: Self::TYPE_URL,
            reason: format!("mrenclave `{}`: {}", self.mrenclave, err),
        })?;
        if bytes.len() != MRENCLAVE_LEN {
            return Err(Error::InvalidConfig {
                type_url: Self::TYPE_URL,
                reason: format!(
                    "mrenclave must be {} bytes, got {}",
                    MRENCLAVE_LEN,
                    bytes.len()
                ),
            });
        }
        let mut mrenclave = [0u8; MRENCLAVE_LEN];
        mrenclave.copy_from_slice(&bytes);
        Ok(mrenclave)
    }
}

impl ProverConfigT for ProverConfig {
    fn validate(&self, registry: &InterfaceRegistry) -> Result<()> {
        let invalid = |reason: String| Error::InvalidConfig {
            type_url: Self::TYPE_URL,
            reason,
        };
        if self.origin_prover.type_url == Self::TYPE_URL {
            return Err(invalid("origin_prover cannot be another lcp prover".to_string()));
        }
        registry.unpack_prover(&self.origin_prover)?;

        match self.lcp_service_address.rsplit_once(':') {
            Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => {}
            _ => {
                return Err(invalid(format!(
                    "lcp_service_address `{}` is not host:port",
                    self.lcp_service_address
                )))
            }
        }
        self.mrenclave()?;
        if let Some(status) = self
            .allowed_quote_statuses
            .iter()
            .find(|status| !QUOTE_STATUSES.contains(&status.as_str()))
        {
            return Err(invalid(format!("unknown quote status `{}`", status)));
        }
        if self.key_expiration == 0 {
            return Err(invalid("key_expiration must be positive".to_string()));
        }
        if self.message_aggregation
            && self.message_aggregation_batch_size < MIN_AGGREGATION_BATCH_SIZE
        {
            return Err(invalid(format!(
                "message_aggregation_batch_size must be at least {}",
                MIN_AGGREGATION_BATCH_SIZE
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct LcpModule;

impl Module for LcpModule {
    fn name(&self) -> &'static str {
        MODULE_NAME
    }

    fn register_interfaces(&self, registry: &mut InterfaceRegistry) -> Result<()> {
        registry.register_prover::<ProverConfig>(MODULE_NAME)
    }
}
