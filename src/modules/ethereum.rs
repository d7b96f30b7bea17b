// Copyright 2019-2020 ChainX Project Authors. Licensed under GPL-3.0.

use std::{io::Write, time::Duration};

use alloy_primitives::Address;
use alloy_provider::{Provider, ProviderBuilder};
use anyhow::{bail, Context as _};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use structopt::{
    clap::{App, ArgMatches},
    StructOpt,
};
use tokio::time;
use url::Url;

use crate::{
    cmd::Context,
    error::{Error, Result},
    module::Module,
    modules::Fraction,
    registry::{Any, ChainConfig as ChainConfigT, InterfaceRegistry, TypeUrl},
};

pub const MODULE_NAME: &str = "ethereum";

const TX_TYPES: &[&str] = &["legacy", "dynamic", "auto"];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChainConfig {
    pub chain_id: String,
    pub eth_chain_id: u64,
    pub rpc_addr: String,
    pub signer: Any,
    pub ibc_address: String,
    #[serde(default)]
    pub initial_send_checkpoint: u64,
    #[serde(default)]
    pub initial_recv_checkpoint: u64,
    #[serde(default)]
    pub enable_debug_trace: bool,
    pub average_block_time_msec: u64,
    #[serde(default)]
    pub max_retry_for_inclusion: u64,
    pub gas_estimate_rate: Fraction,
    pub max_gas_limit: u64,
    pub tx_type: String,
}

impl TypeUrl for ChainConfig {
    const TYPE_URL: &'static str = "/relayer.chains.ethereum.config.ChainConfig";
}

impl ChainConfig {
    pub fn ibc_address(&self) -> Result<Address> {
        self.ibc_address.parse::<Address>().map_err(|err| Error::InvalidConfig {
            type_url: Self::TYPE_URL,
            reason: format!("ibc_address `{}`: {}", self.ibc_address, err),
        })
    }

    pub fn rpc_url(&self) -> Result<Url> {
        let url = Url::parse(&self.rpc_addr).map_err(|err| Error::InvalidConfig {
            type_url: Self::TYPE_URL,
            reason: format!("rpc_addr `{}`: {}", self.rpc_addr, err),
        })?;
        match url.scheme() {
            "http" | "https" | "ws" | "wss" => Ok(url),
            scheme => Err(Error::InvalidConfig {
                type_url: Self::TYPE_URL,
                reason: format!("rpc_addr has unsupported scheme `{}`", scheme),
            }),
        }
    }
}

impl ChainConfigT for ChainConfig {
    fn chain_id(&self) -> &str {
        &self.chain_id
    }

    fn validate(&self, registry: &InterfaceRegistry) -> Result<()> {
        let invalid = |reason: String| Error::InvalidConfig {
            type_url: Self::TYPE_URL,
            reason,
        };
        if self.chain_id.is_empty() {
            return Err(invalid("chain_id is empty".to_string()));
        }
        self.rpc_url()?;
        self.ibc_address()?;
        if self.average_block_time_msec == 0 {
            return Err(invalid("average_block_time_msec must be positive".to_string()));
        }
        let rate = &self.gas_estimate_rate;
        if rate.denominator == 0 || rate.numerator < rate.denominator {
            return Err(invalid(format!(
                "gas_estimate_rate {} must be at least 1",
                rate
            )));
        }
        if self.max_gas_limit == 0 {
            return Err(invalid("max_gas_limit must be positive".to_string()));
        }
        if !TX_TYPES.contains(&self.tx_type.as_str()) {
            return Err(invalid(format!(
                "tx_type `{}` is not one of {:?}",
                self.tx_type, TX_TYPES
            )));
        }
        registry.unpack_signer(&self.signer)?;
        Ok(())
    }
}

#[derive(Debug, StructOpt)]
#[structopt(name = "ethereum", about = "Ethereum chain utilities")]
enum EthereumCmd {
    /// Check that the node behind rpc_addr serves the configured chain
    Check { chain_id: String },
}

#[derive(Clone, Copy, Debug, Default)]
pub struct EthereumModule;

#[async_trait]
impl Module for EthereumModule {
    fn name(&self) -> &'static str {
        MODULE_NAME
    }

    fn register_interfaces(&self, registry: &mut InterfaceRegistry) -> Result<()> {
        registry.register_chain::<ChainConfig>(MODULE_NAME)
    }

    fn command(&self) -> Option<App<'static, 'static>> {
        Some(EthereumCmd::clap())
    }

    async fn run_command(
        &self,
        ctx: &Context<'_>,
        matches: &ArgMatches<'static>,
        out: &mut (dyn Write + Send),
    ) -> anyhow::Result<()> {
        match EthereumCmd::from_clap(matches) {
            EthereumCmd::Check { chain_id } => check(ctx, &chain_id, out).await,
        }
    }
}

async fn check(
    ctx: &Context<'_>,
    chain_id: &str,
    out: &mut (dyn Write + Send),
) -> anyhow::Result<()> {
    let config = ctx.load_config()?;
    let chain = config.chain(ctx.registry, chain_id)?;
    if chain.chain.type_url != ChainConfig::TYPE_URL {
        bail!(
            "chain `{}` is a `{}` chain, not an ethereum chain",
            chain_id,
            chain.chain.type_url
        );
    }
    let chain: ChainConfig = chain.chain.unpack()?;
    let url = chain.rpc_url()?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("check needs an http rpc_addr, got `{}`", url);
    }

    let timeout = Duration::from_secs(config.global.timeout);
    info!("[Ethereum|check] Connecting Ethereum node: {}", url);
    let provider = ProviderBuilder::new().connect_http(url.clone());
    let eth_chain_id = time::timeout(timeout, provider.get_chain_id())
        .await
        .with_context(|| format!("eth_chainId timed out after {:?}", timeout))??;
    let block_number = time::timeout(timeout, provider.get_block_number())
        .await
        .with_context(|| format!("eth_blockNumber timed out after {:?}", timeout))??;
    info!(
        "[Ethereum|check] Connected Ethereum node: {}, chain id: {}, latest block: #{}",
        url, eth_chain_id, block_number
    );

    if eth_chain_id != chain.eth_chain_id {
        bail!(
            "chain `{}` expects eth chain id {}, node at {} reports {}",
            chain_id,
            chain.eth_chain_id,
            url,
            eth_chain_id
        );
    }
    writeln!(
        out,
        "{}: eth chain id {}, latest block #{}",
        chain_id, eth_chain_id, block_number
    )?;
    Ok(())
}
