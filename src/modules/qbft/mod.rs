// Copyright 2019-2020 ChainX Project Authors. Licensed under GPL-3.0.

//! Hyperledger Besu QBFT: the prover config and the light client that
//! verifies the headers it produces.

pub mod client;
pub mod error;
pub mod header;
pub mod proof;
mod rlp;
pub mod state;

use std::{convert::TryFrom, io::Write};

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use structopt::{
    clap::{App, ArgMatches},
    StructOpt,
};

pub use self::client::{QbftLightClient, UpdateOutput, CLIENT_TYPE};
pub use self::error::{ClientError, ClientResult};
pub use self::header::{EthHeader, Header, QbftExtra};
pub use self::state::{ClientState, ConsensusState, Height};

use crate::{
    cmd::Context,
    error::{Error, Result},
    module::Module,
    modules::Fraction,
    registry::{InterfaceRegistry, ProverConfig as ProverConfigT, TypeUrl},
};

pub const MODULE_NAME: &str = "qbft";

/// Prover for a Hyperledger Besu chain running QBFT consensus.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProverConfig {
    /// Seconds.
    pub trusting_period: u64,
    /// Seconds.
    #[serde(default)]
    pub max_clock_drift: u64,
    /// Fraction of the trusting period after which the client gets refreshed.
    pub refresh_threshold_rate: Fraction,
}

impl TypeUrl for ProverConfig {
    const TYPE_URL: &'static str = "/relayer.provers.qbft.config.ProverConfig";
}

impl ProverConfigT for ProverConfig {
    fn validate(&self, _registry: &InterfaceRegistry) -> Result<()> {
        let invalid = |reason: String| Error::InvalidConfig {
            type_url: Self::TYPE_URL,
            reason,
        };
        if self.trusting_period == 0 {
            return Err(invalid("trusting_period must be positive".to_string()));
        }
        if self.max_clock_drift >= self.trusting_period {
            return Err(invalid(format!(
                "max_clock_drift ({}s) must be less than trusting_period ({}s)",
                self.max_clock_drift, self.trusting_period
            )));
        }
        let rate = &self.refresh_threshold_rate;
        if rate.denominator == 0 || rate.numerator == 0 || rate.numerator > rate.denominator {
            return Err(invalid(format!(
                "refresh_threshold_rate {} must be in (0, 1]",
                rate
            )));
        }
        Ok(())
    }
}

impl ProverConfig {
    /// Seconds after the last update at which the client should be refreshed.
    pub fn refresh_threshold(&self) -> u64 {
        let rate = &self.refresh_threshold_rate;
        let threshold = u128::from(self.trusting_period) * u128::from(rate.numerator)
            / u128::from(rate.denominator.max(1));
        u64::try_from(threshold).unwrap_or(u64::MAX)
    }

    /// Initial client state of a chain whose IBC store lives at
    /// `ibc_store_address`, trusted from `latest_height`.
    pub fn client_state(
        &self,
        chain_id: u64,
        ibc_store_address: Address,
        latest_height: Height,
    ) -> ClientState {
        ClientState {
            chain_id: U256::from(chain_id),
            ibc_store_address,
            latest_height,
            trusting_period: self.trusting_period,
            max_clock_drift: self.max_clock_drift,
        }
    }
}

#[derive(Debug, StructOpt)]
#[structopt(name = "qbft", about = "QBFT light client utilities")]
enum QbftCmd {
    /// Decode a hex encoded Besu header RLP
    Header { rlp: String },
}

fn describe_header(header_hex: &str, out: &mut (dyn Write + Send)) -> anyhow::Result<()> {
    let header_rlp = hex::decode(header_hex.trim_start_matches("0x"))?;
    let header = EthHeader::parse(&header_rlp)?;
    writeln!(out, "number: {}", header.number)?;
    writeln!(out, "timestamp: {}", header.timestamp)?;
    writeln!(out, "state_root: {}", header.state_root)?;
    writeln!(out, "round: {}", header.extra.round)?;
    writeln!(out, "validators: {}", header.extra.validators.len())?;
    for validator in &header.extra.validators {
        writeln!(out, "  {}", validator)?;
    }
    writeln!(out, "committed_seals: {}", header.extra.committed_seals.len())?;
    match header.commit_hash() {
        Ok(hash) => writeln!(out, "commit_hash: {}", hash)?,
        Err(ClientError::HeaderContainsSeals) => writeln!(out, "commit_hash: -")?,
        Err(err) => return Err(err.into()),
    }
    Ok(())
}

#[derive(Clone, Copy, Debug, Default)]
pub struct QbftProverModule;

#[async_trait]
impl Module for QbftProverModule {
    fn name(&self) -> &'static str {
        MODULE_NAME
    }

    fn register_interfaces(&self, registry: &mut InterfaceRegistry) -> Result<()> {
        registry.register_prover::<ProverConfig>(MODULE_NAME)
    }

    fn command(&self) -> Option<App<'static, 'static>> {
        Some(QbftCmd::clap())
    }

    async fn run_command(
        &self,
        _ctx: &Context<'_>,
        matches: &ArgMatches<'static>,
        out: &mut (dyn Write + Send),
    ) -> anyhow::Result<()> {
        match QbftCmd::from_clap(matches) {
            QbftCmd::Header { rlp } => describe_header(&rlp, out),
        }
    }
}
