// Copyright 2019-2020 ChainX Project Authors. Licensed under GPL-3.0.

//! HD wallet signer: a BIP-39 mnemonic and a BIP-32 derivation path.

use std::io::Write;

use alloy_primitives::Address;
use alloy_signer_local::{coins_bip39::English, MnemonicBuilder, PrivateKeySigner};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use structopt::{
    clap::{App, ArgMatches},
    StructOpt,
};

use crate::{
    cmd::Context,
    error::{Error, Result},
    module::Module,
    registry::{InterfaceRegistry, SignerConfig as SignerConfigT, TypeUrl},
};

pub const MODULE_NAME: &str = "hd";
pub const DEFAULT_PATH: &str = "m/44'/60'/0'/0/0";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignerConfig {
    pub mnemonic: String,
    pub path: String,
}

impl TypeUrl for SignerConfig {
    const TYPE_URL: &'static str = "/relayer.signers.hd.SignerConfig";
}

impl SignerConfig {
    pub fn signer(&self) -> Result<PrivateKeySigner> {
        derive_signer(&self.mnemonic, &self.path)
    }

    pub fn address(&self) -> Result<Address> {
        Ok(self.signer()?.address())
    }
}

impl SignerConfigT for SignerConfig {
    fn validate(&self) -> Result<()> {
        self.signer().map(|_| ())
    }
}

fn derive_signer(mnemonic: &str, path: &str) -> Result<PrivateKeySigner> {
    let invalid = |reason: String| Error::InvalidConfig {
        type_url: SignerConfig::TYPE_URL,
        reason,
    };
    if mnemonic.trim().is_empty() {
        return Err(invalid("mnemonic is empty".to_string()));
    }
    MnemonicBuilder::<English>::default()
        .phrase(mnemonic.trim())
        .derivation_path(path)
        .map_err(|err| invalid(format!("derivation path `{}`: {}", path, err)))?
        .build()
        .map_err(|err| invalid(format!("mnemonic: {}", err)))
}

#[derive(Debug, StructOpt)]
#[structopt(name = "hd", about = "HD wallet signer utilities")]
enum HdCmd {
    /// Print the address derived from a mnemonic
    Address {
        #[structopt(long)]
        mnemonic: String,
        #[structopt(long, default_value = DEFAULT_PATH)]
        path: String,
    },
}

#[derive(Clone, Copy, Debug, Default)]
pub struct HdSignerModule;

#[async_trait]
impl Module for HdSignerModule {
    fn name(&self) -> &'static str {
        MODULE_NAME
    }

    fn register_interfaces(&self, registry: &mut InterfaceRegistry) -> Result<()> {
        registry.register_signer::<SignerConfig>(MODULE_NAME)
    }

    fn command(&self) -> Option<App<'static, 'static>> {
        Some(HdCmd::clap())
    }

    async fn run_command(
        &self,
        _ctx: &Context<'_>,
        matches: &ArgMatches<'static>,
        out: &mut (dyn Write + Send),
    ) -> anyhow::Result<()> {
        match HdCmd::from_clap(matches) {
            HdCmd::Address { mnemonic, path } => {
                let address = derive_signer(&mnemonic, &path)?.address();
                writeln!(out, "{}", address)?;
            }
        }
        Ok(())
    }
}
