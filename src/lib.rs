// Copyright 2019-2020 ChainX Project Authors. Licensed under GPL-3.0.

#![allow(clippy::type_complexity)]

#[macro_use]
pub mod logger;

pub mod cmd;
pub mod config;
mod error;
pub mod module;
pub mod modules;
pub mod registry;

#[cfg(test)]
pub(crate) mod mock;


pub use self::cmd::{execute, Context, Executor, GlobalOpts};
pub use self::error::{Error, Result};
pub use self::module::Module;
pub use self::modules::{EthereumModule, HdSignerModule, LcpModule, QbftProverModule};

/// The modules the relayer is built with, in registration order: chain,
/// signer, prover, relay.
pub fn modules() -> Vec<Box<dyn Module>> {
    vec![
        Box::new(EthereumModule),
        Box::new(HdSignerModule),
        Box::new(QbftProverModule),
        Box::new(LcpModule),
    ]
}
