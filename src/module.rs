// Copyright 2019-2020 ChainX Project Authors. Licensed under GPL-3.0.

use std::io::Write;

use async_trait::async_trait;
use structopt::clap::{App, ArgMatches};

use crate::{cmd::Context, error::Result, registry::InterfaceRegistry};

/// A plugin handed to [`crate::cmd::execute`].
///
/// A module contributes config types to the interface registry and may mount
/// one subcommand on the root command line.
#[async_trait]
pub trait Module: Send + Sync {
    /// Unique among the registered modules.
    fn name(&self) -> &'static str;

    fn register_interfaces(&self, registry: &mut InterfaceRegistry) -> Result<()>;

    fn command(&self) -> Option<App<'static, 'static>> {
        None
    }

    /// Runs the subcommand returned by [`Module::command`], `matches` being
    /// the matches of that subcommand.
    async fn run_command(
        &self,
        _ctx: &Context<'_>,
        _matches: &ArgMatches<'static>,
        _out: &mut (dyn Write + Send),
    ) -> anyhow::Result<()> {
        anyhow::bail!("module `{}` has no command", self.name())
    }
}
