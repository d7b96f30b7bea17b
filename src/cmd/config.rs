// Copyright 2019-2020 ChainX Project Authors. Licensed under GPL-3.0.

use std::io::Write;

use structopt::StructOpt;

use crate::{cmd::Context, config::Config, error::Result};

#[derive(Debug, StructOpt)]
pub enum ConfigCmd {
    /// Create a configuration file with default global settings
    Init,
    /// Print the configuration file
    Show,
}

pub fn run(ctx: &Context<'_>, cmd: ConfigCmd, out: &mut (dyn Write + Send)) -> Result<()> {
    match cmd {
        ConfigCmd::Init => {
            Config::init(&ctx.home)?;
            writeln!(out, "{}", Config::path(&ctx.home).display())?;
        }
        ConfigCmd::Show => {
            let config = ctx.load_config()?;
            writeln!(out, "{}", serde_json::to_string_pretty(&config)?)?;
        }
    }
    Ok(())
}
