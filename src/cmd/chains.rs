// Copyright 2019-2020 ChainX Project Authors. Licensed under GPL-3.0.

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use structopt::StructOpt;

use crate::{
    cmd::Context,
    config::ChainProverConfig,
    error::{Error, Result},
};

#[derive(Debug, StructOpt)]
pub enum ChainsCmd {
    /// Add every chain config (*.json) found in a directory
    AddDir {
        #[structopt(parse(from_os_str))]
        dir: PathBuf,
    },
    /// List the configured chains
    List,
    /// Print the config of a chain
    Show { chain_id: String },
}

pub fn run(ctx: &Context<'_>, cmd: ChainsCmd, out: &mut (dyn Write + Send)) -> Result<()> {
    match cmd {
        ChainsCmd::AddDir { dir } => add_dir(ctx, &dir, out),
        ChainsCmd::List => {
            let config = ctx.load_config()?;
            for (index, chain) in config.chains.iter().enumerate() {
                let resolved = chain.resolve(ctx.registry)?;
                writeln!(
                    out,
                    "{}: {} ({}, {})",
                    index,
                    resolved.chain.chain_id(),
                    chain.chain.type_url,
                    chain.prover.type_url
                )?;
            }
            Ok(())
        }
        ChainsCmd::Show { chain_id } => {
            let config = ctx.load_config()?;
            let chain = config.chain(ctx.registry, &chain_id)?;
            writeln!(out, "{}", serde_json::to_string_pretty(chain)?)?;
            Ok(())
        }
    }
}

/// Either every file in `dir` is added or none is.
fn add_dir(ctx: &Context<'_>, dir: &Path, out: &mut (dyn Write + Send)) -> Result<()> {
    let mut config = ctx.load_config()?;

    let mut files = fs::read_dir(dir)?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    files.retain(|file| file.is_file() && file.extension().map_or(false, |ext| ext == "json"));
    files.sort();
    if files.is_empty() {
        warn!("[Chains|add_dir] No chain config found in {}", dir.display());
    }

    let mut added = Vec::with_capacity(files.len());
    for file in files {
        let chain_id = ChainProverConfig::read(&file)
            .and_then(|chain| config.add_chain(ctx.registry, chain))
            .map_err(|err| Error::ChainFile {
                file: file.clone(),
                source: Box::new(err),
            })?;
        info!("[Chains|add_dir] Added chain {} from {}", chain_id, file.display());
        added.push(chain_id);
    }

    ctx.save_config(&config)?;
    for chain_id in added {
        writeln!(out, "{}", chain_id)?;
    }
    Ok(())
}
