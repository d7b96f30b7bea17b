// Copyright 2019-2020 ChainX Project Authors. Licensed under GPL-3.0.

use std::{fs, io::Write, path::PathBuf};

use structopt::StructOpt;

use crate::{
    cmd::Context,
    config::Path,
    error::{Error, Result},
};

#[derive(Debug, StructOpt)]
pub enum PathsCmd {
    /// Add a path between two configured chains
    Add {
        src_chain_id: String,
        dst_chain_id: String,
        path_name: String,
        /// JSON file describing both ends of the path
        #[structopt(long, short, parse(from_os_str))]
        file: PathBuf,
    },
    /// List the configured paths
    List,
    /// Print the config of a path
    Show { path_name: String },
}

pub fn run(ctx: &Context<'_>, cmd: PathsCmd, out: &mut (dyn Write + Send)) -> Result<()> {
    match cmd {
        PathsCmd::Add {
            src_chain_id,
            dst_chain_id,
            path_name,
            file,
        } => {
            let mut config = ctx.load_config()?;
            let path: Path = serde_json::from_str(&fs::read_to_string(&file)?)?;
            if path.src.chain_id != src_chain_id || path.dst.chain_id != dst_chain_id {
                return Err(Error::InvalidPath {
                    name: path_name,
                    reason: format!(
                        "{} describes {} -> {}, expected {} -> {}",
                        file.display(),
                        path.src.chain_id,
                        path.dst.chain_id,
                        src_chain_id,
                        dst_chain_id
                    ),
                });
            }
            config.add_path(ctx.registry, &path_name, path)?;
            ctx.save_config(&config)?;
            info!(
                "[Paths|add] Added path {}: {} -> {}",
                path_name, src_chain_id, dst_chain_id
            );
            writeln!(out, "{}", path_name)?;
        }
        PathsCmd::List => {
            let config = ctx.load_config()?;
            for (name, path) in &config.paths {
                writeln!(out, "{}: {}", name, path.summary())?;
            }
        }
        PathsCmd::Show { path_name } => {
            let config = ctx.load_config()?;
            let path = config.path_by_name(&path_name)?;
            writeln!(out, "{}", serde_json::to_string_pretty(path)?)?;
        }
    }
    Ok(())
}
