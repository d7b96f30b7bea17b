// Copyright 2019-2020 ChainX Project Authors. Licensed under GPL-3.0.

use besu_ibc_relayer::{execute, logger, modules};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(err) = execute(modules()).await {
        logger::fatal(err);
    }
}
