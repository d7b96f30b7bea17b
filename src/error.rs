// Copyright 2019-2020 ChainX Project Authors. Licensed under GPL-3.0.

use std::path::PathBuf;

use crate::registry::Interface;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Cli(#[from] structopt::clap::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("logger error: {0}")]
    Logger(String),

    #[error("home directory is not set, use --home or RELAYER_HOME")]
    HomeNotFound,

    #[error("config file not found at {0}, run `config init` first")]
    ConfigNotFound(PathBuf),

    #[error("config file already exists at {0}")]
    ConfigExists(PathBuf),

    #[error("invalid global config: {0}")]
    InvalidGlobal(String),

    #[error("module `{0}` is registered more than once")]
    DuplicateModule(&'static str),

    #[error("type url `{type_url}` is already registered by module `{module}`")]
    DuplicateTypeUrl {
        type_url: &'static str,
        module: &'static str,
    },

    #[error("command `{command}` of module `{module}` conflicts with an existing command")]
    CommandConflict {
        command: String,
        module: &'static str,
    },

    #[error("missing `@type` in {0} config")]
    MissingTypeUrl(Interface),

    #[error("unknown {interface} type url `{type_url}`")]
    UnknownTypeUrl {
        interface: Interface,
        type_url: String,
    },

    #[error("type url `{type_url}` is a {found} config, expected a {expected} config")]
    InterfaceMismatch {
        type_url: String,
        expected: Interface,
        found: Interface,
    },

    #[error("invalid `{type_url}` config: {reason}")]
    InvalidConfig {
        type_url: &'static str,
        reason: String,
    },

    #[error("{}: {}", .file.display(), .source)]
    ChainFile {
        file: PathBuf,
        source: Box<Error>,
    },

    #[error("chain `{0}` not found")]
    ChainNotFound(String),

    #[error("chain `{0}` already exists")]
    ChainExists(String),

    #[error("path `{0}` not found")]
    PathNotFound(String),

    #[error("path `{0}` already exists")]
    PathExists(String),

    #[error("invalid path `{name}`: {reason}")]
    InvalidPath { name: String, reason: String },

    #[error("module `{module}` failed: {reason}")]
    Module {
        module: &'static str,
        reason: String,
    },
}

impl From<log::SetLoggerError> for Error {
    fn from(err: log::SetLoggerError) -> Self {
        Error::Logger(err.to_string())
    }
}
