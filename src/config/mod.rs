// Copyright 2019-2020 ChainX Project Authors. Licensed under GPL-3.0.

mod path;

pub use self::path::{Path, PathEnd, Strategy};

use std::{
    collections::{BTreeMap, BTreeSet},
    fs,
    path::{Path as FsPath, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    registry::{Any, ChainConfig, InterfaceRegistry, ProverConfig},
};

pub const CONFIG_DIR: &str = "config";
pub const CONFIG_FILE: &str = "config.json";

const DEFAULT_TIMEOUT: u64 = 10;
const DEFAULT_LIGHT_CACHE_SIZE: u64 = 20;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub global: GlobalConfig,
    #[serde(default)]
    pub chains: Vec<ChainProverConfig>,
    #[serde(default)]
    pub paths: BTreeMap<String, Path>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GlobalConfig {
    /// RPC timeout in seconds.
    pub timeout: u64,
    pub light_cache_size: u64,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            light_cache_size: DEFAULT_LIGHT_CACHE_SIZE,
        }
    }
}

/// A chain together with the prover that produces its light client messages.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChainProverConfig {
    pub chain: Any,
    pub prover: Any,
}

#[derive(Debug)]
pub struct ResolvedChain {
    pub chain: Box<dyn ChainConfig>,
    pub prover: Box<dyn ProverConfig>,
}

impl ChainProverConfig {
    pub fn resolve(&self, registry: &InterfaceRegistry) -> Result<ResolvedChain> {
        Ok(ResolvedChain {
            chain: registry.unpack_chain(&self.chain)?,
            prover: registry.unpack_prover(&self.prover)?,
        })
    }

    pub fn read(file: &FsPath) -> Result<Self> {
        let content = fs::read_to_string(file)?;
        Ok(serde_json::from_str(&content)?)
    }
}

impl Config {
    pub fn path(home: &FsPath) -> PathBuf {
        home.join(CONFIG_DIR).join(CONFIG_FILE)
    }

    /// Reads the config under `home` and validates it against the registry.
    pub fn load(home: &FsPath, registry: &InterfaceRegistry) -> Result<Self> {
        let file = Self::path(home);
        if !file.exists() {
            return Err(Error::ConfigNotFound(file));
        }
        let content = fs::read_to_string(&file)?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate(registry)?;
        debug!(
            "[Config|load] Loaded {} chains and {} paths from {}",
            config.chains.len(),
            config.paths.len(),
            file.display()
        );
        Ok(config)
    }

    pub fn save(&self, home: &FsPath) -> Result<()> {
        let file = Self::path(home);
        if let Some(dir) = file.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(&file, serde_json::to_string_pretty(self)?)?;
        debug!("[Config|save] Wrote {}", file.display());
        Ok(())
    }

    /// Writes a default config, refusing to overwrite an existing one.
    pub fn init(home: &FsPath) -> Result<Self> {
        let file = Self::path(home);
        if file.exists() {
            return Err(Error::ConfigExists(file));
        }
        let config = Config::default();
        config.save(home)?;
        info!("[Config|init] Created {}", file.display());
        Ok(config)
    }

    pub fn validate(&self, registry: &InterfaceRegistry) -> Result<()> {
        if self.global.timeout == 0 {
            return Err(Error::InvalidGlobal("timeout must be positive".to_string()));
        }
        let mut chain_ids = BTreeSet::new();
        for chain in &self.chains {
            let resolved = chain.resolve(registry)?;
            let chain_id = resolved.chain.chain_id().to_string();
            if !chain_ids.insert(chain_id.clone()) {
                return Err(Error::ChainExists(chain_id));
            }
        }
        for (name, path) in &self.paths {
            path.validate(name)?;
            for end in &[&path.src, &path.dst] {
                if !chain_ids.contains(&end.chain_id) {
                    return Err(Error::InvalidPath {
                        name: name.clone(),
                        reason: format!("chain `{}` is not configured", end.chain_id),
                    });
                }
            }
        }
        Ok(())
    }

    /// Chain ids in config order.
    pub fn chain_ids(&self, registry: &InterfaceRegistry) -> Result<Vec<String>> {
        self.chains
            .iter()
            .map(|chain| Ok(chain.resolve(registry)?.chain.chain_id().to_string()))
            .collect()
    }

    pub fn chain(
        &self,
        registry: &InterfaceRegistry,
        chain_id: &str,
    ) -> Result<&ChainProverConfig> {
        for chain in &self.chains {
            if chain.resolve(registry)?.chain.chain_id() == chain_id {
                return Ok(chain);
            }
        }
        Err(Error::ChainNotFound(chain_id.to_string()))
    }

    /// Appends a chain after validating it; chain ids stay unique.
    pub fn add_chain(
        &mut self,
        registry: &InterfaceRegistry,
        chain: ChainProverConfig,
    ) -> Result<String> {
        let chain_id = chain.resolve(registry)?.chain.chain_id().to_string();
        if self.chain_ids(registry)?.contains(&chain_id) {
            return Err(Error::ChainExists(chain_id));
        }
        self.chains.push(chain);
        Ok(chain_id)
    }

    pub fn add_path(
        &mut self,
        registry: &InterfaceRegistry,
        name: &str,
        path: Path,
    ) -> Result<()> {
        if self.paths.contains_key(name) {
            return Err(Error::PathExists(name.to_string()));
        }
        path.validate(name)?;
        let chain_ids = self.chain_ids(registry)?;
        for end in &[&path.src, &path.dst] {
            if !chain_ids.contains(&end.chain_id) {
                return Err(Error::ChainNotFound(end.chain_id.clone()));
            }
        }
        self.paths.insert(name.to_string(), path);
        Ok(())
    }

    pub fn path_by_name(&self, name: &str) -> Result<&Path> {
        self.paths
            .get(name)
            .ok_or_else(|| Error::PathNotFound(name.to_string()))
    }
}
