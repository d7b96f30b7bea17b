// Copyright 2019-2020 ChainX Project Authors. Licensed under GPL-3.0.

//! Type-URL keyed registry of the configuration types contributed by modules.
//!
//! Configs travel through the config file as JSON-encoded `Any` values: an
//! object whose `@type` key names the concrete message. A module registers
//! each of its config types under one of the [`Interface`]s, and the registry
//! turns an `Any` back into a validated trait object.

use std::{collections::BTreeMap, fmt};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// A config message with a stable type URL.
pub trait TypeUrl {
    const TYPE_URL: &'static str;
}

pub trait ChainConfig: fmt::Debug + Send + Sync {
    /// The IBC chain id used to reference this chain in paths and commands.
    fn chain_id(&self) -> &str;

    fn validate(&self, registry: &InterfaceRegistry) -> Result<()>;
}

pub trait ProverConfig: fmt::Debug + Send + Sync {
    fn validate(&self, registry: &InterfaceRegistry) -> Result<()>;
}

pub trait SignerConfig: fmt::Debug + Send + Sync {
    fn validate(&self) -> Result<()>;
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub enum Interface {
    Chain,
    Prover,
    Signer,
}

impl fmt::Display for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Interface::Chain => "chain",
            Interface::Prover => "prover",
            Interface::Signer => "signer",
        })
    }
}

/// JSON form of a protobuf `Any`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Any {
    #[serde(rename = "@type", default)]
    pub type_url: String,
    #[serde(flatten)]
    pub value: Map<String, Value>,
}

impl Any {
    pub fn pack<T: TypeUrl + Serialize>(message: &T) -> Result<Self> {
        let value = match serde_json::to_value(message)? {
            Value::Object(map) => map,
            other => {
                return Err(Error::InvalidConfig {
                    type_url: T::TYPE_URL,
                    reason: format!("expected a json object, got {}", other),
                })
            }
        };
        Ok(Self {
            type_url: T::TYPE_URL.to_string(),
            value,
        })
    }

    pub fn unpack<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(Value::Object(self.value.clone()))?)
    }
}

type Decoder<D> = Box<dyn Fn(&Any) -> Result<Box<D>> + Send + Sync>;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Registration {
    pub type_url: &'static str,
    pub interface: Interface,
    pub module: &'static str,
}

#[derive(Default)]
pub struct InterfaceRegistry {
    registrations: BTreeMap<&'static str, Registration>,
    chains: BTreeMap<&'static str, Decoder<dyn ChainConfig>>,
    provers: BTreeMap<&'static str, Decoder<dyn ProverConfig>>,
    signers: BTreeMap<&'static str, Decoder<dyn SignerConfig>>,
}

impl fmt::Debug for InterfaceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterfaceRegistry")
            .field("registrations", &self.registrations)
            .finish()
    }
}

impl InterfaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_chain<T>(&mut self, module: &'static str) -> Result<()>
    where
        T: ChainConfig + TypeUrl + DeserializeOwned + 'static,
    {
        self.record::<T>(Interface::Chain, module)?;
        self.chains.insert(
            T::TYPE_URL,
            Box::new(|any: &Any| -> Result<Box<dyn ChainConfig>> {
                Ok(Box::new(any.unpack::<T>()?))
            }),
        );
        Ok(())
    }

    pub fn register_prover<T>(&mut self, module: &'static str) -> Result<()>
    where
        T: ProverConfig + TypeUrl + DeserializeOwned + 'static,
    {
        self.record::<T>(Interface::Prover, module)?;
        self.provers.insert(
            T::TYPE_URL,
            Box::new(|any: &Any| -> Result<Box<dyn ProverConfig>> {
                Ok(Box::new(any.unpack::<T>()?))
            }),
        );
        Ok(())
    }

    pub fn register_signer<T>(&mut self, module: &'static str) -> Result<()>
    where
        T: SignerConfig + TypeUrl + DeserializeOwned + 'static,
    {
        self.record::<T>(Interface::Signer, module)?;
        self.signers.insert(
            T::TYPE_URL,
            Box::new(|any: &Any| -> Result<Box<dyn SignerConfig>> {
                Ok(Box::new(any.unpack::<T>()?))
            }),
        );
        Ok(())
    }

    fn record<T: TypeUrl>(&mut self, interface: Interface, module: &'static str) -> Result<()> {
        if let Some(existing) = self.registrations.get(T::TYPE_URL) {
            return Err(Error::DuplicateTypeUrl {
                type_url: T::TYPE_URL,
                module: existing.module,
            });
        }
        debug!(
            "[Registry|register] {} registered {} config {}",
            module,
            interface,
            T::TYPE_URL
        );
        self.registrations.insert(
            T::TYPE_URL,
            Registration {
                type_url: T::TYPE_URL,
                interface,
                module,
            },
        );
        Ok(())
    }

    /// Decodes and validates a chain config.
    pub fn unpack_chain(&self, any: &Any) -> Result<Box<dyn ChainConfig>> {
        let decode = self.decoder(&self.chains, Interface::Chain, any)?;
        let config = decode(any)?;
        config.validate(self)?;
        Ok(config)
    }

    /// Decodes and validates a prover config.
    pub fn unpack_prover(&self, any: &Any) -> Result<Box<dyn ProverConfig>> {
        let decode = self.decoder(&self.provers, Interface::Prover, any)?;
        let config = decode(any)?;
        config.validate(self)?;
        Ok(config)
    }

    /// Decodes and validates a signer config.
    pub fn unpack_signer(&self, any: &Any) -> Result<Box<dyn SignerConfig>> {
        let decode = self.decoder(&self.signers, Interface::Signer, any)?;
        let config = decode(any)?;
        config.validate()?;
        Ok(config)
    }

    fn decoder<'a, D: ?Sized>(
        &self,
        decoders: &'a BTreeMap<&'static str, Decoder<D>>,
        interface: Interface,
        any: &Any,
    ) -> Result<&'a Decoder<D>> {
        if any.type_url.is_empty() {
            return Err(Error::MissingTypeUrl(interface));
        }
        if let Some(decoder) = decoders.get(any.type_url.as_str()) {
            return Ok(decoder);
        }
        match self.registrations.get(any.type_url.as_str()) {
            Some(registration) => Err(Error::InterfaceMismatch {
                type_url: any.type_url.clone(),
                expected: interface,
                found: registration.interface,
            }),
            None => Err(Error::UnknownTypeUrl {
                interface,
                type_url: any.type_url.clone(),
            }),
        }
    }

    /// Type urls registered by `module`, in type url order.
    pub fn registrations(&self, module: &str) -> Vec<&Registration> {
        self.registrations
            .values()
            .filter(|registration| registration.module == module)
            .collect()
    }
}
