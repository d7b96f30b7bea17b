// Copyright 2019-2020 ChainX Project Authors. Licensed under GPL-3.0.

pub mod ethereum;
pub mod hd;
pub mod lcp;
pub mod qbft;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use self::ethereum::EthereumModule;
pub use self::hd::HdSignerModule;
pub use self::lcp::LcpModule;
pub use self::qbft::QbftProverModule;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Fraction {
    pub numerator: u64,
    pub denominator: u64,
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}
