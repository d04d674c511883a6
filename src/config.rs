use alloy_primitives::Address;
use thiserror::Error;

use crate::types::parse_address;

const DEFAULT_PORT: u16 = 4010;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{name} is not a valid address: {reason}")]
    InvalidAddress { name: &'static str, reason: String },

    #[error("PORT is not a valid port number: {0}")]
    InvalidPort(String),
}

/// The two signer identities a result must recover to. Fixed for the life of
/// the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrustConfig {
    pub allocator: Address,
    pub validator: Address,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub trust: TrustConfig,
    /// TransGate application id the relying party launches under.
    pub app_id: Option<String>,
    /// Schema used when a request does not name one.
    pub schema_id: Option<String>,
    pub port: u16,
}

fn trusted_address<F>(lookup: &F, name: &'static str) -> Result<Address, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(name)
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(name))?;
    parse_address(name, value.trim()).map_err(|e| ConfigError::InvalidAddress {
        name,
        reason: e.to_string(),
    })
}

fn optional(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl ServiceConfig {
    /// Build from any key lookup. `from_env` is the production caller.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let trust = TrustConfig {
            allocator: trusted_address(&lookup, "ALLOCATOR_ADDRESS")?,
            validator: trusted_address(&lookup, "VALIDATOR_ADDRESS")?,
        };

        let port = match lookup("PORT") {
            Some(v) => v.parse().map_err(|_| ConfigError::InvalidPort(v))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            trust,
            app_id: optional(lookup("APP_ID")),
            schema_id: optional(lookup("SCHEMA_ID")),
            port,
        })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }
}
