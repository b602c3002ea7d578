// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Provider-level configuration.
//!
//! The cloud-provider configuration file is YAML. Only the load balancer
//! section is consumed here; credentials belong to the cloud API client.
//!
//! ```yaml
//! loadBalancer:
//!   subnet1: ocid1.subnet.oc1.phx.aaaa
//!   subnet2: ocid1.subnet.oc1.phx.bbbb
//! ```

use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading or validating [`ProviderConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A provider default subnet is empty.
    #[error("loadBalancer.{field} must be set")]
    MissingSubnet { field: &'static str },
}

/// Top-level cloud-provider configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    /// Load balancer defaults
    #[serde(default)]
    pub load_balancer: LoadBalancerConfig,
}

/// Defaults applied to every load balancer the provider creates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancerConfig {
    /// First subnet OCID, used unless the service overrides it
    #[serde(default)]
    pub subnet1: String,

    /// Second subnet OCID, used unless the service overrides it
    #[serde(default)]
    pub subnet2: String,
}

impl ProviderConfig {
    /// Parse and validate a configuration from a reader.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed YAML and
    /// [`ConfigError::MissingSubnet`] when validation fails.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be opened, otherwise
    /// the errors of [`ProviderConfig::from_reader`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_reader(file)
    }

    /// Check that both default subnets are present.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingSubnet`] naming the first empty subnet.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.load_balancer.subnet1.trim().is_empty() {
            return Err(ConfigError::MissingSubnet { field: "subnet1" });
        }
        if self.load_balancer.subnet2.trim().is_empty() {
            return Err(ConfigError::MissingSubnet { field: "subnet2" });
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
