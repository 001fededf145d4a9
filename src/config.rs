// Copyright 2024 Contributors to the appattest project.
// SPDX-License-Identifier: Apache-2.0

//! Verifier configuration.
//!
//! A [`Config`] is built once (in code or from JSON) and handed to
//! [`Verifier::new`](crate::attestation::Verifier::new), which keeps it for
//! its whole lifetime.
//!
//! ```json
//! {
//!     "app-id": "4RKXM42395.junyaoc.Miracam",
//!     "environment": "development"
//! }
//! ```

use crate::attestation::Error;
use openssl::sha::sha256;
use serde::{Deserialize, Serialize};

/// AAGUID value stamped by the App Attest sandbox
pub const DEVELOPMENT_TAG: [u8; 16] = *b"appattestdevelop";

/// AAGUID value stamped by the App Attest production service
pub const PRODUCTION_TAG: [u8; 16] = *b"appattest\0\0\0\0\0\0\0";

/// The App Attest environment attestations are expected to come from
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    #[default]
    Production,
}

impl Environment {
    pub fn tag(&self) -> &'static [u8; 16] {
        match self {
            Environment::Development => &DEVELOPMENT_TAG,
            Environment::Production => &PRODUCTION_TAG,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// `<team id>.<bundle id>` of the attesting application
    pub app_id: String,

    #[serde(default)]
    pub environment: Environment,

    /// PEM-encoded root certificate replacing the bundled Apple App
    /// Attestation Root CA
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_ca: Option<String>,
}

impl Config {
    pub fn new(app_id: impl Into<String>, environment: Environment) -> Self {
        Self {
            app_id: app_id.into(),
            environment,
            root_ca: None,
        }
    }

    pub fn with_root_ca(mut self, pem: impl Into<String>) -> Self {
        self.root_ca = Some(pem.into());
        self
    }

    pub fn from_json(j: &str) -> Result<Self, Error> {
        let c: Config = serde_json::from_str(j).map_err(|e| Error::Config(e.to_string()))?;

        c.validate()?;

        Ok(c)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.app_id.is_empty() {
            return Err(Error::Config("app-id MUST NOT be empty".to_string()));
        }

        Ok(())
    }

    /// SHA-256 of the application identifier, i.e. the expected rpIdHash
    pub fn app_id_hash(&self) -> [u8; 32] {
        sha256(self.app_id.as_bytes())
    }
}
