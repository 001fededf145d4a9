// Copyright 2024 Contributors to the appattest project.
// SPDX-License-Identifier: Apache-2.0

use super::authdata::AuthenticatorData;
use super::base64;
use super::certificate::Certificate;
use super::chain::TrustChain;
use super::consistency::ConsistencyReport;
use super::errors::Error;
use super::extension::NonceExtension;
use super::object::AttestationObject;
use crate::config::Config;
use crate::store::{INonceStore, TrustAnchor};
use openssl::sha::sha256;
use serde::{Serialize, Serializer};

/// Result of a verification that got past every structural stage
#[derive(Debug, Clone, Serialize)]
pub struct Verdict {
    /// Per-check breakdown; the verdict holds iff every check holds
    pub report: ConsistencyReport,
    /// Credential public key from the leaf certificate (uncompressed SEC1
    /// point), to be kept for verifying later assertions.  `None` if the
    /// leaf does not carry an EC key.
    #[serde(serialize_with = "hex_opt")]
    pub public_key: Option<Vec<u8>>,
    /// base64(SHA-256(public_key)), the key id a genuine device reports
    pub leaf_key_id: Option<String>,
    #[serde(skip)]
    pub receipt: Vec<u8>,
}

impl Verdict {
    pub fn is_valid(&self) -> bool {
        self.report.is_valid()
    }
}

fn hex_opt<S: Serializer>(v: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
    v.as_ref().map(hex::encode).serialize(s)
}

/// Verifies App Attest attestation objects against a fixed configuration.
///
/// The root certificate is parsed once, in [`Verifier::new`]; after that the
/// verifier is read-only and can be shared between concurrent calls.
#[derive(Debug)]
pub struct Verifier {
    config: Config,
    root: Certificate,
}

impl Verifier {
    pub fn new(config: Config) -> Result<Self, Error> {
        config.validate()?;

        let root = match &config.root_ca {
            Some(pem) => TrustAnchor::from_pem(pem.as_bytes())?,
            None => TrustAnchor::apple()?,
        };

        tracing::debug!(
            app_id = config.app_id.as_str(),
            environment = ?config.environment,
            root = root.subject(),
            "verifier ready"
        );

        Ok(Self { config, root })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn root(&self) -> &Certificate {
        &self.root
    }

    /// Verify `attestation` (base64 CBOR attestation object) for the key
    /// identified by `key_id` (base64 SHA-256 of the device public key),
    /// using the challenge `nonces` holds for that key.
    ///
    /// Decoding, chain, authenticator data and extension failures abort with
    /// an error.  Once those pass, the consistency checks always all run and
    /// their outcome is returned in the [`Verdict`].
    pub async fn verify_attestation<N>(
        &self,
        key_id: &str,
        attestation: &str,
        nonces: &N,
    ) -> Result<Verdict, Error>
    where
        N: INonceStore + ?Sized,
    {
        base64::decode_str(key_id)
            .map_err(|e| Error::MalformedAttestation(format!("key id: {e}")))?;

        let object = AttestationObject::from_base64(attestation)?;

        let chain = TrustChain::verify(&object.certificates, &self.root)?;

        let auth_data = AuthenticatorData::parse(&object.auth_data)?;

        let extension = NonceExtension::extract(chain.leaf())?;

        let public_key = match chain.leaf().public_key_point() {
            Ok(p) => Some(p),
            Err(e) => {
                tracing::warn!(error = %e, "leaf public key is not an EC point");
                None
            }
        };
        let leaf_key_id = public_key.as_deref().map(|p| base64::encode(&sha256(p)));

        let challenge = nonces
            .lookup(key_id)
            .await
            .map_err(|e| Error::NonceLookup(e.to_string()))?;

        let report = ConsistencyReport::check(
            &auth_data,
            &extension,
            &challenge,
            key_id,
            leaf_key_id.as_deref(),
            &self.config,
        );

        tracing::info!(key_id, valid = report.is_valid(), "attestation processed");

        Ok(Verdict {
            report,
            public_key,
            leaf_key_id,
            receipt: object.receipt,
        })
    }
}
