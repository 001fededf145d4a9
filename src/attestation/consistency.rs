// Copyright 2024 Contributors to the appattest project.
// SPDX-License-Identifier: Apache-2.0

use super::authdata::AuthenticatorData;
use super::base64;
use super::extension::NonceExtension;
use crate::config::Config;
use openssl::sha::Sha256;
use serde::Serialize;

/// App Attest credential ids are the SHA-256 of the credential public key
pub const EXPECTED_CREDENTIAL_ID_LEN: usize = 32;

/// Outcome of the consistency checks run on a structurally valid
/// attestation.  Each check is evaluated on its own; none of them can stop
/// the others from running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConsistencyReport {
    /// SHA-256(authData || challenge) matches the digest in the leaf's nonce
    /// extension
    pub nonce_valid: bool,
    /// The supplied key id equals both base64(credentialId) and the key id
    /// derived from the leaf certificate's public key
    pub key_id_valid: bool,
    /// rpIdHash equals SHA-256 of the configured application identifier
    pub rp_id_hash_valid: bool,
    /// signCount is zero, as on a freshly attested key
    pub sign_count_valid: bool,
    /// The AAGUID slot carries the configured environment's tag
    pub environment_valid: bool,
    /// credentialIdLength is 32
    pub credential_id_valid: bool,
}

impl ConsistencyReport {
    /// Run every check.  `challenge` is the base64 string previously issued
    /// for `key_id`; one that does not decode just fails the nonce check.
    /// `leaf_key_id` is base64(SHA-256(leaf public key)), `None` when the
    /// leaf key is not an EC point.
    pub fn check(
        auth_data: &AuthenticatorData,
        extension: &NonceExtension,
        challenge: &str,
        key_id: &str,
        leaf_key_id: Option<&str>,
        config: &Config,
    ) -> Self {
        let nonce_valid = match base64::decode_str(challenge) {
            Ok(c) => {
                let expected = nonce_digest(auth_data.bytes(), &c);
                let embedded = extension.nonce();

                tracing::debug!(
                    expected = %hex::encode(expected),
                    embedded = ?embedded.map(hex::encode),
                    "nonce"
                );

                embedded == Some(expected)
            }
            Err(e) => {
                tracing::debug!(error = %e, "challenge is not base64");
                false
            }
        };

        let report = Self {
            nonce_valid,
            key_id_valid: base64::encode(auth_data.credential_id()) == key_id
                && leaf_key_id == Some(key_id),
            rp_id_hash_valid: auth_data.rp_id_hash() == config.app_id_hash(),
            sign_count_valid: auth_data.sign_count() == 0,
            environment_valid: auth_data.environment_tag() == config.environment.tag(),
            credential_id_valid: auth_data.credential_id_len() == EXPECTED_CREDENTIAL_ID_LEN,
        };

        for name in report.failed_checks() {
            tracing::warn!(check = name, "consistency check failed");
        }

        report
    }

    /// The conjunction of all checks
    pub fn is_valid(&self) -> bool {
        self.nonce_valid
            && self.key_id_valid
            && self.rp_id_hash_valid
            && self.sign_count_valid
            && self.environment_valid
            && self.credential_id_valid
    }

    pub fn failed_checks(&self) -> Vec<&'static str> {
        [
            (self.nonce_valid, "nonce"),
            (self.key_id_valid, "key-id"),
            (self.rp_id_hash_valid, "rp-id-hash"),
            (self.sign_count_valid, "sign-count"),
            (self.environment_valid, "environment"),
            (self.credential_id_valid, "credential-id"),
        ]
        .iter()
        .filter(|(ok, _)| !ok)
        .map(|(_, n)| *n)
        .collect()
    }
}

/// SHA-256 over the authenticator data followed by the decoded challenge
pub fn nonce_digest(auth_data: &[u8], challenge: &[u8]) -> [u8; 32] {
    let mut h = Sha256::new();
    h.update(auth_data);
    h.update(challenge);
    h.finish()
}
