// Copyright 2024 Contributors to the appattest project.
// SPDX-License-Identifier: Apache-2.0

use crate::attestation::{Certificate, Error};

/// Apple App Attestation Root CA, as published at
/// <https://www.apple.com/certificateauthority/Apple_App_Attestation_Root_CA.pem>
pub const APPLE_APP_ATTESTATION_ROOT_CA_PEM: &[u8] =
    include_bytes!("apple_app_attestation_root_ca.pem");

/// The root every App Attest chain must end in.  It is pinned at build time
/// and never fetched.
pub struct TrustAnchor;

impl TrustAnchor {
    /// The bundled Apple App Attestation Root CA
    pub fn apple() -> Result<Certificate, Error> {
        Self::from_pem(APPLE_APP_ATTESTATION_ROOT_CA_PEM)
    }

    /// A root supplied by configuration instead of the bundled one
    pub fn from_pem(pem: &[u8]) -> Result<Certificate, Error> {
        Certificate::from_pem(pem).map_err(|e| Error::Config(format!("root certificate: {e}")))
    }
}
