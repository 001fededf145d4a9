// Copyright 2024 Contributors to the appattest project.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use openssl::bn::BigNumContext;
use openssl::ec::PointConversionForm;
use openssl::error::ErrorStack;
use openssl::pkey::{PKey, Public};
use openssl::x509::X509;
use std::collections::HashMap;

/// Parsed, read-only view over a DER-encoded X.509 certificate.
///
/// Names are rendered once at parse time (RFC 4514 style, e.g.
/// `CN=Apple App Attestation CA 1, O=Apple Inc., ST=California`) so that
/// chain linkage can be checked with plain string equality.  Extensions are
/// indexed by their dotted OID and keep their `extnValue` content verbatim.
#[derive(Clone)]
pub struct Certificate {
    x509: X509,
    der: Vec<u8>,
    subject: String,
    issuer: String,
    extensions: HashMap<String, Vec<u8>>,
}

impl std::fmt::Debug for Certificate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Certificate")
            .field("subject", &self.subject)
            .field("issuer", &self.issuer)
            .field("extensions", &self.extensions.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Certificate {
    pub fn from_der(der: &[u8]) -> Result<Self, Error> {
        let x509 = X509::from_der(der)
            .map_err(|e| Error::MalformedAttestation(format!("certificate: {e}")))?;

        let (_, parsed) = x509_parser::parse_x509_certificate(der)
            .map_err(|e| Error::MalformedAttestation(format!("certificate: {e}")))?;

        let extensions = parsed
            .extensions()
            .iter()
            .map(|ext| (ext.oid.to_id_string(), ext.value.to_vec()))
            .collect();

        Ok(Self {
            subject: parsed.subject().to_string(),
            issuer: parsed.issuer().to_string(),
            extensions,
            der: der.to_vec(),
            x509,
        })
    }

    pub fn from_pem(pem: &[u8]) -> Result<Self, Error> {
        let der = X509::from_pem(pem)
            .and_then(|x| x.to_der())
            .map_err(|e| Error::MalformedAttestation(format!("certificate: {e}")))?;

        Self::from_der(&der)
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// The `extnValue` content of the extension identified by `oid`
    /// (dotted notation), if present
    pub fn extension(&self, oid: &str) -> Option<&[u8]> {
        self.extensions.get(oid).map(Vec::as_slice)
    }

    pub fn public_key(&self) -> Result<PKey<Public>, ErrorStack> {
        self.x509.public_key()
    }

    /// The subject public key as an uncompressed SEC1 point.  Only EC keys
    /// are supported, which is all App Attest issues.
    pub fn public_key_point(&self) -> Result<Vec<u8>, ErrorStack> {
        let ec = self.public_key()?.ec_key()?;
        let mut ctx = BigNumContext::new()?;

        ec.public_key()
            .to_bytes(ec.group(), PointConversionForm::UNCOMPRESSED, &mut ctx)
    }

    /// Check this certificate's signature against `issuer`'s public key.
    /// Name linkage is not looked at.
    pub fn is_signed_by(&self, issuer: &Certificate) -> Result<bool, ErrorStack> {
        let key = issuer.public_key()?;

        self.x509.verify(&key)
    }
}
