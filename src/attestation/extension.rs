// Copyright 2024 Contributors to the appattest project.
// SPDX-License-Identifier: Apache-2.0

use super::certificate::Certificate;
use super::errors::Error;
use x509_parser::der_parser::der::{
    parse_der_container, parse_der_octetstring, parse_der_tagged_explicit, Class, Header, Tag,
};
use x509_parser::der_parser::error::{BerError, BerResult};
use x509_parser::nom;

/// OID of the credential certificate extension holding the attestation nonce
pub const APP_ATTEST_NONCE_OID: &str = "1.2.840.113635.100.8.2";

/// The nonce extension found on an App Attest credential certificate.
///
/// ```text
/// SEQUENCE {
///   [1] EXPLICIT OCTET STRING  -- SHA-256(authData || clientDataHash)
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonceExtension {
    raw: Vec<u8>,
}

impl NonceExtension {
    /// Locate the nonce extension on `leaf` and keep its content unmodified.
    pub fn extract(leaf: &Certificate) -> Result<Self, Error> {
        let raw = leaf.extension(APP_ATTEST_NONCE_OID).ok_or_else(|| {
            Error::MissingExtension(format!(
                "{APP_ATTEST_NONCE_OID} not found on {:?}",
                leaf.subject()
            ))
        })?;

        Ok(Self { raw: raw.to_vec() })
    }

    /// Wrap extension content obtained by other means
    pub fn from_raw(raw: Vec<u8>) -> Self {
        Self { raw }
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// The embedded 32-byte digest, or `None` if the content does not
    /// follow the expected structure.
    pub fn nonce(&self) -> Option<[u8; 32]> {
        match parse_nonce(&self.raw) {
            Ok((rem, nonce)) if rem.is_empty() => Some(nonce),
            _ => None,
        }
    }
}

fn parse_nonce(i: &[u8]) -> BerResult<'_, [u8; 32]> {
    parse_der_container(|i: &[u8], hdr: Header| {
        if hdr.tag() != Tag::Sequence {
            return Err(nom::Err::Error(BerError::BerTypeError));
        }
        let (i, tagged_nonce) = parse_der_tagged_explicit(1, parse_der_octetstring)(i)?;
        let (class, _tag, nonce) = tagged_nonce.as_tagged()?;
        if class != Class::ContextSpecific {
            return Err(nom::Err::Error(BerError::BerTypeError));
        }
        let nonce: [u8; 32] = nonce
            .as_slice()?
            .try_into()
            .map_err(|_| BerError::InvalidLength)?;
        Ok((i, nonce))
    })(i)
}
