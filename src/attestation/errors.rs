// Copyright 2024 Contributors to the appattest project.
// SPDX-License-Identifier: Apache-2.0

/// Structural failures abort a verification before any consistency check
/// runs.  Consistency failures are never reported through this type: they
/// surface as `false` entries in a [`ConsistencyReport`](super::ConsistencyReport).
#[derive(thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("Malformed attestation: {0}")]
    MalformedAttestation(String),
    #[error("Invalid chain length: expecting 2 certificates, got {0}")]
    InvalidChainLength(usize),
    #[error("Chain broken at index {index}: {detail}")]
    ChainBroken { index: usize, detail: String },
    #[error("Signature invalid at index {index}: {detail}")]
    SignatureInvalid { index: usize, detail: String },
    #[error("Missing extension: {0}")]
    MissingExtension(String),
    #[error("Truncated authenticator data: expecting at least {expected} bytes, got {actual}")]
    TruncatedAuthData { expected: usize, actual: usize },
    #[error("Nonce lookup failed: {0}")]
    NonceLookup(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::MalformedAttestation(e)
            | Error::MissingExtension(e)
            | Error::NonceLookup(e)
            | Error::Config(e) => {
                write!(f, "{}", e)
            }
            Error::InvalidChainLength(n) => write!(f, "chain length {}", n),
            Error::ChainBroken { index, detail } | Error::SignatureInvalid { index, detail } => {
                write!(f, "[{}] {}", index, detail)
            }
            Error::TruncatedAuthData { expected, actual } => {
                write!(f, "{} < {}", actual, expected)
            }
        }
    }
}
