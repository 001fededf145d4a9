// Copyright 2024 Contributors to the appattest project.
// SPDX-License-Identifier: Apache-2.0

use base64::{self, engine::general_purpose, Engine as _};

use super::errors::Error;

/// decodes bytes from a standard (padded) base64-encoded string
pub fn decode_str(v: &str) -> Result<Vec<u8>, Error> {
    general_purpose::STANDARD
        .decode(v.trim())
        .map_err(|e| Error::MalformedAttestation(format!("base64: {e}")))
}

/// encodes bytes as a standard (padded) base64 string
pub fn encode(v: &[u8]) -> String {
    general_purpose::STANDARD.encode(v)
}
