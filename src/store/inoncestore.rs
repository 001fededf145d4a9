// Copyright 2024 Contributors to the appattest project.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use async_trait::async_trait;

/// Interface to the store where issued challenges are kept until the device
/// answers with an attestation.
#[async_trait]
pub trait INonceStore: Send + Sync {
    /// Lookup the base64 challenge previously issued to the device holding
    /// `key_id`
    async fn lookup(&self, key_id: &str) -> Result<String, Error>;
}
