// Copyright 2024 Contributors to the appattest project.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use super::INonceStore;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory challenge store, indexed by key id.
#[derive(Debug)]
pub struct MemoNonceStore {
    p: RwLock<HashMap<String, String>>,
}

impl Default for MemoNonceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoNonceStore {
    /// Returns a new empty MemoNonceStore
    pub fn new() -> Self {
        Self {
            p: Default::default(),
        }
    }

    /// Add to an existing (and possibly empty) MemoNonceStore the challenges
    /// loaded from a JSON object mapping key ids to challenges
    pub fn load_json(&mut self, j: &str) -> Result<(), Error> {
        let entries: HashMap<String, String> =
            serde_json::from_str(j).map_err(|e| Error::Syntax(e.to_string()))?;

        for (key_id, challenge) in entries {
            self.insert(&key_id, &challenge)?;
        }

        Ok(())
    }

    /// Record the challenge issued for `key_id`, replacing any earlier one
    pub fn insert(&self, key_id: &str, challenge: &str) -> Result<(), Error> {
        self.p
            .write()
            .map_err(|e| Error::Internal(e.to_string()))?
            .insert(key_id.to_string(), challenge.to_string());

        Ok(())
    }

    pub fn len(&self) -> Result<usize, Error> {
        self.p
            .read()
            .map(|p| p.len())
            .map_err(|e| Error::Internal(e.to_string()))
    }

    pub fn is_empty(&self) -> Result<bool, Error> {
        Ok(self.len()? == 0)
    }
}

#[async_trait]
impl INonceStore for MemoNonceStore {
    async fn lookup(&self, key_id: &str) -> Result<String, Error> {
        self.p
            .read()
            .map_err(|e| Error::Internal(e.to_string()))?
            .get(key_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("no challenge issued for key id {key_id}")))
    }
}
