// Copyright 2024 Contributors to the appattest project.
// SPDX-License-Identifier: Apache-2.0

//! Apple App Attest attestation verification.
//!
//! This crate provides an API to decode and verify the attestation object an
//! iOS application obtains from the [App Attest] service when it generates a
//! new key, and to check that the attestation binds the key to the expected
//! application, environment and server-issued challenge.
//!
//! The API allows:
//! * Decoding a base64, CBOR-encoded `apple-appattest` attestation object
//! * Verifying the credential certificate chain against the pinned root
//! * Checking the authenticator data and nonce against the configuration
//!
//! [App Attest]: https://developer.apple.com/documentation/devicecheck/validating-apps-that-connect-to-your-server

pub mod attestation;
pub mod config;
pub mod store;
