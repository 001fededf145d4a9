// Copyright 2024 Contributors to the appattest project.
// SPDX-License-Identifier: Apache-2.0

//! The attestation module decodes an App Attest attestation object, verifies
//! its certificate chain up to the Apple App Attestation Root CA and checks
//! the authenticator data against the challenge issued to the device.
//!
//! # Example
//!
//! The following example assumes that the challenge handed to the device
//! has been recorded in a nonce store under the device's key id, and that
//! `attestation` holds the base64 attestation object the device sent back.
//!
//! ```
//! use appattest::attestation::Verifier;
//! use appattest::config::{Config, Environment};
//! use appattest::store::MemoNonceStore;
//!
//! const attestation: &str = include_str!("../../testdata/attestation.b64");
//! const key_id: &str = "epE8EyZIJVvPRZ8the/TRY4AirjUcW0rS67sqfw+LEQ=";
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let mut nonces = MemoNonceStore::new();
//! nonces
//!     .load_json(include_str!("../../testdata/nonces.json"))
//!     .expect("loading nonces");
//!
//! let config = Config::new("4RKXM42395.junyaoc.Miracam", Environment::Development);
//! let verifier = Verifier::new(config).expect("loading root certificate");
//!
//! // decode, verify the chain, parse authData, extract the nonce extension
//! // and run the consistency checks
//! let verdict = verifier
//!     .verify_attestation(key_id, attestation, &nonces)
//!     .await
//!     .expect("verifying attestation");
//!
//! assert!(verdict.is_valid());
//!
//! // keep the public key to verify later assertions from the same device
//! let _ = verdict.public_key;
//! # });
//! ```

pub use self::authdata::{AuthDataFlag, AuthDataFlags, AuthenticatorData};
pub use self::certificate::Certificate;
pub use self::chain::TrustChain;
pub use self::consistency::{nonce_digest, ConsistencyReport};
pub use self::errors::Error;
pub use self::extension::{NonceExtension, APP_ATTEST_NONCE_OID};
pub use self::object::{AttestationObject, Format};
pub use self::verifier::{Verdict, Verifier};

pub mod authdata;
mod base64;
mod certificate;
mod chain;
mod common;
mod consistency;
mod errors;
mod extension;
mod object;
mod verifier;
