// Copyright 2024 Contributors to the appattest project.
// SPDX-License-Identifier: Apache-2.0

//! Collaborators the verifier reads from: the pinned trust anchor and the
//! store of challenges issued to devices.

pub use self::errors::Error;
pub use self::inoncestore::INonceStore;
pub use self::memo_noncestore::MemoNonceStore;
pub use self::trustanchor::TrustAnchor;
pub use self::trustanchor::APPLE_APP_ATTESTATION_ROOT_CA_PEM;

mod errors;
mod inoncestore;
mod memo_noncestore;
mod trustanchor;
