// Copyright 2024 Contributors to the appattest project.
// SPDX-License-Identifier: Apache-2.0

use super::certificate::Certificate;
use super::errors::Error;

/// Number of certificates an App Attest statement must carry (leaf and
/// intermediate); the root is never shipped in the statement.
pub const CHAIN_LENGTH: usize = 2;

/// A fully validated [leaf, intermediate, root] chain
#[derive(Debug)]
pub struct TrustChain<'a> {
    leaf: Certificate,
    intermediate: Certificate,
    root: &'a Certificate,
}

impl<'a> TrustChain<'a> {
    /// Parse the supplied `x5c` entries and verify them up to `root`.
    ///
    /// Every link (leaf -> intermediate, intermediate -> root) must have the
    /// child's issuer equal to the parent's subject and a signature that
    /// verifies under the parent's key.  The first broken link aborts.
    pub fn verify(x5c: &[Vec<u8>], root: &'a Certificate) -> Result<Self, Error> {
        if x5c.len() != CHAIN_LENGTH {
            return Err(Error::InvalidChainLength(x5c.len()));
        }

        let chain = Self {
            leaf: Certificate::from_der(&x5c[0])?,
            intermediate: Certificate::from_der(&x5c[1])?,
            root,
        };

        let links = chain.links();

        for (index, pair) in links.windows(2).enumerate() {
            let (cert, issuer) = (pair[0], pair[1]);

            if cert.issuer() != issuer.subject() {
                return Err(Error::ChainBroken {
                    index,
                    detail: format!(
                        "issuer {:?} does not match next subject {:?}",
                        cert.issuer(),
                        issuer.subject()
                    ),
                });
            }

            match cert.is_signed_by(issuer) {
                Ok(true) => {}
                Ok(false) => {
                    return Err(Error::SignatureInvalid {
                        index,
                        detail: format!("not signed by {:?}", issuer.subject()),
                    })
                }
                Err(e) => {
                    return Err(Error::SignatureInvalid {
                        index,
                        detail: e.to_string(),
                    })
                }
            }

            tracing::debug!(index, subject = cert.subject(), "certificate link verified");
        }

        Ok(chain)
    }

    pub fn leaf(&self) -> &Certificate {
        &self.leaf
    }

    pub fn intermediate(&self) -> &Certificate {
        &self.intermediate
    }

    pub fn root(&self) -> &Certificate {
        self.root
    }

    /// [leaf, intermediate, root]
    pub fn links(&self) -> [&Certificate; 3] {
        [&self.leaf, &self.intermediate, self.root]
    }
}
