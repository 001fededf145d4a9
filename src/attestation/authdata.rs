// Copyright 2024 Contributors to the appattest project.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use bitmask::*;

/// Location of a fixed-size field inside the authenticator data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub offset: usize,
    pub len: usize,
}

impl FieldSpec {
    pub const fn end(&self) -> usize {
        self.offset + self.len
    }

    // callers guarantee buf.len() >= self.end()
    fn read<'a>(&self, buf: &'a [u8]) -> &'a [u8] {
        &buf[self.offset..self.end()]
    }
}

pub const RP_ID_HASH: FieldSpec = FieldSpec {
    name: "rpIdHash",
    offset: 0,
    len: 32,
};

pub const FLAGS: FieldSpec = FieldSpec {
    name: "flags",
    offset: 32,
    len: 1,
};

pub const SIGN_COUNT: FieldSpec = FieldSpec {
    name: "signCount",
    offset: 33,
    len: 4,
};

/// The AAGUID slot, which App Attest fills with an environment marker
pub const ENVIRONMENT: FieldSpec = FieldSpec {
    name: "aaguid",
    offset: 37,
    len: 16,
};

pub const CREDENTIAL_ID_LEN: FieldSpec = FieldSpec {
    name: "credentialIdLength",
    offset: 53,
    len: 2,
};

/// The credential id starts right after its length prefix and has a
/// variable size.
pub const CREDENTIAL_ID_OFFSET: usize = CREDENTIAL_ID_LEN.end();

/// Fixed part of the layout, in order
pub const LAYOUT: [FieldSpec; 5] = [RP_ID_HASH, FLAGS, SIGN_COUNT, ENVIRONMENT, CREDENTIAL_ID_LEN];

bitmask! {
    #[derive(Debug)]
    pub mask AuthDataFlags: u8 where flags AuthDataFlag {
        UserPresent      = 0x01,
        UserVerified     = 0x04,
        AttestedCredData = 0x40,
        ExtensionData    = 0x80,
    }
}

const KNOWN_FLAGS: [(AuthDataFlag, &str); 4] = [
    (AuthDataFlag::UserPresent, "UP"),
    (AuthDataFlag::UserVerified, "UV"),
    (AuthDataFlag::AttestedCredData, "AT"),
    (AuthDataFlag::ExtensionData, "ED"),
];

/// Read-only view over an authenticator data record
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatorData<'a> {
    bytes: &'a [u8],
    credential_id_len: usize,
}

impl<'a> AuthenticatorData<'a> {
    /// Check that `bytes` is long enough for every field, including the
    /// variable-size credential id, and wrap it.  No field value is
    /// validated here.
    pub fn parse(bytes: &'a [u8]) -> Result<Self, Error> {
        if bytes.len() < CREDENTIAL_ID_OFFSET {
            return Err(Error::TruncatedAuthData {
                expected: CREDENTIAL_ID_OFFSET,
                actual: bytes.len(),
            });
        }

        let mut l = [0u8; 2];
        l.copy_from_slice(CREDENTIAL_ID_LEN.read(bytes));
        let credential_id_len = u16::from_be_bytes(l) as usize;

        let expected = CREDENTIAL_ID_OFFSET + credential_id_len;

        if bytes.len() < expected {
            return Err(Error::TruncatedAuthData {
                expected,
                actual: bytes.len(),
            });
        }

        Ok(Self {
            bytes,
            credential_id_len,
        })
    }

    /// The whole record, as hashed into the nonce
    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn rp_id_hash(&self) -> &'a [u8] {
        RP_ID_HASH.read(self.bytes)
    }

    pub fn raw_flags(&self) -> u8 {
        FLAGS.read(self.bytes)[0]
    }

    pub fn flags(&self) -> AuthDataFlags {
        let raw = self.raw_flags();
        let mut m = AuthDataFlags::none();

        for (f, _) in KNOWN_FLAGS.iter() {
            if raw & (*f as u8) != 0 {
                m.set(*f);
            }
        }

        m
    }

    /// Short names (UP, UV, AT, ED) of the flags that are set
    pub fn flag_names(&self) -> Vec<&'static str> {
        let m = self.flags();

        KNOWN_FLAGS
            .iter()
            .filter(|(f, _)| m.contains(*f))
            .map(|(_, n)| *n)
            .collect()
    }

    pub fn sign_count(&self) -> u32 {
        let mut c = [0u8; 4];
        c.copy_from_slice(SIGN_COUNT.read(self.bytes));
        u32::from_be_bytes(c)
    }

    pub fn environment_tag(&self) -> &'a [u8] {
        ENVIRONMENT.read(self.bytes)
    }

    /// The environment tag as text, without its NUL padding
    pub fn environment_name(&self) -> String {
        let tag = self.environment_tag();
        let end = tag.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);

        String::from_utf8_lossy(&tag[..end]).into_owned()
    }

    pub fn credential_id_len(&self) -> usize {
        self.credential_id_len
    }

    pub fn credential_id(&self) -> &'a [u8] {
        &self.bytes[CREDENTIAL_ID_OFFSET..CREDENTIAL_ID_OFFSET + self.credential_id_len]
    }
}
