// Copyright 2024 Contributors to the appattest project.
// SPDX-License-Identifier: Apache-2.0

use super::base64;
use super::common::*;
use super::errors::Error;
use bitmask::*;
use ciborium::de::from_reader;
use ciborium::Value;

const FMT_LABEL: &str = "fmt";
const ATT_STMT_LABEL: &str = "attStmt";
const AUTH_DATA_LABEL: &str = "authData";
const X5C_LABEL: &str = "x5c";
const RECEIPT_LABEL: &str = "receipt";

/// The `fmt` value carried by App Attest attestation objects
pub const APPLE_APPATTEST_FORMAT: &str = "apple-appattest";

bitmask! {
    #[derive(Debug)]
    mask FieldSet: u8 where flags Field {
        Fmt      = 0x01,
        AttStmt  = 0x02,
        AuthData = 0x04,
    }
}

/// Attestation statement formats understood by this crate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    AppleAppAttest,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::AppleAppAttest => APPLE_APPATTEST_FORMAT,
        }
    }
}

impl TryFrom<&str> for Format {
    type Error = Error;

    fn try_from(v: &str) -> Result<Self, Error> {
        match v {
            APPLE_APPATTEST_FORMAT => Ok(Format::AppleAppAttest),
            unknown => Err(Error::MalformedAttestation(format!(
                "unsupported attestation format {unknown:?}"
            ))),
        }
    }
}

/// A decoded attestation object: the statement (certificate chain and
/// receipt) plus the raw authenticator data.
#[derive(Debug)]
pub struct AttestationObject {
    /// Attestation statement format
    pub format: Format,
    /// DER-encoded `x5c` entries, leaf first.  The length is not checked
    /// here; chain verification rejects anything but two entries.
    pub certificates: Vec<Vec<u8>>,
    /// Opaque receipt that can later be exchanged for fraud-risk metrics
    pub receipt: Vec<u8>,
    /// Raw authenticator data
    pub auth_data: Vec<u8>,

    fields: FieldSet,
}

impl Default for AttestationObject {
    fn default() -> Self {
        Self::new()
    }
}

impl AttestationObject {
    pub fn new() -> Self {
        Self {
            format: Format::AppleAppAttest,
            certificates: Default::default(),
            receipt: Default::default(),
            auth_data: Default::default(),
            fields: FieldSet::none(),
        }
    }

    /// Decode a base64-encoded CBOR attestation object.
    pub fn from_base64(v: &str) -> Result<Self, Error> {
        let buf = base64::decode_str(v)?;

        Self::decode(buf.as_slice())
    }

    /// Decode a CBOR-encoded attestation object.  The object must span the
    /// whole of `buf`.
    pub fn decode(buf: &[u8]) -> Result<Self, Error> {
        let mut rest = buf;

        let v: Value = from_reader(&mut rest)
            .map_err(|e| Error::MalformedAttestation(format!("CBOR: {e}")))?;

        if !rest.is_empty() {
            return Err(Error::MalformedAttestation("trailing bytes".to_string()));
        }

        let mut a = AttestationObject::new();

        if let Value::Map(contents) = v {
            a.parse(&contents)?;
        } else {
            return Err(Error::MalformedAttestation(
                "expecting map type".to_string(),
            ));
        }

        a.validate()?;

        Ok(a)
    }

    fn parse(&mut self, contents: &[(Value, Value)]) -> Result<(), Error> {
        for (k, v) in contents.iter() {
            match k.as_text() {
                Some(FMT_LABEL) => self.set_format(v)?,
                Some(ATT_STMT_LABEL) => self.set_statement(v)?,
                Some(AUTH_DATA_LABEL) => self.set_auth_data(v)?,
                _ => continue,
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), Error> {
        let mandatory = [
            (Field::Fmt, FMT_LABEL),
            (Field::AttStmt, ATT_STMT_LABEL),
            (Field::AuthData, AUTH_DATA_LABEL),
        ];

        for (f, n) in mandatory.iter() {
            if !self.fields.contains(*f) {
                return Err(Error::MalformedAttestation(format!("missing {n}")));
            }
        }

        Ok(())
    }

    fn check_duplicate(&self, f: Field, n: &str) -> Result<(), Error> {
        if self.fields.contains(f) {
            return Err(Error::MalformedAttestation(format!("duplicated {n}")));
        }
        Ok(())
    }

    fn set_format(&mut self, v: &Value) -> Result<(), Error> {
        self.check_duplicate(Field::Fmt, FMT_LABEL)?;

        let x = to_tstr(v, FMT_LABEL)?;

        self.format = Format::try_from(x.as_str())?;

        self.fields.set(Field::Fmt);

        Ok(())
    }

    fn set_statement(&mut self, v: &Value) -> Result<(), Error> {
        self.check_duplicate(Field::AttStmt, ATT_STMT_LABEL)?;

        let mut x5c = None;

        for (k, v) in to_map(v, ATT_STMT_LABEL)?.iter() {
            match k.as_text() {
                Some(X5C_LABEL) => x5c = Some(to_bstr_array(v, X5C_LABEL)?),
                Some(RECEIPT_LABEL) => self.receipt = to_bstr(v, RECEIPT_LABEL)?,
                _ => continue,
            }
        }

        self.certificates =
            x5c.ok_or_else(|| Error::MalformedAttestation(format!("missing {X5C_LABEL}")))?;

        self.fields.set(Field::AttStmt);

        Ok(())
    }

    fn set_auth_data(&mut self, v: &Value) -> Result<(), Error> {
        self.check_duplicate(Field::AuthData, AUTH_DATA_LABEL)?;

        self.auth_data = to_bstr(v, AUTH_DATA_LABEL)?;

        self.fields.set(Field::AuthData);

        Ok(())
    }
}
