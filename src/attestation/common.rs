// Copyright 2024 Contributors to the appattest project.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use ciborium::Value;

pub(crate) fn to_bstr(v: &Value, n: &str) -> Result<Vec<u8>, Error> {
    v.as_bytes()
        .cloned()
        .ok_or_else(|| Error::MalformedAttestation(format!("{n} MUST be bstr")))
}

pub(crate) fn to_tstr(v: &Value, n: &str) -> Result<String, Error> {
    v.as_text()
        .map(str::to_string)
        .ok_or_else(|| Error::MalformedAttestation(format!("{n} MUST be tstr")))
}

pub(crate) fn to_map<'a>(v: &'a Value, n: &str) -> Result<&'a Vec<(Value, Value)>, Error> {
    v.as_map()
        .ok_or_else(|| Error::MalformedAttestation(format!("{n} MUST be map")))
}

pub(crate) fn to_bstr_array(v: &Value, n: &str) -> Result<Vec<Vec<u8>>, Error> {
    let x = v
        .as_array()
        .ok_or_else(|| Error::MalformedAttestation(format!("{n} MUST be array")))?;

    x.iter()
        .enumerate()
        .map(|(i, xi)| to_bstr(xi, &format!("{n}[{i}]")))
        .collect()
}
