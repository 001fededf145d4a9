// Copyright 2024 Contributors to the appattest project.
// SPDX-License-Identifier: Apache-2.0

//! End-to-end verification of attestations minted by a throwaway PKI that
//! mimics the App Attest one (P-384 CAs, P-256 credential key).

use appattest::attestation::{
    nonce_digest, AuthDataFlag, AuthenticatorData, Error, Verifier, APP_ATTEST_NONCE_OID,
};
use appattest::config::{Config, Environment, DEVELOPMENT_TAG};
use appattest::store::MemoNonceStore;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use ciborium::Value;
use openssl::asn1::{Asn1Object, Asn1OctetString, Asn1Time};
use openssl::bn::BigNumContext;
use openssl::ec::{EcGroup, EcKey, PointConversionForm};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::{PKey, Private};
use openssl::rsa::Rsa;
use openssl::sha::sha256;
use openssl::x509::extension::{BasicConstraints, KeyUsage};
use openssl::x509::{X509Builder, X509Extension, X509Name, X509NameBuilder, X509};

const APP_ID: &str = "TEAMID1234.com.example.app";
const CHALLENGE: &[u8] = b"challenge issued by the server";

fn name(cn: &str) -> X509Name {
    let mut n = X509NameBuilder::new().unwrap();
    n.append_entry_by_nid(Nid::COMMONNAME, cn).unwrap();
    n.append_entry_by_nid(Nid::ORGANIZATIONNAME, "Example Inc.")
        .unwrap();
    n.build()
}

fn ec_key(curve: Nid) -> PKey<Private> {
    let group = EcGroup::from_curve_name(curve).unwrap();
    PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap()
}

fn uncompressed_point(key: &PKey<Private>) -> Vec<u8> {
    let ec = key.ec_key().unwrap();
    let mut ctx = BigNumContext::new().unwrap();
    ec.public_key()
        .to_bytes(ec.group(), PointConversionForm::UNCOMPRESSED, &mut ctx)
        .unwrap()
}

fn nonce_extension(nonce: &[u8; 32]) -> X509Extension {
    let mut der = vec![0x30, 0x24, 0xa1, 0x22, 0x04, 0x20];
    der.extend_from_slice(nonce);

    let oid = Asn1Object::from_str(APP_ATTEST_NONCE_OID).unwrap();
    let content = Asn1OctetString::new_from_bytes(&der).unwrap();

    X509Extension::new_from_der(&oid, false, &content).unwrap()
}

fn certificate(
    subject: &X509Name,
    issuer: &X509Name,
    key: &PKey<Private>,
    signer: &PKey<Private>,
    extensions: Vec<X509Extension>,
) -> X509 {
    let mut b = X509Builder::new().unwrap();
    b.set_version(2).unwrap();
    b.set_subject_name(subject).unwrap();
    b.set_issuer_name(issuer).unwrap();
    b.set_pubkey(key).unwrap();
    b.set_not_before(&Asn1Time::days_from_now(0).unwrap())
        .unwrap();
    b.set_not_after(&Asn1Time::days_from_now(365).unwrap())
        .unwrap();
    for e in extensions {
        b.append_extension(e).unwrap();
    }
    b.sign(signer, MessageDigest::sha384()).unwrap();
    b.build()
}

fn ca_extensions() -> Vec<X509Extension> {
    vec![
        BasicConstraints::new().critical().ca().build().unwrap(),
        KeyUsage::new()
            .critical()
            .key_cert_sign()
            .crl_sign()
            .build()
            .unwrap(),
    ]
}

fn auth_data(sign_count: u32, credential_id: &[u8]) -> Vec<u8> {
    let mut v = sha256(APP_ID.as_bytes()).to_vec();
    v.push(0x40);
    v.extend_from_slice(&sign_count.to_be_bytes());
    v.extend_from_slice(&DEVELOPMENT_TAG);
    v.extend_from_slice(&(credential_id.len() as u16).to_be_bytes());
    v.extend_from_slice(credential_id);
    // truncated COSE key, never looked at
    v.extend_from_slice(&[0xa5, 0x01, 0x02, 0x03, 0x26]);
    v
}

#[derive(Default)]
struct Options {
    sign_count: u32,
    without_nonce: bool,
    leaf_issuer: Option<&'static str>,
    rogue_intermediate_signer: bool,
    credential_id: Option<[u8; 32]>,
    rsa_leaf: bool,
}

struct Device {
    root_pem: String,
    x5c: Vec<Vec<u8>>,
    auth_data: Vec<u8>,
    key_id: String,
}

impl Device {
    fn new(o: Options) -> Self {
        let root_name = name("Example App Attestation Root CA");
        let root_key = ec_key(Nid::SECP384R1);
        let root = certificate(&root_name, &root_name, &root_key, &root_key, ca_extensions());

        let int_name = name("Example App Attestation CA 1");
        let int_key = ec_key(Nid::SECP384R1);
        let int_signer = if o.rogue_intermediate_signer {
            ec_key(Nid::SECP384R1)
        } else {
            root_key.clone()
        };
        let intermediate =
            certificate(&int_name, &root_name, &int_key, &int_signer, ca_extensions());

        let (leaf_key, leaf_point) = if o.rsa_leaf {
            let k = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();
            let der = k.public_key_to_der().unwrap();
            (k, der)
        } else {
            let k = ec_key(Nid::X9_62_PRIME256V1);
            let p = uncompressed_point(&k);
            (k, p)
        };
        let credential_id = o.credential_id.unwrap_or_else(|| sha256(&leaf_point));
        let auth_data = auth_data(o.sign_count, &credential_id);

        let extensions = if o.without_nonce {
            vec![]
        } else {
            vec![nonce_extension(&nonce_digest(&auth_data, CHALLENGE))]
        };
        let leaf_issuer = match o.leaf_issuer {
            Some(cn) => name(cn),
            None => name("Example App Attestation CA 1"),
        };
        let leaf = certificate(
            &name(&hex::encode(credential_id)),
            &leaf_issuer,
            &leaf_key,
            &int_key,
            extensions,
        );

        Self {
            root_pem: String::from_utf8(root.to_pem().unwrap()).unwrap(),
            x5c: vec![leaf.to_der().unwrap(), intermediate.to_der().unwrap()],
            auth_data,
            key_id: STANDARD.encode(credential_id),
        }
    }

    fn attestation(&self) -> String {
        let x5c = self.x5c.iter().cloned().map(Value::Bytes).collect();
        let v = Value::Map(vec![
            (
                Value::Text("fmt".to_string()),
                Value::Text("apple-appattest".to_string()),
            ),
            (
                Value::Text("attStmt".to_string()),
                Value::Map(vec![
                    (Value::Text("x5c".to_string()), Value::Array(x5c)),
                    (
                        Value::Text("receipt".to_string()),
                        Value::Bytes(b"receipt".to_vec()),
                    ),
                ]),
            ),
            (
                Value::Text("authData".to_string()),
                Value::Bytes(self.auth_data.clone()),
            ),
        ]);

        let mut buf = vec![];
        ciborium::ser::into_writer(&v, &mut buf).unwrap();
        STANDARD.encode(buf)
    }

    fn verifier(&self, environment: Environment) -> Verifier {
        let config = Config::new(APP_ID, environment).with_root_ca(self.root_pem.clone());
        Verifier::new(config).expect("building verifier")
    }

    fn nonces(&self) -> MemoNonceStore {
        let s = MemoNonceStore::new();
        s.insert(&self.key_id, &STANDARD.encode(CHALLENGE)).unwrap();
        s
    }

    async fn verify(&self, environment: Environment) -> Result<appattest::attestation::Verdict, Error> {
        self.verifier(environment)
            .verify_attestation(&self.key_id, &self.attestation(), &self.nonces())
            .await
    }
}

#[tokio::test]
async fn synthetic_attestation_ok() {
    let d = Device::new(Options::default());

    let verdict = d.verify(Environment::Development).await.unwrap();

    assert!(verdict.is_valid(), "{:?}", verdict.report);
    assert_eq!(verdict.leaf_key_id.as_deref(), Some(d.key_id.as_str()));
    assert_eq!(verdict.receipt, b"receipt");
}

#[tokio::test]
async fn used_key_fails_sign_count_only() {
    let d = Device::new(Options {
        sign_count: 1,
        ..Default::default()
    });

    let verdict = d.verify(Environment::Development).await.unwrap();

    assert!(!verdict.is_valid());
    assert_eq!(verdict.report.failed_checks(), vec!["sign-count"]);
}

#[tokio::test]
async fn production_verifier_fails_environment_only() {
    let d = Device::new(Options::default());

    let verdict = d.verify(Environment::Production).await.unwrap();

    assert_eq!(verdict.report.failed_checks(), vec!["environment"]);
}

#[tokio::test]
async fn truncated_auth_data() {
    let mut d = Device::new(Options::default());
    d.auth_data.truncate(60);

    let r = d.verify(Environment::Development).await;

    assert_eq!(
        r.unwrap_err(),
        Error::TruncatedAuthData {
            expected: 87,
            actual: 60
        }
    );
}

#[tokio::test]
async fn leaf_without_nonce() {
    let d = Device::new(Options {
        without_nonce: true,
        ..Default::default()
    });

    let r = d.verify(Environment::Development).await;

    assert!(matches!(r, Err(Error::MissingExtension(_))));
}

#[tokio::test]
async fn leaf_names_another_issuer() {
    let d = Device::new(Options {
        leaf_issuer: Some("Somebody Else CA"),
        ..Default::default()
    });

    let r = d.verify(Environment::Development).await;

    assert!(matches!(r, Err(Error::ChainBroken { index: 0, .. })));
}

#[tokio::test]
async fn intermediate_not_signed_by_root() {
    let d = Device::new(Options {
        rogue_intermediate_signer: true,
        ..Default::default()
    });

    let r = d.verify(Environment::Development).await;

    assert!(matches!(r, Err(Error::SignatureInvalid { index: 1, .. })));
}

#[tokio::test]
async fn extra_certificate() {
    let mut d = Device::new(Options::default());
    let root = d.x5c[1].clone();
    d.x5c.push(root);

    let r = d.verify(Environment::Development).await;

    assert_eq!(r.unwrap_err(), Error::InvalidChainLength(3));
}

#[tokio::test]
async fn bundled_root_rejects_foreign_pki() {
    let d = Device::new(Options::default());
    let verifier = Verifier::new(Config::new(APP_ID, Environment::Development)).unwrap();

    let r = verifier
        .verify_attestation(&d.key_id, &d.attestation(), &d.nonces())
        .await;

    assert!(matches!(r, Err(Error::ChainBroken { index: 1, .. })));
}

#[tokio::test]
async fn credential_id_not_derived_from_leaf_key() {
    let d = Device::new(Options {
        credential_id: Some([0x42; 32]),
        ..Default::default()
    });

    let verdict = d.verify(Environment::Development).await.unwrap();

    assert_ne!(verdict.leaf_key_id.as_deref(), Some(d.key_id.as_str()));
    assert!(!verdict.is_valid());
    assert_eq!(verdict.report.failed_checks(), vec!["key-id"]);
}

#[tokio::test]
async fn rsa_leaf_yields_verdict_without_public_key() {
    let d = Device::new(Options {
        rsa_leaf: true,
        ..Default::default()
    });

    let verdict = d.verify(Environment::Development).await.unwrap();

    assert_eq!(verdict.public_key, None);
    assert_eq!(verdict.leaf_key_id, None);
    assert_eq!(verdict.report.failed_checks(), vec!["key-id"]);
}

#[test]
fn auth_data_flags_are_nameable() {
    let d = Device::new(Options::default());

    let a = AuthenticatorData::parse(&d.auth_data).unwrap();

    assert!(a.flags().contains(AuthDataFlag::AttestedCredData));
    assert!(!a.flags().contains(AuthDataFlag::UserPresent));
}
