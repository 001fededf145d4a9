// Copyright 2024 Contributors to the appattest project.
// SPDX-License-Identifier: Apache-2.0

use appattest::attestation::{
    AttestationObject, AuthenticatorData, Certificate, NonceExtension, Verdict, Verifier,
};
use appattest::config::{Config, Environment};
use appattest::store::MemoNonceStore;
use clap::Parser;
use serde_json::json;
use std::error::Error;
use std::fs;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
enum AppAttestCli {
    Verify(VerifyArgs),
    Inspect(InspectArgs),
}

#[derive(Debug, clap::Args)]
#[command(author, version, long_about = None,
    about = "Verify the supplied App Attest attestation object against the \
    challenge recorded for its key id")]
struct VerifyArgs {
    #[arg(short, long, default_value = "attestation.b64")]
    attestation: String,

    /// base64 key id the device reported alongside the attestation
    #[arg(short, long)]
    key_id: String,

    /// JSON object mapping key ids to the challenges issued for them
    #[arg(short, long, default_value = "nonces.json")]
    nonces: String,

    /// JSON verifier configuration; --app-id and --environment are used
    /// when it is not given
    #[arg(short, long)]
    config: Option<String>,

    #[arg(long)]
    app_id: Option<String>,

    #[arg(short, long, value_enum, default_value_t = Environment::Production)]
    environment: Environment,

    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, clap::Args)]
#[command(author, version, long_about = None,
    about = "Decode the supplied App Attest attestation object and dump its \
    contents without verifying it")]
struct InspectArgs {
    #[arg(short, long, default_value = "attestation.b64")]
    attestation: String,

    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() {
    match AppAttestCli::parse() {
        AppAttestCli::Verify(args) => {
            init_tracing(args.verbose);
            match verify(&args).await {
                Ok(v) if v.is_valid() => println!("verification successful"),
                Ok(v) => {
                    eprintln!(
                        "verification failed: {}",
                        v.report.failed_checks().join(", ")
                    );
                    std::process::exit(1);
                }
                Err(e) => {
                    eprintln!("verification failed: {e}");
                    std::process::exit(1);
                }
            }
        }

        AppAttestCli::Inspect(args) => {
            init_tracing(args.verbose);
            match inspect(&args) {
                Ok(j) => println!("{j}"),
                Err(e) => {
                    eprintln!("inspection failed: {e}");
                    std::process::exit(1);
                }
            }
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(level))
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(args: &VerifyArgs) -> Result<Config, Box<dyn Error>> {
    if let Some(path) = &args.config {
        let j = fs::read_to_string(path)?;
        return Ok(Config::from_json(&j)?);
    }

    let app_id = args
        .app_id
        .as_deref()
        .ok_or("either --config or --app-id is required")?;

    Ok(Config::new(app_id, args.environment))
}

async fn verify(args: &VerifyArgs) -> Result<Verdict, Box<dyn Error>> {
    let verifier = Verifier::new(load_config(args)?)?;

    let j = fs::read_to_string(&args.nonces)?;
    let mut nonces = MemoNonceStore::new();
    nonces.load_json(&j)?;

    let attestation = fs::read_to_string(&args.attestation)?;

    let verdict = verifier
        .verify_attestation(&args.key_id, &attestation, &nonces)
        .await?;

    println!("{}", serde_json::to_string_pretty(&verdict)?);

    Ok(verdict)
}

fn inspect(args: &InspectArgs) -> Result<String, Box<dyn Error>> {
    let attestation = fs::read_to_string(&args.attestation)?;

    let object = AttestationObject::from_base64(&attestation)?;

    let certificates = object
        .certificates
        .iter()
        .map(|der| {
            Certificate::from_der(der).map(|c| {
                json!({
                    "subject": c.subject(),
                    "issuer": c.issuer(),
                })
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let nonce = match object.certificates.first() {
        Some(der) => NonceExtension::extract(&Certificate::from_der(der)?)
            .ok()
            .and_then(|e| e.nonce())
            .map(hex::encode),
        None => None,
    };

    let a = AuthenticatorData::parse(&object.auth_data)?;

    let j = json!({
        "fmt": object.format.as_str(),
        "certificates": certificates,
        "nonce": nonce,
        "receipt-len": object.receipt.len(),
        "auth-data": {
            "rp-id-hash": hex::encode(a.rp_id_hash()),
            "flags": a.flag_names(),
            "sign-count": a.sign_count(),
            "environment": a.environment_name(),
            "credential-id": hex::encode(a.credential_id()),
        },
    });

    Ok(serde_json::to_string_pretty(&j)?)
}
