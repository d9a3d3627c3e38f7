// Copyright 2026 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use clap::{Parser, Subcommand};
use integritytoken::config::Settings;
use integritytoken::nonce::NonceLedger;
use integritytoken::service::{CheckRequest, CheckResponse, Format, Service};
use integritytoken::token::CertificateDigest;
use std::error::Error;
use std::fs;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Android attestation token verifier")]
struct Cli {
    /// Log filter directives, used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log: String,

    #[command(subcommand)]
    command: IntegrityTokenCli,
}

#[derive(Subcommand)]
enum IntegrityTokenCli {
    Nonce(NonceArgs),
    Check(CheckArgs),
    Digest(DigestArgs),
}

#[derive(Debug, clap::Args)]
#[command(long_about = None,
    about = "Generate a nonce in the form a client passes to the attestation \
    API")]
struct NonceArgs {
    #[arg(short, long, default_value_t = integritytoken::nonce::DEFAULT_NONCE_LENGTH)]
    length: usize,

    #[arg(short, long, value_enum, default_value_t = Format::Integrity)]
    format: Format,
}

#[derive(Debug, clap::Args)]
#[command(long_about = None,
    about = "Decode the supplied attestation token and appraise it against \
    the policy file.  Key material and credentials are taken from the \
    environment")]
struct CheckArgs {
    #[arg(short, long, default_value = "config.json")]
    config: String,

    /// The token, or @FILE to read it from a file
    #[arg(short, long)]
    token: String,

    #[arg(short, long, value_enum, default_value_t = Format::Integrity)]
    format: Format,

    /// Play Integrity decode mode: local or delegated
    #[arg(short, long)]
    mode: Option<String>,

    /// Nonce check mode.  Nonces issued by a previous invocation are not
    /// known to this one, hence the default.
    #[arg(short, long, default_value = "device")]
    nonce: String,
}

#[derive(Debug, clap::Args)]
#[command(long_about = None,
    about = "Compute the SHA-256 digest of an app signing certificate (DER or \
    PEM) in the forms used by the policy file")]
struct DigestArgs {
    #[arg(short, long, default_value = "signing.crt")]
    cert: String,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        IntegrityTokenCli::Nonce(args) => println!("{}", nonce(&args)),

        IntegrityTokenCli::Check(args) => match check(&args).await {
            Ok(rsp) if rsp.verdict => println!("{:#}", rsp.body),
            Ok(rsp) => {
                eprintln!("check failed: {}", rsp.error().unwrap_or("unknown error"));
                std::process::exit(1)
            }
            Err(e) => {
                eprintln!("check failed: {e}");
                std::process::exit(2)
            }
        },

        IntegrityTokenCli::Digest(args) => match digest(&args) {
            Ok(j) => println!("{j}"),
            Err(e) => {
                eprintln!("digest failed: {e}");
                std::process::exit(2)
            }
        },
    }
}

fn nonce(args: &NonceArgs) -> String {
    let n = NonceLedger::new().issue(args.length);

    match args.format {
        Format::Integrity => n.to_base64url(),
        Format::SafetyNet => n.into(),
    }
}

async fn check(args: &CheckArgs) -> Result<CheckResponse, Box<dyn Error>> {
    let j = fs::read_to_string(&args.config)?;

    let settings = Settings::from_env(&j)?;

    let service = Service::new(settings)?;

    let token = match args.token.strip_prefix('@') {
        Some(path) => fs::read_to_string(path)?.trim().to_string(),
        None => args.token.clone(),
    };

    let req = CheckRequest {
        token: Some(token),
        mode: args.mode.clone(),
        nonce: Some(args.nonce.clone()),
    };

    let rsp = match args.format {
        Format::Integrity => service.check_integrity(&req).await,
        Format::SafetyNet => service.check_safetynet(&req),
    };

    Ok(rsp)
}

fn digest(args: &DigestArgs) -> Result<String, Box<dyn Error>> {
    let c = fs::read(&args.cert)?;

    let d = CertificateDigest::from_certificate(&c)?;

    Ok(serde_json::to_string_pretty(&d)?)
}
