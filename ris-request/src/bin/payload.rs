//! Build a RIS request payload from a TOML request description
//!
//! ```text
//! ris-payload request.toml
//! ```
//!
//! The description may carry a `[config]` table (otherwise configuration is
//! read from `RIS_*` environment variables), a `[fields]` table of raw wire
//! fields, an optional `[payment]` table and the inquiry `mode`. The wire map
//! is printed to stdout as JSON.

use std::collections::BTreeMap;

use anyhow::Context;
use ris_request::{Config, InquiryMode, Payment, RequestValidator, RisRequest};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct RequestFile {
    config: Option<Config>,
    #[serde(default)]
    mode: InquiryMode,
    #[serde(default)]
    fields: BTreeMap<String, String>,
    payment: Option<PaymentSpec>,
}

#[derive(Debug, Deserialize)]
struct PaymentSpec {
    #[serde(rename = "type")]
    code: String,
    token: String,
    #[serde(default)]
    masked: bool,
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let path = std::env::args()
        .nth(1)
        .context("usage: ris-payload <request.toml>")?;
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path))?;
    let file: RequestFile =
        toml::from_str(&content).with_context(|| format!("failed to parse {}", path))?;

    let config = match file.config {
        Some(config) => config,
        None => Config::from_env()?,
    };

    let mut request = RisRequest::from_config(&config);
    for (key, value) in file.fields {
        request.set_field(key, value);
    }

    if let Some(spec) = file.payment {
        let payment = Payment::for_code(&spec.code, spec.token);
        if spec.masked {
            // Masking replaces an attached card payment
            request.set_payment(payment.clone())?;
            request.set_payment_masked(payment)?;
        } else {
            request.set_payment(payment)?;
        }
    }

    let validator = RequestValidator::new();
    for error in validator.validate(&request, file.mode) {
        tracing::error!(field = error.field(), kind = %error.kind(), "{}", error.message());
    }
    validator
        .validate_strict(&request, file.mode)
        .context("request failed validation")?;

    tracing::info!(mode = %file.mode, encoding = %request.payment_encoding(), "RIS request assembled");
    println!("{}", serde_json::to_string_pretty(&request.to_wire_map())?);

    Ok(())
}
