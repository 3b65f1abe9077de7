// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `gen-secret` and `hash-password` commands.

use std::io::{self, Read};

use anyhow::Context;
use base64::{engine::general_purpose::STANDARD, Engine};

use tollgate_api::auth::password;

use crate::cli::{Cli, GenSecretArgs, HashPasswordArgs, SecretFormat};
use crate::error::{BinError, BinResult};

/// Shortest password accepted by the signup endpoint.
const MIN_PASSWORD_LEN: usize = tollgate_api::handlers::MIN_PASSWORD_LEN;

/// Prints a fresh random signing secret to stdout.
pub fn gen_secret(_cli: &Cli, args: GenSecretArgs) -> BinResult<()> {
    let mut secret = vec![0u8; usize::from(args.bytes)];
    getrandom::getrandom(&mut secret)
        .map_err(|e| BinError::runtime(format!("Failed to gather randomness: {}", e)))?;

    println!("{}", encode_secret(&secret, args.format));

    eprintln!();
    eprintln!("Store this secret securely. Use it as auth.secret in the config");
    eprintln!("or export TOLLGATE_AUTH_SECRET=<secret>.");

    Ok(())
}

/// Encodes secret bytes for display.
pub fn encode_secret(secret: &[u8], format: SecretFormat) -> String {
    match format {
        SecretFormat::Base64 => STANDARD.encode(secret),
        SecretFormat::Hex => hex::encode(secret),
    }
}

/// Prints the Argon2 PHC hash of a password for the `users` config section.
pub fn hash_password(_cli: &Cli, args: HashPasswordArgs) -> BinResult<()> {
    let plain = if args.stdin {
        let mut input = String::new();
        io::stdin()
            .read_to_string(&mut input)
            .context("Failed to read password from stdin")?;
        input.trim_end_matches(['\r', '\n']).to_string()
    } else {
        args.password
            .ok_or_else(|| BinError::config("No password provided. Use --stdin or pass it as an argument"))?
    };

    if plain.is_empty() {
        return Err(BinError::config("Password must not be empty"));
    }
    if plain.chars().count() < MIN_PASSWORD_LEN {
        eprintln!(
            "Warning: password is shorter than {} characters",
            MIN_PASSWORD_LEN
        );
    }

    let hash = password::hash_password(&plain).map_err(|e| BinError::runtime(e.to_string()))?;
    println!("{}", hash);

    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_secret() {
        let bytes = [0xde, 0xad, 0xbe, 0xef];
        assert_eq!(encode_secret(&bytes, SecretFormat::Hex), "deadbeef");
        assert_eq!(encode_secret(&bytes, SecretFormat::Base64), "3q2+7w==");
    }

    #[test]
    fn test_default_secret_meets_recommendation() {
        let secret = vec![0u8; 32];
        let encoded = encode_secret(&secret, SecretFormat::Base64);
        assert!(encoded.len() >= tollgate_api::auth::RECOMMENDED_SECRET_LEN);
    }
}
