// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `validate` command.

use tollgate_api::auth::RECOMMENDED_SECRET_LEN;
use tollgate_api::config::{ApiConfig, ConfigLoader};

use crate::cli::{Cli, OutputFormat, ValidateArgs};
use crate::error::{BinError, BinResult};

/// Loads and validates the configuration and prints a summary.
pub fn validate(cli: &Cli, args: ValidateArgs) -> BinResult<()> {
    let source = cli
        .config
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(defaults)".to_string());

    let config = ConfigLoader::new()
        .load_optional(cli.config.as_deref())
        .map_err(|e| BinError::from(e).with_context("Configuration validation failed"))?;

    let warnings = collect_warnings(&config);

    match args.format {
        OutputFormat::Text => {
            println!("Configuration is valid: {}", source);
            println!();
            println!("Summary:");
            println!("  Listen:        {}", config.socket_addr());
            println!("  Token TTL:     {}s", config.auth.token_ttl_secs);
            println!("  Cookie:        {}", config.auth.cookie_name);
            println!("  Signup:        {}", if config.auth.signup_key().is_some() { "enabled" } else { "disabled" });
            println!("  Seed users:    {}", config.users.len());

            if !warnings.is_empty() {
                println!();
                println!("Warnings:");
                for warning in &warnings {
                    println!("  - {}", warning);
                }
            }

            if args.show_config {
                println!();
                println!("Parsed configuration:");
                println!("{}", serde_json::to_string_pretty(&config).unwrap_or_else(|_| "(serialization error)".to_string()));
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "valid": true,
                "config_path": source,
                "summary": {
                    "listen": config.socket_addr().to_string(),
                    "token_ttl_secs": config.auth.token_ttl_secs,
                    "cookie_name": config.auth.cookie_name,
                    "signup_enabled": config.auth.signup_key().is_some(),
                    "seed_users": config.users.len(),
                },
                "warnings": warnings,
                "config": if args.show_config { Some(&config) } else { None },
            });
            let rendered = serde_json::to_string_pretty(&output)
                .map_err(|e| BinError::runtime(e.to_string()))?;
            println!("{}", rendered);
        }
    }

    if args.strict && !warnings.is_empty() {
        return Err(BinError::config(format!(
            "Strict mode: {} warning(s) found",
            warnings.len()
        )));
    }

    Ok(())
}

/// Returns non-fatal findings for a configuration that already validated.
pub fn collect_warnings(config: &ApiConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.auth.secret.len() < RECOMMENDED_SECRET_LEN {
        warnings.push(format!(
            "auth.secret is shorter than {} bytes",
            RECOMMENDED_SECRET_LEN
        ));
    }
    if !config.auth.cookie_secure {
        warnings.push("auth.cookie_secure is off; cookies will be sent over plain HTTP".to_string());
    }
    if config.users.is_empty() && config.auth.signup_key().is_none() {
        warnings.push("No seed users and signup is disabled; nobody can log in".to_string());
    }
    if config.cors.allows_any_origin() {
        warnings.push("CORS allows any origin".to_string());
    }

    warnings
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tollgate_api::config::{AuthConfig, CorsConfig};

    #[test]
    fn test_warnings_for_defaults() {
        let config = ApiConfig::default().with_auth(AuthConfig::new("short"));
        let warnings = collect_warnings(&config);

        assert!(warnings.iter().any(|w| w.contains("auth.secret")));
        assert!(warnings.iter().any(|w| w.contains("cookie_secure")));
        assert!(warnings.iter().any(|w| w.contains("nobody can log in")));
        assert!(warnings.iter().any(|w| w.contains("CORS")));
    }

    #[test]
    fn test_no_warnings_for_hardened_config() {
        let mut auth = AuthConfig::new("a-very-long-secret-value-0123456789abcdef")
            .with_signup_key("invite-only");
        auth.cookie_secure = true;

        let mut config = ApiConfig::default().with_auth(auth);
        config.cors = CorsConfig::strict(vec!["https://app.example.com".to_string()]);

        assert!(collect_warnings(&config).is_empty());
    }
}
