// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Configuration Integration Tests
//!
//! Configuration files on disk feeding a running application.

use std::fs;

use tollgate_api::config::{ConfigError, ConfigLoader};
use tollgate_tests::common::temp_test_dir;
use tollgate_tests::prelude::*;

fn seed_yaml() -> String {
    let mut yaml = String::from("users:\n");
    for seed in UserFixtures::seeds() {
        yaml.push_str(&format!(
            "  - id: {}\n    username: {}\n    email: {}\n    password_hash: \"{}\"\n    role: {}\n",
            seed.id.unwrap_or_default(),
            seed.username,
            seed.email,
            seed.password_hash,
            seed.role
        ));
    }
    yaml
}

#[tokio::test]
async fn test_yaml_config_drives_application() {
    let dir = temp_test_dir("tollgate-config");
    let path = dir.path().join("tollgate.yaml");
    fs::write(
        &path,
        format!(
            "port: 9090\nrequest_timeout: 5s\nauth:\n  secret: \"{}\"\n  token_ttl_secs: 600\n  cookie_name: sid\n  cookie_secure: true\n{}",
            TEST_SECRET,
            seed_yaml()
        ),
    )
    .unwrap();

    let config = ConfigLoader::new().with_env_vars(false).load(&path).unwrap();
    assert_eq!(config.port, 9090);
    assert_eq!(config.users.len(), 3);

    let app = TestApp::with_config(config);
    let response = app
        .login(UserFixtures::ADMIN.username, UserFixtures::ADMIN.password)
        .await;

    response.assert_status(StatusCode::OK);
    assert_eq!(response.body["expires_in"], 600);

    let cookie = response.set_cookie().unwrap();
    assert!(cookie.starts_with("sid="));
    assert!(cookie.contains("Max-Age=600"));
    assert!(cookie.ends_with("; Secure"));

    // The renamed cookie authenticates; the default name does not
    let token = response.token().to_string();
    app.send(TestRequest::get("/api/auth/me").cookie("sid", &token))
        .await
        .assert_status(StatusCode::OK);
    app.send(TestRequest::get("/api/auth/me").cookie("auth_token", &token))
        .await
        .assert_unauthenticated();
}

#[tokio::test]
async fn test_environment_overrides_file() {
    let dir = temp_test_dir("tollgate-config");
    let path = dir.path().join("tollgate.toml");
    fs::write(&path, "port = 7000\n\n[auth]\nsecret = \"file-secret-that-is-long-enough-0123\"\n").unwrap();

    let loader = ConfigLoader::new().with_env_vars(false);
    let mut config = loader.load(&path).unwrap();
    loader
        .apply_overrides(&mut config, |name| match name {
            "TOLLGATE_AUTH_SECRET" => Some(TEST_SECRET.to_string()),
            "TOLLGATE_SIGNUP_KEY" => Some(SIGNUP_KEY.to_string()),
            _ => None,
        })
        .unwrap();

    assert_eq!(config.port, 7000);
    assert_eq!(config.auth.secret, TEST_SECRET);
    assert_eq!(config.auth.signup_key(), Some(SIGNUP_KEY));

    // Tokens from an app on the file secret do not validate here
    let app = TestApp::with_config(config);
    let stale = TestApp::with_config({
        let mut c = ConfigFixtures::empty();
        c.auth.secret = "file-secret-that-is-long-enough-0123".to_string();
        c
    })
    .token_for(&UserFixtures::viewer());

    app.send(TestRequest::get("/api/auth/me").bearer(&stale))
        .await
        .assert_unauthenticated();
}

#[test]
fn test_invalid_seed_hash_rejected() {
    let dir = temp_test_dir("tollgate-config");
    let path = dir.path().join("tollgate.json");
    fs::write(
        &path,
        format!(
            r#"{{"auth":{{"secret":"{}"}},"users":[{{"username":"eve","email":"eve@example.com","password_hash":"plaintext","role":"viewer"}}]}}"#,
            TEST_SECRET
        ),
    )
    .unwrap();

    let err = ConfigLoader::new().with_env_vars(false).load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "users[0].password_hash"));
}

#[test]
fn test_missing_secret_rejected() {
    let dir = temp_test_dir("tollgate-config");
    let path = dir.path().join("tollgate.yaml");
    fs::write(&path, "port: 8081\n").unwrap();

    let err = ConfigLoader::new().with_env_vars(false).load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::MissingField { .. }));
}
