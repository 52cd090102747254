//! Unit tests for configuration loading, precedence and resolution.

use ortho_config::MergeComposer;
use rstest::rstest;
use serde_json::{Value, json};

use super::{ConfigError, RepogateConfig};

/// Applies a configuration layer to the composer based on the layer type.
fn apply_layer(composer: &mut MergeComposer, layer_type: &str, value: Value) {
    match layer_type {
        "defaults" => composer.push_defaults(value),
        "file" => composer.push_file(value, None),
        "environment" => composer.push_environment(value),
        "cli" => composer.push_cli(value),
        _ => panic!("unknown layer type: {layer_type}"),
    }
}

fn configured() -> RepogateConfig {
    RepogateConfig {
        identity_url: Some("https://project.supabase.co".to_owned()),
        identity_api_key: Some("anon-key".to_owned()),
        ..RepogateConfig::default()
    }
}

#[rstest]
#[case::file_overrides_defaults(
    vec![("defaults", json!({"bind_address": "0.0.0.0:1"})), ("file", json!({"bind_address": "0.0.0.0:2"}))],
    "0.0.0.0:2",
    "file should override default"
)]
#[case::environment_overrides_file(
    vec![("file", json!({"bind_address": "0.0.0.0:2"})), ("environment", json!({"bind_address": "0.0.0.0:3"}))],
    "0.0.0.0:3",
    "environment should override file"
)]
#[case::cli_overrides_environment(
    vec![("environment", json!({"bind_address": "0.0.0.0:3"})), ("cli", json!({"bind_address": "0.0.0.0:4"}))],
    "0.0.0.0:4",
    "CLI should override environment"
)]
fn layer_precedence(
    #[case] layers: Vec<(&str, Value)>,
    #[case] expected: &str,
    #[case] message: &str,
) {
    let mut composer = MergeComposer::new();
    for (layer_type, value) in layers {
        apply_layer(&mut composer, layer_type, value);
    }

    let config =
        RepogateConfig::merge_from_layers(composer.layers()).expect("merge should succeed");

    assert_eq!(config.bind_address, expected, "{message}");
}

#[rstest]
fn partial_overrides_preserve_lower_values() {
    let mut composer = MergeComposer::new();
    composer.push_defaults(json!({"profile_table": "profiles", "user_agent": "repogate"}));
    composer.push_file(json!({"profile_table": "accounts"}), None);

    let config =
        RepogateConfig::merge_from_layers(composer.layers()).expect("merge should succeed");

    assert_eq!(config.profile_table, "accounts");
    assert_eq!(config.user_agent, "repogate");
}

#[rstest]
fn defaults_match_the_documented_values() {
    let config = RepogateConfig::default();

    assert_eq!(config.bind_address, "0.0.0.0:8787");
    assert_eq!(config.github_api_base, "https://api.github.com");
    assert_eq!(config.profile_table, "profiles");
    assert_eq!(config.username_column, "github_username");
    assert_eq!(config.user_agent, "repogate");
    assert_eq!(config.log_filter, "info");
    assert!(config.identity_url.is_none());
    assert!(config.identity_api_key.is_none());
}

#[rstest]
fn bind_address_must_be_a_socket_address() {
    let config = RepogateConfig {
        bind_address: "localhost".to_owned(),
        ..RepogateConfig::default()
    };

    let error = config
        .resolve_bind_address()
        .expect_err("address should be rejected");

    assert!(matches!(error, ConfigError::Invalid { field: "bind_address", .. }));
}

#[rstest]
fn upstream_base_gains_a_trailing_slash() {
    let config = RepogateConfig {
        github_api_base: "https://ghe.example.com/api/v3".to_owned(),
        ..RepogateConfig::default()
    };

    let upstream = config.resolve_upstream().expect("upstream should resolve");

    assert_eq!(upstream.api_base.as_str(), "https://ghe.example.com/api/v3/");
    assert_eq!(upstream.user_agent, "repogate");
}

#[rstest]
fn identity_settings_come_from_configuration() {
    let identity = configured()
        .resolve_identity_with(|_| None)
        .expect("identity should resolve");

    assert_eq!(identity.base_url.as_str(), "https://project.supabase.co/");
    assert_eq!(identity.api_key, "anon-key");
    assert_eq!(identity.profile_table, "profiles");
    assert_eq!(identity.username_column, "github_username");
}

#[rstest]
fn identity_falls_back_to_legacy_variables() {
    let identity = RepogateConfig::default()
        .resolve_identity_with(|name| match name {
            "SUPABASE_URL" => Some("https://legacy.supabase.co".to_owned()),
            "SUPABASE_ANON_KEY" => Some("legacy-key".to_owned()),
            _ => None,
        })
        .expect("identity should resolve");

    assert_eq!(identity.base_url.as_str(), "https://legacy.supabase.co/");
    assert_eq!(identity.api_key, "legacy-key");
}

#[rstest]
#[case::no_url(
    RepogateConfig { identity_api_key: Some("k".to_owned()), ..RepogateConfig::default() },
    ConfigError::MissingIdentityUrl
)]
#[case::no_key(
    RepogateConfig { identity_url: Some("https://p.supabase.co".to_owned()), ..RepogateConfig::default() },
    ConfigError::MissingIdentityApiKey
)]
fn missing_identity_values_are_reported(
    #[case] config: RepogateConfig,
    #[case] expected: ConfigError,
) {
    let error = config
        .resolve_identity_with(|_| None)
        .expect_err("identity should not resolve");

    assert_eq!(error, expected);
}

#[rstest]
fn identity_url_must_be_http() {
    let config = RepogateConfig {
        identity_url: Some("ftp://project.supabase.co".to_owned()),
        ..configured()
    };

    let error = config
        .resolve_identity_with(|_| None)
        .expect_err("identity should not resolve");

    assert!(matches!(error, ConfigError::Invalid { field: "identity_url", .. }));
}
