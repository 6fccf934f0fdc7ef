//! Proxy configuration resolution tests
//!
//! These manipulate TWITCH_CLIENT_ID / TWITCH_CLIENT_SECRET, so each one is
//! #[serial].

use agrd_common::config::{TomlConfig, CLIENT_ID_ENV, CLIENT_SECRET_ENV};
use agrd_common::Error;
use agrd_proxy::config::{ConfigOverrides, ProxyConfig};
use serial_test::serial;
use std::env;

fn clear_env() {
    env::remove_var(CLIENT_ID_ENV);
    env::remove_var(CLIENT_SECRET_ENV);
}

#[test]
#[serial]
fn test_credentials_from_toml() {
    clear_env();
    let mut toml_config = TomlConfig::default();
    toml_config.proxy.client_id = Some("toml-id".into());
    toml_config.proxy.client_secret = Some("toml-secret".into());

    let config = ProxyConfig::resolve(&toml_config, ConfigOverrides::default()).unwrap();
    assert_eq!(config.client_id, "toml-id");
    assert_eq!(config.client_secret, "toml-secret");
    assert_eq!(config.listen_addr(), "127.0.0.1:5780");
    assert_eq!(config.token_url, "https://id.twitch.tv/oauth2/token");
    assert_eq!(config.catalog_url, "https://api.igdb.com/v4");
}

#[test]
#[serial]
fn test_environment_beats_toml() {
    clear_env();
    env::set_var(CLIENT_ID_ENV, "env-id");
    env::set_var(CLIENT_SECRET_ENV, "env-secret");

    let mut toml_config = TomlConfig::default();
    toml_config.proxy.client_id = Some("toml-id".into());

    let config = ProxyConfig::resolve(&toml_config, ConfigOverrides::default()).unwrap();
    assert_eq!(config.client_id, "env-id");
    assert_eq!(config.client_secret, "env-secret");

    clear_env();
}

#[test]
#[serial]
fn test_missing_secret_is_config_error() {
    clear_env();
    env::set_var(CLIENT_ID_ENV, "env-id");

    let result = ProxyConfig::resolve(&TomlConfig::default(), ConfigOverrides::default());
    match result {
        Err(Error::Config(msg)) => {
            assert!(msg.contains(CLIENT_SECRET_ENV));
            assert!(!msg.contains("missing: TWITCH_CLIENT_ID"));
        }
        other => panic!("expected config error, got {:?}", other.map(|c| c.client_id)),
    }

    clear_env();
}

#[test]
#[serial]
fn test_cli_overrides_listen_address() {
    clear_env();
    let mut toml_config = TomlConfig::default();
    toml_config.proxy.port = 6000;
    toml_config.proxy.client_id = Some("id".into());
    toml_config.proxy.client_secret = Some("secret".into());

    let config = ProxyConfig::resolve(
        &toml_config,
        ConfigOverrides {
            host: Some("0.0.0.0".into()),
            port: None,
        },
    )
    .unwrap();
    assert_eq!(config.listen_addr(), "0.0.0.0:6000");

    let config = ProxyConfig::resolve(
        &toml_config,
        ConfigOverrides {
            host: None,
            port: Some(7000),
        },
    )
    .unwrap();
    assert_eq!(config.listen_addr(), "127.0.0.1:7000");
}
