// Read/write split resolution through the configuration surface

#![allow(clippy::unwrap_used, clippy::expect_used)]

use snapmig_core::config::SnapConfig;
use snapmig_core::ConnectionResolver;
use std::collections::BTreeSet;

fn config(connection_toml: &str) -> SnapConfig {
    SnapConfig::from_toml_str(&format!(
        "[database]\ndefault = \"mysql\"\n\n[database.connections.mysql]\n{}",
        connection_toml
    ))
    .unwrap()
}

#[test]
fn test_single_write_side_resolves_to_write_host() {
    let config = config(
        r#"
        host = "base"
        database = "forge"
        read = { host = "r" }
        write = { host = "w1" }
        "#,
    );

    let params = ConnectionResolver::new().resolve(&config.database);

    assert_eq!(params.host.as_deref(), Some("w1"));
    assert_eq!(params.database.as_deref(), Some("forge"));
}

#[test]
fn test_write_list_picks_each_candidate_independently() {
    let config = config(
        r#"
        host = "base"
        read = { host = "r" }
        write = [{ host = "w1" }, { host = "w2" }]
        "#,
    );
    let resolver = ConnectionResolver::new();

    let hosts: BTreeSet<String> = (0..200)
        .map(|_| resolver.resolve(&config.database).host.unwrap())
        .collect();

    // 2^-199 chance of a false failure
    assert_eq!(
        hosts,
        ["w1".to_string(), "w2".to_string()].into_iter().collect()
    );
}

#[test]
fn test_flat_connection_passes_through() {
    let config = config(
        r#"
        host = "127.0.0.1"
        username = "forge"
        password = "pw"
        database = "forge"
        "#,
    );

    let params = ConnectionResolver::new().resolve(&config.database);

    assert_eq!(params.host.as_deref(), Some("127.0.0.1"));
    assert_eq!(params.username.as_deref(), Some("forge"));
    assert_eq!(params.password.unwrap().expose(), "pw");
}

#[test]
fn test_unknown_default_connection_yields_empty_parameters() {
    let config = SnapConfig::from_toml_str("[database]\ndefault = \"ghost\"\n").unwrap();

    let params = ConnectionResolver::new().resolve(&config.database);

    assert_eq!(params, Default::default());
}
