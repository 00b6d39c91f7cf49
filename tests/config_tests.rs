//! Config loading, TOML parsing, and env var override tests.

use rpcpipe::{Config, Dispatcher, Registry, RegistryError};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

fn write_config(dir: &TempDir, contents: &str) -> String {
    let path = dir.path().join("rpcpipe.toml");
    fs::write(&path, contents).unwrap();
    path.to_string_lossy().into_owned()
}

// File Loading Tests
#[test]
fn test_from_file_reads_every_section() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[dispatch]
max_request_size = 2048
max_reply_size = 4280

[registry]
max_interfaces = 3

[logging]
level = "rpcpipe=debug"
format = "json"
file = "/var/log/rpcpipe.log"
"#,
    );

    let config = Config::from_file(&path).unwrap();
    assert_eq!(config.dispatch.max_request_size, 2048);
    assert_eq!(config.dispatch.max_reply_size, 4280);
    assert_eq!(config.registry.max_interfaces, 3);
    assert_eq!(config.logging.level, "rpcpipe=debug");
    assert_eq!(config.logging.format, "json");
    assert_eq!(config.logging.file.as_deref(), Some("/var/log/rpcpipe.log"));
}

#[test]
fn test_from_file_partial_keeps_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[registry]\nmax_interfaces = 10\n");

    let config = Config::from_file(&path).unwrap();
    assert_eq!(config.registry.max_interfaces, 10);
    assert_eq!(config.dispatch.max_request_size, 16 * 1024 * 1024);
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_from_missing_file_is_default() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");

    let config = Config::from_file(&path.to_string_lossy()).unwrap();
    assert_eq!(config.registry.max_interfaces, 0);
    assert_eq!(config.logging.format, "text");
}

#[test]
fn test_from_file_rejects_wrong_types() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[dispatch]\nmax_reply_size = \"large\"\n");
    assert!(Config::from_file(&path).is_err());
}

// Applied Config Tests
#[test]
fn test_registry_limit_from_config() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[registry]\nmax_interfaces = 1\n");
    let config = Config::from_file(&path).unwrap();

    let registry = Registry::from_config(&config.registry);
    rpcpipe::interfaces::perfcount::init(&registry, rpcpipe::InterfaceCallbacks::none()).unwrap();

    let other = rpcpipe::InterfaceDescriptor::builder(
        "samr",
        uuid::Uuid::from_u128(0x12345778_1234_abcd_ef00_0123456789ac),
        rpcpipe::InterfaceVersion::new(1, 0),
    )
    .build();
    let err = registry
        .register(other, rpcpipe::OpnumTable::empty(), rpcpipe::InterfaceCallbacks::none())
        .unwrap_err();
    assert_eq!(err, RegistryError::RegistryFull { limit: 1 });
}

#[test]
fn test_dispatch_limits_from_config() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[dispatch]\nmax_request_size = 4\n");
    let config = Config::from_file(&path).unwrap();

    let registry = Arc::new(Registry::new());
    let desc = rpcpipe::InterfaceDescriptor::builder(
        "echo",
        uuid::Uuid::from_u128(7),
        rpcpipe::InterfaceVersion::new(1, 0),
    )
    .build();
    let table = rpcpipe::OpnumTable::builder()
        .raw(0, "Echo", |data: &[u8]| Ok(data.to_vec()))
        .build()
        .unwrap();
    registry
        .register(desc.clone(), table, rpcpipe::InterfaceCallbacks::none())
        .unwrap();

    let dispatcher = Dispatcher::with_config(registry, config.dispatch);
    assert!(dispatcher.dispatch(&desc.id(), 0, b"abcd").is_ok());
    let fault = dispatcher.dispatch(&desc.id(), 0, b"abcde").unwrap_err();
    assert_eq!(fault.kind(), "decode_error");
}

#[test]
fn test_handler_panics_are_always_faults() {
    // A stale key from older config files must not disable panic handling
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[dispatch]\ncatch_panics = false\n");
    let config = Config::from_file(&path).unwrap();

    let registry = Arc::new(Registry::new());
    let desc = rpcpipe::InterfaceDescriptor::builder(
        "fragile",
        uuid::Uuid::from_u128(8),
        rpcpipe::InterfaceVersion::new(1, 0),
    )
    .build();
    let table = rpcpipe::OpnumTable::builder()
        .raw(0, "Crash", |_: &[u8]| -> Result<Vec<u8>, rpcpipe::ExecFailure> {
            panic!("handler bug")
        })
        .build()
        .unwrap();
    registry
        .register(desc.clone(), table, rpcpipe::InterfaceCallbacks::none())
        .unwrap();

    let dispatcher = Dispatcher::with_config(registry, config.dispatch);
    let fault = dispatcher.dispatch(&desc.id(), 0, &[]).unwrap_err();
    assert_eq!(fault.app_status(), Some(rpcpipe::fault::status::STATUS_INTERNAL_ERROR));
}

// Env Override Tests
//
// These mutate process environment and so are `#[ignore]`d.
// Run them with: `cargo test --test config_tests -- --ignored --test-threads=1`
#[test]
#[ignore]
fn test_env_overrides_file() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[dispatch]\nmax_reply_size = 100\n");

    std::env::set_var("RPCPIPE_DISPATCH__MAX_REPLY_SIZE", "65536");
    std::env::set_var("RPCPIPE_LOGGING__FORMAT", "json");
    let config = Config::from_file(&path);
    std::env::remove_var("RPCPIPE_DISPATCH__MAX_REPLY_SIZE");
    std::env::remove_var("RPCPIPE_LOGGING__FORMAT");

    let config = config.unwrap();
    assert_eq!(config.dispatch.max_reply_size, 65536);
    assert_eq!(config.logging.format, "json");
}
