#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use leakscope_server::config;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
server:
  listen: "0.0.0.0:5000"
  refresh_intervl_ms: 500 # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "BAD_REQUEST");
}

#[test]
fn ok_minimal_config() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.server.refresh_interval_ms, 1000);
    assert_eq!(cfg.demos.string_bytes, 10 * 1024);
    assert_eq!(cfg.demos.loh_default_bytes, 85_000);
    assert!(cfg.demos.watch_dir.is_none());
}

#[test]
fn wrong_version_rejected() {
    let err = config::load_from_str("version: 2\n").expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "UNSUPPORTED_VERSION");
}

#[test]
fn refresh_interval_range_checked() {
    let bad = r#"
version: 1
server:
  refresh_interval_ms: 10
"#;
    assert!(config::load_from_str(bad).is_err());
}

#[test]
fn bad_listen_rejected() {
    let bad = r#"
version: 1
server:
  listen: "not-an-addr"
"#;
    assert!(config::load_from_str(bad).is_err());
}

#[test]
fn demo_sizes_must_fit_ceiling() {
    let bad = r#"
version: 1
demos:
  max_buffer_bytes: 1024
  pool_max_buffer_bytes: 512
"#;
    // default string_bytes (10 KiB) exceeds the 1 KiB ceiling
    assert!(config::load_from_str(bad).is_err());

    let ok = r#"
version: 1
demos:
  string_bytes: 512
  loh_default_bytes: 1024
  max_buffer_bytes: 1024
  pool_max_buffer_bytes: 512
  watch_dir: "/tmp"
"#;
    let cfg = config::load_from_str(ok).unwrap();
    assert!(cfg.demos.check_size(1024).is_ok());
    assert!(cfg.demos.check_size(1025).is_err());
}

#[test]
fn missing_file_falls_back_to_defaults() {
    let cfg = config::load_or_default("/nonexistent/leakscope.yaml").unwrap();
    assert_eq!(cfg.server.listen, "0.0.0.0:5000");
}

#[test]
fn shipped_config_is_valid() {
    let cfg = config::load_from_file("../../leakscope.yaml").expect("shipped config must load");
    assert_eq!(cfg.server.listen_addr().unwrap().port(), 5000);
}
