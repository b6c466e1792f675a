use super::{apply_env, apply_file, Settings};

use std::{collections::HashMap, path::PathBuf, time::Duration};

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn defaults_point_at_local_store() {
    let settings = Settings::default();
    assert_eq!(settings.api_url, "http://localhost:5678/");
    assert_eq!(settings.modal_width, 800);
    assert_eq!(settings.preview().image_width(), 400);
    assert_eq!(settings.log_filter, "info");
}

#[test]
fn file_values_override_defaults() {
    let mut settings = Settings::default();
    apply_file(
        &mut settings,
        r#"
api_url = "https://billed.example.tld/api"
session_file = "/tmp/billed/session.json"
modal_width = 1000
"#,
    )
    .expect("parse");

    assert_eq!(settings.api_url, "https://billed.example.tld/api");
    assert_eq!(
        settings.session_file,
        PathBuf::from("/tmp/billed/session.json")
    );
    assert_eq!(settings.modal_width, 1000);
    assert_eq!(settings.request_timeout_seconds, 30);
}

#[test]
fn malformed_file_is_an_error() {
    let mut settings = Settings::default();
    assert!(apply_file(&mut settings, "modal_width = \"wide\"").is_err());
    assert_eq!(settings, Settings::default());
}

#[test]
fn app_prefixed_env_wins_over_short_names() {
    let mut settings = Settings::default();
    apply_env(
        &mut settings,
        env(&[
            ("BILLED_API_URL", "http://short.tld/"),
            ("APP__API_URL", "http://prefixed.tld/"),
            ("BILLED_SESSION_FILE", "short.json"),
        ]),
    );

    assert_eq!(settings.api_url, "http://prefixed.tld/");
    assert_eq!(settings.session_file, PathBuf::from("short.json"));
}

#[test]
fn unparseable_numbers_keep_previous_values() {
    let mut settings = Settings::default();
    apply_env(
        &mut settings,
        env(&[
            ("APP__REQUEST_TIMEOUT_SECONDS", "soon"),
            ("APP__MODAL_WIDTH", " 640 "),
            ("RUST_LOG", "client_core=debug"),
        ]),
    );

    assert_eq!(settings.request_timeout_seconds, 30);
    assert_eq!(settings.modal_width, 640);
    assert_eq!(settings.log_filter, "client_core=debug");
}

#[test]
fn zero_timeout_is_clamped() {
    let settings = Settings {
        request_timeout_seconds: 0,
        ..Settings::default()
    };
    assert_eq!(settings.request_timeout(), Duration::from_secs(1));
}
