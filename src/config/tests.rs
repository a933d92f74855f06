use super::*;

fn storage_ready() -> RawSettings {
    let mut raw = RawSettings::default();
    raw.storage.bucket = Some("valet-artifacts".to_string());
    raw.storage.public_base_url = Some("https://static.example.org".to_string());
    raw
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = storage_ready();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());
    raw.storage.bucket = Some("from-file".to_string());

    let overrides = ServeOverrides {
        server_port: Some(4321),
        pipeline: PipelineOverrides {
            log_level: Some("debug".to_string()),
            storage_bucket: Some("from-cli".to_string()),
            ..Default::default()
        },
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    assert_eq!(settings.storage.bucket, "from-cli");
}

#[test]
fn defaults_fill_optional_sections() {
    let settings = Settings::from_raw(storage_ready()).expect("valid settings");

    assert_eq!(settings.server.addr.port(), DEFAULT_PORT);
    assert_eq!(settings.app.hostname, DEFAULT_APP_HOSTNAME);
    assert_eq!(settings.storage.region, DEFAULT_STORAGE_REGION);
    assert_eq!(
        settings.storage.timeout,
        Duration::from_secs(DEFAULT_STORAGE_TIMEOUT_SECS)
    );
    assert!(settings.storage.endpoint_url.is_none());
    assert!(!settings.storage.force_path_style);
    assert_eq!(
        settings.projects.directory,
        PathBuf::from(DEFAULT_PROJECTS_DIR)
    );
    assert!(matches!(settings.logging.format, LogFormat::Compact));
}

#[test]
fn app_hostname_drops_trailing_slash() {
    let mut raw = storage_ready();
    raw.app.hostname = Some("https://popcorn.example.org/".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.app.hostname, "https://popcorn.example.org");
}

#[test]
fn validation_reports_every_issue() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(0);
    raw.logging.level = Some("loud".to_string());
    raw.storage.timeout_seconds = Some(0);
    raw.storage.endpoint_url = Some("not a url".to_string());

    let keys: Vec<&str> = raw.validate().iter().map(|issue| issue.key).collect();

    assert_eq!(
        keys,
        vec![
            "server.port",
            "logging.level",
            "storage.bucket",
            "storage.endpoint_url",
            "storage.public_base_url",
            "storage.timeout_seconds",
        ]
    );
}

#[test]
fn load_error_carries_issues() {
    let err = Settings::from_raw(RawSettings::default()).expect_err("bucket missing");

    assert_eq!(err.issues().len(), 2);
    let message = err.to_string();
    assert!(message.contains("`storage.bucket`: must be set"), "{message}");
    assert!(message.contains("`storage.public_base_url`"), "{message}");
}

#[test]
fn valid_settings_have_no_issues() {
    assert!(storage_ready().validate().is_empty());
}

#[test]
fn public_base_must_be_http() {
    let mut raw = storage_ready();
    raw.storage.public_base_url = Some("mailto:ops@example.org".to_string());

    let issues = raw.validate();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].key, "storage.public_base_url");
}

#[test]
fn static_credentials_come_in_pairs() {
    let mut raw = storage_ready();
    raw.storage.access_key_id = Some("AKIA".to_string());

    let issues = raw.validate();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].key, "storage.access_key_id");

    raw.storage.secret_access_key = Some("secret".to_string());
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.storage.access_key_id.as_deref(), Some("AKIA"));
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = storage_ready();
    let overrides = PipelineOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_pipeline_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["valet"]);
    let command = args
        .command
        .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
    assert!(matches!(command, Command::Serve(_)));
}

#[test]
fn parse_publish_arguments() {
    let args = CliArgs::parse_from([
        "valet",
        "publish",
        "42",
        "--username",
        "alice",
        "--dry-run",
        "--storage-public-base-url",
        "https://cdn.example.org",
    ]);

    match args.command.expect("publish command") {
        Command::Publish(publish) => {
            assert_eq!(publish.id, 42);
            assert_eq!(publish.username, "alice");
            assert!(publish.dry_run);
            assert_eq!(
                publish.overrides.storage_public_base_url.as_deref(),
                Some("https://cdn.example.org")
            );
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn parse_check_config_arguments() {
    let args = CliArgs::parse_from([
        "valet",
        "check-config",
        "--server-port",
        "9000",
        "--storage-bucket",
        "b",
    ]);

    match args.command.expect("check-config command") {
        Command::CheckConfig(check) => {
            assert_eq!(check.overrides.server_port, Some(9000));
            assert_eq!(check.overrides.pipeline.storage_bucket.as_deref(), Some("b"));
        }
        _ => panic!("wrong command parsed"),
    }
}
