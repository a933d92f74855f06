//! Configuration layer: typed settings with layered precedence (file → env → CLI).
//!
//! Loading never exits the process. Every invalid value is collected into a
//! [`ConfigIssue`] so callers can report them all at once and decide whether
//! to abort.

use std::{fmt, net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "valet";
const ENV_PREFIX: &str = "VALET";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8888;
const DEFAULT_APP_HOSTNAME: &str = "http://localhost:8888";
const DEFAULT_STORAGE_REGION: &str = "us-east-1";
pub(crate) const DEFAULT_STORAGE_TIMEOUT_SECS: u64 = 10;
const DEFAULT_PROJECTS_DIR: &str = "projects";

/// Command-line arguments for the valet binary.
#[derive(Debug, Parser)]
#[command(
    name = "valet",
    version,
    about = "Publishes projects as static embed pages"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "VALET_CONFIG_FILE", value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the publish HTTP service.
    Serve(Box<ServeArgs>),
    /// Publish a single project from the project store and print its URLs.
    Publish(Box<PublishArgs>),
    /// Validate configuration and list every problem found.
    #[command(name = "check-config")]
    CheckConfig(Box<CheckConfigArgs>),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Clone)]
pub struct PublishArgs {
    /// Decimal project id.
    #[arg(value_name = "ID")]
    pub id: i64,

    /// Account the artifacts are published under.
    #[arg(long, value_name = "NAME")]
    pub username: String,

    /// Render and "upload" into memory only; nothing leaves the process.
    #[arg(long = "dry-run", action = clap::ArgAction::SetTrue)]
    pub dry_run: bool,

    #[command(flatten)]
    pub overrides: PipelineOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct CheckConfigArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    #[command(flatten)]
    pub pipeline: PipelineOverrides,
}

/// Overrides shared by every command that runs the publish pipeline.
#[derive(Debug, Args, Default, Clone)]
pub struct PipelineOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the editor origin the redirect stubs point at.
    #[arg(long = "app-hostname", value_name = "URL")]
    pub app_hostname: Option<String>,

    /// Override the bucket artifacts are written to.
    #[arg(long = "storage-bucket", value_name = "NAME")]
    pub storage_bucket: Option<String>,

    /// Override the object store region.
    #[arg(long = "storage-region", value_name = "REGION")]
    pub storage_region: Option<String>,

    /// Override the object store endpoint (S3-compatible services).
    #[arg(long = "storage-endpoint-url", value_name = "URL")]
    pub storage_endpoint_url: Option<String>,

    /// Override the public origin published artifacts are served from.
    #[arg(long = "storage-public-base-url", value_name = "URL")]
    pub storage_public_base_url: Option<String>,

    /// Override the directory holding `{id}.json` project records.
    #[arg(long = "projects-directory", value_name = "PATH", value_hint = ValueHint::DirPath)]
    pub projects_directory: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub app: AppSettings,
    pub storage: StorageSettings,
    pub projects: ProjectsSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct AppSettings {
    /// Origin of the editor, without a trailing slash.
    pub hostname: String,
}

#[derive(Debug, Clone)]
pub struct StorageSettings {
    pub bucket: String,
    pub region: String,
    pub endpoint_url: Option<Url>,
    pub public_base_url: Url,
    pub timeout: Duration,
    pub force_path_style: bool,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ProjectsSettings {
    pub directory: PathBuf,
}

/// One invalid configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    pub key: &'static str,
    pub reason: String,
}

impl ConfigIssue {
    fn new(key: &'static str, reason: impl Into<String>) -> Self {
        Self {
            key,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}`: {}", self.key, self.reason)
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration: {}", join_issues(.issues))]
    Invalid { issues: Vec<ConfigIssue> },
}

impl LoadError {
    pub fn issues(&self) -> &[ConfigIssue] {
        match self {
            LoadError::Invalid { issues } => issues,
            LoadError::Build(_) => &[],
        }
    }
}

fn join_issues(issues: &[ConfigIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    Settings::from_raw(raw_settings(cli)?)
}

/// Collect every configuration problem without building settings. An empty
/// list means [`load`] will succeed.
pub fn validate(cli: &CliArgs) -> Result<Vec<ConfigIssue>, LoadError> {
    Ok(raw_settings(cli)?.validate())
}

fn raw_settings(cli: &CliArgs) -> Result<RawSettings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::CheckConfig(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::Publish(args)) => raw.apply_pipeline_overrides(&args.overrides),
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Ok(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    app: RawAppSettings,
    storage: RawStorageSettings,
    projects: RawProjectsSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }

        self.apply_pipeline_overrides(&overrides.pipeline);
    }

    fn apply_pipeline_overrides(&mut self, overrides: &PipelineOverrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(hostname) = overrides.app_hostname.as_ref() {
            self.app.hostname = Some(hostname.clone());
        }
        if let Some(bucket) = overrides.storage_bucket.as_ref() {
            self.storage.bucket = Some(bucket.clone());
        }
        if let Some(region) = overrides.storage_region.as_ref() {
            self.storage.region = Some(region.clone());
        }
        if let Some(endpoint) = overrides.storage_endpoint_url.as_ref() {
            self.storage.endpoint_url = Some(endpoint.clone());
        }
        if let Some(base) = overrides.storage_public_base_url.as_ref() {
            self.storage.public_base_url = Some(base.clone());
        }
        if let Some(directory) = overrides.projects_directory.as_ref() {
            self.projects.directory = Some(directory.clone());
        }
    }

    /// Every problem with these values; empty when they are loadable.
    fn validate(&self) -> Vec<ConfigIssue> {
        match Settings::from_raw(self.clone()) {
            Ok(_) => Vec::new(),
            Err(err) => err.issues().to_vec(),
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            app,
            storage,
            projects,
        } = raw;

        let mut issues = Vec::new();
        let server = build_server_settings(server, &mut issues);
        let logging = build_logging_settings(logging, &mut issues);
        let app = build_app_settings(app, &mut issues);
        let storage = build_storage_settings(storage, &mut issues);
        let projects = build_projects_settings(projects, &mut issues);

        match (server, logging, app, storage, projects) {
            (Some(server), Some(logging), Some(app), Some(storage), Some(projects))
                if issues.is_empty() =>
            {
                Ok(Self {
                    server,
                    logging,
                    app,
                    storage,
                    projects,
                })
            }
            _ => Err(LoadError::Invalid { issues }),
        }
    }
}

fn build_server_settings(
    server: RawServerSettings,
    issues: &mut Vec<ConfigIssue>,
) -> Option<ServerSettings> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        issues.push(ConfigIssue::new(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr = match parse_socket_addr(&host, port) {
        Ok(addr) => Some(addr),
        Err(reason) => {
            issues.push(ConfigIssue::new("server.host", reason));
            None
        }
    };

    Some(ServerSettings { addr: addr? })
}

fn build_logging_settings(
    logging: RawLoggingSettings,
    issues: &mut Vec<ConfigIssue>,
) -> Option<LoggingSettings> {
    let level = match logging.level {
        Some(level) => match LevelFilter::from_str(level.as_str()) {
            Ok(level) => level,
            Err(err) => {
                issues.push(ConfigIssue::new(
                    "logging.level",
                    format!("failed to parse: {err}"),
                ));
                return None;
            }
        },
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Some(LoggingSettings { level, format })
}

fn build_app_settings(app: RawAppSettings, issues: &mut Vec<ConfigIssue>) -> Option<AppSettings> {
    let hostname = app
        .hostname
        .unwrap_or_else(|| DEFAULT_APP_HOSTNAME.to_string());
    let hostname = hostname.trim().trim_end_matches('/').to_string();

    parse_http_url(&hostname, "app.hostname", issues)?;
    Some(AppSettings { hostname })
}

fn build_storage_settings(
    storage: RawStorageSettings,
    issues: &mut Vec<ConfigIssue>,
) -> Option<StorageSettings> {
    let bucket = non_empty(storage.bucket);
    if bucket.is_none() {
        issues.push(ConfigIssue::new("storage.bucket", "must be set"));
    }

    let region = non_empty(storage.region).unwrap_or_else(|| DEFAULT_STORAGE_REGION.to_string());

    let endpoint_url = non_empty(storage.endpoint_url)
        .map(|value| parse_http_url(&value, "storage.endpoint_url", issues));

    let public_base_url = match non_empty(storage.public_base_url) {
        Some(value) => parse_http_url(&value, "storage.public_base_url", issues),
        None => {
            issues.push(ConfigIssue::new("storage.public_base_url", "must be set"));
            None
        }
    };

    let timeout_secs = storage
        .timeout_seconds
        .unwrap_or(DEFAULT_STORAGE_TIMEOUT_SECS);
    if timeout_secs == 0 {
        issues.push(ConfigIssue::new(
            "storage.timeout_seconds",
            "must be greater than zero",
        ));
    }

    let access_key_id = non_empty(storage.access_key_id);
    let secret_access_key = non_empty(storage.secret_access_key);
    if access_key_id.is_some() != secret_access_key.is_some() {
        issues.push(ConfigIssue::new(
            "storage.access_key_id",
            "access_key_id and secret_access_key must be set together",
        ));
    }

    let endpoint_url = match endpoint_url {
        Some(parsed) => Some(parsed?),
        None => None,
    };

    Some(StorageSettings {
        bucket: bucket?,
        region,
        endpoint_url,
        public_base_url: public_base_url?,
        timeout: Duration::from_secs(timeout_secs),
        force_path_style: storage.force_path_style.unwrap_or(false),
        access_key_id,
        secret_access_key,
    })
}

fn build_projects_settings(
    projects: RawProjectsSettings,
    issues: &mut Vec<ConfigIssue>,
) -> Option<ProjectsSettings> {
    let directory = projects
        .directory
        .unwrap_or_else(|| PathBuf::from(DEFAULT_PROJECTS_DIR));
    if directory.as_os_str().is_empty() {
        issues.push(ConfigIssue::new(
            "projects.directory",
            "path must not be empty",
        ));
        return None;
    }

    Some(ProjectsSettings { directory })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawAppSettings {
    hostname: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawStorageSettings {
    bucket: Option<String>,
    region: Option<String>,
    endpoint_url: Option<String>,
    public_base_url: Option<String>,
    timeout_seconds: Option<u64>,
    force_path_style: Option<bool>,
    access_key_id: Option<String>,
    secret_access_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawProjectsSettings {
    directory: Option<PathBuf>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn parse_http_url(value: &str, key: &'static str, issues: &mut Vec<ConfigIssue>) -> Option<Url> {
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && !url.cannot_be_a_base() => {
            Some(url)
        }
        Ok(url) => {
            issues.push(ConfigIssue::new(
                key,
                format!("`{url}` must be an http(s) URL"),
            ));
            None
        }
        Err(err) => {
            issues.push(ConfigIssue::new(key, format!("invalid URL `{value}`: {err}")));
            None
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

#[cfg(test)]
mod tests;
