use std::{process, sync::Arc};

use clap::Parser;
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;
use valet::{
    application::{
        artifacts::PublishRequest,
        error::AppError,
        publish::PublishService,
        repos::ProjectsRepo,
        storage::ObjectStore,
    },
    config,
    domain::ids::ArtifactLayout,
    infra::{
        error::InfraError,
        http::{self, HttpState},
        projects::FileProjectStore,
        storage::{MemoryObjectStore, S3ObjectStore},
        telemetry,
    },
};
use valet_api_types::PublishResponse;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let cli_args = config::CliArgs::parse();
    let command = cli_args
        .command
        .clone()
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    match command {
        config::Command::CheckConfig(_) => run_check_config(&cli_args),
        config::Command::Serve(_) => run_serve(init_settings(&cli_args)?).await,
        config::Command::Publish(args) => run_publish(init_settings(&cli_args)?, *args).await,
    }
}

fn init_settings(cli_args: &config::CliArgs) -> Result<config::Settings, AppError> {
    let settings = config::load(cli_args)
        .map_err(|err| AppError::from(InfraError::configuration(err.to_string())))?;
    telemetry::init(&settings.logging)?;
    Ok(settings)
}

fn run_check_config(cli_args: &config::CliArgs) -> Result<(), AppError> {
    let issues = config::validate(cli_args)
        .map_err(|err| AppError::from(InfraError::configuration(err.to_string())))?;

    if issues.is_empty() {
        println!("configuration ok");
        return Ok(());
    }

    for issue in &issues {
        println!("{issue}");
    }
    Err(AppError::validation(format!(
        "{} configuration issue(s) found",
        issues.len()
    )))
}

fn layout(settings: &config::Settings) -> Result<ArtifactLayout, AppError> {
    Ok(ArtifactLayout::new(settings.storage.public_base_url.clone())?)
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let store = S3ObjectStore::connect(&settings.storage).await?;
    info!(
        bucket = store.bucket(),
        public_base = %settings.storage.public_base_url,
        "object store ready"
    );

    let state = HttpState {
        projects: Arc::new(FileProjectStore::new(settings.projects.directory.clone())),
        publisher: Arc::new(PublishService::new(Arc::new(store), layout(&settings)?)),
        app_hostname: settings.app.hostname.clone(),
    };

    http::serve(settings.server.addr, http::build_router(state)).await
}

async fn run_publish(settings: config::Settings, args: config::PublishArgs) -> Result<(), AppError> {
    let projects = FileProjectStore::new(settings.projects.directory.clone());
    let project = projects
        .find_by_id(args.id)
        .await?
        .ok_or_else(|| AppError::project_not_found(args.id))?;

    let memory = MemoryObjectStore::new();
    let store: Arc<dyn ObjectStore> = if args.dry_run {
        Arc::new(memory.clone())
    } else {
        Arc::new(S3ObjectStore::connect(&settings.storage).await?)
    };

    let publisher = PublishService::new(store, layout(&settings)?);
    let request = PublishRequest {
        project,
        actor_username: args.username,
        app_hostname: settings.app.hostname.clone(),
    };
    let result = publisher.publish(&request).await?;

    if args.dry_run {
        for key in memory.writes() {
            let size = memory
                .object(&key)
                .map(|object| object.payload.len())
                .unwrap_or_default();
            info!(key = %key, bytes = size, "dry run artifact");
        }
    }

    let response = PublishResponse::new(result.public_shell_url, result.public_embed_url);
    let body = serde_json::to_string_pretty(&response)
        .map_err(|err| AppError::unexpected(format!("failed to encode response: {err}")))?;
    println!("{body}");
    Ok(())
}
