//! Publish orchestration: render six artifacts, upload them concurrently and
//! fold the outcomes into a single result.
//!
//! Every upload runs to completion before the call resolves. When several
//! fail, the reported error is the first one in issue order (see
//! [`ArtifactKind::ALL`]), never whichever happened to finish first. Writes
//! that did succeed are left in place; a publish is best effort, not atomic.

use std::{sync::Arc, time::Instant};

use futures::future::join_all;
use metrics::{counter, histogram};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::{
    application::{
        artifacts::{ArtifactKind, PublishPlan, PublishRequest, RenderError},
        storage::{ObjectStore, StorageError},
    },
    domain::{error::DomainError, ids::ArtifactLayout},
};

pub const METRIC_PUBLISH: &str = "project.publish";
pub const METRIC_PUBLISH_FAILED: &str = "project.publish.failed";
pub const METRIC_PUBLISH_DURATION_MS: &str = "project.publish.duration_ms";

/// Public URLs of a successful publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishResult {
    pub public_shell_url: Url,
    pub public_embed_url: Url,
}

#[derive(Debug, Error)]
pub enum ArtifactFailure {
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("{} for `{key}` failed ({failed} of {total} artifacts failed): {source}", .kind.description())]
    Artifact {
        kind: ArtifactKind,
        key: String,
        failed: usize,
        total: usize,
        #[source]
        source: ArtifactFailure,
    },
}

impl PublishError {
    /// Validation failures are raised before any upload is attempted.
    pub fn is_validation(&self) -> bool {
        matches!(self, PublishError::Domain(_))
    }
}

/// Publishes projects into one object store under one key layout.
#[derive(Clone)]
pub struct PublishService {
    store: Arc<dyn ObjectStore>,
    layout: ArtifactLayout,
}

impl PublishService {
    pub fn new(store: Arc<dyn ObjectStore>, layout: ArtifactLayout) -> Self {
        Self { store, layout }
    }

    #[instrument(
        skip_all,
        fields(project_id = request.project.id, username = %request.actor_username)
    )]
    pub async fn publish(&self, request: &PublishRequest) -> Result<PublishResult, PublishError> {
        let started_at = Instant::now();
        let plan = PublishPlan::prepare(request, &self.layout)?;

        info!(
            target = "valet::publish",
            id_base36 = plan.id_base36(),
            artifacts = ArtifactKind::ALL.len(),
            "uploading artifacts"
        );

        let uploads = ArtifactKind::ALL
            .iter()
            .map(|kind| self.publish_artifact(&plan, *kind));
        let outcomes = join_all(uploads).await;

        let mut failures: Vec<(ArtifactKind, ArtifactFailure)> = ArtifactKind::ALL
            .into_iter()
            .zip(outcomes)
            .filter_map(|(kind, outcome)| outcome.err().map(|err| (kind, err)))
            .collect();

        for (kind, err) in &failures {
            warn!(
                target = "valet::publish",
                artifact = kind.as_str(),
                key = %plan.key(*kind),
                error = %err,
                "artifact upload failed"
            );
        }

        let failed = failures.len();
        if failed > 0 {
            counter!(METRIC_PUBLISH_FAILED).increment(1);
            let (kind, source) = failures.swap_remove(0);
            return Err(PublishError::Artifact {
                kind,
                key: plan.key(kind),
                failed,
                total: ArtifactKind::ALL.len(),
                source,
            });
        }

        let result = PublishResult {
            public_shell_url: plan.shell_url().clone(),
            public_embed_url: plan.embed_url().clone(),
        };
        record_publish(started_at);

        info!(
            target = "valet::publish",
            shell_url = %result.public_shell_url,
            embed_url = %result.public_embed_url,
            "project published"
        );

        Ok(result)
    }

    async fn publish_artifact(
        &self,
        plan: &PublishPlan,
        kind: ArtifactKind,
    ) -> Result<(), ArtifactFailure> {
        let spec = plan.render(kind)?;
        debug!(
            target = "valet::publish",
            artifact = spec.description,
            key = %spec.key,
            bytes = spec.payload.len(),
            "uploading artifact"
        );
        self.store
            .put_object(&spec.key, spec.payload, spec.content_type)
            .await?;
        Ok(())
    }
}

fn record_publish(started_at: Instant) {
    counter!(METRIC_PUBLISH).increment(1);
    histogram!(METRIC_PUBLISH_DURATION_MS).record(started_at.elapsed().as_secs_f64() * 1000.0);
}
