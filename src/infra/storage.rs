//! Object store adapters: S3 for real publishes, memory for dry runs.

use std::{
    collections::{BTreeMap, HashMap},
    sync::{
        Arc, Mutex,
        atomic::{AtomicU16, Ordering},
    },
};

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region, retry::RetryConfig, timeout::TimeoutConfig};
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    Client as S3Client,
    config::{
        ConfigBag, Intercept, RequestChecksumCalculation, RuntimeComponents,
        SharedCredentialsProvider, interceptors::BeforeDeserializationInterceptorContextRef,
    },
    error::{BoxError, DisplayErrorContext},
    primitives::ByteStream,
    types::ObjectCannedAcl,
};
use bytes::Bytes;
use tracing::{debug, info};

use crate::{
    application::storage::{ObjectStore, PUT_SUCCESS_STATUS, StorageError, classify_status},
    config::StorageSettings,
    infra::error::InfraError,
};

/// Writes artifacts to an S3 (or S3-compatible) bucket.
#[derive(Clone)]
pub struct S3ObjectStore {
    client: S3Client,
    bucket: String,
}

impl S3ObjectStore {
    pub async fn connect(settings: &StorageSettings) -> Result<Self, InfraError> {
        if settings.bucket.trim().is_empty() {
            return Err(InfraError::storage("bucket name must not be empty"));
        }

        // One attempt per artifact; a publish either lands or reports the failure.
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()))
            .retry_config(RetryConfig::disabled())
            .timeout_config(
                TimeoutConfig::builder()
                    .operation_timeout(settings.timeout)
                    .build(),
            );

        if let Some(endpoint) = settings.endpoint_url.as_ref() {
            info!(
                target = "valet::infra::storage",
                endpoint = %endpoint,
                "using custom object store endpoint"
            );
            loader = loader.endpoint_url(endpoint.as_str());
        }

        if let (Some(key_id), Some(secret)) = (
            settings.access_key_id.as_ref(),
            settings.secret_access_key.as_ref(),
        ) {
            let credentials = Credentials::new(key_id, secret, None, None, "valet-static-config");
            loader = loader.credentials_provider(SharedCredentialsProvider::new(credentials));
        }

        let sdk_config = loader.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(settings.force_path_style)
            .request_checksum_calculation(RequestChecksumCalculation::WhenRequired)
            .build();

        Ok(Self {
            client: S3Client::from_conf(s3_config),
            bucket: settings.bucket.clone(),
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put_object(
        &self,
        key: &str,
        payload: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let content_length = i64::try_from(payload.len())
            .map_err(|_| StorageError::transport("payload length exceeds i64"))?;

        let response_status = ResponseStatus::default();
        let outcome = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .acl(ObjectCannedAcl::PublicRead)
            .content_type(content_type)
            .content_length(content_length)
            .body(ByteStream::from(payload))
            .customize()
            .interceptor(response_status.clone())
            .send()
            .await;

        match outcome {
            Ok(_) => {
                let status = response_status
                    .get()
                    .ok_or_else(|| StorageError::transport("object store sent no response status"))?;
                classify_status(status)?;
                debug!(
                    target = "valet::infra::storage",
                    bucket = %self.bucket,
                    key,
                    content_length,
                    "object stored"
                );
                Ok(())
            }
            // A 200 that still failed (e.g. an unparseable body) is not a stored object.
            Err(err) => match err.raw_response().map(|raw| raw.status().as_u16()) {
                Some(status) if status != PUT_SUCCESS_STATUS => {
                    Err(StorageError::Status { status })
                }
                _ => Err(StorageError::transport(
                    DisplayErrorContext(&err).to_string(),
                )),
            },
        }
    }
}

/// Captures the HTTP status of a PUT before the SDK decides whether the
/// response deserializes into a success.
#[derive(Debug, Clone, Default)]
struct ResponseStatus(Arc<AtomicU16>);

impl ResponseStatus {
    fn get(&self) -> Option<u16> {
        match self.0.load(Ordering::Acquire) {
            0 => None,
            status => Some(status),
        }
    }
}

impl Intercept for ResponseStatus {
    fn name(&self) -> &'static str {
        "ValetResponseStatus"
    }

    fn read_before_deserialization(
        &self,
        context: &BeforeDeserializationInterceptorContextRef<'_>,
        _runtime_components: &RuntimeComponents,
        _cfg: &mut ConfigBag,
    ) -> Result<(), BoxError> {
        self.0
            .store(context.response().status().as_u16(), Ordering::Release);
        Ok(())
    }
}

/// One write captured by [`MemoryObjectStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub payload: Bytes,
    pub content_type: String,
}

#[derive(Debug, Default)]
struct MemoryState {
    objects: BTreeMap<String, StoredObject>,
    writes: Vec<String>,
    failures: HashMap<String, u16>,
}

/// In-process store. Keeps the latest object per key and the order keys
/// were written in; individual keys can be made to answer with an error
/// status.
#[derive(Debug, Clone, Default)]
pub struct MemoryObjectStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write to `key` fail with `status`.
    pub fn fail_key(&self, key: impl Into<String>, status: u16) {
        self.lock().failures.insert(key.into(), status);
    }

    /// Drop every injected failure; stored objects and the write log stay.
    pub fn clear_failures(&self) {
        self.lock().failures.clear();
    }

    pub fn object(&self, key: &str) -> Option<StoredObject> {
        self.lock().objects.get(key).cloned()
    }

    /// Stored keys in lexical order.
    pub fn keys(&self) -> Vec<String> {
        self.lock().objects.keys().cloned().collect()
    }

    /// Every attempted write, failed ones included, in arrival order.
    pub fn writes(&self) -> Vec<String> {
        self.lock().writes.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put_object(
        &self,
        key: &str,
        payload: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let mut state = self.lock();
        state.writes.push(key.to_string());
        if let Some(status) = state.failures.get(key).copied() {
            return classify_status(status);
        }
        state.objects.insert(
            key.to_string(),
            StoredObject {
                payload,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }
}
