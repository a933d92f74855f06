//! Filesystem project store: one `{id}.json` record per project.

use std::{io::ErrorKind, path::PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use crate::{
    application::repos::{ProjectsRepo, RepoError},
    domain::entities::ProjectRecord,
};

#[derive(Debug, Clone)]
pub struct FileProjectStore {
    root: PathBuf,
}

impl FileProjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn record_path(&self, id: i64) -> PathBuf {
        self.root.join(format!("{id}.json"))
    }
}

#[async_trait]
impl ProjectsRepo for FileProjectStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<ProjectRecord>, RepoError> {
        if id <= 0 {
            return Ok(None);
        }

        let path = self.record_path(id);
        let raw = match fs::read(&path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(
                    target = "valet::infra::projects",
                    path = %path.display(),
                    "project record missing"
                );
                return Ok(None);
            }
            Err(err) => return Err(RepoError::from_persistence(err)),
        };

        let record: ProjectRecord = serde_json::from_slice(&raw).map_err(|err| {
            RepoError::integrity(format!("{}: {err}", path.display()))
        })?;

        if record.id != id {
            return Err(RepoError::integrity(format!(
                "{} holds project {} instead of {id}",
                path.display(),
                record.id
            )));
        }

        Ok(Some(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, body: &str) {
        std::fs::write(dir.path().join(name), body).expect("write fixture");
    }

    #[tokio::test]
    async fn reads_record_by_id() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "42.json",
            r#"{"id":42,"author":"Alice","name":"Tide","data":"{\"media\":[]}","makeid":"m-1"}"#,
        );

        let record = FileProjectStore::new(dir.path())
            .find_by_id(42)
            .await
            .unwrap()
            .expect("record exists");

        assert_eq!(record.id, 42);
        assert_eq!(record.author, "Alice");
        assert_eq!(record.make_id.as_deref(), Some("m-1"));
        assert!(record.description.is_none());
    }

    #[tokio::test]
    async fn missing_and_non_positive_ids_are_absent() {
        let dir = TempDir::new().unwrap();
        let store = FileProjectStore::new(dir.path());

        assert!(store.find_by_id(7).await.unwrap().is_none());
        assert!(store.find_by_id(0).await.unwrap().is_none());
        assert!(store.find_by_id(-3).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn corrupt_or_mismatched_records_are_integrity_errors() {
        let dir = TempDir::new().unwrap();
        write(&dir, "1.json", "{not json");
        write(
            &dir,
            "2.json",
            r#"{"id":3,"author":"a","name":"n","data":"{}"}"#,
        );
        let store = FileProjectStore::new(dir.path());

        assert!(matches!(
            store.find_by_id(1).await,
            Err(RepoError::Integrity { .. })
        ));
        assert!(matches!(
            store.find_by_id(2).await,
            Err(RepoError::Integrity { .. })
        ));
    }
}
