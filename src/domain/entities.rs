//! Domain entities mirrored from the project store.

use serde::{Deserialize, Serialize};

/// A project as supplied by the project store. Read-only here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub id: i64,
    pub author: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Serialized scene document; decoded by [`super::scene::ProjectData::parse`].
    pub data: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default, alias = "makeid", alias = "makeId")]
    pub make_id: Option<String>,
}
