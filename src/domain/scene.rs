//! Scene document stored in a project's `data` field.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::util::html::escape_html_in_json;

use super::error::DomainError;

/// Decoded scene: ordered media entries, each carrying its own tracks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectData {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub media: Vec<MediaEntry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<MediaEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<MediaEntry>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaEntry {
    pub url: MediaUrl,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default, rename = "popcornOptions")]
    pub popcorn_options: Map<String, Value>,
    #[serde(default)]
    pub tracks: Vec<Track>,
}

/// Media sources are either one URL or an ordered list of fallbacks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MediaUrl {
    Single(String),
    Multiple(Vec<String>),
}

impl MediaUrl {
    /// The canonical URL: the scalar itself, or the first list element.
    pub fn primary(&self) -> Option<&str> {
        match self {
            MediaUrl::Single(url) => Some(url.as_str()),
            MediaUrl::Multiple(urls) => urls.first().map(String::as_str),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "trackEvents")]
    pub track_events: Vec<TrackEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, rename = "popcornOptions")]
    pub popcorn_options: Map<String, Value>,
}

impl ProjectData {
    /// Decode a stored scene, HTML-escaping every string value on the way in.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let mut document: Value = serde_json::from_str(raw)
            .map_err(|err| DomainError::invalid_project_data(err.to_string()))?;
        escape_html_in_json(&mut document);
        serde_json::from_value(document)
            .map_err(|err| DomainError::invalid_project_data(err.to_string()))
    }

    /// Attribution always credits the first media entry only.
    pub fn attribution_url(&self) -> Result<&str, DomainError> {
        self.media
            .first()
            .and_then(|media| media.url.primary())
            .ok_or(DomainError::MissingMediaAttribution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_url_is_used_directly() {
        let data = ProjectData::parse(r#"{"media":[{"url":"http://x/img.png"}]}"#).unwrap();
        assert_eq!(data.attribution_url().unwrap(), "http://x/img.png");
        assert_eq!(data.media[0].url, MediaUrl::Single("http://x/img.png".into()));
    }

    #[test]
    fn list_url_uses_first_element() {
        let data = ProjectData::parse(
            r#"{"media":[{"url":["http://x/a.webm","http://x/a.mp4"]},{"url":"http://y/b.ogv"}]}"#,
        )
        .unwrap();
        assert_eq!(data.attribution_url().unwrap(), "http://x/a.webm");
    }

    #[test]
    fn missing_or_empty_media_has_no_attribution() {
        for raw in [
            r#"{"media":[]}"#,
            r#"{}"#,
            r#"{"media":null}"#,
            r#"{"media":[{"url":[]}]}"#,
        ] {
            let data = ProjectData::parse(raw).unwrap();
            assert_eq!(
                data.attribution_url(),
                Err(DomainError::MissingMediaAttribution),
                "{raw}"
            );
        }
    }

    #[test]
    fn strings_are_escaped_while_decoding() {
        let data = ProjectData::parse(
            r#"{"media":[{"url":"http://x/?a=1&b=2","tracks":[{"trackEvents":[{"type":"text","popcornOptions":{"text":"<b>hi</b>"}}]}]}]}"#,
        )
        .unwrap();

        assert_eq!(data.attribution_url().unwrap(), "http://x/?a=1&amp;b=2");
        let event = &data.media[0].tracks[0].track_events[0];
        assert_eq!(event.popcorn_options["text"], "&lt;b&gt;hi&lt;/b&gt;");
    }

    #[test]
    fn malformed_documents_are_rejected() {
        assert!(matches!(
            ProjectData::parse("{not json"),
            Err(DomainError::InvalidProjectData { .. })
        ));
        assert!(matches!(
            ProjectData::parse(r#"{"media":[{"target":"no-url"}]}"#),
            Err(DomainError::InvalidProjectData { .. })
        ));
    }

    #[test]
    fn unknown_top_level_fields_are_kept() {
        let data = ProjectData::parse(r#"{"media":[{"url":"u"}],"targets":[{"name":"t"}]}"#).unwrap();
        assert!(data.extra.contains_key("targets"));
    }
}
