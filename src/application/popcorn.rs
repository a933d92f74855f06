//! Player bootstrap script generated from a project's scene.
//!
//! The output is embedded verbatim in the embed fragment. String values were
//! already HTML-escaped when the scene was decoded, so nothing here needs to
//! escape again.

use serde_json::{Map, Value};
use tracing::debug;

use crate::domain::scene::{MediaEntry, MediaUrl, ProjectData};

const DEFAULT_TARGET: &str = "video";

/// Render the `<script>` block that recreates every media element and track
/// event in the client-side player.
pub fn serialize(data: &ProjectData) -> String {
    let mut script = String::from("<script>");
    for media in &data.media {
        push_media(&mut script, media);
    }
    script.push_str("\n</script>");
    script
}

fn push_media(script: &mut String, media: &MediaEntry) {
    let target = media.target.as_deref().unwrap_or(DEFAULT_TARGET);
    script.push_str("\n(function(){");
    script.push_str("\nvar popcorn = Popcorn.smart(");
    script.push_str(&json_string(&format!("#{target}")));
    script.push_str(", ");
    script.push_str(&media_sources(&media.url));
    script.push_str(", ");
    script.push_str(&json_object(&media.popcorn_options));
    script.push_str(");");

    for track in &media.tracks {
        for event in &track.track_events {
            if !is_js_identifier(&event.kind) {
                debug!(
                    target = "valet::popcorn",
                    kind = %event.kind,
                    "skipping track event with unusable plugin name"
                );
                continue;
            }
            script.push_str("\npopcorn.");
            script.push_str(&event.kind);
            script.push('(');
            script.push_str(&json_object(&event.popcorn_options));
            script.push_str(");");
        }
    }

    script.push_str("\n}());");
}

fn media_sources(url: &MediaUrl) -> String {
    match url {
        MediaUrl::Single(url) => json_string(url),
        MediaUrl::Multiple(urls) => {
            let values = urls.iter().cloned().map(Value::String).collect();
            Value::Array(values).to_string()
        }
    }
}

fn json_string(value: &str) -> String {
    Value::String(value.to_string()).to_string()
}

// `serde_json::Map` iterates in key order, which keeps the output stable.
fn json_object(map: &Map<String, Value>) -> String {
    Value::Object(map.clone()).to_string()
}

fn is_js_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' || first == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> ProjectData {
        ProjectData::parse(raw).expect("valid scene")
    }

    #[test]
    fn serializes_media_and_events_in_order() {
        let data = parse(
            r##"{"media":[{"url":"http://x/v.webm","target":"main","popcornOptions":{"frameAnimation":true},
                "tracks":[
                  {"trackEvents":[{"type":"text","popcornOptions":{"text":"one","start":0,"end":2}}]},
                  {"trackEvents":[{"type":"image","popcornOptions":{"src":"i.png","start":1}}]}
                ]}]}"##,
        );

        let script = serialize(&data);
        assert_eq!(
            script,
            "<script>\n(function(){\
             \nvar popcorn = Popcorn.smart(\"#main\", \"http://x/v.webm\", {\"frameAnimation\":true});\
             \npopcorn.text({\"end\":2,\"start\":0,\"text\":\"one\"});\
             \npopcorn.image({\"src\":\"i.png\",\"start\":1});\
             \n}());\n</script>"
        );
    }

    #[test]
    fn multiple_sources_become_an_array() {
        let data = parse(r#"{"media":[{"url":["a.webm","a.mp4"]}]}"#);
        let script = serialize(&data);
        assert!(script.contains(r##"Popcorn.smart("#video", ["a.webm","a.mp4"], {});"##));
    }

    #[test]
    fn output_is_deterministic() {
        let raw = r#"{"media":[{"url":"u","popcornOptions":{"z":1,"a":2,"m":3}}]}"#;
        assert_eq!(serialize(&parse(raw)), serialize(&parse(raw)));
        assert!(serialize(&parse(raw)).contains(r#"{"a":2,"m":3,"z":1}"#));
    }

    #[test]
    fn unusable_plugin_names_are_skipped() {
        let data = parse(
            r#"{"media":[{"url":"u","tracks":[{"trackEvents":[
                {"type":"alert(1);x","popcornOptions":{}},
                {"type":"googlemap","popcornOptions":{}}
            ]}]}]}"#,
        );
        let script = serialize(&data);
        assert!(!script.contains("alert"));
        assert!(script.contains("popcorn.googlemap({});"));
    }

    #[test]
    fn escaped_strings_pass_through() {
        let data = parse(
            r#"{"media":[{"url":"u","tracks":[{"trackEvents":[{"type":"text","popcornOptions":{"text":"</script>"}}]}]}]}"#,
        );
        let script = serialize(&data);
        assert!(script.contains("&lt;/script&gt;"));
        assert_eq!(script.matches("</script>").count(), 1);
    }

    #[test]
    fn option_keys_cannot_close_the_script() {
        let data = parse(
            r#"{"media":[{"url":"u","popcornOptions":{"<img src=x>":true},"tracks":[{"trackEvents":[
                {"type":"text","popcornOptions":{"</script><script>alert(1)//":1}}
            ]}]}]}"#,
        );
        let script = serialize(&data);
        assert_eq!(script.matches("</script>").count(), 1, "{script}");
        assert!(!script.contains("<script>alert"));
        assert!(!script.contains("<img"));
        assert!(script.contains(r#"{"&lt;/script&gt;&lt;script&gt;alert(1)//":1}"#));
    }
}
