//! HTML escaping helpers applied to untrusted project data and rendered output.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static DOUBLE_ESCAPED_ENTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(?:amp|#38|#x26);(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z][a-zA-Z0-9]*);")
        .expect("entity pattern is valid")
});

static INTER_TAG_WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r">\s+<").expect("whitespace pattern is valid"));

/// Escape the five HTML-significant characters.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Escape every string of a JSON document in place, object keys included.
pub fn escape_html_in_json(value: &mut Value) {
    match value {
        Value::String(text) => *text = escape_html(text),
        Value::Array(items) => items.iter_mut().for_each(escape_html_in_json),
        Value::Object(map) => {
            *map = std::mem::take(map)
                .into_iter()
                .map(|(key, mut value)| {
                    escape_html_in_json(&mut value);
                    (escape_html(&key), value)
                })
                .collect();
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

/// Collapse entities that were escaped twice and squeeze whitespace between
/// tags down to one space, which still separates adjacent inline elements.
///
/// Project strings are escaped once when decoded and again by template
/// autoescaping, which turns `&lt;` into `&amp;lt;` (or `&#38;lt;`).
pub fn compress_html_entities(html: &str) -> String {
    let collapsed = DOUBLE_ESCAPED_ENTITY.replace_all(html, "&$1;");
    INTER_TAG_WHITESPACE
        .replace_all(collapsed.trim(), "> <")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn escape_html_covers_markup_characters() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn escape_html_in_json_escapes_keys_and_values() {
        let mut doc = json!({
            "<key>": "<b>",
            "list": ["a&b", 3, null, {"nested": "\"q\""}],
            "flag": true
        });
        escape_html_in_json(&mut doc);

        assert_eq!(
            doc,
            json!({
                "&lt;key&gt;": "&lt;b&gt;",
                "list": ["a&amp;b", 3, null, {"nested": "&quot;q&quot;"}],
                "flag": true
            })
        );
    }

    #[test]
    fn compress_collapses_double_escaped_entities() {
        assert_eq!(
            compress_html_entities("<p>&amp;lt;b&amp;gt; &amp;#39;x&amp;#39; &amp;#x27;</p>"),
            "<p>&lt;b&gt; &#39;x&#39; &#x27;</p>"
        );
        assert_eq!(
            compress_html_entities("<p>&#38;lt;i&#38;gt; &#38;amp;</p>"),
            "<p>&lt;i&gt; &amp;</p>"
        );
    }

    #[test]
    fn compress_keeps_single_ampersands() {
        assert_eq!(
            compress_html_entities("<p>fish &amp; chips &amp; co</p>"),
            "<p>fish &amp; chips &amp; co</p>"
        );
    }

    #[test]
    fn compress_squeezes_whitespace_between_tags() {
        assert_eq!(
            compress_html_entities("\n<html>\n  <head></head>\n  <body>  <p>hi there</p>\n</body>\n</html>\n"),
            "<html> <head></head> <body> <p>hi there</p> </body> </html>"
        );
    }

    #[test]
    fn compress_keeps_inline_elements_apart() {
        assert_eq!(
            compress_html_entities("<span>Alice</span>\n      <a href=\"/remix\">Remix</a>"),
            "<span>Alice</span> <a href=\"/remix\">Remix</a>"
        );
    }
}
