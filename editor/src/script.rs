//! The `editor.js` payload that boots the in-page editor.

use serde::Serialize;

use crate::config::EditorConfig;
use crate::error::EditorError;
use crate::store::normalize_route;

const EDITOR_TEMPLATE: &str = include_str!("../templates/editor.js.mustache");

pub const CONTENT_TYPE: &str = "text/javascript";

/// Values interpolated into the script. Each is a JSON string literal so it
/// can be dropped into JavaScript source unescaped.
#[derive(Debug, Clone, Serialize)]
pub struct ScriptContext {
    save_url: String,
    nonce_field: String,
    nonce: String,
}

impl ScriptContext {
    pub fn new(save_url: &str, nonce_field: &str, nonce: &str) -> Self {
        ScriptContext {
            save_url: js_string(save_url),
            nonce_field: js_string(nonce_field),
            nonce: js_string(nonce),
        }
    }
}

fn js_string(value: &str) -> String {
    // Serializing a str cannot fail.
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

/// `<root_url>/<api_prefix><route>/save`, with the root route contributing
/// no segment.
pub fn save_url(config: &EditorConfig, route: &str) -> String {
    format!(
        "{}/{}{}/save",
        config.root_url.trim_end_matches('/'),
        config.api_prefix,
        route_suffix(route)
    )
}

/// Path of the route's `editor.js`, relative to the site root.
pub fn script_path(config: &EditorConfig, route: &str) -> String {
    format!("{}{}/editor.js", config.api_prefix, route_suffix(route))
}

fn route_suffix(route: &str) -> String {
    let route = normalize_route(route);
    if route == "/" { String::new() } else { route }
}

pub fn render_script(context: &ScriptContext) -> Result<String, EditorError> {
    let template = mustache::compile_str(EDITOR_TEMPLATE)?;
    Ok(template.render_to_string(context)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EditorConfig {
        EditorConfig {
            root_url: "https://example.com/".to_string(),
            ..EditorConfig::default()
        }
    }

    #[test]
    fn builds_urls() {
        let config = config();
        assert_eq!(
            save_url(&config, "/blog/post"),
            "https://example.com/editable-contenttools-api/blog/post/save"
        );
        assert_eq!(
            save_url(&config, "/"),
            "https://example.com/editable-contenttools-api/save"
        );
        assert_eq!(
            script_path(&config, "/blog"),
            "editable-contenttools-api/blog/editor.js"
        );
        assert_eq!(script_path(&config, "/"), "editable-contenttools-api/editor.js");
    }

    #[test]
    fn script_embeds_url_and_token() {
        let context = ScriptContext::new("https://example.com/api/x/save", "ct-nonce", "abc123");
        let script = render_script(&context).unwrap();
        assert!(script.contains(r#"var saveUrl = "https://example.com/api/x/save";"#));
        assert!(script.contains(r#"var nonceField = "ct-nonce";"#));
        assert!(script.contains(r#"var nonce = "abc123";"#));
        assert!(script.contains("ContentTools.EditorApp.get()"));
    }

    #[test]
    fn values_are_quoted_for_javascript() {
        let context = ScriptContext::new("x", "f", "a\"b");
        let script = render_script(&context).unwrap();
        assert!(script.contains(r#"var nonce = "a\"b";"#));
    }
}
