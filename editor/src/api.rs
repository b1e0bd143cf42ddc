//! Routing for editor API requests (`<api_prefix>/<route...>/<action>`).

use tracing::debug;

use regions::MarkupRenderer;

use crate::error::EditorError;
use crate::form::SaveForm;
use crate::nonce::TokenVerifier;
use crate::script;
use crate::service::{Editor, SaveOutcome};
use crate::store::DocumentStore;
use crate::viewer::Viewer;

const SAVE_ERROR_PAGE: &str = include_str!("../pages/save-error.md");

/// `Cache-Control` for responses carrying a per-session token.
pub const NO_STORE: &str = "no-store, max-age=0";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

#[derive(Debug, Clone, Copy)]
pub struct ApiRequest<'a> {
    pub method: Method,
    /// Request path, with or without a leading slash.
    pub path: &'a str,
    /// Raw form-encoded body. Empty for GET.
    pub body: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiResponse {
    /// Send `body` with the given content type and `Cache-Control` value.
    Content {
        content_type: &'static str,
        cache_control: &'static str,
        body: String,
    },
    /// Success with nothing to send (HTTP 204).
    NoContent,
    /// Show an error page instead of the requested resource.
    ErrorPage { status: u16, html: String },
    /// Not an editor request; the host should handle it normally.
    Pass,
}

/// The page route and action addressed by an API path, if the path is ours.
pub fn parse_path<'p>(api_prefix: &str, path: &'p str) -> Option<(String, &'p str)> {
    let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.first() != Some(&api_prefix) {
        return None;
    }
    segments.remove(0);
    let action = segments.pop()?;
    Some((format!("/{}", segments.join("/")), action))
}

impl<S: DocumentStore, R: MarkupRenderer, T: TokenVerifier> Editor<S, R, T> {
    /// Handle an editor API request from `viewer`.
    ///
    /// `editor.js` is only served to viewers who may edit; for anyone else
    /// the request passes through to the host.
    pub fn dispatch(
        &mut self,
        request: ApiRequest<'_>,
        viewer: &Viewer,
    ) -> Result<ApiResponse, EditorError> {
        let Some((route, action)) = parse_path(&self.config().api_prefix, request.path) else {
            return Ok(ApiResponse::Pass);
        };
        debug!(route = %route, action, "editor api request");

        match (action, request.method) {
            ("editor.js", _) if !viewer.is_authorized() => {
                debug!(route = %route, "editor script withheld from viewer without edit rights");
                Ok(ApiResponse::Pass)
            }
            ("editor.js", _) => {
                let token = self.tokens().issue(&viewer.session);
                Ok(ApiResponse::Content {
                    content_type: script::CONTENT_TYPE,
                    cache_control: NO_STORE,
                    body: self.editor_script(&route, &token)?,
                })
            }
            ("save", Method::Post) => {
                let form = SaveForm::parse(request.body, &self.config().nonce_field);
                if form.is_empty() {
                    return Ok(ApiResponse::Pass);
                }
                match self.save(&route, &form, viewer)? {
                    SaveOutcome::Applied { .. } | SaveOutcome::NoOp { .. } => {
                        Ok(ApiResponse::NoContent)
                    }
                    SaveOutcome::Rejected => Ok(ApiResponse::ErrorPage {
                        status: 403,
                        html: save_error_page(self.renderer()),
                    }),
                }
            }
            _ => Ok(ApiResponse::Pass),
        }
    }
}

/// The page shown when a save is rejected.
pub fn save_error_page<R: MarkupRenderer + ?Sized>(renderer: &R) -> String {
    renderer.render(SAVE_ERROR_PAGE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use crate::store::MemoryStore;

    #[test]
    fn parses_api_paths() {
        let prefix = "editable-contenttools-api";
        assert_eq!(
            parse_path(prefix, "/editable-contenttools-api/blog/post/save"),
            Some(("/blog/post".to_string(), "save"))
        );
        assert_eq!(
            parse_path(prefix, "editable-contenttools-api/editor.js"),
            Some(("/".to_string(), "editor.js"))
        );
        assert_eq!(parse_path(prefix, "/blog/post"), None);
        assert_eq!(parse_path(prefix, "/editable-contenttools-api"), None);
    }

    fn editor() -> Editor<MemoryStore> {
        let mut store = MemoryStore::new();
        store.insert("/blog", "[editable name=\"region-0\"]A[/editable]");
        let config = EditorConfig {
            secret: "k".to_string(),
            ..EditorConfig::default()
        };
        Editor::new(config, store).unwrap()
    }

    fn author() -> Viewer {
        Viewer::user("session-a", ["admin.pages"])
    }

    fn get(path: &str) -> ApiRequest<'_> {
        ApiRequest {
            method: Method::Get,
            path,
            body: "",
        }
    }

    #[test]
    fn serves_editor_script_uncached() {
        let mut editor = editor();
        let response = editor
            .dispatch(get("/editable-contenttools-api/blog/editor.js"), &author())
            .unwrap();
        match response {
            ApiResponse::Content {
                content_type,
                cache_control,
                body,
            } => {
                assert_eq!(content_type, "text/javascript");
                assert_eq!(cache_control, "no-store, max-age=0");
                assert!(body.contains("/editable-contenttools-api/blog/save"));
                let token = body
                    .split("var nonce = \"")
                    .nth(1)
                    .and_then(|rest| rest.split('"').next())
                    .unwrap();
                assert!(editor.tokens().verify(token, "session-a"));
                assert!(!editor.tokens().verify(token, "session-b"));
            }
            other => panic!("expected script, got {:?}", other),
        }
    }

    #[test]
    fn editor_script_is_withheld_from_anonymous_viewers() {
        let mut editor = editor();
        let path = "/editable-contenttools-api/blog/editor.js";
        assert_eq!(
            editor.dispatch(get(path), &Viewer::anonymous()).unwrap(),
            ApiResponse::Pass
        );
        assert_eq!(
            editor
                .dispatch(get(path), &Viewer::user("s", ["site.login"]))
                .unwrap(),
            ApiResponse::Pass
        );
    }

    #[test]
    fn save_round_trip() {
        let mut editor = editor();
        let body = format!(
            "ct-nonce={}&region-0=Hello+there",
            editor.tokens().issue("session-a")
        );
        let response = editor
            .dispatch(
                ApiRequest {
                    method: Method::Post,
                    path: "/editable-contenttools-api/blog/save",
                    body: &body,
                },
                &author(),
            )
            .unwrap();
        assert_eq!(response, ApiResponse::NoContent);
        assert_eq!(
            editor.store().get("/blog"),
            Some("[editable name=\"region-0\"]Hello there[/editable]")
        );
    }

    #[test]
    fn forged_save_gets_error_page() {
        let mut editor = editor();
        let response = editor
            .dispatch(
                ApiRequest {
                    method: Method::Post,
                    path: "/editable-contenttools-api/blog/save",
                    body: "ct-nonce=forged&region-0=X",
                },
                &author(),
            )
            .unwrap();
        match response {
            ApiResponse::ErrorPage { status, html } => {
                assert_eq!(status, 403);
                assert!(html.contains("<h1>Changes not saved</h1>"));
            }
            other => panic!("expected error page, got {:?}", other),
        }
        assert_eq!(
            editor.store().get("/blog"),
            Some("[editable name=\"region-0\"]A[/editable]")
        );
    }

    #[test]
    fn other_requests_pass_through() {
        let mut editor = editor();
        for (method, path, body) in [
            (Method::Get, "/blog", ""),
            (Method::Get, "/editable-contenttools-api/blog/save", ""),
            (Method::Post, "/editable-contenttools-api/blog/save", ""),
            (Method::Get, "/editable-contenttools-api/blog/unknown", ""),
        ] {
            let response = editor
                .dispatch(ApiRequest { method, path, body }, &author())
                .unwrap();
            assert_eq!(response, ApiResponse::Pass, "{} {:?}", path, method);
        }
    }

    #[test]
    fn save_error_page_renders_markdown() {
        let html = save_error_page(&regions::CommonMarkRenderer::default());
        assert!(html.starts_with("<h1>Changes not saved</h1>"));
    }
}
