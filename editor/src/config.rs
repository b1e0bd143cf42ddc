use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::EditorError;

/// How the post-save sync command is run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    /// Spawn and return immediately.
    #[default]
    Background,
    /// Wait for the command and fail the hook if it fails.
    Foreground,
}

/// Editor settings, read from `editable.toml`. Every field has a default.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EditorConfig {
    /// First path segment of every editor API request.
    pub api_prefix: String,
    /// Action string mixed into every anti-forgery token.
    pub nonce_action: String,
    /// Form field carrying the token on save.
    pub nonce_field: String,
    /// Signing secret for tokens. Must be set; `Editor::new` refuses an
    /// empty one.
    pub secret: String,
    /// Tokens stay valid for between half and all of this many seconds.
    pub nonce_lifetime_secs: u64,
    /// Absolute site root, used to build the save URL handed to the editor.
    pub root_url: String,
    /// Directory holding the markdown pages.
    pub pages_dir: PathBuf,
    /// Run `git_sync_command` after every successful save.
    pub git_sync: bool,
    pub git_sync_mode: SyncMode,
    pub git_sync_command: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        EditorConfig {
            api_prefix: "editable-contenttools-api".to_string(),
            nonce_action: "editable-contenttools-nonce".to_string(),
            nonce_field: "ct-nonce".to_string(),
            secret: String::new(),
            nonce_lifetime_secs: 43_200,
            root_url: String::new(),
            pages_dir: PathBuf::from("pages"),
            git_sync: false,
            git_sync_mode: SyncMode::Background,
            git_sync_command: "bin/plugin git-sync sync".to_string(),
        }
    }
}

impl EditorConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, EditorError> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: &Path) -> Result<Self, EditorError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, EditorError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = EditorConfig::from_toml_str("").unwrap();
        assert_eq!(config.api_prefix, "editable-contenttools-api");
        assert_eq!(config.nonce_field, "ct-nonce");
        assert_eq!(config.nonce_lifetime_secs, 43_200);
        assert!(!config.git_sync);
        assert_eq!(config.git_sync_mode, SyncMode::Background);
    }

    #[test]
    fn reads_overrides() {
        let config = EditorConfig::from_toml_str(
            r#"
            secret = "s3cret"
            root_url = "https://example.com"
            git_sync = true
            git_sync_mode = "foreground"
            pages_dir = "site/pages"
            "#,
        )
        .unwrap();
        assert_eq!(config.secret, "s3cret");
        assert_eq!(config.root_url, "https://example.com");
        assert!(config.git_sync);
        assert_eq!(config.git_sync_mode, SyncMode::Foreground);
        assert_eq!(config.pages_dir, PathBuf::from("site/pages"));
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = EditorConfig::from_toml_str("colour = \"blue\"").unwrap_err();
        assert!(matches!(err, EditorError::Config(_)));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let config = EditorConfig::load_or_default(&dir.path().join("editable.toml")).unwrap();
        assert_eq!(config.pages_dir, PathBuf::from("pages"));
    }
}
