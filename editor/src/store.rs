use std::collections::HashMap;
use std::path::{Component, PathBuf};

use crate::error::EditorError;

/// Where page documents live. The editor loads a page, transforms it, and
/// hands it back; concurrent writers are last-writer-wins.
pub trait DocumentStore {
    fn load(&self, route: &str) -> Result<String, EditorError>;
    fn save(&mut self, route: &str, document: &str) -> Result<(), EditorError>;
}

/// Normalize a route to `/a/b` form. The root route is `/`.
pub fn normalize_route(route: &str) -> String {
    let trimmed: Vec<&str> = route.split('/').filter(|s| !s.is_empty()).collect();
    format!("/{}", trimmed.join("/"))
}

/// Pages stored as markdown files: `/blog/post` is `<root>/blog/post.md`,
/// `/` is `<root>/index.md`.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsStore { root: root.into() }
    }

    pub fn path_for(&self, route: &str) -> Result<PathBuf, EditorError> {
        let route = normalize_route(route);
        let relative = if route == "/" {
            PathBuf::from("index")
        } else {
            PathBuf::from(&route[1..])
        };
        if relative.components().any(|c| !matches!(c, Component::Normal(_))) {
            return Err(EditorError::InvalidRoute(route));
        }
        let mut path = self.root.join(relative).into_os_string();
        path.push(".md");
        Ok(PathBuf::from(path))
    }
}

impl DocumentStore for FsStore {
    fn load(&self, route: &str) -> Result<String, EditorError> {
        let path = self.path_for(route)?;
        match std::fs::read_to_string(&path) {
            Ok(document) => Ok(document),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(EditorError::NotFound(normalize_route(route)))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn save(&mut self, route: &str, document: &str) -> Result<(), EditorError> {
        let path = self.path_for(route)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        // Write beside the page, then swap it in.
        let staging = path.with_extension("md.tmp");
        std::fs::write(&staging, document)?;
        std::fs::rename(&staging, &path)?;
        Ok(())
    }
}

/// In-memory pages keyed by normalized route.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pages: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, route: &str, document: impl Into<String>) {
        self.pages.insert(normalize_route(route), document.into());
    }

    pub fn get(&self, route: &str) -> Option<&str> {
        self.pages.get(&normalize_route(route)).map(String::as_str)
    }
}

impl DocumentStore for MemoryStore {
    fn load(&self, route: &str) -> Result<String, EditorError> {
        self.get(route)
            .map(str::to_string)
            .ok_or_else(|| EditorError::NotFound(normalize_route(route)))
    }

    fn save(&mut self, route: &str, document: &str) -> Result<(), EditorError> {
        self.insert(route, document);
        Ok(())
    }
}
