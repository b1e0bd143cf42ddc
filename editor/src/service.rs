use tracing::{info, warn};

use regions::{
    CommonMarkRenderer, MarkupRenderer, apply_updates, render_authorized, render_public, renumber,
};

use crate::config::EditorConfig;
use crate::error::EditorError;
use crate::form::SaveForm;
use crate::nonce::{NonceSigner, TokenVerifier};
use crate::script::{self, ScriptContext};
use crate::store::DocumentStore;
use crate::sync::{self, SyncHook};
use crate::viewer::Viewer;

/// Stylesheets and scripts the page needs when the editor is active, in
/// load order. The route's generated `editor.js` is appended last.
pub const EDITOR_ASSETS: &[&str] = &[
    "vendor/content-tools.min.css",
    "css/editor.css",
    "vendor/turndown.js",
    "vendor/content-tools.min.js",
    "vendor/turndown-plugin-gfm.js",
];

/// A page prepared for one viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageView {
    /// Page source with every region rendered; the rest of the page is left
    /// for the host's presentation layer.
    pub content: String,
    /// Editor assets to attach. Empty for public views.
    pub assets: Vec<String>,
    pub authorized: bool,
    /// True when region names were rewritten and the page saved.
    pub renumbered: bool,
}

/// Result of a save request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// At least one region was replaced and the page stored.
    Applied { regions: Vec<String>, skipped: Vec<String> },
    /// The token verified but no posted name matched a region.
    NoOp { skipped: Vec<String> },
    /// The viewer may not edit, or the token was missing or did not verify.
    /// Nothing was touched.
    Rejected,
}

/// Request-level driver for one site: owns the store, renderer, token
/// verifier and post-save hook. Holds no per-request state.
pub struct Editor<S, R = CommonMarkRenderer, T = NonceSigner> {
    config: EditorConfig,
    store: S,
    renderer: R,
    tokens: T,
    sync: Box<dyn SyncHook>,
}

impl<S: DocumentStore> Editor<S> {
    /// Fails when `config` has no signing secret.
    pub fn new(config: EditorConfig, store: S) -> Result<Self, EditorError> {
        let tokens = NonceSigner::from_config(&config)?;
        let sync = sync::from_config(&config);
        Ok(Editor {
            config,
            store,
            renderer: CommonMarkRenderer::default(),
            tokens,
            sync,
        })
    }
}

impl<S: DocumentStore, R: MarkupRenderer, T: TokenVerifier> Editor<S, R, T> {
    pub fn with_renderer<R2: MarkupRenderer>(self, renderer: R2) -> Editor<S, R2, T> {
        Editor {
            config: self.config,
            store: self.store,
            renderer,
            tokens: self.tokens,
            sync: self.sync,
        }
    }

    pub fn with_tokens<T2: TokenVerifier>(self, tokens: T2) -> Editor<S, R, T2> {
        Editor {
            config: self.config,
            store: self.store,
            renderer: self.renderer,
            tokens,
            sync: self.sync,
        }
    }

    pub fn with_sync(mut self, sync: Box<dyn SyncHook>) -> Self {
        self.sync = sync;
        self
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn tokens(&self) -> &T {
        &self.tokens
    }

    /// Prepare `route` for `viewer`.
    ///
    /// Editors get renumbered regions wrapped in envelopes plus the editor
    /// assets; the page is saved first if renumbering changed it. Everyone
    /// else gets the rendered regions only.
    pub fn view(&mut self, route: &str, viewer: &Viewer) -> Result<PageView, EditorError> {
        let raw = self.store.load(route)?;

        if !viewer.is_authorized() {
            return Ok(PageView {
                content: render_public(&raw, &self.renderer),
                assets: Vec::new(),
                authorized: false,
                renumbered: false,
            });
        }

        let renumbered = renumber(&raw);
        if renumbered.changed {
            self.store.save(route, &renumbered.document)?;
            info!(route, regions = renumbered.count, "region names updated");
        }

        Ok(PageView {
            content: render_authorized(&renumbered.document, &self.renderer),
            assets: self.assets(route),
            authorized: true,
            renumbered: renumbered.changed,
        })
    }

    /// Apply a posted save from `viewer` to `route`.
    ///
    /// The viewer's rights and the token (bound to the viewer's session) are
    /// checked before the page is even loaded. Sync hook failures are
    /// logged; the page is already stored by then.
    pub fn save(
        &mut self,
        route: &str,
        form: &SaveForm,
        viewer: &Viewer,
    ) -> Result<SaveOutcome, EditorError> {
        if !viewer.is_authorized() {
            warn!(route, "save rejected: viewer may not edit");
            return Ok(SaveOutcome::Rejected);
        }
        let verified = form
            .token
            .as_deref()
            .is_some_and(|token| self.tokens.verify(token, &viewer.session));
        if !verified {
            warn!(route, "save rejected: anti-forgery token did not verify");
            return Ok(SaveOutcome::Rejected);
        }

        let raw = self.store.load(route)?;
        let updated = apply_updates(&raw, form.updates.iter().map(|(name, body)| (name, body)));

        if updated.is_noop() {
            info!(route, skipped = ?updated.skipped, "save matched no regions");
            return Ok(SaveOutcome::NoOp {
                skipped: updated.skipped,
            });
        }

        self.store.save(route, &updated.document)?;
        info!(route, regions = ?updated.applied, "regions saved");

        if let Err(e) = self.sync.after_save(route) {
            warn!(route, error = %e, "post-save sync failed");
        }

        Ok(SaveOutcome::Applied {
            regions: updated.applied,
            skipped: updated.skipped,
        })
    }

    /// Render `editor.js` for `route` around a caller-supplied token.
    pub fn editor_script(&self, route: &str, token: &str) -> Result<String, EditorError> {
        let save_url = script::save_url(&self.config, route);
        let context = ScriptContext::new(&save_url, &self.config.nonce_field, token);
        script::render_script(&context)
    }

    fn assets(&self, route: &str) -> Vec<String> {
        EDITOR_ASSETS
            .iter()
            .map(|asset| asset.to_string())
            .chain(std::iter::once(script::script_path(&self.config, route)))
            .collect()
    }
}
