pub mod api;
pub mod config;
pub mod error;
pub mod form;
pub mod nonce;
pub mod script;
pub mod service;
pub mod store;
pub mod sync;
pub mod viewer;

pub use api::{ApiRequest, ApiResponse, Method};
pub use config::{EditorConfig, SyncMode};
pub use error::EditorError;
pub use form::SaveForm;
pub use nonce::{NonceSigner, TokenVerifier};
pub use service::{Editor, PageView, SaveOutcome};
pub use store::{DocumentStore, FsStore, MemoryStore};
pub use viewer::Viewer;
