//! Docqa engine: backend client, document loading and effect execution.
mod client;
mod document;
mod engine;
mod types;

pub use client::{ClientSettings, RagBackend, ReqwestBackend, DEFAULT_ORIGIN};
pub use document::{is_accepted, load_document, Document, DocumentError, ACCEPTED_EXTENSIONS};
pub use engine::{EngineError, EngineEvents, EngineHandle};
pub use types::{Answer, ApiError, EngineEvent, FailureKind, PageValue, RequestId, UploadReceipt};
