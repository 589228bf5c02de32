use std::collections::HashMap;
use std::future::Future;
use std::io;
use std::sync::{mpsc, Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use docqa_logging::{docqa_debug, docqa_info, docqa_warn};
use tokio_util::sync::CancellationToken;

use crate::client::{ClientSettings, RagBackend, ReqwestBackend};
use crate::{ApiError, Document, EngineEvent, RequestId};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to start engine runtime: {0}")]
    Runtime(#[from] io::Error),
    #[error("failed to build backend client: {0}")]
    Client(#[from] ApiError),
}

enum EngineCommand {
    Upload {
        request_id: RequestId,
        document: Document,
    },
    Query {
        request_id: RequestId,
        query: String,
    },
    DeleteDocument {
        request_id: RequestId,
        filename: String,
    },
    CheckHealth,
    Cancel {
        request_id: RequestId,
    },
}

impl EngineCommand {
    fn request_id(&self) -> Option<RequestId> {
        match self {
            EngineCommand::Upload { request_id, .. }
            | EngineCommand::Query { request_id, .. }
            | EngineCommand::DeleteDocument { request_id, .. } => Some(*request_id),
            EngineCommand::CheckHealth | EngineCommand::Cancel { .. } => None,
        }
    }
}

type Registry = Arc<Mutex<HashMap<RequestId, CancellationToken>>>;

/// Sends work to the engine thread. Dropping it cancels all outstanding requests.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
}

/// Receiving end for [`EngineEvent`]s produced by the engine thread.
pub struct EngineEvents {
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(settings: ClientSettings) -> Result<(Self, EngineEvents), EngineError> {
        let backend = ReqwestBackend::new(settings)?;
        docqa_info!("Engine targeting {}", backend.origin());
        Self::with_backend(Arc::new(backend))
    }

    pub fn with_backend(
        backend: Arc<dyn RagBackend>,
    ) -> Result<(Self, EngineEvents), EngineError> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()?;

        thread::spawn(move || {
            let shutdown = CancellationToken::new();
            let registry: Registry = Arc::default();

            while let Ok(command) = cmd_rx.recv() {
                if let EngineCommand::Cancel { request_id } = command {
                    cancel(&registry, request_id);
                    continue;
                }
                let token = shutdown.child_token();
                // Registered before spawning so a Cancel right behind it always finds the token.
                if let Some(request_id) = command.request_id() {
                    registry
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .insert(request_id, token.clone());
                }
                let backend = backend.clone();
                let event_tx = event_tx.clone();
                let registry = registry.clone();
                runtime.spawn(async move {
                    handle_command(backend.as_ref(), command, token, registry, event_tx).await;
                });
            }

            docqa_debug!("Engine command channel closed; cancelling outstanding requests");
            shutdown.cancel();
            runtime.shutdown_timeout(Duration::from_secs(1));
        });

        Ok((Self { cmd_tx }, EngineEvents { event_rx }))
    }

    pub fn upload(&self, request_id: RequestId, document: Document) {
        let _ = self.cmd_tx.send(EngineCommand::Upload {
            request_id,
            document,
        });
    }

    pub fn query(&self, request_id: RequestId, query: impl Into<String>) {
        let _ = self.cmd_tx.send(EngineCommand::Query {
            request_id,
            query: query.into(),
        });
    }

    pub fn delete_document(&self, request_id: RequestId, filename: impl Into<String>) {
        let _ = self.cmd_tx.send(EngineCommand::DeleteDocument {
            request_id,
            filename: filename.into(),
        });
    }

    pub fn check_health(&self) {
        let _ = self.cmd_tx.send(EngineCommand::CheckHealth);
    }

    pub fn cancel(&self, request_id: RequestId) {
        let _ = self.cmd_tx.send(EngineCommand::Cancel { request_id });
    }
}

impl EngineEvents {
    /// Blocks until the next event; `None` once the engine has shut down.
    pub fn recv(&self) -> Option<EngineEvent> {
        self.event_rx.recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

fn cancel(registry: &Registry, request_id: RequestId) {
    let token = registry
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .remove(&request_id);
    match token {
        Some(token) => {
            docqa_info!("Cancelling request {}", request_id);
            token.cancel();
        }
        None => docqa_debug!("Cancel for unknown or settled request {}", request_id),
    }
}

async fn handle_command(
    backend: &dyn RagBackend,
    command: EngineCommand,
    token: CancellationToken,
    registry: Registry,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    let event = match command {
        EngineCommand::Upload {
            request_id,
            document,
        } => {
            let result = tracked(&registry, request_id, token, backend.upload(&document)).await;
            log_outcome("upload", request_id, &result);
            EngineEvent::UploadCompleted { request_id, result }
        }
        EngineCommand::Query { request_id, query } => {
            let result = tracked(&registry, request_id, token, backend.query(&query)).await;
            log_outcome("query", request_id, &result);
            EngineEvent::QueryCompleted { request_id, result }
        }
        EngineCommand::DeleteDocument {
            request_id,
            filename,
        } => {
            let result = tracked(
                &registry,
                request_id,
                token,
                backend.delete_document(&filename),
            )
            .await;
            log_outcome("delete", request_id, &result);
            EngineEvent::DocumentRemoved { request_id, result }
        }
        EngineCommand::CheckHealth => {
            let result = race(token, backend.health()).await;
            if let Err(err) = &result {
                docqa_warn!("Health check failed: {} ({})", err, err.kind);
            }
            EngineEvent::HealthChecked { result }
        }
        EngineCommand::Cancel { .. } => return,
    };
    let _ = event_tx.send(event);
}

/// Races `request` against its cancellation token, then drops the token from the registry.
async fn tracked<T>(
    registry: &Registry,
    request_id: RequestId,
    token: CancellationToken,
    request: impl Future<Output = Result<T, ApiError>>,
) -> Result<T, ApiError> {
    let result = race(token, request).await;
    registry
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .remove(&request_id);
    result
}

async fn race<T>(
    token: CancellationToken,
    request: impl Future<Output = Result<T, ApiError>>,
) -> Result<T, ApiError> {
    tokio::select! {
        _ = token.cancelled() => Err(ApiError::cancelled()),
        result = request => result,
    }
}

fn log_outcome<T>(operation: &str, request_id: RequestId, result: &Result<T, ApiError>) {
    match result {
        Ok(_) => docqa_info!("{} request {} succeeded", operation, request_id),
        Err(err) => docqa_warn!(
            "{} request {} failed: {} ({})",
            operation,
            request_id,
            err,
            err.kind
        ),
    }
}
