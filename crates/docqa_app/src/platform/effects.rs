use std::sync::mpsc;
use std::thread;

use docqa_core::{Effect, Msg, Notice, PageRef, QueryResult, SelectedFile, UploadReceipt};
use docqa_engine::{
    Answer, ClientSettings, Document, EngineError, EngineEvent, EngineHandle, PageValue,
};
use docqa_logging::{docqa_debug, docqa_info};

use super::app::LoopEvent;

/// Executes core effects against the engine and feeds engine events back as messages.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(
        settings: ClientSettings,
        loop_tx: mpsc::Sender<LoopEvent>,
    ) -> Result<Self, EngineError> {
        let (engine, events) = EngineHandle::new(settings)?;
        thread::spawn(move || {
            while let Some(event) = events.recv() {
                if loop_tx.send(LoopEvent::Msg(map_event(event))).is_err() {
                    break;
                }
            }
            docqa_debug!("Engine event forwarder stopped");
        });
        Ok(Self { engine })
    }

    /// Sends network effects to the engine and hands notices back for display.
    pub fn enqueue(&self, effects: Vec<Effect>) -> Vec<Notice> {
        let mut notices = Vec::new();
        for effect in effects {
            match effect {
                Effect::Notify(notice) => notices.push(notice),
                Effect::Upload { request_id, file } => {
                    docqa_info!(
                        "Upload request_id={} filename={} bytes={}",
                        request_id,
                        file.filename,
                        file.bytes.len()
                    );
                    self.engine.upload(request_id, to_document(file));
                }
                Effect::Query { request_id, query } => {
                    docqa_info!("Query request_id={} query_len={}", request_id, query.len());
                    self.engine.query(request_id, query);
                }
                Effect::DeleteDocument {
                    request_id,
                    filename,
                } => {
                    docqa_info!("Delete request_id={} filename={}", request_id, filename);
                    self.engine.delete_document(request_id, filename);
                }
                Effect::Cancel { request_id } => self.engine.cancel(request_id),
                Effect::CheckHealth => self.engine.check_health(),
            }
        }
        notices
    }
}

pub fn to_selected_file(document: Document) -> SelectedFile {
    SelectedFile {
        filename: document.filename,
        mime_type: document.mime_type,
        bytes: document.bytes,
    }
}

fn to_document(file: SelectedFile) -> Document {
    Document {
        filename: file.filename,
        mime_type: file.mime_type,
        bytes: file.bytes,
    }
}

fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::UploadCompleted { request_id, result } => Msg::UploadFinished {
            request_id,
            result: result
                .map(|receipt| UploadReceipt {
                    filename: receipt.filename,
                    message: receipt.message,
                })
                .map_err(|err| err.detail().to_string()),
        },
        EngineEvent::QueryCompleted { request_id, result } => Msg::QueryFinished {
            request_id,
            result: result.map(map_answer).map_err(|err| err.detail().to_string()),
        },
        EngineEvent::DocumentRemoved { request_id, result } => Msg::DocumentRemoved {
            request_id,
            result: result.map_err(|err| err.detail().to_string()),
        },
        EngineEvent::HealthChecked { result } => {
            Msg::HealthChecked(result.map_err(|err| err.detail().to_string()))
        }
    }
}

fn map_answer(answer: Answer) -> QueryResult {
    QueryResult {
        answer: answer.answer,
        sources: answer.sources,
        pages: answer.pages.into_iter().map(map_page).collect(),
    }
}

fn map_page(page: PageValue) -> PageRef {
    match page {
        PageValue::Integer(n) => PageRef::Number(n),
        PageValue::Float(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => {
            PageRef::Number(n as i64)
        }
        PageValue::Float(n) => PageRef::Label(n.to_string()),
        PageValue::Text(text) => PageRef::Label(text),
    }
}
