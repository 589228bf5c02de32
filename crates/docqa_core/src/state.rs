use std::fmt;
use std::sync::Arc;

use crate::view_model::{AnswerView, AppViewModel, ButtonView, TurnView};

pub type RequestId = u64;

pub(crate) const UPLOADING_STATUS: &str = "Uploading and processing...";
pub(crate) const UPLOAD_CANCELLED_STATUS: &str = "Upload cancelled.";
pub(crate) const REMOVAL_CANCELLED_STATUS: &str = "Removal cancelled.";

/// Oldest turns are dropped once the conversation grows past this.
pub const HISTORY_LIMIT: usize = 50;

#[derive(Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub filename: String,
    pub mime_type: Option<String>,
    pub bytes: Arc<[u8]>,
}

impl SelectedFile {
    pub fn new(filename: impl Into<String>, mime_type: Option<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            mime_type,
            bytes: bytes.into(),
        }
    }
}

// Keeps document bytes out of debug logs.
impl fmt::Debug for SelectedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedFile")
            .field("filename", &self.filename)
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub filename: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageRef {
    Number(i64),
    Label(String),
}

impl fmt::Display for PageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageRef::Number(n) => write!(f, "{n}"),
            PageRef::Label(label) => f.write_str(label),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryResult {
    pub answer: String,
    pub sources: Vec<String>,
    pub pages: Vec<PageRef>,
}

impl QueryResult {
    pub(crate) fn from_error(detail: &str) -> Self {
        Self {
            answer: format!("Error: {detail}"),
            sources: Vec::new(),
            pages: Vec::new(),
        }
    }
}

/// One question and the answer (or error answer) it produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub question: String,
    pub result: QueryResult,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendStatus {
    Online(String),
    Unreachable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    selected_file: Option<SelectedFile>,
    query_text: String,
    query_result: Option<QueryResult>,
    upload_status: String,
    upload_in_flight: Option<RequestId>,
    query_in_flight: Option<Pending>,
    removal_in_flight: Option<Pending>,
    indexed_documents: Vec<String>,
    history: Vec<ChatTurn>,
    backend_status: Option<BackendStatus>,
    next_request_id: RequestId,
    dirty: bool,
}

/// An in-flight request together with the text it was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Pending {
    request_id: RequestId,
    subject: String,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> AppViewModel {
        let busy = self.is_busy();
        let upload_label = if self.upload_in_flight.is_some() {
            "Processing..."
        } else {
            "Upload & Index"
        };
        let ask_label = if self.query_in_flight.is_some() {
            "Thinking..."
        } else {
            "Ask"
        };

        AppViewModel {
            selected_filename: self.selected_file.as_ref().map(|f| f.filename.clone()),
            query_text: self.query_text.clone(),
            upload_status: self.upload_status.clone(),
            busy,
            upload_button: ButtonView {
                label: upload_label,
                enabled: !busy && self.selected_file.is_some(),
            },
            ask_button: ButtonView {
                label: ask_label,
                enabled: !busy,
            },
            cancel_enabled: busy,
            answer: self.query_result.as_ref().map(AnswerView::from_result),
            indexed_documents: self.indexed_documents.clone(),
            history: self.history.iter().map(TurnView::from_turn).collect(),
            backend_status: self.backend_status.clone(),
            dirty: self.dirty,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.upload_in_flight.is_some()
            || self.query_in_flight.is_some()
            || self.removal_in_flight.is_some()
    }

    pub fn upload_status(&self) -> &str {
        &self.upload_status
    }

    pub fn query_result(&self) -> Option<&QueryResult> {
        self.query_result.as_ref()
    }

    pub fn query_text(&self) -> &str {
        &self.query_text
    }

    pub fn selected_file(&self) -> Option<&SelectedFile> {
        self.selected_file.as_ref()
    }

    pub fn upload_in_flight(&self) -> Option<RequestId> {
        self.upload_in_flight
    }

    pub fn query_in_flight(&self) -> Option<RequestId> {
        self.query_in_flight.as_ref().map(|pending| pending.request_id)
    }

    pub fn removal_in_flight(&self) -> Option<RequestId> {
        self.removal_in_flight.as_ref().map(|pending| pending.request_id)
    }

    /// Documents the backend confirmed as indexed, in upload order.
    pub fn indexed_documents(&self) -> &[String] {
        &self.indexed_documents
    }

    pub fn history(&self) -> &[ChatTurn] {
        &self.history
    }

    /// Returns whether the state changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    fn allocate_request_id(&mut self) -> RequestId {
        self.next_request_id += 1;
        self.next_request_id
    }

    pub(crate) fn select_file(&mut self, file: SelectedFile) {
        self.selected_file = Some(file);
        self.upload_status.clear();
        self.query_result = None;
        self.mark_dirty();
    }

    pub(crate) fn set_query_text(&mut self, text: String) {
        if self.query_text != text {
            self.query_text = text;
            self.mark_dirty();
        }
    }

    /// Marks an upload as in flight. Returns the id and the file to send.
    pub(crate) fn begin_upload(&mut self) -> Option<(RequestId, SelectedFile)> {
        let file = self.selected_file.clone()?;
        let request_id = self.allocate_request_id();
        self.upload_in_flight = Some(request_id);
        self.upload_status = UPLOADING_STATUS.to_string();
        self.mark_dirty();
        Some((request_id, file))
    }

    pub(crate) fn begin_query(&mut self) -> RequestId {
        let request_id = self.allocate_request_id();
        self.query_in_flight = Some(Pending {
            request_id,
            subject: self.query_text.clone(),
        });
        self.query_result = None;
        self.mark_dirty();
        request_id
    }

    /// Applies an upload outcome. Returns false if `request_id` is stale.
    pub(crate) fn finish_upload(
        &mut self,
        request_id: RequestId,
        result: Result<UploadReceipt, String>,
    ) -> bool {
        if self.upload_in_flight != Some(request_id) {
            return false;
        }
        self.upload_in_flight = None;
        self.upload_status = match result {
            Ok(receipt) => {
                let status = format!(
                    "✅ {} uploaded successfully ({})",
                    receipt.filename, receipt.message
                );
                if !self.indexed_documents.contains(&receipt.filename) {
                    self.indexed_documents.push(receipt.filename);
                }
                status
            }
            Err(detail) => format!("❌ Error: {detail}"),
        };
        self.mark_dirty();
        true
    }

    /// Applies a query outcome. Returns false if `request_id` is stale.
    pub(crate) fn finish_query(
        &mut self,
        request_id: RequestId,
        result: Result<QueryResult, String>,
    ) -> bool {
        let question = match self.query_in_flight.take() {
            Some(pending) if pending.request_id == request_id => pending.subject,
            other => {
                self.query_in_flight = other;
                return false;
            }
        };
        let result = match result {
            Ok(result) => result,
            Err(detail) => QueryResult::from_error(&detail),
        };
        self.history.push(ChatTurn {
            question,
            result: result.clone(),
        });
        if self.history.len() > HISTORY_LIMIT {
            let excess = self.history.len() - HISTORY_LIMIT;
            self.history.drain(..excess);
        }
        self.query_result = Some(result);
        self.mark_dirty();
        true
    }

    pub(crate) fn is_indexed(&self, filename: &str) -> bool {
        self.indexed_documents.iter().any(|name| name == filename)
    }

    pub(crate) fn begin_removal(&mut self, filename: String) -> RequestId {
        let request_id = self.allocate_request_id();
        self.upload_status = format!("Removing {filename}...");
        self.removal_in_flight = Some(Pending {
            request_id,
            subject: filename,
        });
        self.mark_dirty();
        request_id
    }

    /// Applies a removal outcome. A confirmed removal also clears the conversation.
    /// Returns false if `request_id` is stale.
    pub(crate) fn finish_removal(
        &mut self,
        request_id: RequestId,
        result: Result<String, String>,
    ) -> bool {
        let filename = match self.removal_in_flight.take() {
            Some(pending) if pending.request_id == request_id => pending.subject,
            other => {
                self.removal_in_flight = other;
                return false;
            }
        };
        self.upload_status = match result {
            Ok(_) => {
                self.indexed_documents.retain(|name| *name != filename);
                self.history.clear();
                self.query_result = None;
                format!("✅ Removed {filename} successfully!")
            }
            Err(detail) => format!("❌ Error removing file: {detail}"),
        };
        self.mark_dirty();
        true
    }

    /// Releases every in-flight slot and returns the ids that were released.
    pub(crate) fn cancel_in_flight(&mut self) -> Vec<RequestId> {
        let mut cancelled = Vec::with_capacity(1);
        if let Some(request_id) = self.upload_in_flight.take() {
            self.upload_status = UPLOAD_CANCELLED_STATUS.to_string();
            cancelled.push(request_id);
        }
        if let Some(pending) = self.query_in_flight.take() {
            cancelled.push(pending.request_id);
        }
        if let Some(pending) = self.removal_in_flight.take() {
            self.upload_status = REMOVAL_CANCELLED_STATUS.to_string();
            cancelled.push(pending.request_id);
        }
        if !cancelled.is_empty() {
            self.mark_dirty();
        }
        cancelled
    }

    pub(crate) fn set_backend_status(&mut self, status: BackendStatus) {
        self.backend_status = Some(status);
        self.mark_dirty();
    }
}
