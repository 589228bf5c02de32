#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User picked a document. The picker filter has already been applied.
    FileSelected(crate::SelectedFile),
    /// User edited the question box.
    QueryTextChanged(String),
    /// User clicked "Upload & Index".
    UploadClicked,
    /// User clicked "Ask".
    QueryClicked,
    /// User asked the backend to forget an indexed document.
    RemoveDocumentClicked(String),
    /// User aborted whatever is in flight.
    CancelClicked,
    /// User (or startup) asked for a backend liveness probe.
    HealthCheckRequested,
    /// Engine settled an upload. `Err` carries the display detail.
    UploadFinished {
        request_id: crate::RequestId,
        result: Result<crate::UploadReceipt, String>,
    },
    /// Engine settled a query. `Err` carries the display detail.
    QueryFinished {
        request_id: crate::RequestId,
        result: Result<crate::QueryResult, String>,
    },
    /// Engine settled a document removal. `Ok` carries the backend's message.
    DocumentRemoved {
        request_id: crate::RequestId,
        result: Result<String, String>,
    },
    /// Engine settled a health check.
    HealthChecked(Result<String, String>),
}
