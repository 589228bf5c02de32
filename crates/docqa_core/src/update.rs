use docqa_logging::docqa_debug;

use crate::{AppState, BackendStatus, Effect, Msg, Notice};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::FileSelected(file) => {
            docqa_debug!("File selected: {:?}", file);
            state.select_file(file);
            Vec::new()
        }
        Msg::QueryTextChanged(text) => {
            state.set_query_text(text);
            Vec::new()
        }
        Msg::UploadClicked => {
            // One request at a time; the controls are disabled while busy.
            if state.is_busy() {
                docqa_debug!("Upload ignored: a request is already in flight");
                return (state, Vec::new());
            }
            match state.begin_upload() {
                Some((request_id, file)) => vec![Effect::Upload { request_id, file }],
                None => vec![Effect::Notify(Notice::NoFileSelected)],
            }
        }
        Msg::QueryClicked => {
            if state.is_busy() {
                docqa_debug!("Query ignored: a request is already in flight");
                return (state, Vec::new());
            }
            if state.query_text().is_empty() {
                return (state, vec![Effect::Notify(Notice::EmptyQuery)]);
            }
            let query = state.query_text().to_owned();
            let request_id = state.begin_query();
            vec![Effect::Query { request_id, query }]
        }
        Msg::RemoveDocumentClicked(filename) => {
            if state.is_busy() {
                docqa_debug!("Removal ignored: a request is already in flight");
                return (state, Vec::new());
            }
            if !state.is_indexed(&filename) {
                return (state, vec![Effect::Notify(Notice::UnknownDocument(filename))]);
            }
            let request_id = state.begin_removal(filename.clone());
            vec![Effect::DeleteDocument {
                request_id,
                filename,
            }]
        }
        Msg::CancelClicked => state
            .cancel_in_flight()
            .into_iter()
            .map(|request_id| Effect::Cancel { request_id })
            .collect(),
        Msg::HealthCheckRequested => vec![Effect::CheckHealth],
        Msg::UploadFinished { request_id, result } => {
            if !state.finish_upload(request_id, result) {
                docqa_debug!("Dropping stale upload response for request {}", request_id);
            }
            Vec::new()
        }
        Msg::QueryFinished { request_id, result } => {
            if !state.finish_query(request_id, result) {
                docqa_debug!("Dropping stale query response for request {}", request_id);
            }
            Vec::new()
        }
        Msg::DocumentRemoved { request_id, result } => {
            if !state.finish_removal(request_id, result) {
                docqa_debug!("Dropping stale removal response for request {}", request_id);
            }
            Vec::new()
        }
        Msg::HealthChecked(result) => {
            let status = match result {
                Ok(status) => BackendStatus::Online(status),
                Err(detail) => BackendStatus::Unreachable(detail),
            };
            state.set_backend_status(status);
            Vec::new()
        }
    };

    (state, effects)
}
